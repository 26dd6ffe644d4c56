//! Virtual file tree over a flat object store / 基于对象存储的虚拟文件树
//!
//! Follow architecture principles / 遵循架构原则：
//! - Stores only provide primitives (list/put/get/delete/presign) / 存储只提供原语
//! - Folder detection and paging live here, never in the drivers / 目录识别与分页在此层完成
//! - Every operation is stateless; the only shared state is the link cache / 无共享状态

use crate::config::ListingConfig;
use crate::storage::{RawObject, StoreBox};

pub mod objects;
pub mod page;
pub mod recursive;
pub mod remove;

pub use remove::DeleteReport;

/// Listing shape requested from the store / 列举模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterMode {
    /// One entry per immediate child folder, no descent / 按目录分组
    Shallow,
    /// No grouping, every key under the prefix / 平铺所有键
    Flat,
}

impl DelimiterMode {
    pub fn delimiter(self) -> Option<String> {
        match self {
            DelimiterMode::Shallow => Some("/".to_string()),
            DelimiterMode::Flat => None,
        }
    }
}

/// How folder marker objects are recognised / 目录占位对象识别方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderMarker {
    /// Only keys ending in `/` / 仅以 `/` 结尾的键
    TrailingSlash,
    /// Keys ending in `/` and any zero-size key / 同时把零字节对象视为目录
    ZeroSize,
}

impl FolderMarker {
    pub fn is_folder(self, obj: &RawObject) -> bool {
        match self {
            FolderMarker::TrailingSlash => obj.key.ends_with('/'),
            FolderMarker::ZeroSize => obj.key.ends_with('/') || obj.size == 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TreeOptions {
    /// Upper bound for caller supplied page sizes / 单页上限
    pub max_page_size: usize,
    /// Page size used while draining folders / 递归时每页大小
    pub recursive_page_size: usize,
    /// Folder nesting ceiling for recursive walks / 递归深度上限
    pub max_depth: usize,
    pub folder_marker: FolderMarker,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_page_size: 1000,
            recursive_page_size: 100,
            max_depth: 32,
            folder_marker: FolderMarker::TrailingSlash,
        }
    }
}

impl From<&ListingConfig> for TreeOptions {
    fn from(config: &ListingConfig) -> Self {
        Self {
            max_page_size: config.max_page_size,
            recursive_page_size: config.recursive_page_size,
            max_depth: config.max_depth,
            folder_marker: if config.zero_size_folders {
                FolderMarker::ZeroSize
            } else {
                FolderMarker::TrailingSlash
            },
        }
    }
}

/// File tree facade used by the HTTP layer / 文件树入口
#[derive(Clone)]
pub struct FileTree {
    store: StoreBox,
    options: TreeOptions,
}

impl FileTree {
    pub fn new(store: StoreBox, options: TreeOptions) -> Self {
        Self { store, options }
    }
}
