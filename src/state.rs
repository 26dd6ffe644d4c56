use std::sync::Arc;
use std::time::Duration;

use s3_file_manager::config::AppConfig;
use s3_file_manager::link_cache::LinkCache;
use s3_file_manager::tree::FileTree;

/// Shared handler state / 全局共享状态
pub struct AppState {
    pub tree: FileTree,
    /// Presigned URL cache, swept in the background / 下载链接缓存
    pub links: Arc<LinkCache>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(tree: FileTree, links: Arc<LinkCache>, config: AppConfig) -> Self {
        Self { tree, links, config }
    }

    pub fn link_ttl(&self) -> Duration {
        Duration::from_secs(self.config.links.ttl_secs)
    }

    /// Deadline for recursive listings / 递归列举超时
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.listing.request_timeout_secs)
    }
}
