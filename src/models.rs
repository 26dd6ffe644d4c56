use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::base_name;

/// One file or folder in the virtual tree / 虚拟文件树中的条目
///
/// `name` is the full object key. Folders always carry `size == 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub name: String,
    pub is_folder: bool,
    pub size: i64,
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_link: Option<String>,
}

impl Entry {
    pub fn folder(name: impl Into<String>, last_modified: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            is_folder: true,
            size: 0,
            last_modified,
            download_link: None,
        }
    }

    pub fn file(name: impl Into<String>, size: i64, last_modified: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            is_folder: false,
            size,
            last_modified,
            download_link: None,
        }
    }

    /// Last segment of the key / 文件名
    pub fn file_name(&self) -> &str {
        base_name(&self.name)
    }
}

/// One store round-trip worth of entries / 单页结果
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub entries: Vec<Entry>,
    pub next_token: Option<String>,
    pub is_last_page: bool,
}

impl Page {
    /// `is_last_page` is derived from the token so the two never disagree
    pub fn new(entries: Vec<Entry>, next_token: Option<String>) -> Self {
        let next_token = next_token.filter(|t| !t.is_empty());
        Self {
            is_last_page: next_token.is_none(),
            entries,
            next_token,
        }
    }
}

/// Listing result with aggregate counts / 带统计的列表结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    #[serde(rename = "data")]
    pub entries: Vec<Entry>,
    #[serde(rename = "filesCount")]
    pub file_count: i32,
    #[serde(rename = "foldersCount")]
    pub folder_count: i32,
    #[serde(rename = "nextPageToken", skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    pub is_last_page: bool,
}

impl AggregateResult {
    pub fn new(entries: Vec<Entry>, next_token: Option<String>) -> Self {
        let page = Page::new(entries, next_token);
        let mut result = Self {
            entries: page.entries,
            file_count: 0,
            folder_count: 0,
            next_token: page.next_token,
            is_last_page: page.is_last_page,
        };
        result.recount();
        result
    }

    pub fn from_page(page: Page) -> Self {
        Self::new(page.entries, page.next_token)
    }

    /// Recompute counts after entries were filtered / 重新统计数量
    pub fn recount(&mut self) {
        let folders = self.entries.iter().filter(|e| e.is_folder).count();
        self.folder_count = folders as i32;
        self.file_count = (self.entries.len() - folders) as i32;
    }

    pub fn records_returned(&self) -> usize {
        self.entries.len()
    }
}
