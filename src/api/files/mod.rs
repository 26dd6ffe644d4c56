// Sub-modules
pub mod download;
pub mod list;
pub mod operations;
pub mod upload;

// Re-exports
pub use download::*;
pub use list::*;
pub use operations::*;
pub use upload::*;

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub path: Option<String>,
    pub page_size: Option<usize>,
    /// Only return folders / 只返回目录
    pub is_folder: Option<bool>,
    /// Fallback when the `x-next` header is absent
    pub next_page_token: Option<String>,
    /// List every key under the prefix without grouping / 平铺列出
    pub flat: Option<bool>,
    pub with_links: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAllQuery {
    pub path: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub with_links: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathQuery {
    pub path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectQuery {
    pub object_key: Option<String>,
    pub path: Option<String>,
}

impl ObjectQuery {
    pub fn key(&self) -> &str {
        self.object_key
            .as_deref()
            .or(self.path.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateFolderReq {
    pub path: String,
}
