pub mod config;
pub mod error;
pub mod link_cache;
pub mod models;
pub mod query;
pub mod storage;
pub mod tree;
pub mod utils;

// Driver modules (point to project root drivers via path attribute) / 驱动模块
#[path = "../drivers/mod.rs"]
pub mod drivers;

pub use error::{FsError, FsResult, StoreError};
pub use link_cache::LinkCache;
pub use tree::FileTree;
