use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::io::AsyncRead;

use crate::config::StorageConfig;
use crate::error::StoreError;

pub mod memory;

pub use memory::MemoryStore;

/// Object body reader / 对象内容读取器
pub type ObjectReader = Box<dyn AsyncRead + Unpin + Send>;

/// Shared handle to the configured store / 存储实例
pub type StoreBox = Arc<dyn ObjectStore>;

/// One flat listing request / 单次列举请求
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListRequest {
    pub prefix: String,
    /// `Some("/")` groups keys into common prefixes
    pub delimiter: Option<String>,
    pub continuation_token: Option<String>,
    pub max_keys: usize,
}

/// Object as reported by the store / 存储返回的原始对象
#[derive(Debug, Clone, PartialEq)]
pub struct RawObject {
    pub key: String,
    pub size: i64,
    pub last_modified: DateTime<Utc>,
}

/// Raw page of a flat listing / 原始列举结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectListing {
    pub objects: Vec<RawObject>,
    pub common_prefixes: Vec<String>,
    pub next_continuation_token: Option<String>,
    pub is_truncated: bool,
}

/// Object store capability (provides only primitive operations) / 对象存储能力接口
///
/// Implementations are bound to a single bucket. Errors are reported as
/// [`StoreError`] and never retried by callers in this crate.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Driver name / 驱动名称
    fn name(&self) -> &str;

    /// Flat paginated key listing / 分页列举
    async fn list_objects(&self, req: ListRequest) -> Result<ObjectListing, StoreError>;

    /// Upload a whole object / 上传完整对象
    async fn put_object(&self, key: &str, data: Bytes) -> Result<(), StoreError>;

    /// Open object reader / 打开对象读取器
    async fn get_object(&self, key: &str) -> Result<ObjectReader, StoreError>;

    /// Delete a single object, missing keys are not an error / 删除单个对象
    async fn delete_object(&self, key: &str) -> Result<(), StoreError>;

    /// Signed, time bounded download URL / 生成预签名下载链接
    async fn presign(&self, key: &str, ttl: Duration) -> Result<String, StoreError>;
}

/// Build the store selected in config / 根据配置创建存储
pub fn create_store(config: &StorageConfig) -> Result<StoreBox> {
    match config.driver.as_str() {
        "s3" => {
            let store = crate::drivers::s3::S3Store::new(config.s3.clone())?;
            tracing::info!("Object store ready: {} bucket={}", store.name(), config.s3.bucket);
            Ok(Arc::new(store))
        }
        "memory" => {
            tracing::warn!("Using in-memory object store, data is lost on restart");
            Ok(Arc::new(MemoryStore::new("memory")))
        }
        other => Err(anyhow!("Unknown storage driver: {}", other)),
    }
}
