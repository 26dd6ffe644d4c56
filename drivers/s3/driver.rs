//! S3驱动核心实现
//!
//! 设计原则：
//! - 只提供原语（list_objects, put/get/delete, presign）
//! - 单次列举对应一次 ListObjectsV2 请求，续传令牌原样透传
//! - 不做重试，错误带上操作与对象键返回

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::Region;

use super::config::S3Config;
use crate::error::{StoreError, StoreErrorKind, StoreOp};
use crate::storage::{ListRequest, ObjectListing, ObjectReader, ObjectStore, RawObject};

/// S3 ListObjectsV2 hard limit / 单次列举上限
const MAX_KEYS_LIMIT: usize = 1000;

/// S3驱动
pub struct S3Store {
    bucket: Box<Bucket>,
}

impl S3Store {
    /// 创建新的S3存储实例
    pub fn new(config: S3Config) -> Result<Self> {
        let bucket = Self::create_bucket(&config)?;
        Ok(Self { bucket })
    }

    /// 创建S3 Bucket客户端
    fn create_bucket(config: &S3Config) -> Result<Box<Bucket>> {
        let credentials = Credentials::new(
            Some(&config.access_key_id),
            Some(&config.secret_access_key),
            if config.session_token.is_empty() { None } else { Some(&config.session_token) },
            None,
            None,
        )
        .map_err(|e| anyhow!("创建S3凭证失败: {}", e))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.resolved_endpoint(),
        };

        let bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| anyhow!("创建S3 Bucket失败: {}", e))?;

        let bucket = if config.force_path_style {
            bucket.with_path_style()
        } else {
            bucket
        };

        Ok(bucket)
    }
}

fn store_err(op: StoreOp, key: &str, err: S3Error) -> StoreError {
    StoreError::new(op, key, err.to_string())
}

/// Non-2xx responses come back as `Ok` without the fail-on-err feature
fn check_status(op: StoreOp, key: &str, code: u16) -> Result<(), StoreError> {
    if (200..300).contains(&code) {
        return Ok(());
    }
    Err(StoreError::new(op, key, format!("S3返回状态码 {}", code))
        .with_kind(StoreErrorKind::from_status(code)))
}

fn parse_last_modified(key: &str, raw: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(t) => t.with_timezone(&Utc),
        Err(e) => {
            tracing::warn!("S3对象时间无法解析: key={}, value={}, error={}", key, raw, e);
            DateTime::<Utc>::default()
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn name(&self) -> &str {
        "s3"
    }

    async fn list_objects(&self, req: ListRequest) -> Result<ObjectListing, StoreError> {
        let max_keys = req.max_keys.clamp(1, MAX_KEYS_LIMIT);

        tracing::debug!(
            "S3 ListObjectsV2: prefix={}, delimiter={:?}, token={}, max_keys={}",
            req.prefix,
            req.delimiter,
            req.continuation_token.is_some(),
            max_keys
        );

        let (result, code) = self
            .bucket
            .list_page(
                req.prefix.clone(),
                req.delimiter.clone(),
                req.continuation_token.clone(),
                None,
                Some(max_keys),
            )
            .await
            .map_err(|e| store_err(StoreOp::List, &req.prefix, e))?;
        check_status(StoreOp::List, &req.prefix, code)?;

        let objects = result
            .contents
            .into_iter()
            .map(|obj| RawObject {
                last_modified: parse_last_modified(&obj.key, &obj.last_modified),
                size: obj.size as i64,
                key: obj.key,
            })
            .collect();

        let common_prefixes = result
            .common_prefixes
            .unwrap_or_default()
            .into_iter()
            .map(|cp| cp.prefix)
            .collect();

        Ok(ObjectListing {
            objects,
            common_prefixes,
            next_continuation_token: result.next_continuation_token,
            is_truncated: result.is_truncated,
        })
    }

    async fn put_object(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        let content_type = if key.ends_with('/') {
            "application/x-directory".to_string()
        } else {
            mime_guess::from_path(key).first_or_octet_stream().to_string()
        };

        let response = self
            .bucket
            .put_object_with_content_type(key, &data, &content_type)
            .await
            .map_err(|e| store_err(StoreOp::Put, key, e))?;
        check_status(StoreOp::Put, key, response.status_code())?;

        tracing::debug!("S3上传完成: key={}, size={}", key, data.len());
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<ObjectReader, StoreError> {
        let response = self
            .bucket
            .get_object(key)
            .await
            .map_err(|e| store_err(StoreOp::Get, key, e))?;
        check_status(StoreOp::Get, key, response.status_code())?;

        // rust-s3返回完整响应，封装为AsyncRead
        let data = response.bytes().clone();
        Ok(Box::new(std::io::Cursor::new(data)))
    }

    async fn delete_object(&self, key: &str) -> Result<(), StoreError> {
        let response = self
            .bucket
            .delete_object(key)
            .await
            .map_err(|e| store_err(StoreOp::Delete, key, e))?;
        check_status(StoreOp::Delete, key, response.status_code())?;

        tracing::debug!("S3删除完成: key={}", key);
        Ok(())
    }

    async fn presign(&self, key: &str, ttl: Duration) -> Result<String, StoreError> {
        let expire_secs = ttl.as_secs().clamp(1, u32::MAX as u64) as u32;

        self.bucket
            .presign_get(key, expire_secs, None)
            .await
            .map_err(|e| store_err(StoreOp::Presign, key, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_status() {
        assert!(check_status(StoreOp::Get, "k", 200).is_ok());
        assert!(check_status(StoreOp::Delete, "k", 204).is_ok());

        let err = check_status(StoreOp::Get, "k", 404).unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::NotFound);
        assert_eq!(err.op, StoreOp::Get);

        let err = check_status(StoreOp::Put, "k", 403).unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::PermissionDenied);
    }

    #[test]
    fn test_parse_last_modified() {
        let t = parse_last_modified("k", "2023-05-01T10:20:30.000Z");
        assert_eq!(t.to_rfc3339(), "2023-05-01T10:20:30+00:00");
        assert_eq!(parse_last_modified("k", "garbage"), DateTime::<Utc>::default());
    }

    #[test]
    fn test_resolved_endpoint() {
        let mut config = S3Config {
            bucket: "b".to_string(),
            region: "eu-west-1".to_string(),
            ..Default::default()
        };
        assert_eq!(config.resolved_endpoint(), "https://s3.eu-west-1.amazonaws.com");
        config.endpoint = "http://localhost:9000/".to_string();
        assert_eq!(config.resolved_endpoint(), "http://localhost:9000");
    }
}
