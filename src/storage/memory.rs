//! In-memory object store / 内存对象存储
//!
//! Follows S3 ListObjectsV2 paging: keys in byte order, delimiter grouping
//! into common prefixes (each prefix counts as one key against `max_keys`),
//! and a continuation token naming the last item returned.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{ListRequest, ObjectListing, ObjectReader, ObjectStore, RawObject};
use crate::error::{StoreError, StoreOp};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    last_modified: DateTime<Utc>,
}

enum Item<'a> {
    Object(&'a str, &'a StoredObject),
    Prefix(String),
}

impl Item<'_> {
    fn name(&self) -> &str {
        match self {
            Item::Object(key, _) => *key,
            Item::Prefix(p) => p.as_str(),
        }
    }
}

pub struct MemoryStore {
    bucket: String,
    objects: RwLock<BTreeMap<String, StoredObject>>,
    sign_counter: AtomicU64,
}

impl MemoryStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            objects: RwLock::new(BTreeMap::new()),
            sign_counter: AtomicU64::new(0),
        }
    }

    /// Insert an object with an explicit modification time / 指定修改时间写入
    pub fn insert(&self, key: &str, data: impl Into<Bytes>, last_modified: DateTime<Utc>) {
        self.objects.write().insert(
            key.to_string(),
            StoredObject {
                data: data.into(),
                last_modified,
            },
        );
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.read().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.read().keys().cloned().collect()
    }

    /// Number of presign calls served / 已签名次数
    pub fn sign_count(&self) -> u64 {
        self.sign_counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_objects(&self, req: ListRequest) -> Result<ObjectListing, StoreError> {
        let objects = self.objects.read();
        let delimiter = req.delimiter.as_deref().filter(|d| !d.is_empty());

        // Group into an ordered, de-duplicated item sequence
        let mut items: Vec<Item<'_>> = Vec::new();
        for (key, obj) in objects.range(req.prefix.clone()..) {
            if !key.starts_with(&req.prefix) {
                break;
            }
            let rest = &key[req.prefix.len()..];
            let grouped = delimiter
                .and_then(|d| rest.find(d).map(|pos| (pos, d)))
                .map(|(pos, d)| format!("{}{}", req.prefix, &rest[..pos + d.len()]));

            match grouped {
                Some(prefix) => {
                    if !matches!(items.last(), Some(Item::Prefix(p)) if *p == prefix) {
                        items.push(Item::Prefix(prefix));
                    }
                }
                None => items.push(Item::Object(key, obj)),
            }
        }

        let start = match req.continuation_token.as_deref() {
            Some(token) => items.iter().position(|i| i.name() > token).unwrap_or(items.len()),
            None => 0,
        };
        let max_keys = req.max_keys.max(1);
        let end = (start + max_keys).min(items.len());

        let mut listing = ObjectListing::default();
        for item in &items[start..end] {
            match item {
                Item::Object(key, obj) => listing.objects.push(RawObject {
                    key: key.to_string(),
                    size: obj.data.len() as i64,
                    last_modified: obj.last_modified,
                }),
                Item::Prefix(p) => listing.common_prefixes.push(p.clone()),
            }
        }

        if end < items.len() {
            listing.is_truncated = true;
            listing.next_continuation_token = Some(items[end - 1].name().to_string());
        }

        Ok(listing)
    }

    async fn put_object(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        self.insert(key, data, Utc::now());
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<ObjectReader, StoreError> {
        let data = self
            .objects
            .read()
            .get(key)
            .map(|o| o.data.clone())
            .ok_or_else(|| StoreError::not_found(StoreOp::Get, key))?;
        Ok(Box::new(std::io::Cursor::new(data)))
    }

    async fn delete_object(&self, key: &str) -> Result<(), StoreError> {
        self.objects.write().remove(key);
        Ok(())
    }

    async fn presign(&self, key: &str, ttl: Duration) -> Result<String, StoreError> {
        let n = self.sign_counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!(
            "memory://{}/{}?expires={}&sig={}",
            self.bucket,
            urlencoding::encode(key),
            ttl.as_secs(),
            n
        ))
    }
}
