//! Download link cache / 下载链接缓存
//!
//! Maps an object key to a presigned URL and the instant it stops being
//! served. Reads take the shared lock; inserts and the sweep take the
//! exclusive lock. An expired entry is never returned: reads drop it lazily
//! and the background sweeper removes the rest.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::task::JoinHandle;

use crate::error::{FsError, FsResult};

#[derive(Debug, Clone)]
struct CacheEntry {
    url: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct LinkCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl LinkCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached URL for `key`, or sign a fresh one / 获取或生成签名链接
    ///
    /// Two callers racing on a missing key may both sign; the later insert
    /// wins and both URLs stay valid.
    pub async fn get_or_sign<F, Fut>(&self, key: &str, ttl: Duration, signer: F) -> FsResult<String>
    where
        F: FnOnce(String, Duration) -> Fut,
        Fut: Future<Output = FsResult<String>>,
    {
        self.get_or_sign_at(key, ttl, Utc::now(), signer).await
    }

    pub async fn get_or_sign_at<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        now: DateTime<Utc>,
        signer: F,
    ) -> FsResult<String>
    where
        F: FnOnce(String, Duration) -> Fut,
        Fut: Future<Output = FsResult<String>>,
    {
        if let Some(url) = self.lookup(key, now) {
            return Ok(url);
        }

        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| FsError::config(format!("link ttl {:?} is out of range", ttl)))?;

        let url = signer(key.to_string(), ttl).await?;
        self.entries.write().insert(
            key.to_string(),
            CacheEntry {
                url: url.clone(),
                expires_at,
            },
        );
        tracing::debug!("Link cached: key={}, expires_at={}", key, expires_at);
        Ok(url)
    }

    fn lookup(&self, key: &str, now: DateTime<Utc>) -> Option<String> {
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => return Some(entry.url.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // expired: drop it unless someone refreshed it in between
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|e| e.expires_at <= now) {
            entries.remove(key);
        }
        None
    }

    /// Remove every expired entry / 清理过期链接
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Start the periodic sweep / 启动定期清理任务
    ///
    /// The task holds only a weak reference and exits once the cache is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // first tick fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    tracing::debug!("Link cache dropped, sweeper exiting");
                    break;
                };
                let removed = cache.sweep();
                if removed > 0 {
                    tracing::debug!("Link cache sweep removed {} entries", removed);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::{FsError, StoreError, StoreOp};

    fn counting_signer(
        calls: &AtomicUsize,
    ) -> impl FnOnce(String, Duration) -> std::future::Ready<FsResult<String>> + '_ {
        move |key, _ttl| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(Ok(format!("https://signed/{}?v={}", key, n)))
        }
    }

    #[tokio::test]
    async fn test_signs_once_within_ttl() {
        let cache = LinkCache::new();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(900);
        let t0 = Utc::now();

        let first = cache.get_or_sign_at("a.txt", ttl, t0, counting_signer(&calls)).await.unwrap();
        let later = t0 + chrono::Duration::seconds(899);
        let second = cache.get_or_sign_at("a.txt", ttl, later, counting_signer(&calls)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resigns_after_expiry() {
        let cache = LinkCache::new();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(900);
        let t0 = Utc::now();

        let first = cache.get_or_sign_at("a.txt", ttl, t0, counting_signer(&calls)).await.unwrap();
        let expired = t0 + chrono::Duration::seconds(900);
        let second = cache.get_or_sign_at("a.txt", ttl, expired, counting_signer(&calls)).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_fractional_ttl_is_honoured() {
        let cache = LinkCache::new();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_millis(1500);
        let t0 = Utc::now();

        cache.get_or_sign_at("k", ttl, t0, counting_signer(&calls)).await.unwrap();
        let within = t0 + chrono::Duration::milliseconds(1200);
        cache.get_or_sign_at("k", ttl, within, counting_signer(&calls)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let after = t0 + chrono::Duration::milliseconds(1500);
        cache.get_or_sign_at("k", ttl, after, counting_signer(&calls)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_out_of_range_ttl_is_rejected() {
        let cache = LinkCache::new();
        let calls = AtomicUsize::new(0);
        let err = cache
            .get_or_sign("k", Duration::MAX, counting_signer(&calls))
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::Configuration(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_signer_error_is_not_cached() {
        let cache = LinkCache::new();
        let err = cache
            .get_or_sign("gone.txt", Duration::from_secs(60), |key, _| async move {
                Err(FsError::from(StoreError::not_found(StoreOp::Presign, key)))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::Store(_)));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let cache = LinkCache::new();
        let calls = AtomicUsize::new(0);
        let t0 = Utc::now();

        cache
            .get_or_sign_at("short", Duration::from_secs(10), t0, counting_signer(&calls))
            .await
            .unwrap();
        cache
            .get_or_sign_at("long", Duration::from_secs(1000), t0, counting_signer(&calls))
            .await
            .unwrap();

        assert_eq!(cache.sweep_at(t0 + chrono::Duration::seconds(5)), 0);
        assert_eq!(cache.sweep_at(t0 + chrono::Duration::seconds(10)), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_sweeper_task_runs() {
        let cache = Arc::new(LinkCache::new());
        let calls = AtomicUsize::new(0);
        let past = Utc::now() - chrono::Duration::seconds(120);
        cache
            .get_or_sign_at("old", Duration::from_secs(60), past, counting_signer(&calls))
            .await
            .unwrap();
        assert_eq!(cache.len(), 1);

        let handle = cache.spawn_sweeper(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(cache.is_empty());

        drop(cache);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
