//! Single-object operations / 单对象操作

use std::time::Duration;

use bytes::Bytes;
use futures::future::try_join_all;

use super::FileTree;
use crate::error::{FsError, FsResult};
use crate::link_cache::LinkCache;
use crate::models::Entry;
use crate::storage::ObjectReader;
use crate::utils::{folder_prefix, join_key, object_key};

impl FileTree {
    /// Store `data` as `file_name` inside `folder`, returns the key / 上传文件
    pub async fn upload_object(&self, folder: &str, file_name: &str, data: Bytes) -> FsResult<String> {
        let key = join_key(folder, file_name);
        if key.is_empty() || key.ends_with('/') {
            return Err(FsError::config("file name is required"));
        }

        let size = data.len();
        self.store.put_object(&key, data).await?;
        tracing::info!("Uploaded {} ({} bytes)", key, size);
        Ok(key)
    }

    /// Create an empty folder marker, returns the prefix / 创建目录
    pub async fn create_folder(&self, path: &str) -> FsResult<String> {
        let prefix = folder_prefix(path);
        if prefix.is_empty() {
            return Err(FsError::config("folder path is required"));
        }
        self.store.put_object(&prefix, Bytes::new()).await?;
        tracing::info!("Created folder {}", prefix);
        Ok(prefix)
    }

    pub async fn get_object(&self, key: &str) -> FsResult<ObjectReader> {
        let key = object_key(key);
        if key.is_empty() {
            return Err(FsError::config("object key is required"));
        }
        Ok(self.store.get_object(&key).await?)
    }

    /// Delete one object / 删除单个对象
    pub async fn delete_object(&self, key: &str) -> FsResult<()> {
        let key = object_key(key);
        if key.is_empty() {
            return Err(FsError::config("object key is required"));
        }
        self.store.delete_object(&key).await?;
        tracing::info!("Deleted {}", key);
        Ok(())
    }

    /// Presigned URL for `key`, served from `cache` while fresh / 获取下载链接
    pub async fn download_link(&self, cache: &LinkCache, key: &str, ttl: Duration) -> FsResult<String> {
        let key = object_key(key);
        if key.is_empty() {
            return Err(FsError::config("object key is required"));
        }
        cache
            .get_or_sign(&key, ttl, |key, ttl| async move {
                Ok(self.store.presign(&key, ttl).await?)
            })
            .await
    }

    /// Fill `download_link` on every file entry / 为文件条目附加下载链接
    pub async fn attach_links(&self, cache: &LinkCache, entries: &mut [Entry], ttl: Duration) -> FsResult<()> {
        let links = try_join_all(
            entries
                .iter()
                .filter(|e| !e.is_folder)
                .map(|e| self.download_link(cache, &e.name, ttl)),
        )
        .await?;

        for (entry, link) in entries.iter_mut().filter(|e| !e.is_folder).zip(links) {
            entry.download_link = Some(link);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::io::AsyncReadExt;

    use super::*;
    use crate::tree::testing::{tree_over, FlakyStore};

    #[tokio::test]
    async fn test_upload_then_read_back() {
        let store = Arc::new(FlakyStore::new(&[]));
        let tree = tree_over(store.clone(), 10);

        let key = tree
            .upload_object("docs", "hello.txt", Bytes::from_static(b"hi there"))
            .await
            .unwrap();
        assert_eq!(key, "docs/hello.txt");

        let mut reader = tree.get_object(&key).await.unwrap();
        let mut body = String::new();
        reader.read_to_string(&mut body).await.unwrap();
        assert_eq!(body, "hi there");

        let err = tree.upload_object("docs", "", Bytes::new()).await.unwrap_err();
        assert!(matches!(err, FsError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_create_folder_shows_in_listing() {
        let store = Arc::new(FlakyStore::new(&[]));
        let tree = tree_over(store.clone(), 10);

        assert_eq!(tree.create_folder("/photos/2024").await.unwrap(), "photos/2024/");
        let page = tree.list_page("photos", None, 10, false).await.unwrap();
        assert_eq!(page.folder_count, 1);
        assert_eq!(page.entries[0].name, "photos/2024/");
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let tree = tree_over(Arc::new(FlakyStore::new(&[])), 10);
        let err = tree.get_object("nope.txt").await.err().unwrap();
        match err {
            FsError::Store(e) => assert_eq!(e.kind, crate::error::StoreErrorKind::NotFound),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_links_are_cached_per_key() {
        let store = Arc::new(FlakyStore::new(&["a.txt", "b.txt", "dir/"]));
        let tree = tree_over(store.clone(), 10);
        let cache = LinkCache::new();
        let ttl = Duration::from_secs(900);

        let mut entries = tree.list_page("", None, 10, false).await.unwrap().entries;
        tree.attach_links(&cache, &mut entries, ttl).await.unwrap();
        tree.attach_links(&cache, &mut entries, ttl).await.unwrap();

        assert_eq!(store.inner.sign_count(), 2);
        assert!(entries.iter().filter(|e| e.is_folder).all(|e| e.download_link.is_none()));
        assert!(entries.iter().filter(|e| !e.is_folder).all(|e| e.download_link.is_some()));

        let direct = tree.download_link(&cache, "/a.txt", ttl).await.unwrap();
        assert_eq!(Some(direct), entries.iter().find(|e| e.name == "a.txt").and_then(|e| e.download_link.clone()));
        assert_eq!(store.inner.sign_count(), 2);
    }
}
