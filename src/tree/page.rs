//! Page fetcher: one store round-trip, normalized into entries / 单页获取

use chrono::{DateTime, SubsecRound, Utc};

use super::{DelimiterMode, FileTree, FolderMarker};
use crate::error::{FsError, FsResult, StoreError};
use crate::models::{AggregateResult, Entry, Page};
use crate::storage::{ListRequest, ObjectListing};
use crate::utils::folder_prefix;

impl FileTree {
    /// Fetch one page of `folder` / 获取目录的一页
    ///
    /// `folder` is normalized to end in `/` (root stays empty). Store errors
    /// are returned unchanged.
    pub async fn fetch_page(
        &self,
        folder: &str,
        token: Option<&str>,
        page_size: usize,
        mode: DelimiterMode,
    ) -> Result<Page, StoreError> {
        let prefix = folder_prefix(folder);
        let req = ListRequest {
            prefix: prefix.clone(),
            delimiter: mode.delimiter(),
            continuation_token: token.filter(|t| !t.is_empty()).map(str::to_string),
            max_keys: page_size.max(1),
        };

        let listing = self.store.list_objects(req).await?;
        Ok(normalize_listing(&prefix, listing, self.options.folder_marker, Utc::now()))
    }

    /// List a single page of a folder / 分页列出目录
    ///
    /// Token and last-page flag are passed through for the caller to continue.
    /// `folder_only` drops file entries from the page.
    pub async fn list_page(
        &self,
        folder: &str,
        token: Option<&str>,
        page_size: usize,
        folder_only: bool,
    ) -> FsResult<AggregateResult> {
        self.list_page_mode(folder, token, page_size, folder_only, DelimiterMode::Shallow)
            .await
    }

    pub async fn list_page_mode(
        &self,
        folder: &str,
        token: Option<&str>,
        page_size: usize,
        folder_only: bool,
        mode: DelimiterMode,
    ) -> FsResult<AggregateResult> {
        if page_size == 0 {
            return Err(FsError::config("page size must be at least 1"));
        }
        let page_size = page_size.min(self.options.max_page_size);

        let mut page = self.fetch_page(folder, token, page_size, mode).await?;
        if folder_only {
            page.entries.retain(|e| e.is_folder);
        }

        tracing::debug!(
            "list_page: folder={}, entries={}, last_page={}",
            folder,
            page.entries.len(),
            page.is_last_page
        );
        Ok(AggregateResult::from_page(page))
    }
}

/// Turn a raw listing into typed entries / 规范化原始列举结果
///
/// Common prefixes become folders stamped with the listing time (the store
/// keeps no timestamp for them). The folder's own marker object is skipped.
pub(crate) fn normalize_listing(
    prefix: &str,
    listing: ObjectListing,
    marker: FolderMarker,
    now: DateTime<Utc>,
) -> Page {
    let listed_at = now.trunc_subsecs(0);
    let mut entries = Vec::with_capacity(listing.common_prefixes.len() + listing.objects.len());

    for cp in listing.common_prefixes {
        if cp == prefix || cp.is_empty() {
            continue;
        }
        entries.push(Entry::folder(cp, listed_at));
    }

    for obj in listing.objects {
        if obj.key == prefix {
            continue;
        }
        if marker.is_folder(&obj) {
            entries.push(Entry::folder(obj.key, obj.last_modified));
        } else {
            entries.push(Entry::file(obj.key, obj.size, obj.last_modified));
        }
    }

    let next_token = if listing.is_truncated {
        if listing.next_continuation_token.is_none() {
            tracing::warn!("Store reported a truncated listing without a token: prefix={}", prefix);
        }
        listing.next_continuation_token
    } else {
        None
    };

    Page::new(entries, next_token)
}
