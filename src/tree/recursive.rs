//! Recursive aggregator / 递归汇总
//!
//! Walks a folder subtree with an explicit work queue: each folder is drained
//! page by page before its child folders are visited, so a folder's direct
//! entries always precede its descendants' entries. Every key is emitted once.

use std::collections::{HashSet, VecDeque};

use tokio_util::sync::CancellationToken;

use super::{DelimiterMode, FileTree};
use crate::error::{FsError, FsResult, StoreError, StoreOp};
use crate::models::{AggregateResult, Entry};
use crate::utils::folder_prefix;

impl FileTree {
    /// Full subtree snapshot of `root` / 递归列出整个子树
    pub async fn list_recursive(&self, root: &str) -> FsResult<AggregateResult> {
        self.list_recursive_until(root, &CancellationToken::new()).await
    }

    /// Like [`FileTree::list_recursive`] but aborts in-flight store calls
    /// when `cancel` fires; partial results are dropped.
    pub async fn list_recursive_until(
        &self,
        root: &str,
        cancel: &CancellationToken,
    ) -> FsResult<AggregateResult> {
        let root = folder_prefix(root);
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        queue.push_back((root.clone(), 0));

        let mut seen: HashSet<String> = HashSet::new();
        // a zero-size marker `x` and a prefix `x/` name the same folder
        let mut queued: HashSet<String> = HashSet::new();
        queued.insert(root.clone());
        let mut entries: Vec<Entry> = Vec::new();
        let mut folders_walked = 0usize;

        while let Some((prefix, depth)) = queue.pop_front() {
            let children = self.drain_folder(&prefix, cancel, &mut seen, &mut entries).await?;
            folders_walked += 1;

            for child in children {
                if !queued.insert(child.clone()) {
                    continue;
                }
                if depth + 1 > self.options.max_depth {
                    tracing::warn!("Recursive listing hit depth limit at {}", child);
                    return Err(FsError::DepthExceeded {
                        prefix: child,
                        limit: self.options.max_depth,
                    });
                }
                queue.push_back((child, depth + 1));
            }
        }

        let result = AggregateResult::new(entries, None);
        tracing::debug!(
            "list_recursive: root={:?}, folders_walked={}, files={}, folders={}",
            root,
            folders_walked,
            result.file_count,
            result.folder_count
        );
        Ok(result)
    }

    /// Follow continuation tokens of one folder to exhaustion / 读完单个目录的所有分页
    ///
    /// Returns the child folder prefixes to descend into.
    async fn drain_folder(
        &self,
        prefix: &str,
        cancel: &CancellationToken,
        seen: &mut HashSet<String>,
        out: &mut Vec<Entry>,
    ) -> FsResult<Vec<String>> {
        let mut token: Option<String> = None;
        let mut children = Vec::new();

        loop {
            let page = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FsError::Cancelled),
                page = self.fetch_page(
                    prefix,
                    token.as_deref(),
                    self.options.recursive_page_size,
                    DelimiterMode::Shallow,
                ) => page?,
            };

            for entry in page.entries {
                if !seen.insert(entry.name.clone()) {
                    continue;
                }
                if entry.is_folder {
                    let child = folder_prefix(&entry.name);
                    if child != prefix {
                        children.push(child);
                    }
                }
                out.push(entry);
            }

            match page.next_token {
                Some(next) if token.as_deref() == Some(next.as_str()) => {
                    return Err(StoreError::new(
                        StoreOp::List,
                        prefix,
                        "continuation token did not advance",
                    )
                    .into());
                }
                Some(next) => token = Some(next),
                None => break,
            }
        }

        Ok(children)
    }
}
