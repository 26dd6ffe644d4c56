//! Subtree delete / 递归删除目录
//!
//! Same drain-then-descend walk as the recursive listing, but each page is
//! acted on as soon as it arrives: its files are deleted, its folders are
//! emptied, and only then is the next page requested. A folder's own marker
//! object goes last. The walk is not atomic; the first failure stops it and
//! everything deleted before that point stays deleted.

use std::collections::VecDeque;

use serde::Serialize;

use super::{DelimiterMode, FileTree};
use crate::error::{FsError, FsResult, StoreError, StoreOp};
use crate::utils::folder_prefix;

/// What a completed subtree delete removed / 删除结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReport {
    pub prefix: String,
    /// File keys, in deletion order / 已删除的文件
    pub deleted: Vec<String>,
    /// Folder marker keys, deepest first / 已删除的目录占位
    pub folders: Vec<String>,
}

struct Frame {
    prefix: String,
    marker: String,
    depth: usize,
    token: Option<String>,
    drained: bool,
    children: VecDeque<(String, String)>,
}

impl Frame {
    fn new(prefix: String, marker: String, depth: usize) -> Self {
        Self {
            prefix,
            marker,
            depth,
            token: None,
            drained: false,
            children: VecDeque::new(),
        }
    }
}

impl FileTree {
    /// Delete every object under `folder`, then the folder itself / 删除目录及其全部内容
    pub async fn delete_subtree(&self, folder: &str) -> FsResult<DeleteReport> {
        let root = folder_prefix(folder);
        if root.is_empty() {
            return Err(FsError::config("refusing to delete the bucket root"));
        }

        let mut report = DeleteReport {
            prefix: root.clone(),
            ..Default::default()
        };
        let mut stack = vec![Frame::new(root.clone(), root, 0)];

        while let Some(frame) = stack.last_mut() {
            if let Some((child, marker)) = frame.children.pop_front() {
                let depth = frame.depth + 1;
                if depth > self.options.max_depth {
                    tracing::warn!("Subtree delete hit depth limit at {}", child);
                    let e = FsError::DepthExceeded {
                        prefix: child.clone(),
                        limit: self.options.max_depth,
                    };
                    return Err(abort(&frame.prefix, &child, e, &report));
                }
                stack.push(Frame::new(child, marker, depth));
                continue;
            }

            if !frame.drained {
                let page = match self
                    .fetch_page(
                        &frame.prefix,
                        frame.token.as_deref(),
                        self.options.recursive_page_size,
                        DelimiterMode::Shallow,
                    )
                    .await
                {
                    Ok(page) => page,
                    Err(e) => {
                        let key = e.key.clone();
                        return Err(abort(&frame.prefix, &key, e.into(), &report));
                    }
                };

                let mut first_error: Option<StoreError> = None;
                for entry in page.entries {
                    if entry.is_folder {
                        let child = folder_prefix(&entry.name);
                        if child != frame.prefix {
                            frame.children.push_back((child, entry.name));
                        }
                        continue;
                    }
                    // Keep going through the page so siblings still get removed
                    match self.store.delete_object(&entry.name).await {
                        Ok(()) => report.deleted.push(entry.name),
                        Err(e) => {
                            tracing::warn!("Delete failed: key={}, error={}", entry.name, e);
                            if first_error.is_none() {
                                first_error = Some(e);
                            }
                        }
                    }
                }

                if let Some(e) = first_error {
                    let key = e.key.clone();
                    return Err(partial(&frame.prefix, &key, e.into(), &report));
                }

                match page.next_token {
                    Some(next) if frame.token.as_deref() == Some(next.as_str()) => {
                        let e = StoreError::new(
                            StoreOp::List,
                            frame.prefix.clone(),
                            "continuation token did not advance",
                        );
                        return Err(abort(&frame.prefix, &frame.prefix, e.into(), &report));
                    }
                    Some(next) => frame.token = Some(next),
                    None => frame.drained = true,
                }
                continue;
            }

            let done = stack.pop();
            if let Some(done) = done {
                if let Err(e) = self.store.delete_object(&done.marker).await {
                    return Err(partial(&done.prefix, &done.marker, e.into(), &report));
                }
                report.folders.push(done.marker);
            }
        }

        tracing::info!(
            "Deleted subtree {}: files={}, folders={}",
            report.prefix,
            report.deleted.len(),
            report.folders.len()
        );
        Ok(report)
    }
}

fn partial(prefix: &str, failed_key: &str, source: FsError, report: &DeleteReport) -> FsError {
    let mut completed = report.deleted.clone();
    completed.extend(report.folders.iter().cloned());
    FsError::PartialFailure {
        prefix: prefix.to_string(),
        failed_key: failed_key.to_string(),
        completed,
        source: Box::new(source),
    }
}

/// Stopping before anything was removed returns the cause unwrapped
fn abort(prefix: &str, failed_key: &str, source: FsError, report: &DeleteReport) -> FsError {
    if report.deleted.is_empty() && report.folders.is_empty() {
        source
    } else {
        partial(prefix, failed_key, source, report)
    }
}
