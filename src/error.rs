//! Error types / 错误类型
//!
//! Store failures keep the failing operation and key so the HTTP layer can
//! report them verbatim. Nothing here is retried.

use std::fmt;

use thiserror::Error;

/// Object store operation that failed / 失败的存储操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    List,
    Put,
    Get,
    Delete,
    Presign,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StoreOp::List => "list",
            StoreOp::Put => "put",
            StoreOp::Get => "get",
            StoreOp::Delete => "delete",
            StoreOp::Presign => "presign",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    NotFound,
    PermissionDenied,
    Other,
}

impl StoreErrorKind {
    /// Classify an HTTP status returned by the store / 根据状态码分类
    pub fn from_status(code: u16) -> Self {
        match code {
            404 => StoreErrorKind::NotFound,
            401 | 403 => StoreErrorKind::PermissionDenied,
            _ => StoreErrorKind::Other,
        }
    }
}

/// Failure reported by the object store / 对象存储返回的错误
#[derive(Debug, Clone, Error)]
#[error("{op} {key:?} failed: {message}")]
pub struct StoreError {
    pub op: StoreOp,
    pub key: String,
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn new(op: StoreOp, key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            op,
            key: key.into(),
            kind: StoreErrorKind::Other,
            message: message.into(),
        }
    }

    pub fn not_found(op: StoreOp, key: impl Into<String>) -> Self {
        Self {
            op,
            key: key.into(),
            kind: StoreErrorKind::NotFound,
            message: "object not found".to_string(),
        }
    }

    pub fn with_kind(mut self, kind: StoreErrorKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Errors surfaced by the file tree core / 文件树核心错误
#[derive(Debug, Error)]
pub enum FsError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Bad filter bucket, sort key or option; raised before any store call
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Subtree delete stopped part way / 递归删除中途失败
    ///
    /// `source` is the store error or depth limit that stopped the walk.
    #[error("delete of {prefix:?} stopped at {failed_key:?} after {} deletions: {source}", .completed.len())]
    PartialFailure {
        prefix: String,
        failed_key: String,
        completed: Vec<String>,
        #[source]
        source: Box<FsError>,
    },

    #[error("folder depth limit {limit} exceeded at {prefix:?}")]
    DepthExceeded { prefix: String, limit: usize },

    #[error("operation cancelled")]
    Cancelled,
}

impl FsError {
    pub fn config(msg: impl Into<String>) -> Self {
        FsError::Configuration(msg.into())
    }
}

pub type FsResult<T> = std::result::Result<T, FsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(StoreErrorKind::from_status(404), StoreErrorKind::NotFound);
        assert_eq!(StoreErrorKind::from_status(403), StoreErrorKind::PermissionDenied);
        assert_eq!(StoreErrorKind::from_status(500), StoreErrorKind::Other);
    }

    #[test]
    fn test_partial_failure_message() {
        let err = FsError::PartialFailure {
            prefix: "a/".to_string(),
            failed_key: "a/b.txt".to_string(),
            completed: vec!["a/c.txt".to_string()],
            source: Box::new(StoreError::new(StoreOp::Delete, "a/b.txt", "boom").into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("a/b.txt"));
        assert!(msg.contains("1 deletions"));
    }
}
