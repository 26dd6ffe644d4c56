//! Sort engine / 排序引擎

use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::{FsError, FsResult};
use crate::models::Entry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    Date,
    /// Folders before files when ascending
    Type,
    Size,
}

impl FromStr for SortKey {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "date" | "modified" => Ok(SortKey::Date),
            "type" => Ok(SortKey::Type),
            "size" => Ok(SortKey::Size),
            _ => Err(FsError::config(format!("unknown sort key {:?}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(FsError::config(format!("unknown sort order {:?}", s))),
        }
    }
}

/// Sort key and direction, defaults to name ascending / 排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub key: SortKey,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(key: SortKey, order: SortOrder) -> Self {
        Self { key, order }
    }

    /// Parse optional `sortBy` / `order` values; blanks fall back to defaults
    pub fn parse(key: Option<&str>, order: Option<&str>) -> FsResult<Self> {
        let key = match key.map(str::trim).filter(|s| !s.is_empty()) {
            Some(k) => k.parse()?,
            None => SortKey::default(),
        };
        let order = match order.map(str::trim).filter(|s| !s.is_empty()) {
            Some(o) => o.parse()?,
            None => SortOrder::default(),
        };
        Ok(Self { key, order })
    }

    fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        let ord = match self.key {
            SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortKey::Date => a.last_modified.cmp(&b.last_modified),
            // true sorts after false, so flip to put folders first
            SortKey::Type => b.is_folder.cmp(&a.is_folder),
            SortKey::Size => a.size.cmp(&b.size),
        };
        match self.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }
}

/// Stable sort; equal keys keep their incoming order / 稳定排序
pub fn sort_entries(mut entries: Vec<Entry>, spec: SortSpec) -> Vec<Entry> {
    entries.sort_by(|a, b| spec.compare(a, b));
    entries
}
