//! Post-processing of listed entries / 列表结果后处理
//!
//! Both engines are pure: they take an entry set and return a new one.

pub mod filter;
pub mod sort;

pub use filter::{apply_filters, FilterParams, FilterSpec};
pub use sort::{sort_entries, SortKey, SortOrder, SortSpec};
