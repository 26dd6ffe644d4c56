//! Filter engine / 过滤引擎
//!
//! Predicates run as a fixed pipeline, each one over what the previous one
//! kept: size range, time range, extension, name pattern, size compare.
//! Unset predicates are skipped.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use serde::Deserialize;

use crate::error::{FsError, FsResult};
use crate::models::Entry;
use crate::utils::get_ext;

const MIB: i64 = 1024 * 1024;
const GIB: i64 = 1024 * MIB;

/// Named size bucket, half-open `[min, max)` / 大小区间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeRange {
    UpTo10Mb,
    From10To100Mb,
    From100MbTo1Gb,
    From1To10Gb,
    Over10Gb,
}

impl SizeRange {
    /// `(min, max)` in bytes, `max == None` is unbounded
    pub fn bounds(self) -> (i64, Option<i64>) {
        match self {
            SizeRange::UpTo10Mb => (0, Some(10 * MIB)),
            SizeRange::From10To100Mb => (10 * MIB, Some(100 * MIB)),
            SizeRange::From100MbTo1Gb => (100 * MIB, Some(GIB)),
            SizeRange::From1To10Gb => (GIB, Some(10 * GIB)),
            SizeRange::Over10Gb => (10 * GIB, None),
        }
    }

    pub fn contains(self, size: i64) -> bool {
        let (min, max) = self.bounds();
        size >= min && max.map_or(true, |max| size < max)
    }
}

impl FromStr for SizeRange {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0-10MB" => Ok(SizeRange::UpTo10Mb),
            "10-100MB" => Ok(SizeRange::From10To100Mb),
            "100MB-1GB" => Ok(SizeRange::From100MbTo1Gb),
            "1GB-10GB" => Ok(SizeRange::From1To10Gb),
            "10GB+" => Ok(SizeRange::Over10Gb),
            other => Err(FsError::config(format!("unknown size range {:?}", other))),
        }
    }
}

/// Named modification-time bucket / 时间区间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    Today,
    Yesterday,
    Last7Days,
    Last30Days,
    Last90Days,
    LastYear,
    Custom,
}

impl TimeRange {
    /// Earliest modification time that still matches / 截止时间
    pub fn cutoff(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TimeRange::Today => Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN)),
            TimeRange::Yesterday => now - Duration::hours(24),
            TimeRange::Last7Days => now - Duration::days(7),
            TimeRange::Last30Days => now - Duration::days(30),
            TimeRange::Last90Days => now - Duration::days(90),
            TimeRange::LastYear | TimeRange::Custom => now - Duration::days(365),
        }
    }
}

impl FromStr for TimeRange {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(TimeRange::Today),
            "yesterday" => Ok(TimeRange::Yesterday),
            "last 7 days" => Ok(TimeRange::Last7Days),
            "last 30 days" => Ok(TimeRange::Last30Days),
            "last 90 days" => Ok(TimeRange::Last90Days),
            "last 1 year" => Ok(TimeRange::LastYear),
            "custom" => Ok(TimeRange::Custom),
            other => Err(FsError::config(format!("unknown time range {:?}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Contains,
    StartsWith,
    EndsWith,
}

impl FromStr for MatchMode {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "contains" => Ok(MatchMode::Contains),
            "startswith" => Ok(MatchMode::StartsWith),
            "endswith" => Ok(MatchMode::EndsWith),
            _ => Err(FsError::config(format!("unknown filename match mode {:?}", s))),
        }
    }
}

/// Case-insensitive match on the full key / 文件名匹配
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePattern {
    query: String,
    pub mode: MatchMode,
}

impl NamePattern {
    pub fn new(query: &str, mode: MatchMode) -> Self {
        Self {
            query: query.to_lowercase(),
            mode,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        match self.mode {
            MatchMode::Contains => name.contains(&self.query),
            MatchMode::StartsWith => name.starts_with(&self.query),
            MatchMode::EndsWith => name.ends_with(&self.query),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
}

impl FromStr for CompareOp {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gt" => Ok(CompareOp::Gt),
            "gte" => Ok(CompareOp::Gte),
            "lt" => Ok(CompareOp::Lt),
            "lte" => Ok(CompareOp::Lte),
            "eq" => Ok(CompareOp::Eq),
            other => Err(FsError::config(format!("unknown size comparison {:?}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeCompare {
    pub value: i64,
    pub op: CompareOp,
}

impl SizeCompare {
    pub fn matches(&self, size: i64) -> bool {
        match self.op {
            CompareOp::Gt => size > self.value,
            CompareOp::Gte => size >= self.value,
            CompareOp::Lt => size < self.value,
            CompareOp::Lte => size <= self.value,
            CompareOp::Eq => size == self.value,
        }
    }
}

/// Parsed filter set; every field is optional / 过滤条件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub size_range: Option<SizeRange>,
    pub time_range: Option<TimeRange>,
    /// Lowercase, without the leading dot
    pub extensions: Option<HashSet<String>>,
    pub name: Option<NamePattern>,
    pub size: Option<SizeCompare>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.size_range.is_none()
            && self.time_range.is_none()
            && self.extensions.is_none()
            && self.name.is_none()
            && self.size.is_none()
    }

    pub fn with_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: HashSet<String> = exts
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self.extensions = if set.is_empty() { None } else { Some(set) };
        self
    }
}

/// Raw filter query parameters / 过滤查询参数
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    pub size_range: Option<String>,
    pub time_range: Option<String>,
    /// Comma separated, e.g. `pdf,.png`
    pub file_types: Option<String>,
    pub filename_query: Option<String>,
    pub filename_filter_type: Option<String>,
    pub file_size: Option<i64>,
    pub file_size_filter_type: Option<String>,
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl FilterParams {
    /// Validate into a [`FilterSpec`]; unknown names are rejected / 解析并校验
    pub fn parse(&self) -> FsResult<FilterSpec> {
        let mut spec = FilterSpec {
            size_range: non_empty(&self.size_range).map(str::parse::<SizeRange>).transpose()?,
            time_range: non_empty(&self.time_range).map(str::parse::<TimeRange>).transpose()?,
            ..Default::default()
        };

        if let Some(types) = non_empty(&self.file_types) {
            spec = spec.with_extensions(types.split(','));
        }

        if let Some(query) = non_empty(&self.filename_query) {
            let mode = match non_empty(&self.filename_filter_type) {
                Some(m) => m.parse()?,
                None => MatchMode::Contains,
            };
            spec.name = Some(NamePattern::new(query, mode));
        }

        match (self.file_size, non_empty(&self.file_size_filter_type)) {
            (Some(value), op) => {
                let op = match op {
                    Some(op) => op.parse()?,
                    None => CompareOp::Eq,
                };
                spec.size = Some(SizeCompare { value, op });
            }
            (None, Some(_)) => {
                return Err(FsError::config("fileSizeFilterType given without fileSize"));
            }
            (None, None) => {}
        }

        Ok(spec)
    }
}

/// Run the filter pipeline / 执行过滤
pub fn apply_filters(entries: &[Entry], spec: &FilterSpec) -> Vec<Entry> {
    apply_filters_at(entries, spec, Utc::now())
}

pub fn apply_filters_at(entries: &[Entry], spec: &FilterSpec, now: DateTime<Utc>) -> Vec<Entry> {
    let mut kept: Vec<&Entry> = entries.iter().collect();

    if let Some(range) = spec.size_range {
        kept.retain(|e| range.contains(e.size));
    }
    if let Some(range) = spec.time_range {
        let cutoff = range.cutoff(now);
        kept.retain(|e| e.last_modified >= cutoff);
    }
    if let Some(exts) = &spec.extensions {
        kept.retain(|e| !e.is_folder && get_ext(&e.name).is_some_and(|ext| exts.contains(&ext)));
    }
    if let Some(pattern) = &spec.name {
        kept.retain(|e| pattern.matches(&e.name));
    }
    if let Some(cmp) = spec.size {
        kept.retain(|e| cmp.matches(e.size));
    }

    kept.into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, size: i64) -> Entry {
        Entry::file(name, size, Utc::now())
    }

    fn names(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_size_range_bucket() {
        let entries = vec![file("a.txt", 5), file("b.txt", 50 * MIB)];
        let spec = FilterSpec {
            size_range: Some("10-100MB".parse().unwrap()),
            ..Default::default()
        };
        assert_eq!(names(&apply_filters(&entries, &spec)), vec!["b.txt"]);
        // input untouched
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_size_range_edges_are_half_open() {
        assert!(SizeRange::UpTo10Mb.contains(0));
        assert!(!SizeRange::UpTo10Mb.contains(10 * MIB));
        assert!(SizeRange::From10To100Mb.contains(10 * MIB));
        assert!(SizeRange::Over10Gb.contains(i64::MAX));
    }

    #[test]
    fn test_unknown_bucket_is_rejected() {
        let params = FilterParams {
            size_range: Some("huge".to_string()),
            ..Default::default()
        };
        assert!(matches!(params.parse(), Err(FsError::Configuration(_))));

        let params = FilterParams {
            time_range: Some("last week".to_string()),
            ..Default::default()
        };
        assert!(matches!(params.parse(), Err(FsError::Configuration(_))));
    }

    #[test]
    fn test_time_range() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 15, 0, 0).unwrap();
        let entries = vec![
            Entry::file("fresh", 1, Utc.with_ymd_and_hms(2024, 3, 10, 0, 30, 0).unwrap()),
            Entry::file("last-night", 1, Utc.with_ymd_and_hms(2024, 3, 9, 23, 0, 0).unwrap()),
            Entry::file("old", 1, Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()),
        ];

        let today = FilterSpec {
            time_range: Some(TimeRange::Today),
            ..Default::default()
        };
        assert_eq!(names(&apply_filters_at(&entries, &today, now)), vec!["fresh"]);

        let yesterday = FilterSpec {
            time_range: Some(TimeRange::Yesterday),
            ..Default::default()
        };
        assert_eq!(names(&apply_filters_at(&entries, &yesterday, now)), vec!["fresh", "last-night"]);
    }

    #[test]
    fn test_extensions_use_final_dot() {
        let entries = vec![
            file("docs/report.final.PDF", 1),
            file("docs/README", 1),
            file("v1.2/notes", 1),
            file("img.png", 1),
            Entry::folder("docs/", Utc::now()),
            Entry::folder("backups/archive.zip/", Utc::now()),
            file("backups/real.zip", 1),
        ];
        let spec = FilterSpec::default().with_extensions([".pdf", "png", "zip"]);
        assert_eq!(
            names(&apply_filters(&entries, &spec)),
            vec!["docs/report.final.PDF", "img.png", "backups/real.zip"]
        );
    }

    #[test]
    fn test_name_pattern_is_case_insensitive() {
        let entries = vec![file("Photos/Beach.JPG", 1), file("notes.txt", 1)];
        let starts = FilterSpec {
            name: Some(NamePattern::new("photos/", MatchMode::StartsWith)),
            ..Default::default()
        };
        assert_eq!(names(&apply_filters(&entries, &starts)), vec!["Photos/Beach.JPG"]);

        let ends = FilterSpec {
            name: Some(NamePattern::new(".TXT", MatchMode::EndsWith)),
            ..Default::default()
        };
        assert_eq!(names(&apply_filters(&entries, &ends)), vec!["notes.txt"]);
    }

    #[test]
    fn test_size_compare_operators() {
        let entries = vec![file("a", 10), file("b", 20), file("c", 30)];
        let run = |op, value| {
            let spec = FilterSpec {
                size: Some(SizeCompare { value, op }),
                ..Default::default()
            };
            apply_filters(&entries, &spec).into_iter().map(|e| e.name).collect::<Vec<_>>()
        };
        assert_eq!(run(CompareOp::Gt, 20), vec!["c"]);
        assert_eq!(run(CompareOp::Gte, 20), vec!["b", "c"]);
        assert_eq!(run(CompareOp::Lt, 20), vec!["a"]);
        assert_eq!(run(CompareOp::Lte, 20), vec!["a", "b"]);
        assert_eq!(run(CompareOp::Eq, 20), vec!["b"]);
    }

    #[test]
    fn test_pipeline_is_conjunctive() {
        let entries = vec![
            file("big.pdf", 20 * MIB),
            file("small.pdf", 1),
            file("big.png", 20 * MIB),
        ];
        let params = FilterParams {
            size_range: Some("10-100MB".to_string()),
            file_types: Some("pdf".to_string()),
            ..Default::default()
        };
        let spec = params.parse().unwrap();
        assert_eq!(names(&apply_filters(&entries, &spec)), vec!["big.pdf"]);
    }

    #[test]
    fn test_params_defaults() {
        let spec = FilterParams {
            filename_query: Some("rep".to_string()),
            file_size: Some(5),
            file_types: Some(" , ".to_string()),
            ..Default::default()
        }
        .parse()
        .unwrap();
        assert_eq!(spec.name.as_ref().map(|p| p.mode), Some(MatchMode::Contains));
        assert_eq!(spec.size.map(|s| s.op), Some(CompareOp::Eq));
        assert!(spec.extensions.is_none());

        assert!(FilterParams::default().parse().unwrap().is_empty());

        let err = FilterParams {
            file_size_filter_type: Some("gt".to_string()),
            ..Default::default()
        }
        .parse();
        assert!(matches!(err, Err(FsError::Configuration(_))));
    }
}
