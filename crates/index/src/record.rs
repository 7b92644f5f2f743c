use std::ops::Deref;

use canonical::normalize;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One row of the reference table.
///
/// Normalized forms are computed once in [`Record::new`] so queries never
/// renormalize table text. Fields are private to keep the cached forms in
/// sync with the raw ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    keyword: String,
    display_name: String,
    link: String,
    #[serde(skip)]
    normalized_keyword: String,
    #[serde(skip)]
    normalized_display_name: String,
}

impl Record {
    /// Build a record; surrounding whitespace is trimmed, `link` is otherwise kept verbatim.
    pub fn new(
        keyword: impl Into<String>,
        display_name: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        let keyword = keyword.into().trim().to_string();
        let display_name = display_name.into().trim().to_string();
        let link = link.into().trim().to_string();
        Self {
            normalized_keyword: normalize(&keyword),
            normalized_display_name: normalize(&display_name),
            keyword,
            display_name,
            link,
        }
    }

    /// The keyword, or `None` when it normalizes to nothing.
    pub fn keyword(&self) -> Option<&str> {
        if self.normalized_keyword.is_empty() {
            None
        } else {
            Some(&self.keyword)
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn normalized_keyword(&self) -> &str {
        &self.normalized_keyword
    }

    pub fn normalized_display_name(&self) -> &str {
        &self.normalized_display_name
    }

    pub(crate) fn is_blank(&self) -> bool {
        self.keyword.is_empty() && self.display_name.is_empty() && self.link.is_empty()
    }
}

/// An immutable, fixed-order generation of the reference table.
#[derive(Debug, Clone, Serialize)]
pub struct RecordTable {
    records: Vec<Record>,
    generation: u64,
    source: String,
    loaded_at: DateTime<Utc>,
}

impl RecordTable {
    pub fn new(records: Vec<Record>, generation: u64, source: impl Into<String>) -> Self {
        Self {
            records,
            generation,
            source: source.into(),
            loaded_at: Utc::now(),
        }
    }

    /// Table with no rows; generation 0.
    pub fn empty(source: impl Into<String>) -> Self {
        Self::new(Vec::new(), 0, source)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// True when at least one record carries a keyword.
    pub fn has_keywords(&self) -> bool {
        self.records.iter().any(|r| r.keyword().is_some())
    }
}

impl Deref for RecordTable {
    type Target = [Record];

    fn deref(&self) -> &[Record] {
        &self.records
    }
}
