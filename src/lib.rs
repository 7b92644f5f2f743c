//! Workspace umbrella crate for doclink.
//!
//! Ties the reference table ([`index`]) to the resolver ([`matcher`]) behind
//! one handle, [`DocLink`], which is what the HTTP server and any embedder
//! hold. Each [`DocLink::lookup`] pins one table snapshot for its whole
//! duration, so a concurrent [`DocLink::reload`] can never hand it a
//! half-built table.
//!
//! ```
//! use doclink::{DocLink, Record};
//! use index::{InMemoryBackend, RecordIndex};
//! use matcher::Matcher;
//!
//! let backend = InMemoryBackend::new(vec![
//!     Record::new("", "Grade 1 Welcome Letter", "https://example.com/welcome.pdf"),
//!     Record::new("", "Grade 2 Consonant Chart", "https://example.com/chart.pdf"),
//! ]);
//! let doclink = DocLink::new(RecordIndex::new(Box::new(backend)), Matcher::default());
//! doclink.reload().unwrap();
//!
//! let found = doclink.lookup("Welcome letter");
//! assert_eq!(found.record().unwrap().link(), "https://example.com/welcome.pdf");
//! assert!(!doclink.lookup("pdf").is_match());
//! ```

pub mod config;

pub use canonical::normalize;
pub use index::{IndexError, Record, RecordIndex, RecordTable};
pub use matcher::{MatchConfig, MatchError, MatchOutcome, MatchSource, Matcher, RejectReason};

pub use crate::config::{DocLinkConfig, TableConfig};

use std::sync::Arc;

use thiserror::Error;

/// Errors from building or reloading a [`DocLink`].
#[derive(Debug, Error)]
pub enum DocLinkError {
    #[error("table load failed: {0}")]
    Index(#[from] IndexError),
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Owned result of one lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Matched {
        record: Record,
        source: MatchSource,
        score: i64,
    },
    Rejected(RejectReason),
}

/// A finished lookup, detached from the table it ran against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub query: String,
    pub normalized_query: String,
    /// Generation of the table snapshot that answered.
    pub generation: u64,
    pub outcome: LookupOutcome,
}

impl Lookup {
    pub fn record(&self) -> Option<&Record> {
        match &self.outcome {
            LookupOutcome::Matched { record, .. } => Some(record),
            LookupOutcome::Rejected(_) => None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.record().is_some()
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match &self.outcome {
            LookupOutcome::Matched { .. } => None,
            LookupOutcome::Rejected(reason) => Some(*reason),
        }
    }

    /// `"matched"` or the rejection reason, for logs and metrics.
    pub fn label(&self) -> &'static str {
        match &self.outcome {
            LookupOutcome::Matched { .. } => "matched",
            LookupOutcome::Rejected(reason) => reason.as_str(),
        }
    }
}

/// Reference table plus resolver.
#[derive(Debug)]
pub struct DocLink {
    index: RecordIndex,
    matcher: Matcher,
}

impl DocLink {
    pub fn new(index: RecordIndex, matcher: Matcher) -> Self {
        Self { index, matcher }
    }

    /// Validate `config`, build the backend and load the table once.
    pub fn from_config(config: &DocLinkConfig) -> Result<Self, DocLinkError> {
        config.validate()?;
        let matcher = Matcher::new(config.matching.clone())?;
        let index = RecordIndex::open(&config.table.backend())?;
        tracing::info!(
            source = %index.backend_description(),
            records = index.snapshot().len(),
            vocabulary = matcher.vocabulary().len(),
            "doclink ready"
        );
        Ok(Self::new(index, matcher))
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn index(&self) -> &RecordIndex {
        &self.index
    }

    pub fn snapshot(&self) -> Arc<RecordTable> {
        self.index.snapshot()
    }

    pub fn reload(&self) -> Result<Arc<RecordTable>, DocLinkError> {
        Ok(self.index.reload()?)
    }

    /// Resolve `query` against the current snapshot.
    pub fn lookup(&self, query: &str) -> Lookup {
        let table = self.index.snapshot();
        self.lookup_in(&table, query)
    }

    /// Resolve `query` against a snapshot the caller already holds.
    pub fn lookup_in(&self, table: &RecordTable, query: &str) -> Lookup {
        let outcome = match self.matcher.resolve_detailed(query, table.records()) {
            MatchOutcome::Matched {
                record,
                source,
                score,
            } => LookupOutcome::Matched {
                record: record.clone(),
                source,
                score,
            },
            MatchOutcome::Rejected(reason) => LookupOutcome::Rejected(reason),
        };
        Lookup {
            query: query.to_string(),
            normalized_query: normalize(query),
            generation: table.generation(),
            outcome,
        }
    }
}
