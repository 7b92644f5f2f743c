use index::Record;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Curated terms that earn a bonus when present in both query and candidate.
///
/// Short domain words (grade labels, unit numbers, content types) carry most
/// of the meaning in a document name but get diluted by token-ratio scoring.
pub const DEFAULT_VOCABULARY: &[&str] = &[
    "kindergarten",
    "grade 1",
    "grade 2",
    "grade 3",
    "grade 4",
    "grade 5",
    "unit 1",
    "unit 2",
    "unit 3",
    "unit 4",
    "unit 5",
    "unit 6",
    "unit 7",
    "unit 8",
    "welcome",
    "letter",
    "chart",
    "flip book",
    "poster",
    "workbook",
    "worksheet",
    "assessment",
    "phonics",
    "consonant",
    "vowel",
    "alphabet",
    "sight words",
    "decodable",
    "newsletter",
    "calendar",
];

/// Scoring constants and the bonus vocabulary.
///
/// Defaults are the tuned production values; change them only when
/// recalibrating against real table data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchConfig {
    /// Normalized queries shorter than this are rejected outright.
    #[serde(default = "MatchConfig::default_min_query_len")]
    pub min_query_len: usize,
    /// Lowest best score that can be accepted.
    #[serde(default = "MatchConfig::default_min_score")]
    pub min_score: i64,
    /// Minimum lead of the best score over the runner-up.
    #[serde(default = "MatchConfig::default_min_gap")]
    pub min_gap: i64,
    #[serde(default = "MatchConfig::default_exact_score")]
    pub exact_score: i64,
    /// Candidate contains the query.
    #[serde(default = "MatchConfig::default_contains_score")]
    pub contains_score: i64,
    /// Query contains the candidate.
    #[serde(default = "MatchConfig::default_contained_score")]
    pub contained_score: i64,
    /// Score of a full token overlap; partial overlap scales linearly.
    #[serde(default = "MatchConfig::default_overlap_scale")]
    pub overlap_scale: i64,
    #[serde(default = "MatchConfig::default_bonus_weight")]
    pub bonus_weight: i64,
    #[serde(default = "MatchConfig::default_vocabulary")]
    pub vocabulary: Vec<String>,
}

impl MatchConfig {
    pub(crate) fn default_min_query_len() -> usize {
        4
    }

    pub(crate) fn default_min_score() -> i64 {
        140
    }

    pub(crate) fn default_min_gap() -> i64 {
        40
    }

    pub(crate) fn default_exact_score() -> i64 {
        1000
    }

    pub(crate) fn default_contains_score() -> i64 {
        700
    }

    pub(crate) fn default_contained_score() -> i64 {
        650
    }

    pub(crate) fn default_overlap_scale() -> i64 {
        500
    }

    pub(crate) fn default_bonus_weight() -> i64 {
        15
    }

    pub fn default_vocabulary() -> Vec<String> {
        DEFAULT_VOCABULARY.iter().map(|s| s.to_string()).collect()
    }

    /// Same thresholds, different vocabulary.
    pub fn with_vocabulary<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vocabulary = terms.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.min_query_len == 0 {
            return Err(MatchError::InvalidConfig(
                "min_query_len must be greater than zero".into(),
            ));
        }
        if self.overlap_scale <= 0 {
            return Err(MatchError::InvalidConfig(
                "overlap_scale must be greater than zero".into(),
            ));
        }
        if self.min_score < 0 || self.min_gap < 0 || self.bonus_weight < 0 {
            return Err(MatchError::InvalidConfig(
                "min_score, min_gap and bonus_weight must be >= 0".into(),
            ));
        }
        if self.exact_score <= self.contains_score {
            return Err(MatchError::InvalidConfig(
                "exact_score must be greater than contains_score".into(),
            ));
        }
        if self.contains_score < self.contained_score {
            return Err(MatchError::InvalidConfig(
                "contains_score must be >= contained_score".into(),
            ));
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            min_query_len: Self::default_min_query_len(),
            min_score: Self::default_min_score(),
            min_gap: Self::default_min_gap(),
            exact_score: Self::default_exact_score(),
            contains_score: Self::default_contains_score(),
            contained_score: Self::default_contained_score(),
            overlap_scale: Self::default_overlap_scale(),
            bonus_weight: Self::default_bonus_weight(),
            vocabulary: Self::default_vocabulary(),
        }
    }
}

/// Which table field produced an accepted match.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    KeywordExact,
    KeywordContained,
    DisplayName,
}

/// Why a query was not resolved. Callers normally collapse all of these to "not found".
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// Normalized query is shorter than `min_query_len`.
    QueryTooShort { normalized_len: usize },
    /// The table has no rows.
    NoCandidates,
    /// Best score did not reach `min_score`.
    BelowThreshold { best: i64 },
    /// Best and runner-up are closer than `min_gap`.
    Ambiguous { best: i64, runner_up: i64 },
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::QueryTooShort { .. } => "query_too_short",
            RejectReason::NoCandidates => "no_candidates",
            RejectReason::BelowThreshold { .. } => "below_threshold",
            RejectReason::Ambiguous { .. } => "ambiguous",
        }
    }
}

/// Result of resolving one query against one table snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome<'a> {
    Matched {
        record: &'a Record,
        source: MatchSource,
        score: i64,
    },
    Rejected(RejectReason),
}

impl<'a> MatchOutcome<'a> {
    pub fn record(&self) -> Option<&'a Record> {
        match self {
            MatchOutcome::Matched { record, .. } => Some(record),
            MatchOutcome::Rejected(_) => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Matched { .. })
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            MatchOutcome::Matched { .. } => None,
            MatchOutcome::Rejected(reason) => Some(*reason),
        }
    }

    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            MatchOutcome::Matched { .. } => "matched",
            MatchOutcome::Rejected(reason) => reason.as_str(),
        }
    }
}

/// One scored row, for diagnostics.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Candidate {
    pub display_name: String,
    pub score: i64,
    /// Position in the table.
    pub position: usize,
}

/// Errors produced by the matching layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("invalid match config: {0}")]
    InvalidConfig(String),
}
