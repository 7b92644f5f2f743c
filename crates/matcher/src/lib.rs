//! # doclink matcher (`matcher`)
//!
//! ## Purpose
//!
//! Turns a free-text document identifier ("welcome letter", "Unit 1 flip
//! book pdf") into one row of the reference table, or refuses. Refusing is
//! the common case for vague input: guessing the wrong document and mailing
//! it out is worse than answering "not found".
//!
//! ## Pipeline
//!
//! 1. [`canonical::normalize`] the query; too-short queries are rejected.
//! 2. Keyword phase: exact keyword, then keyword contained in the query as
//!    whole tokens. A hit here ends resolution.
//! 3. Name phase: [`Matcher::score`] every display name once, keeping the
//!    best record and the two top scores.
//! 4. Reject a weak best ([`MatchConfig::min_score`]) or a close runner-up
//!    ([`MatchConfig::min_gap`]); otherwise accept.
//!
//! ## Core Types
//!
//! - [`MatchConfig`]: thresholds, tier scores and the bonus vocabulary.
//! - [`Matcher`]: the scorer and resolver.
//! - [`MatchOutcome`]: `Matched` with the record, or `Rejected` with a
//!   [`RejectReason`].
//!
//! ## Example
//!
//! ```
//! use index::Record;
//! use matcher::{Matcher, MatchOutcome, RejectReason};
//!
//! let table = vec![
//!     Record::new("", "Grade 1 Welcome Letter", "https://example.com/welcome.pdf"),
//!     Record::new("", "Grade 2 Consonant Chart", "https://example.com/chart.pdf"),
//! ];
//! let matcher = Matcher::default();
//!
//! let hit = matcher.resolve("welcome letter", &table).unwrap();
//! assert_eq!(hit.link(), "https://example.com/welcome.pdf");
//!
//! assert!(matches!(
//!     matcher.resolve_detailed("pdf", &table),
//!     MatchOutcome::Rejected(RejectReason::QueryTooShort { .. })
//! ));
//! ```

pub mod engine;
pub mod types;

pub use crate::engine::Matcher;
pub use crate::types::{
    Candidate, MatchConfig, MatchError, MatchOutcome, MatchSource, RejectReason,
    DEFAULT_VOCABULARY,
};
