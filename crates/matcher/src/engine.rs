use canonical::{is_normalized, normalize, token_set, tokenize};
use index::Record;

use crate::types::{Candidate, MatchConfig, MatchError, MatchOutcome, MatchSource, RejectReason};


/// Resolves free-text document identifiers against a record table.
///
/// Holds only configuration; tables are passed per call so one matcher can
/// serve every snapshot generation.
#[derive(Debug, Clone)]
pub struct Matcher {
    config: MatchConfig,
    /// Normalized, de-duplicated, non-empty vocabulary terms.
    vocabulary: Vec<String>,
}

impl Matcher {
    /// Validate `config` and prepare its vocabulary.
    pub fn new(config: MatchConfig) -> Result<Self, MatchError> {
        config.validate()?;
        let vocabulary = prepare_vocabulary(&config.vocabulary);
        Ok(Self { config, vocabulary })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Effective bonus vocabulary after normalization.
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Similarity of two *normalized* strings.
    ///
    /// Tiers, first applicable wins: equality, candidate contains query,
    /// query contains candidate, token overlap ratio. Every tier except
    /// equality adds the vocabulary bonus. Not symmetric.
    pub fn score(&self, query: &str, candidate: &str) -> i64 {
        debug_assert!(is_normalized(query) && is_normalized(candidate));
        let cfg = &self.config;
        if query == candidate {
            return cfg.exact_score;
        }
        // Every string contains "", so an empty side would land in a containment tier.
        if query.is_empty() || candidate.is_empty() {
            return 0;
        }

        let base = if candidate.contains(query) {
            cfg.contains_score
        } else if query.contains(candidate) {
            cfg.contained_score
        } else {
            self.overlap_score(query, candidate)
        };

        base + self.bonus(query, candidate)
    }

    fn overlap_score(&self, query: &str, candidate: &str) -> i64 {
        let candidate_tokens = token_set(candidate);
        let query_tokens = tokenize(query);
        let hits = query_tokens
            .iter()
            .filter(|token| candidate_tokens.contains(token.text))
            .count();
        let ratio = hits as f64 / query_tokens.len().max(1) as f64;
        (ratio * self.config.overlap_scale as f64).round() as i64
    }

    fn bonus(&self, query: &str, candidate: &str) -> i64 {
        let shared = self
            .vocabulary
            .iter()
            .filter(|term| query.contains(term.as_str()) && candidate.contains(term.as_str()))
            .count() as i64;
        shared * self.config.bonus_weight
    }

    /// Resolve `query` to a record, or `None` for any rejection.
    pub fn resolve<'a>(&self, query: &str, records: &'a [Record]) -> Option<&'a Record> {
        self.resolve_detailed(query, records).record()
    }

    /// Resolve `query`, keeping the reason when nothing is accepted.
    ///
    /// Keyword matches are tried first and short-circuit name scoring. Name
    /// scoring scans the table once; on a tie for the top score the earlier
    /// record is kept, and the tie itself makes the result ambiguous.
    pub fn resolve_detailed<'a>(&self, query: &str, records: &'a [Record]) -> MatchOutcome<'a> {
        let query = normalize(query);
        if query.len() < self.config.min_query_len {
            tracing::debug!(normalized_len = query.len(), "query too short");
            return MatchOutcome::Rejected(RejectReason::QueryTooShort {
                normalized_len: query.len(),
            });
        }

        if let Some(outcome) = self.keyword_match(&query, records) {
            return outcome;
        }

        let mut best: Option<(usize, i64)> = None;
        let mut runner_up: Option<i64> = None;
        for (idx, record) in records.iter().enumerate() {
            let score = self.score(&query, record.normalized_display_name());
            match best {
                Some((_, top)) if score <= top => {
                    if runner_up.is_none_or(|r| score > r) {
                        runner_up = Some(score);
                    }
                }
                _ => {
                    if let Some((_, top)) = best {
                        runner_up = Some(top);
                    }
                    best = Some((idx, score));
                }
            }
        }

        let Some((idx, best_score)) = best else {
            tracing::debug!(query = %query, "no candidates in table");
            return MatchOutcome::Rejected(RejectReason::NoCandidates);
        };

        if best_score < self.config.min_score {
            tracing::debug!(query = %query, best = best_score, "best score below threshold");
            return MatchOutcome::Rejected(RejectReason::BelowThreshold { best: best_score });
        }

        if let Some(second) = runner_up {
            if best_score - second < self.config.min_gap {
                tracing::debug!(
                    query = %query,
                    best = best_score,
                    runner_up = second,
                    "ambiguous match"
                );
                return MatchOutcome::Rejected(RejectReason::Ambiguous {
                    best: best_score,
                    runner_up: second,
                });
            }
        }

        MatchOutcome::Matched {
            record: &records[idx],
            source: MatchSource::DisplayName,
            score: best_score,
        }
    }

    /// Keyword equality, then keyword contained in the query as whole tokens.
    fn keyword_match<'a>(&self, query: &str, records: &'a [Record]) -> Option<MatchOutcome<'a>> {
        if let Some(record) = records
            .iter()
            .find(|r| !r.normalized_keyword().is_empty() && r.normalized_keyword() == query)
        {
            return Some(MatchOutcome::Matched {
                record,
                source: MatchSource::KeywordExact,
                score: self.config.exact_score,
            });
        }

        let padded_query = format!(" {query} ");
        let mut chosen: Option<&'a Record> = None;
        for record in records {
            let keyword = record.normalized_keyword();
            if keyword.is_empty() || !padded_query.contains(&format!(" {keyword} ")) {
                continue;
            }
            // Longest keyword is the most specific; ties keep table order.
            if chosen.is_none_or(|c| keyword.len() > c.normalized_keyword().len()) {
                chosen = Some(record);
            }
        }

        chosen.map(|record| MatchOutcome::Matched {
            record,
            source: MatchSource::KeywordContained,
            score: self.config.contained_score,
        })
    }

    /// Top `limit` rows by name score, highest first, table order on ties.
    pub fn rank(&self, query: &str, records: &[Record], limit: usize) -> Vec<Candidate> {
        let query = normalize(query);
        let mut scored: Vec<Candidate> = records
            .iter()
            .enumerate()
            .map(|(position, record)| Candidate {
                display_name: record.display_name().to_string(),
                score: self.score(&query, record.normalized_display_name()),
                position,
            })
            .collect();
        scored.sort_by(|a, b| b.score.cmp(&a.score).then(a.position.cmp(&b.position)));
        scored.truncate(limit);
        scored
    }
}

impl Default for Matcher {
    fn default() -> Self {
        let config = MatchConfig::default();
        let vocabulary = prepare_vocabulary(&config.vocabulary);
        Self { config, vocabulary }
    }
}

/// Normalize, de-duplicate and drop empty terms, keeping first occurrences.
fn prepare_vocabulary(terms: &[String]) -> Vec<String> {
    let mut vocabulary: Vec<String> = Vec::with_capacity(terms.len());
    for term in terms {
        let term = normalize(term);
        if !term.is_empty() && !vocabulary.contains(&term) {
            vocabulary.push(term);
        }
    }
    vocabulary
}
