use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::{Query, State};
use axum::Json;
use doclink::{LookupOutcome, MatchSource, RejectReason};
use matcher::Candidate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MAX_CANDIDATES: usize = 50;

/// Lookup query parameters
#[derive(Debug, Deserialize)]
pub struct LookupParams {
    pub q: Option<String>,

    /// Number of scored rows to include
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    5
}

/// Dry-run lookup response
#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub query: String,
    pub normalized_query: String,
    pub generation: u64,
    pub matched: bool,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<MatchSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<RejectReason>,
    /// Highest name scores in the same snapshot
    pub candidates: Vec<Candidate>,
}

/// Resolve `q` without sending mail and show how the rows scored.
pub async fn lookup(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<LookupParams>,
) -> ServerResult<Json<LookupResponse>> {
    let query = params
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ServerError::BadRequest("missing query parameter 'q'".to_string()))?;

    let table = state.doclink.snapshot();
    let lookup = state.doclink.lookup_in(&table, &query);
    let candidates = state.doclink.matcher().rank(
        &query,
        table.records(),
        params.limit.min(MAX_CANDIDATES),
    );

    let mut response = LookupResponse {
        query: lookup.query.clone(),
        normalized_query: lookup.normalized_query.clone(),
        generation: lookup.generation,
        matched: lookup.is_match(),
        outcome: lookup.label(),
        document: None,
        link: None,
        source: None,
        score: None,
        rejection: None,
        candidates,
    };
    match lookup.outcome {
        LookupOutcome::Matched {
            record,
            source,
            score,
        } => {
            response.document = Some(record.display_name().to_string());
            response.link = Some(record.link().to_string());
            response.source = Some(source);
            response.score = Some(score);
        }
        LookupOutcome::Rejected(reason) => response.rejection = Some(reason),
    }

    tracing::debug!(query = %response.query, outcome = response.outcome, "dry-run lookup");
    Ok(Json(response))
}
