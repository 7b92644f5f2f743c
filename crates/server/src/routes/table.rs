use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use doclink::RecordTable;
use serde::Serialize;
use std::sync::Arc;

/// Reference table metadata
#[derive(Debug, Serialize)]
pub struct TableInfo {
    pub records: usize,
    pub generation: u64,
    pub source: String,
    pub loaded_at: DateTime<Utc>,
    pub has_keywords: bool,
}

impl From<&RecordTable> for TableInfo {
    fn from(table: &RecordTable) -> Self {
        Self {
            records: table.len(),
            generation: table.generation(),
            source: table.source().to_string(),
            loaded_at: table.loaded_at(),
            has_keywords: table.has_keywords(),
        }
    }
}

/// Describe the live table.
pub async fn table_info(State(state): State<Arc<ServerState>>) -> Json<TableInfo> {
    Json(TableInfo::from(state.doclink.snapshot().as_ref()))
}

/// Re-read the table from its backend. On failure the previous table stays live.
pub async fn reload_table(State(state): State<Arc<ServerState>>) -> ServerResult<Json<TableInfo>> {
    let doclink = state.doclink.clone();
    let table = tokio::task::spawn_blocking(move || doclink.reload())
        .await
        .map_err(|e| ServerError::Internal(format!("reload task failed: {e}")))??;

    metrics::counter!("doclink_table_reloads_total").increment(1);
    tracing::info!(
        records = table.len(),
        generation = table.generation(),
        source = %table.source(),
        "table reloaded"
    );

    Ok(Json(TableInfo::from(table.as_ref())))
}
