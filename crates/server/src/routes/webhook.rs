use crate::error::{ServerError, ServerResult};
use crate::mail::OutgoingMail;
use crate::payload::WebhookFields;
use crate::state::ServerState;
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use doclink::{LookupOutcome, MatchSource};
use serde::Serialize;
use std::sync::Arc;

/// Successful webhook response
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    pub document: String,
    pub link: String,
    pub recipient: String,
    pub source: MatchSource,
    pub score: i64,
}

/// Resolve the requested document and mail its link to the recipient.
///
/// The body is any JSON value; see [`WebhookFields::extract`] for the shapes
/// understood. Unresolved queries answer 404, and a matched row without a
/// link answers 500; neither sends mail.
pub async fn handle_webhook(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> ServerResult<Json<WebhookResponse>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ServerError::BadRequest("request body is empty".to_string()));
    }
    let payload: serde_json::Value = serde_json::from_slice(&body)?;
    let fields = WebhookFields::extract(&payload, &state.config.payload)?;

    let lookup = state.doclink.lookup(&fields.query);
    metrics::counter!("doclink_lookups_total", "outcome" => lookup.label()).increment(1);

    let (record, source, score) = match lookup.outcome {
        LookupOutcome::Matched {
            record,
            source,
            score,
        } => (record, source, score),
        LookupOutcome::Rejected(reason) => {
            tracing::info!(
                query = %fields.query,
                normalized = %lookup.normalized_query,
                generation = lookup.generation,
                ?reason,
                "no document for webhook query"
            );
            return Err(ServerError::DocumentNotFound {
                query: fields.query,
                reason,
            });
        }
    };

    if record.link().is_empty() {
        tracing::warn!(
            query = %fields.query,
            document = %record.display_name(),
            generation = lookup.generation,
            "matched table row has no link"
        );
        return Err(ServerError::MissingLink {
            document: record.display_name().to_string(),
        });
    }

    let mail = OutgoingMail::compose(&state.config.mail, &fields.name, &fields.email, &record);
    if let Err(err) = state.mailer.send(&mail).await {
        metrics::counter!("doclink_mail_failed_total").increment(1);
        tracing::warn!(
            transport = state.mailer.name(),
            to = %fields.email,
            document = %record.display_name(),
            error = %err,
            "mail send failed"
        );
        return Err(err.into());
    }
    metrics::counter!("doclink_mail_sent_total").increment(1);

    tracing::info!(
        query = %fields.query,
        document = %record.display_name(),
        ?source,
        score,
        to = %fields.email,
        transport = state.mailer.name(),
        "document link sent"
    );

    Ok(Json(WebhookResponse {
        status: "sent",
        document: record.display_name().to_string(),
        link: record.link().to_string(),
        recipient: fields.email,
        source,
        score,
    }))
}
