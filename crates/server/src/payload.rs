//! Field extraction from webhook bodies.
//!
//! Automation platforms wrap the same three fields in different shapes:
//! flat objects, `{ "data": {..} }`, `{ "customData": {..} }`, values boxed as
//! `{ "value": ".." }`, one-element arrays, or a nested body sent as a JSON
//! string. [`WebhookFields::extract`] looks through all of them.
//!
//! Keys compare case-insensitively with `_`, `-` and spaces ignored, so
//! `pdfName`, `pdf_name` and `PDF Name` are the same key.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ServerError, ServerResult};

/// How deep to follow container keys.
const MAX_DEPTH: usize = 4;

/// Key aliases searched for each field, in priority order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PayloadConfig {
    #[serde(default = "PayloadConfig::default_query_fields")]
    pub query_fields: Vec<String>,
    #[serde(default = "PayloadConfig::default_email_fields")]
    pub email_fields: Vec<String>,
    #[serde(default = "PayloadConfig::default_name_fields")]
    pub name_fields: Vec<String>,
    /// Keys whose values are searched as nested payloads.
    #[serde(default = "PayloadConfig::default_containers")]
    pub containers: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl PayloadConfig {
    fn default_query_fields() -> Vec<String> {
        strings(&[
            "keyword",
            "pdf_name",
            "pdf",
            "document_name",
            "document",
            "file_name",
            "query",
            "search",
        ])
    }

    fn default_email_fields() -> Vec<String> {
        strings(&["email", "recipient_email", "email_address", "to"])
    }

    fn default_name_fields() -> Vec<String> {
        strings(&[
            "name",
            "recipient_name",
            "full_name",
            "first_name",
            "contact_name",
        ])
    }

    fn default_containers() -> Vec<String> {
        strings(&[
            "data",
            "custom_data",
            "body",
            "payload",
            "args",
            "arguments",
            "parameters",
            "params",
            "contact",
        ])
    }
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            query_fields: Self::default_query_fields(),
            email_fields: Self::default_email_fields(),
            name_fields: Self::default_name_fields(),
            containers: Self::default_containers(),
        }
    }
}

/// The three fields a webhook must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookFields {
    pub query: String,
    pub email: String,
    pub name: String,
}

impl WebhookFields {
    pub fn extract(body: &Value, config: &PayloadConfig) -> ServerResult<Self> {
        let query = find_field(body, &config.query_fields, &config.containers)
            .ok_or_else(|| missing("document name or keyword", &config.query_fields))?;
        let email = find_field(body, &config.email_fields, &config.containers)
            .ok_or_else(|| missing("recipient email", &config.email_fields))?;
        let name = find_field(body, &config.name_fields, &config.containers)
            .ok_or_else(|| missing("recipient name", &config.name_fields))?;

        if !is_plausible_email(&email) {
            return Err(ServerError::BadRequest(format!(
                "recipient email {email:?} is not a valid address"
            )));
        }

        Ok(Self { query, email, name })
    }
}

fn missing(what: &str, aliases: &[String]) -> ServerError {
    ServerError::BadRequest(format!(
        "missing {what}; expected one of: {}",
        aliases.join(", ")
    ))
}

/// Lowercase alphanumerics only.
fn fold_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// First usable value for any alias, searching the top level before containers.
pub fn find_field(body: &Value, aliases: &[String], containers: &[String]) -> Option<String> {
    let aliases: Vec<String> = aliases.iter().map(|a| fold_key(a)).collect();
    let containers: Vec<String> = containers.iter().map(|c| fold_key(c)).collect();
    search(body, &aliases, &containers, MAX_DEPTH)
}

fn search(value: &Value, aliases: &[String], containers: &[String], depth: usize) -> Option<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .find_map(|item| search(item, aliases, containers, depth)),
        Value::String(s) if depth > 0 => {
            // Some platforms forward the original body as a JSON string.
            let nested: Value = serde_json::from_str(s).ok()?;
            if nested.is_object() || nested.is_array() {
                search(&nested, aliases, containers, depth - 1)
            } else {
                None
            }
        }
        Value::Object(map) => {
            for alias in aliases {
                let hit = map
                    .iter()
                    .filter(|(k, _)| fold_key(k) == *alias)
                    .find_map(|(_, v)| scalar(v));
                if hit.is_some() {
                    return hit;
                }
            }
            if depth == 0 {
                return None;
            }
            for container in containers {
                let hit = map
                    .iter()
                    .filter(|(k, _)| fold_key(k) == *container)
                    .find_map(|(_, v)| search(v, aliases, containers, depth - 1));
                if hit.is_some() {
                    return hit;
                }
            }
            None
        }
        _ => None,
    }
}

/// Unwrap a field value to trimmed, non-empty text.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.iter().find_map(scalar),
        Value::Object(map) => map
            .iter()
            .find(|(k, _)| fold_key(k) == "value")
            .and_then(|(_, v)| scalar(v)),
        Value::Bool(_) | Value::Null => None,
    }
}

fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => !local.is_empty() && !domain.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract(body: Value) -> ServerResult<WebhookFields> {
        WebhookFields::extract(&body, &PayloadConfig::default())
    }

    #[test]
    fn flat_body() {
        let f = extract(json!({
            "pdfName": "Welcome Letter",
            "email": "ana@example.org",
            "name": "Ana"
        }))
        .unwrap();
        assert_eq!(f.query, "Welcome Letter");
        assert_eq!(f.email, "ana@example.org");
        assert_eq!(f.name, "Ana");
    }

    #[test]
    fn custom_data_wrapper_with_value_boxes() {
        let f = extract(json!({
            "contact_id": "c-1",
            "customData": {
                "PDF Name": { "value": "Unit 1 Flip Book" },
                "recipientEmail": ["lee@example.org"],
                "full_name": "  Lee Park  "
            }
        }))
        .unwrap();
        assert_eq!(f.query, "Unit 1 Flip Book");
        assert_eq!(f.email, "lee@example.org");
        assert_eq!(f.name, "Lee Park");
    }

    #[test]
    fn top_level_wins_over_containers() {
        let f = extract(json!({
            "keyword": "top",
            "email": "a@b.c",
            "name": "A",
            "data": { "keyword": "nested" }
        }))
        .unwrap();
        assert_eq!(f.query, "top");
    }

    #[test]
    fn alias_priority_order() {
        let body = json!({ "search": "later", "keyword": "first" });
        let cfg = PayloadConfig::default();
        assert_eq!(
            find_field(&body, &cfg.query_fields, &cfg.containers).as_deref(),
            Some("first")
        );
    }

    #[test]
    fn stringified_nested_body() {
        let f = extract(json!({
            "body": "{\"data\":{\"document\":\"Vowel Poster\",\"email\":\"x@y.z\",\"first_name\":\"Sam\"}}"
        }))
        .unwrap();
        assert_eq!(f.query, "Vowel Poster");
        assert_eq!(f.name, "Sam");
    }

    #[test]
    fn numbers_are_accepted_as_text() {
        let body = json!({ "args": [{ "keyword": 1234 }] });
        let cfg = PayloadConfig::default();
        assert_eq!(
            find_field(&body, &cfg.query_fields, &cfg.containers).as_deref(),
            Some("1234")
        );
    }

    #[test]
    fn blank_values_are_skipped() {
        let body = json!({ "keyword": "   ", "data": { "pdf": "Chart" } });
        let cfg = PayloadConfig::default();
        assert_eq!(
            find_field(&body, &cfg.query_fields, &cfg.containers).as_deref(),
            Some("Chart")
        );
    }

    #[test]
    fn missing_field_names_aliases() {
        let err = extract(json!({ "email": "a@b.c", "name": "A" })).unwrap_err();
        match err {
            ServerError::BadRequest(msg) => {
                assert!(msg.contains("document name or keyword"));
                assert!(msg.contains("pdf_name"));
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn invalid_email_rejected() {
        for email in ["no-at-sign", "two@@example.org", "@example.org", "a b@example.org"] {
            let err = extract(json!({ "pdf": "Chart", "email": email, "name": "A" }));
            assert!(
                matches!(err, Err(ServerError::BadRequest(_))),
                "{email} accepted"
            );
        }
    }

    #[test]
    fn depth_is_bounded() {
        let mut body = json!({ "keyword": "deep" });
        for _ in 0..(MAX_DEPTH + 1) {
            body = json!({ "data": body });
        }
        let cfg = PayloadConfig::default();
        assert_eq!(find_field(&body, &cfg.query_fields, &cfg.containers), None);
    }
}
