//! Outbound notification mail.
//!
//! A matched lookup becomes an [`OutgoingMail`] built from the configured
//! templates and handed to a [`Mailer`]. Two transports ship:
//!
//! - [`LogMailer`]: writes the message to the log and succeeds. Default, for
//!   development and dry deployments.
//! - [`HttpMailer`]: POSTs the message as JSON to an HTTP email API with a
//!   bearer token.

mod http;
mod log;

pub use self::http::HttpMailer;
pub use self::log::LogMailer;

use index::Record;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Errors from composing or sending mail.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid mail config: {0}")]
    InvalidConfig(String),
    #[error("mail transport failed: {0}")]
    Transport(String),
    #[error("mail API rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<reqwest::Error> for MailError {
    fn from(err: reqwest::Error) -> Self {
        MailError::Transport(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MailTransport {
    #[default]
    Log,
    Http,
}

/// Mail transport selection and message templates.
///
/// Templates substitute `{name}`, `{document}` and `{link}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MailConfig {
    #[serde(default)]
    pub transport: MailTransport,
    #[serde(default = "MailConfig::default_from")]
    pub from: String,
    /// HTTP email API endpoint (transport `http`).
    #[serde(default)]
    pub api_url: Option<String>,
    /// Bearer token for the email API (transport `http`).
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "MailConfig::default_subject_template")]
    pub subject_template: String,
    #[serde(default = "MailConfig::default_body_template")]
    pub body_template: String,
    #[serde(default = "MailConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl MailConfig {
    fn default_from() -> String {
        "documents@localhost".to_string()
    }

    fn default_subject_template() -> String {
        "Your document: {document}".to_string()
    }

    fn default_body_template() -> String {
        "Hi {name},\n\nHere is the document you asked for, {document}:\n{link}\n".to_string()
    }

    fn default_timeout_secs() -> u64 {
        15
    }

    pub fn validate(&self) -> Result<(), MailError> {
        if self.from.trim().is_empty() {
            return Err(MailError::InvalidConfig("mail.from must not be empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(MailError::InvalidConfig(
                "mail.timeout_secs must be greater than zero".into(),
            ));
        }
        if self.transport == MailTransport::Http {
            let missing = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
            if missing(&self.api_url) {
                return Err(MailError::InvalidConfig(
                    "mail.api_url is required for the http transport".into(),
                ));
            }
            if missing(&self.api_key) {
                return Err(MailError::InvalidConfig(
                    "mail.api_key is required for the http transport".into(),
                ));
            }
        }
        Ok(())
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: MailTransport::default(),
            from: Self::default_from(),
            api_url: None,
            api_key: None,
            subject_template: Self::default_subject_template(),
            body_template: Self::default_body_template(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

/// A fully rendered message.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl OutgoingMail {
    /// Render the configured templates for `record` addressed to `name <to>`.
    pub fn compose(config: &MailConfig, name: &str, to: &str, record: &Record) -> Self {
        let fields = Fields {
            name,
            document: record.display_name(),
            link: record.link(),
        };
        Self {
            from: config.from.clone(),
            to: to.to_string(),
            subject: render_text(&config.subject_template, &fields),
            text: render_text(&config.body_template, &fields),
            html: render_html(&config.body_template, &fields),
        }
    }
}

/// Values available to templates.
struct Fields<'a> {
    name: &'a str,
    document: &'a str,
    link: &'a str,
}

impl Fields<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        match key {
            "name" => Some(self.name),
            "document" => Some(self.document),
            "link" => Some(self.link),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'t> {
    Literal(&'t str),
    Field(&'t str),
}

/// Split a template into literal text and known `{field}` placeholders.
///
/// Unknown braces stay literal. Substituted values are never scanned again.
fn segments<'t>(template: &'t str, fields: &Fields<'_>) -> Vec<Segment<'t>> {
    let mut out = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let tail = &rest[open + 1..];
        let key = tail
            .find('}')
            .map(|close| &tail[..close])
            .filter(|key| fields.get(key).is_some());
        match key {
            Some(key) => {
                if open > 0 {
                    out.push(Segment::Literal(&rest[..open]));
                }
                out.push(Segment::Field(key));
                rest = &tail[key.len() + 1..];
            }
            None => {
                out.push(Segment::Literal(&rest[..=open]));
                rest = tail;
            }
        }
    }
    if !rest.is_empty() {
        out.push(Segment::Literal(rest));
    }
    out
}

fn render_text(template: &str, fields: &Fields<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    for segment in segments(template, fields) {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Field(key) => out.push_str(fields.get(key).unwrap_or_default()),
        }
    }
    out
}

/// Escape the body, break lines, and hyperlink `{link}` substitutions.
fn render_html(template: &str, fields: &Fields<'_>) -> String {
    let mut out = String::with_capacity(template.len() + 64);
    out.push_str("<p>");
    for segment in segments(template, fields) {
        match segment {
            Segment::Field("link") if !fields.link.is_empty() => {
                let link = escape_html(fields.link);
                out.push_str(&format!("<a href=\"{link}\">{link}</a>"));
            }
            Segment::Literal(text) => push_html(&mut out, text),
            Segment::Field(key) => push_html(&mut out, fields.get(key).unwrap_or_default()),
        }
    }
    out.push_str("</p>");
    out
}

fn push_html(out: &mut String, text: &str) {
    out.push_str(&escape_html(text).replace('\n', "<br>\n"));
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// A way to deliver [`OutgoingMail`].
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError>;

    /// Transport name for logs.
    fn name(&self) -> &'static str;
}

/// Build the transport selected by `config`.
pub fn build_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    config.validate()?;
    Ok(match config.transport {
        MailTransport::Log => Arc::new(LogMailer),
        MailTransport::Http => Arc::new(HttpMailer::from_config(config)?),
    })
}
