use std::time::Duration;

use serde_json::json;

use super::{MailConfig, MailError, Mailer, OutgoingMail};

/// Sends mail through an HTTP email API.
///
/// The request is `POST {api_url}` with `Authorization: Bearer {api_key}` and
/// a JSON body `{ from, to: [..], subject, text, html }`. Any 2xx counts as
/// accepted.
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl HttpMailer {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        let api_url = config
            .api_url
            .as_deref()
            .ok_or_else(|| MailError::InvalidConfig("mail.api_url is required".into()))?;
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| MailError::InvalidConfig("mail.api_key is required".into()))?;
        Self::new(api_url, api_key, Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait::async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let payload = json!({
            "from": mail.from,
            "to": [mail.to],
            "subject": mail.subject,
            "text": mail.text,
            "html": mail.html,
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "mail API rejected message");
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(to = %mail.to, status = status.as_u16(), "mail accepted by API");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
