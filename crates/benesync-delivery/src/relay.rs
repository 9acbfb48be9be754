//! HTTP mail relay transport

use crate::error::MailError;
use crate::mail::{MailSender, OutgoingMail};
use serde::Serialize;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct RelayEnvelope<'a> {
    from: &'a str,
    #[serde(flatten)]
    mail: &'a OutgoingMail,
}

/// POSTs each message as a JSON envelope to a relay endpoint
#[derive(Debug, Clone)]
pub struct HttpMailRelay {
    client: reqwest::Client,
    url: String,
    from: String,
    timeout: Duration,
}

impl HttpMailRelay {
    /// Create relay client
    #[must_use]
    pub fn new(url: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            from: from.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set per-request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Relay endpoint
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl MailSender for HttpMailRelay {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        mail.validate()?;
        let envelope = RelayEnvelope {
            from: &self.from,
            mail,
        };

        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&envelope)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(to = %mail.to, relay = %self.url, "mail accepted by relay");
        Ok(())
    }
}
