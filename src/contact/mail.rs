use std::time::Duration;

use crate::foundation::error::{CutoutError, CutoutResult};

/// Environment variable naming the outbound mail API endpoint.
pub const MAIL_API_URL_ENV: &str = "MAIL_API_URL";
/// Environment variable holding the mail API bearer token.
pub const MAIL_API_KEY_ENV: &str = "MAIL_API_KEY";
/// Environment variable with the sender mailbox.
pub const MAIL_FROM_ENV: &str = "MAIL_FROM";
/// Environment variable with the inbox that receives contact messages.
pub const CONTACT_TO_ENV: &str = "CONTACT_TO";

/// Where and as whom contact messages are sent.
#[derive(Clone, PartialEq, Eq)]
pub struct MailConfig {
    /// Mail API endpoint.
    pub api_url: String,
    /// Bearer token for the mail API.
    pub api_key: String,
    /// Sender mailbox.
    pub from: String,
    /// Recipient mailbox.
    pub to: String,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

impl MailConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Read the configuration through `lookup`. `None` if any variable is unset or blank.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let missing: Vec<_> = [MAIL_API_URL_ENV, MAIL_API_KEY_ENV, MAIL_FROM_ENV, CONTACT_TO_ENV]
            .into_iter()
            .filter(|k| get(k).is_none())
            .collect();
        if !missing.is_empty() {
            tracing::error!(?missing, "mail environment incomplete");
            return None;
        }
        Some(Self {
            api_url: get(MAIL_API_URL_ENV)?,
            api_key: get(MAIL_API_KEY_ENV)?,
            from: get(MAIL_FROM_ENV)?,
            to: get(CONTACT_TO_ENV)?,
        })
    }
}

/// An outgoing message, serialized as the mail API request body.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct MailMessage {
    /// `From:` header, display name included.
    pub from: String,
    /// Recipient.
    pub to: String,
    /// `Reply-To:` header.
    pub reply_to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
}

/// Hands finished messages to a mail service.
pub trait MailTransport {
    /// Deliver `message` using `config`.
    fn send(&mut self, config: &MailConfig, message: &MailMessage) -> CutoutResult<()>;
}

/// Mail API client over `reqwest::blocking`.
#[derive(Clone, Debug)]
pub struct HttpMailTransport {
    client: reqwest::blocking::Client,
}

impl HttpMailTransport {
    /// Client with a request timeout of `timeout_secs`.
    pub fn new(timeout_secs: u64) -> CutoutResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .map_err(|e| CutoutError::network(format!("build mail client: {e}")))?;
        Ok(Self { client })
    }
}

impl MailTransport for HttpMailTransport {
    #[tracing::instrument(skip(self, config, message), fields(subject = %message.subject))]
    fn send(&mut self, config: &MailConfig, message: &MailMessage) -> CutoutResult<()> {
        let resp = self
            .client
            .post(&config.api_url)
            .bearer_auth(&config.api_key)
            .json(message)
            .send()
            .map_err(|e| CutoutError::network(format!("POST {}: {e}", config.api_url)))?;
        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(CutoutError::http(status, body));
        }
        tracing::info!(status, "mail accepted");
        Ok(())
    }
}
