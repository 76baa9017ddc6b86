use serde_json::Value;

use crate::contact::mail::{MailConfig, MailMessage, MailTransport};
use crate::foundation::error::{CutoutError, CutoutResult};

const GENERIC_FAILURE: &str = "Validation or mail failed";
const NOT_CONFIGURED: &str = "Server not configured for email.";

/// JSON body of a relay response.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ContactBody {
    /// Whether the submission was accepted.
    pub ok: bool,
    /// User-facing reason, on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Status code plus body, ready for the host's HTTP layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContactReply {
    /// HTTP status.
    pub status: u16,
    /// Response body.
    pub body: ContactBody,
}

impl ContactReply {
    fn ok() -> Self {
        Self {
            status: 200,
            body: ContactBody {
                ok: true,
                error: None,
            },
        }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ContactBody {
                ok: false,
                error: Some(message.into()),
            },
        }
    }

    /// Body serialized as JSON.
    pub fn body_json(&self) -> CutoutResult<String> {
        serde_json::to_string(&self.body).map_err(|e| CutoutError::serde(e.to_string()))
    }
}

/// A validated submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContactSubmission {
    /// Sender name.
    pub name: String,
    /// Sender address.
    pub email: String,
    /// Message text.
    pub message: String,
    /// Spam-trap field; real users leave it empty.
    pub honeypot: Option<String>,
}

impl ContactSubmission {
    /// Validate a decoded JSON body. The first failing rule's message is returned.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        let Some(obj) = value.as_object() else {
            return Err("Invalid input".to_string());
        };
        let field = |key: &str, label: &str| -> Result<String, String> {
            match obj.get(key) {
                None | Some(Value::Null) => Err(format!("{label} is required")),
                Some(Value::String(s)) => Ok(s.clone()),
                Some(_) => Err(format!("{label} must be a string")),
            }
        };

        let name = field("name", "Name")?;
        if name.chars().count() < 2 {
            return Err("Name is too short".to_string());
        }
        let email = field("email", "Email")?;
        if !is_plausible_email(&email) {
            return Err("Invalid email".to_string());
        }
        let message = field("message", "Message")?;
        if message.chars().count() < 10 {
            return Err("Message is too short".to_string());
        }
        let honeypot = match obj.get("hp") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err("Hp must be a string".to_string()),
        };

        Ok(Self {
            name,
            email,
            message,
            honeypot,
        })
    }

    /// True when the spam trap was filled in.
    pub fn is_spam(&self) -> bool {
        self.honeypot
            .as_deref()
            .is_some_and(|hp| !hp.trim().is_empty())
    }

    /// Build the outgoing message for `config`.
    pub fn to_mail(&self, config: &MailConfig) -> MailMessage {
        let html = format!(
            "<h3>New Portfolio Inquiry</h3>\n\
             <p><b>Name:</b> {}</p>\n\
             <p><b>Email:</b> {}</p>\n\
             <p style=\"white-space:pre-wrap\">{}</p>\n",
            escape_html(&self.name),
            escape_html(&self.email),
            escape_html(&self.message),
        );
        MailMessage {
            from: format!("\"Portfolio Contact\" <{}>", config.from),
            to: config.to.clone(),
            reply_to: self.email.clone(),
            subject: format!("New message from {}", self.name),
            html,
        }
    }
}

/// The contact-form endpoint: validate, drop spam, mail the rest.
#[derive(Debug)]
pub struct ContactRelay<M: MailTransport> {
    config: Option<MailConfig>,
    mailer: M,
}

impl<M: MailTransport> ContactRelay<M> {
    /// Relay sending through `mailer`; `config` is `None` when the environment is incomplete.
    pub fn new(config: Option<MailConfig>, mailer: M) -> Self {
        Self { config, mailer }
    }

    /// Underlying mailer.
    pub fn mailer(&self) -> &M {
        &self.mailer
    }

    /// Handle one POSTed JSON body.
    #[tracing::instrument(skip(self, body), fields(len = body.len()))]
    pub fn handle(&mut self, body: &[u8]) -> ContactReply {
        let value: Value = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(err) => {
                tracing::warn!(error = %err, "contact body is not JSON");
                return ContactReply::error(400, GENERIC_FAILURE);
            }
        };
        let submission = match ContactSubmission::from_json(&value) {
            Ok(s) => s,
            Err(msg) => return ContactReply::error(400, msg),
        };

        if submission.is_spam() {
            tracing::info!("honeypot filled; dropping submission");
            return ContactReply::ok();
        }

        let Some(config) = self.config.as_ref() else {
            tracing::error!("mail transport not configured");
            return ContactReply::error(500, NOT_CONFIGURED);
        };

        let message = submission.to_mail(config);
        match self.mailer.send(config, &message) {
            Ok(()) => ContactReply::ok(),
            Err(err) => {
                tracing::error!(error = %err, "sending contact mail failed");
                ContactReply::error(400, GENERIC_FAILURE)
            }
        }
    }
}

/// Loose address check: `local@label.label...tld`, no whitespace, no empty or doubled dots,
/// alphabetic top-level domain of at least two letters.
pub fn is_plausible_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let local_ok = local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "_'+-.".contains(c));
    if !local_ok || local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let label_ok = |l: &&str| {
        !l.is_empty()
            && !l.starts_with('-')
            && l.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    };
    let tld = labels[labels.len() - 1];
    labels.iter().all(label_ok) && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}

/// Escape text for inclusion in HTML element content or attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

#[cfg(test)]
#[path = "../../tests/unit/contact/relay.rs"]
mod tests;
