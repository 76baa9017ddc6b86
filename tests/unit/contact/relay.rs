use super::*;
use crate::foundation::error::CutoutError;

#[derive(Default)]
struct RecordingMailer {
    sent: Vec<MailMessage>,
    fail: bool,
}

impl MailTransport for RecordingMailer {
    fn send(&mut self, _config: &MailConfig, message: &MailMessage) -> CutoutResult<()> {
        if self.fail {
            return Err(CutoutError::http(502, "upstream down"));
        }
        self.sent.push(message.clone());
        Ok(())
    }
}

fn config() -> MailConfig {
    MailConfig {
        api_url: "https://mail.invalid/send".to_string(),
        api_key: "secret".to_string(),
        from: "site@example.com".to_string(),
        to: "owner@example.com".to_string(),
    }
}

fn relay() -> ContactRelay<RecordingMailer> {
    ContactRelay::new(Some(config()), RecordingMailer::default())
}

#[test]
fn valid_submission_is_mailed() {
    let mut r = relay();
    let reply = r.handle(
        br#"{"name":"Ada","email":"ada@example.com","message":"Hello <there>, nice site"}"#,
    );
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body_json().unwrap(), r#"{"ok":true}"#);

    let sent = &r.mailer().sent;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "New message from Ada");
    assert_eq!(sent[0].reply_to, "ada@example.com");
    assert_eq!(sent[0].from, "\"Portfolio Contact\" <site@example.com>");
    assert_eq!(sent[0].to, "owner@example.com");
    assert!(sent[0].html.contains("Hello &lt;there&gt;, nice site"));
}

#[test]
fn short_message_is_rejected_without_mail() {
    let mut r = relay();
    let reply = r.handle(br#"{"name":"Ada","email":"ada@example.com","message":"hi!!!"}"#);
    assert_eq!(reply.status, 400);
    assert!(!reply.body.ok);
    assert_eq!(reply.body.error.as_deref(), Some("Message is too short"));
    assert!(r.mailer().sent.is_empty());
}

#[test]
fn first_failing_rule_wins() {
    let mut r = relay();
    let reply = r.handle(br#"{"name":"A","email":"nope","message":"x"}"#);
    assert_eq!(reply.body.error.as_deref(), Some("Name is too short"));
    let reply = r.handle(br#"{"name":"Ada","email":"nope","message":"x"}"#);
    assert_eq!(reply.body.error.as_deref(), Some("Invalid email"));
    let reply = r.handle(br#"{"email":"ada@example.com"}"#);
    assert_eq!(reply.body.error.as_deref(), Some("Name is required"));
}

#[test]
fn honeypot_reports_success_and_sends_nothing() {
    let mut r = ContactRelay::new(None, RecordingMailer::default());
    let reply = r.handle(
        br#"{"name":"Bot","email":"bot@spam.com","message":"buy things now please","hp":"x"}"#,
    );
    assert_eq!(reply.status, 200);
    assert!(reply.body.ok);
    assert!(r.mailer().sent.is_empty());
}

#[test]
fn whitespace_honeypot_is_not_spam() {
    let mut r = relay();
    let reply = r.handle(
        br#"{"name":"Ada","email":"ada@example.com","message":"a real message","hp":"  "}"#,
    );
    assert_eq!(reply.status, 200);
    assert_eq!(r.mailer().sent.len(), 1);
}

#[test]
fn missing_configuration_is_a_server_error() {
    let mut r = ContactRelay::new(None, RecordingMailer::default());
    let reply = r.handle(br#"{"name":"Ada","email":"ada@example.com","message":"a real message"}"#);
    assert_eq!(reply.status, 500);
    assert_eq!(
        reply.body.error.as_deref(),
        Some("Server not configured for email.")
    );
}

#[test]
fn bad_json_and_mail_failure_share_the_generic_error() {
    let mut r = relay();
    let reply = r.handle(b"{not json");
    assert_eq!(reply.status, 400);
    assert_eq!(reply.body.error.as_deref(), Some("Validation or mail failed"));

    let mut r = ContactRelay::new(
        Some(config()),
        RecordingMailer {
            fail: true,
            ..RecordingMailer::default()
        },
    );
    let reply = r.handle(br#"{"name":"Ada","email":"ada@example.com","message":"a real message"}"#);
    assert_eq!(reply.status, 400);
    assert_eq!(
        reply.body_json().unwrap(),
        r#"{"ok":false,"error":"Validation or mail failed"}"#
    );
}

#[test]
fn email_shapes() {
    for ok in ["a@b.co", "first.last+tag@mail.example.org", "o'neil@x-y.io"] {
        assert!(is_plausible_email(ok), "{ok}");
    }
    for bad in ["", "a@b", "@b.co", "a@@b.co", "a b@c.co", "a@b.c", ".a@b.co", "a..b@c.co", "a@-b.co", "a@b.c0"] {
        assert!(!is_plausible_email(bad), "{bad}");
    }
}

#[test]
fn config_requires_every_variable() {
    let full = |k: &str| match k {
        "MAIL_API_URL" => Some("https://mail.invalid".to_string()),
        "MAIL_API_KEY" => Some("k".to_string()),
        "MAIL_FROM" => Some("a@b.co".to_string()),
        "CONTACT_TO" => Some("c@d.co".to_string()),
        _ => None,
    };
    let cfg = MailConfig::from_lookup(full).unwrap();
    assert_eq!(cfg.to, "c@d.co");
    assert!(!format!("{cfg:?}").contains("\"k\""));

    let blank_key = |k: &str| if k == "MAIL_API_KEY" { Some("  ".to_string()) } else { full(k) };
    assert!(MailConfig::from_lookup(blank_key).is_none());
}
