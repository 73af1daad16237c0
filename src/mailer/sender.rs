use crate::config::MailConfig;
use crate::error::{Result, ToolError};
use crate::mailer::recipients::Recipient;
use crate::mailer::template;
use crate::ui::ShutdownToken;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl From<&MailConfig> for SmtpSettings {
    fn from(config: &MailConfig) -> Self {
        Self {
            host: config.smtp_server.clone(),
            port: config.smtp_port,
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }
}

/// Delivery of a fully built message.
pub trait MailTransport {
    fn deliver(&self, message: &Message) -> Result<()>;
}

/// STARTTLS submission, one session per message.
pub struct SmtpMailTransport {
    settings: SmtpSettings,
    timeout: Duration,
}

impl SmtpMailTransport {
    pub fn new(settings: SmtpSettings) -> Self {
        Self {
            settings,
            timeout: Duration::from_secs(60),
        }
    }
}

impl MailTransport for SmtpMailTransport {
    fn deliver(&self, message: &Message) -> Result<()> {
        let credentials = Credentials::new(
            self.settings.username.clone(),
            self.settings.password.clone(),
        );

        let transport = SmtpTransport::starttls_relay(&self.settings.host)
            .map_err(|e| ToolError::Mail {
                message: format!("cannot connect to {}: {}", self.settings.host, e),
            })?
            .port(self.settings.port)
            .credentials(credentials)
            .timeout(Some(self.timeout))
            .build();

        transport.send(message).map_err(|e| ToolError::Mail {
            message: e.to_string(),
        })?;

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    Failed(String),
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    pub success: usize,
    pub failed: usize,
}

impl BulkReport {
    pub fn total(&self) -> usize {
        self.success + self.failed
    }

    fn record(mut self, outcome: &SendOutcome) -> Self {
        if outcome.is_sent() {
            self.success += 1;
        } else {
            self.failed += 1;
        }
        self
    }
}

pub struct EmailSender<T = SmtpMailTransport> {
    settings: SmtpSettings,
    transport: T,
    shutdown: Option<ShutdownToken>,
}

impl EmailSender<SmtpMailTransport> {
    pub fn new(settings: SmtpSettings) -> Self {
        let transport = SmtpMailTransport::new(settings.clone());
        Self::with_transport(settings, transport)
    }
}

impl<T: MailTransport> EmailSender<T> {
    pub fn with_transport(settings: SmtpSettings, transport: T) -> Self {
        Self {
            settings,
            transport,
            shutdown: None,
        }
    }

    /// Bulk sends stop before the next recipient once `shutdown` is cancelled.
    pub fn with_shutdown(mut self, shutdown: ShutdownToken) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send one message to every address in a single envelope.
    ///
    /// Never fails: build and transport errors come back as
    /// [`SendOutcome::Failed`].
    pub fn send_email(
        &self,
        to_addresses: &[String],
        subject: &str,
        body: &str,
        html: bool,
    ) -> SendOutcome {
        let result = self
            .build_message(to_addresses, subject, body, html)
            .and_then(|message| self.transport.deliver(&message));

        match result {
            Ok(()) => {
                log::info!("Email sent successfully to {} recipient(s)", to_addresses.len());
                SendOutcome::Sent
            }
            Err(e) => {
                log::error!("Failed to send email: {}", e);
                SendOutcome::Failed(e.to_string())
            }
        }
    }

    /// Render `body_template` per recipient and send each one its own copy.
    ///
    /// On cancellation the counts cover only the recipients tried so far.
    pub fn send_bulk_emails(
        &self,
        recipients: &[Recipient],
        subject: &str,
        body_template: &str,
    ) -> BulkReport {
        let mut report = BulkReport::default();

        for recipient in recipients {
            if self.shutdown.as_ref().is_some_and(ShutdownToken::is_cancelled) {
                log::warn!(
                    "Bulk send stopped after {} of {} recipient(s)",
                    report.total(),
                    recipients.len()
                );
                break;
            }
            let outcome = self.send_to_recipient(recipient, subject, body_template);
            report = report.record(&outcome);
        }

        report
    }

    fn send_to_recipient(
        &self,
        recipient: &Recipient,
        subject: &str,
        body_template: &str,
    ) -> SendOutcome {
        let Some(email) = recipient.email() else {
            log::error!("Error sending to unknown: recipient has no 'email' field");
            return SendOutcome::Failed("missing 'email' field".to_string());
        };

        match template::render(body_template, &recipient.fields) {
            Ok(body) => self.send_email(&[email.to_string()], subject, &body, false),
            Err(e) => {
                log::error!("Error sending to {}: {}", email, e);
                SendOutcome::Failed(e.to_string())
            }
        }
    }

    fn build_message(
        &self,
        to_addresses: &[String],
        subject: &str,
        body: &str,
        html: bool,
    ) -> Result<Message> {
        if to_addresses.is_empty() {
            return Err(ToolError::Mail {
                message: "no recipients given".to_string(),
            });
        }

        let from: Mailbox = parse_mailbox(&self.settings.username)?;
        let mut builder = Message::builder().from(from).subject(subject);
        for address in to_addresses {
            builder = builder.to(parse_mailbox(address)?);
        }

        let part = if html {
            SinglePart::html(body.to_string())
        } else {
            SinglePart::plain(body.to_string())
        };

        builder
            .multipart(MultiPart::alternative().singlepart(part))
            .map_err(|e| ToolError::Mail {
                message: e.to_string(),
            })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address.trim().parse::<Mailbox>().map_err(|e| ToolError::Mail {
        message: format!("invalid address '{}': {}", address, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Keeps delivered messages in memory; fails for listed addresses.
    #[derive(Default)]
    struct MemoryTransport {
        delivered: RefCell<Vec<(Vec<String>, String)>>,
        reject: Vec<String>,
        cancel_on_deliver: Option<ShutdownToken>,
    }

    impl MailTransport for MemoryTransport {
        fn deliver(&self, message: &Message) -> Result<()> {
            let to: Vec<String> = message
                .envelope()
                .to()
                .iter()
                .map(|a| a.to_string())
                .collect();

            if to.iter().any(|a| self.reject.contains(a)) {
                return Err(ToolError::Mail {
                    message: "550 mailbox unavailable".to_string(),
                });
            }

            let raw = String::from_utf8_lossy(&message.formatted()).to_string();
            self.delivered.borrow_mut().push((to, raw));
            if let Some(ref token) = self.cancel_on_deliver {
                token.cancel();
            }
            Ok(())
        }
    }

    fn settings() -> SmtpSettings {
        SmtpSettings {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "sender@example.com".to_string(),
            password: "secret".to_string(),
        }
    }

    fn sender(reject: &[&str]) -> EmailSender<MemoryTransport> {
        let transport = MemoryTransport {
            reject: reject.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        EmailSender::with_transport(settings(), transport)
    }

    #[test]
    fn test_send_email_single_envelope() {
        let sender = sender(&[]);
        let to = vec!["a@example.com".to_string(), "b@example.com".to_string()];

        let outcome = sender.send_email(&to, "Hello", "Plain body", false);

        assert!(outcome.is_sent());
        let delivered = sender.transport().delivered.borrow();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, to);
        assert!(delivered[0].1.contains("Subject: Hello"));
        assert!(delivered[0].1.contains("multipart/alternative"));
        assert!(delivered[0].1.contains("text/plain"));
    }

    #[test]
    fn test_send_html_email() {
        let sender = sender(&[]);
        let outcome = sender.send_email(&["a@example.com".to_string()], "News", "<b>hi</b>", true);

        assert!(outcome.is_sent());
        assert!(sender.transport().delivered.borrow()[0].1.contains("text/html"));
    }

    #[test]
    fn test_send_failures_become_outcomes() {
        let sender = sender(&["bad@example.com"]);

        let rejected = sender.send_email(&["bad@example.com".to_string()], "S", "B", false);
        assert!(matches!(rejected, SendOutcome::Failed(ref reason) if reason.contains("550")));

        let invalid = sender.send_email(&["not an address".to_string()], "S", "B", false);
        assert!(!invalid.is_sent());

        let empty = sender.send_email(&[], "S", "B", false);
        assert!(!empty.is_sent());
    }

    #[test]
    fn test_bulk_counts_every_recipient() {
        let sender = sender(&["bob@example.com"]);
        let recipients = vec![
            Recipient::new([("email", "ada@example.com"), ("name", "Ada")]),
            Recipient::new([("email", "bob@example.com"), ("name", "Bob")]),
            Recipient::new([("email", "cy@example.com")]),
            Recipient::new([("name", "No Address")]),
        ];

        let report = sender.send_bulk_emails(&recipients, "Hi", "Dear {name},");

        assert_eq!(report.total(), recipients.len());
        assert_eq!(report.success, 1);
        // bob rejected, cy lacks {name}, last record lacks email
        assert_eq!(report.failed, 3);

        let delivered = sender.transport().delivered.borrow();
        assert_eq!(delivered.len(), 1);
        assert!(delivered[0].1.contains("Dear Ada,"));
    }

    #[test]
    fn test_bulk_all_satisfied() {
        let sender = sender(&[]);
        let recipients: Vec<Recipient> = (0..5)
            .map(|i| {
                Recipient::new([("email", format!("user{}@example.com", i)), ("n", i.to_string())])
            })
            .collect();

        let report = sender.send_bulk_emails(&recipients, "Batch", "You are number {n}");

        assert_eq!(report, BulkReport { success: 5, failed: 0 });
        assert_eq!(sender.transport().delivered.borrow().len(), 5);
    }

    #[test]
    fn test_bulk_stops_when_cancelled() {
        let token = ShutdownToken::new();
        let transport = MemoryTransport {
            cancel_on_deliver: Some(token.clone()),
            ..Default::default()
        };
        let sender = EmailSender::with_transport(settings(), transport).with_shutdown(token);
        let recipients: Vec<Recipient> = ["a", "b", "c"]
            .iter()
            .map(|n| Recipient::new([("email", format!("{}@example.com", n))]))
            .collect();

        let report = sender.send_bulk_emails(&recipients, "Batch", "Hello");

        assert_eq!(report, BulkReport { success: 1, failed: 0 });
        assert_eq!(sender.transport().delivered.borrow().len(), 1);
    }

    #[test]
    fn test_settings_from_config() {
        let config = MailConfig::default();
        let settings = SmtpSettings::from(&config);
        assert_eq!(settings.host, "smtp.gmail.com");
        assert_eq!(settings.port, 587);
    }
}
