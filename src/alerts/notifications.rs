use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use thiserror::Error;

use crate::config::SmtpConfig;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP password variable {0} is not set")]
    MissingPassword(String),
}

/// Delivers a single alert. Each call is independent and best-effort.
pub trait Notifier {
    fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError>;
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        (**self).send(subject, body)
    }
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        (**self).send(subject, body)
    }
}

/// Sends plain-text alert emails over STARTTLS.
pub struct EmailNotifier {
    config: SmtpConfig,
    password: Option<String>,
}

impl EmailNotifier {
    pub fn new(config: SmtpConfig, password: Option<String>) -> Self {
        Self { config, password }
    }

    /// Reads the password from the variable named by `password_env` when a
    /// username is configured.
    pub fn from_config(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let password = match (&config.username, &config.password_env) {
            (Some(_), Some(var)) => Some(
                std::env::var(var).map_err(|_| NotifyError::MissingPassword(var.clone()))?,
            ),
            _ => None,
        };
        Ok(Self::new(config.clone(), password))
    }

    pub fn build_message(&self, subject: &str, body: &str) -> Result<Message, NotifyError> {
        let from: Mailbox = self.config.sender.parse()?;
        let to: Mailbox = self.config.recipient.parse()?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        Ok(message)
    }

    fn transport(&self) -> Result<SmtpTransport, NotifyError> {
        let mut builder = SmtpTransport::starttls_relay(&self.config.host)?.port(self.config.port);

        if let (Some(user), Some(pass)) = (&self.config.username, &self.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(builder.build())
    }
}

impl Notifier for EmailNotifier {
    fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let message = self.build_message(subject, body)?;
        self.transport()?.send(&message)?;

        tracing::info!(to = %self.config.recipient, subject, "Alert email sent");
        Ok(())
    }
}

/// Writes alerts to the log instead of delivering them.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        tracing::warn!(subject, body, "Alert (delivery disabled)");
        Ok(())
    }
}

pub fn send_test_notification(notifier: &dyn Notifier, server_name: &str) -> Result<(), NotifyError> {
    notifier.send(
        &format!("dbprobe test alert for {}", server_name),
        "Notifications are working correctly. You'll receive alerts when thresholds are exceeded.",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp_config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            sender: "probe@example.com".to_string(),
            recipient: "oncall@example.com".to_string(),
            username: None,
            password_env: None,
        }
    }

    #[test]
    fn test_build_message() {
        let notifier = EmailNotifier::new(smtp_config(), None);
        let message = notifier
            .build_message("CPU utilization is high on db-01", "CPU utilization is at 90.8%")
            .unwrap();

        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(formatted.contains("Subject: CPU utilization is high on db-01"));
        assert!(formatted.contains("To: oncall@example.com"));
        assert!(formatted.contains("CPU utilization is at 90.8%"));
    }

    #[test]
    fn test_invalid_recipient() {
        let config = SmtpConfig {
            recipient: "not-an-email".to_string(),
            ..smtp_config()
        };
        let notifier = EmailNotifier::new(config, None);
        let err = notifier.build_message("subject", "body").unwrap_err();
        assert!(matches!(err, NotifyError::Address(_)));
        assert!(err.to_string().contains("Email address parse error"));
    }

    #[test]
    fn test_missing_password_variable() {
        let config = SmtpConfig {
            username: Some("probe".to_string()),
            password_env: Some("DBPROBE_TEST_PASSWORD_THAT_IS_NEVER_SET".to_string()),
            ..smtp_config()
        };
        let err = EmailNotifier::from_config(&config).err().unwrap();
        assert!(matches!(err, NotifyError::MissingPassword(ref var) if var == "DBPROBE_TEST_PASSWORD_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_no_credentials_without_username() {
        let config = SmtpConfig {
            password_env: Some("DBPROBE_TEST_PASSWORD_THAT_IS_NEVER_SET".to_string()),
            ..smtp_config()
        };
        assert!(EmailNotifier::from_config(&config).is_ok());
    }

    #[test]
    fn test_log_notifier_always_succeeds() {
        let notifier = LogNotifier;
        assert!(notifier.send("subject", "body").is_ok());
        assert!(send_test_notification(&notifier, "db-01").is_ok());
    }
}
