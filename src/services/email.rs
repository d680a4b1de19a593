//! Email service for password reset messages

use lettre::{
    message::{header::ContentType, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Link a reset token resolves to
    pub fn reset_link(&self, token: &str) -> String {
        let separator = if self.config.reset_url_base.contains('?') { '&' } else { '?' };
        format!("{}{}token={}", self.config.reset_url_base, separator, token)
    }

    /// Send a password reset link
    pub async fn send_password_reset(&self, to: &str, full_name: &str, token: &str, valid_minutes: u64) -> AppResult<()> {
        let subject = "Password reset";
        let body = format!(
            r#"
Hello {name},

We received a request to reset your password. Open the link below to choose a new one:

{link}

This link expires in {minutes} minutes and can only be used once.

If you didn't request a password reset, you can ignore this email.
"#,
            name = full_name,
            link = self.reset_link(token),
            minutes = valid_minutes
        );

        self.send_email(to, subject, &body).await
    }

    /// Generic email sending function; SMTP delivery runs on the blocking pool
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let from_name = self
            .config
            .smtp_from_name
            .as_deref()
            .unwrap_or("Pustaka");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(format!(
                                r#"<html><body><p>{}</p></body></html>"#,
                                body.trim().replace('\n', "<br>")
                            )),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        let mailer_builder = if self.config.smtp_use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer_builder = match (&self.config.smtp_username, &self.config.smtp_password) {
            (Some(username), Some(password)) => {
                mailer_builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => mailer_builder,
        };

        let mailer = mailer_builder.build();

        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::Internal(format!("Email task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        tracing::info!("Email '{}' sent to {}", subject, to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_link_appends_token() {
        let service = EmailService::new(EmailConfig {
            reset_url_base: "https://pustaka.example/reset".to_string(),
            ..EmailConfig::default()
        });
        assert_eq!(service.reset_link("abc"), "https://pustaka.example/reset?token=abc");

        let service = EmailService::new(EmailConfig {
            reset_url_base: "https://pustaka.example/app?page=reset".to_string(),
            ..EmailConfig::default()
        });
        assert_eq!(
            service.reset_link("abc"),
            "https://pustaka.example/app?page=reset&token=abc"
        );
    }
}
