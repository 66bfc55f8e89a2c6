//! Outbound reminder emails.
//!
//! Email is a best-effort amplification of the in-app notification. When no
//! sender is configured the reminder job simply skips this channel.
//!
//! [`HttpEmailSender`] talks to a transactional email HTTP API that accepts
//! `{ from, to, subject, html }` and a bearer API key.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::config::EmailConfig;
use crate::errors::{ReminderError, ReminderResult};
use crate::notification::{Locale, NotificationRecord};
use crate::validation::validate_email;

/// A single rendered email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Capability to dispatch an email.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> ReminderResult<()>;
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

/// Email sender backed by an HTTP email API.
#[derive(Debug, Clone)]
pub struct HttpEmailSender {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from_address: String,
}

impl HttpEmailSender {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        from_address: impl Into<String>,
    ) -> ReminderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            from_address: from_address.into(),
        })
    }

    /// Build a sender from configuration.
    ///
    /// Returns `Ok(None)` when email is disabled, which is a valid state.
    pub fn from_config(config: &EmailConfig) -> ReminderResult<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }
        Self::new(&config.api_url, &config.api_key, &config.from_address).map(Some)
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, message: &EmailMessage) -> ReminderResult<()> {
        validate_email(&message.to, "to")
            .map_err(|e| ReminderError::EmailError(e.to_string()))?;

        let body = SendEmailRequest {
            from: &self.from_address,
            to: [message.to.trim()],
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ReminderError::EmailError(format!(
                "email API returned {status}: {detail}"
            )));
        }

        debug!("Email accepted by provider for {}", message.to);
        Ok(())
    }
}

/// Render the reminder email for a persisted notification.
pub fn render_reminder_email(
    to: &str,
    notification: &NotificationRecord,
    base_url: &str,
    locale: Locale,
) -> EmailMessage {
    let action_url = format!("{}{}", base_url.trim_end_matches('/'), notification.link);
    let (button, footer) = match locale {
        Locale::En => (
            "Renew my subscription",
            "You are receiving this email because your provider subscription is about to expire.",
        ),
        Locale::Fr => (
            "Renouveler mon abonnement",
            "Vous recevez cet e-mail car votre abonnement prestataire arrive \u{e0} expiration.",
        ),
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="{locale}">
  <body style="font-family: Arial, sans-serif; background: #f6f6f6; padding: 24px;">
    <table role="presentation" width="100%" style="max-width: 560px; margin: 0 auto; background: #ffffff; border-radius: 8px;">
      <tr>
        <td style="padding: 32px;">
          <h1 style="font-size: 20px; color: #222222;">{title}</h1>
          <p style="font-size: 15px; line-height: 1.5; color: #444444;">{message}</p>
          <p style="text-align: center; margin: 32px 0;">
            <a href="{action_url}" style="background: #e4572e; color: #ffffff; padding: 12px 24px; border-radius: 6px; text-decoration: none;">{button}</a>
          </p>
          <p style="font-size: 12px; color: #888888;">{footer}</p>
        </td>
      </tr>
    </table>
  </body>
</html>"#,
        title = escape_html(&notification.title),
        message = escape_html(&notification.message),
        action_url = escape_html(&action_url),
    );

    EmailMessage {
        to: to.to_string(),
        subject: notification.title.clone(),
        html,
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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
