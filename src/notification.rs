//! In-app notification records and the reminder copy that fills them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::ReminderError;
use crate::subscription::ProviderAccount;

/// Type written by the scheduled reminder job.
///
/// Kept distinct from [`MANUAL_REMINDER_TYPE`] so that a reminder sent by an
/// administrator never suppresses the automated one, and vice versa.
pub const AUTO_REMINDER_TYPE: &str = "subscription_reminder_auto";

/// Type used by reminders triggered by hand from the admin dashboard.
pub const MANUAL_REMINDER_TYPE: &str = "subscription_reminder";

/// Priority classification of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Normal,
    High,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Low => "low",
            NotificationPriority::Normal => "normal",
            NotificationPriority::High => "high",
        }
    }
}

/// Structured payload attached to a reminder for downstream consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMetadata {
    pub days_left: i64,
    pub subscription_ends_at: DateTime<Utc>,
}

/// A row of the `notifications` table written by this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationRecord {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub notification_type: String,
    pub priority: NotificationPriority,
    pub link: String,
    pub metadata: NotificationMetadata,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    /// Build the automated expiry reminder for `account`.
    pub fn subscription_reminder(
        account: &ProviderAccount,
        days_left: i64,
        subscription_ends_at: DateTime<Utc>,
        locale: Locale,
        now: DateTime<Utc>,
    ) -> Self {
        let copy = ReminderCopy::new(locale, account.display_name.as_deref(), days_left);

        Self {
            id: Uuid::new_v4().to_string(),
            user_id: account.user_id.clone(),
            title: copy.title,
            message: copy.message,
            notification_type: AUTO_REMINDER_TYPE.to_string(),
            priority: NotificationPriority::High,
            link: account.kind.dashboard_link().to_string(),
            metadata: NotificationMetadata {
                days_left,
                subscription_ends_at,
            },
            is_read: false,
            created_at: now,
        }
    }
}

/// Language used for reminder copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
}

impl FromStr for Locale {
    type Err = ReminderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "fr" => Ok(Locale::Fr),
            other => Err(ReminderError::ConfigError(format!(
                "unsupported locale '{other}' (expected 'en' or 'fr')"
            ))),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => write!(f, "en"),
            Locale::Fr => write!(f, "fr"),
        }
    }
}

/// Localised title and body of a reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderCopy {
    pub title: String,
    pub message: String,
}

impl ReminderCopy {
    pub fn new(locale: Locale, display_name: Option<&str>, days_left: i64) -> Self {
        let name = display_name.map(str::trim).filter(|n| !n.is_empty());
        let span = day_span(locale, days_left);

        match locale {
            Locale::En => {
                let greeting = match name {
                    Some(n) => format!("Hi {n},"),
                    None => "Hi there,".to_string(),
                };
                Self {
                    title: format!("Your subscription expires in {span}"),
                    message: format!(
                        "{greeting} your subscription ends in {span}. \
                         Renew now to keep receiving bookings."
                    ),
                }
            }
            Locale::Fr => {
                let greeting = match name {
                    Some(n) => format!("Bonjour {n},"),
                    None => "Bonjour,".to_string(),
                };
                Self {
                    title: format!("Votre abonnement expire dans {span}"),
                    message: format!(
                        "{greeting} votre abonnement se termine dans {span}. \
                         Renouvelez-le d\u{e8}s maintenant pour continuer \u{e0} recevoir des r\u{e9}servations."
                    ),
                }
            }
        }
    }
}

/// "1 day" / "3 days", in the given language.
fn day_span(locale: Locale, days: i64) -> String {
    match locale {
        Locale::En if days == 1 => "1 day".to_string(),
        Locale::En => format!("{days} days"),
        // French treats 0 and 1 as singular
        Locale::Fr if days <= 1 => format!("{days} jour"),
        Locale::Fr => format!("{days} jours"),
    }
}
