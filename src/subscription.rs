//! Provider accounts and their subscription windows.
//!
//! A provider account is either a cook or a house worker. Both kinds carry the
//! same subscription fields, so a single [`ProviderAccount`] type tagged with a
//! [`ProviderKind`] covers them.
//!
//! # Reminder eligibility
//!
//! An account is due for an expiry reminder when:
//! - its status is `trial` or `active`, and
//! - `now < subscription_ends_at <= now + lookahead`
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use reminders::subscription::{ProviderAccount, ProviderKind, SubscriptionStatus};
//!
//! let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
//! let account = ProviderAccount {
//!     id: "cook-1".to_string(),
//!     user_id: "user-1".to_string(),
//!     kind: ProviderKind::Cook,
//!     subscription_status: SubscriptionStatus::Active,
//!     subscription_ends_at: Some(now + Duration::hours(60)),
//!     display_name: None,
//! };
//!
//! assert!(account.is_due_for_reminder(now, Duration::days(3)));
//! assert_eq!(account.days_left(now), Some(3));
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two kinds of provider that hold subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Cook,
    Worker,
}

impl ProviderKind {
    /// Both kinds, in the order the scanner visits them.
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Cook, ProviderKind::Worker];

    /// Table holding accounts of this kind.
    pub fn table_name(&self) -> &'static str {
        match self {
            ProviderKind::Cook => "cooks",
            ProviderKind::Worker => "workers",
        }
    }

    /// Dashboard path the reminder deep-links to.
    pub fn dashboard_link(&self) -> &'static str {
        match self {
            ProviderKind::Cook => "/cook-dashboard",
            ProviderKind::Worker => "/worker-dashboard",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Cook => write!(f, "cook"),
            ProviderKind::Worker => write!(f, "worker"),
        }
    }
}

/// Subscription state of a provider account.
///
/// The platform may store states this service does not know about; those are
/// kept verbatim in [`SubscriptionStatus::Other`] and are never eligible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Trial,
    Active,
    Expired,
    Other(String),
}

impl SubscriptionStatus {
    /// Statuses that can receive expiry reminders.
    pub const REMINDABLE: [&'static str; 2] = ["trial", "active"];

    pub fn as_str(&self) -> &str {
        match self {
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Other(s) => s.as_str(),
        }
    }

    /// Whether an account in this state should be nudged to renew.
    pub fn is_remindable(&self) -> bool {
        matches!(self, SubscriptionStatus::Trial | SubscriptionStatus::Active)
    }
}

impl From<&str> for SubscriptionStatus {
    fn from(value: &str) -> Self {
        match value {
            "trial" => SubscriptionStatus::Trial,
            "active" => SubscriptionStatus::Active,
            "expired" => SubscriptionStatus::Expired,
            other => SubscriptionStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cook or worker account as seen by the reminder job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAccount {
    pub id: String,
    /// Owning identity; receives the notification.
    pub user_id: String,
    pub kind: ProviderKind,
    pub subscription_status: SubscriptionStatus,
    pub subscription_ends_at: Option<DateTime<Utc>>,
    /// Name from the linked profile, used only to personalise messages.
    pub display_name: Option<String>,
}

impl ProviderAccount {
    /// Check whether this account belongs in a reminder run at `now`.
    ///
    /// The status is authoritative: an `expired` account is excluded even if
    /// its end timestamp is still in the future.
    pub fn is_due_for_reminder(&self, now: DateTime<Utc>, lookahead: Duration) -> bool {
        if !self.subscription_status.is_remindable() {
            return false;
        }

        match self.subscription_ends_at {
            Some(ends_at) => ends_at > now && ends_at <= now + lookahead,
            None => false,
        }
    }

    /// Whole days left before the subscription lapses, rounded up.
    ///
    /// Returns `None` when there is no end date or it is not after `now`.
    pub fn days_left(&self, now: DateTime<Utc>) -> Option<i64> {
        self.subscription_ends_at
            .and_then(|ends_at| days_until(ends_at, now))
    }
}

/// `ceil((ends_at - now) / 1 day)`, or `None` if `ends_at <= now`.
///
/// Any positive remainder counts as a started day, down to the nanosecond.
pub fn days_until(ends_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<i64> {
    let remaining = ends_at - now;
    if remaining <= Duration::zero() {
        return None;
    }
    let whole_days = remaining.num_days();
    if remaining > Duration::days(whole_days) {
        Some(whole_days + 1)
    } else {
        Some(whole_days)
    }
}

/// Start of the UTC calendar day containing `now`.
///
/// This is the lower bound used to decide whether a reminder already went out
/// "today".
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now)
}
