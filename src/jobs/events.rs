//! Per-account audit lines for reminder runs.

use std::fmt;

use tracing::{info, info_span, warn};

/// Something that happened to one account during a reminder run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderEvent {
    /// In-app notification persisted
    Created,
    /// Already reminded today
    Skipped,
    /// Candidate dropped before persistence
    Discarded,
    EmailSent,
    EmailFailed,
    NoEmailAddress,
}

impl fmt::Display for ReminderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReminderEvent::Created => "created",
            ReminderEvent::Skipped => "skipped",
            ReminderEvent::Discarded => "discarded",
            ReminderEvent::EmailSent => "email_sent",
            ReminderEvent::EmailFailed => "email_failed",
            ReminderEvent::NoEmailAddress => "no_email_address",
        };
        write!(f, "{}", s)
    }
}

/// Log a reminder event for one user.
///
/// Failures and discarded candidates are logged at `warn`, everything else
/// at `info`.
pub fn log_reminder_event(event: ReminderEvent, user_id: &str, details: Option<&str>) {
    let span = info_span!(
        "reminder_event",
        event = %event,
        user_id = %user_id,
    );
    let _enter = span.enter();

    match event {
        ReminderEvent::EmailFailed | ReminderEvent::Discarded => {
            if let Some(d) = details {
                warn!(reason = %d, "Reminder event occurred");
            } else {
                warn!("Reminder event occurred");
            }
        }
        _ => {
            if let Some(d) = details {
                info!(details = %d, "Reminder event occurred");
            } else {
                info!("Reminder event occurred");
            }
        }
    }
}
