//! Subscription expiry reminder job.
//!
//! One run goes through three stages:
//!
//! 1. **Scan** both provider kinds for `trial`/`active` subscriptions ending
//!    within the lookahead window.
//! 2. **Dedup** against automated reminders already created since UTC
//!    midnight, with a single batched lookup.
//! 3. **Fan out**: persist one notification per remaining account in a single
//!    batch, then send the matching emails best-effort.
//!
//! Running the job several times on the same day is safe: notifications
//! created by earlier runs make later runs skip those accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::ReminderSettings;
use crate::email::{render_reminder_email, EmailSender};
use crate::notification::{NotificationRecord, AUTO_REMINDER_TYPE};
use crate::store::ReminderStore;
use crate::subscription::{start_of_day, ProviderAccount, ProviderKind};

use super::events::{log_reminder_event, ReminderEvent};
use super::JobError;

/// What happened to the email side of one notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    EmailSent,
    EmailFailed { reason: String },
    NoEmailAddress,
    EmailDisabled,
}

/// Outcome of a single reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub user_id: String,
    pub kind: ProviderKind,
    pub outcome: DeliveryOutcome,
}

/// Summary of one job run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReminderReport {
    /// Notifications persisted by this run.
    pub sent: usize,
    /// Cook candidates found by the scan, before dedup.
    pub cooks: usize,
    /// Worker candidates found by the scan, before dedup.
    pub workers: usize,
    /// Candidates dropped because they were already reminded today.
    pub skipped: usize,
    pub deliveries: Vec<Delivery>,
}

impl ReminderReport {
    pub fn candidates(&self) -> usize {
        self.cooks + self.workers
    }

    pub fn emails_sent(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::EmailSent))
    }

    pub fn emails_failed(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::EmailFailed { .. }))
    }

    fn count(&self, pred: impl Fn(&DeliveryOutcome) -> bool) -> usize {
        self.deliveries.iter().filter(|d| pred(&d.outcome)).count()
    }
}

/// Run the reminder job once, as of `now`.
///
/// Fails only when the scan, the dedup lookup or the notification insert
/// fails. Email problems are recorded in [`ReminderReport::deliveries`].
pub async fn run_subscription_reminders(
    store: &dyn ReminderStore,
    mailer: Option<&dyn EmailSender>,
    settings: &ReminderSettings,
    now: DateTime<Utc>,
) -> Result<ReminderReport, JobError> {
    info!(
        "Running subscription reminders at {} (lookahead: {} days)",
        now, settings.lookahead_days
    );

    let candidates = scan_expiring_accounts(store, settings, now).await?;

    let mut report = ReminderReport {
        cooks: count_kind(&candidates, ProviderKind::Cook),
        workers: count_kind(&candidates, ProviderKind::Worker),
        ..Default::default()
    };

    if candidates.is_empty() {
        info!("No expiring subscriptions found");
        return Ok(report);
    }

    let total = candidates.len();
    let pending = filter_already_notified(store, candidates, now).await?;
    report.skipped = total - pending.len();

    if pending.is_empty() {
        info!(
            "All {} expiring accounts were already reminded today",
            report.skipped
        );
        return Ok(report);
    }

    let (kinds, notifications) = build_notifications(&pending, settings, now);
    store
        .insert_notifications(&notifications)
        .await
        .map_err(|e| JobError::PersistFailed(e.to_string()))?;
    report.sent = notifications.len();
    info!("Persisted {} subscription reminders", report.sent);

    for (kind, notification) in kinds.iter().zip(&notifications) {
        let details = format!("{kind}, {}", notification.title);
        log_reminder_event(ReminderEvent::Created, &notification.user_id, Some(&details));
    }

    report.deliveries = deliver_emails(store, mailer, settings, &kinds, &notifications).await;

    info!(
        sent = report.sent,
        cooks = report.cooks,
        workers = report.workers,
        skipped = report.skipped,
        emails_sent = report.emails_sent(),
        emails_failed = report.emails_failed(),
        "Subscription reminders finished"
    );

    Ok(report)
}

/// Stage 1: every remindable account across both kinds.
async fn scan_expiring_accounts(
    store: &dyn ReminderStore,
    settings: &ReminderSettings,
    now: DateTime<Utc>,
) -> Result<Vec<ProviderAccount>, JobError> {
    let lookahead = settings.lookahead();
    let until = now + lookahead;
    let mut candidates = Vec::new();

    for kind in ProviderKind::ALL {
        let accounts = store
            .find_expiring_providers(kind, now, until)
            .await
            .map_err(|e| JobError::ScanFailed {
                kind,
                reason: e.to_string(),
            })?;

        let before = accounts.len();
        candidates.extend(
            accounts
                .into_iter()
                .filter(|account| account.kind == kind && account.is_due_for_reminder(now, lookahead)),
        );

        debug!(
            "Scanned {} {} accounts expiring by {}",
            before,
            kind,
            until
        );
    }

    Ok(candidates)
}

/// Stage 2: drop accounts whose owner already got an automated reminder today.
async fn filter_already_notified(
    store: &dyn ReminderStore,
    candidates: Vec<ProviderAccount>,
    now: DateTime<Utc>,
) -> Result<Vec<ProviderAccount>, JobError> {
    let today = start_of_day(now);

    let mut user_ids: Vec<String> = candidates.iter().map(|a| a.user_id.clone()).collect();
    user_ids.sort();
    user_ids.dedup();

    let notified = store
        .find_notified_user_ids(&user_ids, AUTO_REMINDER_TYPE, today)
        .await
        .map_err(|e| JobError::DedupFailed(e.to_string()))?;

    debug!(
        "{} of {} recipients already reminded since {}",
        notified.len(),
        user_ids.len(),
        today
    );

    let (skipped, pending): (Vec<_>, Vec<_>) = candidates
        .into_iter()
        .partition(|account| notified.contains(&account.user_id));

    for account in &skipped {
        log_reminder_event(
            ReminderEvent::Skipped,
            &account.user_id,
            Some(&format!("{} {}", account.kind, account.id)),
        );
    }

    Ok(pending)
}

/// Stage 3a: one notification per pending account, paired with its kind.
fn build_notifications(
    pending: &[ProviderAccount],
    settings: &ReminderSettings,
    now: DateTime<Utc>,
) -> (Vec<ProviderKind>, Vec<NotificationRecord>) {
    pending
        .iter()
        .filter_map(|account| {
            let (Some(ends_at), Some(days_left)) =
                (account.subscription_ends_at, account.days_left(now))
            else {
                log_reminder_event(
                    ReminderEvent::Discarded,
                    &account.user_id,
                    Some("subscription already ended"),
                );
                return None;
            };
            let record = NotificationRecord::subscription_reminder(
                account,
                days_left,
                ends_at,
                settings.locale,
                now,
            );
            Some((account.kind, record))
        })
        .unzip()
}

/// Stage 3b: best-effort emails for the persisted notifications.
async fn deliver_emails(
    store: &dyn ReminderStore,
    mailer: Option<&dyn EmailSender>,
    settings: &ReminderSettings,
    kinds: &[ProviderKind],
    notifications: &[NotificationRecord],
) -> Vec<Delivery> {
    let mut deliveries = Vec::with_capacity(notifications.len());

    for (&kind, notification) in kinds.iter().zip(notifications) {
        let outcome = match mailer {
            None => DeliveryOutcome::EmailDisabled,
            Some(mailer) => send_reminder_email(store, mailer, settings, notification).await,
        };

        match &outcome {
            DeliveryOutcome::EmailSent => {
                log_reminder_event(ReminderEvent::EmailSent, &notification.user_id, None)
            }
            DeliveryOutcome::EmailFailed { reason } => log_reminder_event(
                ReminderEvent::EmailFailed,
                &notification.user_id,
                Some(reason),
            ),
            DeliveryOutcome::NoEmailAddress => {
                log_reminder_event(ReminderEvent::NoEmailAddress, &notification.user_id, None)
            }
            DeliveryOutcome::EmailDisabled => {}
        }

        deliveries.push(Delivery {
            user_id: notification.user_id.clone(),
            kind,
            outcome,
        });
    }

    deliveries
}

async fn send_reminder_email(
    store: &dyn ReminderStore,
    mailer: &dyn EmailSender,
    settings: &ReminderSettings,
    notification: &NotificationRecord,
) -> DeliveryOutcome {
    let address = match store.find_user_email(&notification.user_id).await {
        Ok(Some(address)) => address,
        Ok(None) => return DeliveryOutcome::NoEmailAddress,
        Err(e) => {
            return DeliveryOutcome::EmailFailed {
                reason: format!("email lookup failed: {e}"),
            }
        }
    };

    let message = render_reminder_email(&address, notification, &settings.base_url, settings.locale);

    match mailer.send(&message).await {
        Ok(()) => DeliveryOutcome::EmailSent,
        Err(e) => DeliveryOutcome::EmailFailed {
            reason: e.to_string(),
        },
    }
}

fn count_kind(accounts: &[ProviderAccount], kind: ProviderKind) -> usize {
    accounts.iter().filter(|a| a.kind == kind).count()
}
