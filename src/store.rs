//! Data access needed by the reminder job.
//!
//! The job only reads provider accounts, reads and appends notifications, and
//! looks up email addresses. Any backend that can do those four things can
//! drive it; [`crate::server::database::Database`] is the SQL implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::errors::ReminderResult;
use crate::notification::NotificationRecord;
use crate::subscription::{ProviderAccount, ProviderKind};

#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Accounts of `kind` in a remindable status whose subscription ends in
    /// `(after, until]`.
    ///
    /// Implementations may also return accounts ending exactly at `after`;
    /// the job filters the window exactly.
    async fn find_expiring_providers(
        &self,
        kind: ProviderKind,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> ReminderResult<Vec<ProviderAccount>>;

    /// Subset of `user_ids` holding a notification of `notification_type`
    /// created at or after `since`.
    async fn find_notified_user_ids(
        &self,
        user_ids: &[String],
        notification_type: &str,
        since: DateTime<Utc>,
    ) -> ReminderResult<HashSet<String>>;

    /// Insert all records atomically: either every record is stored or none.
    async fn insert_notifications(&self, records: &[NotificationRecord]) -> ReminderResult<()>;

    /// Email address of the identity, if it has one.
    async fn find_user_email(&self, user_id: &str) -> ReminderResult<Option<String>>;
}
