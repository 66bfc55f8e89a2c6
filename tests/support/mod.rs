//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use reminders::email::{EmailMessage, EmailSender};
use reminders::errors::{ReminderError, ReminderResult};
use reminders::server::database::Database;
use reminders::subscription::ProviderKind;

const SCHEMA: &str = include_str!("../../migrations/sqlite/0001_reminders.sql");

/// In-memory SQLite database with the reminder schema.
///
/// A single connection keeps every query on the same in-memory database.
pub async fn setup_db() -> Arc<Database> {
    let pool = empty_pool().await;
    sqlx::raw_sql(SCHEMA)
        .execute(&pool)
        .await
        .expect("failed to create schema");
    Arc::new(Database::SQLite(pool))
}

/// In-memory SQLite database with no tables at all.
pub async fn setup_empty_db() -> Arc<Database> {
    Arc::new(Database::SQLite(empty_pool().await))
}

async fn empty_pool() -> SqlitePool {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory sqlite")
}

pub fn pool(db: &Database) -> &SqlitePool {
    match db {
        Database::SQLite(pool) => pool,
        #[allow(unreachable_patterns)]
        _ => panic!("tests run against SQLite only"),
    }
}

pub async fn add_profile(db: &Database, user_id: &str, full_name: Option<&str>, email: Option<&str>) {
    sqlx::query("INSERT INTO profiles (id, full_name, email) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(full_name)
        .bind(email)
        .execute(pool(db))
        .await
        .expect("failed to insert profile");
}

pub async fn add_provider(
    db: &Database,
    kind: ProviderKind,
    id: &str,
    user_id: &str,
    status: &str,
    ends_at: Option<DateTime<Utc>>,
) {
    let sql = format!(
        "INSERT INTO {} (id, user_id, subscription_status, subscription_ends_at) VALUES (?, ?, ?, ?)",
        kind.table_name()
    );
    sqlx::query(&sql)
        .bind(id)
        .bind(user_id)
        .bind(status)
        .bind(ends_at)
        .execute(pool(db))
        .await
        .expect("failed to insert provider");
}

/// Profile plus provider account in one call.
pub async fn add_account(
    db: &Database,
    kind: ProviderKind,
    user_id: &str,
    name: &str,
    status: &str,
    ends_at: Option<DateTime<Utc>>,
) {
    let email = format!("{user_id}@example.com");
    add_profile(db, user_id, Some(name), Some(&email)).await;
    add_provider(db, kind, &format!("{kind}-{user_id}"), user_id, status, ends_at).await;
}

pub async fn add_notification(
    db: &Database,
    user_id: &str,
    notification_type: &str,
    created_at: DateTime<Utc>,
) {
    sqlx::query(
        "INSERT INTO notifications (id, user_id, title, message, type, priority, created_at) \
         VALUES (?, ?, 'Reminder', 'Please renew', ?, 'high', ?)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(notification_type)
    .bind(created_at)
    .execute(pool(db))
    .await
    .expect("failed to insert notification");
}

pub async fn count_notifications(db: &Database) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM notifications")
        .fetch_one(pool(db))
        .await
        .expect("failed to count notifications");
    count
}

pub async fn notified_users(db: &Database) -> Vec<String> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT user_id FROM notifications ORDER BY user_id")
            .fetch_all(pool(db))
            .await
            .expect("failed to list notifications");
    rows.into_iter().map(|(user_id,)| user_id).collect()
}

/// Email sender that records every message and fails for chosen recipients.
#[derive(Default)]
pub struct RecordingMailer {
    pub attempts: Mutex<Vec<EmailMessage>>,
    pub fail_for: Vec<String>,
}

impl RecordingMailer {
    pub fn failing_for(recipients: &[&str]) -> Self {
        Self {
            attempts: Mutex::new(Vec::new()),
            fail_for: recipients.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn attempted(&self) -> Vec<EmailMessage> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> ReminderResult<()> {
        self.attempts.lock().unwrap().push(message.clone());
        if self.fail_for.contains(&message.to) {
            return Err(ReminderError::EmailError(format!(
                "provider rejected {}",
                message.to
            )));
        }
        Ok(())
    }
}
