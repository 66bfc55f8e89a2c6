use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{query_as, FromRow, QueryBuilder};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::error;

#[cfg(feature = "sqlite")]
use sqlx::{Sqlite, SqlitePool};

#[cfg(feature = "postgres")]
use sqlx::{PgPool, Postgres};

use crate::config::{get_config, DatabaseConfig};
use crate::errors::{ReminderError, ReminderResult};
use crate::notification::NotificationRecord;
use crate::store::ReminderStore;
use crate::subscription::{ProviderAccount, ProviderKind, SubscriptionStatus};

/// Rows per INSERT statement when persisting notifications.
const INSERT_CHUNK_SIZE: usize = 500;

/// A provider row joined with its profile name.
///
/// Both `cooks` and `workers` share this shape.
#[derive(Debug, Clone, FromRow)]
pub struct ProviderRow {
    pub id: String,
    pub user_id: String,
    pub subscription_status: String,
    pub subscription_ends_at: Option<DateTime<Utc>>,
    pub display_name: Option<String>,
}

impl ProviderRow {
    pub fn into_account(self, kind: ProviderKind) -> ProviderAccount {
        ProviderAccount {
            id: self.id,
            user_id: self.user_id,
            kind,
            subscription_status: SubscriptionStatus::from(self.subscription_status.as_str()),
            subscription_ends_at: self.subscription_ends_at,
            display_name: self.display_name,
        }
    }
}

fn db_error(operation: &str, e: sqlx::Error) -> ReminderError {
    error!("{operation} failed: {e}");
    ReminderError::DatabaseError(format!("{operation}: {e}"))
}

/// Unified database abstraction over SQLite and Postgres.
///
/// Available variants depend on enabled features:
/// - `sqlite` feature enables `Database::SQLite`
/// - `postgres` feature enables `Database::Postgres`
#[derive(Debug, Clone)]
pub enum Database {
    #[cfg(feature = "sqlite")]
    SQLite(SqlitePool),
    #[cfg(feature = "postgres")]
    Postgres(PgPool),
}

impl Database {
    /// Connect using the global configuration.
    pub async fn new() -> ReminderResult<Arc<Self>> {
        let config = get_config()?;
        Self::connect(&config.database).await.map(Arc::new)
    }

    /// Connect to the database described by `db_config`.
    pub async fn connect(db_config: &DatabaseConfig) -> ReminderResult<Self> {
        match db_config.db_type.as_str() {
            #[cfg(feature = "sqlite")]
            "sqlite" => {
                let pool = SqlitePool::connect(&db_config.sqlite_url)
                    .await
                    .map_err(|e| db_error("connect to SQLite", e))?;
                Ok(Database::SQLite(pool))
            }
            #[cfg(not(feature = "sqlite"))]
            "sqlite" => Err(ReminderError::ConfigError(
                "SQLite support not compiled in. Enable the 'sqlite' feature.".to_string(),
            )),
            #[cfg(feature = "postgres")]
            "postgres" => {
                let pool = PgPool::connect(&db_config.postgres_url)
                    .await
                    .map_err(|e| db_error("connect to PostgreSQL", e))?;
                Ok(Database::Postgres(pool))
            }
            #[cfg(not(feature = "postgres"))]
            "postgres" => Err(ReminderError::ConfigError(
                "PostgreSQL support not compiled in. Enable the 'postgres' feature.".to_string(),
            )),
            other => Err(ReminderError::ConfigError(format!(
                "unsupported database type: {other}"
            ))),
        }
    }

    /// Backend name, as used in configuration.
    pub fn db_type(&self) -> &'static str {
        match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(_) => "sqlite",
            #[cfg(feature = "postgres")]
            Database::Postgres(_) => "postgres",
        }
    }

    /// Check that the database answers a trivial query.
    pub async fn ping(&self) -> bool {
        let result = match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
        };
        result.is_ok()
    }
}

#[async_trait]
impl ReminderStore for Database {
    async fn find_expiring_providers(
        &self,
        kind: ProviderKind,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> ReminderResult<Vec<ProviderAccount>> {
        let [first_status, second_status] = SubscriptionStatus::REMINDABLE;
        let table = kind.table_name();

        let rows = match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => {
                // julianday() accepts any SQLite time format but only resolves
                // milliseconds, so the lower bound is inclusive here and the
                // exact window is applied by the caller.
                let sql = format!(
                    "SELECT p.id, p.user_id, p.subscription_status, p.subscription_ends_at, \
                            pr.full_name AS display_name \
                     FROM {table} p \
                     LEFT JOIN profiles pr ON pr.id = p.user_id \
                     WHERE p.subscription_status IN (?, ?) \
                       AND p.subscription_ends_at IS NOT NULL \
                       AND julianday(p.subscription_ends_at) >= julianday(?) \
                       AND julianday(p.subscription_ends_at) <= julianday(?)"
                );
                query_as::<_, ProviderRow>(&sql)
                    .bind(first_status)
                    .bind(second_status)
                    .bind(after)
                    .bind(until)
                    .fetch_all(pool)
                    .await
                    .map_err(|e| db_error(&format!("SQLite scan of {table}"), e))?
            }
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => {
                let sql = format!(
                    "SELECT p.id::text AS id, p.user_id::text AS user_id, \
                            p.subscription_status::text AS subscription_status, \
                            p.subscription_ends_at, pr.full_name AS display_name \
                     FROM {table} p \
                     LEFT JOIN profiles pr ON pr.id = p.user_id \
                     WHERE p.subscription_status::text IN ($1, $2) \
                       AND p.subscription_ends_at IS NOT NULL \
                       AND p.subscription_ends_at > $3 \
                       AND p.subscription_ends_at <= $4"
                );
                query_as::<_, ProviderRow>(&sql)
                    .bind(first_status)
                    .bind(second_status)
                    .bind(after)
                    .bind(until)
                    .fetch_all(pool)
                    .await
                    .map_err(|e| db_error(&format!("Postgres scan of {table}"), e))?
            }
        };

        Ok(rows.into_iter().map(|row| row.into_account(kind)).collect())
    }

    async fn find_notified_user_ids(
        &self,
        user_ids: &[String],
        notification_type: &str,
        since: DateTime<Utc>,
    ) -> ReminderResult<HashSet<String>> {
        if user_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let rows: Vec<(String,)> = match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => {
                let mut qb = QueryBuilder::<Sqlite>::new(
                    "SELECT DISTINCT user_id FROM notifications WHERE type = ",
                );
                qb.push_bind(notification_type.to_string());
                qb.push(" AND julianday(created_at) >= julianday(");
                qb.push_bind(since);
                qb.push(") AND user_id IN (");
                let mut ids = qb.separated(", ");
                for id in user_ids {
                    ids.push_bind(id.clone());
                }
                ids.push_unseparated(")");

                qb.build_query_as::<(String,)>()
                    .fetch_all(pool)
                    .await
                    .map_err(|e| db_error("SQLite reminder lookup", e))?
            }
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => {
                let mut qb = QueryBuilder::<Postgres>::new(
                    "SELECT DISTINCT user_id::text FROM notifications WHERE type = ",
                );
                qb.push_bind(notification_type.to_string());
                qb.push(" AND created_at >= ");
                qb.push_bind(since);
                qb.push(" AND user_id::text IN (");
                let mut ids = qb.separated(", ");
                for id in user_ids {
                    ids.push_bind(id.clone());
                }
                ids.push_unseparated(")");

                qb.build_query_as::<(String,)>()
                    .fetch_all(pool)
                    .await
                    .map_err(|e| db_error("Postgres reminder lookup", e))?
            }
        };

        Ok(rows.into_iter().map(|(user_id,)| user_id).collect())
    }

    async fn insert_notifications(&self, records: &[NotificationRecord]) -> ReminderResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => {
                let mut tx = pool
                    .begin()
                    .await
                    .map_err(|e| db_error("SQLite begin", e))?;

                for chunk in records.chunks(INSERT_CHUNK_SIZE) {
                    let mut qb = QueryBuilder::<Sqlite>::new(
                        "INSERT INTO notifications \
                         (id, user_id, title, message, type, priority, link, metadata, is_read, created_at) ",
                    );
                    qb.push_values(chunk, |mut row, record| {
                        row.push_bind(record.id.clone())
                            .push_bind(record.user_id.clone())
                            .push_bind(record.title.clone())
                            .push_bind(record.message.clone())
                            .push_bind(record.notification_type.clone())
                            .push_bind(record.priority.as_str())
                            .push_bind(record.link.clone())
                            .push_bind(Json(record.metadata.clone()))
                            .push_bind(record.is_read)
                            .push_bind(record.created_at);
                    });
                    qb.build()
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| db_error("SQLite insert_notifications", e))?;
                }

                tx.commit()
                    .await
                    .map_err(|e| db_error("SQLite commit", e))?;
            }
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => {
                let mut tx = pool
                    .begin()
                    .await
                    .map_err(|e| db_error("Postgres begin", e))?;

                for chunk in records.chunks(INSERT_CHUNK_SIZE) {
                    let mut qb = QueryBuilder::<Postgres>::new(
                        "INSERT INTO notifications \
                         (id, user_id, title, message, type, priority, link, metadata, is_read, created_at) ",
                    );
                    qb.push_values(chunk, |mut row, record| {
                        row.push_bind(record.id.clone())
                            .push_unseparated("::uuid")
                            .push_bind(record.user_id.clone())
                            .push_unseparated("::uuid")
                            .push_bind(record.title.clone())
                            .push_bind(record.message.clone())
                            .push_bind(record.notification_type.clone())
                            .push_bind(record.priority.as_str())
                            .push_bind(record.link.clone())
                            .push_bind(Json(record.metadata.clone()))
                            .push_bind(record.is_read)
                            .push_bind(record.created_at);
                    });
                    qb.build()
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| db_error("Postgres insert_notifications", e))?;
                }

                tx.commit()
                    .await
                    .map_err(|e| db_error("Postgres commit", e))?;
            }
        }

        Ok(())
    }

    async fn find_user_email(&self, user_id: &str) -> ReminderResult<Option<String>> {
        let row: Option<(Option<String>,)> = match self {
            #[cfg(feature = "sqlite")]
            Database::SQLite(pool) => query_as("SELECT email FROM profiles WHERE id = ?")
                .bind(user_id)
                .fetch_optional(pool)
                .await
                .map_err(|e| db_error("SQLite find_user_email", e))?,
            #[cfg(feature = "postgres")]
            Database::Postgres(pool) => {
                query_as("SELECT email FROM profiles WHERE id::text = $1")
                    .bind(user_id)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| db_error("Postgres find_user_email", e))?
            }
        };

        Ok(row
            .and_then(|(email,)| email)
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty()))
    }
}
