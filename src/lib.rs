//! Subscription expiry reminders for marketplace providers.
//!
//! Cooks and house workers hold time-limited subscriptions. This crate finds
//! the ones about to lapse and reminds their owners, in-app and optionally by
//! email, at most once per account per day.
//!
//! # Features
//!
//! - `server` - HTTP trigger, SQL store. Enabled by default.
//! - `sqlite` - SQLite database backend. Enabled by default.
//! - `postgres` - PostgreSQL database backend.
//! - `background-jobs` - In-process cron trigger for the reminder job.
//!
//! # Example
//!
//! ```rust,ignore
//! use chrono::Utc;
//! use reminders::config::ReminderSettings;
//! use reminders::jobs::run_subscription_reminders;
//!
//! let report = run_subscription_reminders(&db, None, &ReminderSettings::default(), Utc::now()).await?;
//! println!("{} reminders sent", report.sent);
//! ```

// Core modules (always available)
pub mod config;
pub mod email;
pub mod errors;
pub mod jobs;
pub mod notification;
pub mod store;
pub mod subscription;
pub mod validation;

// Server-related modules (requires "server" feature)
#[cfg(feature = "server")]
#[path = "server/mod.rs"]
pub mod server;
