// src/server/mod.rs

//! Server-side components.
//!
//! This module contains:
//! - `database`    → `ReminderStore` over SQLite/Postgres
//! - `handlers`    → Axum handlers for the reminder trigger and health check
//! - `routes`      → Router builder
//! - `api_error`   → JSON error responses
//! - `logging`     → Tracing setup and request logging middleware

pub mod api_error;
pub mod database;
pub mod handlers;
pub mod logging;
pub mod routes;

pub use api_error::{ApiError, ErrorBody};
pub use database::Database;
pub use handlers::{
    health_handler, preflight_handler, trigger_reminders_handler, AppState, TriggerDetails,
    TriggerResponse,
};
pub use logging::{init_tracing, request_logging_middleware, HealthResponse};
pub use routes::{build_router, REMINDERS_PATH};
