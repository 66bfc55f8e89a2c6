use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::ReminderSettings;
use crate::email::EmailSender;
use crate::jobs::{run_subscription_reminders, ReminderReport};
use crate::server::api_error::ApiError;
use crate::server::database::Database;
use crate::server::logging::HealthResponse;

/// Shared application state for handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    /// `None` when email is not configured.
    pub mailer: Option<Arc<dyn EmailSender>>,
    pub settings: ReminderSettings,
}

/// Per-run counts returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TriggerDetails {
    pub cooks: usize,
    pub workers: usize,
    pub skipped: usize,
}

/// Success body of the trigger endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TriggerResponse {
    pub success: bool,
    pub message: String,
    pub sent: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<TriggerDetails>,
}

impl From<&ReminderReport> for TriggerResponse {
    fn from(report: &ReminderReport) -> Self {
        if report.candidates() == 0 {
            return Self {
                success: true,
                message: "No expiring subscriptions found".to_string(),
                sent: 0,
                details: None,
            };
        }

        let message = match report.sent {
            0 => "All expiring subscriptions were already reminded today".to_string(),
            1 => "Sent 1 subscription reminder".to_string(),
            n => format!("Sent {n} subscription reminders"),
        };

        Self {
            success: true,
            message,
            sent: report.sent,
            details: Some(TriggerDetails {
                cooks: report.cooks,
                workers: report.workers,
                skipped: report.skipped,
            }),
        }
    }
}

/// Run the subscription reminder job once.
///
/// Called by an external scheduler or by hand from an admin dashboard; no
/// request body is required. Scan or persistence failures return 500.
pub async fn trigger_reminders_handler(
    State(state): State<AppState>,
) -> Result<Json<TriggerResponse>, ApiError> {
    let report = run_subscription_reminders(
        state.db.as_ref(),
        state.mailer.as_deref(),
        &state.settings,
        Utc::now(),
    )
    .await
    .map_err(|e| {
        error!(step = e.step(), "Subscription reminder run failed: {}", e);
        ApiError::from(e)
    })?;

    info!(
        "Reminder trigger complete: {} sent, {} skipped",
        report.sent, report.skipped
    );

    Ok(Json(TriggerResponse::from(&report)))
}

/// Answer a bare `OPTIONS` request; CORS headers are added by the router.
pub async fn preflight_handler() -> &'static str {
    "ok"
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = state.db.ping().await;
    Json(HealthResponse::healthy(connected, state.db.db_type()))
}
