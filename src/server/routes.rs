use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::server::handlers::{
    health_handler, preflight_handler, trigger_reminders_handler, AppState,
};
use crate::server::logging::request_logging_middleware;

/// Path of the reminder trigger.
pub const REMINDERS_PATH: &str = "/subscription-reminders";

/// Build the application router.
///
/// # Routes
///
/// - `POST /subscription-reminders` - Run the reminder job once
/// - `GET /subscription-reminders` - Same, for schedulers that only issue GETs
/// - `OPTIONS /subscription-reminders` - CORS preflight
/// - `GET /health` - Liveness and database connectivity
///
/// All responses carry permissive CORS headers so the trigger can be fired
/// from a browser-based admin dashboard.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            REMINDERS_PATH,
            post(trigger_reminders_handler)
                .get(trigger_reminders_handler)
                .options(preflight_handler),
        )
        .route("/health", get(health_handler))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
