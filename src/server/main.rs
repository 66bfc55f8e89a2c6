use std::net::SocketAddr;
use std::sync::Arc;

use reminders::config::get_config;
use reminders::email::{EmailSender, HttpEmailSender};
use reminders::server::{build_router, init_tracing, AppState, Database};
use tracing::info;

#[cfg(feature = "background-jobs")]
use reminders::jobs::{JobConfig, JobScheduler};
#[cfg(feature = "background-jobs")]
use reminders::store::ReminderStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = get_config()?;
    init_tracing(&config.logging);

    let db = Database::new().await?;
    info!("Connected to {} database", db.db_type());

    let mailer: Option<Arc<dyn EmailSender>> = match HttpEmailSender::from_config(&config.email)? {
        Some(sender) => Some(Arc::new(sender)),
        None => {
            info!("Email disabled; reminders are in-app only");
            None
        }
    };

    #[cfg(feature = "background-jobs")]
    let _scheduler = if config.jobs.enabled {
        let store: Arc<dyn ReminderStore> = db.clone();
        let scheduler =
            JobScheduler::new(store, mailer.clone(), JobConfig::from_config(config)).await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        None
    };

    let state = AppState {
        db,
        mailer,
        settings: config.reminders.clone(),
    };
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
