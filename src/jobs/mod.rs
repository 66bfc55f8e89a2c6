//! Background jobs for the reminder service.
//!
//! # Available Jobs
//!
//! - **Subscription Reminders**: notifies cooks and workers whose `trial` or
//!   `active` subscription ends within the lookahead window, at most once per
//!   account per UTC day.
//!
//! The job is normally triggered over HTTP by an external scheduler. With the
//! `background-jobs` feature it can also run from an in-process cron schedule:
//!
//! ```rust,ignore
//! use reminders::jobs::{JobConfig, JobScheduler};
//!
//! let scheduler = JobScheduler::new(store, mailer, JobConfig::from_config(config)).await?;
//! scheduler.start().await?;
//! ```

use crate::subscription::ProviderKind;

mod events;
mod subscription_reminders;

pub use events::{log_reminder_event, ReminderEvent};
pub use subscription_reminders::{
    run_subscription_reminders, Delivery, DeliveryOutcome, ReminderReport,
};

#[cfg(feature = "background-jobs")]
pub use scheduler::{JobConfig, JobScheduler};

/// Errors that abort a job run.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Scheduler error: {0}")]
    SchedulerError(String),

    #[error("Failed to fetch {kind} subscriptions: {reason}")]
    ScanFailed { kind: ProviderKind, reason: String },

    #[error("Failed to check existing reminders: {0}")]
    DedupFailed(String),

    #[error("Failed to create notifications: {0}")]
    PersistFailed(String),
}

impl JobError {
    /// Short label of the stage that failed, for logs.
    pub fn step(&self) -> &'static str {
        match self {
            JobError::SchedulerError(_) => "scheduler",
            JobError::ScanFailed { .. } => "scan",
            JobError::DedupFailed(_) => "dedup",
            JobError::PersistFailed(_) => "persist",
        }
    }
}

#[cfg(feature = "background-jobs")]
mod scheduler {
    use chrono::Utc;
    use std::sync::Arc;
    use tokio_cron_scheduler::{Job, JobScheduler as TokioJobScheduler};
    use tracing::{error, info};

    use super::{run_subscription_reminders, JobError, ReminderReport};
    use crate::config::{ReminderConfig, ReminderSettings};
    use crate::email::EmailSender;
    use crate::store::ReminderStore;

    /// Configuration for background jobs.
    #[derive(Debug, Clone)]
    pub struct JobConfig {
        /// Cron expression for the reminder job (default: daily at 08:00)
        pub reminder_cron: String,
        pub settings: ReminderSettings,
    }

    impl Default for JobConfig {
        fn default() -> Self {
            Self {
                reminder_cron: "0 0 8 * * *".to_string(),
                settings: ReminderSettings::default(),
            }
        }
    }

    impl JobConfig {
        pub fn from_config(config: &ReminderConfig) -> Self {
            Self {
                reminder_cron: config.jobs.reminder_cron.clone(),
                settings: config.reminders.clone(),
            }
        }
    }

    /// Cron-driven trigger for the reminder job.
    pub struct JobScheduler {
        scheduler: TokioJobScheduler,
        store: Arc<dyn ReminderStore>,
        mailer: Option<Arc<dyn EmailSender>>,
        config: JobConfig,
    }

    impl JobScheduler {
        pub async fn new(
            store: Arc<dyn ReminderStore>,
            mailer: Option<Arc<dyn EmailSender>>,
            config: JobConfig,
        ) -> Result<Self, JobError> {
            let scheduler = TokioJobScheduler::new()
                .await
                .map_err(|e| JobError::SchedulerError(e.to_string()))?;

            Ok(Self {
                scheduler,
                store,
                mailer,
                config,
            })
        }

        /// Register the reminder job and start ticking.
        pub async fn start(&self) -> Result<(), JobError> {
            info!("Starting reminder job scheduler");

            self.add_reminder_job().await?;

            self.scheduler
                .start()
                .await
                .map_err(|e| JobError::SchedulerError(e.to_string()))?;

            info!("Reminder job scheduler started successfully");

            Ok(())
        }

        pub async fn shutdown(&mut self) -> Result<(), JobError> {
            info!("Shutting down reminder job scheduler");
            self.scheduler
                .shutdown()
                .await
                .map_err(|e| JobError::SchedulerError(e.to_string()))?;
            Ok(())
        }

        async fn add_reminder_job(&self) -> Result<(), JobError> {
            let store = Arc::clone(&self.store);
            let mailer = self.mailer.clone();
            let settings = self.config.settings.clone();

            let job = Job::new_async(self.config.reminder_cron.as_str(), move |_uuid, _l| {
                let store = Arc::clone(&store);
                let mailer = mailer.clone();
                let settings = settings.clone();
                Box::pin(async move {
                    let result = run_subscription_reminders(
                        store.as_ref(),
                        mailer.as_deref(),
                        &settings,
                        Utc::now(),
                    )
                    .await;

                    match result {
                        Ok(report) => {
                            info!(
                                "Scheduled reminder run: {} sent, {} skipped",
                                report.sent, report.skipped
                            );
                        }
                        Err(e) => {
                            error!(step = e.step(), "Scheduled reminder run failed: {}", e);
                        }
                    }
                })
            })
            .map_err(|e| JobError::SchedulerError(e.to_string()))?;

            self.scheduler
                .add(job)
                .await
                .map_err(|e| JobError::SchedulerError(e.to_string()))?;

            info!(
                "Added subscription reminder job (schedule: {})",
                self.config.reminder_cron
            );

            Ok(())
        }

        /// Run the reminder job immediately (manual trigger).
        pub async fn run_now(&self) -> Result<ReminderReport, JobError> {
            run_subscription_reminders(
                self.store.as_ref(),
                self.mailer.as_deref(),
                &self.config.settings,
                Utc::now(),
            )
            .await
        }
    }

}
