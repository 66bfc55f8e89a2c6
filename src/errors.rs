use thiserror::Error;

/// Errors raised by the reminder service outside of the job pipeline itself.
#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("email error: {0}")]
    EmailError(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type ReminderResult<T> = Result<T, ReminderError>;

impl From<reqwest::Error> for ReminderError {
    fn from(err: reqwest::Error) -> Self {
        ReminderError::EmailError(err.to_string())
    }
}
