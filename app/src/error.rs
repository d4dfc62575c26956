use agro_core::EnvelopeError;
use chrono::{DateTime, Utc};
use std::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DBError {
    #[error(transparent)]
    SQLError(#[from] sqlx::Error),
    #[error(transparent)]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Invalid stored row: {0}")]
    InvalidRow(String),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    #[error("No sensor registered for DevEUI {0}")]
    UnknownDevice(String),
    #[error("Sensor {sensor_code} has no plot assignment covering {at}")]
    NoActiveAssignment {
        sensor_code: String,
        at: DateTime<Utc>,
    },
    #[error("Assignment {assignment_id} references missing plot {plot_id}")]
    DanglingAssignment { assignment_id: i32, plot_id: i32 },
    #[error("Did not find plot: {0}")]
    UnknownPlot(i32),
    #[error(transparent)]
    Persistence(#[from] DBError),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid date range, from must be before until")]
    InvalidRange,
    #[error("Date range is larger than {0} days")]
    RangeTooLarge(i64),
}

type BoxedError = Box<dyn error::Error + Send + Sync>;

/// Errors as the HTTP layer sees them
#[derive(Debug, Error)]
pub enum ObserverError {
    #[error("{0}")]
    User(BoxedError),
    #[error("{0}")]
    NotFound(BoxedError),
    #[error("{0}")]
    Internal(BoxedError),
}

impl From<DBError> for ObserverError {
    fn from(err: DBError) -> Self {
        ObserverError::Internal(Box::from(err))
    }
}

impl From<IngestError> for ObserverError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Envelope(_) | IngestError::NoActiveAssignment { .. } => {
                ObserverError::User(Box::from(err))
            }
            IngestError::UnknownDevice(_) | IngestError::UnknownPlot(_) => {
                ObserverError::NotFound(Box::from(err))
            }
            IngestError::DanglingAssignment { .. } | IngestError::Persistence(_) => {
                ObserverError::Internal(Box::from(err))
            }
        }
    }
}

impl From<ApiError> for ObserverError {
    fn from(err: ApiError) -> Self {
        ObserverError::User(Box::from(err))
    }
}
