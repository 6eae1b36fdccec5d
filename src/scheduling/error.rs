use chrono::NaiveTime;
use thiserror::Error;

/// Failures of the booking flow, each distinguishable by the caller
#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("unparseable duration {0:?}")]
    UnparseableDuration(String),

    #[error("appointment starting at {} for {minutes} min would run past midnight", .start.format("%H:%M"))]
    CrossesMidnight { start: NaiveTime, minutes: u32 },

    #[error("time unavailable: overlaps appointment {0}")]
    OverlapDetected(String),

    #[error("time unavailable: booked concurrently as appointment {0}")]
    ConcurrentConflict(String),

    #[error("{0}")]
    Invalid(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("datastore failure: {0:#}")]
    Datastore(anyhow::Error),
}

impl From<StoreError> for SchedulingError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(id) => SchedulingError::ConcurrentConflict(id),
            StoreError::Backend(e) => SchedulingError::Datastore(e),
        }
    }
}

/// Errors returned by the appointment and service collaborators
#[derive(Debug, Error)]
pub enum StoreError {
    /// A guarded write found an overlapping, non-canceled appointment
    #[error("conflicts with appointment {0}")]
    Conflict(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
