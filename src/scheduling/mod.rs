//! Appointment scheduling: duration parsing, time arithmetic, availability and slots.
//!
//! Persistence is reached only through the [`AppointmentStore`] and
//! [`ServiceCatalog`] traits, so the database can be swapped for a fake in tests.

mod availability;
mod booking;
mod clock;
mod duration;
mod error;
#[cfg(test)]
pub(crate) mod memory;
mod slots;

pub use availability::*;
pub use booking::*;
pub use clock::*;
pub use duration::*;
pub use error::*;
pub use slots::*;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{Appointment, BookedInterval, Service};

/// Access to stored appointments
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Appointments of one staff member on one date, in any status, minus `exclude_id`
    async fn list_appointments(
        &self,
        staff_id: &str,
        date: NaiveDate,
        exclude_id: Option<&str>,
    ) -> StoreResult<Vec<BookedInterval>>;

    async fn get_appointment(&self, id: &str) -> StoreResult<Option<Appointment>>;

    /// Insert a new appointment.
    ///
    /// Fails with [`StoreError::Conflict`] if a non-canceled appointment of the
    /// same staff member overlaps it; the check and the write are atomic.
    async fn create_appointment(&self, appointment: &Appointment) -> StoreResult<()>;

    /// Replace an existing appointment, with the same guarantee as
    /// [`create_appointment`](Self::create_appointment). The appointment never
    /// conflicts with its own previous version.
    async fn update_appointment(&self, appointment: &Appointment) -> StoreResult<()>;

    /// Hard delete. Returns false if nothing was deleted.
    async fn delete_appointment(&self, id: &str) -> StoreResult<bool>;
}

/// Access to the service catalog
#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    async fn get_service(&self, id: &str) -> StoreResult<Option<Service>>;
}
