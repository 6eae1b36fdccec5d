use async_trait::async_trait;
use chrono::NaiveDate;

use super::Database;
use crate::models::{Appointment, BookedInterval, Service};
use crate::scheduling::{AppointmentStore, ServiceCatalog, StoreError, StoreResult};

#[async_trait]
impl AppointmentStore for Database {
    async fn list_appointments(
        &self,
        staff_id: &str,
        date: NaiveDate,
        exclude_id: Option<&str>,
    ) -> StoreResult<Vec<BookedInterval>> {
        Ok(self.list_staff_day(staff_id, date, exclude_id)?)
    }

    async fn get_appointment(&self, id: &str) -> StoreResult<Option<Appointment>> {
        Ok(Database::get_appointment(self, id)?)
    }

    async fn create_appointment(&self, appointment: &Appointment) -> StoreResult<()> {
        match self.insert_appointment_guarded(appointment)? {
            Some(conflict) => Err(StoreError::Conflict(conflict)),
            None => Ok(()),
        }
    }

    async fn update_appointment(&self, appointment: &Appointment) -> StoreResult<()> {
        match self.update_appointment_guarded(appointment)? {
            Some(conflict) => Err(StoreError::Conflict(conflict)),
            None => Ok(()),
        }
    }

    async fn delete_appointment(&self, id: &str) -> StoreResult<bool> {
        Ok(Database::delete_appointment(self, id)?)
    }
}

#[async_trait]
impl ServiceCatalog for Database {
    async fn get_service(&self, id: &str) -> StoreResult<Option<Service>> {
        Ok(Database::get_service(self, id)?)
    }
}
