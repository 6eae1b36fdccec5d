//! In-memory collaborators for scheduling tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{parse_hhmm, AppointmentStore, ServiceCatalog, StoreError, StoreResult};
use crate::models::{Appointment, AppointmentStatus, BookedInterval, Service};

#[derive(Default)]
pub struct MemoryStore {
    appointments: Mutex<Vec<Appointment>>,
    services: Mutex<Vec<Service>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, appointment: Appointment) {
        self.appointments.lock().unwrap().push(appointment);
    }

    pub fn add_service(&self, service: Service) {
        self.services.lock().unwrap().push(service);
    }

    pub fn all(&self) -> Vec<Appointment> {
        self.appointments.lock().unwrap().clone()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_read(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("connection reset").into());
        }
        Ok(())
    }

    fn check_write(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("disk full").into());
        }
        Ok(())
    }

    fn guard(existing: &[Appointment], candidate: &Appointment) -> StoreResult<()> {
        if !candidate.status.blocks_time() {
            return Ok(());
        }
        let clash = existing.iter().find(|a| {
            a.id != candidate.id
                && a.staff_id == candidate.staff_id
                && a.date == candidate.date
                && a.status.blocks_time()
                && a.range().overlaps(&candidate.range())
        });
        match clash {
            Some(a) => Err(StoreError::Conflict(a.id.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AppointmentStore for MemoryStore {
    async fn list_appointments(
        &self,
        staff_id: &str,
        date: NaiveDate,
        exclude_id: Option<&str>,
    ) -> StoreResult<Vec<BookedInterval>> {
        self.check_read()?;
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.staff_id == staff_id && a.date == date)
            .filter(|a| exclude_id != Some(a.id.as_str()))
            .map(Appointment::as_booked)
            .collect())
    }

    async fn get_appointment(&self, id: &str) -> StoreResult<Option<Appointment>> {
        self.check_read()?;
        Ok(self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn create_appointment(&self, appointment: &Appointment) -> StoreResult<()> {
        self.check_write()?;
        let mut all = self.appointments.lock().unwrap();
        Self::guard(&all, appointment)?;
        all.push(appointment.clone());
        Ok(())
    }

    async fn update_appointment(&self, appointment: &Appointment) -> StoreResult<()> {
        self.check_write()?;
        let mut all = self.appointments.lock().unwrap();
        Self::guard(&all, appointment)?;
        match all.iter_mut().find(|a| a.id == appointment.id) {
            Some(slot) => {
                *slot = appointment.clone();
                Ok(())
            }
            None => Err(anyhow::anyhow!("appointment {} vanished", appointment.id).into()),
        }
    }

    async fn delete_appointment(&self, id: &str) -> StoreResult<bool> {
        self.check_write()?;
        let mut all = self.appointments.lock().unwrap();
        let before = all.len();
        all.retain(|a| a.id != id);
        Ok(all.len() != before)
    }
}

#[async_trait]
impl ServiceCatalog for MemoryStore {
    async fn get_service(&self, id: &str) -> StoreResult<Option<Service>> {
        self.check_read()?;
        Ok(self
            .services
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }
}

/// A confirmed appointment fixture
pub fn appointment(id: &str, staff_id: &str, date: NaiveDate, start: &str, end: &str) -> Appointment {
    Appointment {
        id: id.to_string(),
        account_id: "acct_1".to_string(),
        client_id: "client_1".to_string(),
        staff_id: staff_id.to_string(),
        service_ids: vec![],
        date,
        start_time: parse_hhmm(start).unwrap(),
        end_time: parse_hhmm(end).unwrap(),
        status: AppointmentStatus::Confirmed,
        price_cents: 0,
        notes: None,
        created_at: 0,
        updated_at: 0,
    }
}

/// An active service fixture
pub fn service(id: &str, duration: &str, price_cents: i64) -> Service {
    Service {
        id: id.to_string(),
        account_id: "acct_1".to_string(),
        name: id.to_string(),
        duration: duration.to_string(),
        price_cents,
        category: None,
        active: true,
        created_at: 0,
    }
}
