use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use super::{
    available_start_times, end_time_same_day, find_conflict, slot_options, AppointmentStore,
    DurationPolicy, SchedulingError, ServiceCatalog, SlotGrid,
};
use crate::models::{
    Appointment, AppointmentStatus, CreateAppointmentRequest, SlotOption, TimeRange,
    UpdateAppointmentRequest,
};

/// Summed length and price of a set of services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceTotals {
    pub minutes: u32,
    pub price_cents: i64,
}

/// An open slots query
#[derive(Debug, Clone)]
pub struct SlotQuery<'a> {
    pub staff_id: &'a str,
    pub date: NaiveDate,
    pub service_ids: &'a [String],
    /// Appointment being edited
    pub exclude_id: Option<&'a str>,
}

/// Books, moves and cancels appointments for one account
pub struct Scheduler<'a> {
    store: &'a dyn AppointmentStore,
    catalog: &'a dyn ServiceCatalog,
    account_id: &'a str,
    policy: DurationPolicy,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        store: &'a dyn AppointmentStore,
        catalog: &'a dyn ServiceCatalog,
        account_id: &'a str,
        policy: DurationPolicy,
    ) -> Self {
        Self {
            store,
            catalog,
            account_id,
            policy,
        }
    }

    /// Total minutes and price of `service_ids`.
    ///
    /// Unknown services, services of another account and an empty or zero-length
    /// selection are rejected.
    pub async fn totals(&self, service_ids: &[String]) -> Result<ServiceTotals, SchedulingError> {
        if service_ids.is_empty() {
            return Err(SchedulingError::Invalid(
                "Select at least one service".to_string(),
            ));
        }

        let mut totals = ServiceTotals {
            minutes: 0,
            price_cents: 0,
        };
        for id in service_ids {
            let service = self
                .catalog
                .get_service(id)
                .await?
                .filter(|s| s.account_id == self.account_id)
                .ok_or_else(|| SchedulingError::Invalid(format!("Unknown service {}", id)))?;
            let minutes = self.policy.resolve(&service.id, &service.duration)?;
            totals.minutes = totals.minutes.checked_add(minutes).ok_or_else(|| {
                SchedulingError::Invalid("Selected services are too long to book".to_string())
            })?;
            totals.price_cents += service.price_cents;
        }

        if totals.minutes == 0 {
            return Err(SchedulingError::Invalid(
                "Selected services add up to zero minutes".to_string(),
            ));
        }
        Ok(totals)
    }

    /// The interval an appointment starting at `start` would occupy
    pub fn plan(&self, start: NaiveTime, minutes: u32) -> Result<TimeRange, SchedulingError> {
        Ok(TimeRange::new(start, end_time_same_day(start, minutes)?))
    }

    /// Fail with [`SchedulingError::OverlapDetected`] if `range` is taken
    pub async fn check(
        &self,
        staff_id: &str,
        date: NaiveDate,
        range: &TimeRange,
        exclude_id: Option<&str>,
    ) -> Result<(), SchedulingError> {
        match find_conflict(self.store, staff_id, date, range, exclude_id).await? {
            Some(conflict) => Err(SchedulingError::OverlapDetected(conflict.id)),
            None => Ok(()),
        }
    }

    /// Start times on the grid that fit the selected services.
    ///
    /// When `query.exclude_id` names an appointment, its current start time is kept
    /// in the result (flagged `current`) even if it is no longer offered.
    pub async fn open_slots(
        &self,
        grid: &SlotGrid,
        query: &SlotQuery<'_>,
    ) -> Result<(u32, Vec<SlotOption>), SchedulingError> {
        let totals = self.totals(query.service_ids).await?;
        let available = available_start_times(
            self.store,
            grid,
            query.staff_id,
            query.date,
            totals.minutes,
            query.exclude_id,
        )
        .await?;

        let current = match query.exclude_id {
            Some(id) => self
                .owned(id)
                .await?
                .filter(|a| a.staff_id == query.staff_id && a.date == query.date)
                .map(|a| a.start_time),
            None => None,
        };

        Ok((totals.minutes, slot_options(&available, current)))
    }

    /// Book a new appointment
    pub async fn book(&self, req: CreateAppointmentRequest) -> Result<Appointment, SchedulingError> {
        let totals = self.totals(&req.service_ids).await?;
        let range = self.plan(req.start_time, totals.minutes)?;
        let status = req.status.unwrap_or_default();

        if status.blocks_time() {
            self.check(&req.staff_id, req.date, &range, None).await?;
        }

        let now = Utc::now().timestamp();
        let appointment = Appointment {
            id: format!("apt_{}", &Uuid::new_v4().simple().to_string()[..12]),
            account_id: self.account_id.to_string(),
            client_id: req.client_id,
            staff_id: req.staff_id,
            service_ids: req.service_ids,
            date: req.date,
            start_time: range.start,
            end_time: range.end,
            status,
            price_cents: totals.price_cents,
            notes: req.notes,
            created_at: now,
            updated_at: now,
        };

        self.store.create_appointment(&appointment).await?;
        tracing::info!(
            appointment_id = %appointment.id,
            staff_id = %appointment.staff_id,
            date = %appointment.date,
            "Booked {}-{}",
            appointment.start_time.format("%H:%M"),
            appointment.end_time.format("%H:%M")
        );
        Ok(appointment)
    }

    /// Apply `changes` to appointment `id`.
    ///
    /// The end time is derived again whenever the date, start, services or staff
    /// change, and the new interval is checked against every other appointment.
    pub async fn reschedule(
        &self,
        id: &str,
        changes: UpdateAppointmentRequest,
    ) -> Result<Appointment, SchedulingError> {
        let existing = self
            .owned(id)
            .await?
            .ok_or(SchedulingError::NotFound("Appointment"))?;

        let schedule_changed = changes.touches_schedule();
        let mut updated = existing.clone();
        if let Some(client_id) = changes.client_id {
            updated.client_id = client_id;
        }
        if let Some(notes) = changes.notes {
            updated.notes = Some(notes).filter(|n| !n.is_empty());
        }
        if let Some(status) = changes.status {
            updated.status = status;
        }

        if schedule_changed {
            if let Some(staff_id) = changes.staff_id {
                updated.staff_id = staff_id;
            }
            if let Some(service_ids) = changes.service_ids {
                updated.service_ids = service_ids;
            }
            if let Some(date) = changes.date {
                updated.date = date;
            }
            if let Some(start) = changes.start_time {
                updated.start_time = start;
            }

            let totals = self.totals(&updated.service_ids).await?;
            let range = self.plan(updated.start_time, totals.minutes)?;
            updated.end_time = range.end;
            updated.price_cents = totals.price_cents;
        }

        let reactivated = !existing.status.blocks_time() && updated.status.blocks_time();
        if updated.status.blocks_time() && (schedule_changed || reactivated) {
            self.check(&updated.staff_id, updated.date, &updated.range(), Some(id))
                .await?;
        }

        updated.updated_at = Utc::now().timestamp();
        self.store.update_appointment(&updated).await?;
        tracing::info!(appointment_id = %id, status = %updated.status, "Updated appointment");
        Ok(updated)
    }

    /// Mark an appointment canceled, freeing its slot
    pub async fn cancel(&self, id: &str) -> Result<Appointment, SchedulingError> {
        self.reschedule(
            id,
            UpdateAppointmentRequest {
                status: Some(AppointmentStatus::Canceled),
                ..Default::default()
            },
        )
        .await
    }

    /// Delete an appointment for good
    pub async fn delete(&self, id: &str) -> Result<Appointment, SchedulingError> {
        let existing = self
            .owned(id)
            .await?
            .ok_or(SchedulingError::NotFound("Appointment"))?;
        if !self.store.delete_appointment(id).await? {
            return Err(SchedulingError::NotFound("Appointment"));
        }
        tracing::info!(appointment_id = %id, "Deleted appointment");
        Ok(existing)
    }

    async fn owned(&self, id: &str) -> Result<Option<Appointment>, SchedulingError> {
        Ok(self
            .store
            .get_appointment(id)
            .await?
            .filter(|a| a.account_id == self.account_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::memory::{appointment, service, MemoryStore};
    use crate::scheduling::{format_hhmm, parse_hhmm};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.add_service(service("svc_cut", "45 min", 3500));
        store.add_service(service("svc_color", "1h", 6000));
        store.add_service(service("svc_long", "2h 30min", 12000));
        store.add_service(service("svc_bad", "ask reception", 1000));
        store
    }

    fn request(staff: &str, start: &str, services: &[&str]) -> CreateAppointmentRequest {
        CreateAppointmentRequest {
            client_id: "client_1".to_string(),
            staff_id: staff.to_string(),
            service_ids: services.iter().map(|s| s.to_string()).collect(),
            date: day(),
            start_time: parse_hhmm(start).unwrap(),
            status: None,
            notes: None,
        }
    }

    fn scheduler(store: &MemoryStore) -> Scheduler<'_> {
        Scheduler::new(store, store, "acct_1", DurationPolicy::Strict)
    }

    #[tokio::test]
    async fn test_totals_sum_durations_and_prices() {
        let store = store();
        let totals = scheduler(&store)
            .totals(&["svc_cut".to_string(), "svc_color".to_string()])
            .await
            .unwrap();
        assert_eq!(totals.minutes, 105);
        assert_eq!(totals.price_cents, 9500);
    }

    #[tokio::test]
    async fn test_totals_reject_sums_that_overflow() {
        let store = store();
        store.add_service(service("svc_marathon", "70000000h", 0));
        store.add_service(service("svc_marathon_2", "70000000h", 0));

        let result = scheduler(&store)
            .totals(&["svc_marathon".to_string(), "svc_marathon_2".to_string()])
            .await;
        assert!(matches!(result, Err(SchedulingError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_book_derives_end_time() {
        let store = store();
        let booked = scheduler(&store)
            .book(request("alice", "14:30", &["svc_cut", "svc_color"]))
            .await
            .unwrap();

        assert_eq!(format_hhmm(booked.end_time), "16:15");
        assert_eq!(booked.status, AppointmentStatus::Confirmed);
        assert_eq!(booked.price_cents, 9500);
        assert_eq!(store.all().len(), 1);
    }

    #[tokio::test]
    async fn test_book_rejects_overlap_but_allows_adjacent() {
        let store = store();
        store.insert(appointment("apt_1", "alice", day(), "09:00", "10:00"));
        let s = scheduler(&store);

        let err = s
            .book(request("alice", "09:30", &["svc_cut"]))
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::OverlapDetected(ref id) if id == "apt_1"));

        let ok = s.book(request("alice", "10:00", &["svc_cut"])).await.unwrap();
        assert_eq!(format_hhmm(ok.end_time), "10:45");

        // Another stylist is unaffected
        s.book(request("bob", "09:30", &["svc_cut"])).await.unwrap();
    }

    #[tokio::test]
    async fn test_book_refuses_midnight_and_bad_input() {
        let store = store();
        let s = scheduler(&store);

        assert!(matches!(
            s.book(request("alice", "23:00", &["svc_long"])).await,
            Err(SchedulingError::CrossesMidnight { .. })
        ));
        assert!(matches!(
            s.book(request("alice", "10:00", &[])).await,
            Err(SchedulingError::Invalid(_))
        ));
        assert!(matches!(
            s.book(request("alice", "10:00", &["svc_missing"])).await,
            Err(SchedulingError::Invalid(_))
        ));
        assert!(matches!(
            s.book(request("alice", "10:00", &["svc_bad"])).await,
            Err(SchedulingError::UnparseableDuration(_))
        ));
        assert!(store.all().is_empty());
    }

    #[tokio::test]
    async fn test_lenient_policy_defaults_unparseable_duration() {
        let store = store();
        let s = Scheduler::new(&store, &store, "acct_1", DurationPolicy::Lenient);
        let booked = s.book(request("alice", "10:00", &["svc_bad"])).await.unwrap();
        assert_eq!(format_hhmm(booked.end_time), "11:00");
    }

    #[tokio::test]
    async fn test_services_of_other_accounts_are_unknown() {
        let store = store();
        let mut foreign = service("svc_foreign", "30 min", 100);
        foreign.account_id = "acct_2".to_string();
        store.add_service(foreign);

        let result = scheduler(&store)
            .book(request("alice", "10:00", &["svc_foreign"]))
            .await;
        assert!(matches!(result, Err(SchedulingError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_reschedule_excludes_itself_and_recomputes_end() {
        let store = store();
        let s = scheduler(&store);
        let booked = s.book(request("alice", "09:00", &["svc_color"])).await.unwrap();

        // Shift by 30 minutes, overlapping only its own old interval
        let moved = s
            .reschedule(
                &booked.id,
                UpdateAppointmentRequest {
                    start_time: Some(parse_hhmm("09:30").unwrap()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(format_hhmm(moved.end_time), "10:30");

        // Add a service: end time follows
        let longer = s
            .reschedule(
                &booked.id,
                UpdateAppointmentRequest {
                    service_ids: Some(vec!["svc_color".to_string(), "svc_cut".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(format_hhmm(longer.end_time), "11:15");
        assert_eq!(longer.price_cents, 9500);
    }

    #[tokio::test]
    async fn test_reschedule_onto_another_booking_fails() {
        let store = store();
        store.insert(appointment("apt_other", "alice", day(), "11:00", "12:00"));
        let s = scheduler(&store);
        let booked = s.book(request("alice", "09:00", &["svc_color"])).await.unwrap();

        let err = s
            .reschedule(
                &booked.id,
                UpdateAppointmentRequest {
                    start_time: Some(parse_hhmm("10:30").unwrap()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::OverlapDetected(ref id) if id == "apt_other"));

        let unchanged = store.all().into_iter().find(|a| a.id == booked.id).unwrap();
        assert_eq!(format_hhmm(unchanged.start_time), "09:00");
    }

    #[tokio::test]
    async fn test_cancel_frees_slot_and_reactivation_is_checked() {
        let store = store();
        let s = scheduler(&store);
        let first = s.book(request("alice", "09:00", &["svc_color"])).await.unwrap();

        let canceled = s.cancel(&first.id).await.unwrap();
        assert_eq!(canceled.status, AppointmentStatus::Canceled);

        let second = s.book(request("alice", "09:15", &["svc_cut"])).await.unwrap();
        assert_eq!(second.status, AppointmentStatus::Confirmed);

        let err = s
            .reschedule(
                &first.id,
                UpdateAppointmentRequest {
                    status: Some(AppointmentStatus::Confirmed),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SchedulingError::OverlapDetected(_)));
    }

    #[tokio::test]
    async fn test_store_failures_are_not_treated_as_available() {
        let store = store();
        let s = scheduler(&store);

        store.fail_reads(true);
        assert!(matches!(
            s.book(request("alice", "09:00", &["svc_cut"])).await,
            Err(SchedulingError::Datastore(_))
        ));

        store.fail_reads(false);
        store.fail_writes(true);
        assert!(matches!(
            s.book(request("alice", "09:00", &["svc_cut"])).await,
            Err(SchedulingError::Datastore(_))
        ));
        assert!(store.all().is_empty());
    }

    #[tokio::test]
    async fn test_guarded_write_reports_concurrent_conflict() {
        let store = store();
        let s = scheduler(&store);
        let racer = appointment("apt_racer", "alice", day(), "09:00", "10:00");

        // Two writers that both passed the pre-check: the second insert must lose
        store.create_appointment(&racer).await.unwrap();
        let clash = appointment("apt_late", "alice", day(), "09:30", "10:30");
        let err: SchedulingError = store.create_appointment(&clash).await.unwrap_err().into();
        assert!(matches!(err, SchedulingError::ConcurrentConflict(ref id) if id == "apt_racer"));

        assert!(s.book(request("alice", "10:00", &["svc_cut"])).await.is_ok());
    }

    #[tokio::test]
    async fn test_open_slots_keep_current_time_when_editing() {
        let store = store();
        store.insert(appointment("apt_mine", "alice", day(), "10:15", "11:00"));
        store.insert(appointment("apt_other", "alice", day(), "12:00", "13:00"));
        let s = scheduler(&store);

        let services = vec!["svc_cut".to_string()];
        let (minutes, options) = s
            .open_slots(
                &SlotGrid::default(),
                &SlotQuery {
                    staff_id: "alice",
                    date: day(),
                    service_ids: &services,
                    exclude_id: Some("apt_mine"),
                },
            )
            .await
            .unwrap();
        assert_eq!(minutes, 45);

        let current: Vec<_> = options.iter().filter(|o| o.current).collect();
        assert_eq!(current.len(), 1);
        assert_eq!(format_hhmm(current[0].time), "10:15");
        assert!(!options.iter().any(|o| format_hhmm(o.time) == "11:30"));
        assert!(options.windows(2).all(|w| w[0].time < w[1].time));
    }

    #[tokio::test]
    async fn test_delete_is_hard() {
        let store = store();
        let s = scheduler(&store);
        let booked = s.book(request("alice", "09:00", &["svc_cut"])).await.unwrap();

        s.delete(&booked.id).await.unwrap();
        assert!(store.all().is_empty());
        assert!(matches!(
            s.delete(&booked.id).await,
            Err(SchedulingError::NotFound(_))
        ));
    }
}
