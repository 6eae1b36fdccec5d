use chrono::NaiveDate;

use super::{AppointmentStore, SchedulingError};
use crate::models::{BookedInterval, TimeRange};

/// First booking in `booked` that blocks `candidate`.
///
/// Canceled bookings and the one with id `exclude_id` never block.
pub fn find_overlap<'a>(
    booked: &'a [BookedInterval],
    candidate: &TimeRange,
    exclude_id: Option<&str>,
) -> Option<&'a BookedInterval> {
    booked.iter().find(|b| {
        b.status.blocks_time()
            && exclude_id != Some(b.id.as_str())
            && b.range.overlaps(candidate)
    })
}

/// Look up the appointment, if any, that keeps `staff_id` busy during `candidate` on `date`
pub async fn find_conflict(
    store: &dyn AppointmentStore,
    staff_id: &str,
    date: NaiveDate,
    candidate: &TimeRange,
    exclude_id: Option<&str>,
) -> Result<Option<BookedInterval>, SchedulingError> {
    let booked = store
        .list_appointments(staff_id, date, exclude_id)
        .await?;
    Ok(find_overlap(&booked, candidate, exclude_id).cloned())
}

/// Whether `staff_id` is free for the whole of `candidate` on `date`.
///
/// A datastore failure is returned as an error, never as "available".
pub async fn is_available(
    store: &dyn AppointmentStore,
    staff_id: &str,
    date: NaiveDate,
    candidate: &TimeRange,
    exclude_id: Option<&str>,
) -> Result<bool, SchedulingError> {
    Ok(find_conflict(store, staff_id, date, candidate, exclude_id)
        .await?
        .is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentStatus;
    use crate::scheduling::memory::{appointment, MemoryStore};
    use crate::scheduling::parse_hhmm;

    fn range(start: &str, end: &str) -> TimeRange {
        TimeRange::new(parse_hhmm(start).unwrap(), parse_hhmm(end).unwrap())
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    #[tokio::test]
    async fn test_overlap_and_boundary() {
        let store = MemoryStore::new();
        store.insert(appointment("apt_1", "alice", day(), "09:00", "10:00"));

        assert!(!is_available(&store, "alice", day(), &range("09:30", "10:15"), None)
            .await
            .unwrap());
        assert!(is_available(&store, "alice", day(), &range("10:00", "10:30"), None)
            .await
            .unwrap());
        assert!(is_available(&store, "alice", day(), &range("08:00", "09:00"), None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_scoped_to_staff_and_date() {
        let store = MemoryStore::new();
        store.insert(appointment("apt_1", "alice", day(), "09:00", "10:00"));

        assert!(is_available(&store, "bob", day(), &range("09:00", "10:00"), None)
            .await
            .unwrap());
        let next_day = day().succ_opt().unwrap();
        assert!(is_available(&store, "alice", next_day, &range("09:00", "10:00"), None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_canceled_appointments_do_not_block() {
        let store = MemoryStore::new();
        let mut canceled = appointment("apt_1", "alice", day(), "09:00", "10:00");
        canceled.status = AppointmentStatus::Canceled;
        store.insert(canceled);

        assert!(is_available(&store, "alice", day(), &range("09:15", "09:45"), None)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_pending_appointments_block() {
        let store = MemoryStore::new();
        let mut pending = appointment("apt_1", "alice", day(), "09:00", "10:00");
        pending.status = AppointmentStatus::Pending;
        store.insert(pending);

        let conflict = find_conflict(&store, "alice", day(), &range("09:15", "09:45"), None)
            .await
            .unwrap();
        assert_eq!(conflict.map(|c| c.id), Some("apt_1".to_string()));
    }

    #[tokio::test]
    async fn test_excluded_appointment_never_conflicts_with_itself() {
        let store = MemoryStore::new();
        store.insert(appointment("apt_1", "alice", day(), "09:00", "10:00"));
        store.insert(appointment("apt_2", "alice", day(), "11:00", "12:00"));

        // Unchanged interval
        assert!(is_available(&store, "alice", day(), &range("09:00", "10:00"), Some("apt_1"))
            .await
            .unwrap());
        // Moved but still overlapping its old self
        assert!(is_available(&store, "alice", day(), &range("09:30", "10:30"), Some("apt_1"))
            .await
            .unwrap());
        // Moved onto somebody else
        assert!(!is_available(&store, "alice", day(), &range("10:30", "11:30"), Some("apt_1"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = MemoryStore::new();
        store.fail_reads(true);

        let result = is_available(&store, "alice", day(), &range("09:00", "10:00"), None).await;
        assert!(matches!(result, Err(SchedulingError::Datastore(_))));
    }
}
