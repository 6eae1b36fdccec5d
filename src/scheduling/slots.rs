use chrono::{NaiveDate, NaiveTime};

use super::{
    end_time_same_day, find_overlap, from_minutes_of_day, minutes_of_day, AppointmentStore,
    SchedulingError, MINUTES_PER_DAY,
};
use crate::models::{BookedInterval, BusinessHours, SlotOption, TimeRange};

/// Candidate start times: every `step_minutes` from `opening`, strictly before `closing`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotGrid {
    pub opening: NaiveTime,
    pub closing: NaiveTime,
    pub step_minutes: u32,
}

impl SlotGrid {
    pub fn new(opening: NaiveTime, closing: NaiveTime, step_minutes: u32) -> Self {
        Self {
            opening,
            closing,
            step_minutes,
        }
    }

    pub fn candidates(&self) -> Vec<NaiveTime> {
        if self.step_minutes == 0 {
            return Vec::new();
        }
        let closing = minutes_of_day(self.closing);
        (minutes_of_day(self.opening)..closing.min(MINUTES_PER_DAY))
            .step_by(self.step_minutes as usize)
            .map(from_minutes_of_day)
            .collect()
    }
}

impl From<BusinessHours> for SlotGrid {
    fn from(hours: BusinessHours) -> Self {
        Self::new(hours.opening, hours.closing, hours.slot_minutes)
    }
}

impl Default for SlotGrid {
    fn default() -> Self {
        BusinessHours::default().into()
    }
}

/// Keep the candidates whose `[start, start + duration)` is free, in input order.
///
/// Candidates that would end past midnight are dropped.
pub fn filter_free(
    candidates: &[NaiveTime],
    duration_minutes: u32,
    booked: &[BookedInterval],
    exclude_id: Option<&str>,
) -> Vec<NaiveTime> {
    candidates
        .iter()
        .copied()
        .filter(|&start| match end_time_same_day(start, duration_minutes) {
            Ok(end) => find_overlap(booked, &TimeRange::new(start, end), exclude_id).is_none(),
            Err(_) => false,
        })
        .collect()
}

/// Start times on `date` at which `staff_id` is free for `duration_minutes`
pub async fn available_start_times(
    store: &dyn AppointmentStore,
    grid: &SlotGrid,
    staff_id: &str,
    date: NaiveDate,
    duration_minutes: u32,
    exclude_id: Option<&str>,
) -> Result<Vec<NaiveTime>, SchedulingError> {
    let booked = store.list_appointments(staff_id, date, exclude_id).await?;
    Ok(filter_free(
        &grid.candidates(),
        duration_minutes,
        &booked,
        exclude_id,
    ))
}

/// Turn available start times into options, keeping the time currently held by
/// an appointment being edited even when it is not offered.
pub fn slot_options(available: &[NaiveTime], current: Option<NaiveTime>) -> Vec<SlotOption> {
    let mut options: Vec<SlotOption> = available
        .iter()
        .map(|&time| SlotOption {
            time,
            current: Some(time) == current,
        })
        .collect();

    if let Some(current) = current {
        if !available.contains(&current) {
            let at = options.partition_point(|o| o.time < current);
            options.insert(
                at,
                SlotOption {
                    time: current,
                    current: true,
                },
            );
        }
    }

    options
}
