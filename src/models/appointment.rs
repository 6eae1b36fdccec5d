use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::timeslot::{hhmm, hhmm_opt, TimeRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Confirmed,
    Pending,
    Canceled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Canceled => "canceled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "confirmed" => Some(AppointmentStatus::Confirmed),
            "pending" => Some(AppointmentStatus::Pending),
            "canceled" | "cancelled" => Some(AppointmentStatus::Canceled),
            _ => None,
        }
    }

    /// Whether an appointment in this status occupies its staff member's time
    pub fn blocks_time(&self) -> bool {
        !matches!(self, AppointmentStatus::Canceled)
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An appointment stored in the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub account_id: String,
    pub client_id: String,
    pub staff_id: String,
    pub service_ids: Vec<String>,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    /// Derived from start time and service durations; rewritten on every edit
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    pub price_cents: i64,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Appointment {
    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time)
    }

    pub fn as_booked(&self) -> BookedInterval {
        BookedInterval {
            id: self.id.clone(),
            range: self.range(),
            status: self.status,
        }
    }
}

/// The slice of an appointment the availability check looks at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedInterval {
    pub id: String,
    #[serde(flatten)]
    pub range: TimeRange,
    pub status: AppointmentStatus,
}

/// Request to book an appointment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub client_id: String,
    pub staff_id: String,
    pub service_ids: Vec<String>,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(default)]
    pub status: Option<AppointmentStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update of an appointment. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(
        default,
        with = "hhmm_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl UpdateAppointmentRequest {
    /// Whether the change moves the appointment in time or across staff
    pub fn touches_schedule(&self) -> bool {
        self.staff_id.is_some()
            || self.service_ids.is_some()
            || self.date.is_some()
            || self.start_time.is_some()
    }
}

/// Appointment listing returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentList {
    pub appointments: Vec<Appointment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_and_alias() {
        for status in [
            AppointmentStatus::Confirmed,
            AppointmentStatus::Pending,
            AppointmentStatus::Canceled,
        ] {
            assert_eq!(AppointmentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(
            AppointmentStatus::parse("cancelled"),
            Some(AppointmentStatus::Canceled)
        );
        assert_eq!(AppointmentStatus::parse("done"), None);
        assert!(!AppointmentStatus::Canceled.blocks_time());
        assert!(AppointmentStatus::Pending.blocks_time());
    }

    #[test]
    fn test_update_request_parses_partial_json() {
        let req: UpdateAppointmentRequest =
            serde_json::from_str(r#"{"start_time":"14:30","notes":"running late"}"#).unwrap();
        assert_eq!(req.start_time, NaiveTime::from_hms_opt(14, 30, 0));
        assert!(req.touches_schedule());

        let notes_only: UpdateAppointmentRequest =
            serde_json::from_str(r#"{"notes":"bring photos"}"#).unwrap();
        assert!(!notes_only.touches_schedule());
        assert!(notes_only.start_time.is_none());
    }
}
