use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{hhmm, hhmm_opt, Appointment, AppointmentStatus};

/// Types of webhook events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventType {
    /// A new appointment was booked
    AppointmentCreated,
    /// An appointment changed (time, staff, services, client, notes or status)
    AppointmentRescheduled,
    /// An appointment was canceled
    AppointmentCanceled,
    /// An appointment was deleted
    AppointmentDeleted,
    /// Sent by `POST /v1/webhooks/test`
    Test,
}

impl WebhookEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEventType::AppointmentCreated => "appointment.created",
            WebhookEventType::AppointmentRescheduled => "appointment.rescheduled",
            WebhookEventType::AppointmentCanceled => "appointment.canceled",
            WebhookEventType::AppointmentDeleted => "appointment.deleted",
            WebhookEventType::Test => "webhook.test",
        }
    }

    /// Event for an edit: a transition into canceled is a cancellation, anything else a reschedule
    pub fn for_update(before: AppointmentStatus, after: AppointmentStatus) -> Self {
        if after == AppointmentStatus::Canceled && before != AppointmentStatus::Canceled {
            WebhookEventType::AppointmentCanceled
        } else {
            WebhookEventType::AppointmentRescheduled
        }
    }
}

impl std::fmt::Display for WebhookEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Webhook event payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event type
    pub event: String,
    /// Timestamp of the event
    pub timestamp: DateTime<Utc>,
    /// Event-specific data
    pub data: WebhookEventData,
}

impl WebhookEvent {
    pub fn new(event_type: WebhookEventType, data: WebhookEventData) -> Self {
        Self {
            event: event_type.as_str().to_string(),
            timestamp: Utc::now(),
            data,
        }
    }

    /// Event describing the state of `appointment` after a write
    pub fn for_appointment(event_type: WebhookEventType, appointment: &Appointment) -> Self {
        Self::new(event_type, WebhookEventData::from(appointment))
    }
}

/// Event-specific data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEventData {
    pub appointment_id: String,
    pub client_id: String,
    pub staff_id: String,
    pub service_ids: Vec<String>,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    pub price_cents: i64,
    /// Date before a reschedule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_date: Option<NaiveDate>,
    /// Start time before a reschedule
    #[serde(default, skip_serializing_if = "Option::is_none", with = "hhmm_opt")]
    pub previous_start_time: Option<NaiveTime>,
}

impl From<&Appointment> for WebhookEventData {
    fn from(a: &Appointment) -> Self {
        Self {
            appointment_id: a.id.clone(),
            client_id: a.client_id.clone(),
            staff_id: a.staff_id.clone(),
            service_ids: a.service_ids.clone(),
            date: a.date,
            start_time: a.start_time,
            end_time: a.end_time,
            status: a.status,
            price_cents: a.price_cents,
            previous_date: None,
            previous_start_time: None,
        }
    }
}

impl WebhookEventData {
    /// Record where the appointment was before it moved
    pub fn moved_from(mut self, before: &Appointment) -> Self {
        if before.date != self.date || before.start_time != self.start_time {
            self.previous_date = Some(before.date);
            self.previous_start_time = Some(before.start_time);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::parse_hhmm;

    fn sample() -> Appointment {
        Appointment {
            id: "apt_1".to_string(),
            account_id: "acct_1".to_string(),
            client_id: "client_1".to_string(),
            staff_id: "alice".to_string(),
            service_ids: vec!["svc_cut".to_string()],
            date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            start_time: parse_hhmm("14:30").unwrap(),
            end_time: parse_hhmm("16:15").unwrap(),
            status: AppointmentStatus::Confirmed,
            price_cents: 9000,
            notes: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_event_payload_shape() {
        let event = WebhookEvent::for_appointment(WebhookEventType::AppointmentCreated, &sample());
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "appointment.created");
        assert_eq!(json["data"]["start_time"], "14:30");
        assert_eq!(json["data"]["end_time"], "16:15");
        assert_eq!(json["data"]["date"], "2024-06-10");
        assert!(json["data"].get("previous_start_time").is_none());
    }

    #[test]
    fn test_update_event_type() {
        use AppointmentStatus::*;

        assert_eq!(
            WebhookEventType::for_update(Confirmed, Canceled),
            WebhookEventType::AppointmentCanceled
        );
        assert_eq!(
            WebhookEventType::for_update(Pending, Canceled),
            WebhookEventType::AppointmentCanceled
        );
        assert_eq!(
            WebhookEventType::for_update(Confirmed, Confirmed),
            WebhookEventType::AppointmentRescheduled
        );
        assert_eq!(
            WebhookEventType::for_update(Pending, Confirmed),
            WebhookEventType::AppointmentRescheduled
        );
        // Editing notes on an already canceled appointment
        assert_eq!(
            WebhookEventType::for_update(Canceled, Canceled),
            WebhookEventType::AppointmentRescheduled
        );
    }

    #[test]
    fn test_moved_from_records_previous_slot() {
        let before = sample();
        let mut after = before.clone();
        after.start_time = parse_hhmm("15:00").unwrap();

        let data = WebhookEventData::from(&after).moved_from(&before);
        assert_eq!(data.previous_start_time, Some(before.start_time));
        assert_eq!(data.previous_date, Some(before.date));

        let unchanged = WebhookEventData::from(&before).moved_from(&before);
        assert!(unchanged.previous_start_time.is_none());
    }
}
