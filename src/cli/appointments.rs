use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveTime};
use serde::Serialize;
use std::collections::HashMap;

use super::{ApiClient, OutputFormat};
use crate::dashboard::format_cents;
use crate::models::{
    Appointment, AppointmentList, AppointmentStatus, AvailabilityRequest, AvailabilityResponse,
    Client, CreateAppointmentRequest, Staff, UpdateAppointmentRequest,
};

impl std::fmt::Display for AvailabilityResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.slots.is_empty() {
            return write!(f, "No open slots for {} minutes.", self.duration_minutes);
        }
        writeln!(f, "Open slots for {} minutes:", self.duration_minutes)?;
        for slot in &self.slots {
            writeln!(f, "  {}", slot)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Appointment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}-{} staff {} client {} [{}] {}",
            self.id,
            self.date,
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M"),
            self.staff_id,
            self.client_id,
            self.status,
            format_cents(self.price_cents)
        )
    }
}

/// Day-by-day agenda with staff and client names resolved
#[derive(Debug, Serialize)]
pub struct Agenda {
    pub appointments: Vec<Appointment>,
    #[serde(skip)]
    staff_names: HashMap<String, String>,
    #[serde(skip)]
    client_names: HashMap<String, String>,
}

impl Agenda {
    pub fn new(appointments: Vec<Appointment>, staff: &[Staff], clients: &[Client]) -> Self {
        Self {
            appointments,
            staff_names: staff.iter().map(|s| (s.id.clone(), s.name.clone())).collect(),
            client_names: clients
                .iter()
                .map(|c| (c.id.clone(), c.name.clone()))
                .collect(),
        }
    }
}

impl std::fmt::Display for Agenda {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.appointments.is_empty() {
            return write!(f, "No appointments.");
        }
        let mut day = None;
        for a in &self.appointments {
            if day != Some(a.date) {
                writeln!(f, "{}", a.date.format("%A %Y-%m-%d"))?;
                day = Some(a.date);
            }
            let staff = self.staff_names.get(&a.staff_id).unwrap_or(&a.staff_id);
            let client = self.client_names.get(&a.client_id).unwrap_or(&a.client_id);
            write!(
                f,
                "  {}-{}  {:<16} {:<20} {}",
                a.start_time.format("%H:%M"),
                a.end_time.format("%H:%M"),
                staff,
                client,
                a.id
            )?;
            if a.status != AppointmentStatus::Confirmed {
                write!(f, "  ({})", a.status)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Open start times for a staff member and set of services
pub async fn run_slots(
    staff_id: &str,
    date: NaiveDate,
    service_ids: Vec<String>,
    editing: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let api = ApiClient::from_config()?;
    let request = AvailabilityRequest {
        staff_id: staff_id.to_string(),
        date,
        service_ids,
        exclude_id: editing.map(String::from),
    };
    let response: AvailabilityResponse = api.post("/v1/availability", &request).await?;
    format.print(&response);
    Ok(())
}

pub async fn run_book(req: CreateAppointmentRequest, format: OutputFormat) -> Result<()> {
    let api = ApiClient::from_config()?;
    let appointment: Appointment = api.post("/v1/appointments", &req).await?;
    format.print(&appointment);
    Ok(())
}

pub async fn run_reschedule(
    id: &str,
    changes: UpdateAppointmentRequest,
    format: OutputFormat,
) -> Result<()> {
    if !changes.touches_schedule() && changes.status.is_none() && changes.notes.is_none() {
        anyhow::bail!("Nothing to change. Pass --date, --time, --services or --staff.");
    }
    let api = ApiClient::from_config()?;
    let appointment: Appointment = api
        .patch(&format!("/v1/appointments/{}", id), &changes)
        .await?;
    format.print(&appointment);
    Ok(())
}

pub async fn run_cancel(id: &str, format: OutputFormat) -> Result<()> {
    let api = ApiClient::from_config()?;
    let appointment: Appointment = api
        .post(
            &format!("/v1/appointments/{}/cancel", id),
            &serde_json::json!({}),
        )
        .await?;
    format.print(&appointment);
    Ok(())
}

pub async fn run_delete(id: &str, format: OutputFormat) -> Result<()> {
    let api = ApiClient::from_config()?;
    let appointment: Appointment = api.delete(&format!("/v1/appointments/{}", id)).await?;
    format.print(&super::SuccessResponse::new(format!(
        "Deleted {}",
        appointment.id
    )));
    Ok(())
}

/// Appointments for a day (today by default), optionally for one staff member
pub async fn run_agenda(
    date: Option<NaiveDate>,
    to: Option<NaiveDate>,
    staff_id: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let api = ApiClient::from_config()?;
    let from = date.unwrap_or_else(|| Local::now().date_naive());
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("from", &from.to_string());
    query.append_pair("to", &to.unwrap_or(from).to_string());
    if let Some(staff_id) = staff_id {
        query.append_pair("staff_id", staff_id);
    }

    let list: AppointmentList = api
        .get(&format!("/v1/appointments?{}", query.finish()))
        .await?;
    let staff: Vec<Staff> = api.get("/v1/staff?all=true").await?;
    let clients: Vec<Client> = api.get("/v1/clients").await?;

    format.print(&Agenda::new(list.appointments, &staff, &clients));
    Ok(())
}

/// Parse an `HH:MM` command-line argument
pub fn parse_time_arg(s: &str) -> Result<NaiveTime, String> {
    crate::scheduling::parse_hhmm(s).map_err(|e| e.to_string())
}

/// Parse a `YYYY-MM-DD` command-line argument
pub fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SlotOption;
    use crate::scheduling::parse_hhmm;

    #[test]
    fn test_slots_display_marks_current() {
        let response = AvailabilityResponse {
            duration_minutes: 60,
            slots: vec![
                SlotOption {
                    time: parse_hhmm("09:00").unwrap(),
                    current: false,
                },
                SlotOption {
                    time: parse_hhmm("09:30").unwrap(),
                    current: true,
                },
            ],
        };
        let text = response.to_string();
        assert!(text.contains("  09:00\n"));
        assert!(text.contains("  09:30 (current)"));
    }

    #[test]
    fn test_agenda_resolves_names() {
        let appointment = Appointment {
            id: "apt_1".to_string(),
            account_id: "acct_1".to_string(),
            client_id: "client_1".to_string(),
            staff_id: "staff_1".to_string(),
            service_ids: vec![],
            date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            start_time: parse_hhmm("14:30").unwrap(),
            end_time: parse_hhmm("16:15").unwrap(),
            status: AppointmentStatus::Pending,
            price_cents: 0,
            notes: None,
            created_at: 0,
            updated_at: 0,
        };
        let staff = vec![Staff {
            id: "staff_1".to_string(),
            account_id: "acct_1".to_string(),
            name: "Alice".to_string(),
            color: "#888".to_string(),
            active: true,
            created_at: 0,
        }];

        let text = Agenda::new(vec![appointment], &staff, &[]).to_string();
        assert!(text.starts_with("Monday 2024-06-10"));
        assert!(text.contains("14:30-16:15  Alice"));
        assert!(text.contains("client_1"));
        assert!(text.contains("(pending)"));
    }

    #[test]
    fn test_argument_parsers() {
        assert!(parse_time_arg("14:30").is_ok());
        assert!(parse_time_arg("25:00").is_err());
        assert!(parse_date_arg("2024-06-10").is_ok());
        assert!(parse_date_arg("10/06/2024").is_err());
    }
}
