//! Figures for the salon dashboard, computed from plain appointment lists.

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::models::{hhmm, hhmm_opt, Appointment, AppointmentStatus, DateWindow, Staff};

/// Bucket size for [`group_by_period`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Day,
    Week,
    Month,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "day" => Some(Period::Day),
            "week" => Some(Period::Week),
            "month" => Some(Period::Month),
            _ => None,
        }
    }

    /// First day of the period containing `date`. Weeks start on Monday.
    pub fn start_of(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Period::Day => date,
            Period::Week => date
                .checked_sub_days(Days::new(date.weekday().num_days_from_monday() as u64))
                .unwrap_or(date),
            Period::Month => date.with_day(1).unwrap_or(date),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub confirmed: usize,
    pub pending: usize,
    pub canceled: usize,
    /// Sum over non-canceled appointments
    pub revenue_cents: i64,
    pub distinct_clients: usize,
}

pub fn summarize(appointments: &[Appointment]) -> Summary {
    let mut summary = Summary {
        total: appointments.len(),
        ..Default::default()
    };
    let mut clients = HashSet::new();

    for a in appointments {
        match a.status {
            AppointmentStatus::Confirmed => summary.confirmed += 1,
            AppointmentStatus::Pending => summary.pending += 1,
            AppointmentStatus::Canceled => summary.canceled += 1,
        }
        if a.status.blocks_time() {
            summary.revenue_cents += a.price_cents;
        }
        clients.insert(a.client_id.as_str());
    }

    summary.distinct_clients = clients.len();
    summary
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodBucket {
    /// First day of the period
    pub start: NaiveDate,
    pub appointments: usize,
    pub revenue_cents: i64,
}

/// Non-canceled appointments bucketed by period, earliest period first
pub fn group_by_period(appointments: &[Appointment], period: Period) -> Vec<PeriodBucket> {
    let mut buckets: BTreeMap<NaiveDate, PeriodBucket> = BTreeMap::new();

    for a in appointments.iter().filter(|a| a.status.blocks_time()) {
        let start = period.start_of(a.date);
        let bucket = buckets.entry(start).or_insert(PeriodBucket {
            start,
            appointments: 0,
            revenue_cents: 0,
        });
        bucket.appointments += 1;
        bucket.revenue_cents += a.price_cents;
    }

    buckets.into_values().collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourCount {
    pub hour: u32,
    pub count: usize,
}

/// Non-canceled appointments per start hour, busiest first
pub fn peak_hours(appointments: &[Appointment]) -> Vec<HourCount> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for a in appointments.iter().filter(|a| a.status.blocks_time()) {
        *counts.entry(a.start_time.hour()).or_default() += 1;
    }

    let mut hours: Vec<HourCount> = counts
        .into_iter()
        .map(|(hour, count)| HourCount { hour, count })
        .collect();
    hours.sort_by(|a, b| b.count.cmp(&a.count).then(a.hour.cmp(&b.hour)));
    hours
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StaffState {
    Busy {
        appointment_id: String,
        #[serde(with = "hhmm")]
        until: NaiveTime,
    },
    Available {
        #[serde(default, with = "hhmm_opt")]
        next_start: Option<NaiveTime>,
    },
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffStatus {
    pub staff_id: String,
    pub name: String,
    pub color: String,
    #[serde(flatten)]
    pub state: StaffState,
}

/// What each staff member is doing at `now`, given today's appointments
pub fn staff_status(staff: &[Staff], today: &[Appointment], now: NaiveTime) -> Vec<StaffStatus> {
    staff
        .iter()
        .map(|member| {
            let state = if !member.active {
                StaffState::Inactive
            } else {
                let mut own: Vec<&Appointment> = today
                    .iter()
                    .filter(|a| a.staff_id == member.id && a.status.blocks_time())
                    .collect();
                own.sort_by_key(|a| a.start_time);

                match own.iter().find(|a| a.range().contains(now)) {
                    Some(current) => StaffState::Busy {
                        appointment_id: current.id.clone(),
                        until: current.end_time,
                    },
                    None => StaffState::Available {
                        next_start: own.iter().map(|a| a.start_time).find(|&s| s > now),
                    },
                }
            };

            StaffStatus {
                staff_id: member.id.clone(),
                name: member.name.clone(),
                color: member.color.clone(),
                state,
            }
        })
        .collect()
}

/// Response of `GET /v1/dashboard`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub window: DateWindow,
    pub period: Period,
    pub summary: Summary,
    pub periods: Vec<PeriodBucket>,
    pub peak_hours: Vec<HourCount>,
}

impl DashboardReport {
    pub fn build(window: DateWindow, period: Period, appointments: &[Appointment]) -> Self {
        Self {
            window,
            period,
            summary: summarize(appointments),
            periods: group_by_period(appointments, period),
            peak_hours: peak_hours(appointments),
        }
    }
}

impl std::fmt::Display for DashboardReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = &self.summary;
        writeln!(f, "Dashboard {} to {}", self.window.from, self.window.to)?;
        writeln!(
            f,
            "  {} appointments ({} confirmed, {} pending, {} canceled), {} clients",
            s.total, s.confirmed, s.pending, s.canceled, s.distinct_clients
        )?;
        writeln!(f, "  Revenue: {}", format_cents(s.revenue_cents))?;

        if !self.periods.is_empty() {
            writeln!(f)?;
            for bucket in &self.periods {
                writeln!(
                    f,
                    "  {}  {:>3} appointments  {:>10}",
                    bucket.start,
                    bucket.appointments,
                    format_cents(bucket.revenue_cents)
                )?;
            }
        }

        if let Some(peak) = self.peak_hours.first() {
            writeln!(f)?;
            writeln!(f, "  Busiest hour: {:02}:00 ({} appointments)", peak.hour, peak.count)?;
        }
        Ok(())
    }
}

pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    format!("{}{}.{:02}", sign, cents.abs() / 100, cents.abs() % 100)
}
