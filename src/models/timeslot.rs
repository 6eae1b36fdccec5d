use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// A half-open wall-clock interval `[start, end)` within one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Check if this range overlaps with another.
    ///
    /// Ranges that only touch (one ends exactly when the other starts) do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check if the instant `t` falls inside this range
    pub fn contains(&self, t: NaiveTime) -> bool {
        self.start <= t && t < self.end
    }
}

/// A start time offered to the user when picking a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotOption {
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    /// The appointment being edited already sits here
    #[serde(default)]
    pub current: bool,
}

impl std::fmt::Display for SlotOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.current {
            write!(f, "{} (current)", self.time.format("%H:%M"))
        } else {
            write!(f, "{}", self.time.format("%H:%M"))
        }
    }
}

/// Request for open slots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    pub staff_id: String,
    pub date: NaiveDate,
    pub service_ids: Vec<String>,
    /// Appointment being edited, ignored when checking for conflicts
    #[serde(default)]
    pub exclude_id: Option<String>,
}

/// Response for an open slots query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub duration_minutes: u32,
    pub slots: Vec<SlotOption>,
}

/// Request to check a single interval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalCheckRequest {
    pub staff_id: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    #[serde(default)]
    pub exclude_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalCheckResponse {
    pub available: bool,
    pub conflicting_appointment_id: Option<String>,
}

/// Date range for listing queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    pub fn single(date: NaiveDate) -> Self {
        Self { from: date, to: date }
    }
}

/// Serde adapter for zero-padded `HH:MM` times
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        crate::scheduling::parse_hhmm(&raw).map_err(serde::de::Error::custom)
    }
}

/// Same as [`hhmm`] for optional fields
pub mod hhmm_opt {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match t {
            Some(t) => s.serialize_some(&t.format("%H:%M").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(raw) => crate::scheduling::parse_hhmm(&raw)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
