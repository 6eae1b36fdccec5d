//! Free-text service durations ("45 min", "1.5h", "2h 30min") to minutes.

use super::SchedulingError;

/// Minutes assumed for a duration that cannot be parsed, when the caller opts in
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

/// Parse a duration descriptor into whole minutes.
///
/// An hour component is a number, integer or decimal, followed by `h`. A minute
/// component is an integer followed by `min`. Both may appear and add up. When
/// neither is present the whole string is read as a bare number of minutes.
/// Matching is case-insensitive and tolerates whitespace before the unit.
pub fn parse_duration(s: &str) -> Result<u32, SchedulingError> {
    let text = s.trim().to_lowercase();
    let mut hours: Option<f64> = None;
    let mut minutes: Option<u32> = None;

    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }

        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let mut is_decimal = false;
        if i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
            is_decimal = true;
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
        let number = &text[start..i];

        let unit = text[i..].trim_start();
        if unit.starts_with("min") {
            if minutes.is_none() && !is_decimal {
                minutes = Some(number.parse().map_err(|_| unparseable(s))?);
            }
        } else if unit.starts_with('h') && hours.is_none() {
            hours = number.parse().ok();
        }
    }

    if hours.is_none() && minutes.is_none() {
        return text
            .parse::<u32>()
            .map_err(|_| unparseable(s));
    }

    let from_hours = match hours {
        Some(h) => {
            let m = (h * 60.0).round();
            if !m.is_finite() || m > u32::MAX as f64 {
                return Err(unparseable(s));
            }
            m as u32
        }
        None => 0,
    };
    from_hours
        .checked_add(minutes.unwrap_or(0))
        .ok_or_else(|| unparseable(s))
}

fn unparseable(s: &str) -> SchedulingError {
    SchedulingError::UnparseableDuration(s.to_string())
}

/// Like [`parse_duration`], falling back to [`DEFAULT_DURATION_MINUTES`]
pub fn parse_duration_or_default(s: &str) -> u32 {
    parse_duration(s).unwrap_or(DEFAULT_DURATION_MINUTES)
}

/// How the booking flow treats a service whose duration does not parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurationPolicy {
    /// Reject the booking
    #[default]
    Strict,
    /// Assume [`DEFAULT_DURATION_MINUTES`] and log a warning
    Lenient,
}

impl DurationPolicy {
    pub fn resolve(&self, service_id: &str, descriptor: &str) -> Result<u32, SchedulingError> {
        match (parse_duration(descriptor), self) {
            (Ok(minutes), _) => Ok(minutes),
            (Err(e), DurationPolicy::Strict) => Err(e),
            (Err(_), DurationPolicy::Lenient) => {
                tracing::warn!(
                    service_id,
                    descriptor,
                    "Unparseable service duration, assuming {} minutes",
                    DEFAULT_DURATION_MINUTES
                );
                Ok(DEFAULT_DURATION_MINUTES)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1.5h").unwrap(), 90);
        assert_eq!(parse_duration("2h 30min").unwrap(), 150);
        assert_eq!(parse_duration("45 min").unwrap(), 45);
        assert_eq!(parse_duration("1h").unwrap(), 60);
        assert_eq!(parse_duration("45").unwrap(), 45);
        assert_eq!(parse_duration(" 90 ").unwrap(), 90);
    }

    #[test]
    fn test_parse_duration_is_case_insensitive() {
        assert_eq!(parse_duration("2H").unwrap(), 120);
        assert_eq!(parse_duration("1H 15MIN").unwrap(), 75);
        assert_eq!(parse_duration("90 Minutes").unwrap(), 90);
        assert_eq!(parse_duration("1 hour").unwrap(), 60);
    }

    #[test]
    fn test_hour_and_minute_grids() {
        for n in 0..=12u32 {
            assert_eq!(parse_duration(&format!("{}h", n)).unwrap(), n * 60);
        }
        for n in [0u32, 5, 15, 45, 59, 120] {
            assert_eq!(parse_duration(&format!("{} min", n)).unwrap(), n);
        }
        assert_eq!(parse_duration("3h 5min").unwrap(), 185);
    }

    #[test]
    fn test_unparseable_durations() {
        assert!(matches!(
            parse_duration("garbage"),
            Err(SchedulingError::UnparseableDuration(_))
        ));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("-30").is_err());
        assert_eq!(parse_duration_or_default("garbage"), 60);
        assert_eq!(parse_duration_or_default(""), 60);
        assert_eq!(parse_duration_or_default("45 min"), 45);
    }

    #[test]
    fn test_huge_durations_are_unparseable() {
        for input in [
            "99999999999h 5min",
            "71582788h 30min",
            "1h 99999999999min",
            "99999999999 min",
            "99999999999",
        ] {
            assert!(
                matches!(parse_duration(input), Err(SchedulingError::UnparseableDuration(_))),
                "{} parsed",
                input
            );
        }
        assert_eq!(parse_duration("71582788h").unwrap(), 4_294_967_280);
        assert!(DurationPolicy::Strict.resolve("svc_1", "71582788h 30min").is_err());
    }

    #[test]
    fn test_policy() {
        assert!(DurationPolicy::Strict.resolve("svc_1", "soon").is_err());
        assert_eq!(DurationPolicy::Lenient.resolve("svc_1", "soon").unwrap(), 60);
        assert_eq!(DurationPolicy::Strict.resolve("svc_1", "1.5h").unwrap(), 90);
    }
}
