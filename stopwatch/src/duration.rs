use serde::Serialize;

use crate::error::StopwatchError;

/// Elapsed time split into hours, minutes and seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Units {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Units {
    /// Greedy decomposition: whole hours first, then whole minutes of the
    /// remainder, then the leftover seconds.
    #[must_use]
    pub const fn from_seconds(total: u64) -> Self {
        let hours = total / 3600;
        let rest = total - hours * 3600;
        let minutes = rest / 60;
        let seconds = rest - minutes * 60;

        Self {
            hours,
            minutes,
            seconds,
        }
    }

    #[must_use]
    pub const fn total_seconds(self) -> u64 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }
}

/// Parse a displayed duration into seconds.
///
/// Accepts `H:M:S`, where each field is any number of ASCII digits, or a
/// bare count of seconds. Signs, whitespace and empty fields are rejected.
///
/// # Errors
///
/// `StopwatchError::InvalidDuration` if the text matches neither form or the
/// value does not fit in a `u64`.
pub fn parse_duration(text: &str) -> Result<u64, StopwatchError> {
    let invalid = || StopwatchError::InvalidDuration(text.to_string());

    let fields: Vec<&str> = text.split(':').collect();
    let numbers = fields
        .iter()
        .map(|field| parse_field(field))
        .collect::<Option<Vec<u64>>>()
        .ok_or_else(invalid)?;

    match numbers.as_slice() {
        [seconds] => Ok(*seconds),
        [hours, minutes, seconds] => hours
            .checked_mul(3600)
            .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
            .and_then(|hm| hm.checked_add(*seconds))
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

fn parse_field(field: &str) -> Option<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// Render units as `HH:MM:SS`. Fields under ten get a leading zero; hours
/// past 99 are printed in full.
#[must_use]
pub fn format_duration(units: Units) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        units.hours, units.minutes, units.seconds
    )
}
