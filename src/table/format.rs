//! Cell formatter semantics
//!
//! Rust renditions of what the table UI's timestamp and remaining-time
//! formatters display, used by server-side consumers and tests.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::data::{DurationUnit, Timestamp};

/// Translation key for permanent punishments
pub const FOREVER_LABEL: &str = "banscomms.table.forever";

/// `MM-DD-YYYY HH:MM`, or `None` when the value does not parse
pub fn format_timestamp(value: &Timestamp) -> Option<String> {
    value
        .to_datetime()
        .map(|dt| dt.format("%m-%d-%Y %H:%M").to_string())
}

/// Human duration such as `1d 2h 5m`
///
/// Sub-minute remainders are dropped; anything shorter than a minute
/// renders as seconds.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if parts.is_empty() {
        return format!("{seconds}s");
    }
    parts.join(" ")
}

/// Chip state of the remaining-time cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChipState {
    Permanent,
    Expired,
    Active,
}

impl ChipState {
    /// CSS class the table applies to the chip
    pub fn css_class(&self) -> &'static str {
        match self {
            ChipState::Permanent => "bans-forever",
            ChipState::Expired => "bans-end",
            ChipState::Active => "active",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemainingTime {
    pub state: ChipState,
    /// Translation key for permanent chips, human duration otherwise
    pub label: String,
}

/// Remaining-time chip for a punishment
///
/// `duration` is in `unit`; `duration <= 0` is permanent. A punishment
/// whose expiry cannot be determined is treated as still active.
pub fn remaining_time(
    duration: i64,
    unit: DurationUnit,
    expires: Option<&Timestamp>,
    now: DateTime<Utc>,
) -> RemainingTime {
    if duration <= 0 {
        return RemainingTime {
            state: ChipState::Permanent,
            label: FOREVER_LABEL.to_string(),
        };
    }

    let label = format_duration(unit.to_seconds(duration));
    let expired = expires
        .and_then(Timestamp::to_datetime)
        .is_some_and(|expiry| now >= expiry);

    RemainingTime {
        state: if expired {
            ChipState::Expired
        } else {
            ChipState::Active
        },
        label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn zero_duration_is_permanent() {
        let chip = remaining_time(0, DurationUnit::Seconds, None, at(0));
        assert_eq!(chip.state, ChipState::Permanent);
        assert_eq!(chip.label, FOREVER_LABEL);
        assert_eq!(chip.state.css_class(), "bans-forever");
    }

    #[test]
    fn past_expiry_is_expired() {
        let expires = Timestamp::Epoch(1_000_000);
        let chip = remaining_time(3600, DurationUnit::Seconds, Some(&expires), at(2_000_000));
        assert_eq!(chip.state, ChipState::Expired);
        assert_eq!(chip.label, "1h");
    }

    #[test]
    fn future_expiry_is_active() {
        let expires = Timestamp::Text("2030-01-01 00:00:00".to_string());
        let chip = remaining_time(3600, DurationUnit::Seconds, Some(&expires), at(1_700_000_000));
        assert_eq!(chip.state, ChipState::Active);
        assert_eq!(chip.label, "1h");
    }

    #[test]
    fn minutes_are_scaled() {
        let chip = remaining_time(1565, DurationUnit::Minutes, None, at(0));
        assert_eq!(chip.state, ChipState::Active);
        assert_eq!(chip.label, "1d 2h 5m");
    }

    #[test]
    fn short_durations_render_seconds() {
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(86_400 + 30), "1d");
    }

    #[test]
    fn timestamps_render_month_first() {
        assert_eq!(
            format_timestamp(&Timestamp::Text("2024-03-07 09:05:00".to_string())).as_deref(),
            Some("03-07-2024 09:05")
        );
        assert_eq!(format_timestamp(&Timestamp::Epoch(0)), None);
    }
}
