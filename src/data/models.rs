//! Data models
//!
//! Request, result and record types shared by every backend driver.
//! Nothing here is persisted: records are projections of third-party
//! storage, rebuilt on every call.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

use crate::identity::SteamId;

// =============================================================================
// Punishments
// =============================================================================

/// Kind of punishment a record represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PunishmentKind {
    Ban,
    Mute,
    Gag,
    Silence,
}

impl PunishmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PunishmentKind::Ban => "ban",
            PunishmentKind::Mute => "mute",
            PunishmentKind::Gag => "gag",
            PunishmentKind::Silence => "silence",
        }
    }
}

/// Which listing a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Listing {
    /// Ban records
    Bans,
    /// Communication restrictions (mute, gag, silence)
    Comms,
}

impl Listing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Listing::Bans => "bans",
            Listing::Comms => "comms",
        }
    }
}

/// Backend timestamp in whichever encoding the backend stores
///
/// Serializes untagged so the table receives the native value:
/// a number for epoch seconds, a string for datetime columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    /// Unix epoch seconds
    Epoch(i64),
    /// Datetime text (`YYYY-MM-DD HH:MM:SS` or RFC 3339)
    Text(String),
}

impl Timestamp {
    /// Parse into a UTC datetime
    ///
    /// Returns `None` for zero epochs and unparsable text, which backends
    /// use to mean "never".
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Epoch(0) => None,
            Timestamp::Epoch(secs) => Utc.timestamp_opt(*secs, 0).single(),
            Timestamp::Text(raw) => {
                let raw = raw.trim();
                if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
                    return Some(parsed.with_timezone(&Utc));
                }
                ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
                    .iter()
                    .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                    .map(|naive| naive.and_utc())
            }
        }
    }
}

/// Unit a backend stores punishment durations in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    Seconds,
    Minutes,
}

impl DurationUnit {
    pub fn to_seconds(&self, value: i64) -> i64 {
        match self {
            DurationUnit::Seconds => value,
            DurationUnit::Minutes => value.saturating_mul(60),
        }
    }
}

/// One punishment as read from a backend
#[derive(Debug, Clone, PartialEq)]
pub struct PunishmentRecord {
    /// Backend-native player identifier
    pub subject_id: String,
    /// Platform identity of the player, when the native id converts to one
    pub subject_steam: Option<SteamId>,
    pub subject_display_name: Option<String>,
    pub reason: Option<String>,
    pub created_at: Timestamp,
    /// `None` when the backend stores no expiry
    pub expires_at: Option<Timestamp>,
    /// Raw duration in `duration_unit`; 0 means permanent
    pub duration: i64,
    pub duration_unit: DurationUnit,
    /// Backend-native administrator identifier
    pub administrator_id: Option<String>,
    pub administrator_steam: Option<SteamId>,
    pub administrator_display_name: Option<String>,
    pub kind: PunishmentKind,
    pub source_backend: &'static str,
}

// =============================================================================
// Listing requests
// =============================================================================

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

impl Direction {
    /// Anything other than "asc" sorts descending
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("asc") {
            Direction::Asc
        } else {
            Direction::Desc
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One column as echoed back by the table UI
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnRequest {
    pub name: String,
    pub searchable: bool,
    pub orderable: bool,
    /// Per-column search value
    pub search: Option<String>,
}

/// One ordering request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderRule {
    /// Index into `QuerySpec::columns`
    pub column: usize,
    pub direction: Direction,
}

/// A paginated, searchable, sortable listing request
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    /// Opaque correlation value echoed back unchanged
    pub draw: i64,
    /// 1-based page number
    pub page: u32,
    pub per_page: u32,
    pub columns: Vec<ColumnRequest>,
    pub search: Option<String>,
    pub order: Vec<OrderRule>,
    pub scope_server_id: Option<String>,
    /// Restricts the listing to one player
    pub subject: Option<SteamId>,
}

impl QuerySpec {
    pub fn new(draw: i64, page: u32, per_page: u32) -> Self {
        Self {
            draw,
            page: page.max(1),
            per_page,
            columns: Vec::new(),
            search: None,
            order: Vec::new(),
            scope_server_id: None,
            subject: None,
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.per_page)
    }

    /// Global search term, if it holds anything besides whitespace
    pub fn global_search(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

// =============================================================================
// Listing results
// =============================================================================

/// One page of normalized rows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub draw: i64,
    /// Count of the filtered query; no unfiltered baseline is tracked
    pub records_total: u64,
    pub records_filtered: u64,
    pub data: Vec<Vec<serde_json::Value>>,
}

impl QueryResult {
    /// Empty page for requests that cannot match anything
    pub fn empty(draw: i64) -> Self {
        Self {
            draw,
            records_total: 0,
            records_filtered: 0,
            data: Vec::new(),
        }
    }
}

/// Per-backend totals for one aggregation call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CountsSummary {
    pub bans: u64,
    pub mutes: u64,
    pub gags: u64,
    /// Administrators first seen by this call
    pub admins: u64,
}

impl AddAssign for CountsSummary {
    fn add_assign(&mut self, other: Self) {
        self.bans += other.bans;
        self.mutes += other.mutes;
        self.gags += other.gags;
        self.admins += other.admins;
    }
}

/// The player a "my punishments" listing is rendered for
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Player {
    /// Linked Steam account, if any
    pub steam_id: Option<SteamId>,
}

impl Player {
    pub fn new(steam_id: Option<SteamId>) -> Self {
        Self { steam_id }
    }
}
