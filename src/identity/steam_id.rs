//! Steam account identifiers
//!
//! Backends store players in one of three textual forms:
//! - SteamID64: `76561197960265729`
//! - Steam2: `STEAM_0:1:0` (`STEAM_X:Y:Z`, account id = Z * 2 + Y)
//! - Steam3: `[U:1:1]`
//!
//! Everything is normalized to SteamID64, which is what the Steam Web API
//! and profile links expect.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// SteamID64 of account id 0 in the public universe
const INDIVIDUAL_BASE: u64 = 76_561_197_960_265_728;

/// A 64-bit Steam account identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SteamId(u64);

impl SteamId {
    /// Build from a 32-bit account id
    pub fn from_account_id(account_id: u32) -> Self {
        Self(INDIVIDUAL_BASE + u64::from(account_id))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn account_id(&self) -> u32 {
        (self.0 - INDIVIDUAL_BASE) as u32
    }

    /// Steam2 rendering, always in universe 0
    pub fn to_steam2(&self) -> String {
        let account = self.account_id();
        format!("STEAM_0:{}:{}", account % 2, account / 2)
    }

    /// The `:Y:Z` tail of the Steam2 form, shared by every universe prefix
    pub fn steam2_suffix(&self) -> String {
        let account = self.account_id();
        format!(":{}:{}", account % 2, account / 2)
    }

    /// Parse any supported form, returning `None` for anything else
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Some(rest) = strip_prefix_ignore_case(raw, "STEAM_") {
            return parse_steam2(rest);
        }
        if raw.starts_with('[') && raw.ends_with(']') {
            return parse_steam3(&raw[1..raw.len() - 1]);
        }
        if raw.bytes().all(|b| b.is_ascii_digit()) {
            let value: u64 = raw.parse().ok()?;
            if value > INDIVIDUAL_BASE && value - INDIVIDUAL_BASE <= u64::from(u32::MAX) {
                return Some(Self(value));
            }
        }
        None
    }
}

fn strip_prefix_ignore_case<'a>(raw: &'a str, prefix: &str) -> Option<&'a str> {
    let head = raw.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &raw[prefix.len()..])
}

fn parse_steam2(rest: &str) -> Option<SteamId> {
    let mut parts = rest.split(':');
    let universe: u8 = parts.next()?.parse().ok()?;
    let y: u32 = parts.next()?.parse().ok()?;
    let z: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || universe > 5 || y > 1 {
        return None;
    }
    let account = z.checked_mul(2)?.checked_add(y)?;
    Some(SteamId::from_account_id(account))
}

fn parse_steam3(inner: &str) -> Option<SteamId> {
    let mut parts = inner.split(':');
    let kind = parts.next()?;
    let _universe: u8 = parts.next()?.parse().ok()?;
    let account: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || !kind.eq_ignore_ascii_case("U") {
        return None;
    }
    Some(SteamId::from_account_id(account))
}

impl fmt::Display for SteamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SteamId {
    type Err = crate::error::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
            .ok_or_else(|| crate::error::AppError::Validation(format!("invalid steam id: {s}")))
    }
}

impl Serialize for SteamId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_forms_agree() {
        let from64 = SteamId::parse("76561197960265729").unwrap();
        let from2 = SteamId::parse("STEAM_0:1:0").unwrap();
        let from2_universe1 = SteamId::parse("STEAM_1:1:0").unwrap();
        let from3 = SteamId::parse("[U:1:1]").unwrap();

        assert_eq!(from64, from2);
        assert_eq!(from64, from2_universe1);
        assert_eq!(from64, from3);
        assert_eq!(from64.account_id(), 1);
    }

    #[test]
    fn test_steam2_rendering() {
        let id = SteamId::parse("76561198000000000").unwrap();
        let steam2 = id.to_steam2();
        assert_eq!(SteamId::parse(&steam2), Some(id));
        assert!(steam2.ends_with(&id.steam2_suffix()));
        assert_eq!(SteamId::from_account_id(11).to_steam2(), "STEAM_0:1:5");
    }

    #[test]
    fn test_rejects_garbage() {
        for raw in ["", "CONSOLE", "0", "123", "STEAM_0:2:5", "STEAM_0:1", "[G:1:5]", "abc"] {
            assert_eq!(SteamId::parse(raw), None, "{raw} should not parse");
        }
    }

    #[test]
    fn test_from_str_reports_validation_error() {
        let err = "nope".parse::<SteamId>().unwrap_err();
        assert!(matches!(err, crate::error::AppError::Validation(_)));
    }

    #[test]
    fn test_serializes_as_string() {
        let id = SteamId::from_account_id(1);
        assert_eq!(
            serde_json::to_value(id).unwrap(),
            serde_json::json!("76561197960265729")
        );
    }
}
