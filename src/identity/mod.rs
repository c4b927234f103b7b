//! Player identity resolution
//!
//! Backends only know raw Steam ids and whatever nickname was stored at
//! punishment time. This module resolves ids to current profiles in one
//! batch per page and builds the profile links shown in the table.

mod enrich;
mod resolver;
mod steam_id;

pub use enrich::{ProfileLinks, collect_identifiers, enrich};
pub use resolver::{NullResolver, SteamWebResolver};
pub use steam_id::SteamId;

use axum::async_trait;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A resolved player profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub display_name: String,
    pub avatar_url: String,
    /// SteamID64 the profile was resolved for
    pub canonical_id: String,
}

/// Batch lookup of player profiles
///
/// Implementations are best-effort: unknown ids are simply missing from
/// the returned map, and upstream failures yield a partial or empty map
/// instead of an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve SteamID64 strings to profiles
    async fn resolve_batch(&self, ids: &HashSet<String>) -> HashMap<String, Profile>;
}

/// Administrator ids that stand for the server itself
const CONSOLE_SENTINELS: &[&str] = &["CONSOLE", "SERVER", "0", "STEAM_ID_SERVER"];

/// Whether an administrator id denotes a console/server-initiated action
pub fn is_console_actor(id: Option<&str>) -> bool {
    match id.map(str::trim) {
        None | Some("") => true,
        Some(id) => CONSOLE_SENTINELS
            .iter()
            .any(|sentinel| sentinel.eq_ignore_ascii_case(id)),
    }
}
