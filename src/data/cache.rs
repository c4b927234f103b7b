//! In-memory caches
//!
//! These caches are volatile and cleared on restart.
//! Uses Moka for high-performance concurrent caching.

use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::identity::Profile;

// =============================================================================
// Profile Cache
// =============================================================================

/// Resolved profiles keyed by 64-bit Steam id
///
/// Entries expire after the configured TTL so renamed players and new
/// avatars show up eventually without a restart.
pub struct ProfileCache {
    profiles: Cache<String, Arc<Profile>>,
}

impl ProfileCache {
    /// Create new profile cache
    ///
    /// # Arguments
    /// * `ttl` - Lifetime of one entry
    /// * `max_capacity` - Maximum number of profiles kept
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let profiles = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self { profiles }
    }

    /// Get profile by Steam id
    pub async fn get(&self, steam_id: &str) -> Option<Arc<Profile>> {
        let result = self.profiles.get(steam_id).await;

        use crate::metrics::{CACHE_HITS_TOTAL, CACHE_MISSES_TOTAL};
        if result.is_some() {
            CACHE_HITS_TOTAL.with_label_values(&["profile"]).inc();
        } else {
            CACHE_MISSES_TOTAL.with_label_values(&["profile"]).inc();
        }

        result
    }

    /// Insert or update profile
    pub async fn insert(&self, steam_id: String, profile: Profile) {
        self.profiles.insert(steam_id, Arc::new(profile)).await;
    }
}

impl Default for ProfileCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600), 10_000)
    }
}
