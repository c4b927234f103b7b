//! Cross-backend punishment statistics

use serde::Serialize;
use std::collections::HashSet;

use super::Backends;
use crate::data::CountsSummary;

/// Counts reported by one backend during a session
#[derive(Debug, Clone, Serialize)]
pub struct BackendCounts {
    pub backend: String,
    #[serde(flatten)]
    pub counts: CountsSummary,
}

/// Result of one aggregation session
#[derive(Debug, Clone, Serialize)]
pub struct AggregateCounts {
    pub totals: CountsSummary,
    pub backends: Vec<BackendCounts>,
}

/// Count punishments across every backend
///
/// Backends are visited one after another with a single administrator
/// exclusion set, so `totals.admins` is the number of distinct
/// administrators across all of them. The set lives only for this call.
pub async fn aggregate_counts(backends: &Backends, include_all_servers: bool) -> AggregateCounts {
    let mut exclude_admins = HashSet::new();
    let mut totals = CountsSummary::default();
    let mut per_backend = Vec::with_capacity(backends.len());

    for backend in backends.iter() {
        let counts = backend
            .driver
            .get_counts(None, &mut exclude_admins, include_all_servers)
            .await;
        tracing::debug!(backend = %backend.name, ?counts, "Backend counted");

        totals += counts;
        per_backend.push(BackendCounts {
            backend: backend.name.clone(),
            counts,
        });
    }

    AggregateCounts {
        totals,
        backends: per_backend,
    }
}
