//! Identity resolver implementations

use axum::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use super::{IdentityResolver, Profile};
use crate::config::IdentityConfig;
use crate::data::ProfileCache;
use crate::error::AppError;
use crate::metrics::IDENTITY_LOOKUPS_TOTAL;

/// Steam caps GetPlayerSummaries at 100 ids per call
const MAX_BATCH: usize = 100;

/// GetPlayerSummaries response envelope
#[derive(Debug, Deserialize)]
struct SummariesEnvelope {
    response: SummariesResponse,
}

#[derive(Debug, Deserialize)]
struct SummariesResponse {
    #[serde(default)]
    players: Vec<PlayerSummary>,
}

#[derive(Debug, Deserialize)]
struct PlayerSummary {
    steamid: String,
    personaname: String,
    #[serde(default)]
    avatarfull: String,
}

/// Resolves profiles through the Steam Web API
///
/// Profiles are cached per SteamID64; only ids missing from the cache are
/// requested upstream, in sequential batches.
pub struct SteamWebResolver {
    http_client: reqwest::Client,
    api_url: String,
    api_key: String,
    batch_size: usize,
    cache: ProfileCache,
}

impl SteamWebResolver {
    /// Create resolver
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &IdentityConfig, api_key: String) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("banscomms/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout.max(1)))
            .build()
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(Self {
            http_client,
            api_url: config.steam_api_url.trim_end_matches('/').to_string(),
            api_key,
            batch_size: config.batch_size.clamp(1, MAX_BATCH),
            cache: ProfileCache::new(Duration::from_secs(config.cache_ttl), 50_000),
        })
    }

    async fn fetch_summaries(&self, ids: &[&String]) -> Result<Vec<PlayerSummary>, AppError> {
        let joined = ids
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/ISteamUser/GetPlayerSummaries/v0002/", self.api_url);

        let envelope: SummariesEnvelope = self
            .http_client
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("steamids", joined.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(envelope.response.players)
    }
}

#[async_trait]
impl IdentityResolver for SteamWebResolver {
    async fn resolve_batch(&self, ids: &HashSet<String>) -> HashMap<String, Profile> {
        let mut resolved = HashMap::with_capacity(ids.len());
        let mut missing = Vec::new();

        for id in ids {
            match self.cache.get(id).await {
                Some(profile) => {
                    resolved.insert(id.clone(), profile.as_ref().clone());
                }
                None => missing.push(id),
            }
        }

        // Stable batches make upstream requests reproducible
        missing.sort();

        for chunk in missing.chunks(self.batch_size) {
            match self.fetch_summaries(chunk).await {
                Ok(players) => {
                    IDENTITY_LOOKUPS_TOTAL.with_label_values(&["success"]).inc();
                    for player in players {
                        if !ids.contains(&player.steamid) {
                            continue;
                        }
                        let profile = Profile {
                            display_name: player.personaname,
                            avatar_url: player.avatarfull,
                            canonical_id: player.steamid.clone(),
                        };
                        self.cache
                            .insert(player.steamid.clone(), profile.clone())
                            .await;
                        resolved.insert(player.steamid, profile);
                    }
                }
                Err(e) => {
                    IDENTITY_LOOKUPS_TOTAL.with_label_values(&["failure"]).inc();
                    tracing::warn!(
                        error = %e,
                        batch = chunk.len(),
                        "Profile lookup failed, falling back to stored names"
                    );
                }
            }
        }

        resolved
    }
}

/// Resolver used when no Steam Web API key is configured
pub struct NullResolver;

#[async_trait]
impl IdentityResolver for NullResolver {
    async fn resolve_batch(&self, _ids: &HashSet<String>) -> HashMap<String, Profile> {
        HashMap::new()
    }
}
