//! Page enrichment with resolved profiles

use std::collections::HashSet;
use url::Url;

use super::{IdentityResolver, Profile, SteamId, is_console_actor};
use crate::config::LinksConfig;
use crate::data::PunishmentRecord;
use crate::error::AppError;
use crate::table::{EnrichedRecord, ProfileView};

/// Label shown for console-initiated punishments
pub const CONSOLE_LABEL: &str = "Console";

/// Builds profile and placeholder URLs relative to the public site
#[derive(Debug, Clone)]
pub struct ProfileLinks {
    base: Url,
    placeholder_avatar: String,
}

impl ProfileLinks {
    pub fn new(config: &LinksConfig) -> Result<Self, AppError> {
        let mut base = Url::parse(&config.base_url)
            .map_err(|e| AppError::Config(format!("links.base_url: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let placeholder_avatar = base
            .join(config.placeholder_avatar.trim_start_matches('/'))
            .map_err(|e| AppError::Config(format!("links.placeholder_avatar: {e}")))?
            .to_string();

        Ok(Self {
            base,
            placeholder_avatar,
        })
    }

    /// Site profile search that falls back to the Steam community page
    pub fn profile_url(&self, steam_id: &SteamId) -> String {
        let mut url = self.base.clone();
        url.set_path(&format!(
            "{}profile/search/{steam_id}",
            self.base.path()
        ));
        url.query_pairs_mut().append_pair(
            "else-redirect",
            &format!("https://steamcommunity.com/profiles/{steam_id}"),
        );
        url.to_string()
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder_avatar
    }
}

/// Distinct SteamID64s of subjects and non-console administrators
pub fn collect_identifiers(records: &[PunishmentRecord]) -> HashSet<String> {
    let mut ids = HashSet::new();
    for record in records {
        if let Some(steam) = record.subject_steam {
            ids.insert(steam.to_string());
        }
        if is_console_actor(record.administrator_id.as_deref()) {
            continue;
        }
        if let Some(steam) = record.administrator_steam {
            ids.insert(steam.to_string());
        }
    }
    ids
}

/// Attach display profiles to a page of records
///
/// Issues at most one resolver call per page. Resolved profiles win over
/// stored nicknames; anything unresolved keeps the stored name and gets the
/// placeholder avatar.
pub async fn enrich(
    records: Vec<PunishmentRecord>,
    resolver: &dyn IdentityResolver,
    links: &ProfileLinks,
) -> Vec<EnrichedRecord> {
    let ids = collect_identifiers(&records);
    let resolved = if ids.is_empty() {
        Default::default()
    } else {
        resolver.resolve_batch(&ids).await
    };

    records
        .into_iter()
        .map(|record| {
            let subject = view(
                record.subject_steam,
                record.subject_display_name.as_deref(),
                resolved.get(&steam_key(record.subject_steam)),
                links,
            );
            let admin = if is_console_actor(record.administrator_id.as_deref()) {
                ProfileView {
                    url: String::new(),
                    avatar: links.placeholder().to_string(),
                    name: CONSOLE_LABEL.to_string(),
                }
            } else {
                view(
                    record.administrator_steam,
                    record.administrator_display_name.as_deref(),
                    resolved.get(&steam_key(record.administrator_steam)),
                    links,
                )
            };
            EnrichedRecord {
                record,
                subject,
                admin,
            }
        })
        .collect()
}

fn steam_key(steam: Option<SteamId>) -> String {
    steam.map(|id| id.to_string()).unwrap_or_default()
}

fn view(
    steam: Option<SteamId>,
    stored_name: Option<&str>,
    profile: Option<&Profile>,
    links: &ProfileLinks,
) -> ProfileView {
    let url = steam
        .map(|id| links.profile_url(&id))
        .unwrap_or_default();

    match profile {
        Some(profile) => ProfileView {
            url,
            avatar: if profile.avatar_url.is_empty() {
                links.placeholder().to_string()
            } else {
                profile.avatar_url.clone()
            },
            name: profile.display_name.clone(),
        },
        None => ProfileView {
            url,
            avatar: links.placeholder().to_string(),
            name: stored_name.unwrap_or_default().to_string(),
        },
    }
}
