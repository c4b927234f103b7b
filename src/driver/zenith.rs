//! Zenith Bans
//!
//! Punishments are rows of `bans_punishments` typed by a text column
//! (`ban`, `mute`, `gag`, `silence`) and referencing players and
//! administrators in `bans_players`. Timestamps are DATETIME columns.
//! `server_ip = 'all'` marks a punishment valid on every server.

use axum::async_trait;
use sqlx::any::AnyRow;
use std::collections::HashSet;

use super::listing::{ListingPlan, RawCounts, run_listing, settle_counts};
use super::{DriverContext, ListingDriver};
use crate::data::{
    Bind, CountsSummary, DurationUnit, Listing, Predicate, PunishmentKind, PunishmentRecord,
    QueryResult, QuerySpec, SelectQuery, Timestamp, int, text,
};
use crate::error::{AppError, Result};
use crate::identity::SteamId;
use crate::table::{ColumnFlags, ColumnSchema, TimeEncoding};

const NAME: &str = "Zenith";

const GLOBAL_SERVER: &str = "all";

const COLUMNS: &[&str] = &[
    "bans_punishments.id AS id",
    "bans_punishments.type AS type",
    "bans_punishments.reason AS reason",
    "bans_punishments.duration AS duration",
    "CAST(bans_punishments.created_at AS CHAR) AS created_at",
    "CAST(bans_punishments.expires_at AS CHAR) AS expires_at",
    "CAST(bans_players.steam_id AS CHAR) AS player_steam_id",
    "bans_players.name AS player_name",
    "CAST(admin_player.steam_id AS CHAR) AS admin_steam_id",
    "admin_player.name AS admin_name",
];

const FIELDS: &[(&str, &str)] = &[
    ("type", "bans_punishments.type"),
    ("player_name", "bans_players.name"),
    ("created_at", "bans_punishments.created_at"),
    ("reason", "bans_punishments.reason"),
    ("admin_name", "admin_player.name"),
    ("expires_at", "bans_punishments.expires_at"),
    ("duration", "bans_punishments.duration"),
];

const SEARCH: &[&str] = &[
    "bans_players.name",
    "bans_players.steam_id",
    "admin_player.name",
    "admin_player.steam_id",
    "bans_punishments.reason",
];

/// Driver for Zenith Bans databases
pub struct ZenithDriver {
    ctx: DriverContext,
}

impl ZenithDriver {
    pub fn new(ctx: DriverContext) -> Self {
        Self { ctx }
    }

    fn base_query(kinds: &[PunishmentKind], scope: Option<&str>) -> SelectQuery {
        let mut query = SelectQuery::from("bans_punishments")
            .columns(COLUMNS)
            .join("INNER JOIN bans_players ON bans_punishments.player_id = bans_players.id")
            .join(
                "LEFT JOIN bans_players AS admin_player \
                 ON bans_punishments.admin_id = admin_player.id",
            )
            .filter(Predicate::In(
                "bans_punishments.type",
                kinds.iter().map(|kind| Bind::from(kind.as_str())).collect(),
            ));
        if let Some(scope) = scope {
            query.add_filter(Predicate::Any(vec![
                Predicate::Eq("bans_punishments.server_ip", Bind::from(scope)),
                Predicate::Eq("bans_punishments.server_ip", Bind::from(GLOBAL_SERVER)),
            ]));
        }
        query
    }

    fn listing_kinds(listing: Listing) -> &'static [PunishmentKind] {
        match listing {
            Listing::Bans => &[PunishmentKind::Ban],
            Listing::Comms => &[
                PunishmentKind::Mute,
                PunishmentKind::Gag,
                PunishmentKind::Silence,
            ],
        }
    }

    async fn raw_counts(&self, scope: Option<&str>, include_all_servers: bool) -> Result<RawCounts> {
        let db = &self.ctx.db;

        let bans = db
            .count(&Self::base_query(&[PunishmentKind::Ban], scope))
            .await?;
        let mutes = db
            .count(&Self::base_query(
                &[PunishmentKind::Mute, PunishmentKind::Silence],
                scope,
            ))
            .await?;
        let gags = db
            .count(&Self::base_query(&[PunishmentKind::Gag], scope))
            .await?;

        let mut admins = SelectQuery::from("bans_player_ranks")
            .columns(&["CAST(bans_players.steam_id AS CHAR) AS steam_id"])
            .join("INNER JOIN bans_players ON bans_player_ranks.player_id = bans_players.id")
            .distinct();
        if let (Some(scope), false) = (scope, include_all_servers) {
            admins.add_filter(Predicate::Any(vec![
                Predicate::Eq("bans_player_ranks.server_ip", Bind::from(scope)),
                Predicate::Eq("bans_player_ranks.server_ip", Bind::from(GLOBAL_SERVER)),
            ]));
        }
        let admins = db.fetch_texts(&admins, "steam_id").await?;

        Ok(RawCounts {
            bans,
            mutes,
            gags,
            admins,
        })
    }
}

fn punishment_kind(raw: &str) -> Result<PunishmentKind> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "ban" => Ok(PunishmentKind::Ban),
        "mute" => Ok(PunishmentKind::Mute),
        "gag" => Ok(PunishmentKind::Gag),
        "silence" => Ok(PunishmentKind::Silence),
        other => Err(AppError::Internal(anyhow::anyhow!(
            "unknown Zenith punishment type {other:?}"
        ))),
    }
}

fn record_from_row(row: &AnyRow) -> Result<PunishmentRecord> {
    let subject_id = text(row, "player_steam_id")?.unwrap_or_default();
    let administrator_id = text(row, "admin_steam_id")?;
    let kind = punishment_kind(&text(row, "type")?.unwrap_or_default())?;

    Ok(PunishmentRecord {
        subject_steam: SteamId::parse(&subject_id),
        subject_id,
        subject_display_name: text(row, "player_name")?,
        reason: text(row, "reason")?,
        created_at: Timestamp::Text(text(row, "created_at")?.unwrap_or_default()),
        expires_at: text(row, "expires_at")?
            .filter(|value| !value.trim().is_empty())
            .map(Timestamp::Text),
        duration: int(row, "duration")?.unwrap_or(0),
        duration_unit: DurationUnit::Seconds,
        administrator_steam: administrator_id.as_deref().and_then(SteamId::parse),
        administrator_id,
        administrator_display_name: text(row, "admin_name")?,
        kind,
        source_backend: NAME,
    })
}

fn schema(with_kind: bool) -> ColumnSchema {
    let builder = if with_kind {
        ColumnSchema::builder().kind("type")
    } else {
        ColumnSchema::builder()
    };
    builder
        .subject("player_name")
        .created("created_at", TimeEncoding::DateTime)
        .reason("reason", ColumnFlags::ALL)
        .admin("admin_name")
        .expires("expires_at", TimeEncoding::DateTime, ColumnFlags::ALL)
        .duration("duration", DurationUnit::Seconds)
        .remaining()
        .build()
}

#[async_trait]
impl ListingDriver for ZenithDriver {
    fn name(&self) -> &'static str {
        NAME
    }

    fn ban_columns(&self) -> ColumnSchema {
        schema(false)
    }

    fn comms_columns(&self) -> ColumnSchema {
        schema(true)
    }

    async fn list(
        &self,
        listing: Listing,
        scope: Option<&str>,
        spec: &QuerySpec,
    ) -> Result<QueryResult> {
        let scope = self
            .ctx
            .config
            .effective_scope(scope, spec.scope_server_id.as_deref());

        let mut query = Self::base_query(Self::listing_kinds(listing), scope.as_deref());
        if let Some(subject) = spec.subject {
            query.add_filter(Predicate::Eq(
                "bans_players.steam_id",
                Bind::from(subject.to_string()),
            ));
        }

        let plan = ListingPlan {
            schema: self.columns(listing),
            query,
            fields: FIELDS,
            global_search: SEARCH,
            tiebreaker: "bans_punishments.id",
        };
        run_listing(&self.ctx, NAME, listing, plan, spec, record_from_row).await
    }

    async fn get_counts(
        &self,
        scope: Option<&str>,
        exclude_admins: &mut HashSet<String>,
        include_all_servers: bool,
    ) -> CountsSummary {
        let scope = self.ctx.config.effective_scope(scope, None);
        let raw = self.raw_counts(scope.as_deref(), include_all_servers).await;
        settle_counts(NAME, raw, exclude_admins)
    }
}
