//! Fresh Bans (AMX Bans)
//!
//! Only bans are tracked: the `bans` table stores Steam2 player ids, epoch
//! creation times and lengths in minutes. Administrators in `amxadmins`
//! are matched by Steam2 id; one id may hold several rows (one per
//! server), so the join goes through a per-id aggregate.

use axum::async_trait;
use sqlx::any::AnyRow;
use std::collections::HashSet;

use super::listing::{ListingPlan, RawCounts, run_listing, settle_counts};
use super::{DriverContext, ListingDriver};
use crate::data::{
    Bind, CountsSummary, DurationUnit, Listing, Predicate, PunishmentKind, PunishmentRecord,
    QueryResult, QuerySpec, SelectQuery, Timestamp, int, text,
};
use crate::error::Result;
use crate::identity::SteamId;
use crate::table::{ColumnFlags, ColumnSchema, TimeEncoding};

const NAME: &str = "FreshBansDriver";

const ADMINS_JOIN: &str = "LEFT JOIN (SELECT steamid, MAX(nickname) AS nickname \
     FROM amxadmins GROUP BY steamid) AS amxadmins ON bans.admin_id = amxadmins.steamid";

const ENDS_EXPR: &str = "(bans.ban_created + bans.ban_length * 60)";

const ADMIN_NAME_EXPR: &str = "COALESCE(amxadmins.nickname, bans.admin_nick)";

const COLUMNS: &[&str] = &[
    "bans.bid AS bid",
    "bans.player_id AS player_id",
    "bans.player_nick AS player_name",
    "bans.ban_reason AS reason",
    "bans.ban_created AS ban_created",
    "bans.ban_length AS ban_length",
    "bans.admin_id AS admin_id",
    "COALESCE(amxadmins.nickname, bans.admin_nick) AS admin_name",
];

const FIELDS: &[(&str, &str)] = &[
    ("player_name", "bans.player_nick"),
    ("ban_created", "bans.ban_created"),
    ("reason", "bans.ban_reason"),
    ("admin_name", ADMIN_NAME_EXPR),
    ("ends", ENDS_EXPR),
    ("ban_length", "bans.ban_length"),
];

const SEARCH: &[&str] = &[
    "bans.player_id",
    "bans.player_nick",
    "bans.admin_id",
    "bans.admin_nick",
    "bans.ban_reason",
];

/// Driver for Fresh Bans databases
pub struct FreshBansDriver {
    ctx: DriverContext,
}

impl FreshBansDriver {
    pub fn new(ctx: DriverContext) -> Self {
        Self { ctx }
    }

    /// Ban query; `scope` is the server address (`ip:port`)
    fn base_query(scope: Option<&str>) -> SelectQuery {
        let mut query = SelectQuery::from("bans").columns(COLUMNS).join(ADMINS_JOIN);
        if let Some(scope) = scope {
            query.add_filter(Predicate::Eq("bans.server_ip", Bind::from(scope)));
        }
        query
    }

    async fn raw_counts(&self, scope: Option<&str>) -> Result<RawCounts> {
        let db = &self.ctx.db;

        let bans = db.count(&Self::base_query(scope)).await?;
        let admins = SelectQuery::from("amxadmins")
            .columns(&["amxadmins.steamid AS steamid"])
            .distinct();
        let admins = db.fetch_texts(&admins, "steamid").await?;

        Ok(RawCounts {
            bans,
            mutes: 0,
            gags: 0,
            admins,
        })
    }
}

fn record_from_row(row: &AnyRow) -> Result<PunishmentRecord> {
    let subject_id = text(row, "player_id")?.unwrap_or_default();
    let administrator_id = text(row, "admin_id")?;
    let created = int(row, "ban_created")?.unwrap_or(0);
    let length = int(row, "ban_length")?.unwrap_or(0);

    Ok(PunishmentRecord {
        subject_steam: SteamId::parse(&subject_id),
        subject_id,
        subject_display_name: text(row, "player_name")?,
        reason: text(row, "reason")?,
        created_at: Timestamp::Epoch(created),
        expires_at: (length > 0)
            .then(|| Timestamp::Epoch(created.saturating_add(length.saturating_mul(60)))),
        duration: length,
        duration_unit: DurationUnit::Minutes,
        administrator_steam: administrator_id.as_deref().and_then(SteamId::parse),
        administrator_id,
        administrator_display_name: text(row, "admin_name")?,
        kind: PunishmentKind::Ban,
        source_backend: NAME,
    })
}

fn ban_schema() -> ColumnSchema {
    ColumnSchema::builder()
        .subject("player_name")
        .created("ban_created", TimeEncoding::EpochSeconds)
        .reason("reason", ColumnFlags::NONE)
        .admin("admin_name")
        .expires("ends", TimeEncoding::EpochSeconds, ColumnFlags::NONE)
        .duration("ban_length", DurationUnit::Minutes)
        .remaining()
        .build()
}

#[async_trait]
impl ListingDriver for FreshBansDriver {
    fn name(&self) -> &'static str {
        NAME
    }

    fn ban_columns(&self) -> ColumnSchema {
        ban_schema()
    }

    fn comms_columns(&self) -> ColumnSchema {
        ColumnSchema::builder()
            .kind("type")
            .subject("player_name")
            .created("ban_created", TimeEncoding::EpochSeconds)
            .reason("reason", ColumnFlags::ALL)
            .admin("admin_name")
            .expires("ends", TimeEncoding::EpochSeconds, ColumnFlags::ALL)
            .duration("ban_length", DurationUnit::Minutes)
            .remaining()
            .build()
    }

    async fn list(
        &self,
        listing: Listing,
        scope: Option<&str>,
        spec: &QuerySpec,
    ) -> Result<QueryResult> {
        // No communication restrictions are stored
        if listing == Listing::Comms {
            return Ok(QueryResult::empty(spec.draw));
        }

        let scope = self
            .ctx
            .config
            .effective_scope(scope, spec.scope_server_id.as_deref());

        let mut query = Self::base_query(scope.as_deref());
        if let Some(subject) = spec.subject {
            query.add_filter(Predicate::EndsWith("bans.player_id", subject.steam2_suffix()));
        }

        let plan = ListingPlan {
            schema: self.ban_columns(),
            query,
            fields: FIELDS,
            global_search: SEARCH,
            tiebreaker: "bans.bid",
        };
        run_listing(&self.ctx, NAME, listing, plan, spec, record_from_row).await
    }

    async fn get_counts(
        &self,
        scope: Option<&str>,
        exclude_admins: &mut HashSet<String>,
        _include_all_servers: bool,
    ) -> CountsSummary {
        let scope = self.ctx.config.effective_scope(scope, None);
        let raw = self.raw_counts(scope.as_deref()).await;
        settle_counts(NAME, raw, exclude_admins)
    }
}
