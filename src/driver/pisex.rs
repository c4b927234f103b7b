//! Pisex Admin
//!
//! All punishments share one `punishments` table discriminated by
//! `punish_type`. Only creation and expiry epochs are stored; the duration
//! is their difference, and `expires = 0` means permanent. `server_id = -1`
//! marks a punishment valid on every server.

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

const NAME: &str = "PisexAdmin";

/// `punishments.punish_type` values
const BAN: i64 = 0;
const MUTE: i64 = 1;
const GAG: i64 = 2;

const GLOBAL_SERVER: i64 = -1;

const DURATION_EXPR: &str = "CASE WHEN punishments.expires = 0 THEN 0 \
     ELSE punishments.expires - punishments.created END";

const COLUMNS: &[&str] = &[
    "punishments.id AS id",
    "CAST(punishments.steamid AS CHAR) AS steamid",
    "punishments.name AS name",
    "punishments.punish_type AS punish_type",
    "punishments.reason AS reason",
    "punishments.created AS created",
    "punishments.expires AS expires",
    "CASE WHEN punishments.expires = 0 THEN 0 \
     ELSE punishments.expires - punishments.created END AS duration",
    "CAST(admins.steamid AS CHAR) AS admin_steamid",
    "admins.name AS admin_name",
];

const FIELDS: &[(&str, &str)] = &[
    ("punish_type", "punishments.punish_type"),
    ("name", "punishments.name"),
    ("created", "punishments.created"),
    ("reason", "punishments.reason"),
    ("admin_name", "admins.name"),
    ("expires", "punishments.expires"),
    ("duration", DURATION_EXPR),
];

const SEARCH: &[&str] = &[
    "punishments.name",
    "punishments.steamid",
    "admins.steamid",
    "admins.name",
    "punishments.reason",
];

/// Driver for Pisex Admin databases
pub struct PisexDriver {
    ctx: DriverContext,
}

impl PisexDriver {
    pub fn new(ctx: DriverContext) -> Self {
        Self { ctx }
    }

    fn base_query(kinds: &[i64], scope: Option<&str>) -> SelectQuery {
        let mut query = SelectQuery::from("punishments")
            .columns(COLUMNS)
            .join("LEFT JOIN admins ON admins.id = punishments.admin_id")
            .filter(Predicate::In(
                "punishments.punish_type",
                kinds.iter().copied().map(Bind::Int).collect(),
            ));
        if let Some(scope) = scope {
            query.add_filter(Predicate::Any(vec![
                Predicate::Eq("punishments.server_id", Bind::from(scope)),
                Predicate::Eq("punishments.server_id", Bind::Int(GLOBAL_SERVER)),
            ]));
        }
        query
    }

    fn listing_kinds(listing: Listing) -> &'static [i64] {
        match listing {
            Listing::Bans => &[BAN],
            Listing::Comms => &[MUTE, GAG],
        }
    }

    async fn raw_counts(&self, scope: Option<&str>, include_all_servers: bool) -> Result<RawCounts> {
        let db = &self.ctx.db;

        let bans = db.count(&Self::base_query(&[BAN], scope)).await?;
        let mutes = db.count(&Self::base_query(&[MUTE], scope)).await?;
        let gags = db.count(&Self::base_query(&[GAG], scope)).await?;

        let mut admins = SelectQuery::from("admins")
            .columns(&["CAST(admins.steamid AS CHAR) AS steamid"])
            .distinct();
        if let (Some(scope), false) = (scope, include_all_servers) {
            admins = admins
                .join("INNER JOIN admins_servers ON admins_servers.admin_id = admins.id")
                .filter(Predicate::Eq("admins_servers.server_id", Bind::from(scope)));
        }
        let admins = db.fetch_texts(&admins, "steamid").await?;

        Ok(RawCounts {
            bans,
            mutes,
            gags,
            admins,
        })
    }
}

fn punishment_kind(punish_type: i64) -> Result<PunishmentKind> {
    match punish_type {
        BAN => Ok(PunishmentKind::Ban),
        MUTE => Ok(PunishmentKind::Mute),
        GAG => Ok(PunishmentKind::Gag),
        other => Err(AppError::Internal(anyhow::anyhow!(
            "unknown Pisex punish_type {other}"
        ))),
    }
}

fn record_from_row(row: &AnyRow) -> Result<PunishmentRecord> {
    let subject_id = text(row, "steamid")?.unwrap_or_default();
    let administrator_id = text(row, "admin_steamid")?;
    let created = int(row, "created")?.unwrap_or(0);
    let expires = int(row, "expires")?.unwrap_or(0);
    let kind = punishment_kind(int(row, "punish_type")?.unwrap_or(BAN))?;

    Ok(PunishmentRecord {
        subject_steam: SteamId::parse(&subject_id),
        subject_id,
        subject_display_name: text(row, "name")?,
        reason: text(row, "reason")?,
        created_at: Timestamp::Epoch(created),
        expires_at: (expires > 0).then_some(Timestamp::Epoch(expires)),
        duration: if expires > 0 { (expires - created).max(0) } else { 0 },
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
        ColumnSchema::builder().kind("punish_type")
    } else {
        ColumnSchema::builder()
    };
    builder
        .subject("name")
        .created("created", TimeEncoding::EpochSeconds)
        .reason("reason", ColumnFlags::ALL)
        .admin("admin_name")
        .expires("expires", TimeEncoding::EpochSeconds, ColumnFlags::ALL)
        .duration("duration", DurationUnit::Seconds)
        .remaining()
        .build()
}

#[async_trait]
impl ListingDriver for PisexDriver {
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
                "punishments.steamid",
                Bind::from(subject.to_string()),
            ));
        }

        let plan = ListingPlan {
            schema: self.columns(listing),
            query,
            fields: FIELDS,
            global_search: SEARCH,
            tiebreaker: "punishments.id",
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
