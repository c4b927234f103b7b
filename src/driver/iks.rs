//! IKS Admin
//!
//! Bans and communication restrictions live in separate tables (`bans`,
//! `comms`) with epoch-second timestamps. `server_id IS NULL` marks a
//! punishment valid on every server. Administrators are in `admins`, with
//! per-server assignments in `admin_to_server`.

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

const NAME: &str = "IKSAdmin";

const BANS_COLUMNS: &[&str] = &[
    "bans.id AS id",
    "CAST(bans.steam_id AS CHAR) AS steam_id",
    "bans.name AS name",
    "bans.reason AS reason",
    "bans.created_at AS created_at",
    "bans.end_at AS end_at",
    "bans.duration AS duration",
    "CAST(admins.steam_id AS CHAR) AS admin_steam_id",
    "admins.name AS admin_name",
];

const COMMS_COLUMNS: &[&str] = &[
    "comms.id AS id",
    "CAST(comms.steam_id AS CHAR) AS steam_id",
    "comms.name AS name",
    "comms.reason AS reason",
    "comms.created_at AS created_at",
    "comms.end_at AS end_at",
    "comms.duration AS duration",
    "comms.mute_type AS mute_type",
    "CAST(admins.steam_id AS CHAR) AS admin_steam_id",
    "admins.name AS admin_name",
];

const BANS_FIELDS: &[(&str, &str)] = &[
    ("name", "bans.name"),
    ("created_at", "bans.created_at"),
    ("reason", "bans.reason"),
    ("admin_name", "admins.name"),
    ("end_at", "bans.end_at"),
    ("duration", "bans.duration"),
];

const COMMS_FIELDS: &[(&str, &str)] = &[
    ("mute_type", "comms.mute_type"),
    ("name", "comms.name"),
    ("created_at", "comms.created_at"),
    ("reason", "comms.reason"),
    ("admin_name", "admins.name"),
    ("end_at", "comms.end_at"),
    ("duration", "comms.duration"),
];

const BANS_SEARCH: &[&str] = &[
    "bans.name",
    "bans.reason",
    "bans.steam_id",
    "admins.name",
    "admins.steam_id",
];

const COMMS_SEARCH: &[&str] = &[
    "comms.name",
    "comms.reason",
    "comms.steam_id",
    "admins.name",
    "admins.steam_id",
];

/// `comms.mute_type` values
const MUTE: i64 = 0;
const GAG: i64 = 1;
const SILENCE: i64 = 2;

/// Driver for IKS Admin databases
pub struct IksDriver {
    ctx: DriverContext,
}

impl IksDriver {
    pub fn new(ctx: DriverContext) -> Self {
        Self { ctx }
    }

    /// Base query for one table, with admin join and scope
    fn base_query(listing: Listing, scope: Option<&str>) -> SelectQuery {
        let (from, columns, join, server_id) = match listing {
            Listing::Comms => (
                "comms",
                COMMS_COLUMNS,
                "LEFT JOIN admins ON comms.admin_id = admins.id",
                "comms.server_id",
            ),
            Listing::Bans => (
                "bans",
                BANS_COLUMNS,
                "LEFT JOIN admins ON bans.admin_id = admins.id",
                "bans.server_id",
            ),
        };
        let mut query = SelectQuery::from(from).columns(columns).join(join);
        if listing == Listing::Comms {
            query.add_filter(Predicate::In(
                "comms.mute_type",
                vec![Bind::Int(MUTE), Bind::Int(GAG), Bind::Int(SILENCE)],
            ));
        }
        if let Some(scope) = scope {
            query.add_filter(Predicate::Any(vec![
                Predicate::IsNull(server_id),
                Predicate::Eq(server_id, Bind::from(scope)),
            ]));
        }
        query
    }

    async fn raw_counts(&self, scope: Option<&str>, include_all_servers: bool) -> Result<RawCounts> {
        let db = &self.ctx.db;

        let bans = db.count(&Self::base_query(Listing::Bans, scope)).await?;
        let mutes = db
            .count(
                &Self::base_query(Listing::Comms, scope).filter(Predicate::In(
                    "comms.mute_type",
                    vec![Bind::Int(MUTE), Bind::Int(SILENCE)],
                )),
            )
            .await?;
        let gags = db
            .count(&Self::base_query(Listing::Comms, scope).filter(Predicate::Eq(
                "comms.mute_type",
                Bind::Int(GAG),
            )))
            .await?;

        let mut admins = SelectQuery::from("admins")
            .columns(&["CAST(admins.steam_id AS CHAR) AS steam_id"])
            .distinct();
        if let (Some(scope), false) = (scope, include_all_servers) {
            admins = admins
                .join("INNER JOIN admin_to_server ON admin_to_server.admin_id = admins.id")
                .filter(Predicate::Eq("admin_to_server.server_id", Bind::from(scope)));
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

fn comms_kind(mute_type: i64) -> Result<PunishmentKind> {
    match mute_type {
        MUTE => Ok(PunishmentKind::Mute),
        GAG => Ok(PunishmentKind::Gag),
        SILENCE => Ok(PunishmentKind::Silence),
        other => Err(AppError::Internal(anyhow::anyhow!(
            "unknown IKS mute_type {other}"
        ))),
    }
}

fn record_from_row(row: &AnyRow, kind: PunishmentKind) -> Result<PunishmentRecord> {
    let subject_id = text(row, "steam_id")?.unwrap_or_default();
    let administrator_id = text(row, "admin_steam_id")?;
    let end_at = int(row, "end_at")?.unwrap_or(0);

    Ok(PunishmentRecord {
        subject_steam: SteamId::parse(&subject_id),
        subject_id,
        subject_display_name: text(row, "name")?,
        reason: text(row, "reason")?,
        created_at: Timestamp::Epoch(int(row, "created_at")?.unwrap_or(0)),
        expires_at: (end_at > 0).then_some(Timestamp::Epoch(end_at)),
        duration: int(row, "duration")?.unwrap_or(0),
        duration_unit: DurationUnit::Seconds,
        administrator_steam: administrator_id.as_deref().and_then(SteamId::parse),
        administrator_id,
        administrator_display_name: text(row, "admin_name")?,
        kind,
        source_backend: NAME,
    })
}

#[async_trait]
impl ListingDriver for IksDriver {
    fn name(&self) -> &'static str {
        NAME
    }

    fn ban_columns(&self) -> ColumnSchema {
        ColumnSchema::builder()
            .subject("name")
            .created("created_at", TimeEncoding::EpochSeconds)
            .reason("reason", ColumnFlags::ALL)
            .admin("admin_name")
            .expires("end_at", TimeEncoding::EpochSeconds, ColumnFlags::ALL)
            .duration("duration", DurationUnit::Seconds)
            .remaining()
            .build()
    }

    fn comms_columns(&self) -> ColumnSchema {
        ColumnSchema::builder()
            .kind("mute_type")
            .subject("name")
            .created("created_at", TimeEncoding::EpochSeconds)
            .reason("reason", ColumnFlags::ALL)
            .admin("admin_name")
            .expires("end_at", TimeEncoding::EpochSeconds, ColumnFlags::ALL)
            .duration("duration", DurationUnit::Seconds)
            .remaining()
            .build()
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

        match listing {
            Listing::Bans => {
                let mut query = Self::base_query(Listing::Bans, scope.as_deref());
                if let Some(subject) = spec.subject {
                    query.add_filter(Predicate::Eq("bans.steam_id", Bind::from(subject.to_string())));
                }
                let plan = ListingPlan {
                    schema: self.ban_columns(),
                    query,
                    fields: BANS_FIELDS,
                    global_search: BANS_SEARCH,
                    tiebreaker: "bans.id",
                };
                run_listing(&self.ctx, NAME, listing, plan, spec, |row| {
                    record_from_row(row, PunishmentKind::Ban)
                })
                .await
            }
            Listing::Comms => {
                let mut query = Self::base_query(Listing::Comms, scope.as_deref());
                if let Some(subject) = spec.subject {
                    query.add_filter(Predicate::Eq("comms.steam_id", Bind::from(subject.to_string())));
                }
                let plan = ListingPlan {
                    schema: self.comms_columns(),
                    query,
                    fields: COMMS_FIELDS,
                    global_search: COMMS_SEARCH,
                    tiebreaker: "comms.id",
                };
                run_listing(&self.ctx, NAME, listing, plan, spec, |row| {
                    let kind = comms_kind(int(row, "mute_type")?.unwrap_or(MUTE))?;
                    record_from_row(row, kind)
                })
                .await
            }
        }
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
