//! Listing pipeline shared by every driver
//!
//! Drivers describe their tables; this module turns a `QuerySpec` into
//! filters and ordering over that description, pages it, resolves
//! identities and normalizes rows.

use sqlx::any::AnyRow;
use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

use super::DriverContext;
use crate::data::{
    CountsSummary, Direction, Listing, Predicate, PunishmentRecord, QueryResult, QuerySpec,
    SelectQuery,
};
use crate::error::Result;
use crate::identity::{self, SteamId, is_console_actor};
use crate::metrics::{COUNT_FAILURES_TOTAL, observe_listing};
use crate::table::{self, ColumnSchema};

/// A driver's description of one listing query
pub(crate) struct ListingPlan<'a> {
    pub schema: ColumnSchema,
    /// Projection, kind, scope and subject filters already applied
    pub query: SelectQuery,
    /// Column field key -> SQL expression for search and ordering
    pub fields: &'a [(&'a str, &'static str)],
    /// Expressions matched by the global search term
    pub global_search: &'a [&'static str],
    /// Unique key appended to every ORDER BY for stable pages
    pub tiebreaker: &'static str,
}

/// Run one listing end to end
pub(crate) async fn run_listing<F>(
    ctx: &DriverContext,
    backend: &'static str,
    listing: Listing,
    plan: ListingPlan<'_>,
    spec: &QuerySpec,
    map_row: F,
) -> Result<QueryResult>
where
    F: Fn(&AnyRow) -> Result<PunishmentRecord> + Send + Sync,
{
    let started = Instant::now();
    let result = page(ctx, plan, spec, map_row).await;
    let status = if result.is_ok() { "success" } else { "error" };
    observe_listing(backend, listing.as_str(), status, started.elapsed());

    if let Err(e) = &result {
        tracing::warn!(backend, listing = listing.as_str(), error = %e, "Listing failed");
    }
    result
}

async fn page<F>(
    ctx: &DriverContext,
    plan: ListingPlan<'_>,
    spec: &QuerySpec,
    map_row: F,
) -> Result<QueryResult>
where
    F: Fn(&AnyRow) -> Result<PunishmentRecord> + Send + Sync,
{
    let ListingPlan {
        schema,
        mut query,
        fields,
        global_search,
        tiebreaker,
    } = plan;

    apply_column_search(&mut query, spec, &schema, fields);
    apply_global_search(&mut query, spec, global_search);
    apply_ordering(&mut query, spec, &schema, fields, tiebreaker);

    let filtered = ctx.db.count(&query).await?;
    let records = ctx
        .db
        .fetch_page(&query, spec.per_page, spec.offset())
        .await?
        .iter()
        .map(&map_row)
        .collect::<Result<Vec<_>>>()?;

    let enriched = identity::enrich(records, ctx.identity.as_ref(), &ctx.links).await;
    let data = table::normalize(&schema, &enriched);

    Ok(QueryResult {
        draw: spec.draw,
        records_total: filtered,
        records_filtered: filtered,
        data,
    })
}

fn field<'a>(fields: &'a [(&'a str, &'static str)], key: &str) -> Option<&'static str> {
    fields
        .iter()
        .find(|(field_key, _)| *field_key == key)
        .map(|(_, expr)| *expr)
}

/// Substring filters for client columns carrying a search value
///
/// A column is only searched when the client marks it searchable, the
/// schema declares it searchable and the driver maps it to an expression.
pub(crate) fn apply_column_search(
    query: &mut SelectQuery,
    spec: &QuerySpec,
    schema: &ColumnSchema,
    fields: &[(&str, &'static str)],
) {
    for column in &spec.columns {
        if !column.searchable {
            continue;
        }
        let Some(term) = column.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            continue;
        };
        let declared = schema
            .columns()
            .iter()
            .any(|def| def.field_key == column.name && def.searchable);
        if !declared {
            continue;
        }
        if let Some(expr) = field(fields, &column.name) {
            query.add_filter(Predicate::Contains(expr, term.to_string()));
        }
    }
}

/// One disjunction of substring matches for the global search term
pub(crate) fn apply_global_search(
    query: &mut SelectQuery,
    spec: &QuerySpec,
    exprs: &[&'static str],
) {
    let Some(term) = spec.global_search() else {
        return;
    };
    if exprs.is_empty() {
        return;
    }
    query.add_filter(Predicate::Any(
        exprs
            .iter()
            .map(|expr| Predicate::Contains(*expr, term.to_string()))
            .collect(),
    ));
}

/// ORDER BY from the client's rules, falling back to the schema default
///
/// Rules pointing outside the column list, at columns the client or the
/// schema marks non-orderable, or at unmapped columns are dropped.
pub(crate) fn apply_ordering(
    query: &mut SelectQuery,
    spec: &QuerySpec,
    schema: &ColumnSchema,
    fields: &[(&str, &'static str)],
    tiebreaker: &'static str,
) {
    for rule in &spec.order {
        let Some(column) = spec.columns.get(rule.column) else {
            continue;
        };
        if !column.orderable {
            continue;
        }
        let declared = schema
            .columns()
            .iter()
            .any(|def| def.field_key == column.name && def.orderable);
        if !declared {
            continue;
        }
        if let Some(expr) = field(fields, &column.name) {
            query.order_by(expr, rule.direction);
        }
    }

    if !query.has_order() {
        let default = schema
            .default_order()
            .and_then(|index| schema.get(index))
            .and_then(|def| field(fields, def.field_key));
        if let Some(expr) = default {
            query.order_by(expr, Direction::Desc);
        }
    }

    query.order_by(tiebreaker, Direction::Desc);
}

/// Unreduced count results of one backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCounts {
    pub bans: u64,
    pub mutes: u64,
    pub gags: u64,
    /// Administrator ids visible under the requested scope, as stored
    pub admins: Vec<String>,
}

/// Reduce raw counts against the session's administrator exclusion set
///
/// Ids are canonicalized to SteamID64 when they parse, so one person
/// stored as Steam2 in one backend and SteamID64 in another counts once.
/// A failed count is logged and reported as zeros without touching the set.
pub fn settle_counts(
    backend: &str,
    raw: Result<RawCounts>,
    exclude_admins: &mut HashSet<String>,
) -> CountsSummary {
    let raw = match raw {
        Ok(raw) => raw,
        Err(e) => {
            COUNT_FAILURES_TOTAL.with_label_values(&[backend]).inc();
            tracing::error!(backend, error = %e, "Failed to count punishments");
            return CountsSummary::default();
        }
    };

    let admins: BTreeSet<String> = raw
        .admins
        .iter()
        .filter(|id| !is_console_actor(Some(id.as_str())))
        .map(|id| {
            SteamId::parse(id)
                .map(|steam| steam.to_string())
                .unwrap_or_else(|| id.trim().to_string())
        })
        .collect();

    let mut new_admins = 0;
    for admin in admins {
        if exclude_admins.insert(admin) {
            new_admins += 1;
        }
    }

    CountsSummary {
        bans: raw.bans,
        mutes: raw.mutes,
        gags: raw.gags,
        admins: new_admins,
    }
}
