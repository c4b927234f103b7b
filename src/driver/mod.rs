//! Backend listing drivers
//!
//! Every supported punishment database is served by one `ListingDriver`
//! implementation. Drivers share no state beyond a `DriverContext`; each
//! one owns its table layout, column schema and query construction.

mod fresh_bans;
mod iks;
mod listing;
mod pisex;
mod zenith;

pub use fresh_bans::FreshBansDriver;
pub use iks::IksDriver;
pub use listing::{RawCounts, settle_counts};
pub use pisex::PisexDriver;
pub use zenith::ZenithDriver;

use axum::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::DriverKind;
use crate::data::{CountsSummary, Database, Listing, Player, QueryResult, QuerySpec};
use crate::error::Result;
use crate::identity::{IdentityResolver, ProfileLinks};
use crate::table::ColumnSchema;

/// Scope value meaning "every server"
const UNSCOPED: &str = "-1";

/// Immutable per-backend settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverConfig {
    /// Server whose records this backend exposes; `None` exposes all
    pub server_scope_id: Option<String>,
}

impl DriverConfig {
    pub fn new(server_scope_id: Option<String>) -> Self {
        Self {
            server_scope_id: normalize_scope(server_scope_id.as_deref()).map(str::to_string),
        }
    }

    /// Scope for one call
    ///
    /// The request's own scope wins over the call argument, which wins over
    /// the configured scope. A winning value of `-1` or blank lifts scoping.
    pub fn effective_scope(&self, scope: Option<&str>, spec_scope: Option<&str>) -> Option<String> {
        let chosen = spec_scope
            .or(scope)
            .or(self.server_scope_id.as_deref());
        normalize_scope(chosen).map(str::to_string)
    }
}

fn normalize_scope(scope: Option<&str>) -> Option<&str> {
    scope
        .map(str::trim)
        .filter(|scope| !scope.is_empty() && *scope != UNSCOPED)
}

/// Collaborators handed to every driver
#[derive(Clone)]
pub struct DriverContext {
    pub db: Database,
    pub identity: Arc<dyn IdentityResolver>,
    pub links: Arc<ProfileLinks>,
    pub config: DriverConfig,
}

/// Uniform listing contract over one punishment database
#[async_trait]
pub trait ListingDriver: Send + Sync {
    /// Stable backend identifier
    fn name(&self) -> &'static str;

    fn ban_columns(&self) -> ColumnSchema;

    fn comms_columns(&self) -> ColumnSchema;

    fn columns(&self, listing: Listing) -> ColumnSchema {
        match listing {
            Listing::Bans => self.ban_columns(),
            Listing::Comms => self.comms_columns(),
        }
    }

    /// One page of a listing
    ///
    /// Backend errors propagate; only missing player identities produce an
    /// empty page.
    async fn list(
        &self,
        listing: Listing,
        scope: Option<&str>,
        spec: &QuerySpec,
    ) -> Result<QueryResult>;

    async fn list_bans(&self, scope: Option<&str>, spec: &QuerySpec) -> Result<QueryResult> {
        self.list(Listing::Bans, scope, spec).await
    }

    async fn list_comms(&self, scope: Option<&str>, spec: &QuerySpec) -> Result<QueryResult> {
        self.list(Listing::Comms, scope, spec).await
    }

    async fn list_user_bans(
        &self,
        player: &Player,
        scope: Option<&str>,
        spec: &QuerySpec,
    ) -> Result<QueryResult> {
        self.list_for_player(Listing::Bans, player, scope, spec).await
    }

    async fn list_user_comms(
        &self,
        player: &Player,
        scope: Option<&str>,
        spec: &QuerySpec,
    ) -> Result<QueryResult> {
        self.list_for_player(Listing::Comms, player, scope, spec).await
    }

    /// Listing restricted to one player; empty when the player has no Steam id
    async fn list_for_player(
        &self,
        listing: Listing,
        player: &Player,
        scope: Option<&str>,
        spec: &QuerySpec,
    ) -> Result<QueryResult> {
        let Some(steam_id) = player.steam_id else {
            return Ok(QueryResult::empty(spec.draw));
        };
        let mut spec = spec.clone();
        spec.subject = Some(steam_id);
        self.list(listing, scope, &spec).await
    }

    /// Totals for this backend
    ///
    /// Administrators already in `exclude_admins` are not counted again;
    /// newly seen ones are added to it. Failures are logged and yield zeros.
    async fn get_counts(
        &self,
        scope: Option<&str>,
        exclude_admins: &mut HashSet<String>,
        include_all_servers: bool,
    ) -> CountsSummary;
}

/// Instantiate the driver for a configured backend kind
pub fn build_driver(kind: DriverKind, ctx: DriverContext) -> Arc<dyn ListingDriver> {
    match kind {
        DriverKind::FreshBans => Arc::new(FreshBansDriver::new(ctx)),
        DriverKind::Iks => Arc::new(IksDriver::new(ctx)),
        DriverKind::Pisex => Arc::new(PisexDriver::new(ctx)),
        DriverKind::Zenith => Arc::new(ZenithDriver::new(ctx)),
    }
}
