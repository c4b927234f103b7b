//! Listing and counts endpoints

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::dto::QuerySpecRequest;
use crate::AppState;
use crate::data::{Listing, Player, QueryResult};
use crate::error::AppError;
use crate::identity::SteamId;
use crate::service::{AggregateCounts, BackendInfo, aggregate_counts};
use crate::table::ColumnSchema;

/// Optional server override on listing calls
#[derive(Debug, Default, Deserialize)]
pub struct ScopeParams {
    pub server: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CountsParams {
    #[serde(default)]
    pub all_servers: bool,
}

#[derive(Debug, Serialize)]
pub struct BackendList {
    pub backends: Vec<BackendInfo>,
}

pub fn listing_router() -> Router<AppState> {
    Router::new()
        .route("/backends", get(list_backends))
        .route("/backends/:backend/bans/columns", get(ban_columns))
        .route("/backends/:backend/comms/columns", get(comms_columns))
        .route("/backends/:backend/bans", post(list_bans))
        .route("/backends/:backend/comms", post(list_comms))
        .route(
            "/backends/:backend/players/:steam_id/bans",
            post(list_player_bans),
        )
        .route(
            "/backends/:backend/players/:steam_id/comms",
            post(list_player_comms),
        )
        .route("/counts", get(counts))
}

async fn list_backends(State(state): State<AppState>) -> Json<BackendList> {
    Json(BackendList {
        backends: state.backends.iter().map(|backend| backend.info()).collect(),
    })
}

async fn ban_columns(
    State(state): State<AppState>,
    Path(backend): Path<String>,
) -> Result<Json<ColumnSchema>, AppError> {
    columns(&state, &backend, Listing::Bans)
}

async fn comms_columns(
    State(state): State<AppState>,
    Path(backend): Path<String>,
) -> Result<Json<ColumnSchema>, AppError> {
    columns(&state, &backend, Listing::Comms)
}

fn columns(state: &AppState, backend: &str, listing: Listing) -> Result<Json<ColumnSchema>, AppError> {
    let backend = state.backends.get(backend)?;
    Ok(Json(backend.driver.columns(listing)))
}

async fn list_bans(
    State(state): State<AppState>,
    Path(backend): Path<String>,
    Query(scope): Query<ScopeParams>,
    Json(request): Json<QuerySpecRequest>,
) -> Result<Json<QueryResult>, AppError> {
    let backend = state.backends.get(&backend)?;
    let spec = request.into_spec(&state.config.listing);
    let result = backend
        .driver
        .list_bans(scope.server.as_deref(), &spec)
        .await?;
    Ok(Json(result))
}

async fn list_comms(
    State(state): State<AppState>,
    Path(backend): Path<String>,
    Query(scope): Query<ScopeParams>,
    Json(request): Json<QuerySpecRequest>,
) -> Result<Json<QueryResult>, AppError> {
    let backend = state.backends.get(&backend)?;
    let spec = request.into_spec(&state.config.listing);
    let result = backend
        .driver
        .list_comms(scope.server.as_deref(), &spec)
        .await?;
    Ok(Json(result))
}

async fn list_player_bans(
    State(state): State<AppState>,
    Path((backend, steam_id)): Path<(String, String)>,
    Query(scope): Query<ScopeParams>,
    Json(request): Json<QuerySpecRequest>,
) -> Result<Json<QueryResult>, AppError> {
    let backend = state.backends.get(&backend)?;
    let player = player(&steam_id);
    let spec = request.into_spec(&state.config.listing);
    let result = backend
        .driver
        .list_user_bans(&player, scope.server.as_deref(), &spec)
        .await?;
    Ok(Json(result))
}

async fn list_player_comms(
    State(state): State<AppState>,
    Path((backend, steam_id)): Path<(String, String)>,
    Query(scope): Query<ScopeParams>,
    Json(request): Json<QuerySpecRequest>,
) -> Result<Json<QueryResult>, AppError> {
    let backend = state.backends.get(&backend)?;
    let player = player(&steam_id);
    let spec = request.into_spec(&state.config.listing);
    let result = backend
        .driver
        .list_user_comms(&player, scope.server.as_deref(), &spec)
        .await?;
    Ok(Json(result))
}

/// An unparsable id means the player has no linked identity
fn player(raw: &str) -> Player {
    Player::new(SteamId::parse(raw))
}

async fn counts(
    State(state): State<AppState>,
    Query(params): Query<CountsParams>,
) -> Json<AggregateCounts> {
    Json(aggregate_counts(&state.backends, params.all_servers).await)
}
