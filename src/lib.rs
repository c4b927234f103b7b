//! BansComms - uniform listings over third-party punishment databases
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Listing endpoints (bans, comms, per-player)              │
//! │  - Counts aggregation, health, metrics                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Service / Driver Layer                       │
//! │  - Backend registry, cross-backend counts                   │
//! │  - One ListingDriver per database schema                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Data / Identity / Table Layers                  │
//! │  - Portable query builder over sqlx Any pools               │
//! │  - Steam profile resolution with a moka cache               │
//! │  - Column schemas and row normalization                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Backend registry and counts aggregation
//! - `driver`: Per-schema listing drivers
//! - `data`: Database access, query builder, models
//! - `identity`: Steam ids and profile resolution
//! - `table`: Column schemas and row normalization
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod config;
pub mod data;
pub mod driver;
pub mod error;
pub mod identity;
pub mod metrics;
pub mod service;
pub mod table;

use std::sync::Arc;

use identity::{IdentityResolver, NullResolver, ProfileLinks, SteamWebResolver};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::AppConfig>,
    pub backends: Arc<service::Backends>,
}

impl AppState {
    /// Initialize application state
    ///
    /// Uses the Steam Web API when a key is configured; otherwise profiles
    /// are never resolved and every row gets placeholders.
    ///
    /// # Errors
    /// Returns error if a backend cannot be reached or links are invalid
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        let identity: Arc<dyn IdentityResolver> = match config
            .identity
            .steam_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
        {
            Some(key) => Arc::new(SteamWebResolver::new(&config.identity, key.to_string())?),
            None => {
                tracing::warn!("identity.steam_api_key is not set; profiles will not be resolved");
                Arc::new(NullResolver)
            }
        };
        Self::with_identity(config, identity).await
    }

    /// Initialize with an explicit identity resolver
    pub async fn with_identity(
        config: config::AppConfig,
        identity: Arc<dyn IdentityResolver>,
    ) -> Result<Self, error::AppError> {
        tracing::info!(backends = config.backends.len(), "Initializing application state...");

        let links = Arc::new(ProfileLinks::new(&config.links)?);
        let backends = service::Backends::connect(&config, identity, links).await?;

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config: Arc::new(config),
            backends: Arc::new(backends),
        })
    }
}

/// Build the Axum router with all routes.
///
/// Shared by the binary and integration tests.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    let cors_layer = build_cors_layer(&state.config.links);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api", api::listing_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
        .merge(api::metrics_router())
}

/// Restrict cross-origin callers to the public site when it is served over https
fn build_cors_layer(links: &config::LinksConfig) -> tower_http::cors::CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::{Any, CorsLayer};

    let Ok(base) = url::Url::parse(&links.base_url) else {
        return CorsLayer::permissive();
    };
    if base.scheme() != "https" {
        return CorsLayer::permissive();
    }

    let allowed_origin = base.origin().ascii_serialization();
    match HeaderValue::from_str(&allowed_origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin([origin])
            .allow_methods(Any)
            .allow_headers(Any),
        Err(error) => {
            tracing::error!(
                %error,
                origin = %allowed_origin,
                "Failed to parse CORS origin from links.base_url; denying cross-origin requests"
            );
            CorsLayer::new().allow_methods(Any).allow_headers(Any)
        }
    }
}

async fn health_check() -> &'static str {
    "OK"
}
