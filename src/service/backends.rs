//! Configured backend registry

use serde::Serialize;
use std::sync::Arc;

use crate::config::{AppConfig, DriverKind};
use crate::data::Database;
use crate::driver::{DriverConfig, DriverContext, ListingDriver, build_driver};
use crate::error::AppError;
use crate::identity::{IdentityResolver, ProfileLinks};

/// One configured backend and the driver serving it
#[derive(Clone)]
pub struct Backend {
    pub name: String,
    pub kind: DriverKind,
    pub driver: Arc<dyn ListingDriver>,
}

/// Public description of a backend
#[derive(Debug, Clone, Serialize)]
pub struct BackendInfo {
    pub name: String,
    pub driver: DriverKind,
    /// Identifier reported by the driver itself
    pub driver_name: &'static str,
}

impl Backend {
    pub fn info(&self) -> BackendInfo {
        BackendInfo {
            name: self.name.clone(),
            driver: self.kind,
            driver_name: self.driver.name(),
        }
    }
}

/// All configured backends, in configuration order
#[derive(Clone, Default)]
pub struct Backends {
    entries: Vec<Backend>,
}

impl Backends {
    /// Connect every configured backend
    ///
    /// # Errors
    /// Returns error if any backend database cannot be reached
    pub async fn connect(
        config: &AppConfig,
        identity: Arc<dyn IdentityResolver>,
        links: Arc<ProfileLinks>,
    ) -> Result<Self, AppError> {
        let mut entries = Vec::with_capacity(config.backends.len());

        for backend in &config.backends {
            let db = Database::connect(
                &backend.name,
                &backend.database_url,
                backend.max_connections,
            )
            .await?;

            let ctx = DriverContext {
                db,
                identity: identity.clone(),
                links: links.clone(),
                config: DriverConfig::new(backend.server_scope_id.clone()),
            };
            let driver = build_driver(backend.driver, ctx);

            tracing::info!(
                backend = %backend.name,
                driver = driver.name(),
                scope = ?backend.server_scope_id,
                "Backend ready"
            );

            entries.push(Backend {
                name: backend.name.clone(),
                kind: backend.driver,
                driver,
            });
        }

        Ok(Self { entries })
    }

    pub fn from_entries(entries: Vec<Backend>) -> Self {
        Self { entries }
    }

    /// Look up a backend by configured name
    pub fn get(&self, name: &str) -> Result<&Backend, AppError> {
        self.entries
            .iter()
            .find(|backend| backend.name == name)
            .ok_or(AppError::NotFound)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Backend> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
