//! Backend database access
//!
//! One `Database` per configured backend. Access is read-only: the
//! tables belong to the third-party tools that write them.

use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row, ValueRef};
use std::time::Instant;

use super::query::SelectQuery;
use crate::error::AppError;

/// Connection pool wrapper for one backend
#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
    backend: String,
}

impl Database {
    /// Connect to a backend database
    ///
    /// # Arguments
    /// * `backend` - Backend name, used as a metrics label
    /// * `url` - sqlx connection URL (`mysql://...` or `sqlite:...`)
    /// * `max_connections` - Pool size
    ///
    /// # Errors
    /// Returns error if the connection cannot be established
    pub async fn connect(
        backend: &str,
        url: &str,
        max_connections: u32,
    ) -> Result<Self, AppError> {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(url)
            .await?;

        tracing::info!(backend, "Backend database connected");

        Ok(Self {
            pool,
            backend: backend.to_string(),
        })
    }

    /// Fetch one page of a listing query
    pub async fn fetch_page(
        &self,
        query: &SelectQuery,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<AnyRow>, AppError> {
        let started = Instant::now();
        let mut builder = query.build_page(limit, offset);
        tracing::debug!(backend = %self.backend, sql = builder.sql(), "Fetching page");

        let rows = builder.build().fetch_all(&self.pool).await;
        crate::metrics::observe_db_query("fetch_page", &self.backend, started.elapsed());
        Ok(rows?)
    }

    /// Fetch every row of a query
    pub async fn fetch_all(&self, query: &SelectQuery) -> Result<Vec<AnyRow>, AppError> {
        let started = Instant::now();
        let mut builder = query.build();
        tracing::debug!(backend = %self.backend, sql = builder.sql(), "Fetching rows");

        let rows = builder.build().fetch_all(&self.pool).await;
        crate::metrics::observe_db_query("fetch_all", &self.backend, started.elapsed());
        Ok(rows?)
    }

    /// Count the rows a query matches
    pub async fn count(&self, query: &SelectQuery) -> Result<u64, AppError> {
        let started = Instant::now();
        let mut builder = query.build_count();
        tracing::debug!(backend = %self.backend, sql = builder.sql(), "Counting rows");

        let row = builder.build().fetch_one(&self.pool).await;
        crate::metrics::observe_db_query("count", &self.backend, started.elapsed());
        let total = int(&row?, "total")?.unwrap_or(0);
        Ok(u64::try_from(total).unwrap_or(0))
    }

    /// Fetch a single text column from every row, skipping NULLs
    pub async fn fetch_texts(
        &self,
        query: &SelectQuery,
        column: &str,
    ) -> Result<Vec<String>, AppError> {
        let rows = self.fetch_all(query).await?;
        let mut values = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(value) = text(row, column)? {
                values.push(value);
            }
        }
        Ok(values)
    }
}

// =========================================================================
// Row access
// =========================================================================
//
// Backends disagree on column types (VARCHAR vs BIGINT steam ids, INT vs
// BIGINT timestamps), and the Any driver only decodes a value into the
// Rust type matching its wire type, and rejects NULL for every type
// including `Option<_>`. These helpers check for NULL first, then try the
// plausible types in turn.

fn is_null(row: &AnyRow, column: &str) -> Result<bool, AppError> {
    Ok(row.try_get_raw(column)?.is_null())
}

/// Read a column as text, accepting integer and float columns
pub fn text(row: &AnyRow, column: &str) -> Result<Option<String>, AppError> {
    if is_null(row, column)? {
        return Ok(None);
    }
    match row.try_get::<Option<String>, _>(column) {
        Ok(value) => return Ok(value),
        Err(sqlx::Error::ColumnNotFound(name)) => {
            return Err(AppError::Database(sqlx::Error::ColumnNotFound(name)));
        }
        Err(_) => {}
    }
    if let Ok(value) = row.try_get::<Option<i64>, _>(column) {
        return Ok(value.map(|v| v.to_string()));
    }
    if let Ok(value) = row.try_get::<Option<i32>, _>(column) {
        return Ok(value.map(|v| v.to_string()));
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(column) {
        return Ok(value.map(|v| v.to_string()));
    }
    Ok(row.try_get::<Option<String>, _>(column)?)
}

/// Read a column as an integer, accepting numeric text
pub fn int(row: &AnyRow, column: &str) -> Result<Option<i64>, AppError> {
    if is_null(row, column)? {
        return Ok(None);
    }
    match row.try_get::<Option<i64>, _>(column) {
        Ok(value) => return Ok(value),
        Err(sqlx::Error::ColumnNotFound(name)) => {
            return Err(AppError::Database(sqlx::Error::ColumnNotFound(name)));
        }
        Err(_) => {}
    }
    if let Ok(value) = row.try_get::<Option<i32>, _>(column) {
        return Ok(value.map(i64::from));
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(column) {
        return Ok(value.map(|v| v as i64));
    }
    match row.try_get::<Option<String>, _>(column)? {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<i64>().map(Some).map_err(|_| {
            AppError::Internal(anyhow::anyhow!(
                "column {column} holds non-numeric value {raw:?}"
            ))
        }),
    }
}
