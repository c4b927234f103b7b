//! Data layer module
//!
//! Read-only access to third-party punishment databases:
//! - Connection pools and row decoding
//! - SELECT construction with bound parameters
//! - Profile cache (volatile)

mod cache;
mod database;
mod models;
mod query;

pub use cache::ProfileCache;
pub use database::{Database, int, text};
pub use models::*;
pub use query::{Bind, Predicate, SelectQuery, escape_like};
