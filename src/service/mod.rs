//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services own the configured backends and run aggregation sessions
//! across them.

mod backends;
mod stats;

pub use backends::{Backend, BackendInfo, Backends};
pub use stats::{AggregateCounts, BackendCounts, aggregate_counts};
