//! HTTP API layer

mod dto;
mod listing;
mod metrics;

pub use dto::{LenientBool, LenientInt, QuerySpecRequest};
pub use listing::listing_router;
pub use metrics::metrics_router;
