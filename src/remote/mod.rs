//! Remote data API module
//!
//! HTTP client for the hosted relational data service (PostgREST dialect).

mod client;
pub mod query;
mod types;

pub use client::DataApiClient;
pub use query::Query;
pub use types::*;
