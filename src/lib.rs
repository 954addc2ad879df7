//! agrikb - Agricultural knowledge base
//!
//! Knowledge articles, FAQs and practices with categories, kept in SQLite
//! or in a hosted PostgREST data service.
//!
//! # Key Concepts
//!
//! - **Soft delete**: items are retired with `is_active = false`, never removed
//! - **Combined search**: one query runs over all three collections at once
//!   and reports failed parts instead of hiding them
//! - **Injected store**: `KnowledgeService` wraps any `KnowledgeStore`

pub mod cli;
pub mod config;
pub mod core;
pub mod remote;

pub use core::collection::Collection;
pub use core::error::{QueryFailure, StoreError, StoreResult};
pub use core::service::{Analytics, DeleteOutcome, KnowledgeService, SearchResults, ServiceSettings};
pub use core::storage::Storage;
pub use core::store::{open_store, KnowledgeStore, LocalStore, RemoteStore};
pub use remote::DataApiClient;
