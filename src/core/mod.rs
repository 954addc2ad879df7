//! Core module - Business logic
//!
//! Entities, the SQLite store, the async store trait and the service facade
//! the CLI talks to.

pub mod collection;
pub mod context;
pub mod entity;
pub mod error;
pub mod manager;
pub mod service;
pub mod storage;
pub mod store;
