//! Data models for the Empire store.
//!
//! This module re-exports the record types and backend detection used
//! throughout the crate.

pub mod connection;
pub mod records;

// Re-export commonly used types
pub use connection::DatabaseType;
pub use records::{App, Config, Job, Process, Release, Slug, StringMap, table_map};
