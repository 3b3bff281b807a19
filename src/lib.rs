//! Empire Store Library
//!
//! Relational persistence for Empire platform records (apps, configs,
//! slugs, processes, releases, jobs) on PostgreSQL or SQLite.

pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use config::StoreConfig;
pub use db::{Database, Execer, Inserter, Queryer, Transaction, find_by};
pub use error::{DbError, DbResult};
