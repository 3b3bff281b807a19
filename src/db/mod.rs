//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Connection pool management
//! - Statement execution
//! - Record mappings and the table registry
//! - Neutral values and rows
//! - Declarative macros for record impls and database dispatch
//! - The database handle, its transactions, and the capability traits they share

pub mod capability;
pub mod database;
pub mod executor;
#[macro_use]
pub mod macros;
pub mod mapping;
pub mod params;
pub mod pool;
pub mod transaction;
pub mod types;

pub use capability::{Execer, Inserter, Queryer, find_by};
pub use database::Database;
pub use executor::ExecResult;
pub use mapping::{KeyColumn, Record, TableMap, TableMapping, validate_identifier};
pub use pool::DbPool;
pub use transaction::Transaction;
pub use types::{FromValue, Row, ToValue, Value};
