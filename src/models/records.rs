//! Empire platform records and their table registrations.

use crate::db::TableMap;
use crate::error::DbResult;
use crate::impl_record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use std::collections::BTreeMap;

/// Name/value pairs stored as one JSON column.
pub type StringMap = Json<BTreeMap<String, String>>;

/// An application. Its `id` is chosen by the caller, so inserts leave it
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct App {
    pub id: String,
    /// Source repository, when the app was created from one.
    pub repo: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl_record!(App {
    id,
    repo,
    created_at
});

/// A snapshot of an app's environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub id: i64,
    pub app_id: String,
    pub vars: StringMap,
    pub created_at: DateTime<Utc>,
}

impl_record!(Config {
    id,
    app_id,
    vars,
    created_at
});

/// A built image together with the commands for each process type it can run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slug {
    pub id: i64,
    pub image: String,
    pub process_types: StringMap,
}

impl_record!(Slug {
    id,
    image,
    process_types
});

/// The desired scale of one process type within a release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub id: i64,
    pub release_id: i64,
    pub process_type: String,
    pub quantity: i64,
    pub command: String,
}

impl_record!(Process {
    id,
    release_id,
    process_type,
    quantity,
    command
});

/// A numbered pairing of a config and a slug for an app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: i64,
    pub app_id: String,
    pub config_id: i64,
    pub slug_id: i64,
    pub version: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl_record!(Release {
    id,
    app_id,
    config_id,
    slug_id,
    version,
    description,
    created_at
});

/// One scheduled instance of a process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub app_id: String,
    pub release_version: i64,
    pub process_type: String,
    pub instance: i64,
    pub environment: StringMap,
    pub image: String,
    pub command: String,
    pub updated_at: DateTime<Utc>,
}

impl_record!(Job {
    id,
    app_id,
    release_version,
    process_type,
    instance,
    environment,
    image,
    command,
    updated_at
});

/// The registry every [`Database::open`](crate::db::Database::open) handle
/// starts with.
pub fn table_map() -> DbResult<TableMap> {
    let mut tables = TableMap::new();
    tables.add_table_with_name::<App>("apps")?;
    tables
        .add_table_with_name::<Config>("configs")?
        .set_keys(true, "id")?;
    tables
        .add_table_with_name::<Slug>("slugs")?
        .set_keys(true, "id")?;
    tables
        .add_table_with_name::<Process>("processes")?
        .set_keys(true, "id")?;
    tables
        .add_table_with_name::<Release>("releases")?
        .set_keys(true, "id")?;
    tables
        .add_table_with_name::<Job>("jobs")?
        .set_keys(true, "id")?;
    Ok(tables)
}
