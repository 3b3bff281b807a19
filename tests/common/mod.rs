//! Shared fixtures for the SQLite integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use empire_store::db::{Database, Execer};
use empire_store::models::{App, Config, Job, Process, Release, Slug};
use sqlx::types::Json;
use std::collections::BTreeMap;
use tempfile::NamedTempFile;

const SCHEMA: &[&str] = &[
    "CREATE TABLE apps (id TEXT PRIMARY KEY, repo TEXT, created_at DATETIME NOT NULL)",
    "CREATE TABLE configs (id INTEGER PRIMARY KEY AUTOINCREMENT, app_id TEXT NOT NULL, vars TEXT NOT NULL, created_at DATETIME NOT NULL)",
    "CREATE TABLE slugs (id INTEGER PRIMARY KEY AUTOINCREMENT, image TEXT NOT NULL, process_types TEXT NOT NULL)",
    "CREATE TABLE processes (id INTEGER PRIMARY KEY AUTOINCREMENT, release_id INTEGER NOT NULL, process_type TEXT NOT NULL, quantity INTEGER NOT NULL, command TEXT NOT NULL)",
    "CREATE TABLE releases (id INTEGER PRIMARY KEY AUTOINCREMENT, app_id TEXT NOT NULL, config_id INTEGER NOT NULL, slug_id INTEGER NOT NULL, version INTEGER NOT NULL, description TEXT NOT NULL, created_at DATETIME NOT NULL)",
    "CREATE TABLE jobs (id INTEGER PRIMARY KEY AUTOINCREMENT, app_id TEXT NOT NULL, release_version INTEGER NOT NULL, process_type TEXT NOT NULL, instance INTEGER NOT NULL, environment TEXT NOT NULL, image TEXT NOT NULL, command TEXT NOT NULL, updated_at DATETIME NOT NULL)",
];

/// A store backed by a fresh SQLite file. Keep the file alive for the
/// duration of the test.
pub async fn open_store() -> (NamedTempFile, Database) {
    let temp_file = NamedTempFile::new().unwrap();
    let uri = format!("sqlite:{}", temp_file.path().to_str().unwrap());
    let mut db = Database::open(&uri).await.unwrap();
    for statement in SCHEMA {
        db.exec(statement, &[]).await.unwrap();
    }
    (temp_file, db)
}

pub fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 14, 15, 9, 26).unwrap()
}

pub fn string_map(pairs: &[(&str, &str)]) -> Json<BTreeMap<String, String>> {
    Json(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

pub fn app(id: &str) -> App {
    App {
        id: id.to_string(),
        repo: Some("remind101/acme-inc".to_string()),
        created_at: timestamp(),
    }
}

pub fn config(app_id: &str) -> Config {
    Config {
        id: 0,
        app_id: app_id.to_string(),
        vars: string_map(&[("RAILS_ENV", "production"), ("PORT", "8080")]),
        created_at: timestamp(),
    }
}

pub fn slug() -> Slug {
    Slug {
        id: 0,
        image: "remind101/acme-inc:latest".to_string(),
        process_types: string_map(&[("web", "./bin/web"), ("worker", "./bin/worker")]),
    }
}

pub fn process(release_id: i64) -> Process {
    Process {
        id: 0,
        release_id,
        process_type: "web".to_string(),
        quantity: 2,
        command: "./bin/web".to_string(),
    }
}

pub fn release(app_id: &str, config_id: i64, slug_id: i64) -> Release {
    Release {
        id: 0,
        app_id: app_id.to_string(),
        config_id,
        slug_id,
        version: 1,
        description: "Deploy remind101/acme-inc:latest".to_string(),
        created_at: timestamp(),
    }
}

pub fn job(app_id: &str) -> Job {
    Job {
        id: 0,
        app_id: app_id.to_string(),
        release_version: 1,
        process_type: "web".to_string(),
        instance: 1,
        environment: string_map(&[("PORT", "8080")]),
        image: "remind101/acme-inc:latest".to_string(),
        command: "./bin/web".to_string(),
        updated_at: timestamp(),
    }
}
