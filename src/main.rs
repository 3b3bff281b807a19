//! Empire Store - command-line entry point.
//!
//! Looks up Empire records in a PostgreSQL or SQLite database and prints
//! them as JSON.

use clap::Parser;
use empire_store::config::{Command, Config};
use empire_store::db::{Database, Record, Value, find_by};
use empire_store::error::{DbError, DbResult};
use empire_store::models::{App, Config as ConfigRecord, Job, Process, Release, Slug};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    // stdout carries the command output
    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Bind integers as numbers so they compare against integer columns.
fn lookup_value(raw: &str, text: bool) -> Value {
    match raw.parse::<i64>() {
        Ok(n) if !text => Value::Int(n),
        _ => Value::String(raw.to_string()),
    }
}

async fn find_json<T: Record + Serialize>(
    db: &mut Database,
    table: &str,
    field: &str,
    value: Value,
) -> DbResult<String> {
    let record: T = find_by(db, table, field, value).await?;
    Ok(serde_json::to_string_pretty(&record)?)
}

async fn find(db: &mut Database, table: &str, field: &str, value: Value) -> DbResult<String> {
    match table {
        "apps" => find_json::<App>(db, table, field, value).await,
        "configs" => find_json::<ConfigRecord>(db, table, field, value).await,
        "slugs" => find_json::<Slug>(db, table, field, value).await,
        "processes" => find_json::<Process>(db, table, field, value).await,
        "releases" => find_json::<Release>(db, table, field, value).await,
        "jobs" => find_json::<Job>(db, table, field, value).await,
        other => Err(DbError::invalid_input(format!(
            "No record type is mapped to table '{}'",
            other
        ))),
    }
}

async fn run(config: &Config, db: &mut Database) -> DbResult<()> {
    match &config.command {
        Command::Find {
            table,
            field,
            value,
            text,
        } => {
            let json = find(db, table, field, lookup_value(value, *text)).await?;
            println!("{}", json);
        }
        Command::Tables => {
            for mapping in db.tables().iter() {
                let key = match mapping.key() {
                    Some(k) if k.auto_increment => format!("{} (generated)", k.column),
                    Some(k) => k.column.clone(),
                    None => "-".to_string(),
                };
                println!(
                    "{:<10} key={:<16} columns={}",
                    mapping.table(),
                    key,
                    mapping.columns().join(",")
                );
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse();

    // Initialize logging
    init_tracing(&config);

    info!("Starting Empire Store v{}", env!("CARGO_PKG_VERSION"));

    let mut db = match Database::open(&config.database).await {
        Ok(db) => db,
        Err(e) => {
            error!(error = %e, "Failed to open database");
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Hint: {}", suggestion);
            }
            return Err(e.into());
        }
    };

    let result = run(&config, &mut db).await;
    db.close().await?;

    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            Err(e.into())
        }
    }
}
