//! Statement execution.
//!
//! Every statement runs on a borrowed [`DbConn`], so the same code serves
//! pooled connections and open transactions. Results come back as neutral
//! [`Row`]s.
//!
//! # Architecture
//!
//! The executor uses database-specific implementations organized in submodules:
//! - `postgres`: PostgreSQL-specific statement execution
//! - `sqlite`: SQLite-specific statement execution
//!
//! Each submodule provides identical functionality adapted to the database's type system.

use crate::db::pool::DbConn;
use crate::db::types::{IntoRow, Row, Value};
use crate::error::{DbError, DbResult};
use crate::impl_db_dispatch;
use futures_util::TryStreamExt;
use tracing::debug;

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Rowid of the last inserted row. Only SQLite reports one.
    pub last_insert_id: Option<i64>,
}

/// Run a query and collect every result row.
pub async fn fetch_all(conn: DbConn<'_>, sql: &str, params: &[Value]) -> DbResult<Vec<Row>> {
    debug!(sql = %sql, params = params.len(), "Executing query");
    impl_db_dispatch!(conn, {
        Postgres(c) => postgres::fetch_all(c, sql, params).await,
        SQLite(c) => sqlite::fetch_all(c, sql, params).await,
    })
}

/// Run a query and return its first row, if any. Remaining rows are not read.
pub async fn fetch_first(conn: DbConn<'_>, sql: &str, params: &[Value]) -> DbResult<Option<Row>> {
    debug!(sql = %sql, params = params.len(), "Executing query for first row");
    impl_db_dispatch!(conn, {
        Postgres(c) => postgres::fetch_first(c, sql, params).await,
        SQLite(c) => sqlite::fetch_first(c, sql, params).await,
    })
}

/// Run a statement that returns no rows.
pub async fn execute(conn: DbConn<'_>, sql: &str, params: &[Value]) -> DbResult<ExecResult> {
    debug!(sql = %sql, params = params.len(), "Executing statement");
    impl_db_dispatch!(conn, {
        Postgres(c) => postgres::execute(c, sql, params).await,
        SQLite(c) => sqlite::execute(c, sql, params).await,
    })
}

/// Run an insert ending in `returning <key>` and read the generated key.
pub async fn insert_returning(conn: DbConn<'_>, sql: &str, params: &[Value]) -> DbResult<i64> {
    debug!(sql = %sql, params = params.len(), "Executing insert");
    impl_db_dispatch!(conn, {
        Postgres(c) => postgres::insert_returning(c, sql, params).await,
        SQLite(c) => sqlite::insert_returning(c, sql, params).await,
    })
}

fn missing_key_error(sql: &str) -> DbError {
    DbError::binding(format!("insert returned no generated key: {sql}"), None)
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================
//
// Each module below provides the same interface adapted to its database type.

mod postgres {
    use super::*;
    use crate::db::params::bind_postgres_param;
    use sqlx::{PgConnection, Row as _};

    pub async fn fetch_all(
        conn: &mut PgConnection,
        sql: &str,
        params: &[Value],
    ) -> DbResult<Vec<Row>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_postgres_param(query, param);
        }
        let rows = query.fetch_all(conn).await?;
        rows.iter().map(IntoRow::into_row).collect()
    }

    pub async fn fetch_first(
        conn: &mut PgConnection,
        sql: &str,
        params: &[Value],
    ) -> DbResult<Option<Row>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_postgres_param(query, param);
        }
        let mut stream = query.fetch(conn);
        match stream.try_next().await? {
            Some(row) => Ok(Some(row.into_row()?)),
            None => Ok(None),
        }
    }

    pub async fn execute(
        conn: &mut PgConnection,
        sql: &str,
        params: &[Value],
    ) -> DbResult<ExecResult> {
        let result = if params.is_empty() {
            use sqlx::Executor;
            conn.execute(sql).await?
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_postgres_param(query, param);
            }
            query.execute(conn).await?
        };
        Ok(ExecResult {
            rows_affected: result.rows_affected(),
            last_insert_id: None,
        })
    }

    pub async fn insert_returning(
        conn: &mut PgConnection,
        sql: &str,
        params: &[Value],
    ) -> DbResult<i64> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_postgres_param(query, param);
        }
        let row = query
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| missing_key_error(sql))?;
        // serial columns come back as INT4, bigserial as INT8
        match row.try_get::<i64, _>(0) {
            Ok(id) => Ok(id),
            Err(_) => Ok(i64::from(row.try_get::<i32, _>(0)?)),
        }
    }
}

mod sqlite {
    use super::*;
    use crate::db::params::bind_sqlite_param;
    use sqlx::{Row as _, SqliteConnection};

    pub async fn fetch_all(
        conn: &mut SqliteConnection,
        sql: &str,
        params: &[Value],
    ) -> DbResult<Vec<Row>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_sqlite_param(query, param);
        }
        let rows = query.fetch_all(conn).await?;
        rows.iter().map(IntoRow::into_row).collect()
    }

    pub async fn fetch_first(
        conn: &mut SqliteConnection,
        sql: &str,
        params: &[Value],
    ) -> DbResult<Option<Row>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_sqlite_param(query, param);
        }
        let mut stream = query.fetch(conn);
        match stream.try_next().await? {
            Some(row) => Ok(Some(row.into_row()?)),
            None => Ok(None),
        }
    }

    pub async fn execute(
        conn: &mut SqliteConnection,
        sql: &str,
        params: &[Value],
    ) -> DbResult<ExecResult> {
        let result = if params.is_empty() {
            use sqlx::Executor;
            conn.execute(sql).await?
        } else {
            let mut query = sqlx::query(sql);
            for param in params {
                query = bind_sqlite_param(query, param);
            }
            query.execute(conn).await?
        };
        Ok(ExecResult {
            rows_affected: result.rows_affected(),
            last_insert_id: Some(result.last_insert_rowid()),
        })
    }

    pub async fn insert_returning(
        conn: &mut SqliteConnection,
        sql: &str,
        params: &[Value],
    ) -> DbResult<i64> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_sqlite_param(query, param);
        }
        let row = query
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| missing_key_error(sql))?;
        Ok(row.try_get::<i64, _>(0)?)
    }
}
