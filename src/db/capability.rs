//! Capability traits shared by [`Database`](crate::db::Database) and
//! [`Transaction`](crate::db::Transaction), and the [`find_by`] helper.
//!
//! Both handles implement every capability through the same session
//! functions below; they differ only in where the connection comes from.

use crate::db::executor::{self, ExecResult};
use crate::db::mapping::{Record, TableMap, validate_identifier};
use crate::db::pool::AsDbConn;
use crate::db::types::Value;
use crate::error::{DbError, DbResult};

/// Inserts records into their mapped tables.
#[allow(async_fn_in_trait)]
pub trait Inserter {
    /// Insert each record, in order, into the table registered for its type.
    ///
    /// Records with a generated key get it written back. Every record's type
    /// must be registered; if one is not, nothing is inserted. Otherwise the
    /// first failing insert stops the batch.
    async fn insert(&mut self, records: &mut [&mut dyn Record]) -> DbResult<()>;

    async fn insert_one<R: Record>(&mut self, record: &mut R) -> DbResult<()> {
        let mut records: [&mut dyn Record; 1] = [record];
        self.insert(&mut records).await
    }
}

/// Runs statements that return no rows.
#[allow(async_fn_in_trait)]
pub trait Execer {
    async fn exec(&mut self, sql: &str, args: &[Value]) -> DbResult<ExecResult>;
}

/// Runs queries and maps their rows onto records.
#[allow(async_fn_in_trait)]
pub trait Queryer {
    /// Every result row as a `T`, in query order. No rows is an empty `Vec`.
    async fn select<T: Record>(&mut self, sql: &str, args: &[Value]) -> DbResult<Vec<T>>;

    /// The first result row as a `T`; [`DbError::NotFound`] if there is none.
    async fn select_one<T: Record>(&mut self, sql: &str, args: &[Value]) -> DbResult<T>;
}

/// Look up a single `T` whose `field` equals `value`.
///
/// Runs `select * from <table> where <field> = $1 limit 1`. The table and
/// field are spliced into the statement and must be plain identifiers;
/// anything else is rejected with [`DbError::InvalidInput`] before the store
/// is touched.
pub async fn find_by<T: Record, Q: Queryer>(
    db: &mut Q,
    table: &str,
    field: &str,
    value: impl Into<Value>,
) -> DbResult<T> {
    validate_identifier(table, "table")?;
    validate_identifier(field, "field")?;
    let sql = format!("select * from {table} where {field} = $1 limit 1");
    db.select_one(&sql, &[value.into()]).await
}

pub(crate) async fn insert_records<C: AsDbConn>(
    conn: &mut C,
    tables: &TableMap,
    records: &mut [&mut dyn Record],
) -> DbResult<()> {
    // Resolve every mapping up front so an unmapped type writes nothing.
    let mappings = records
        .iter()
        .map(|record| tables.get_for(&**record))
        .collect::<DbResult<Vec<_>>>()?;

    for (record, mapping) in records.iter_mut().zip(mappings) {
        let (sql, args) = mapping.insert_statement(record.values()?)?;
        match mapping.auto_key() {
            Some(key) => {
                let id = executor::insert_returning(conn.as_conn(), &sql, &args).await?;
                record.set_value(key, Value::Int(id))?;
            }
            None => {
                executor::execute(conn.as_conn(), &sql, &args).await?;
            }
        }
    }
    Ok(())
}

pub(crate) async fn select_records<T: Record, C: AsDbConn>(
    conn: &mut C,
    tables: &TableMap,
    sql: &str,
    args: &[Value],
) -> DbResult<Vec<T>> {
    let mapping = tables.get::<T>()?;
    let rows = executor::fetch_all(conn.as_conn(), sql, args).await?;
    rows.iter()
        .map(|row| {
            mapping.check_row(row)?;
            T::from_row(row)
        })
        .collect()
}

pub(crate) async fn select_first<T: Record, C: AsDbConn>(
    conn: &mut C,
    tables: &TableMap,
    sql: &str,
    args: &[Value],
) -> DbResult<T> {
    let mapping = tables.get::<T>()?;
    match executor::fetch_first(conn.as_conn(), sql, args).await? {
        Some(row) => {
            mapping.check_row(&row)?;
            T::from_row(&row)
        }
        None => Err(DbError::not_found(mapping.table())),
    }
}

pub(crate) async fn exec_statement<C: AsDbConn>(
    conn: &mut C,
    sql: &str,
    args: &[Value],
) -> DbResult<ExecResult> {
    executor::execute(conn.as_conn(), sql, args).await
}
