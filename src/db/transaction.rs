//! Transactions opened from a [`Database`](crate::db::Database).

use crate::db::capability::{
    Execer, Inserter, Queryer, exec_statement, insert_records, select_first, select_records,
};
use crate::db::executor::ExecResult;
use crate::db::mapping::{Record, TableMap};
use crate::db::pool::DbTransaction;
use crate::db::types::Value;
use crate::error::DbResult;
use crate::models::DatabaseType;
use std::sync::Arc;
use tracing::info;

/// A unit of work on a dedicated connection.
///
/// Offers the same capabilities as the database handle it came from.
/// Dropping it without calling [`commit`](Self::commit) rolls it back.
#[derive(Debug)]
pub struct Transaction {
    tx: DbTransaction,
    tables: Arc<TableMap>,
}

impl Transaction {
    pub(crate) fn new(tx: DbTransaction, tables: Arc<TableMap>) -> Self {
        Self { tx, tables }
    }

    pub fn db_type(&self) -> DatabaseType {
        self.tx.db_type()
    }

    pub async fn commit(self) -> DbResult<()> {
        self.tx.commit().await?;
        info!("Transaction committed");
        Ok(())
    }

    pub async fn rollback(self) -> DbResult<()> {
        self.tx.rollback().await?;
        info!("Transaction rolled back");
        Ok(())
    }
}

impl Inserter for Transaction {
    async fn insert(&mut self, records: &mut [&mut dyn Record]) -> DbResult<()> {
        insert_records(&mut self.tx, &self.tables, records).await
    }
}

impl Execer for Transaction {
    async fn exec(&mut self, sql: &str, args: &[Value]) -> DbResult<ExecResult> {
        exec_statement(&mut self.tx, sql, args).await
    }
}

impl Queryer for Transaction {
    async fn select<T: Record>(&mut self, sql: &str, args: &[Value]) -> DbResult<Vec<T>> {
        select_records(&mut self.tx, &self.tables, sql, args).await
    }

    async fn select_one<T: Record>(&mut self, sql: &str, args: &[Value]) -> DbResult<T> {
        select_first(&mut self.tx, &self.tables, sql, args).await
    }
}
