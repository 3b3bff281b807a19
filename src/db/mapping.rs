//! Record types and the table registry.
//!
//! A [`Record`] knows its own columns and how to move between itself and a
//! [`Row`]. Which table it lives in, and whether the store generates its key,
//! is decided once when the record type is registered in a [`TableMap`].
//! The registry belongs to a single [`Database`](crate::db::Database) and is
//! shared read-only with its transactions.

use crate::db::types::{Row, Value};
use crate::error::{DbError, DbResult};
use std::any::TypeId;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// A plain data type persisted as one table row.
///
/// Implementations are normally generated with [`impl_record!`](crate::impl_record).
/// The object-safe half (`values`, `set_value`) lets heterogeneous records
/// be inserted in one call.
pub trait Record: Send + 'static {
    /// Column names, in field order.
    fn columns() -> &'static [&'static str]
    where
        Self: Sized;

    /// Build the record from a result row.
    fn from_row(row: &Row) -> DbResult<Self>
    where
        Self: Sized;

    /// Field values, in [`Record::columns`] order.
    fn values(&self) -> DbResult<Vec<Value>>;

    /// Overwrite a single field; used to write generated keys back.
    fn set_value(&mut self, column: &str, value: Value) -> DbResult<()>;

    fn record_type_id(&self) -> TypeId {
        TypeId::of::<Self>()
    }

    fn record_type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Key column declaration for a mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyColumn {
    pub column: String,
    /// The store generates the value on insert.
    pub auto_increment: bool,
}

/// Association between a record type and its table.
#[derive(Debug, Clone)]
pub struct TableMapping {
    table: String,
    type_name: &'static str,
    columns: &'static [&'static str],
    key: Option<KeyColumn>,
}

impl TableMapping {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn columns(&self) -> &'static [&'static str] {
        self.columns
    }

    pub fn key(&self) -> Option<&KeyColumn> {
        self.key.as_ref()
    }

    /// Declare the key column. With `auto_increment` the column is left out of
    /// inserts and the generated value is written back into the record.
    pub fn set_keys(&mut self, auto_increment: bool, column: &str) -> DbResult<&mut Self> {
        if !self.columns.contains(&column) {
            return Err(DbError::invalid_input(format!(
                "{} has no column '{}' to use as key of table '{}'",
                self.type_name, column, self.table
            )));
        }
        self.key = Some(KeyColumn {
            column: column.to_string(),
            auto_increment,
        });
        Ok(self)
    }

    /// The generated key column, if the store assigns one.
    pub fn auto_key(&self) -> Option<&str> {
        self.key
            .as_ref()
            .filter(|k| k.auto_increment)
            .map(|k| k.column.as_str())
    }

    /// Column indices written on insert (everything but a generated key).
    fn insert_indices(&self) -> Vec<usize> {
        let auto_key = self.auto_key();
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| Some(**c) != auto_key)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Build the insert statement and its arguments for one record.
    ///
    /// Auto-key mappings end with `returning <key>` so the generated value can
    /// be read back. Both supported backends accept `$n` placeholders.
    pub fn insert_statement(&self, values: Vec<Value>) -> DbResult<(String, Vec<Value>)> {
        if values.len() != self.columns.len() {
            return Err(DbError::binding(
                format!(
                    "{} produced {} values for {} columns",
                    self.type_name,
                    values.len(),
                    self.columns.len()
                ),
                None,
            ));
        }

        let indices = self.insert_indices();
        let mut values: Vec<Option<Value>> = values.into_iter().map(Some).collect();
        let args: Vec<Value> = indices
            .iter()
            .filter_map(|&idx| values[idx].take())
            .collect();

        let mut sql = if indices.is_empty() {
            format!("insert into {} default values", self.table)
        } else {
            let columns: Vec<&str> = indices.iter().map(|&idx| self.columns[idx]).collect();
            let placeholders: Vec<String> = (1..=indices.len()).map(|n| format!("${n}")).collect();
            format!(
                "insert into {} ({}) values ({})",
                self.table,
                columns.join(", "),
                placeholders.join(", ")
            )
        };

        if let Some(key) = self.auto_key() {
            sql.push_str(" returning ");
            sql.push_str(key);
        }

        Ok((sql, args))
    }

    /// Every result column must land in a field of the record.
    pub fn check_row(&self, row: &Row) -> DbResult<()> {
        match row.columns().iter().find(|c| !self.columns.contains(&c.as_str())) {
            Some(extra) => Err(DbError::binding(
                format!(
                    "column '{}' of table '{}' has no field in {}",
                    extra, self.table, self.type_name
                ),
                Some(extra.as_str()),
            )),
            None => Ok(()),
        }
    }
}

/// The set of table mappings owned by one database handle.
#[derive(Debug, Clone, Default)]
pub struct TableMap {
    mappings: HashMap<TypeId, TableMapping>,
    /// Registration order, for listing.
    order: Vec<TypeId>,
}

impl TableMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under `table`. Registering the same type again replaces
    /// its earlier mapping.
    pub fn add_table_with_name<T: Record>(&mut self, table: &str) -> DbResult<&mut TableMapping> {
        validate_identifier(table, "table")?;
        let type_id = TypeId::of::<T>();
        let mapping = TableMapping {
            table: table.to_string(),
            type_name: std::any::type_name::<T>(),
            columns: T::columns(),
            key: None,
        };
        match self.mappings.entry(type_id) {
            Entry::Occupied(mut entry) => {
                entry.insert(mapping);
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                self.order.push(type_id);
                Ok(entry.insert(mapping))
            }
        }
    }

    pub fn get<T: Record>(&self) -> DbResult<&TableMapping> {
        self.get_by_id(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// Mapping for a record behind a trait object.
    pub fn get_for(&self, record: &dyn Record) -> DbResult<&TableMapping> {
        self.get_by_id(record.record_type_id(), record.record_type_name())
    }

    fn get_by_id(&self, type_id: TypeId, type_name: &str) -> DbResult<&TableMapping> {
        self.mappings
            .get(&type_id)
            .ok_or_else(|| DbError::mapping(type_name))
    }

    /// Mappings in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &TableMapping> {
        self.order.iter().filter_map(|id| self.mappings.get(id))
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Accept plain SQL identifiers only: `[A-Za-z_][A-Za-z0-9_]*`, with at most
/// one `schema.` qualifier.
pub fn validate_identifier(name: &str, kind: &str) -> DbResult<()> {
    fn is_plain(part: &str) -> bool {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() <= 2 && parts.iter().all(|p| is_plain(p)) {
        Ok(())
    } else {
        Err(DbError::invalid_input(format!(
            "'{name}' is not a valid {kind} name"
        )))
    }
}
