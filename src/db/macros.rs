//! Declarative macros for reducing code duplication.
//!
//! `impl_record!` generates the [`Record`](crate::db::Record) implementation
//! for a plain struct from its field list, and `impl_db_dispatch!` generates
//! the per-backend match arms over a borrowed connection.

/// Implement [`Record`](crate::db::Record) for a struct whose fields map
/// one-to-one onto columns of the same name.
///
/// Every field must be listed, in column order; the generated `from_row`
/// builds the struct literally, so a missing field fails to compile.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq)]
/// pub struct Slug {
///     pub id: i64,
///     pub image: String,
/// }
///
/// impl_record!(Slug { id, image });
/// ```
#[macro_export]
macro_rules! impl_record {
    ($ty:ident { $($field:ident),+ $(,)? }) => {
        impl $crate::db::Record for $ty {
            fn columns() -> &'static [&'static str] {
                &[$(stringify!($field)),+]
            }

            fn from_row(row: &$crate::db::Row) -> $crate::error::DbResult<Self> {
                Ok(Self {
                    $($field: row.get(stringify!($field))?,)+
                })
            }

            fn values(&self) -> $crate::error::DbResult<Vec<$crate::db::Value>> {
                Ok(vec![$($crate::db::ToValue::to_value(&self.$field)?),+])
            }

            fn set_value(
                &mut self,
                column: &str,
                value: $crate::db::Value,
            ) -> $crate::error::DbResult<()> {
                match column {
                    $(
                        stringify!($field) => {
                            self.$field = $crate::db::FromValue::from_value(value).map_err(|e| {
                                $crate::error::DbError::binding(
                                    format!("column '{}': {}", column, e),
                                    Some(column),
                                )
                            })?;
                        }
                    )+
                    _ => {
                        return Err($crate::error::DbError::binding(
                            format!("{} has no column '{}'", stringify!($ty), column),
                            Some(column),
                        ));
                    }
                }
                Ok(())
            }
        }
    };
}

/// Macro for generating database dispatch match arms over a [`DbConn`].
///
/// # Example
///
/// ```ignore
/// impl_db_dispatch!(conn, {
///     Postgres(c) => postgres::fetch_all(c, sql, params).await,
///     SQLite(c) => sqlite::fetch_all(c, sql, params).await,
/// });
/// ```
///
/// [`DbConn`]: crate::db::pool::DbConn
#[macro_export]
macro_rules! impl_db_dispatch {
    ($conn:expr, { $($variant:ident($c:ident) => $body:expr),+ $(,)? }) => {
        match $conn {
            $(
                $crate::db::pool::DbConn::$variant($c) => $body,
            )+
        }
    };
}

pub use impl_db_dispatch;
pub use impl_record;
