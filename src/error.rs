//! Error types for the Empire store.
//!
//! Every failure coming back from the driver is classified into one of the
//! variants below so callers can tell a missing row apart from a broken
//! connection or a record that does not fit its table.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("No table mapping registered for {type_name}")]
    Mapping { type_name: String },

    #[error("Binding error: {message}")]
    Binding {
        message: String,
        /// Column involved, when known
        column: Option<String>,
    },

    #[error("No rows found in {table}")]
    NotFound { table: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        /// e.g., "23505" for unique violation
        sql_state: Option<String>,
        suggestion: String,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl DbError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a mapping error for an unregistered record type.
    pub fn mapping(type_name: impl Into<String>) -> Self {
        Self::Mapping {
            type_name: type_name.into(),
        }
    }

    /// Create a binding error, optionally tied to a column.
    pub fn binding(message: impl Into<String>, column: Option<&str>) -> Self {
        Self::Binding {
            message: message.into(),
            column: column.map(String::from),
        }
    }

    pub fn not_found(table: impl Into<String>) -> Self {
        Self::NotFound {
            table: table.into(),
        }
    }

    /// Create a database error with optional SQL state.
    pub fn database(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// The error raised by every operation on a closed handle.
    pub fn closed() -> Self {
        Self::connection("Database is closed", "Open a new database handle")
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Database { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// True when a lookup matched no rows. Absence is a normal outcome for
    /// most callers, unlike the other variants.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check the connection string format and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::database(
                    db_err.message(),
                    code,
                    "Check the SQL syntax, constraints and referenced objects",
                )
            }
            sqlx::Error::RowNotFound => DbError::not_found("query result"),
            sqlx::Error::PoolTimedOut => DbError::connection(
                "Timed out acquiring a connection from the pool",
                "Increase acquire_timeout or max_connections",
            ),
            sqlx::Error::PoolClosed => DbError::closed(),
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::TypeNotFound { type_name } => DbError::binding(
                format!("Type not found: {}", type_name),
                None,
            ),
            sqlx::Error::ColumnNotFound(col) => {
                DbError::binding(format!("Column not found: {}", col), Some(col.as_str()))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => DbError::binding(
                format!("Column index {} out of bounds (len: {})", index, len),
                None,
            ),
            sqlx::Error::ColumnDecode { index, source } => DbError::binding(
                format!("Failed to decode column {}: {}", index, source),
                Some(index.as_str()),
            ),
            sqlx::Error::Decode(source) => {
                DbError::binding(format!("Decode error: {}", source), None)
            }
            sqlx::Error::AnyDriverError(err) => DbError::connection(
                format!("Driver error: {}", err),
                "Check database driver configuration",
            ),
            sqlx::Error::WorkerCrashed => DbError::connection(
                "Database worker crashed",
                "Reopen the database handle",
            ),
            _ => DbError::database(
                format!("Unknown database error: {}", err),
                None,
                "Inspect the driver error for details",
            ),
        }
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::binding(format!("JSON conversion failed: {}", err), None)
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;
