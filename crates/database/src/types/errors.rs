//! Error types for the database layer

use thiserror::Error;

/// Column groups guarded by a storage-level uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueColumn {
    LoginId,
    PhoneNumber,
    ProviderSubject,
    PublicId,
    Other,
}

impl UniqueColumn {
    /// Classify the column list reported by SQLite, e.g.
    /// `UNIQUE constraint failed: identities.phone_number`.
    pub fn from_constraint_message(message: &str) -> Self {
        if message.contains("identities.login_id") {
            UniqueColumn::LoginId
        } else if message.contains("identities.phone_number") {
            UniqueColumn::PhoneNumber
        } else if message.contains("identities.provider_subject_id") {
            UniqueColumn::ProviderSubject
        } else if message.contains("identities.public_id") {
            UniqueColumn::PublicId
        } else {
            UniqueColumn::Other
        }
    }
}

/// General database error
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Database query error: {0}")]
    QueryError(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    MigrationError(String),

    #[error("Unique constraint violated on {column:?}")]
    UniqueViolation { column: UniqueColumn },

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    #[error("Database busy: {0}")]
    Busy(String),

    #[error("Date out of range: {0}")]
    OutOfRange(String),
}

impl DatabaseError {
    /// Translate a write failure, lifting UNIQUE violations out of the
    /// generic query error so callers can map them to business reasons.
    /// Lock timeouts become `Busy`, the only failure worth retrying.
    pub fn from_write(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation()
                    || db_err.message().contains("UNIQUE constraint failed")
                {
                    return DatabaseError::UniqueViolation {
                        column: UniqueColumn::from_constraint_message(db_err.message()),
                    };
                }
                // SQLITE_BUSY and its extended codes
                if matches!(db_err.code().as_deref(), Some("5" | "261" | "517"))
                    || db_err.message().contains("database is locked")
                {
                    return DatabaseError::Busy(db_err.message().to_string());
                }
            }
            sqlx::Error::PoolTimedOut => return DatabaseError::Busy(err.to_string()),
            _ => {}
        }
        DatabaseError::QueryError(err)
    }
}
