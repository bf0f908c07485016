//! Shared types and result types for the database layer

pub mod errors;

pub use errors::{DatabaseError, UniqueColumn};

pub type DatabaseResult<T> = Result<T, DatabaseError>;

use chrono::{DateTime, SecondsFormat, Utc};

/// Render a timestamp in the fixed-width form stored in every table.
///
/// All rows share one width and the `Z` suffix, so lexical comparison in SQL
/// orders the same way as the instants themselves.
pub fn db_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_db_timestamp(value: &str) -> DatabaseResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| DatabaseError::CorruptRow(format!("invalid timestamp {value}")))
}
