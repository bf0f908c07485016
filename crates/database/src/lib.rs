//! Homelink Database Crate
//!
//! Connection management, migrations and the SQLite repositories for
//! identities, device bindings and subscription windows.

use homelink_config::DatabaseConfig;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::prepare_database;
pub use migrations::run_migrations;

pub use repos::{DeviceRepository, IdentityRepository, SubscriptionRepository};

pub use entities::{
    DeviceBinding, Gender, Identity, NewIdentity, Provider, Renewal, SubscriptionWindow,
    UpsertDeviceRequest,
};

pub use types::{db_timestamp, DatabaseError, DatabaseResult, UniqueColumn};

pub use sqlx::SqlitePool;

/// Initialize the database with migrations
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(format!("{e:#}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("{e:#}")))?;

    Ok(pool)
}
