//! Device binding repository for database operations.

use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::entities::{DeviceBinding, UpsertDeviceRequest};
use crate::types::{db_timestamp, parse_db_timestamp, DatabaseResult};

#[derive(Clone)]
pub struct DeviceRepository {
    pool: SqlitePool,
}

impl DeviceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Bind a device to an owner. A device id seen before is rebound to the
    /// new owner with the new label; there is never more than one row per
    /// device id.
    pub async fn upsert(&self, request: &UpsertDeviceRequest) -> DatabaseResult<DeviceBinding> {
        let now = db_timestamp(Utc::now());

        let row = sqlx::query(
            r#"
            INSERT INTO devices (device_id, owner_id, label, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(device_id) DO UPDATE SET
                owner_id = excluded.owner_id,
                label = excluded.label,
                updated_at = excluded.updated_at
            RETURNING device_id, owner_id, label, created_at, updated_at
            "#,
        )
        .bind(&request.device_id)
        .bind(request.owner_id)
        .bind(&request.label)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        map_device(&row)
    }
}

fn map_device(row: &SqliteRow) -> DatabaseResult<DeviceBinding> {
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(DeviceBinding {
        device_id: row.try_get("device_id")?,
        owner_id: row.try_get("owner_id")?,
        label: row.try_get("label")?,
        created_at: parse_db_timestamp(&created_at)?,
        updated_at: parse_db_timestamp(&updated_at)?,
    })
}
