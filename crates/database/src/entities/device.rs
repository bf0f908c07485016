//! Device binding entity definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A physical unit bound to exactly one owning identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceBinding {
    pub device_id: String,
    pub owner_id: i64,
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UpsertDeviceRequest {
    pub device_id: String,
    pub owner_id: i64,
    pub label: Option<String>,
}
