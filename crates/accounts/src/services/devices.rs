use std::sync::Arc;

use homelink_database::{DeviceBinding, DeviceRepository, SqlitePool, UpsertDeviceRequest};
use tracing::info;

use crate::error::{AccountResult, UnexpectedExt};
use crate::repository::DeviceRepo;
use crate::types::BindDeviceRequest;
use crate::validation;

/// Binds physical units to identities. Binding an already known device id
/// moves it to the new owner and label.
#[derive(Clone)]
pub struct DeviceBindingService {
    devices: Arc<dyn DeviceRepo>,
}

impl DeviceBindingService {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_repository(Arc::new(DeviceRepository::new(pool)))
    }

    pub fn with_repository(devices: Arc<dyn DeviceRepo>) -> Self {
        Self { devices }
    }

    pub async fn bind(&self, owner_id: i64, request: BindDeviceRequest) -> AccountResult<DeviceBinding> {
        validation::validate_device_id(&request.device_id)?;
        validation::validate_device_label(request.label.as_deref())?;

        let binding = self
            .devices
            .upsert(&UpsertDeviceRequest {
                device_id: request.device_id,
                owner_id,
                label: request.label,
            })
            .await
            .or_unexpected("binding device")?;

        info!(device_id = %binding.device_id, owner_id, "device bound");
        Ok(binding)
    }
}
