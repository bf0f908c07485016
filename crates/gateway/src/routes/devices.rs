use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use chrono::{DateTime, Utc};
use homelink_accounts::BindDeviceRequest;
use homelink_database::DeviceBinding;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::routes::ApiResponse;
use crate::{ApiError, GatewayState};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BindDeviceBody {
    /// Hardware identifier printed on the unit.
    pub device_id: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    pub device_id: String,
    pub label: Option<String>,
    pub bound_at: DateTime<Utc>,
}

impl From<DeviceBinding> for DeviceResponse {
    fn from(binding: DeviceBinding) -> Self {
        Self {
            device_id: binding.device_id,
            label: binding.label,
            bound_at: binding.updated_at,
        }
    }
}

/// Binding an already bound device moves it to the caller.
#[utoipa::path(
    post,
    path = "/api/devices",
    tag = "Devices",
    security(("bearerAuth" = [])),
    request_body = BindDeviceBody,
    responses(
        (status = 200, description = "Device bound to the caller", body = DeviceResponse),
        (status = 400, description = "Malformed device id or label", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn bind_device(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    payload: Result<Json<BindDeviceBody>, JsonRejection>,
) -> Result<ApiResponse<DeviceResponse>, ApiError> {
    let owner_id = state.authenticate(&headers)?;
    let Json(body) = payload?;

    let binding = state
        .devices()
        .bind(
            owner_id,
            BindDeviceRequest {
                device_id: body.device_id,
                label: body.label,
            },
        )
        .await?;

    Ok(ApiResponse::ok(binding.into()))
}
