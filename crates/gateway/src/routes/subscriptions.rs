use axum::{extract::State, http::HeaderMap};
use chrono::{DateTime, Utc};
use homelink_accounts::SubscriptionState;
use homelink_database::SubscriptionWindow;
use serde::Serialize;
use utoipa::ToSchema;

use crate::routes::ApiResponse;
use crate::{ApiError, GatewayState};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub subscribe_state: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl From<SubscriptionState> for SubscriptionResponse {
    fn from(state: SubscriptionState) -> Self {
        Self {
            subscribe_state: state.subscribe_state,
            start_date: state.start_date,
            end_date: state.end_date,
        }
    }
}

impl From<SubscriptionWindow> for SubscriptionResponse {
    fn from(window: SubscriptionWindow) -> Self {
        Self {
            subscribe_state: true,
            start_date: Some(window.start_date),
            end_date: Some(window.end_date),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/subscriptions",
    tag = "Subscriptions",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Current entitlement window, if any", body = SubscriptionResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_subscription(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> Result<ApiResponse<SubscriptionResponse>, ApiError> {
    let identity_id = state.authenticate(&headers)?;
    let current = state.subscriptions().state(identity_id).await?;
    Ok(ApiResponse::ok(current.into()))
}

/// Adds one calendar month to the active window, or opens one starting now.
#[utoipa::path(
    post,
    path = "/api/subscriptions",
    tag = "Subscriptions",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Window after the extension", body = SubscriptionResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 500, description = "Unexpected server error", body = crate::error::ErrorResponse)
    )
)]
pub async fn subscribe(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> Result<ApiResponse<SubscriptionResponse>, ApiError> {
    let identity_id = state.authenticate(&headers)?;
    let window = state.subscriptions().subscribe(identity_id).await?;
    Ok(ApiResponse::ok(window.into()))
}
