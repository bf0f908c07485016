use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use homelink_accounts::PushMessage;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::routes::ApiResponse;
use crate::{ApiError, GatewayState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct PushBody {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PushSentResponse {
    pub sent: bool,
}

#[utoipa::path(
    post,
    path = "/api/notifications/push",
    tag = "Notifications",
    security(("bearerAuth" = [])),
    request_body = PushBody,
    responses(
        (status = 200, description = "Message handed to the push provider", body = PushSentResponse),
        (status = 400, description = "No device token on file or malformed message", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 500, description = "Push provider failure", body = crate::error::ErrorResponse)
    )
)]
pub async fn push_to_self(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    payload: Result<Json<PushBody>, JsonRejection>,
) -> Result<ApiResponse<PushSentResponse>, ApiError> {
    let identity_id = state.authenticate(&headers)?;
    let Json(message) = payload?;

    state
        .notifications()
        .dispatch(
            identity_id,
            PushMessage {
                title: message.title,
                body: message.body,
            },
        )
        .await?;

    Ok(ApiResponse::ok(PushSentResponse { sent: true }))
}
