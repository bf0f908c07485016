use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use homelink_accounts::{AccountError, Rejection};
use serde::Serialize;
use tracing::{debug, error};
use utoipa::ToSchema;

/// Failure body: `{"status": <code>, "message": "..."}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn internal_server_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "unexpected server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            status: self.status.as_u16(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<AccountError> for ApiError {
    fn from(error: AccountError) -> Self {
        match error {
            AccountError::Rejected(rejection) => {
                debug!(reason = %rejection, "request rejected");
                Self::new(rejection_status(&rejection), rejection.to_string())
            }
            AccountError::Unexpected { context, source } => {
                error!(context, error = %source, "responding with server error");
                Self::internal_server_error()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection.body_text(), "malformed request body");
        Self::bad_request(format!("invalid request body: {}", rejection.body_text()))
    }
}

fn rejection_status(rejection: &Rejection) -> StatusCode {
    match rejection {
        Rejection::Validation(_) | Rejection::DeviceTokenMissing => StatusCode::BAD_REQUEST,
        Rejection::PhoneNotVerified
        | Rejection::PhoneAlreadyRegistered { .. }
        | Rejection::LoginIdTaken
        | Rejection::SocialAccountExists => StatusCode::CONFLICT,
        Rejection::ProviderTokenExpired | Rejection::InvalidCredentials => {
            StatusCode::UNAUTHORIZED
        }
        Rejection::IdentityNotFound => StatusCode::NOT_FOUND,
    }
}
