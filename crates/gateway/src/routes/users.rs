//! Signup, login and the caller's own profile.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use chrono::{DateTime, Utc};
use homelink_accounts::{LocalSignupRequest, LoginRequest, SessionGrant, SocialSignupRequest};
use homelink_database::Identity;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::routes::ApiResponse;
use crate::{ApiError, GatewayState};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocalSignupBody {
    pub login_id: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
    pub phone_number: String,
    pub display_name: String,
    /// 1 or 2; omitted means unspecified.
    #[serde(default)]
    pub gender: Option<i64>,
    /// Issue a 14 day token instead of the short default.
    #[serde(default)]
    pub auto_login: bool,
    #[serde(default)]
    pub device_token: Option<String>,
}

impl From<LocalSignupBody> for LocalSignupRequest {
    fn from(body: LocalSignupBody) -> Self {
        Self {
            login_id: body.login_id,
            password: body.password,
            email: body.email,
            phone_number: body.phone_number,
            display_name: body.display_name,
            gender: body.gender,
            auto_login: body.auto_login,
            device_token: body.device_token,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SocialSignupBody {
    #[serde(default)]
    pub email: Option<String>,
    pub phone_number: String,
    pub display_name: String,
    #[serde(default)]
    pub gender: Option<i64>,
    /// `naver` or `kakao`.
    pub provider: String,
    /// Provider access token, exchanged for the provider-subject id.
    pub access_token: String,
    #[serde(default)]
    pub auto_login: bool,
    #[serde(default)]
    pub device_token: Option<String>,
}

impl From<SocialSignupBody> for SocialSignupRequest {
    fn from(body: SocialSignupBody) -> Self {
        Self {
            email: body.email,
            phone_number: body.phone_number,
            display_name: body.display_name,
            gender: body.gender,
            provider: body.provider,
            access_token: body.access_token,
            auto_login: body.auto_login,
            device_token: body.device_token,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginBody {
    pub login_id: String,
    pub password: String,
    #[serde(default)]
    pub auto_login: bool,
}

impl From<LoginBody> for LoginRequest {
    fn from(body: LoginBody) -> Self {
        Self {
            login_id: body.login_id,
            password: body.password,
            auto_login: body.auto_login,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTokenBody {
    pub device_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub public_id: String,
}

impl From<SessionGrant> for SessionResponse {
    fn from(grant: SessionGrant) -> Self {
        Self {
            token: grant.token,
            expires_at: grant.expires_at,
            public_id: grant.public_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub public_id: String,
    pub login_id: Option<String>,
    pub email: Option<String>,
    pub phone_number: String,
    pub display_name: String,
    pub gender: i64,
    pub provider: String,
    pub has_device_token: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Identity> for ProfileResponse {
    fn from(identity: Identity) -> Self {
        Self {
            public_id: identity.public_id,
            login_id: identity.login_id,
            email: identity.email,
            phone_number: identity.phone_number,
            display_name: identity.display_name,
            gender: identity.gender.code(),
            provider: identity.provider.as_str().to_string(),
            has_device_token: identity
                .device_token
                .as_deref()
                .is_some_and(|token| !token.is_empty()),
            created_at: identity.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeviceTokenUpdatedResponse {
    pub updated: bool,
}

#[utoipa::path(
    post,
    path = "/api/users/signup",
    tag = "Users",
    request_body = LocalSignupBody,
    responses(
        (status = 201, description = "Identity created and session issued", body = SessionResponse),
        (status = 400, description = "Malformed input", body = crate::error::ErrorResponse),
        (status = 409, description = "Phone not verified, or phone or id already registered", body = crate::error::ErrorResponse),
        (status = 500, description = "Unexpected server error", body = crate::error::ErrorResponse)
    )
)]
pub async fn signup_local(
    State(state): State<GatewayState>,
    payload: Result<Json<LocalSignupBody>, JsonRejection>,
) -> Result<ApiResponse<SessionResponse>, ApiError> {
    let Json(body) = payload?;
    let grant = state.registration().signup_local(body.into()).await?;
    Ok(ApiResponse::created(grant.into()))
}

#[utoipa::path(
    post,
    path = "/api/users/signup/social",
    tag = "Users",
    request_body = SocialSignupBody,
    responses(
        (status = 201, description = "Social identity created and session issued", body = SessionResponse),
        (status = 400, description = "Malformed input", body = crate::error::ErrorResponse),
        (status = 401, description = "Provider token expired or invalid", body = crate::error::ErrorResponse),
        (status = 409, description = "Phone not verified, or phone or account already registered", body = crate::error::ErrorResponse),
        (status = 500, description = "Unexpected server error", body = crate::error::ErrorResponse)
    )
)]
pub async fn signup_social(
    State(state): State<GatewayState>,
    payload: Result<Json<SocialSignupBody>, JsonRejection>,
) -> Result<ApiResponse<SessionResponse>, ApiError> {
    let Json(body) = payload?;
    let grant = state.registration().signup_social(body.into()).await?;
    Ok(ApiResponse::created(grant.into()))
}

#[utoipa::path(
    post,
    path = "/api/users/login",
    tag = "Users",
    request_body = LoginBody,
    responses(
        (status = 200, description = "Session issued", body = SessionResponse),
        (status = 400, description = "Malformed input", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid id or password", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<GatewayState>,
    payload: Result<Json<LoginBody>, JsonRejection>,
) -> Result<ApiResponse<SessionResponse>, ApiError> {
    let Json(body) = payload?;
    let grant = state.registration().login(body.into()).await?;
    Ok(ApiResponse::ok(grant.into()))
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Profile of the authenticated identity", body = ProfileResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "Identity not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_current_user(
    State(state): State<GatewayState>,
    headers: HeaderMap,
) -> Result<ApiResponse<ProfileResponse>, ApiError> {
    let identity_id = state.authenticate(&headers)?;
    let identity = state.registration().profile(identity_id).await?;
    Ok(ApiResponse::ok(identity.into()))
}

#[utoipa::path(
    put,
    path = "/api/users/me/device-token",
    tag = "Users",
    security(("bearerAuth" = [])),
    request_body = DeviceTokenBody,
    responses(
        (status = 200, description = "Push token stored", body = DeviceTokenUpdatedResponse),
        (status = 400, description = "Empty or oversized token", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "Identity not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_device_token(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    payload: Result<Json<DeviceTokenBody>, JsonRejection>,
) -> Result<ApiResponse<DeviceTokenUpdatedResponse>, ApiError> {
    let identity_id = state.authenticate(&headers)?;
    let Json(body) = payload?;
    state
        .registration()
        .update_device_token(identity_id, &body.device_token)
        .await?;
    Ok(ApiResponse::ok(DeviceTokenUpdatedResponse { updated: true }))
}
