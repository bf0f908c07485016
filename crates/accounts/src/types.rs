//! Inputs and outputs of the account services.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct LocalSignupRequest {
    pub login_id: String,
    pub password: String,
    pub email: Option<String>,
    pub phone_number: String,
    pub display_name: String,
    pub gender: Option<i64>,
    pub auto_login: bool,
    pub device_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SocialSignupRequest {
    pub email: Option<String>,
    pub phone_number: String,
    pub display_name: String,
    pub gender: Option<i64>,
    pub provider: String,
    pub access_token: String,
    pub auto_login: bool,
    pub device_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub login_id: String,
    pub password: String,
    pub auto_login: bool,
}

#[derive(Debug, Clone)]
pub struct BindDeviceRequest {
    pub device_id: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
}

/// A freshly issued session token.
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub public_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionState {
    pub subscribe_state: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl SubscriptionState {
    pub fn inactive() -> Self {
        Self {
            subscribe_state: false,
            start_date: None,
            end_date: None,
        }
    }
}
