//! Identity entity definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account, local or linked to a social login provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub public_id: String,
    pub login_id: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub email: Option<String>,
    pub phone_number: String,
    pub display_name: String,
    pub gender: Gender,
    pub provider: Provider,
    pub provider_subject_id: Option<String>,
    pub device_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attributes for a new identity row.
///
/// Exactly one of `password_hash` or a non-local `provider` must be set;
/// the table CHECK constraint enforces the same rule.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub login_id: Option<String>,
    pub password_hash: Option<String>,
    pub email: Option<String>,
    pub phone_number: String,
    pub display_name: String,
    pub gender: Gender,
    pub provider: Provider,
    pub provider_subject_id: Option<String>,
    pub device_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Local,
    Naver,
    Kakao,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Local => "local",
            Provider::Naver => "naver",
            Provider::Kakao => "kakao",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "local" => Some(Provider::Local),
            "naver" => Some(Provider::Naver),
            "kakao" => Some(Provider::Kakao),
            _ => None,
        }
    }

    pub fn is_social(&self) -> bool {
        !matches!(self, Provider::Local)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gender code as captured at signup; `Unspecified` when the field is omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Unspecified,
    Male,
    Female,
}

impl Gender {
    pub fn code(&self) -> i64 {
        match self {
            Gender::Unspecified => 0,
            Gender::Male => 1,
            Gender::Female => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Gender::Unspecified),
            1 => Some(Gender::Male),
            2 => Some(Gender::Female),
            _ => None,
        }
    }
}
