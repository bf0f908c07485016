//! Exchange of social provider access tokens for provider subject ids.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use homelink_config::SocialConfig;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialProvider {
    Naver,
    Kakao,
}

impl SocialProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            SocialProvider::Naver => "naver",
            SocialProvider::Kakao => "kakao",
        }
    }
}

impl fmt::Display for SocialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// `Ok(None)` when the provider refuses the access token (expired,
    /// revoked or unknown).
    async fn exchange(
        &self,
        access_token: &str,
        provider: SocialProvider,
    ) -> Result<Option<String>, AuthError>;
}

/// Calls each provider's profile endpoint with the access token as a bearer
/// credential.
#[derive(Clone)]
pub struct HttpTokenVerifier {
    http: reqwest::Client,
    naver_profile_url: String,
    kakao_profile_url: String,
}

impl HttpTokenVerifier {
    pub fn from_config(config: &SocialConfig) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .user_agent("homelink-backend")
            .timeout(Duration::from_secs(config.request_timeout_seconds.max(1)))
            .build()?;

        Ok(Self {
            http,
            naver_profile_url: config.naver_profile_url.clone(),
            kakao_profile_url: config.kakao_profile_url.clone(),
        })
    }

    fn profile_url(&self, provider: SocialProvider) -> &str {
        match provider {
            SocialProvider::Naver => &self.naver_profile_url,
            SocialProvider::Kakao => &self.kakao_profile_url,
        }
    }
}

#[async_trait]
impl TokenVerifier for HttpTokenVerifier {
    async fn exchange(
        &self,
        access_token: &str,
        provider: SocialProvider,
    ) -> Result<Option<String>, AuthError> {
        let response = self
            .http
            .get(self.profile_url(provider))
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            debug!(%provider, %status, "provider rejected access token");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AuthError::SocialResponse(format!(
                "{provider} profile endpoint returned {status}"
            )));
        }

        let subject = match provider {
            SocialProvider::Naver => {
                let body: NaverProfileResponse = response.json().await?;
                if body.resultcode != "00" {
                    debug!(%provider, code = %body.resultcode, "provider rejected access token");
                    None
                } else {
                    body.response.map(|profile| profile.id)
                }
            }
            SocialProvider::Kakao => {
                let body: KakaoProfileResponse = response.json().await?;
                Some(body.id.to_string())
            }
        };

        Ok(subject.filter(|id| !id.is_empty()))
    }
}

#[derive(Deserialize)]
struct NaverProfileResponse {
    resultcode: String,
    response: Option<NaverProfile>,
}

#[derive(Deserialize)]
struct NaverProfile {
    id: String,
}

#[derive(Deserialize)]
struct KakaoProfileResponse {
    id: i64,
}
