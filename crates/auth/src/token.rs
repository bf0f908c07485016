//! Session tokens (HS256 JWT) bound to an identity's surrogate id.

use chrono::{DateTime, Duration, Utc};
use homelink_config::AuthConfig;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::AuthError;

/// Lifetime of tokens issued with auto-login enabled.
pub const AUTO_LOGIN_TTL_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenTtl {
    /// The configured short session lifetime.
    Default,
    /// The fixed auto-login window.
    AutoLogin,
}

impl TokenTtl {
    pub fn for_auto_login(auto_login: bool) -> Self {
        if auto_login {
            TokenTtl::AutoLogin
        } else {
            TokenTtl::Default
        }
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub trait TokenIssuer: Send + Sync {
    fn issue(&self, identity_id: i64, ttl: TokenTtl) -> Result<IssuedToken, AuthError>;

    /// Check signature, issuer, audience and expiry; return the bound
    /// surrogate id.
    fn validate(&self, token: &str) -> Result<i64, AuthError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
    jti: String,
}

#[derive(Clone)]
pub struct JwtTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    default_ttl: Duration,
}

impl JwtTokenIssuer {
    pub fn new(secret: &str, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            audience: audience.into(),
            default_ttl: Duration::days(1),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        let ttl_seconds = i64::try_from(config.session_ttl_seconds).unwrap_or(i64::MAX);
        Self::new(&config.jwt_secret, &config.jwt_issuer, &config.jwt_audience)
            .with_default_ttl(Duration::try_seconds(ttl_seconds).unwrap_or(Duration::MAX))
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    fn lifetime(&self, ttl: TokenTtl) -> Duration {
        match ttl {
            TokenTtl::Default => self.default_ttl,
            TokenTtl::AutoLogin => Duration::days(AUTO_LOGIN_TTL_DAYS),
        }
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, identity_id: i64, ttl: TokenTtl) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.lifetime(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let claims = Claims {
            sub: identity_id.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(AuthError::TokenEncoding)?;

        Ok(IssuedToken { token, expires_at })
    }

    fn validate(&self, token: &str) -> Result<i64, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        })?;

        data.claims
            .sub
            .parse::<i64>()
            .map_err(|_| AuthError::InvalidToken)
    }
}
