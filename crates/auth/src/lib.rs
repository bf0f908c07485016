//! Opaque authentication primitives used by the account core.
//!
//! Each capability sits behind a narrow trait with a single production
//! implementation: [`Argon2Hasher`] for credentials, [`JwtTokenIssuer`] for
//! session tokens and [`HttpTokenVerifier`] for social provider access tokens.

use thiserror::Error;

pub mod password;
pub mod social;
pub mod token;

pub use password::{Argon2Hasher, CredentialHasher};
pub use social::{HttpTokenVerifier, SocialProvider, TokenVerifier};
pub use token::{IssuedToken, JwtTokenIssuer, TokenIssuer, TokenTtl, AUTO_LOGIN_TTL_DAYS};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
    #[error("token encoding failed: {0}")]
    TokenEncoding(#[source] jsonwebtoken::errors::Error),
    #[error("invalid session token")]
    InvalidToken,
    #[error("session token expired")]
    TokenExpired,
    #[error("social provider request failed: {0}")]
    SocialHttp(#[from] reqwest::Error),
    #[error("unexpected social provider response: {0}")]
    SocialResponse(String),
}
