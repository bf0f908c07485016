//! # Homelink Accounts
//!
//! The registration and entitlement core: identity signup (local and
//! social), device binding, the subscription ledger and push dispatch.
//!
//! ## Architecture
//!
//! - **Services**: business rules, one per concern
//! - **Repository**: storage traits over the SQLite repositories
//! - **Verification** / **Push**: external collaborators with real and
//!   fallback implementations
//! - **Error**: the two-kind `Rejected` / `Unexpected` model

pub mod error;
pub mod period;
pub mod push;
pub mod repository;
pub mod services;
pub mod types;
pub mod validation;
pub mod verification;

#[cfg(test)]
mod mock_repositories;

pub use error::{AccountError, AccountResult, Rejection};
pub use push::{HttpPushSender, LoggingPushSender, PushError, PushSender};
pub use repository::{DeviceRepo, IdentityRepo, SubscriptionRepo};
pub use services::{
    DeviceBindingService, NotificationDispatcher, RegistrationService, SubscriptionLedger,
};
pub use types::{
    BindDeviceRequest, LocalSignupRequest, LoginRequest, PushMessage, SessionGrant,
    SocialSignupRequest, SubscriptionState,
};
pub use verification::{
    InMemoryVerificationStore, RedisVerificationStore, VerificationError, VerificationStore,
    DEFAULT_VERIFICATION_TTL,
};
