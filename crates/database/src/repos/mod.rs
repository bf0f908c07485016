//! Database repository implementations

pub mod device_repository;
pub mod identity_repository;
pub mod subscription_repository;

pub use device_repository::*;
pub use identity_repository::*;
pub use subscription_repository::*;
