//! Domain entities for the database layer

pub mod device;
pub mod identity;
pub mod subscription;

pub use device::{DeviceBinding, UpsertDeviceRequest};
pub use identity::{Gender, Identity, NewIdentity, Provider};
pub use subscription::{Renewal, SubscriptionWindow};
