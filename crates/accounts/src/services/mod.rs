//! Account services. Each holds its collaborators behind trait objects so
//! the gateway and tests can wire real or in-memory implementations.

pub mod devices;
pub mod notifications;
pub mod registration;
pub mod subscriptions;

pub use devices::DeviceBindingService;
pub use notifications::NotificationDispatcher;
pub use registration::RegistrationService;
pub use subscriptions::SubscriptionLedger;
