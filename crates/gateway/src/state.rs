//! Shared application state for the gateway

use axum::http::HeaderMap;
use homelink_accounts::{
    DeviceBindingService, NotificationDispatcher, RegistrationService, SubscriptionLedger,
};

use crate::error::ApiError;
use crate::util::require_bearer;

/// The account services every handler can reach. Each service is cheap to
/// clone; collaborators sit behind `Arc`s inside them.
#[derive(Clone)]
pub struct GatewayState {
    registration: RegistrationService,
    devices: DeviceBindingService,
    subscriptions: SubscriptionLedger,
    notifications: NotificationDispatcher,
}

impl GatewayState {
    pub fn new(
        registration: RegistrationService,
        devices: DeviceBindingService,
        subscriptions: SubscriptionLedger,
        notifications: NotificationDispatcher,
    ) -> Self {
        Self {
            registration,
            devices,
            subscriptions,
            notifications,
        }
    }

    pub fn registration(&self) -> &RegistrationService {
        &self.registration
    }

    pub fn devices(&self) -> &DeviceBindingService {
        &self.devices
    }

    pub fn subscriptions(&self) -> &SubscriptionLedger {
        &self.subscriptions
    }

    pub fn notifications(&self) -> &NotificationDispatcher {
        &self.notifications
    }

    /// Resolve the bearer token on a request to the caller's identity id.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<i64, ApiError> {
        let token = require_bearer(headers)?;
        Ok(self.registration.authenticate(&token)?)
    }
}
