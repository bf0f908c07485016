//! Storage seams for the account services, implemented by the SQLite
//! repositories of `homelink-database`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use homelink_database::{
    DatabaseResult, DeviceBinding, DeviceRepository, Identity, IdentityRepository, NewIdentity,
    Provider, Renewal, SubscriptionRepository, SubscriptionWindow, UpsertDeviceRequest,
};

#[async_trait]
pub trait IdentityRepo: Send + Sync {
    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Identity>>;
    async fn find_by_phone(&self, phone_number: &str) -> DatabaseResult<Option<Identity>>;
    async fn find_by_login_id(&self, login_id: &str) -> DatabaseResult<Option<Identity>>;
    async fn find_by_phone_or_provider_subject(
        &self,
        phone_number: &str,
        provider: Provider,
        provider_subject_id: &str,
    ) -> DatabaseResult<Vec<Identity>>;
    async fn create(&self, request: &NewIdentity) -> DatabaseResult<Identity>;
    async fn update_device_token(&self, id: i64, device_token: &str) -> DatabaseResult<bool>;
}

#[async_trait]
pub trait DeviceRepo: Send + Sync {
    async fn upsert(&self, request: &UpsertDeviceRequest) -> DatabaseResult<DeviceBinding>;
}

#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    async fn find_active(
        &self,
        identity_id: i64,
        at: DateTime<Utc>,
    ) -> DatabaseResult<Option<SubscriptionWindow>>;
    /// Open or extend the identity's window atomically.
    async fn renew(
        &self,
        identity_id: i64,
        now: DateTime<Utc>,
        next_end: fn(DateTime<Utc>) -> Option<DateTime<Utc>>,
    ) -> DatabaseResult<Renewal>;
}

#[async_trait]
impl IdentityRepo for IdentityRepository {
    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Identity>> {
        IdentityRepository::find_by_id(self, id).await
    }

    async fn find_by_phone(&self, phone_number: &str) -> DatabaseResult<Option<Identity>> {
        IdentityRepository::find_by_phone(self, phone_number).await
    }

    async fn find_by_login_id(&self, login_id: &str) -> DatabaseResult<Option<Identity>> {
        IdentityRepository::find_by_login_id(self, login_id).await
    }

    async fn find_by_phone_or_provider_subject(
        &self,
        phone_number: &str,
        provider: Provider,
        provider_subject_id: &str,
    ) -> DatabaseResult<Vec<Identity>> {
        IdentityRepository::find_by_phone_or_provider_subject(
            self,
            phone_number,
            provider,
            provider_subject_id,
        )
        .await
    }

    async fn create(&self, request: &NewIdentity) -> DatabaseResult<Identity> {
        IdentityRepository::create(self, request).await
    }

    async fn update_device_token(&self, id: i64, device_token: &str) -> DatabaseResult<bool> {
        IdentityRepository::update_device_token(self, id, device_token).await
    }
}

#[async_trait]
impl DeviceRepo for DeviceRepository {
    async fn upsert(&self, request: &UpsertDeviceRequest) -> DatabaseResult<DeviceBinding> {
        DeviceRepository::upsert(self, request).await
    }
}

#[async_trait]
impl SubscriptionRepo for SubscriptionRepository {
    async fn find_active(
        &self,
        identity_id: i64,
        at: DateTime<Utc>,
    ) -> DatabaseResult<Option<SubscriptionWindow>> {
        SubscriptionRepository::find_active(self, identity_id, at).await
    }

    async fn renew(
        &self,
        identity_id: i64,
        now: DateTime<Utc>,
        next_end: fn(DateTime<Utc>) -> Option<DateTime<Utc>>,
    ) -> DatabaseResult<Renewal> {
        SubscriptionRepository::renew(self, identity_id, now, next_end).await
    }
}
