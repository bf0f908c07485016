//! In-memory collaborators for exercising the services without SQLite,
//! Redis or network access.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use homelink_auth::{AuthError, CredentialHasher, SocialProvider, TokenVerifier};
use homelink_database::{
    DatabaseError, DatabaseResult, DeviceBinding, Identity, NewIdentity, Provider, Renewal,
    SubscriptionWindow, UniqueColumn, UpsertDeviceRequest,
};
use tokio::sync::{Mutex, RwLock};

use crate::push::{PushError, PushSender};
use crate::repository::{DeviceRepo, IdentityRepo, SubscriptionRepo};

/// Identity store honouring the same uniqueness rules as the SQLite schema.
#[derive(Default)]
pub struct MockIdentityRepository {
    identities: RwLock<HashMap<i64, Identity>>,
    next_id: Mutex<i64>,
    fail_next_create: Mutex<Option<UniqueColumn>>,
}

impl MockIdentityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.identities.read().await.len()
    }

    /// Make the next `create` fail as if a concurrent insert had won.
    pub async fn fail_next_create_with(&self, column: UniqueColumn) {
        *self.fail_next_create.lock().await = Some(column);
    }
}

#[async_trait]
impl IdentityRepo for MockIdentityRepository {
    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Identity>> {
        Ok(self.identities.read().await.get(&id).cloned())
    }

    async fn find_by_phone(&self, phone_number: &str) -> DatabaseResult<Option<Identity>> {
        let identities = self.identities.read().await;
        Ok(identities
            .values()
            .find(|identity| identity.phone_number == phone_number)
            .cloned())
    }

    async fn find_by_login_id(&self, login_id: &str) -> DatabaseResult<Option<Identity>> {
        let identities = self.identities.read().await;
        Ok(identities
            .values()
            .find(|identity| identity.login_id.as_deref() == Some(login_id))
            .cloned())
    }

    async fn find_by_phone_or_provider_subject(
        &self,
        phone_number: &str,
        provider: Provider,
        provider_subject_id: &str,
    ) -> DatabaseResult<Vec<Identity>> {
        let identities = self.identities.read().await;
        Ok(identities
            .values()
            .filter(|identity| {
                identity.phone_number == phone_number
                    || (identity.provider == provider
                        && identity.provider_subject_id.as_deref() == Some(provider_subject_id))
            })
            .cloned()
            .collect())
    }

    async fn create(&self, request: &NewIdentity) -> DatabaseResult<Identity> {
        if let Some(column) = self.fail_next_create.lock().await.take() {
            return Err(DatabaseError::UniqueViolation { column });
        }

        let mut identities = self.identities.write().await;
        for existing in identities.values() {
            if request.login_id.is_some() && existing.login_id == request.login_id {
                return Err(DatabaseError::UniqueViolation {
                    column: UniqueColumn::LoginId,
                });
            }
            if existing.phone_number == request.phone_number {
                return Err(DatabaseError::UniqueViolation {
                    column: UniqueColumn::PhoneNumber,
                });
            }
            if request.provider_subject_id.is_some()
                && existing.provider == request.provider
                && existing.provider_subject_id == request.provider_subject_id
            {
                return Err(DatabaseError::UniqueViolation {
                    column: UniqueColumn::ProviderSubject,
                });
            }
        }

        let mut next_id = self.next_id.lock().await;
        *next_id += 1;
        let now = Utc::now();
        let identity = Identity {
            id: *next_id,
            public_id: format!("identity_{}", *next_id),
            login_id: request.login_id.clone(),
            password_hash: request.password_hash.clone(),
            email: request.email.clone(),
            phone_number: request.phone_number.clone(),
            display_name: request.display_name.clone(),
            gender: request.gender,
            provider: request.provider,
            provider_subject_id: request.provider_subject_id.clone(),
            device_token: request.device_token.clone(),
            created_at: now,
            updated_at: now,
        };
        identities.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn update_device_token(&self, id: i64, device_token: &str) -> DatabaseResult<bool> {
        let mut identities = self.identities.write().await;
        match identities.get_mut(&id) {
            Some(identity) => {
                identity.device_token = Some(device_token.to_string());
                identity.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct MockDeviceRepository {
    devices: RwLock<HashMap<String, DeviceBinding>>,
}

impl MockDeviceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<DeviceBinding> {
        self.devices.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl DeviceRepo for MockDeviceRepository {
    async fn upsert(&self, request: &UpsertDeviceRequest) -> DatabaseResult<DeviceBinding> {
        let mut devices = self.devices.write().await;
        let now = Utc::now();
        let binding = devices
            .entry(request.device_id.clone())
            .and_modify(|binding| {
                binding.owner_id = request.owner_id;
                binding.label = request.label.clone();
                binding.updated_at = now;
            })
            .or_insert_with(|| DeviceBinding {
                device_id: request.device_id.clone(),
                owner_id: request.owner_id,
                label: request.label.clone(),
                created_at: now,
                updated_at: now,
            });
        Ok(binding.clone())
    }
}

/// Window store that renews under one lock, as the SQLite transaction does.
#[derive(Default)]
pub struct MockSubscriptionRepository {
    windows: RwLock<Vec<SubscriptionWindow>>,
    /// Number of upcoming `renew` calls that fail as if the store were locked.
    busy_renewals: Mutex<u32>,
}

impl MockSubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, identity_id: i64, start: DateTime<Utc>, end: DateTime<Utc>) {
        let mut windows = self.windows.write().await;
        let id = windows.len() as i64 + 1;
        windows.push(SubscriptionWindow {
            id,
            identity_id,
            start_date: start,
            end_date: end,
        });
    }

    pub async fn windows_for(&self, identity_id: i64) -> Vec<SubscriptionWindow> {
        self.windows
            .read()
            .await
            .iter()
            .filter(|window| window.identity_id == identity_id)
            .cloned()
            .collect()
    }

    pub async fn fail_next_renewals_busy(&self, count: u32) {
        *self.busy_renewals.lock().await = count;
    }
}

#[async_trait]
impl SubscriptionRepo for MockSubscriptionRepository {
    async fn find_active(
        &self,
        identity_id: i64,
        at: DateTime<Utc>,
    ) -> DatabaseResult<Option<SubscriptionWindow>> {
        let windows = self.windows.read().await;
        Ok(windows
            .iter()
            .filter(|window| window.identity_id == identity_id && window.is_active_at(at))
            .max_by_key(|window| window.end_date)
            .cloned())
    }

    async fn renew(
        &self,
        identity_id: i64,
        now: DateTime<Utc>,
        next_end: fn(DateTime<Utc>) -> Option<DateTime<Utc>>,
    ) -> DatabaseResult<Renewal> {
        {
            let mut busy = self.busy_renewals.lock().await;
            if *busy > 0 {
                *busy -= 1;
                return Err(DatabaseError::Busy("database is locked".to_string()));
            }
        }

        let mut windows = self.windows.write().await;
        let active = windows
            .iter_mut()
            .filter(|window| window.identity_id == identity_id && window.is_active_at(now))
            .max_by_key(|window| window.end_date);

        if let Some(window) = active {
            window.end_date = next_end(window.end_date)
                .ok_or_else(|| DatabaseError::OutOfRange(window.end_date.to_rfc3339()))?;
            return Ok(Renewal::Extended(window.clone()));
        }

        let window = SubscriptionWindow {
            id: windows.len() as i64 + 1,
            identity_id,
            start_date: now,
            end_date: next_end(now).ok_or_else(|| DatabaseError::OutOfRange(now.to_rfc3339()))?,
        };
        windows.push(window.clone());
        Ok(Renewal::Opened(window))
    }
}

/// Reversible stand-in for the real hasher; keeps unit tests fast.
pub struct StubHasher;

impl CredentialHasher for StubHasher {
    fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        Ok(format!("stub${}", plaintext.chars().rev().collect::<String>()))
    }

    fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AuthError> {
        Ok(self.hash(plaintext)? == digest)
    }
}

pub struct StubSocialVerifier {
    outcome: Option<Option<String>>,
}

impl StubSocialVerifier {
    pub fn returning(subject: Option<&str>) -> Self {
        Self {
            outcome: Some(subject.map(str::to_string)),
        }
    }

    pub fn failing() -> Self {
        Self { outcome: None }
    }
}

#[async_trait]
impl TokenVerifier for StubSocialVerifier {
    async fn exchange(
        &self,
        _access_token: &str,
        _provider: SocialProvider,
    ) -> Result<Option<String>, AuthError> {
        match &self.outcome {
            Some(subject) => Ok(subject.clone()),
            None => Err(AuthError::SocialResponse("provider unavailable".to_string())),
        }
    }
}

/// Records every message instead of delivering it.
#[derive(Clone, Default)]
pub struct RecordingPushSender {
    sent: Arc<Mutex<Vec<(String, String, String)>>>,
}

impl RecordingPushSender {
    pub async fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl PushSender for RecordingPushSender {
    async fn send(&self, device_token: &str, title: &str, body: &str) -> Result<(), PushError> {
        self.sent
            .lock()
            .await
            .push((device_token.to_string(), title.to_string(), body.to_string()));
        Ok(())
    }
}
