use std::sync::Arc;

use homelink_database::{IdentityRepository, SqlitePool};
use tracing::info;

use crate::error::{AccountError, AccountResult, Rejection, UnexpectedExt};
use crate::push::PushSender;
use crate::repository::IdentityRepo;
use crate::types::PushMessage;

const TITLE_MAX: usize = 100;
const BODY_MAX: usize = 1000;

/// Forwards a message to the push token stored on the identity. No retries;
/// delivery failures surface as unexpected errors.
#[derive(Clone)]
pub struct NotificationDispatcher {
    identities: Arc<dyn IdentityRepo>,
    sender: Arc<dyn PushSender>,
}

impl NotificationDispatcher {
    pub fn new(pool: SqlitePool, sender: Arc<dyn PushSender>) -> Self {
        Self::with_repository(Arc::new(IdentityRepository::new(pool)), sender)
    }

    pub fn with_repository(identities: Arc<dyn IdentityRepo>, sender: Arc<dyn PushSender>) -> Self {
        Self { identities, sender }
    }

    pub async fn dispatch(&self, identity_id: i64, message: PushMessage) -> AccountResult<()> {
        if message.title.trim().is_empty() || message.title.chars().count() > TITLE_MAX {
            return Err(AccountError::validation("title must be 1 to 100 characters"));
        }
        if message.body.chars().count() > BODY_MAX {
            return Err(AccountError::validation("body must be at most 1000 characters"));
        }

        let identity = self
            .identities
            .find_by_id(identity_id)
            .await
            .or_unexpected("loading identity")?
            .ok_or(Rejection::IdentityNotFound)?;

        let Some(device_token) = identity.device_token.filter(|token| !token.is_empty()) else {
            return Err(Rejection::DeviceTokenMissing.into());
        };

        self.sender
            .send(&device_token, &message.title, &message.body)
            .await
            .or_unexpected("sending push notification")?;

        info!(identity = %identity.public_id, "push notification dispatched");
        Ok(())
    }
}
