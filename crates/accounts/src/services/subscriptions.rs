//! Entitlement windows per identity.
//!
//! Subscribing extends the active window by one calendar month measured
//! from its current end, so renewals stack. With no active window a new one
//! opens at `now`. The storage layer performs each renewal as a single
//! transaction; only a store that stays locked past its busy timeout is
//! retried.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use homelink_database::{
    DatabaseError, Renewal, SqlitePool, SubscriptionRepository, SubscriptionWindow,
};
use tracing::{info, warn};

use crate::error::{AccountResult, UnexpectedExt};
use crate::period::add_one_month;
use crate::repository::SubscriptionRepo;
use crate::types::SubscriptionState;

const BUSY_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct SubscriptionLedger {
    windows: Arc<dyn SubscriptionRepo>,
}

impl SubscriptionLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_repository(Arc::new(SubscriptionRepository::new(pool)))
    }

    pub fn with_repository(windows: Arc<dyn SubscriptionRepo>) -> Self {
        Self { windows }
    }

    pub async fn state(&self, identity_id: i64) -> AccountResult<SubscriptionState> {
        self.state_at(identity_id, Utc::now()).await
    }

    pub async fn state_at(
        &self,
        identity_id: i64,
        now: DateTime<Utc>,
    ) -> AccountResult<SubscriptionState> {
        let active = self
            .windows
            .find_active(identity_id, now)
            .await
            .or_unexpected("reading subscription window")?;

        Ok(match active {
            Some(window) => SubscriptionState {
                subscribe_state: true,
                start_date: Some(window.start_date),
                end_date: Some(window.end_date),
            },
            None => SubscriptionState::inactive(),
        })
    }

    pub async fn subscribe(&self, identity_id: i64) -> AccountResult<SubscriptionWindow> {
        self.subscribe_at(identity_id, Utc::now()).await
    }

    pub async fn subscribe_at(
        &self,
        identity_id: i64,
        now: DateTime<Utc>,
    ) -> AccountResult<SubscriptionWindow> {
        let mut attempt = 1;
        let renewal = loop {
            match self.windows.renew(identity_id, now, add_one_month).await {
                Ok(renewal) => break renewal,
                Err(DatabaseError::Busy(reason)) if attempt < BUSY_ATTEMPTS => {
                    warn!(identity_id, attempt, %reason, "subscription store busy; retrying");
                    attempt += 1;
                }
                Err(err) => return Err(err).or_unexpected("renewing subscription"),
            }
        };

        match &renewal {
            Renewal::Opened(window) => {
                info!(identity_id, window_id = window.id, end = %window.end_date, "subscription opened")
            }
            Renewal::Extended(window) => {
                info!(identity_id, window_id = window.id, end = %window.end_date, "subscription extended")
            }
        }
        Ok(renewal.into_window())
    }
}
