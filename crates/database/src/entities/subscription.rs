//! Subscription window entity definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entitlement window. A window is active at `at` when
/// `start_date <= at <= end_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionWindow {
    pub id: i64,
    pub identity_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl SubscriptionWindow {
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.start_date <= at && at <= self.end_date
    }
}

/// Outcome of a subscribe call.
#[derive(Debug, Clone, PartialEq)]
pub enum Renewal {
    /// No window was active, a new one starts now.
    Opened(SubscriptionWindow),
    /// The active window's end moved forward.
    Extended(SubscriptionWindow),
}

impl Renewal {
    pub fn window(&self) -> &SubscriptionWindow {
        match self {
            Renewal::Opened(window) | Renewal::Extended(window) => window,
        }
    }

    pub fn into_window(self) -> SubscriptionWindow {
        match self {
            Renewal::Opened(window) | Renewal::Extended(window) => window,
        }
    }
}
