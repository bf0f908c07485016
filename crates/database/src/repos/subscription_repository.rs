//! Subscription window storage.
//!
//! A renewal runs in one transaction whose first statement is the guarded
//! insert, so the write lock is held before the active window is read.
//! Concurrent renewals for the same identity queue on the busy timeout and
//! each one observes the previous one's end date.

use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::debug;

use crate::entities::{Renewal, SubscriptionWindow};
use crate::types::{db_timestamp, parse_db_timestamp, DatabaseError, DatabaseResult};

const ACTIVE_WINDOW_SQL: &str = r#"
    SELECT id, identity_id, start_date, end_date
    FROM subscription_windows
    WHERE identity_id = ? AND start_date <= ? AND end_date >= ?
    ORDER BY end_date DESC
    LIMIT 1
"#;

#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: SqlitePool,
}

impl SubscriptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The window covering `at`, if any. When rows overlap the one ending
    /// last wins.
    pub async fn find_active(
        &self,
        identity_id: i64,
        at: DateTime<Utc>,
    ) -> DatabaseResult<Option<SubscriptionWindow>> {
        let at = db_timestamp(at);
        let row = sqlx::query(ACTIVE_WINDOW_SQL)
            .bind(identity_id)
            .bind(&at)
            .bind(&at)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_window).transpose()
    }

    /// Open `[now, next_end(now)]` when no window is active at `now`,
    /// otherwise move the active window's end to `next_end(end)`.
    pub async fn renew(
        &self,
        identity_id: i64,
        now: DateTime<Utc>,
        next_end: fn(DateTime<Utc>) -> Option<DateTime<Utc>>,
    ) -> DatabaseResult<Renewal> {
        let start = db_timestamp(now);
        let end = next_end(now)
            .map(db_timestamp)
            .ok_or_else(|| DatabaseError::OutOfRange(start.clone()))?;
        let stamp = db_timestamp(Utc::now());

        let mut tx = self.pool.begin().await.map_err(DatabaseError::from_write)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO subscription_windows (identity_id, start_date, end_date, created_at, updated_at)
            SELECT ?, ?, ?, ?, ?
            WHERE NOT EXISTS (
                SELECT 1 FROM subscription_windows
                WHERE identity_id = ? AND start_date <= ? AND end_date >= ?
            )
            "#,
        )
        .bind(identity_id)
        .bind(&start)
        .bind(&end)
        .bind(&stamp)
        .bind(&stamp)
        .bind(identity_id)
        .bind(&start)
        .bind(&start)
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from_write)?;

        if inserted.rows_affected() == 1 {
            let id = inserted.last_insert_rowid();
            tx.commit().await.map_err(DatabaseError::from_write)?;
            return Ok(Renewal::Opened(SubscriptionWindow {
                id,
                identity_id,
                start_date: parse_db_timestamp(&start)?,
                end_date: parse_db_timestamp(&end)?,
            }));
        }

        let row = sqlx::query(ACTIVE_WINDOW_SQL)
            .bind(identity_id)
            .bind(&start)
            .bind(&start)
            .fetch_optional(&mut *tx)
            .await?;
        let window = row.as_ref().map(map_window).transpose()?.ok_or_else(|| {
            DatabaseError::NotFound(format!("active window for identity {identity_id}"))
        })?;

        let new_end = next_end(window.end_date)
            .map(db_timestamp)
            .ok_or_else(|| DatabaseError::OutOfRange(db_timestamp(window.end_date)))?;

        sqlx::query("UPDATE subscription_windows SET end_date = ?, updated_at = ? WHERE id = ?")
            .bind(&new_end)
            .bind(&stamp)
            .bind(window.id)
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from_write)?;
        tx.commit().await.map_err(DatabaseError::from_write)?;

        debug!(identity_id, window_id = window.id, "subscription window extended");
        Ok(Renewal::Extended(SubscriptionWindow {
            end_date: parse_db_timestamp(&new_end)?,
            ..window
        }))
    }
}

fn map_window(row: &SqliteRow) -> DatabaseResult<SubscriptionWindow> {
    let start_date: String = row.try_get("start_date")?;
    let end_date: String = row.try_get("end_date")?;

    Ok(SubscriptionWindow {
        id: row.try_get("id")?,
        identity_id: row.try_get("identity_id")?,
        start_date: parse_db_timestamp(&start_date)?,
        end_date: parse_db_timestamp(&end_date)?,
    })
}
