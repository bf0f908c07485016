//! Identity repository for database operations.

use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::entities::{Gender, Identity, NewIdentity, Provider};
use crate::types::{db_timestamp, parse_db_timestamp, DatabaseError, DatabaseResult};

const IDENTITY_COLUMNS: &str = "id, public_id, login_id, password_hash, email, phone_number, \
     display_name, gender, provider, provider_subject_id, device_token, created_at, updated_at";

/// Repository for identity rows. Every lookup ignores soft-deleted rows.
#[derive(Clone)]
pub struct IdentityRepository {
    pool: SqlitePool,
}

impl IdentityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Identity>> {
        let sql = format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE id = ? AND deleted_at IS NULL"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_identity).transpose()
    }

    pub async fn find_by_phone(&self, phone_number: &str) -> DatabaseResult<Option<Identity>> {
        let sql = format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE phone_number = ? AND deleted_at IS NULL"
        );
        let row = sqlx::query(&sql)
            .bind(phone_number)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_identity).transpose()
    }

    pub async fn find_by_login_id(&self, login_id: &str) -> DatabaseResult<Option<Identity>> {
        let sql = format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE login_id = ? AND deleted_at IS NULL"
        );
        let row = sqlx::query(&sql)
            .bind(login_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_identity).transpose()
    }

    /// Single lookup for identities colliding with a social signup, either on
    /// the phone number or on the provider's subject id.
    pub async fn find_by_phone_or_provider_subject(
        &self,
        phone_number: &str,
        provider: Provider,
        provider_subject_id: &str,
    ) -> DatabaseResult<Vec<Identity>> {
        let sql = format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities \
             WHERE deleted_at IS NULL \
               AND (phone_number = ? OR (provider = ? AND provider_subject_id = ?))"
        );
        let rows = sqlx::query(&sql)
            .bind(phone_number)
            .bind(provider.as_str())
            .bind(provider_subject_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_identity).collect()
    }

    /// Insert a new identity. UNIQUE violations come back as
    /// [`DatabaseError::UniqueViolation`] naming the colliding column.
    pub async fn create(&self, request: &NewIdentity) -> DatabaseResult<Identity> {
        let now = db_timestamp(Utc::now());
        let public_id = cuid2::create_id();

        let result = sqlx::query(
            r#"
            INSERT INTO identities (
                public_id, login_id, password_hash, email, phone_number, display_name,
                gender, provider, provider_subject_id, device_token, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&public_id)
        .bind(&request.login_id)
        .bind(&request.password_hash)
        .bind(&request.email)
        .bind(&request.phone_number)
        .bind(&request.display_name)
        .bind(request.gender.code())
        .bind(request.provider.as_str())
        .bind(&request.provider_subject_id)
        .bind(&request.device_token)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_write)?;

        let identity_id = result.last_insert_rowid();
        self.find_by_id(identity_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("identity {identity_id} after insert")))
    }

    /// Replace the stored push token. Returns `false` when no live identity
    /// has this id.
    pub async fn update_device_token(&self, id: i64, device_token: &str) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "UPDATE identities SET device_token = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(device_token)
        .bind(db_timestamp(Utc::now()))
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_recent(&self, limit: u32) -> DatabaseResult<Vec<Identity>> {
        let sql = format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE deleted_at IS NULL \
             ORDER BY id DESC LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_identity).collect()
    }
}

fn map_identity(row: &SqliteRow) -> DatabaseResult<Identity> {
    let gender_code: i64 = row.try_get("gender")?;
    let provider: String = row.try_get("provider")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Identity {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        login_id: row.try_get("login_id")?,
        password_hash: row.try_get("password_hash")?,
        email: row.try_get("email")?,
        phone_number: row.try_get("phone_number")?,
        display_name: row.try_get("display_name")?,
        gender: Gender::from_code(gender_code)
            .ok_or_else(|| DatabaseError::CorruptRow(format!("gender code {gender_code}")))?,
        provider: Provider::parse(&provider)
            .ok_or_else(|| DatabaseError::CorruptRow(format!("provider {provider}")))?,
        provider_subject_id: row.try_get("provider_subject_id")?,
        device_token: row.try_get("device_token")?,
        created_at: parse_db_timestamp(&created_at)?,
        updated_at: parse_db_timestamp(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::migrated_pool;
    use crate::types::UniqueColumn;

    fn local(login_id: &str, phone: &str) -> NewIdentity {
        NewIdentity {
            login_id: Some(login_id.to_string()),
            password_hash: Some("$argon2id$stub".to_string()),
            email: None,
            phone_number: phone.to_string(),
            display_name: "Tester".to_string(),
            gender: Gender::Unspecified,
            provider: Provider::Local,
            provider_subject_id: None,
            device_token: None,
        }
    }

    fn social(provider: Provider, subject: &str, phone: &str) -> NewIdentity {
        NewIdentity {
            login_id: None,
            password_hash: None,
            email: Some("social@example.com".to_string()),
            phone_number: phone.to_string(),
            display_name: "Social".to_string(),
            gender: Gender::Female,
            provider,
            provider_subject_id: Some(subject.to_string()),
            device_token: Some("push-token".to_string()),
        }
    }

    #[tokio::test]
    async fn create_and_find_by_every_key() {
        let (pool, _dir) = migrated_pool().await;
        let repo = IdentityRepository::new(pool);

        let created = repo.create(&local("alice01", "01012345678")).await.unwrap();
        assert!(!created.public_id.is_empty());
        assert_eq!(created.provider, Provider::Local);

        let by_phone = repo.find_by_phone("01012345678").await.unwrap().unwrap();
        let by_login = repo.find_by_login_id("alice01").await.unwrap().unwrap();
        assert_eq!(by_phone.id, created.id);
        assert_eq!(by_login.id, created.id);
        assert!(repo.find_by_phone("01099999999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unique_violations_name_the_column() {
        let (pool, _dir) = migrated_pool().await;
        let repo = IdentityRepository::new(pool);

        repo.create(&local("alice01", "01012345678")).await.unwrap();

        let same_phone = repo.create(&local("bob0001", "01012345678")).await;
        assert!(matches!(
            same_phone,
            Err(DatabaseError::UniqueViolation { column: UniqueColumn::PhoneNumber })
        ));

        let same_login = repo.create(&local("alice01", "01087654321")).await;
        assert!(matches!(
            same_login,
            Err(DatabaseError::UniqueViolation { column: UniqueColumn::LoginId })
        ));

        repo.create(&social(Provider::Kakao, "k-1", "01055550000"))
            .await
            .unwrap();
        let same_subject = repo.create(&social(Provider::Kakao, "k-1", "01055550001")).await;
        assert!(matches!(
            same_subject,
            Err(DatabaseError::UniqueViolation { column: UniqueColumn::ProviderSubject })
        ));

        // the same subject under another provider is a different account
        repo.create(&social(Provider::Naver, "k-1", "01055550002"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn credential_rule_is_enforced_by_storage() {
        let (pool, _dir) = migrated_pool().await;
        let repo = IdentityRepository::new(pool);

        let mut both = social(Provider::Naver, "n-1", "01011112222");
        both.password_hash = Some("$argon2id$stub".to_string());
        assert!(repo.create(&both).await.is_err());

        let mut neither = local("carol01", "01011113333");
        neither.password_hash = None;
        assert!(repo.create(&neither).await.is_err());
    }

    #[tokio::test]
    async fn phone_or_subject_lookup_returns_both_kinds_of_match() {
        let (pool, _dir) = migrated_pool().await;
        let repo = IdentityRepository::new(pool);

        repo.create(&local("alice01", "01012345678")).await.unwrap();
        repo.create(&social(Provider::Naver, "n-7", "01099998888"))
            .await
            .unwrap();

        let matches = repo
            .find_by_phone_or_provider_subject("01012345678", Provider::Naver, "n-7")
            .await
            .unwrap();
        assert_eq!(matches.len(), 2);

        let none = repo
            .find_by_phone_or_provider_subject("01000000000", Provider::Kakao, "n-7")
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn soft_deleted_rows_are_invisible_and_free_their_keys() {
        let (pool, _dir) = migrated_pool().await;
        let repo = IdentityRepository::new(pool.clone());

        let created = repo.create(&local("alice01", "01012345678")).await.unwrap();
        sqlx::query("UPDATE identities SET deleted_at = ? WHERE id = ?")
            .bind(db_timestamp(Utc::now()))
            .bind(created.id)
            .execute(&pool)
            .await
            .unwrap();

        assert!(repo.find_by_phone("01012345678").await.unwrap().is_none());
        repo.create(&local("alice01", "01012345678")).await.unwrap();
    }

    #[tokio::test]
    async fn update_device_token_reports_missing_identity() {
        let (pool, _dir) = migrated_pool().await;
        let repo = IdentityRepository::new(pool);

        let created = repo.create(&local("alice01", "01012345678")).await.unwrap();
        assert!(repo.update_device_token(created.id, "fcm-abc").await.unwrap());
        assert!(!repo.update_device_token(created.id + 100, "fcm-abc").await.unwrap());

        let reloaded = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(reloaded.device_token.as_deref(), Some("fcm-abc"));
    }
}
