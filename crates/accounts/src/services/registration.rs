//! Identity registration, login and profile maintenance.

use std::sync::Arc;

use homelink_auth::{CredentialHasher, SocialProvider, TokenIssuer, TokenTtl, TokenVerifier};
use homelink_database::{
    DatabaseError, Identity, IdentityRepository, NewIdentity, Provider, SqlitePool, UniqueColumn,
};
use tracing::{info, warn};

use crate::error::{AccountError, AccountResult, Rejection, UnexpectedExt};
use crate::repository::IdentityRepo;
use crate::types::{LocalSignupRequest, LoginRequest, SessionGrant, SocialSignupRequest};
use crate::validation;
use crate::verification::VerificationStore;

/// Creates identities after the cross-record checks pass and issues their
/// session tokens.
///
/// Creation is the commit point. The verification record is checked before
/// the insert and removed after it; a failed removal is logged and left to
/// the record's own expiry. The partial UNIQUE indexes on login id, phone
/// number and provider subject are the race backstop for the pre-flight
/// lookups, and their violations map back to the same rejections.
#[derive(Clone)]
pub struct RegistrationService {
    identities: Arc<dyn IdentityRepo>,
    verifications: Arc<dyn VerificationStore>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<dyn TokenIssuer>,
    social: Arc<dyn TokenVerifier>,
}

impl RegistrationService {
    pub fn new(
        pool: SqlitePool,
        verifications: Arc<dyn VerificationStore>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenIssuer>,
        social: Arc<dyn TokenVerifier>,
    ) -> Self {
        Self::with_repository(
            Arc::new(IdentityRepository::new(pool)),
            verifications,
            hasher,
            tokens,
            social,
        )
    }

    pub fn with_repository(
        identities: Arc<dyn IdentityRepo>,
        verifications: Arc<dyn VerificationStore>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenIssuer>,
        social: Arc<dyn TokenVerifier>,
    ) -> Self {
        Self {
            identities,
            verifications,
            hasher,
            tokens,
            social,
        }
    }

    pub async fn signup_local(&self, request: LocalSignupRequest) -> AccountResult<SessionGrant> {
        validation::validate_login_id(&request.login_id)?;
        validation::validate_password(&request.password)?;
        validation::validate_email(request.email.as_deref())?;
        validation::validate_phone_number(&request.phone_number)?;
        validation::validate_display_name(&request.display_name)?;
        let gender = validation::parse_gender(request.gender)?;
        validation::validate_device_token(request.device_token.as_deref())?;

        self.require_verified(&request.phone_number).await?;

        if let Some(existing) = self
            .identities
            .find_by_phone(&request.phone_number)
            .await
            .or_unexpected("looking up phone number")?
        {
            return Err(Rejection::PhoneAlreadyRegistered {
                provider: existing.provider,
            }
            .into());
        }

        if self
            .identities
            .find_by_login_id(&request.login_id)
            .await
            .or_unexpected("looking up login id")?
            .is_some()
        {
            return Err(Rejection::LoginIdTaken.into());
        }

        let password_hash = self
            .hasher
            .hash(&request.password)
            .or_unexpected("hashing password")?;

        let identity = self
            .create_identity(NewIdentity {
                login_id: Some(request.login_id),
                password_hash: Some(password_hash),
                email: request.email,
                phone_number: request.phone_number,
                display_name: request.display_name,
                gender,
                provider: Provider::Local,
                provider_subject_id: None,
                device_token: request.device_token,
            })
            .await?;

        self.issue_session(&identity, request.auto_login)
    }

    pub async fn signup_social(&self, request: SocialSignupRequest) -> AccountResult<SessionGrant> {
        validation::validate_email(request.email.as_deref())?;
        validation::validate_phone_number(&request.phone_number)?;
        validation::validate_display_name(&request.display_name)?;
        let gender = validation::parse_gender(request.gender)?;
        let provider = validation::parse_social_provider(&request.provider)?;
        validation::validate_access_token(&request.access_token)?;
        validation::validate_device_token(request.device_token.as_deref())?;

        let subject_id = self.exchange_access_token(&request.access_token, provider).await?;

        self.require_verified(&request.phone_number).await?;

        let matches = self
            .identities
            .find_by_phone_or_provider_subject(&request.phone_number, provider, &subject_id)
            .await
            .or_unexpected("looking up social collisions")?;

        if let Some(phone_match) = matches
            .iter()
            .find(|identity| identity.phone_number == request.phone_number)
        {
            return Err(Rejection::PhoneAlreadyRegistered {
                provider: phone_match.provider,
            }
            .into());
        }
        if !matches.is_empty() {
            return Err(Rejection::SocialAccountExists.into());
        }

        let identity = self
            .create_identity(NewIdentity {
                login_id: None,
                password_hash: None,
                email: request.email,
                phone_number: request.phone_number,
                display_name: request.display_name,
                gender,
                provider,
                provider_subject_id: Some(subject_id),
                device_token: request.device_token,
            })
            .await?;

        self.issue_session(&identity, request.auto_login)
    }

    /// Password login for local identities. Unknown ids, social-only
    /// identities and wrong passwords are indistinguishable to the caller.
    pub async fn login(&self, request: LoginRequest) -> AccountResult<SessionGrant> {
        if request.login_id.is_empty() || request.password.is_empty() {
            return Err(AccountError::validation("login id and password are required"));
        }

        let Some(identity) = self
            .identities
            .find_by_login_id(&request.login_id)
            .await
            .or_unexpected("looking up login id")?
        else {
            return Err(Rejection::InvalidCredentials.into());
        };

        let Some(digest) = identity.password_hash.as_deref() else {
            return Err(Rejection::InvalidCredentials.into());
        };

        let matches = self
            .hasher
            .verify(&request.password, digest)
            .or_unexpected("verifying password")?;
        if !matches {
            return Err(Rejection::InvalidCredentials.into());
        }

        info!(identity = %identity.public_id, "identity logged in");
        self.issue_session(&identity, request.auto_login)
    }

    pub async fn profile(&self, identity_id: i64) -> AccountResult<Identity> {
        self.identities
            .find_by_id(identity_id)
            .await
            .or_unexpected("loading identity")?
            .ok_or_else(|| Rejection::IdentityNotFound.into())
    }

    pub async fn update_device_token(&self, identity_id: i64, device_token: &str) -> AccountResult<()> {
        validation::validate_device_token(Some(device_token))?;

        let updated = self
            .identities
            .update_device_token(identity_id, device_token)
            .await
            .or_unexpected("updating device token")?;
        if !updated {
            return Err(Rejection::IdentityNotFound.into());
        }

        info!(identity_id, "device token updated");
        Ok(())
    }

    /// Resolve a session token to its identity id.
    pub fn authenticate(&self, token: &str) -> AccountResult<i64> {
        self.tokens
            .validate(token)
            .map_err(|_| Rejection::InvalidCredentials.into())
    }

    async fn require_verified(&self, phone_number: &str) -> AccountResult<()> {
        let verified = self
            .verifications
            .exists(phone_number)
            .await
            .or_unexpected("checking phone verification")?;
        if !verified {
            return Err(Rejection::PhoneNotVerified.into());
        }
        Ok(())
    }

    async fn exchange_access_token(
        &self,
        access_token: &str,
        provider: Provider,
    ) -> AccountResult<String> {
        let social_provider = match provider {
            Provider::Naver => SocialProvider::Naver,
            Provider::Kakao => SocialProvider::Kakao,
            Provider::Local => return Err(AccountError::validation("provider must be naver or kakao")),
        };

        match self.social.exchange(access_token, social_provider).await {
            Ok(Some(subject_id)) => Ok(subject_id),
            Ok(None) => Err(Rejection::ProviderTokenExpired.into()),
            Err(err) => {
                warn!(%provider, error = %err, "social token exchange failed");
                Err(Rejection::ProviderTokenExpired.into())
            }
        }
    }

    async fn create_identity(&self, request: NewIdentity) -> AccountResult<Identity> {
        let phone_number = request.phone_number.clone();

        let identity = match self.identities.create(&request).await {
            Ok(identity) => identity,
            Err(DatabaseError::UniqueViolation { column }) => {
                return Err(self.collision_rejection(column, &phone_number).await);
            }
            Err(err) => return Err(AccountError::unexpected("creating identity", err)),
        };

        info!(
            identity = %identity.public_id,
            provider = %identity.provider,
            "identity created"
        );

        if let Err(err) = self.verifications.delete(&phone_number).await {
            warn!(
                identity = %identity.public_id,
                error = %err,
                "failed to consume phone verification record; leaving it to expire"
            );
        }

        Ok(identity)
    }

    /// Rebuild the pre-flight rejection for a row that won a race past the
    /// lookups.
    async fn collision_rejection(&self, column: UniqueColumn, phone_number: &str) -> AccountError {
        match column {
            UniqueColumn::LoginId => Rejection::LoginIdTaken.into(),
            UniqueColumn::ProviderSubject => Rejection::SocialAccountExists.into(),
            UniqueColumn::PhoneNumber => {
                let provider = match self.identities.find_by_phone(phone_number).await {
                    Ok(Some(existing)) => existing.provider,
                    _ => Provider::Local,
                };
                Rejection::PhoneAlreadyRegistered { provider }.into()
            }
            UniqueColumn::PublicId | UniqueColumn::Other => AccountError::unexpected(
                "creating identity",
                DatabaseError::UniqueViolation { column },
            ),
        }
    }

    fn issue_session(&self, identity: &Identity, auto_login: bool) -> AccountResult<SessionGrant> {
        let issued = self
            .tokens
            .issue(identity.id, TokenTtl::for_auto_login(auto_login))
            .or_unexpected("issuing session token")?;

        Ok(SessionGrant {
            token: issued.token,
            expires_at: issued.expires_at,
            public_id: identity.public_id.clone(),
        })
    }
}
