//! The two failure kinds of the account core.

use homelink_database::Provider;
use thiserror::Error;
use tracing::error;

pub type AccountResult<T> = Result<T, AccountError>;

#[derive(Debug, Error)]
pub enum AccountError {
    /// Client-fixable. The display string is the reason shown to the caller.
    #[error("{0}")]
    Rejected(#[from] Rejection),

    /// A storage or collaborator failure the business rules did not
    /// anticipate. `source` is for diagnostics only.
    #[error("unexpected failure while {context}")]
    Unexpected {
        context: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl AccountError {
    pub fn unexpected(context: &'static str, source: impl Into<anyhow::Error>) -> Self {
        let source = source.into();
        error!(context, error = %format!("{source:#}"), "unexpected account failure");
        AccountError::Unexpected { context, source }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AccountError::Rejected(Rejection::Validation(message.into()))
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            AccountError::Rejected(rejection) => Some(rejection),
            AccountError::Unexpected { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("{0}")]
    Validation(String),

    #[error("phone number is not verified")]
    PhoneNotVerified,

    #[error("{}", phone_taken_message(.provider))]
    PhoneAlreadyRegistered { provider: Provider },

    #[error("id already exists")]
    LoginIdTaken,

    #[error("already registered")]
    SocialAccountExists,

    #[error("token expired, retry")]
    ProviderTokenExpired,

    #[error("no device token on file")]
    DeviceTokenMissing,

    #[error("invalid id or password")]
    InvalidCredentials,

    #[error("identity not found")]
    IdentityNotFound,
}

fn phone_taken_message(provider: &Provider) -> String {
    match provider {
        Provider::Local => "phone number is already registered".to_string(),
        social => format!("phone number is already registered via {social} login"),
    }
}

pub(crate) trait UnexpectedExt<T> {
    fn or_unexpected(self, context: &'static str) -> AccountResult<T>;
}

impl<T, E> UnexpectedExt<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn or_unexpected(self, context: &'static str) -> AccountResult<T> {
        self.map_err(|err| AccountError::unexpected(context, err))
    }
}
