use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;

use crate::AuthError;

/// One-way credential digest. There is no recovery path from a digest back
/// to the plaintext.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, AuthError>;

    /// `Ok(false)` on a mismatch; `Err` only when `digest` is not a digest
    /// this hasher understands.
    fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AuthError>;
}

#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self.argon2.hash_password(plaintext.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(digest)?;
        Ok(self
            .argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_salted_and_verifiable() {
        let hasher = Argon2Hasher::new();

        let first = hasher.hash("s3cret!pass").unwrap();
        let second = hasher.hash("s3cret!pass").unwrap();

        assert!(first.starts_with("$argon2"));
        assert_ne!(first, second, "salts should differ per hash");
        assert!(!first.contains("s3cret!pass"));

        assert!(hasher.verify("s3cret!pass", &first).unwrap());
        assert!(!hasher.verify("wrong!pass1", &first).unwrap());
    }

    #[test]
    fn malformed_digest_is_an_error() {
        let hasher = Argon2Hasher::new();
        assert!(matches!(
            hasher.verify("anything", "plaintext-not-a-digest"),
            Err(AuthError::PasswordHash(_))
        ));
    }
}
