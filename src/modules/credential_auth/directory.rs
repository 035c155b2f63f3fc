//! Credential verification and user lookup capabilities.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::debug;

use super::config::UserEntry;
use super::error::{CredentialAuthError, CredentialAuthResult};

/// An identity whose credentials were accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Canonical login name (the email).
    pub subject: String,
}

/// Why credentials were not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationFailure {
    /// No account for this email.
    #[error("unknown user")]
    UnknownUser,

    /// The password does not match.
    #[error("wrong password")]
    WrongPassword,

    /// The capability could not answer.
    #[error("verifier unavailable: {0}")]
    Unavailable(String),
}

/// Why a user id could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// No user record for this subject.
    #[error("user not found: {0}")]
    NotFound(String),

    /// The capability could not answer.
    #[error("lookup unavailable: {0}")]
    Unavailable(String),
}

/// Checks an email/password pair.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Verify the credentials.
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<VerifiedIdentity, VerificationFailure>;
}

/// Resolves the canonical user id for a verified subject.
#[async_trait]
pub trait UserLookup: Send + Sync {
    /// Look up the user id.
    async fn lookup_user_id(&self, subject: &str) -> Result<String, LookupError>;
}

#[derive(Clone)]
struct UserRecord {
    password_hash: String,
    user_id: String,
}

/// Password checked against the decoy hash for unknown emails.
const DECOY_PASSWORD: &str = "edge-guard-decoy-password";

/// In-memory implementation of both capabilities backed by argon2 hashes.
///
/// Unknown emails are checked against a decoy hash with the same cost
/// parameters as the stored users, so both failure paths pay for argon2.
#[derive(Clone, Default)]
pub struct InMemoryDirectory {
    users: Arc<HashMap<String, UserRecord>>,
    decoy_hash: Arc<OnceLock<String>>,
}

impl std::fmt::Debug for InMemoryDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDirectory")
            .field("users", &self.users.len())
            .finish()
    }
}

impl InMemoryDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the directory from configured users.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored hash is not a valid PHC string.
    pub fn from_entries(entries: &[UserEntry]) -> CredentialAuthResult<Self> {
        let mut users = HashMap::with_capacity(entries.len());

        for entry in entries {
            PasswordHash::new(&entry.password_hash).map_err(|e| {
                CredentialAuthError::InvalidConfig(format!(
                    "user '{}': invalid password hash: {e}",
                    entry.email
                ))
            })?;

            users.insert(
                entry.email.clone(),
                UserRecord {
                    password_hash: entry.password_hash.clone(),
                    user_id: entry.user_id.clone(),
                },
            );
        }

        Ok(Self {
            users: Arc::new(users),
            decoy_hash: Arc::default(),
        })
    }

    /// Add a user with an already-hashed password.
    #[must_use]
    pub fn with_user_hash(
        self,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        let mut users = Arc::unwrap_or_clone(self.users);
        users.insert(
            email.into(),
            UserRecord {
                password_hash: password_hash.into(),
                user_id: user_id.into(),
            },
        );
        Self {
            users: Arc::new(users),
            decoy_hash: Arc::default(),
        }
    }

    /// Get the number of users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Check if the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Get the decoy hash, creating it on first use.
    fn decoy_hash(&self) -> Result<String, String> {
        if let Some(hash) = self.decoy_hash.get() {
            return Ok(hash.clone());
        }

        // Mirror the cost of a stored hash, else the defaults
        let params = self
            .users
            .values()
            .find_map(|record| PasswordHash::new(&record.password_hash).ok())
            .and_then(|parsed| Params::try_from(&parsed).ok())
            .unwrap_or_default();
        let hash = hash_password_with(
            DECOY_PASSWORD,
            &Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        )
        .map_err(|e| e.to_string())?;

        Ok(self.decoy_hash.get_or_init(|| hash).clone())
    }
}

/// Hash a password with the default argon2id parameters.
///
/// # Errors
///
/// Returns an error if hashing fails.
pub fn hash_password(password: &str) -> CredentialAuthResult<String> {
    hash_password_with(password, &Argon2::default())
}

/// Hash a password with explicit argon2id cost parameters.
///
/// # Errors
///
/// Returns an error if the parameters are out of range or hashing fails.
pub fn hash_password_with_params(
    password: &str,
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
) -> CredentialAuthResult<String> {
    let params = Params::new(memory_kib, iterations, parallelism, None)
        .map_err(|e| CredentialAuthError::PasswordHash(e.to_string()))?;
    hash_password_with(
        password,
        &Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
    )
}

fn hash_password_with(password: &str, argon2: &Argon2<'_>) -> CredentialAuthResult<String> {
    let salt_bytes: [u8; 16] = rand::random();
    let salt = SaltString::encode_b64(&salt_bytes)?;
    Ok(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Check a password against a PHC hash. Cost parameters come from the hash.
fn verify_password(password: &str, password_hash: &str) -> Result<bool, String> {
    let parsed = PasswordHash::new(password_hash).map_err(|e| e.to_string())?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e.to_string()),
    }
}

#[async_trait]
impl CredentialVerifier for InMemoryDirectory {
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<VerifiedIdentity, VerificationFailure> {
        let password = password.to_string();
        let stored_hash = self
            .users
            .get(email)
            .map(|record| record.password_hash.clone());
        let directory = self.clone();

        // argon2 is CPU-bound. `None` means the email is unknown.
        let verified = tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => verify_password(&password, &hash).map(Some),
            None => {
                let decoy = directory.decoy_hash()?;
                verify_password(&password, &decoy).map(|_| None)
            },
        })
        .await
        .map_err(|e| VerificationFailure::Unavailable(e.to_string()))?
        .map_err(VerificationFailure::Unavailable)?;

        match verified {
            Some(true) => Ok(VerifiedIdentity {
                subject: email.to_string(),
            }),
            Some(false) => {
                debug!(email = %email, "Password mismatch");
                Err(VerificationFailure::WrongPassword)
            },
            None => {
                debug!(email = %email, "Unknown user");
                Err(VerificationFailure::UnknownUser)
            },
        }
    }
}

#[async_trait]
impl UserLookup for InMemoryDirectory {
    async fn lookup_user_id(&self, subject: &str) -> Result<String, LookupError> {
        self.users
            .get(subject)
            .map(|record| record.user_id.clone())
            .ok_or_else(|| LookupError::NotFound(subject.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_hash(password: &str) -> String {
        hash_password_with_params(password, 1024, 1, 1).unwrap()
    }

    fn directory() -> InMemoryDirectory {
        InMemoryDirectory::new().with_user_hash("u1@example.com", cheap_hash("correct-horse"), "u1")
    }

    #[test]
    fn test_hash_format() {
        let hash = cheap_hash("pw");
        assert!(hash.starts_with("$argon2id$v=19$m=1024,t=1,p=1$"));
        assert_ne!(hash, cheap_hash("pw"), "salts must differ");
    }

    #[tokio::test]
    async fn test_verify_credentials() {
        let directory = directory();

        let identity = directory
            .verify_credentials("u1@example.com", "correct-horse")
            .await
            .unwrap();
        assert_eq!(identity.subject, "u1@example.com");

        assert_eq!(
            directory
                .verify_credentials("u1@example.com", "wrong")
                .await
                .unwrap_err(),
            VerificationFailure::WrongPassword
        );
        assert_eq!(
            directory
                .verify_credentials("nobody@example.com", "correct-horse")
                .await
                .unwrap_err(),
            VerificationFailure::UnknownUser
        );
    }

    #[tokio::test]
    async fn test_unknown_user_checked_against_decoy() {
        let directory = directory();
        assert!(directory.decoy_hash.get().is_none());

        assert_eq!(
            directory
                .verify_credentials("nobody@example.com", DECOY_PASSWORD)
                .await
                .unwrap_err(),
            VerificationFailure::UnknownUser
        );

        // The decoy was hashed and verified with the stored users' cost
        let decoy = directory.decoy_hash.get().unwrap();
        assert!(decoy.starts_with("$argon2id$v=19$m=1024,t=1,p=1$"));

        // Reused on later misses
        let again = directory.decoy_hash().unwrap();
        assert_eq!(&again, decoy);
    }

    #[tokio::test]
    async fn test_decoy_uses_default_cost_for_empty_directory() {
        let directory = InMemoryDirectory::new();
        assert_eq!(
            directory
                .verify_credentials("nobody@example.com", "pw")
                .await
                .unwrap_err(),
            VerificationFailure::UnknownUser
        );

        let decoy = directory.decoy_hash.get().unwrap();
        let default_cost = format!(
            "$argon2id$v=19$m={},t={},p={}$",
            Params::DEFAULT_M_COST,
            Params::DEFAULT_T_COST,
            Params::DEFAULT_P_COST
        );
        assert!(decoy.starts_with(&default_cost));
    }

    #[tokio::test]
    async fn test_lookup_user_id() {
        let directory = directory();
        assert_eq!(directory.lookup_user_id("u1@example.com").await.unwrap(), "u1");
        assert_eq!(
            directory.lookup_user_id("nobody@example.com").await.unwrap_err(),
            LookupError::NotFound("nobody@example.com".to_string())
        );
    }

    #[test]
    fn test_from_entries() {
        let entries = vec![UserEntry {
            email: "u1@example.com".to_string(),
            password_hash: cheap_hash("pw"),
            user_id: "u1".to_string(),
        }];
        let directory = InMemoryDirectory::from_entries(&entries).unwrap();
        assert_eq!(directory.len(), 1);

        let entries = vec![UserEntry {
            email: "u1@example.com".to_string(),
            password_hash: "plain-text".to_string(),
            user_id: "u1".to_string(),
        }];
        assert!(matches!(
            InMemoryDirectory::from_entries(&entries),
            Err(CredentialAuthError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_corrupt_hash_is_unavailable() {
        let directory =
            InMemoryDirectory::new().with_user_hash("u1@example.com", "not-a-phc-string", "u1");

        assert!(matches!(
            directory.verify_credentials("u1@example.com", "pw").await,
            Err(VerificationFailure::Unavailable(_))
        ));
    }
}
