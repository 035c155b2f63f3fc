//! Configuration for the login endpoint.

use serde::{Deserialize, Serialize};

/// Login endpoint configuration (`[credential_auth]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialAuthConfig {
    /// Whether the gateway serves the login endpoint itself.
    pub enabled: bool,

    /// Path that accepts `POST` login requests.
    pub login_path: String,

    /// Users served by the built-in directory.
    pub users: Vec<UserEntry>,
}

impl Default for CredentialAuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            login_path: "/login".to_string(),
            users: Vec::new(),
        }
    }
}

impl CredentialAuthConfig {
    /// Add a user.
    #[must_use]
    pub fn with_user(mut self, user: UserEntry) -> Self {
        self.users.push(user);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !self.login_path.starts_with('/') {
            return Err(format!(
                "credential_auth.login_path '{}' must start with '/'",
                self.login_path
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for user in &self.users {
            if user.email.trim().is_empty() {
                return Err("credential_auth user email cannot be empty".to_string());
            }
            if user.user_id.trim().is_empty() {
                return Err(format!("user '{}' has an empty user_id", user.email));
            }
            if !seen.insert(user.email.as_str()) {
                return Err(format!("duplicate user '{}'", user.email));
            }
        }

        Ok(())
    }
}

/// A user of the built-in directory.
///
/// ```toml
/// [[credential_auth.users]]
/// email = "u1@example.com"
/// password_hash = "$argon2id$v=19$m=19456,t=2,p=1$..."
/// user_id = "u1"
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    /// Login email.
    pub email: String,

    /// PHC-format argon2 hash of the password.
    pub password_hash: String,

    /// Canonical user identifier placed in the token subject.
    pub user_id: String,
}

impl std::fmt::Debug for UserEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserEntry")
            .field("email", &self.email)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str, user_id: &str) -> UserEntry {
        UserEntry {
            email: email.to_string(),
            password_hash: "$argon2id$v=19$m=1024,t=1,p=1$c2FsdHNhbHQ$aGFzaA".to_string(),
            user_id: user_id.to_string(),
        }
    }

    #[test]
    fn test_defaults() {
        let config = CredentialAuthConfig::default();
        assert!(config.enabled);
        assert_eq!(config.login_path, "/login");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let mut config = CredentialAuthConfig::default();
        config.login_path = "login".to_string();
        assert!(config.validate().is_err());

        let config = CredentialAuthConfig::default()
            .with_user(user("a@example.com", "u1"))
            .with_user(user("a@example.com", "u2"));
        assert!(config.validate().is_err());

        let config = CredentialAuthConfig::default().with_user(user("a@example.com", ""));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_hides_hash() {
        let debug = format!("{:?}", user("a@example.com", "u1"));
        assert!(debug.contains("a@example.com"));
        assert!(!debug.contains("argon2"));
    }
}
