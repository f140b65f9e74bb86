//! Admin gate.
//!
//! A single username and argon2 password hash from the environment. There is
//! no admin account in the backend; passing the gate only sets a flag in the
//! visitor's session.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use secrecy::ExposeSecret;
use tracing::warn;

use crate::config::AdminConfig;

/// Verifies admin credentials.
#[derive(Debug, Clone)]
pub struct AdminGate {
    config: Option<AdminConfig>,
}

impl AdminGate {
    /// `None` disables admin login.
    #[must_use]
    pub const fn new(config: Option<AdminConfig>) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Whether `username` and `password` match the configured credentials.
    ///
    /// The password is always checked, even for a wrong username, so both
    /// failures take the same time.
    #[must_use]
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let Some(config) = &self.config else {
            warn!("Admin login attempted but no admin credentials are configured");
            return false;
        };

        let Ok(hash) = PasswordHash::new(config.password_hash.expose_secret()) else {
            warn!("ADMIN_PASSWORD_HASH is not a valid PHC string");
            return false;
        };
        let password_ok = Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok();

        password_ok && username == config.username
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};
    use secrecy::SecretString;

    use super::*;

    fn gate(password: &str) -> AdminGate {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string();
        AdminGate::new(Some(AdminConfig {
            username: "admin".to_string(),
            password_hash: SecretString::from(hash),
        }))
    }

    #[test]
    fn test_verify() {
        let gate = gate("s3cure-admin-pass");
        assert!(gate.verify("admin", "s3cure-admin-pass"));
        assert!(!gate.verify("admin", "wrong"));
        assert!(!gate.verify("root", "s3cure-admin-pass"));
    }

    #[test]
    fn test_disabled_gate_rejects_everything() {
        let gate = AdminGate::new(None);
        assert!(!gate.is_enabled());
        assert!(!gate.verify("admin", "anything"));
    }

    #[test]
    fn test_malformed_hash_rejects() {
        let gate = AdminGate::new(Some(AdminConfig {
            username: "admin".to_string(),
            password_hash: SecretString::from("plaintext"),
        }));
        assert!(!gate.verify("admin", "plaintext"));
    }
}
