//! Administrator credentials store.
//!
//! A singleton JSON record next to the gateway config. The key names are
//! kept from earlier deployments (`admin_enabled`, `2fa_secret`, …) but the
//! password is stored as a salted argon2id PHC string, never a bare digest.
//! A first access with no file on disk writes a disabled-by-default record.

use std::path::{Path, PathBuf};

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, GatewayConfig};

pub const CREDENTIALS_FILE: &str = "admin.json";

/// Minimum accepted password length, enforced when a password is set.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum CredsError {
    #[error("Failed to read credentials: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse credentials: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The administrator record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminCredentials {
    /// Master switch for the whole admin surface. While false every admin
    /// route is a hard 403, sessions included.
    #[serde(rename = "admin_enabled", default)]
    pub enabled: bool,

    #[serde(rename = "admin_username", default = "default_username")]
    pub username: String,

    /// Argon2id PHC string; empty until a password has been set.
    #[serde(rename = "admin_password_hash", default)]
    pub password_hash: String,

    /// Only true once an enrollment code has been verified.
    #[serde(rename = "2fa_enabled", default)]
    pub totp_enabled: bool,

    /// Base32 (no padding) shared secret; empty when unset. May hold a
    /// pending, not-yet-verified secret while `totp_enabled` is false.
    #[serde(rename = "2fa_secret", default)]
    pub totp_secret: String,
}

fn default_username() -> String {
    "admin".to_string()
}

impl Default for AdminCredentials {
    fn default() -> Self {
        Self {
            enabled: false,
            username: default_username(),
            password_hash: String::new(),
            totp_enabled: false,
            totp_secret: String::new(),
        }
    }
}

impl AdminCredentials {
    /// Get credentials file path (same directory as the gateway config).
    pub fn credentials_path() -> Result<PathBuf, CredsError> {
        Ok(GatewayConfig::config_dir()?.join(CREDENTIALS_FILE))
    }

    /// Load the record, creating a disabled default on disk if absent.
    pub fn load_or_init(path: &Path) -> Result<Self, CredsError> {
        if !path.exists() {
            let creds = Self::default();
            creds.save_to(path)?;
            return Ok(creds);
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save the record (full overwrite).
    pub fn save_to(&self, path: &Path) -> Result<(), CredsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// First-factor check: panel enabled, username matches, password
    /// verifies against the stored hash.
    pub fn verify_login(&self, username: &str, password: &str) -> bool {
        self.enabled && username == self.username && verify_password(password, &self.password_hash)
    }

    /// Hash and store a new password, enforcing the length policy.
    pub fn set_password(&mut self, new_password: &str) -> Result<(), CredsError> {
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CredsError::WeakPassword);
        }
        self.password_hash = hash_password(new_password)?;
        Ok(())
    }
}

/// Hash a password using argon2id with a random salt.
pub fn hash_password(password: &str) -> Result<String, CredsError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredsError::Hash(e.to_string()))
}

/// Verify a password against a stored argon2id hash. An empty or
/// unparseable stored value (including digests from pre-argon2 installs)
/// simply fails verification.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
