//! Time-based one-time passcodes for the admin second factor.
//!
//! Standard 6-digit SHA-1 TOTP over a 30-second step, compatible with the
//! common authenticator apps. Verification accepts the current step and its
//! immediate neighbors to tolerate clock skew.

use std::time::{SystemTime, UNIX_EPOCH};

use data_encoding::BASE32_NOPAD;
use thiserror::Error;
use totp_rs::{Algorithm, Secret, TOTP};

/// Issuer shown in authenticator apps.
pub const ISSUER: &str = "WOL Gateway";

const DIGITS: usize = 6;
const STEP_SECONDS: u64 = 30;

#[derive(Debug, Error)]
pub enum TotpError {
    #[error("Invalid TOTP secret: {0}")]
    BadSecret(String),
}

/// Generate a fresh shared secret: 20 random bytes as unpadded base32.
pub fn generate_secret() -> String {
    let raw: [u8; 20] = rand::random();
    BASE32_NOPAD.encode(&raw)
}

/// A configured code generator/verifier for one account.
pub struct Totp {
    inner: TOTP,
}

impl Totp {
    /// Build from a stored base32 secret and the account label shown in
    /// authenticator apps.
    pub fn new(secret_b32: &str, account: &str) -> Result<Self, TotpError> {
        let bytes = Secret::Encoded(secret_b32.to_string())
            .to_bytes()
            .map_err(|e| TotpError::BadSecret(format!("{e:?}")))?;
        let inner = TOTP::new(
            Algorithm::SHA1,
            DIGITS,
            1,
            STEP_SECONDS,
            bytes,
            Some(ISSUER.to_string()),
            account.to_string(),
        )
        .map_err(|e| TotpError::BadSecret(format!("{e:?}")))?;
        Ok(Self { inner })
    }

    /// The `otpauth://` provisioning URI for QR codes and manual entry.
    pub fn otpauth_uri(&self) -> String {
        self.inner.get_url()
    }

    /// The code for an arbitrary Unix timestamp. Used when displaying or
    /// testing codes; verification goes through [`Totp::verify`].
    pub fn code_at(&self, time: u64) -> String {
        self.inner.generate(time)
    }

    /// Check a submitted code against the current step and its immediate
    /// neighbors (roughly a 90-second acceptance window).
    pub fn verify(&self, code: &str) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.verify_at(code, now)
    }

    fn verify_at(&self, code: &str, now: u64) -> bool {
        let code = code.trim();
        if code.len() != DIGITS || !code.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        for offset in [-(STEP_SECONDS as i64), 0, STEP_SECONDS as i64] {
            let time = now.saturating_add_signed(offset);
            if constant_time_eq(&self.inner.generate(time), code) {
                return true;
            }
        }
        false
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut acc: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        acc |= x ^ y;
    }
    acc == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: u64 = 1_700_000_000;

    fn totp() -> Totp {
        Totp::new(&generate_secret(), "admin").unwrap()
    }

    #[test]
    fn test_generated_secret_is_base32_of_20_bytes() {
        let secret = generate_secret();
        let raw = BASE32_NOPAD.decode(secret.as_bytes()).unwrap();
        assert_eq!(raw.len(), 20);
    }

    #[test]
    fn test_rejects_unparseable_secret() {
        assert!(Totp::new("not base32!", "admin").is_err());
    }

    #[test]
    fn test_verify_accepts_adjacent_steps() {
        let totp = totp();
        let code = totp.code_at(T);

        assert!(totp.verify_at(&code, T));
        assert!(totp.verify_at(&code, T + STEP_SECONDS));
        assert!(totp.verify_at(&code, T - STEP_SECONDS));
    }

    #[test]
    fn test_verify_rejects_stale_code() {
        let totp = totp();
        let stale = totp.code_at(T - 4 * STEP_SECONDS);
        // Codes repeat eventually; a stale code matching by chance would be
        // one-in-a-million, and the fixed timestamp keeps this deterministic.
        if stale != totp.code_at(T)
            && stale != totp.code_at(T - STEP_SECONDS)
            && stale != totp.code_at(T + STEP_SECONDS)
        {
            assert!(!totp.verify_at(&stale, T));
        }
    }

    #[test]
    fn test_verify_rejects_malformed_codes() {
        let totp = totp();
        for bad in ["", "12345", "1234567", "abcdef", "12 456"] {
            assert!(!totp.verify_at(bad, T), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_otpauth_uri_names_the_issuer() {
        let secret = generate_secret();
        let uri = Totp::new(&secret, "admin").unwrap().otpauth_uri();
        assert!(uri.starts_with("otpauth://totp/"));
        assert!(uri.contains("WOL%20Gateway"));
        assert!(uri.contains(&secret));
    }
}
