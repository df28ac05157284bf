//! Password hashing and bearer-token issuance.
//!
//! Passwords are hashed with Argon2id over a random 16-byte salt; the
//! stored form is `base64(salt)$base64(digest)`. Tokens are
//! `base64url(claims)"."base64url(hmac-sha256(claims))` with an expiry
//! timestamp inside the claims. The HMAC key comes from
//! `MENTORMESH_TOKEN_SECRET` or, absent that, is generated per process
//! (tokens then die with the process).

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Tokens outlive a working session but not a redeploy cycle.
const TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("random generator unavailable")]
    Rng,

    #[error("password hashing failed: {0}")]
    Hash(argon2::Error),

    #[error("token signing failed")]
    Sign,
}

/// What a token asserts: which user, valid until when (unix seconds).
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    id: u64,
    exp: u64,
}

/// Signing key for bearer tokens. Cheap to clone; shared across handlers.
#[derive(Clone)]
pub struct AuthKeys {
    key: Arc<Vec<u8>>,
}

impl AuthKeys {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            key: Arc::new(secret.into()),
        }
    }

    /// Key from `MENTORMESH_TOKEN_SECRET`, or a fresh random one.
    pub fn from_env() -> Result<Self, AuthError> {
        if let Ok(secret) = std::env::var("MENTORMESH_TOKEN_SECRET") {
            return Ok(Self::new(secret.into_bytes()));
        }
        let rng = SystemRandom::new();
        let mut secret = vec![0u8; 32];
        rng.fill(&mut secret).map_err(|_| AuthError::Rng)?;
        Ok(Self::new(secret))
    }

    /// Issue a signed token asserting `user_id` for the next [`TOKEN_TTL`].
    pub fn mint(&self, user_id: u64) -> Result<String, AuthError> {
        let claims = Claims {
            id: user_id,
            exp: now_secs() + TOKEN_TTL.as_secs(),
        };
        let payload = serde_json::to_vec(&claims).map_err(|_| AuthError::Sign)?;

        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|_| AuthError::Sign)?;
        mac.update(&payload);
        let tag = mac.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(tag)
        ))
    }

    /// The user id a token asserts, or `None` for anything malformed,
    /// tampered with, or expired.
    pub fn verify(&self, token: &str) -> Option<u64> {
        let (payload_b64, tag_b64) = token.split_once('.')?;
        let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
        let tag = URL_SAFE_NO_PAD.decode(tag_b64).ok()?;

        let mut mac = HmacSha256::new_from_slice(&self.key).ok()?;
        mac.update(&payload);
        mac.verify_slice(&tag).ok()?;

        let claims: Claims = serde_json::from_slice(&payload).ok()?;
        if claims.exp < now_secs() {
            return None;
        }
        Some(claims.id)
    }
}

/// Hash a clear-text password for storage.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; 16];
    rng.fill(&mut salt).map_err(|_| AuthError::Rng)?;

    let digest = digest_password(password.as_bytes(), &salt)?;
    Ok(format!(
        "{}${}",
        STANDARD.encode(salt),
        STANDARD.encode(digest)
    ))
}

/// Check a clear-text password against a stored `salt$digest` hash.
/// Comparison is constant-time; any parse failure is just a mismatch.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_b64, digest_b64)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (STANDARD.decode(salt_b64), STANDARD.decode(digest_b64)) else {
        return false;
    };
    let Ok(digest) = digest_password(password.as_bytes(), &salt) else {
        return false;
    };
    ring::constant_time::verify_slices_are_equal(&digest, &expected).is_ok()
}

fn digest_password(password: &[u8], salt: &[u8]) -> Result<[u8; 32], AuthError> {
    let mut output = [0u8; 32];
    argon2::Argon2::default()
        .hash_password_into(password, salt, &mut output)
        .map_err(AuthError::Hash)?;
    Ok(output)
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_roundtrip_verifies() {
        let hash = hash_password("Test123").unwrap();
        assert!(verify_password("Test123", &hash));
        assert!(!verify_password("Test124", &hash));
    }

    #[test]
    fn password_hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-stored-hash"));
        assert!(!verify_password("anything", "bad$base64"));
    }

    #[test]
    fn token_roundtrip() {
        let keys = AuthKeys::new(b"test-secret".to_vec());
        let token = keys.mint(42).unwrap();
        assert_eq!(keys.verify(&token), Some(42));
    }

    #[test]
    fn token_rejected_with_wrong_key() {
        let keys = AuthKeys::new(b"test-secret".to_vec());
        let other = AuthKeys::new(b"other-secret".to_vec());
        let token = keys.mint(42).unwrap();
        assert_eq!(other.verify(&token), None);
    }

    #[test]
    fn token_rejected_when_tampered() {
        let keys = AuthKeys::new(b"test-secret".to_vec());
        let mut token = keys.mint(42).unwrap();
        token.replace_range(0..1, "x");
        assert_eq!(keys.verify(&token), None);
    }

    #[test]
    fn malformed_token_rejected() {
        let keys = AuthKeys::new(b"test-secret".to_vec());
        assert_eq!(keys.verify("no-dot-in-here"), None);
        assert_eq!(keys.verify(""), None);
    }
}
