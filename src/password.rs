//! Password hashing and session token utilities
//!
//! Passwords are stored as PBKDF2-HMAC-SHA256 digests in the self-describing
//! form `pbkdf2-sha256$<iterations>$<salt>$<hash>` (standard base64, no
//! padding). Session tokens are random URL-safe strings; only their SHA-256
//! hex digest is persisted.

use base64::{
    Engine,
    engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD},
};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tokio::task::{JoinError, spawn_blocking};

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;
const TOKEN_LEN: usize = 32;

/// Password hashing error types
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("invalid password hash format")]
    InvalidFormat,
    #[error("iteration count must be positive")]
    InvalidIterations,
    #[error("hashing task failed: {0}")]
    Task(#[from] JoinError),
}

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str, iterations: u32) -> Result<String, PasswordError> {
    if iterations == 0 {
        return Err(PasswordError::InvalidIterations);
    }

    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let hash = pbkdf2_sha256(password.as_bytes(), &salt, iterations);

    Ok(format!(
        "{SCHEME}${iterations}${}${}",
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    ))
}

/// Check `password` against an encoded hash in constant time.
///
/// Malformed hashes are an error rather than a mismatch so that corrupt
/// rows surface in logs.
pub fn verify_password(password: &str, encoded: &str) -> Result<bool, PasswordError> {
    let mut parts = encoded.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(PasswordError::InvalidFormat);
    };

    if scheme != SCHEME {
        return Err(PasswordError::InvalidFormat);
    }

    let iterations: u32 = iterations
        .parse()
        .map_err(|_| PasswordError::InvalidFormat)?;
    if iterations == 0 {
        return Err(PasswordError::InvalidIterations);
    }

    let salt = STANDARD_NO_PAD
        .decode(salt)
        .map_err(|_| PasswordError::InvalidFormat)?;
    let expected = STANDARD_NO_PAD
        .decode(expected)
        .map_err(|_| PasswordError::InvalidFormat)?;

    let actual = pbkdf2_sha256(password.as_bytes(), &salt, iterations);

    Ok(actual.as_slice().ct_eq(expected.as_slice()).into())
}

/// [`hash_password`] on the blocking pool, keeping runtime workers free.
pub async fn hash_password_async(password: String, iterations: u32) -> Result<String, PasswordError> {
    spawn_blocking(move || hash_password(&password, iterations)).await?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_async(password: String, encoded: String) -> Result<bool, PasswordError> {
    spawn_blocking(move || verify_password(&password, &encoded)).await?
}

/// A well-formed hash no password matches. Verifying against it costs the
/// same as a real check, so unknown accounts take as long as wrong passwords.
pub fn dummy_hash(iterations: u32) -> String {
    format!(
        "{SCHEME}${}${}${}",
        iterations.max(1),
        STANDARD_NO_PAD.encode([0u8; SALT_LEN]),
        STANDARD_NO_PAD.encode([0u8; HASH_LEN])
    )
}

/// Generate a new opaque session token.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; TOKEN_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest under which a session token is stored.
pub fn hash_session_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn pbkdf2_sha256(password: &[u8], salt: &[u8], iterations: u32) -> [u8; HASH_LEN] {
    let mut output = [0u8; HASH_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut output);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: u32 = 1_000;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("password123", FAST).unwrap();

        assert!(hash.starts_with("pbkdf2-sha256$1000$"));
        assert!(verify_password("password123", &hash).unwrap());
        assert!(!verify_password("password124", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same", FAST).unwrap();
        let b = hash_password("same", FAST).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rfc7914_vector() {
        // PBKDF2-HMAC-SHA256 test vector from RFC 7914 §11 (first 32 bytes).
        let derived = pbkdf2_sha256(b"passwd", b"salt", 1);
        assert_eq!(
            hex::encode(derived),
            "55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc"
        );
    }

    #[test]
    fn test_malformed_hash_rejected() {
        for bad in [
            "",
            "plaintext",
            "bcrypt$10$abc$def",
            "pbkdf2-sha256$abc$c2FsdA$aGFzaA",
            "pbkdf2-sha256$0$c2FsdA$aGFzaA",
            "pbkdf2-sha256$1000$c2FsdA$aGFzaA$extra",
            "pbkdf2-sha256$1000$!!!$aGFzaA",
        ] {
            assert!(verify_password("x", bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_zero_iterations_rejected() {
        assert!(matches!(
            hash_password("pw", 0),
            Err(PasswordError::InvalidIterations)
        ));
    }

    #[test]
    fn test_dummy_hash_never_matches() {
        let dummy = dummy_hash(FAST);

        assert!(dummy.starts_with("pbkdf2-sha256$1000$"));
        assert!(!verify_password("", &dummy).unwrap());
        assert!(!verify_password("password123", &dummy).unwrap());
    }

    #[tokio::test]
    async fn test_async_variants_run_off_the_runtime() {
        let hash = hash_password_async("password123".into(), FAST).await.unwrap();

        assert!(verify_password_async("password123".into(), hash.clone()).await.unwrap());
        assert!(!verify_password_async("nope".into(), hash).await.unwrap());
        assert!(verify_password_async("x".into(), "garbage".into()).await.is_err());
    }

    #[test]
    fn test_session_tokens_are_unique_and_url_safe() {
        let a = generate_session_token();
        let b = generate_session_token();

        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(
            a.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_token_hash_is_stable_hex() {
        let digest = hash_session_token("abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash_session_token("abc"), digest);
    }
}
