//! Password hashing and reset tokens.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::{OsRng, RngCore},
    },
};
use sha2::{Digest, Sha256};

use crate::error::{UserError, UserResult};

/// Random bytes in a password reset token.
const RESET_TOKEN_BYTES: usize = 32;

pub fn hash_password(password: &str) -> UserResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash(e.to_string()))
}

/// False for a wrong password; an unparsable stored hash is an error.
pub fn verify_password(password: &str, hash: &str) -> UserResult<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// A fresh reset token as `(raw, hashed)`. The raw token goes into the email,
/// only the hash is stored.
pub fn new_reset_token() -> (String, String) {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let raw = const_hex::encode(bytes);
    let hashed = hash_reset_token(&raw);
    (raw, hashed)
}

/// SHA-256 of the raw token, hex encoded.
pub fn hash_reset_token(raw: &str) -> String {
    const_hex::encode(Sha256::digest(raw.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("pass1234").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("pass1234", &hash).unwrap());
        assert!(!verify_password("pass12345", &hash).unwrap());
    }

    #[test]
    fn test_same_password_different_salt() {
        let first = hash_password("pass1234").unwrap();
        let second = hash_password("pass1234").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        assert!(matches!(
            verify_password("pass1234", "not-a-hash"),
            Err(UserError::PasswordHash(_))
        ));
    }

    #[test]
    fn test_reset_token_shape() {
        let (raw, hashed) = new_reset_token();
        assert_eq!(raw.len(), 64);
        assert_eq!(hashed.len(), 64);
        assert_ne!(raw, hashed);
        assert_eq!(hash_reset_token(&raw), hashed);
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            hash_reset_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
