// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Security module - password hashing, authentication, audit log

mod audit;
mod auth;

pub use audit::*;
pub use auth::*;

use sha2::{Digest, Sha256};

use crate::error::CounterError;

/// Lowercase hex SHA-256 of the password, unsalted so existing
/// credential rows stay comparable
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Compares in constant time over the stored hash length
pub fn verify_password(password: &str, hash: &str) -> bool {
    let computed = hash_password(password);
    if computed.len() != hash.len() {
        return false;
    }
    computed
        .bytes()
        .zip(hash.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Minimum length, one uppercase letter and one symbol
pub fn validate_password(password: &str, min_length: usize) -> Result<(), CounterError> {
    if password.chars().count() < min_length {
        return Err(CounterError::WeakPassword(format!(
            "password must be at least {} characters",
            min_length
        )));
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(CounterError::WeakPassword(
            "password must contain an uppercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| !c.is_alphanumeric()) {
        return Err(CounterError::WeakPassword(
            "password must contain a special character".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_lowercase_sha256_hex() {
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert!(verify_password("abc", &hash_password("abc")));
        assert!(!verify_password("abd", &hash_password("abc")));
    }

    #[test]
    fn test_verify_rejects_truncated_or_foreign_hash() {
        let hash = hash_password("Secret!1");
        assert!(verify_password("Secret!1", &hash));
        assert!(!verify_password("Secret!1", &hash[..63]));
        assert!(!verify_password("Secret!1", ""));
        assert!(!verify_password("Secret!1", &hash.to_uppercase()));
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("Secret!1", 8).is_ok());

        let short = validate_password("Se!1", 8).unwrap_err();
        assert!(short.to_string().contains("at least 8"));

        assert!(matches!(
            validate_password("secret!12", 8),
            Err(CounterError::WeakPassword(msg)) if msg.contains("uppercase")
        ));
        assert!(matches!(
            validate_password("Secret123", 8),
            Err(CounterError::WeakPassword(msg)) if msg.contains("special")
        ));
    }
}
