//! Password hashing with argon2id

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Size of the random salt fed to argon2 in bytes
const SALT_SIZE: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("failed to gather salt entropy: {0}")]
    Entropy(getrandom::Error),
    #[error("failed to hash credential: {0}")]
    Hash(password_hash::Error),
    #[error("stored credential hash is malformed: {0}")]
    MalformedHash(password_hash::Error),
}

/// Hash `plaintext` into a self-describing PHC string.
pub fn hash_password(plaintext: &str) -> Result<String, PasswordError> {
    let mut salt_bytes = [0u8; SALT_SIZE];
    getrandom::getrandom(&mut salt_bytes).map_err(PasswordError::Entropy)?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(PasswordError::Hash)?;

    let hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(PasswordError::Hash)?;
    Ok(hash.to_string())
}

/// Check `plaintext` against a stored PHC string.
///
/// A mismatch is `Ok(false)`; only a corrupt stored hash or a hasher failure
/// is an error.
pub fn verify_password(plaintext: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored_hash).map_err(PasswordError::MalformedHash)?;
    match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Hash(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("S3cret!").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("S3cret!", &hash).unwrap());
        assert!(!verify_password("s3cret!", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        let result = verify_password("anything", "not-a-phc-string");
        assert!(matches!(result, Err(PasswordError::MalformedHash(_))));
    }
}
