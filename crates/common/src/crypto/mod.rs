//! Cryptographic primitives for stash
//!
//! Two concerns live here and nothing else touches key material:
//!
//! - **Credentials**: account passwords are stored as argon2id PHC strings
//!   (`password`). Plaintext never leaves the call that hashes or verifies it.
//! - **Capability tokens**: a `TokenService` holds the process signing key and
//!   issues HMAC-SHA256 signed, time-limited claims binding a login name and
//!   role (`token`).
//!
//! # Token format
//!
//! `base64url(json claims) "." base64url(hmac_sha256(key, first segment))`,
//! both segments unpadded. Validation is a pure function of the token, the
//! current time and the key; there is no session table and no revocation.

mod password;
mod token;

pub use password::{hash_password, verify_password, PasswordError};
pub use token::{Claims, SigningKey, SigningKeyError, TokenError, TokenService, SIGNING_KEY_SIZE};
