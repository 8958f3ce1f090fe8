//! Signed, time-limited capability tokens
//!
//! A token asserts that its bearer proved knowledge of the credential for
//! `sub` (acting as `role`) at `iat`. The `TokenService` is constructed once
//! with the process signing key and shared; it is never rotated at runtime.

use std::fmt;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use time::OffsetDateTime;

use crate::account::Role;

/// Size of the HMAC signing key in bytes (256 bits)
pub const SIGNING_KEY_SIZE: usize = 32;

const SIGNING_KEY_PEM_TAG: &str = "STASH SIGNING KEY";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum SigningKeyError {
    #[error("failed to gather key entropy: {0}")]
    Entropy(getrandom::Error),
    #[error("failed to parse PEM: {0}")]
    Pem(#[from] pem::PemError),
    #[error("invalid PEM tag, expected {SIGNING_KEY_PEM_TAG}, got {0}")]
    InvalidTag(String),
    #[error("invalid signing key size, expected {SIGNING_KEY_SIZE}, got {0}")]
    InvalidSize(usize),
}

/// Process-wide HMAC key used to sign capability tokens
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey([u8; SIGNING_KEY_SIZE]);

impl SigningKey {
    pub fn generate() -> Result<Self, SigningKeyError> {
        let mut bytes = [0u8; SIGNING_KEY_SIZE];
        getrandom::getrandom(&mut bytes).map_err(SigningKeyError::Entropy)?;
        Ok(Self(bytes))
    }

    pub fn to_pem(&self) -> String {
        let pem = pem::Pem::new(SIGNING_KEY_PEM_TAG, self.0.to_vec());
        pem::encode(&pem)
    }

    pub fn from_pem(pem_str: &str) -> Result<Self, SigningKeyError> {
        let pem = pem::parse(pem_str)?;
        if pem.tag() != SIGNING_KEY_PEM_TAG {
            return Err(SigningKeyError::InvalidTag(pem.tag().to_string()));
        }

        let contents = pem.contents();
        let bytes: [u8; SIGNING_KEY_SIZE] = contents
            .try_into()
            .map_err(|_| SigningKeyError::InvalidSize(contents.len()))?;
        Ok(Self(bytes))
    }
}

impl From<[u8; SIGNING_KEY_SIZE]> for SigningKey {
    fn from(bytes: [u8; SIGNING_KEY_SIZE]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(..)")
    }
}

/// Claims carried by a capability token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// login name of the subject
    pub sub: String,
    /// namespace the subject was authenticated in
    pub role: Role,
    /// issued at, unix milliseconds
    pub iat: i64,
    /// expires at, unix milliseconds
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not verify")]
    BadSignature,
    #[error("token has expired")]
    Expired,
    #[error("failed to encode token claims: {0}")]
    Encode(String),
}

#[derive(Debug, Clone)]
pub struct TokenService {
    key: SigningKey,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(key: SigningKey, lifetime: Duration) -> Self {
        Self { key, lifetime }
    }

    pub fn issue(&self, subject: &str, role: Role) -> Result<String, TokenError> {
        self.issue_at(subject, role, OffsetDateTime::now_utc())
    }

    pub fn issue_at(
        &self,
        subject: &str,
        role: Role,
        now: OffsetDateTime,
    ) -> Result<String, TokenError> {
        let iat = unix_millis(now);
        let lifetime = i64::try_from(self.lifetime.as_millis()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat,
            exp: iat.saturating_add(lifetime),
        };

        let payload = serde_json::to_vec(&claims).map_err(|e| TokenError::Encode(e.to_string()))?;
        let payload = URL_SAFE_NO_PAD.encode(payload);
        let signature = URL_SAFE_NO_PAD.encode(self.mac(payload.as_bytes())?.finalize().into_bytes());

        Ok(format!("{}.{}", payload, signature))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_at(token, OffsetDateTime::now_utc())
    }

    /// Verify the signature first, then decode the claims and check expiry
    /// against `now`.
    pub fn validate_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, TokenError> {
        let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;

        self.mac(payload.as_bytes())?
            .verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

        if unix_millis(now) >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn mac(&self, message: &[u8]) -> Result<HmacSha256, TokenError> {
        // new_from_slice accepts any key length for HMAC
        let mut mac = HmacSha256::new_from_slice(&self.key.0)
            .map_err(|e| TokenError::Encode(e.to_string()))?;
        mac.update(message);
        Ok(mac)
    }
}

fn unix_millis(at: OffsetDateTime) -> i64 {
    i64::try_from(at.unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn service() -> TokenService {
        TokenService::new(SigningKey::from([7u8; SIGNING_KEY_SIZE]), HOUR)
    }

    #[test]
    fn test_issue_then_validate_within_lifetime() {
        let tokens = service();
        let now = OffsetDateTime::now_utc();
        let token = tokens.issue_at("alice", Role::User, now).unwrap();

        let claims = tokens
            .validate_at(&token, now + time::Duration::minutes(59))
            .unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.exp - claims.iat, 3_600_000);
    }

    #[test]
    fn test_expired_at_exact_lifetime() {
        let tokens = service();
        let now = OffsetDateTime::now_utc();
        let token = tokens.issue_at("alice", Role::User, now).unwrap();

        let result = tokens.validate_at(&token, now + time::Duration::hours(1));
        assert_eq!(result, Err(TokenError::Expired));
    }

    #[test]
    fn test_valid_until_lifetime_when_issued_mid_second() {
        let tokens = TokenService::new(
            SigningKey::from([7u8; SIGNING_KEY_SIZE]),
            Duration::from_secs(10),
        );
        let issued = OffsetDateTime::from_unix_timestamp(1_000).unwrap()
            + time::Duration::milliseconds(900);
        let token = tokens.issue_at("alice", Role::User, issued).unwrap();

        let almost = issued + time::Duration::milliseconds(9_500);
        assert!(tokens.validate_at(&token, almost).is_ok());

        let last = issued + time::Duration::milliseconds(9_999);
        assert!(tokens.validate_at(&token, last).is_ok());

        let elapsed = issued + time::Duration::seconds(10);
        assert_eq!(
            tokens.validate_at(&token, elapsed),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let tokens = service();
        let token = tokens.issue("alice", Role::User).unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let forged = Claims {
            sub: "mallory".to_string(),
            role: Role::Administrator,
            iat: 0,
            exp: i64::MAX,
        };
        let forged = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let forged = format!("{}.{}", forged, signature);

        assert_eq!(tokens.validate(&forged), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_foreign_key_rejected() {
        let token = service().issue("alice", Role::User).unwrap();
        let other = TokenService::new(SigningKey::from([8u8; SIGNING_KEY_SIZE]), HOUR);
        assert_eq!(other.validate(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_malformed_tokens() {
        let tokens = service();
        for token in ["", "no-dot", "a.b.c", "!!!.???"] {
            assert!(tokens.validate(token).is_err(), "accepted {:?}", token);
        }
        assert_eq!(tokens.validate("no-dot"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_signing_key_pem() {
        let key = SigningKey::generate().unwrap();
        let recovered = SigningKey::from_pem(&key.to_pem()).unwrap();
        assert_eq!(key, recovered);

        let wrong_tag = pem::encode(&pem::Pem::new("PRIVATE KEY", vec![0u8; 32]));
        assert!(matches!(
            SigningKey::from_pem(&wrong_tag),
            Err(SigningKeyError::InvalidTag(_))
        ));

        let short = pem::encode(&pem::Pem::new(SIGNING_KEY_PEM_TAG, vec![0u8; 8]));
        assert!(matches!(
            SigningKey::from_pem(&short),
            Err(SigningKeyError::InvalidSize(8))
        ));
    }
}
