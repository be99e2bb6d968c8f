use super::SecretValidator;
use crate::types::{ClientSecret, ParsedSecret, ParsedSecretType, SecretType};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use sha2::{Digest, Sha256, Sha512};
use subtle::ConstantTimeEq;

/// Base64 SHA-256 digest of a secret, the form `SecretType::SharedSecret` values are stored in
pub fn hash_secret_sha256(secret: &str) -> String {
    STANDARD.encode(Sha256::digest(secret.as_bytes()))
}

/// Base64 SHA-512 digest of a secret
pub fn hash_secret_sha512(secret: &str) -> String {
    STANDARD.encode(Sha512::digest(secret.as_bytes()))
}

fn presented_secret<'a>(parsed: &'a ParsedSecret, secret: &ClientSecret) -> Option<&'a str> {
    if parsed.kind != ParsedSecretType::SharedSecret || secret.is_expired(Utc::now()) {
        return None;
    }
    parsed.text_credential()
}

/// Compares against secrets stored as SHA-256 or SHA-512 digests.
pub struct HashedSharedSecretValidator;

#[async_trait]
impl SecretValidator for HashedSharedSecretValidator {
    fn name(&self) -> &'static str {
        "hashed_shared_secret"
    }

    fn supports(&self, parsed: ParsedSecretType, stored: SecretType) -> bool {
        parsed == ParsedSecretType::SharedSecret && stored == SecretType::SharedSecret
    }

    async fn validate(&self, parsed: &ParsedSecret, secret: &ClientSecret) -> bool {
        let Some(presented) = presented_secret(parsed, secret) else {
            return false;
        };
        let stored = secret.value.as_bytes();
        let sha256 = hash_secret_sha256(presented);
        let sha512 = hash_secret_sha512(presented);
        (sha256.as_bytes().ct_eq(stored) | sha512.as_bytes().ct_eq(stored)).into()
    }
}

/// Compares against secrets stored in clear.
///
/// Both sides are hashed first so the comparison time does not depend on their lengths.
pub struct PlainTextSharedSecretValidator;

#[async_trait]
impl SecretValidator for PlainTextSharedSecretValidator {
    fn name(&self) -> &'static str {
        "plain_text_shared_secret"
    }

    fn supports(&self, parsed: ParsedSecretType, stored: SecretType) -> bool {
        parsed == ParsedSecretType::SharedSecret && stored == SecretType::PlainTextSecret
    }

    async fn validate(&self, parsed: &ParsedSecret, secret: &ClientSecret) -> bool {
        let Some(presented) = presented_secret(parsed, secret) else {
            return false;
        };
        let presented = Sha256::digest(presented.as_bytes());
        let stored = Sha256::digest(secret.value.as_bytes());
        presented.as_slice().ct_eq(stored.as_slice()).into()
    }
}
