use super::SecretValidator;
use crate::types::{ClientSecret, ParsedSecret, ParsedSecretType, SecretType};
use async_trait::async_trait;
use chrono::Utc;
use subtle::ConstantTimeEq;

/// Uppercase hex digits only, so `ab:cd ef` and `ABCDEF` compare equal
fn normalize_thumbprint(thumbprint: &str) -> String {
    thumbprint
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    !a.is_empty() && bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}

/// Matches the peer certificate thumbprint.
pub struct X509ThumbprintSecretValidator;

#[async_trait]
impl SecretValidator for X509ThumbprintSecretValidator {
    fn name(&self) -> &'static str {
        "x509_thumbprint"
    }

    fn supports(&self, parsed: ParsedSecretType, stored: SecretType) -> bool {
        parsed == ParsedSecretType::X509Certificate && stored == SecretType::X509Thumbprint
    }

    async fn validate(&self, parsed: &ParsedSecret, secret: &ClientSecret) -> bool {
        if secret.is_expired(Utc::now()) {
            return false;
        }
        let Some(certificate) = parsed.certificate_credential() else {
            return false;
        };
        constant_time_eq(
            &normalize_thumbprint(&secret.value),
            &normalize_thumbprint(&certificate.thumbprint),
        )
    }
}

/// Matches the peer certificate subject distinguished name, ignoring case.
pub struct X509NameSecretValidator;

#[async_trait]
impl SecretValidator for X509NameSecretValidator {
    fn name(&self) -> &'static str {
        "x509_name"
    }

    fn supports(&self, parsed: ParsedSecretType, stored: SecretType) -> bool {
        parsed == ParsedSecretType::X509Certificate && stored == SecretType::X509Name
    }

    async fn validate(&self, parsed: &ParsedSecret, secret: &ClientSecret) -> bool {
        if secret.is_expired(Utc::now()) {
            return false;
        }
        let Some(certificate) = parsed.certificate_credential() else {
            return false;
        };
        constant_time_eq(
            &normalize_name(&secret.value),
            &normalize_name(&certificate.subject),
        )
    }
}
