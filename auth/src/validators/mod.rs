//! Secret validators compare a `ParsedSecret` with the secrets configured for a client.

use crate::types::{ClientSecret, ParsedSecret, ParsedSecretType, SecretType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use micromegas_tracing::prelude::*;
use std::sync::Arc;

/// Certificate thumbprint and subject name validators
pub mod certificate;

/// Signed client assertion validator
pub mod private_key_jwt;

/// Hashed and plain text shared secret validators
pub mod shared_secret;

/// Trait for secret validators
///
/// A validator compares one presented credential with one configured secret.
/// Expired secrets never match.
#[async_trait]
pub trait SecretValidator: Send + Sync {
    /// Short name used in logs, e.g. `hashed_shared_secret`
    fn name(&self) -> &'static str;

    /// True if this validator knows how to compare a `parsed` credential with a `stored` secret
    fn supports(&self, parsed: ParsedSecretType, stored: SecretType) -> bool;

    /// Returns true on a match
    async fn validate(&self, parsed: &ParsedSecret, secret: &ClientSecret) -> bool;
}

/// The configured secret a credential matched, without its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretMatch {
    pub secret_type: SecretType,
    pub description: Option<String>,
    pub expiration: Option<DateTime<Utc>>,
}

impl From<&ClientSecret> for SecretMatch {
    fn from(secret: &ClientSecret) -> Self {
        Self {
            secret_type: secret.kind,
            description: secret.description.clone(),
            expiration: secret.expiration,
        }
    }
}

/// Ordered set of validators, the first match wins.
#[derive(Clone, Default)]
pub struct SecretValidatorChain {
    validators: Vec<Arc<dyn SecretValidator>>,
}

impl SecretValidatorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a validator, validators are tried in insertion order
    pub fn with_validator(mut self, validator: Arc<dyn SecretValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Tries every non-expired secret with every validator that supports it
    pub async fn validate(
        &self,
        parsed: &ParsedSecret,
        secrets: &[ClientSecret],
        now: DateTime<Utc>,
    ) -> Option<SecretMatch> {
        let (expired, current): (Vec<&ClientSecret>, Vec<&ClientSecret>) =
            secrets.iter().partition(|secret| secret.is_expired(now));
        if !expired.is_empty() {
            debug!(
                "ignoring {} expired secret(s) of client {}",
                expired.len(),
                parsed.id
            );
        }

        for validator in &self.validators {
            for secret in current
                .iter()
                .filter(|secret| validator.supports(parsed.kind, secret.kind))
            {
                if validator.validate(parsed, secret).await {
                    debug!(
                        "validator {} matched a {:?} secret of client {}",
                        validator.name(),
                        secret.kind,
                        parsed.id
                    );
                    return Some(SecretMatch::from(*secret));
                }
            }
        }
        None
    }
}
