use super::SecretValidator;
use crate::config::ClientAuthConfig;
use crate::types::{ClientSecret, ParsedSecret, ParsedSecretType, SecretType};
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::jwk::Jwk;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use micromegas_tracing::prelude::*;
use moka::future::Cache;
use serde::Deserialize;
use std::time::Duration;

/// `exp` has one second resolution, a jti is kept this much past the lifetime
const EXP_RESOLUTION: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
struct AssertionClaims {
    jti: String,
    exp: i64,
}

/// Builds the verification key for `alg` from a configured public key
fn decoding_key(secret: &ClientSecret, alg: Algorithm) -> Result<DecodingKey> {
    match secret.kind {
        SecretType::JsonWebKey => {
            let jwk: Jwk = serde_json::from_str(&secret.value)
                .map_err(|e| anyhow!("Failed to parse JWK: {e:?}"))?;
            DecodingKey::from_jwk(&jwk).map_err(|e| anyhow!("Unusable JWK: {e:?}"))
        }
        SecretType::PublicKeyPem => {
            let pem = secret.value.as_bytes();
            let key = match alg {
                Algorithm::RS256
                | Algorithm::RS384
                | Algorithm::RS512
                | Algorithm::PS256
                | Algorithm::PS384
                | Algorithm::PS512 => DecodingKey::from_rsa_pem(pem),
                Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(pem),
                Algorithm::EdDSA => DecodingKey::from_ed_pem(pem),
                _ => bail!("Unsupported assertion algorithm {alg:?}"),
            };
            key.map_err(|e| anyhow!("Unusable public key PEM: {e:?}"))
        }
        other => bail!("Secret type {other:?} cannot verify assertions"),
    }
}

/// Verifies signed client assertions (RFC 7523) against the client's public keys.
///
/// The assertion must be signed with an asymmetric algorithm, have
/// `iss == sub == client_id`, an `aud` among the configured audiences, an `exp`
/// no further away than the maximum assertion lifetime, and a `jti` that has
/// not been seen before.
///
/// Seen `jti` values are kept until every assertion carrying them has expired.
/// When `replay_cache_size` of them are live, new assertions are refused
/// instead of forgetting older ones.
pub struct PrivateKeyJwtSecretValidator {
    audiences: Vec<String>,
    max_lifetime: Duration,
    replay_cache_size: u64,
    seen: Cache<String, ()>,
}

impl std::fmt::Debug for PrivateKeyJwtSecretValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKeyJwtSecretValidator")
            .field("audiences", &self.audiences)
            .field("max_lifetime", &self.max_lifetime)
            .field("replay_cache_size", &self.replay_cache_size)
            .finish()
    }
}

impl PrivateKeyJwtSecretValidator {
    pub fn new(audiences: Vec<String>, replay_cache_size: u64, max_lifetime: Duration) -> Self {
        // no max_capacity, entries only leave by expiring
        let seen = Cache::builder()
            .time_to_live(max_lifetime.saturating_add(EXP_RESOLUTION))
            .build();
        Self {
            audiences,
            max_lifetime,
            replay_cache_size,
            seen,
        }
    }

    pub fn from_config(config: &ClientAuthConfig) -> Self {
        Self::new(
            config.assertion_audiences.clone(),
            config.assertion_replay_cache_size,
            config.max_assertion_lifetime(),
        )
    }

    fn verify(
        &self,
        client_id: &str,
        assertion: &str,
        secret: &ClientSecret,
    ) -> Result<AssertionClaims> {
        if self.audiences.is_empty() {
            bail!("no assertion audience configured");
        }
        let header = decode_header(assertion).map_err(|e| anyhow!("Invalid JWT header: {e:?}"))?;
        if matches!(header.alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            bail!("symmetric assertion algorithm {:?}", header.alg);
        }
        let key = decoding_key(secret, header.alg)?;

        let mut validation = Validation::new(header.alg);
        validation.leeway = 0;
        validation.set_audience(self.audiences.as_slice());
        validation.set_issuer(&[client_id]);
        validation.sub = Some(client_id.to_string());
        validation.set_required_spec_claims(&["exp", "iss", "sub", "aud"]);

        let claims = decode::<AssertionClaims>(assertion, &key, &validation)
            .map_err(|e| anyhow!("Assertion validation failed: {e:?}"))?
            .claims;

        let remaining = claims.exp - Utc::now().timestamp();
        if remaining > self.max_lifetime.as_secs() as i64 {
            bail!("assertion lifetime exceeds {}s", self.max_lifetime.as_secs());
        }
        Ok(claims)
    }
}

#[async_trait]
impl SecretValidator for PrivateKeyJwtSecretValidator {
    fn name(&self) -> &'static str {
        "private_key_jwt"
    }

    fn supports(&self, parsed: ParsedSecretType, stored: SecretType) -> bool {
        parsed == ParsedSecretType::JwtBearer
            && matches!(stored, SecretType::JsonWebKey | SecretType::PublicKeyPem)
    }

    async fn validate(&self, parsed: &ParsedSecret, secret: &ClientSecret) -> bool {
        if secret.is_expired(Utc::now()) {
            return false;
        }
        let Some(assertion) = parsed.text_credential() else {
            return false;
        };
        let claims = match self.verify(&parsed.id, assertion, secret) {
            Ok(claims) => claims,
            Err(e) => {
                debug!("client assertion of {} rejected: {e}", parsed.id);
                return false;
            }
        };

        // only a verified jti is remembered, a forged assertion cannot burn it
        let key = format!("{}:{}", parsed.id, claims.jti);
        if self.seen.contains_key(&key) {
            warn!("replayed client assertion for client {}", parsed.id);
            return false;
        }
        self.seen.run_pending_tasks().await;
        if self.seen.entry_count() >= self.replay_cache_size {
            warn!(
                "assertion replay cache is full, rejecting assertion of client {}",
                parsed.id
            );
            return false;
        }
        let entry = self.seen.entry(key).or_insert(()).await;
        if !entry.is_fresh() {
            warn!("replayed client assertion for client {}", parsed.id);
            return false;
        }
        true
    }
}
