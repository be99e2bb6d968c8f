use super::{SecretParser, within_bound};
use crate::config::InputLengthRestrictions;
use crate::request::{ClientRequest, form_decode};
use crate::types::ParsedSecret;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::header::AUTHORIZATION;
use micromegas_tracing::prelude::*;
/// Parses `Authorization: Basic base64(client_id:client_secret)`.
pub struct BasicAuthenticationSecretParser {
    limits: InputLengthRestrictions,
}

impl BasicAuthenticationSecretParser {
    pub fn new(limits: InputLengthRestrictions) -> Self {
        Self { limits }
    }

    fn decode_credentials(&self, encoded: &str) -> Option<(String, String)> {
        // a char is at most 4 bytes, 12 once percent-encoded; base64 adds 4/3
        let max_decoded = self
            .limits
            .client_id
            .saturating_add(self.limits.client_secret)
            .saturating_add(1)
            .saturating_mul(12);
        let max_encoded = max_decoded.div_ceil(3).saturating_mul(4);
        if encoded.len() > max_encoded {
            debug!("basic credentials exceed allowed length");
            return None;
        }
        let bytes = STANDARD.decode(encoded.trim()).ok()?;
        let pair = String::from_utf8(bytes).ok()?;
        // halves are form-encoded before joining (RFC 6749 section 2.3.1)
        let (id, secret) = pair.split_once(':')?;
        Some((form_decode(id.as_bytes())?, form_decode(secret.as_bytes())?))
    }
}

#[async_trait]
impl SecretParser for BasicAuthenticationSecretParser {
    fn name(&self) -> &'static str {
        "basic"
    }

    async fn parse(&self, request: &ClientRequest) -> Option<ParsedSecret> {
        let header = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
        let (scheme, encoded) = header.split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }

        let Some((id, secret)) = self.decode_credentials(encoded) else {
            debug!("malformed basic authorization header");
            return None;
        };

        if id.trim().is_empty() {
            debug!("no client_id in basic authorization header");
            return None;
        }
        if !within_bound(&id, self.limits.client_id) {
            debug!("client_id in basic authorization header exceeds allowed length");
            return None;
        }
        if secret.trim().is_empty() {
            return Some(ParsedSecret::no_secret(id));
        }
        if !within_bound(&secret, self.limits.client_secret) {
            debug!("client_secret in basic authorization header exceeds allowed length");
            return None;
        }
        Some(ParsedSecret::shared_secret(id, secret))
    }
}
