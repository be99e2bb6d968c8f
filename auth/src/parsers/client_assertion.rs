use super::{SecretParser, within_bound};
use crate::config::InputLengthRestrictions;
use crate::request::{ClientRequest, FormField};
use crate::types::ParsedSecret;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use micromegas_tracing::prelude::*;
use serde::Deserialize;

/// `client_assertion_type` value for JWT client assertions (RFC 7523)
pub const CLIENT_ASSERTION_TYPE_JWT_BEARER: &str =
    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

#[derive(Deserialize)]
struct UnverifiedClaims {
    iss: Option<String>,
    sub: Option<String>,
}

/// Decodes the JWT payload without checking the signature
///
/// Only used to learn which client the assertion claims to come from, the
/// signature is checked by the private key JWT validator.
fn decode_payload_unverified(token: &str) -> Option<UnverifiedClaims> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };
    let bytes = URL_SAFE_NO_PAD.decode(payload.as_bytes()).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Parses `client_assertion` / `client_assertion_type` from a form-encoded body.
///
/// The client identifier is the assertion's subject, which must equal its
/// issuer. A `client_id` sent alongside must name the same client.
pub struct ClientAssertionSecretParser {
    limits: InputLengthRestrictions,
}

impl ClientAssertionSecretParser {
    pub fn new(limits: InputLengthRestrictions) -> Self {
        Self { limits }
    }
}

#[async_trait]
impl SecretParser for ClientAssertionSecretParser {
    fn name(&self) -> &'static str {
        "client_assertion"
    }

    async fn parse(&self, request: &ClientRequest) -> Option<ParsedSecret> {
        if request.body().is_empty() {
            return None;
        }
        let form = request.form();

        let FormField::Present(assertion_type) = form.field("client_assertion_type") else {
            return None;
        };
        if assertion_type != CLIENT_ASSERTION_TYPE_JWT_BEARER {
            debug!("unsupported client_assertion_type");
            return None;
        }
        let FormField::Present(assertion) = form.field("client_assertion") else {
            debug!("missing or repeated client_assertion");
            return None;
        };
        if !within_bound(assertion, self.limits.jwt) {
            debug!("client_assertion exceeds allowed length");
            return None;
        }

        let Some(claims) = decode_payload_unverified(assertion) else {
            debug!("malformed client_assertion");
            return None;
        };
        let (Some(issuer), Some(subject)) = (claims.iss, claims.sub) else {
            debug!("client_assertion without iss or sub");
            return None;
        };
        if issuer != subject || subject.trim().is_empty() {
            debug!("client_assertion iss and sub differ");
            return None;
        }
        if !within_bound(&subject, self.limits.client_id) {
            debug!("client_assertion subject exceeds allowed length");
            return None;
        }

        match form.field("client_id") {
            FormField::Absent => {}
            FormField::Present(id) if id == subject => {}
            _ => {
                debug!("client_id does not match client_assertion subject");
                return None;
            }
        }

        Some(ParsedSecret::jwt_bearer(subject, assertion))
    }
}
