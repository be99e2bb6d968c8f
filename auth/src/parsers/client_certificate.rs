use super::{SecretParser, within_bound};
use crate::config::InputLengthRestrictions;
use crate::request::{ClientRequest, FormField};
use crate::types::ParsedSecret;
use async_trait::async_trait;
use micromegas_tracing::prelude::*;

/// Pairs the TLS peer certificate with the `client_id` from the body.
///
/// Declines when a `client_secret` is posted as well, so that an opportunistic
/// client certificate does not shadow `client_secret_post`.
pub struct ClientCertificateSecretParser {
    limits: InputLengthRestrictions,
}

impl ClientCertificateSecretParser {
    pub fn new(limits: InputLengthRestrictions) -> Self {
        Self { limits }
    }
}

#[async_trait]
impl SecretParser for ClientCertificateSecretParser {
    fn name(&self) -> &'static str {
        "client_certificate"
    }

    async fn parse(&self, request: &ClientRequest) -> Option<ParsedSecret> {
        let certificate = request.client_certificate()?;
        let form = request.form();

        let FormField::Present(id) = form.field("client_id") else {
            debug!("client certificate presented without a single client_id");
            return None;
        };
        if form.field("client_secret") != FormField::Absent {
            return None;
        }
        if !within_bound(id, self.limits.client_id) {
            debug!("client_id exceeds allowed length");
            return None;
        }
        Some(ParsedSecret::certificate(id, certificate.clone()))
    }
}
