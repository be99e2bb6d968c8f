use super::{SecretParser, within_bound};
use crate::config::InputLengthRestrictions;
use crate::request::{ClientRequest, FormField};
use crate::types::ParsedSecret;
use async_trait::async_trait;
use micromegas_tracing::prelude::*;

/// Parses `client_id` and `client_secret` from a form-encoded body.
///
/// - no `client_id`: nothing found
/// - `client_id` only: `NoSecret`
/// - both: `SharedSecret`
///
/// Any field over its length bound, or sent twice, rejects the whole attempt.
pub struct PostBodySecretParser {
    limits: InputLengthRestrictions,
}

impl PostBodySecretParser {
    pub fn new(limits: InputLengthRestrictions) -> Self {
        Self { limits }
    }
}

#[async_trait]
impl SecretParser for PostBodySecretParser {
    fn name(&self) -> &'static str {
        "post_body"
    }

    async fn parse(&self, request: &ClientRequest) -> Option<ParsedSecret> {
        if request.body().is_empty() {
            return None;
        }
        let form = request.form();

        let id = match form.field("client_id") {
            FormField::Present(id) => id,
            FormField::Absent => {
                debug!("no client_id in post body");
                return None;
            }
            FormField::Repeated => {
                debug!("client_id repeated in post body");
                return None;
            }
        };
        if !within_bound(id, self.limits.client_id) {
            debug!("client_id in post body exceeds allowed length");
            return None;
        }

        match form.field("client_secret") {
            FormField::Absent => Some(ParsedSecret::no_secret(id)),
            FormField::Present(secret) => {
                if !within_bound(secret, self.limits.client_secret) {
                    debug!("client_secret in post body exceeds allowed length");
                    return None;
                }
                Some(ParsedSecret::shared_secret(id, secret))
            }
            FormField::Repeated => {
                debug!("client_secret repeated in post body");
                None
            }
        }
    }
}
