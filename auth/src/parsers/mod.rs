//! Secret parsers extract a `ParsedSecret` from a request.
//!
//! There is one parser per transmission convention. A parser that does not
//! recognize the request, or finds it malformed, returns `None`: an
//! unusable credential is a normal outcome, not a fault.

use crate::request::ClientRequest;
use crate::types::ParsedSecret;
use async_trait::async_trait;
use micromegas_tracing::prelude::*;
use std::sync::Arc;

/// HTTP Basic authentication (`client_secret_basic`)
pub mod basic;

/// Signed client assertions (`private_key_jwt`)
pub mod client_assertion;

/// TLS client certificates (`tls_client_auth`)
pub mod client_certificate;

/// Form-encoded request body (`client_secret_post`)
pub mod post_body;

/// Trait for secret parsers
#[async_trait]
pub trait SecretParser: Send + Sync {
    /// Short name used in logs, e.g. `basic`
    fn name(&self) -> &'static str;

    /// Extracts a credential, `None` if this convention is not used or the input is unusable
    async fn parse(&self, request: &ClientRequest) -> Option<ParsedSecret>;
}

/// Ordered set of parsers, the first one to find a credential wins.
///
/// The order is fixed at construction. When a request could satisfy more
/// than one convention, the parser added first decides.
///
/// # Example
///
/// ```rust
/// use idsrv_auth::config::InputLengthRestrictions;
/// use idsrv_auth::parsers::SecretParserChain;
/// use idsrv_auth::parsers::basic::BasicAuthenticationSecretParser;
/// use idsrv_auth::parsers::post_body::PostBodySecretParser;
/// use idsrv_auth::request::ClientRequest;
/// use std::sync::Arc;
///
/// # async fn example() {
/// let limits = InputLengthRestrictions::default();
/// let chain = SecretParserChain::new()
///     .with_parser(Arc::new(BasicAuthenticationSecretParser::new(limits.clone())))
///     .with_parser(Arc::new(PostBodySecretParser::new(limits)));
///
/// let request = ClientRequest::from_body("client_id=client&client_secret=secret");
/// let parsed = chain.parse(&request).await.expect("credential");
/// assert_eq!(parsed.id, "client");
/// # }
/// ```
#[derive(Clone, Default)]
pub struct SecretParserChain {
    parsers: Vec<Arc<dyn SecretParser>>,
}

impl SecretParserChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parser, parsers are tried in insertion order
    pub fn with_parser(mut self, parser: Arc<dyn SecretParser>) -> Self {
        self.parsers.push(parser);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Names of the configured parsers, in order
    pub fn parser_names(&self) -> Vec<&'static str> {
        self.parsers.iter().map(|parser| parser.name()).collect()
    }

    pub async fn parse(&self, request: &ClientRequest) -> Option<ParsedSecret> {
        for parser in &self.parsers {
            if let Some(parsed) = parser.parse(request).await {
                debug!(
                    "parser {} found a {} credential for client {}",
                    parser.name(),
                    parsed.kind,
                    parsed.id
                );
                return Some(parsed);
            }
        }
        debug!("no parser found a client credential");
        None
    }
}

/// True if `value` is at most `max` characters long
pub(crate) fn within_bound(value: &str, max: usize) -> bool {
    value.chars().count() <= max
}
