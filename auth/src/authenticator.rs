//! Client authentication for token-like endpoints.
//!
//! `ClientSecretAuthenticator` runs the parser chain, looks up the claimed
//! client, and runs the validator chain against the client's secrets:
//!
//! ```text
//! Start -> Parsed -> ClientResolved -> Validated(success | failure)
//! ```
//!
//! Each step runs once, in that order, and the result is a terminal verdict.

use crate::config::{ClientAuthConfig, InputLengthRestrictions};
use crate::parsers::SecretParserChain;
use crate::parsers::basic::BasicAuthenticationSecretParser;
use crate::parsers::client_assertion::ClientAssertionSecretParser;
use crate::parsers::client_certificate::ClientCertificateSecretParser;
use crate::parsers::post_body::PostBodySecretParser;
use crate::request::ClientRequest;
use crate::store::ClientStore;
use crate::types::ParsedSecretType;
use crate::validators::certificate::{X509NameSecretValidator, X509ThumbprintSecretValidator};
use crate::validators::private_key_jwt::PrivateKeyJwtSecretValidator;
use crate::validators::shared_secret::{
    HashedSharedSecretValidator, PlainTextSharedSecretValidator,
};
use crate::validators::{SecretMatch, SecretValidatorChain};
use chrono::Utc;
use micromegas_tracing::prelude::*;
use std::sync::Arc;
use std::time::Duration;

/// Error code every failure is reported as (RFC 6749 section 5.2)
pub const INVALID_CLIENT: &str = "invalid_client";

/// A client whose credential was accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedClient {
    pub client_id: String,
    /// How the credential was presented
    pub method: ParsedSecretType,
    /// The configured secret that matched, `None` for public clients
    pub secret: Option<SecretMatch>,
}

/// Why authentication failed.
///
/// These codes are for logs and metrics. Callers of the endpoint only ever
/// see [`INVALID_CLIENT`], so they cannot tell an unknown client from a wrong
/// secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthenticationFailure {
    /// No parser recognized a credential
    #[error("no_credential")]
    NoCredential,
    /// The client does not exist or is disabled
    #[error("unknown_client")]
    UnknownClient,
    /// No secret was presented but the client requires one
    #[error("secret_required")]
    SecretRequired,
    /// No configured secret matched the credential
    #[error("no_matching_secret")]
    NoMatchingSecret,
    /// The client store failed or timed out
    #[error("lookup_unavailable")]
    LookupUnavailable,
}

impl AuthenticationFailure {
    /// The error code to send to the caller
    pub fn protocol_error(&self) -> &'static str {
        INVALID_CLIENT
    }

    /// True when the same request could succeed later
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthenticationFailure::LookupUnavailable)
    }
}

pub type AuthenticationResult = Result<AuthenticatedClient, AuthenticationFailure>;

/// Parsers in their default order.
///
/// Basic comes first. The assertion and certificate parsers run before the
/// post body parser, which would otherwise report their `client_id` as a
/// secret-less client.
pub fn default_parsers(limits: &InputLengthRestrictions) -> SecretParserChain {
    SecretParserChain::new()
        .with_parser(Arc::new(BasicAuthenticationSecretParser::new(limits.clone())))
        .with_parser(Arc::new(ClientAssertionSecretParser::new(limits.clone())))
        .with_parser(Arc::new(ClientCertificateSecretParser::new(limits.clone())))
        .with_parser(Arc::new(PostBodySecretParser::new(limits.clone())))
}

/// Validators for every supported secret type
pub fn default_validators(config: &ClientAuthConfig) -> SecretValidatorChain {
    SecretValidatorChain::new()
        .with_validator(Arc::new(HashedSharedSecretValidator))
        .with_validator(Arc::new(PlainTextSharedSecretValidator))
        .with_validator(Arc::new(X509ThumbprintSecretValidator))
        .with_validator(Arc::new(X509NameSecretValidator))
        .with_validator(Arc::new(PrivateKeyJwtSecretValidator::from_config(config)))
}

/// Authenticates the client calling an endpoint
///
/// # Example
///
/// ```rust
/// use idsrv_auth::authenticator::{AuthenticationFailure, ClientSecretAuthenticator};
/// use idsrv_auth::config::ClientAuthConfig;
/// use idsrv_auth::request::ClientRequest;
/// use idsrv_auth::store::InMemoryClientStore;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let store = InMemoryClientStore::from_json(
///     r#"[{"client_id": "client", "secrets": [{"type": "plain_text_secret", "value": "secret"}]}]"#,
/// )?;
/// let authenticator = ClientSecretAuthenticator::from_config(&ClientAuthConfig::default(), Arc::new(store));
///
/// let request = ClientRequest::from_body("client_id=client&client_secret=secret");
/// let client = authenticator.authenticate(&request).await.expect("authenticated");
/// assert_eq!(client.client_id, "client");
///
/// let request = ClientRequest::from_body("client_id=client&client_secret=wrong");
/// let failure = authenticator.authenticate(&request).await.unwrap_err();
/// assert_eq!(failure, AuthenticationFailure::NoMatchingSecret);
/// assert_eq!(failure.protocol_error(), "invalid_client");
/// # Ok(())
/// # }
/// ```
pub struct ClientSecretAuthenticator {
    parsers: SecretParserChain,
    validators: SecretValidatorChain,
    store: Arc<dyn ClientStore>,
    lookup_timeout: Duration,
    max_request_body_bytes: usize,
}

impl ClientSecretAuthenticator {
    /// Creates an authenticator from explicit chains, with default timeouts
    pub fn new(
        parsers: SecretParserChain,
        validators: SecretValidatorChain,
        store: Arc<dyn ClientStore>,
    ) -> Self {
        let defaults = ClientAuthConfig::default();
        Self {
            parsers,
            validators,
            store,
            lookup_timeout: defaults.client_lookup_timeout(),
            max_request_body_bytes: defaults.max_request_body_bytes,
        }
    }

    /// Creates an authenticator with the default chains
    pub fn from_config(config: &ClientAuthConfig, store: Arc<dyn ClientStore>) -> Self {
        Self::new(
            default_parsers(&config.input_length_restrictions),
            default_validators(config),
            store,
        )
        .with_lookup_timeout(config.client_lookup_timeout())
        .with_max_request_body_bytes(config.max_request_body_bytes)
    }

    pub fn with_lookup_timeout(mut self, timeout: Duration) -> Self {
        self.lookup_timeout = timeout;
        self
    }

    pub fn with_max_request_body_bytes(mut self, limit: usize) -> Self {
        self.max_request_body_bytes = limit;
        self
    }

    /// Bound applied by HTTP adapters when buffering request bodies
    pub fn max_request_body_bytes(&self) -> usize {
        self.max_request_body_bytes
    }

    pub async fn authenticate(&self, request: &ClientRequest) -> AuthenticationResult {
        let result = self.run(request).await;
        match &result {
            Ok(client) => {
                info!(
                    "client authenticated: client_id={} method={}",
                    client.client_id, client.method
                );
            }
            Err(failure) => {
                warn!("client authentication failed: {failure}");
            }
        }
        result
    }

    async fn run(&self, request: &ClientRequest) -> AuthenticationResult {
        let parsed = self
            .parsers
            .parse(request)
            .await
            .ok_or(AuthenticationFailure::NoCredential)?;

        let lookup = tokio::time::timeout(
            self.lookup_timeout,
            self.store.find_client_by_id(&parsed.id),
        )
        .await;
        let client = match lookup {
            Ok(Ok(Some(client))) => client,
            Ok(Ok(None)) => {
                debug!("client {} not found", parsed.id);
                return Err(AuthenticationFailure::UnknownClient);
            }
            Ok(Err(e)) => {
                warn!("client store lookup failed: {e:?}");
                return Err(AuthenticationFailure::LookupUnavailable);
            }
            Err(_) => {
                warn!(
                    "client store lookup timed out after {}ms",
                    self.lookup_timeout.as_millis()
                );
                return Err(AuthenticationFailure::LookupUnavailable);
            }
        };
        if !client.enabled {
            debug!("client {} is disabled", client.client_id);
            return Err(AuthenticationFailure::UnknownClient);
        }

        if parsed.kind == ParsedSecretType::NoSecret {
            if client.require_client_secret {
                return Err(AuthenticationFailure::SecretRequired);
            }
            return Ok(AuthenticatedClient {
                client_id: client.client_id,
                method: parsed.kind,
                secret: None,
            });
        }

        let secret = self
            .validators
            .validate(&parsed, &client.secrets, Utc::now())
            .await
            .ok_or(AuthenticationFailure::NoMatchingSecret)?;
        Ok(AuthenticatedClient {
            client_id: client.client_id,
            method: parsed.kind,
            secret: Some(secret),
        })
    }
}
