//! Client authentication for an OAuth2 / OpenID Connect token endpoint
//!
//! This crate decides whether a request carries a credential belonging to a
//! registered client. It supports these transmission conventions:
//!
//! - **client_secret_basic**: HTTP Basic `Authorization` header
//! - **client_secret_post**: `client_id` / `client_secret` in a form body
//! - **private_key_jwt**: signed client assertion (RFC 7523)
//! - **tls_client_auth**: TLS client certificate plus `client_id`
//!
//! Public clients may present a `client_id` alone.
//!
//! The flow is `request -> parser chain -> ParsedSecret -> client lookup ->
//! validator chain -> verdict`. Every failure is reported to the caller as
//! `invalid_client`; the precise reason is only logged.
//!
//! # Example
//!
//! ```rust
//! use idsrv_auth::authenticator::ClientSecretAuthenticator;
//! use idsrv_auth::config::ClientAuthConfig;
//! use idsrv_auth::request::ClientRequest;
//! use idsrv_auth::store::InMemoryClientStore;
//! use idsrv_auth::validators::shared_secret::hash_secret_sha256;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let json = format!(
//!     r#"[{{"client_id": "client", "secrets": [{{"type": "shared_secret", "value": "{}"}}]}}]"#,
//!     hash_secret_sha256("secret")
//! );
//! let store = InMemoryClientStore::from_json(&json)?;
//! let authenticator =
//!     ClientSecretAuthenticator::from_config(&ClientAuthConfig::default(), Arc::new(store));
//!
//! let mut headers = http::HeaderMap::new();
//! headers.insert(
//!     http::header::AUTHORIZATION,
//!     "Basic Y2xpZW50OnNlY3JldA==".parse().unwrap(),
//! );
//! let request = ClientRequest::new(headers, "grant_type=client_credentials");
//!
//! let client = authenticator.authenticate(&request).await.expect("authenticated");
//! println!("Authenticated: {}", client.client_id);
//! # Ok(())
//! # }
//! ```

/// Core credential and client types
pub mod types;

/// Input bounds and runtime configuration
pub mod config;

/// Buffered request view and form decoding
pub mod request;

/// Credential extraction, one parser per transmission convention
pub mod parsers;

/// Credential verification, one validator per secret type
pub mod validators;

/// Client registry
pub mod store;

/// Client authentication orchestration and verdicts
pub mod authenticator;

/// Default authenticator initialization
pub mod default_authenticator;

/// Axum middleware for token endpoints
pub mod axum;

/// Tower layer for HTTP services
pub mod tower;

/// Key pairs and client assertions for tests
pub mod test_utils;
