//! Axum middleware for client authentication
//!
//! Provides client authentication middleware for token-like endpoints that:
//! 1. Buffers the request body (bounded), rejecting bodies over the limit
//! 2. Authenticates the client with a `ClientSecretAuthenticator`
//! 3. Injects `AuthenticatedClient` into request extensions
//! 4. Hands the buffered body to the next handler unchanged
//! 5. Returns 401 `invalid_client` on any failure

use crate::authenticator::{AuthenticatedClient, ClientSecretAuthenticator, INVALID_CLIENT};
use crate::request::ClientRequest;
use crate::types::ClientCertificate;
use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::HeaderValue;
use http::header::WWW_AUTHENTICATE;
use micromegas_tracing::prelude::*;
use std::sync::Arc;

/// Authenticates a request and rebuilds it with the buffered body.
///
/// A `ClientCertificate` placed in the request extensions by the TLS layer is
/// made available to the certificate parser.
pub(crate) async fn authenticate_request(
    authenticator: &ClientSecretAuthenticator,
    req: Request,
) -> Result<Request, ClientAuthError> {
    let (mut parts, body) = req.into_parts();
    let certificate = parts.extensions.get::<ClientCertificate>().cloned();

    // the body is handed on, so one that cannot be buffered whole is rejected
    let mut client_request = ClientRequest::read(
        parts.headers.clone(),
        body,
        authenticator.max_request_body_bytes(),
    )
    .await
    .map_err(|e| {
        warn!("request body could not be buffered: {e}");
        ClientAuthError::InvalidClient
    })?;
    if let Some(certificate) = certificate {
        client_request = client_request.with_client_certificate(certificate);
    }

    let client: AuthenticatedClient = authenticator
        .authenticate(&client_request)
        .await
        .map_err(|_| ClientAuthError::InvalidClient)?;

    parts.extensions.insert(client);
    Ok(Request::from_parts(
        parts,
        Body::from(client_request.body().clone()),
    ))
}

/// Axum middleware for client authentication
///
/// # Example
///
/// ```rust,ignore
/// use axum::{Router, middleware, routing::post};
/// use idsrv_auth::axum::client_auth_middleware;
///
/// let authenticator = Arc::new(ClientSecretAuthenticator::from_config(&config, store));
/// let app = Router::new()
///     .route("/connect/token", post(token_handler))
///     .layer(middleware::from_fn(move |req, next| {
///         client_auth_middleware(authenticator.clone(), req, next)
///     }));
/// ```
pub async fn client_auth_middleware(
    authenticator: Arc<ClientSecretAuthenticator>,
    req: Request,
    next: Next,
) -> Result<Response, ClientAuthError> {
    let req = authenticate_request(&authenticator, req).await?;
    Ok(next.run(req).await)
}

/// Client authentication errors for HTTP responses
#[derive(Debug)]
pub enum ClientAuthError {
    /// Any authentication failure, the internal reason is only logged
    InvalidClient,
}

impl IntoResponse for ClientAuthError {
    fn into_response(self) -> Response {
        match self {
            ClientAuthError::InvalidClient => {
                let body = serde_json::json!({ "error": INVALID_CLIENT });
                let mut response = (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response();
                response.headers_mut().insert(
                    WWW_AUTHENTICATE,
                    HeaderValue::from_static("Basic realm=\"token\""),
                );
                response
            }
        }
    }
}
