//! Tower layer for client authentication.
//!
//! Runs the same steps as the axum middleware for any tower HTTP service
//! built on `axum::body::Body`, e.g. a hyper server without axum routing.

use crate::authenticator::ClientSecretAuthenticator;
use crate::axum::authenticate_request;
use axum::body::Body;
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use std::sync::Arc;
use tower::{Layer, Service};

/// Layer wrapping services in `ClientAuthService`
#[derive(Clone)]
pub struct ClientAuthLayer {
    authenticator: Arc<ClientSecretAuthenticator>,
}

impl ClientAuthLayer {
    pub fn new(authenticator: Arc<ClientSecretAuthenticator>) -> Self {
        Self { authenticator }
    }
}

impl<S> Layer<S> for ClientAuthLayer {
    type Service = ClientAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ClientAuthService {
            inner,
            authenticator: self.authenticator.clone(),
        }
    }
}

/// Client authentication service wrapper.
///
/// 1. Buffers the body and authenticates the client
/// 2. Injects `AuthenticatedClient` into request extensions
/// 3. Calls the inner service with the rebuilt request
///
/// Failures are answered with a 401 `invalid_client` response, the inner
/// service is not called.
///
/// # Example
///
/// ```rust,no_run
/// use idsrv_auth::authenticator::ClientSecretAuthenticator;
/// use idsrv_auth::config::ClientAuthConfig;
/// use idsrv_auth::store::InMemoryClientStore;
/// use idsrv_auth::tower::ClientAuthLayer;
/// use std::sync::Arc;
/// use tower::Layer;
///
/// # fn example<S>(inner_service: S) -> anyhow::Result<()>
/// # where
/// #     S: tower::Service<http::Request<axum::body::Body>, Response = axum::response::Response>
/// #         + Clone + Send + 'static,
/// #     S::Future: Send + 'static,
/// # {
/// let store = InMemoryClientStore::from_json(r#"[{"client_id": "client"}]"#)?;
/// let authenticator = Arc::new(ClientSecretAuthenticator::from_config(
///     &ClientAuthConfig::default(),
///     Arc::new(store),
/// ));
///
/// let service = ClientAuthLayer::new(authenticator).layer(inner_service);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ClientAuthService<S> {
    /// The inner service to wrap
    pub inner: S,
    pub authenticator: Arc<ClientSecretAuthenticator>,
}

impl<S> Service<http::Request<Body>> for ClientAuthService<S>
where
    S: Service<http::Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: http::Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let authenticator = self.authenticator.clone();

        Box::pin(async move {
            match authenticate_request(&authenticator, req).await {
                Ok(req) => inner.call(req).await,
                Err(e) => Ok(e.into_response()),
            }
        })
    }
}
