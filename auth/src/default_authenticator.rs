//! Default client authenticator initialization.
//!
//! Builds the standard parser and validator chains over an in-memory client
//! registry, both configured from environment variables.

use crate::authenticator::ClientSecretAuthenticator;
use crate::config::ClientAuthConfig;
use crate::store::InMemoryClientStore;
use micromegas_tracing::info;
use std::env::VarError;
use std::sync::Arc;

/// Environment variable holding the JSON client registry
pub const CLIENTS_ENV_VAR: &str = "IDSRV_CLIENTS";

/// Initializes the default client authenticator from environment.
///
/// Reads configuration from:
/// - `IDSRV_CLIENTS`: JSON array of clients (see `store::parse_clients`)
/// - `IDSRV_CLIENT_AUTH_CONFIG`: optional JSON configuration (see `ClientAuthConfig::from_env`)
///
/// Returns `Ok(None)` if no client registry is configured.
/// Returns `Err` on configuration errors.
///
/// # Example
///
/// ```rust,no_run
/// use idsrv_auth::default_authenticator::authenticator;
///
/// # fn example() -> anyhow::Result<()> {
/// match authenticator()? {
///     Some(_) => println!("Client authentication enabled"),
///     None => println!("No client registry configured"),
/// }
/// # Ok(())
/// # }
/// ```
pub fn authenticator() -> anyhow::Result<Option<Arc<ClientSecretAuthenticator>>> {
    let clients_json = match std::env::var(CLIENTS_ENV_VAR) {
        Ok(json) => json,
        Err(VarError::NotPresent) => {
            info!("{CLIENTS_ENV_VAR} not set - client authentication disabled");
            return Ok(None);
        }
        Err(e) => anyhow::bail!("Invalid {CLIENTS_ENV_VAR}: {e}"),
    };
    let store = InMemoryClientStore::from_json(&clients_json)?;
    info!("loaded {} client(s) from {CLIENTS_ENV_VAR}", store.len());

    let config = ClientAuthConfig::from_env()?;
    if config.assertion_audiences.is_empty() {
        info!("no assertion audience configured - private_key_jwt disabled");
    }

    Ok(Some(Arc::new(ClientSecretAuthenticator::from_config(
        &config,
        Arc::new(store),
    ))))
}
