use crate::types::Client;
use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use std::collections::HashMap;

/// Source of registered clients.
///
/// Persistence and caching belong to the implementation, the authentication
/// path only reads.
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Returns the client registered under `client_id`, `Ok(None)` if there is none
    async fn find_client_by_id(&self, client_id: &str) -> Result<Option<Client>>;
}

/// Parses a JSON array of clients.
///
/// ```
/// use idsrv_auth::store::parse_clients;
///
/// let clients = parse_clients(
///     r#"[{"client_id": "web", "secrets": [{"type": "plain_text_secret", "value": "s3cret"}]},
///         {"client_id": "spa", "require_client_secret": false}]"#,
/// ).unwrap();
/// assert_eq!(clients.len(), 2);
/// assert!(!clients[1].require_client_secret);
/// ```
pub fn parse_clients(json: &str) -> Result<Vec<Client>> {
    serde_json::from_str(json).map_err(|e| anyhow!("Failed to parse client registry: {e:?}"))
}

/// Client registry held in memory
#[derive(Debug, Default)]
pub struct InMemoryClientStore {
    clients: HashMap<String, Client>,
}

impl InMemoryClientStore {
    /// Fails if two clients share an identifier
    pub fn new(clients: impl IntoIterator<Item = Client>) -> Result<Self> {
        let mut map = HashMap::new();
        for client in clients {
            if map.contains_key(&client.client_id) {
                bail!("duplicate client_id {}", client.client_id);
            }
            map.insert(client.client_id.clone(), client);
        }
        Ok(Self { clients: map })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::new(parse_clients(json)?)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[async_trait]
impl ClientStore for InMemoryClientStore {
    async fn find_client_by_id(&self, client_id: &str) -> Result<Option<Client>> {
        Ok(self.clients.get(client_id).cloned())
    }
}
