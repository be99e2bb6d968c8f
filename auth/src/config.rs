use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::env::VarError;
use std::time::Duration;

const DEFAULT_CLIENT_ID_MAX_LENGTH: usize = 100;
const DEFAULT_CLIENT_SECRET_MAX_LENGTH: usize = 100;
const DEFAULT_JWT_MAX_LENGTH: usize = 51200;
const DEFAULT_MAX_REQUEST_BODY_BYTES: usize = 128 * 1024;
const DEFAULT_CLIENT_LOOKUP_TIMEOUT_MS: u64 = 5000;
const DEFAULT_ASSERTION_REPLAY_CACHE_SIZE: u64 = 10_000;
const DEFAULT_MAX_ASSERTION_LIFETIME_SECS: u64 = 600;

/// Environment variable holding the JSON configuration
pub const CONFIG_ENV_VAR: &str = "IDSRV_CLIENT_AUTH_CONFIG";

/// Upper bounds on client supplied values, in characters
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InputLengthRestrictions {
    /// Max length of a client identifier (default: 100)
    pub client_id: usize,
    /// Max length of a shared secret (default: 100)
    pub client_secret: usize,
    /// Max length of a client assertion (default: 51200)
    pub jwt: usize,
}

impl Default for InputLengthRestrictions {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID_MAX_LENGTH,
            client_secret: DEFAULT_CLIENT_SECRET_MAX_LENGTH,
            jwt: DEFAULT_JWT_MAX_LENGTH,
        }
    }
}

/// Client authentication configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientAuthConfig {
    pub input_length_restrictions: InputLengthRestrictions,
    /// Request bodies larger than this are not buffered (default: 128 KiB)
    pub max_request_body_bytes: usize,
    /// Client store lookup timeout in milliseconds (default: 5000)
    pub client_lookup_timeout_ms: u64,
    /// Accepted `aud` values of client assertions, usually the token endpoint URL
    pub assertion_audiences: Vec<String>,
    /// Max number of remembered assertion `jti`s, assertions beyond it are refused (default: 10000)
    pub assertion_replay_cache_size: u64,
    /// Longest accepted assertion lifetime in seconds (default: 600)
    pub max_assertion_lifetime_secs: u64,
}

impl Default for ClientAuthConfig {
    fn default() -> Self {
        Self {
            input_length_restrictions: InputLengthRestrictions::default(),
            max_request_body_bytes: DEFAULT_MAX_REQUEST_BODY_BYTES,
            client_lookup_timeout_ms: DEFAULT_CLIENT_LOOKUP_TIMEOUT_MS,
            assertion_audiences: Vec::new(),
            assertion_replay_cache_size: DEFAULT_ASSERTION_REPLAY_CACHE_SIZE,
            max_assertion_lifetime_secs: DEFAULT_MAX_ASSERTION_LIFETIME_SECS,
        }
    }
}

impl ClientAuthConfig {
    /// Parses a JSON document, missing fields take their default value
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| anyhow!("Failed to parse client auth config: {e:?}"))
    }

    /// Load configuration from `IDSRV_CLIENT_AUTH_CONFIG`, defaults when unset
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(json) => Self::from_json(&json)
                .map_err(|e| anyhow!("Invalid {CONFIG_ENV_VAR}: {e}")),
            Err(VarError::NotPresent) => Ok(Self::default()),
            Err(e) => Err(anyhow!("Invalid {CONFIG_ENV_VAR}: {e}")),
        }
    }

    pub fn client_lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.client_lookup_timeout_ms)
    }

    pub fn max_assertion_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_assertion_lifetime_secs)
    }
}
