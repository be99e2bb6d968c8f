use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Kind of credential material found in a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParsedSecretType {
    /// A client was identified but presented no secret
    NoSecret,
    /// Symmetric secret (client_secret_basic / client_secret_post)
    SharedSecret,
    /// TLS client certificate (mutual TLS)
    X509Certificate,
    /// Signed client assertion (private_key_jwt)
    JwtBearer,
}

impl Display for ParsedSecretType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ParsedSecretType::NoSecret => "no_secret",
            ParsedSecretType::SharedSecret => "shared_secret",
            ParsedSecretType::X509Certificate => "x509_certificate",
            ParsedSecretType::JwtBearer => "jwt_bearer",
        };
        f.write_str(name)
    }
}

/// Peer certificate as reported by the TLS terminator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCertificate {
    /// Hex encoded certificate thumbprint, separators allowed
    pub thumbprint: String,
    /// Subject distinguished name, e.g. `CN=client, O=Example`
    pub subject: String,
}

/// Credential carried by a `ParsedSecret`
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Shared secret or serialized assertion
    Text(String),
    /// Certificate presented during the TLS handshake
    Certificate(ClientCertificate),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Text(_) => f.write_str("Text(<sensitive>)"),
            Credential::Certificate(cert) => f.debug_tuple("Certificate").field(cert).finish(),
        }
    }
}

/// Canonical, transport-agnostic form of the credential a request presented.
///
/// Built fresh for every request and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSecret {
    /// Claimed client identifier
    pub id: String,
    /// Credential material, `None` for `NoSecret`
    pub credential: Option<Credential>,
    /// How the credential was transmitted
    pub kind: ParsedSecretType,
}

impl ParsedSecret {
    /// A client identifier without any secret
    pub fn no_secret(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            credential: None,
            kind: ParsedSecretType::NoSecret,
        }
    }

    /// A client identifier with a shared secret
    pub fn shared_secret(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            credential: Some(Credential::Text(secret.into())),
            kind: ParsedSecretType::SharedSecret,
        }
    }

    /// A client identifier with a signed assertion
    pub fn jwt_bearer(id: impl Into<String>, assertion: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            credential: Some(Credential::Text(assertion.into())),
            kind: ParsedSecretType::JwtBearer,
        }
    }

    /// A client identifier with a TLS client certificate
    pub fn certificate(id: impl Into<String>, certificate: ClientCertificate) -> Self {
        Self {
            id: id.into(),
            credential: Some(Credential::Certificate(certificate)),
            kind: ParsedSecretType::X509Certificate,
        }
    }

    /// Returns the textual credential, if any
    pub fn text_credential(&self) -> Option<&str> {
        match &self.credential {
            Some(Credential::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Returns the certificate credential, if any
    pub fn certificate_credential(&self) -> Option<&ClientCertificate> {
        match &self.credential {
            Some(Credential::Certificate(cert)) => Some(cert),
            _ => None,
        }
    }
}

/// Storage scheme of a configured client secret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretType {
    /// Base64 SHA-256 or SHA-512 digest of a shared secret
    SharedSecret,
    /// Shared secret stored as is
    PlainTextSecret,
    /// Certificate thumbprint (hex)
    X509Thumbprint,
    /// Certificate subject distinguished name
    X509Name,
    /// Public key as a JSON Web Key
    JsonWebKey,
    /// Public key as PEM (RSA or EC)
    PublicKeyPem,
}

/// A secret registered for a client
#[derive(Clone, Deserialize)]
pub struct ClientSecret {
    #[serde(rename = "type")]
    pub kind: SecretType,
    pub value: String,
    #[serde(default)]
    pub expiration: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<String>,
}

impl std::fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecret")
            .field("kind", &self.kind)
            .field("value", &"(not printed)")
            .field("expiration", &self.expiration)
            .field("description", &self.description)
            .finish()
    }
}

impl ClientSecret {
    /// Creates a secret without expiration or description
    pub fn new(kind: SecretType, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            expiration: None,
            description: None,
        }
    }

    pub fn with_expiration(mut self, expiration: DateTime<Utc>) -> Self {
        self.expiration = Some(expiration);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// A secret whose expiration is at or before `now` is expired
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration.is_some_and(|expiration| expiration <= now)
    }
}

fn default_true() -> bool {
    true
}

/// A registered client as seen by the authentication path
#[derive(Debug, Clone, Deserialize)]
pub struct Client {
    pub client_id: String,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Public clients set this to false
    #[serde(default = "default_true")]
    pub require_client_secret: bool,
    #[serde(default)]
    pub secrets: Vec<ClientSecret>,
}

impl Client {
    /// Creates an enabled confidential client without secrets
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_name: None,
            enabled: true,
            require_client_secret: true,
            secrets: Vec::new(),
        }
    }

    pub fn with_secret(mut self, secret: ClientSecret) -> Self {
        self.secrets.push(secret);
        self
    }

    pub fn public(mut self) -> Self {
        self.require_client_secret = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}
