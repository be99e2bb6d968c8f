use crate::types::{ClientSecret, SecretType};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use rand::Rng;
use rsa::RsaPrivateKey;
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::traits::PublicKeyParts;
use serde::{Deserialize, Serialize};

/// Test client assertion claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestAssertionClaims {
    /// Issuer (the client id)
    pub iss: String,
    /// Subject (the client id)
    pub sub: String,
    /// Audience (the token endpoint)
    pub aud: String,
    /// Unique assertion identifier
    pub jti: String,
    /// Expiration time (seconds since Unix epoch)
    pub exp: i64,
    /// Issued at (seconds since Unix epoch)
    pub iat: i64,
}

/// Test key pair for signing client assertions
pub struct TestKeyPair {
    pub encoding_key: EncodingKey,
    pub public_key_pem: String,
    pub public_jwk: String,
}

impl TestKeyPair {
    /// Generate a new RSA key pair for testing
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let private_key =
            RsaPrivateKey::new(&mut rng, 2048).expect("failed to generate RSA private key");
        let public_key = private_key.to_public_key();

        let private_pem = private_key
            .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
            .expect("failed to encode private key as PEM");
        let public_pem = public_key
            .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
            .expect("failed to encode public key as PEM");

        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .expect("failed to create encoding key");

        let public_jwk = serde_json::json!({
            "kty": "RSA",
            "use": "sig",
            "alg": "RS256",
            "n": URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            "e": URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
        })
        .to_string();

        Self {
            encoding_key,
            public_key_pem: public_pem,
            public_jwk,
        }
    }

    /// The public key as a `PublicKeyPem` client secret
    pub fn pem_secret(&self) -> ClientSecret {
        ClientSecret::new(SecretType::PublicKeyPem, self.public_key_pem.clone())
    }

    /// The public key as a `JsonWebKey` client secret
    pub fn jwk_secret(&self) -> ClientSecret {
        ClientSecret::new(SecretType::JsonWebKey, self.public_jwk.clone())
    }

    /// Sign an assertion with the given claims
    pub fn create_assertion(&self, claims: &TestAssertionClaims) -> String {
        encode(&Header::new(Algorithm::RS256), claims, &self.encoding_key)
            .expect("failed to encode assertion")
    }
}

/// Random `jti` value
pub fn random_jti() -> String {
    format!("{:032x}", rand::thread_rng().r#gen::<u128>())
}

/// Claims of a valid assertion for `client_id`, expiring in one minute
pub fn assertion_claims(client_id: &str, audience: &str) -> TestAssertionClaims {
    let now = Utc::now();
    TestAssertionClaims {
        iss: client_id.to_string(),
        sub: client_id.to_string(),
        aud: audience.to_string(),
        jti: random_jti(),
        exp: (now + Duration::minutes(1)).timestamp(),
        iat: now.timestamp(),
    }
}

/// Create a valid client assertion
pub fn create_client_assertion(keypair: &TestKeyPair, client_id: &str, audience: &str) -> String {
    keypair.create_assertion(&assertion_claims(client_id, audience))
}

/// Create an expired client assertion
pub fn create_expired_client_assertion(
    keypair: &TestKeyPair,
    client_id: &str,
    audience: &str,
) -> String {
    let now = Utc::now();
    let claims = TestAssertionClaims {
        exp: (now - Duration::hours(1)).timestamp(), // Expired 1 hour ago
        iat: (now - Duration::hours(2)).timestamp(),
        ..assertion_claims(client_id, audience)
    };
    keypair.create_assertion(&claims)
}

/// Form body posting `assertion` as a `private_key_jwt` client assertion
pub fn assertion_form_body(assertion: &str) -> String {
    format!(
        "grant_type=client_credentials&client_assertion_type={}&client_assertion={assertion}",
        url::form_urlencoded::byte_serialize(
            crate::parsers::client_assertion::CLIENT_ASSERTION_TYPE_JWT_BEARER.as_bytes()
        )
        .collect::<String>()
    )
}
