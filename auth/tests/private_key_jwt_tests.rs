use chrono::{Duration as ChronoDuration, Utc};
use idsrv_auth::test_utils::{
    TestKeyPair, assertion_claims, create_client_assertion, create_expired_client_assertion,
};
use idsrv_auth::types::{ClientSecret, ParsedSecret, SecretType};
use idsrv_auth::validators::SecretValidator;
use idsrv_auth::validators::private_key_jwt::PrivateKeyJwtSecretValidator;
use std::time::Duration;

const AUDIENCE: &str = "https://idsrv.example.com/connect/token";

fn validator() -> PrivateKeyJwtSecretValidator {
    PrivateKeyJwtSecretValidator::new(vec![AUDIENCE.to_string()], 100, Duration::from_secs(600))
}

#[tokio::test]
async fn test_valid_assertion_with_pem_key() {
    let keypair = TestKeyPair::generate();
    let assertion = create_client_assertion(&keypair, "client", AUDIENCE);
    let parsed = ParsedSecret::jwt_bearer("client", assertion);
    assert!(validator().validate(&parsed, &keypair.pem_secret()).await);
}

#[tokio::test]
async fn test_valid_assertion_with_jwk() {
    let keypair = TestKeyPair::generate();
    let assertion = create_client_assertion(&keypair, "client", AUDIENCE);
    let parsed = ParsedSecret::jwt_bearer("client", assertion);
    assert!(validator().validate(&parsed, &keypair.jwk_secret()).await);
}

#[tokio::test]
async fn test_wrong_key() {
    let signer = TestKeyPair::generate();
    let other = TestKeyPair::generate();
    let assertion = create_client_assertion(&signer, "client", AUDIENCE);
    let parsed = ParsedSecret::jwt_bearer("client", assertion);
    assert!(!validator().validate(&parsed, &other.pem_secret()).await);
}

#[tokio::test]
async fn test_wrong_audience() {
    let keypair = TestKeyPair::generate();
    let assertion = create_client_assertion(&keypair, "client", "https://elsewhere/token");
    let parsed = ParsedSecret::jwt_bearer("client", assertion);
    assert!(!validator().validate(&parsed, &keypair.pem_secret()).await);
}

#[tokio::test]
async fn test_assertion_for_another_client() {
    let keypair = TestKeyPair::generate();
    let assertion = create_client_assertion(&keypair, "client", AUDIENCE);
    let parsed = ParsedSecret::jwt_bearer("other-client", assertion);
    assert!(!validator().validate(&parsed, &keypair.pem_secret()).await);
}

#[tokio::test]
async fn test_expired_assertion() {
    let keypair = TestKeyPair::generate();
    let assertion = create_expired_client_assertion(&keypair, "client", AUDIENCE);
    let parsed = ParsedSecret::jwt_bearer("client", assertion);
    assert!(!validator().validate(&parsed, &keypair.pem_secret()).await);
}

#[tokio::test]
async fn test_lifetime_too_long() {
    let keypair = TestKeyPair::generate();
    let mut claims = assertion_claims("client", AUDIENCE);
    claims.exp = (Utc::now() + ChronoDuration::hours(2)).timestamp();
    let parsed = ParsedSecret::jwt_bearer("client", keypair.create_assertion(&claims));
    assert!(!validator().validate(&parsed, &keypair.pem_secret()).await);
}

#[tokio::test]
async fn test_replayed_assertion() {
    let keypair = TestKeyPair::generate();
    let validator = validator();
    let assertion = create_client_assertion(&keypair, "client", AUDIENCE);
    let parsed = ParsedSecret::jwt_bearer("client", assertion);
    assert!(validator.validate(&parsed, &keypair.pem_secret()).await);
    assert!(!validator.validate(&parsed, &keypair.pem_secret()).await);

    // a fresh jti is accepted
    let parsed = ParsedSecret::jwt_bearer(
        "client",
        create_client_assertion(&keypair, "client", AUDIENCE),
    );
    assert!(validator.validate(&parsed, &keypair.pem_secret()).await);
}

#[tokio::test]
async fn test_rejected_assertion_does_not_burn_jti() {
    let signer = TestKeyPair::generate();
    let other = TestKeyPair::generate();
    let validator = validator();
    let parsed = ParsedSecret::jwt_bearer(
        "client",
        create_client_assertion(&signer, "client", AUDIENCE),
    );
    assert!(!validator.validate(&parsed, &other.pem_secret()).await);
    assert!(validator.validate(&parsed, &signer.pem_secret()).await);
}

#[tokio::test]
async fn test_no_audience_configured() {
    let keypair = TestKeyPair::generate();
    let validator = PrivateKeyJwtSecretValidator::new(Vec::new(), 100, Duration::from_secs(600));
    let parsed = ParsedSecret::jwt_bearer(
        "client",
        create_client_assertion(&keypair, "client", AUDIENCE),
    );
    assert!(!validator.validate(&parsed, &keypair.pem_secret()).await);
}

#[tokio::test]
async fn test_expired_key() {
    let keypair = TestKeyPair::generate();
    let parsed = ParsedSecret::jwt_bearer(
        "client",
        create_client_assertion(&keypair, "client", AUDIENCE),
    );
    let secret = keypair
        .pem_secret()
        .with_expiration(Utc::now() - ChronoDuration::minutes(5));
    assert!(!validator().validate(&parsed, &secret).await);
}

#[tokio::test]
async fn test_garbage_key_material() {
    let keypair = TestKeyPair::generate();
    let parsed = ParsedSecret::jwt_bearer(
        "client",
        create_client_assertion(&keypair, "client", AUDIENCE),
    );
    let secret = ClientSecret::new(SecretType::JsonWebKey, "{not json");
    assert!(!validator().validate(&parsed, &secret).await);
    let secret = ClientSecret::new(SecretType::PublicKeyPem, "not a pem");
    assert!(!validator().validate(&parsed, &secret).await);
}

#[tokio::test]
async fn test_replay_rejected_for_whole_assertion_lifetime() {
    let keypair = TestKeyPair::generate();
    let validator =
        PrivateKeyJwtSecretValidator::new(vec![AUDIENCE.to_string()], 100, Duration::from_secs(2));
    let mut claims = assertion_claims("client", AUDIENCE);
    claims.exp = Utc::now().timestamp() + 2;
    let parsed = ParsedSecret::jwt_bearer("client", keypair.create_assertion(&claims));

    assert!(validator.validate(&parsed, &keypair.pem_secret()).await);
    assert!(!validator.validate(&parsed, &keypair.pem_secret()).await);
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(!validator.validate(&parsed, &keypair.pem_secret()).await);
}

#[tokio::test]
async fn test_exp_in_the_past_has_no_leeway() {
    let keypair = TestKeyPair::generate();
    let mut claims = assertion_claims("client", AUDIENCE);
    claims.exp = Utc::now().timestamp() - 5;
    let parsed = ParsedSecret::jwt_bearer("client", keypair.create_assertion(&claims));
    assert!(!validator().validate(&parsed, &keypair.pem_secret()).await);
}

#[tokio::test]
async fn test_full_replay_cache_refuses_new_assertions() {
    let keypair = TestKeyPair::generate();
    let validator =
        PrivateKeyJwtSecretValidator::new(vec![AUDIENCE.to_string()], 2, Duration::from_secs(600));
    let first = ParsedSecret::jwt_bearer(
        "client",
        create_client_assertion(&keypair, "client", AUDIENCE),
    );
    assert!(validator.validate(&first, &keypair.pem_secret()).await);
    let second = ParsedSecret::jwt_bearer(
        "other-client",
        create_client_assertion(&keypair, "other-client", AUDIENCE),
    );
    assert!(validator.validate(&second, &keypair.pem_secret()).await);

    for _ in 0..10 {
        let flood = ParsedSecret::jwt_bearer(
            "other-client",
            create_client_assertion(&keypair, "other-client", AUDIENCE),
        );
        assert!(!validator.validate(&flood, &keypair.pem_secret()).await);
    }

    // earlier jtis are still remembered
    assert!(!validator.validate(&first, &keypair.pem_secret()).await);
    assert!(!validator.validate(&second, &keypair.pem_secret()).await);
}
