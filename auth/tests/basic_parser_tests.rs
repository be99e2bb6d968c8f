use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::HeaderMap;
use http::header::AUTHORIZATION;
use idsrv_auth::config::InputLengthRestrictions;
use idsrv_auth::parsers::SecretParser;
use idsrv_auth::parsers::basic::BasicAuthenticationSecretParser;
use idsrv_auth::request::ClientRequest;
use idsrv_auth::types::{ParsedSecret, ParsedSecretType};

fn request_with_authorization(value: &str) -> ClientRequest {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value.parse().unwrap());
    ClientRequest::new(headers, "")
}

fn basic(credentials: &str) -> ClientRequest {
    request_with_authorization(&format!("Basic {}", STANDARD.encode(credentials)))
}

async fn parse(request: &ClientRequest) -> Option<ParsedSecret> {
    BasicAuthenticationSecretParser::new(InputLengthRestrictions::default())
        .parse(request)
        .await
}

#[tokio::test]
async fn test_valid_basic_header() {
    let secret = parse(&basic("client:secret")).await.expect("parsed secret");
    assert_eq!(secret, ParsedSecret::shared_secret("client", "secret"));
}

#[tokio::test]
async fn test_scheme_is_case_insensitive() {
    let value = format!("basic {}", STANDARD.encode("client:secret"));
    assert!(parse(&request_with_authorization(&value)).await.is_some());
}

#[tokio::test]
async fn test_split_on_first_colon() {
    let secret = parse(&basic("client:se:cret")).await.expect("parsed secret");
    assert_eq!(secret.id, "client");
    assert_eq!(secret.text_credential(), Some("se:cret"));
}

#[tokio::test]
async fn test_form_encoded_halves() {
    let secret = parse(&basic("my%3Aclient:p%40ss+word"))
        .await
        .expect("parsed secret");
    assert_eq!(secret.id, "my:client");
    assert_eq!(secret.text_credential(), Some("p@ss word"));
}

#[tokio::test]
async fn test_missing_header() {
    assert_eq!(parse(&ClientRequest::from_body("client_id=client")).await, None);
}

#[tokio::test]
async fn test_other_scheme() {
    assert_eq!(parse(&request_with_authorization("Bearer token")).await, None);
}

#[tokio::test]
async fn test_invalid_base64() {
    assert_eq!(parse(&request_with_authorization("Basic !!!")).await, None);
}

#[tokio::test]
async fn test_no_colon() {
    assert_eq!(parse(&basic("client")).await, None);
}

#[tokio::test]
async fn test_empty_client_id() {
    assert_eq!(parse(&basic(":secret")).await, None);
}

#[tokio::test]
async fn test_empty_secret() {
    let secret = parse(&basic("client:")).await.expect("parsed secret");
    assert_eq!(secret.kind, ParsedSecretType::NoSecret);
    assert_eq!(secret.id, "client");
}

#[tokio::test]
async fn test_client_id_too_long() {
    let max = InputLengthRestrictions::default().client_id;
    let credentials = format!("{}:secret", "x".repeat(max + 1));
    assert_eq!(parse(&basic(&credentials)).await, None);
}

#[tokio::test]
async fn test_client_secret_too_long() {
    let max = InputLengthRestrictions::default().client_secret;
    let credentials = format!("client:{}", "x".repeat(max + 1));
    assert_eq!(parse(&basic(&credentials)).await, None);
}

#[tokio::test]
async fn test_huge_header_is_rejected_before_decoding() {
    let credentials = format!("client:{}", "x".repeat(100_000));
    assert_eq!(parse(&basic(&credentials)).await, None);
}

#[tokio::test]
async fn test_invalid_utf8_in_halves() {
    assert_eq!(parse(&basic("client:%FF")).await, None);
    assert_eq!(parse(&basic("%FF:secret")).await, None);
}

#[tokio::test]
async fn test_huge_configured_limits() {
    let limits = InputLengthRestrictions {
        client_id: usize::MAX / 2,
        client_secret: usize::MAX / 2,
        jwt: usize::MAX,
    };
    let secret = BasicAuthenticationSecretParser::new(limits)
        .parse(&basic("client:secret"))
        .await
        .expect("parsed secret");
    assert_eq!(secret, ParsedSecret::shared_secret("client", "secret"));
}
