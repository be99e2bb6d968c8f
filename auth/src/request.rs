//! Buffered view of an incoming token endpoint request.
//!
//! The body is read completely, and bounded, before any parser looks at it.
//! Parsers only borrow the buffer, so every parser in a chain sees the same
//! bytes and the downstream handler can get them back untouched.

use crate::types::ClientCertificate;
use bytes::Bytes;
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use micromegas_tracing::prelude::*;
use percent_encoding::percent_decode;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Request surface consumed by secret parsers
#[derive(Debug, Clone, Default)]
pub struct ClientRequest {
    headers: HeaderMap,
    body: Bytes,
    client_certificate: Option<ClientCertificate>,
}

impl ClientRequest {
    pub fn new(headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            headers,
            body: body.into(),
            client_certificate: None,
        }
    }

    /// A request without headers carrying only `body`
    pub fn from_body(body: impl Into<Bytes>) -> Self {
        Self::new(HeaderMap::new(), body)
    }

    /// Attaches the TLS peer certificate supplied by the hosting layer
    pub fn with_client_certificate(mut self, certificate: ClientCertificate) -> Self {
        self.client_certificate = Some(certificate);
        self
    }

    /// Reads `body` into memory, at most `limit` bytes.
    ///
    /// Fails when the body is unreadable or larger than `limit`.
    pub async fn read(
        headers: HeaderMap,
        body: axum::body::Body,
        limit: usize,
    ) -> Result<Self, axum::Error> {
        let body = axum::body::to_bytes(body, limit).await?;
        Ok(Self::new(headers, body))
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn client_certificate(&self) -> Option<&ClientCertificate> {
        self.client_certificate.as_ref()
    }

    /// True when no content type is declared or it is form-urlencoded
    pub fn accepts_form_body(&self) -> bool {
        match self.headers.get(CONTENT_TYPE) {
            None => true,
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|ct| ct.split(';').next())
                .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(FORM_URLENCODED)),
        }
    }

    /// Decodes the body as form fields, empty when the content type is not a form
    pub fn form(&self) -> Form {
        if !self.accepts_form_body() {
            return Form::default();
        }
        Form::parse(&self.body)
    }
}

/// Decodes one form-urlencoded component, `+` standing for a space.
///
/// Returns `None` when the percent-decoded bytes are not valid UTF-8.
pub(crate) fn form_decode(raw: &[u8]) -> Option<String> {
    let raw: Vec<u8> = raw
        .iter()
        .map(|b| if *b == b'+' { b' ' } else { *b })
        .collect();
    percent_decode(&raw)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

/// Lookup result for a single form field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField<'a> {
    /// Not sent, or sent blank
    Absent,
    Present(&'a str),
    /// Sent more than once
    Repeated,
}

/// Decoded `application/x-www-form-urlencoded` pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    pairs: Vec<(String, String)>,
}

impl Form {
    /// Segments without a `=` separator do not produce a pair.
    ///
    /// A body with any name or value that does not decode to UTF-8 yields an
    /// empty form.
    pub fn parse(body: &[u8]) -> Self {
        let pairs: Option<Vec<(String, String)>> = body
            .split(|b| *b == b'&')
            .filter_map(|segment| {
                let separator = segment.iter().position(|b| *b == b'=')?;
                let (name, value) = segment.split_at(separator);
                Some((name, &value[1..]))
            })
            .map(|(name, value)| Some((form_decode(name)?, form_decode(value)?)))
            .collect();
        match pairs {
            Some(pairs) => Self { pairs },
            None => {
                debug!("form body is not valid UTF-8 once decoded");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn field(&self, name: &str) -> FormField<'_> {
        let mut values = self
            .pairs
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str());
        match (values.next(), values.next()) {
            (None, _) => FormField::Absent,
            (Some(value), None) if value.trim().is_empty() => FormField::Absent,
            (Some(value), None) => FormField::Present(value),
            (Some(_), Some(_)) => FormField::Repeated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_segments_without_separator_are_skipped() {
        assert!(Form::parse(b"malformed").is_empty());
        let form = Form::parse(b"junk&client_id=a%20b+c&&other");
        assert_eq!(form.field("client_id"), FormField::Present("a b c"));
        assert_eq!(form.field("junk"), FormField::Absent);
    }

    #[test]
    fn test_invalid_utf8_discards_form() {
        assert!(Form::parse(b"client_id=client&client_secret=%FF").is_empty());
        assert!(Form::parse(b"client_id=client&%FE=x").is_empty());
        assert_eq!(form_decode(b"%C3%A9+x"), Some("\u{e9} x".to_string()));
        assert_eq!(form_decode(b"%FF"), None);
    }

    #[test]
    fn test_blank_and_repeated_fields() {
        let form = Form::parse(b"a=%20&b=1&b=2");
        assert_eq!(form.field("a"), FormField::Absent);
        assert_eq!(form.field("b"), FormField::Repeated);
    }

    #[test]
    fn test_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("Application/X-WWW-Form-Urlencoded; charset=utf-8"),
        );
        let request = ClientRequest::new(headers.clone(), "client_id=client");
        assert!(request.accepts_form_body());
        assert!(!request.form().is_empty());

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let request = ClientRequest::new(headers, "client_id=client");
        assert!(!request.accepts_form_body());
        assert!(request.form().is_empty());
    }
}
