//! Credential extraction from request metadata.
//!
//! Extraction is pure: it never fails and never performs I/O. A missing or empty
//! credential is reported as `None` and it is up to the gate to reject it.

use std::collections::HashMap;

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

/// Header the caller's API key is expected in.
pub const API_KEY_HEADER: &str = "x-unkey-api-key";

/// Read-only access to the metadata fields of an inbound request.
///
/// Implemented for HTTP headers and for plain string maps, so the gate does not depend
/// on a particular transport.
pub trait RequestMetadata {
    /// Value of the field `name`, if present and representable as a string.
    fn field(&self, name: &str) -> Option<&str>;
}

impl RequestMetadata for HeaderMap {
    /// Header lookup is case-insensitive. When the header is repeated only the first value
    /// is used; later values are never joined onto it. Values that are not visible ASCII are
    /// treated as absent.
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|value| value.to_str().ok())
    }
}

impl RequestMetadata for HashMap<String, String> {
    fn field(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Pull the credential token stored under `name`.
///
/// Returns `None` when the field is absent or empty.
pub fn extract_credential<'a, M>(metadata: &'a M, name: &str) -> Option<&'a str>
where
    M: RequestMetadata + ?Sized,
{
    metadata.field(name).filter(|token| !token.is_empty())
}

/// Short SHA-256 fingerprint of a key, safe to write to logs.
pub fn fingerprint(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());

    let digest = hex::encode(hasher.finalize());
    digest[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_present_header() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("good-token"));

        assert_eq!(
            extract_credential(&headers, API_KEY_HEADER),
            Some("good-token")
        );
    }

    #[test]
    fn header_name_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("good-token"));

        assert_eq!(
            extract_credential(&headers, "X-Unkey-Api-Key"),
            Some("good-token")
        );
    }

    #[test]
    fn missing_or_empty_header_is_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_credential(&headers, API_KEY_HEADER), None);

        headers.insert(API_KEY_HEADER, HeaderValue::from_static(""));
        assert_eq!(extract_credential(&headers, API_KEY_HEADER), None);
    }

    #[test]
    fn non_ascii_header_value_is_none() {
        let mut headers = HeaderMap::new();
        headers.insert(
            API_KEY_HEADER,
            HeaderValue::from_bytes(b"caf\xe9").unwrap(),
        );

        assert_eq!(extract_credential(&headers, API_KEY_HEADER), None);
    }

    #[test]
    fn repeated_header_uses_first_value() {
        let mut headers = HeaderMap::new();
        headers.append(API_KEY_HEADER, HeaderValue::from_static("first-token"));
        headers.append(API_KEY_HEADER, HeaderValue::from_static("second-token"));

        assert_eq!(
            extract_credential(&headers, API_KEY_HEADER),
            Some("first-token")
        );
    }

    #[test]
    fn other_headers_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer good-token"));

        assert_eq!(extract_credential(&headers, API_KEY_HEADER), None);
    }

    #[test]
    fn works_over_plain_maps() {
        let mut metadata = HashMap::new();
        metadata.insert(API_KEY_HEADER.to_string(), "good-token".to_string());

        assert_eq!(
            extract_credential(&metadata, API_KEY_HEADER),
            Some("good-token")
        );
        assert_eq!(extract_credential(&metadata, "x-other"), None);
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        let a = fingerprint("good-token");
        assert_eq!(a.len(), 12);
        assert_eq!(a, fingerprint("good-token"));
        assert_ne!(a, fingerprint("bad-token"));
        assert!(!a.contains("good"));
    }
}
