//! Key verification client.
//!
//! The gate talks to the verification authority through the [`KeyVerifier`] trait.
//! [`UnkeyVerifier`] is the HTTP implementation used in production; tests substitute
//! their own verifiers.
//!
//! A verification call has three possible outcomes:
//! - `Ok(verdict)` with `error: None`: the authority judged the key
//! - `Ok(verdict)` with `error: Some(..)`: the authority refused to process the key
//! - `Err(VerifyError)`: the authority could not be reached or answered nonsense
//!
//! Calls are single-shot. Retries and timeouts are left to the caller.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::models::verdict::{Diagnostic, Verdict};

/// The verification call itself failed; no verdict is available.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// Connection, TLS or client-side timeout failure.
    #[error("verification request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The authority answered with a status that carries no verdict (5xx, bare 4xx).
    #[error("verification authority returned {0}")]
    Status(StatusCode),

    /// The authority answered 2xx with a body that is not a verdict.
    #[error("verification response could not be decoded: {0}")]
    Decode(String),

    /// No answer within the configured bound.
    #[error("verification timed out after {0} ms")]
    Timeout(u128),
}

/// Validates a caller-supplied key against an external authority.
///
/// The key passed in is non-empty; implementations do not re-check that.
#[async_trait]
pub trait KeyVerifier: Send + Sync {
    async fn verify(&self, key: &str) -> Result<Verdict, VerifyError>;
}

/// Unkey `keys.verifyKey` client.
///
/// # Request
///
/// `POST {base_url}/v1/keys.verifyKey`
///
/// ```json
/// { "key": "<caller key>", "apiId": "<optional api id>" }
/// ```
///
/// # Response mapping
///
/// - 2xx `{"valid": bool, "code": "..."}` → verdict
/// - 4xx `{"error": {"message": "...", "code": "..."}}` → verdict with diagnostic
/// - anything else → [`VerifyError`]
#[derive(Debug, Clone)]
pub struct UnkeyVerifier {
    client: Client,
    base_url: String,
    root_key: Option<String>,
    api_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyKeyBody<'a> {
    key: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    api_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct VerifyKeyResponse {
    valid: bool,

    #[serde(default)]
    code: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Diagnostic,
}

impl UnkeyVerifier {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Use a preconfigured client (e.g. one with its own timeout).
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            root_key: None,
            api_id: None,
        }
    }

    /// Root key sent as a bearer token to the authority.
    pub fn with_root_key(mut self, root_key: impl Into<String>) -> Self {
        self.root_key = Some(root_key.into());
        self
    }

    /// Restrict verification to keys belonging to this API.
    pub fn with_api_id(mut self, api_id: impl Into<String>) -> Self {
        self.api_id = Some(api_id.into());
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/keys.verifyKey", self.base_url)
    }
}

#[async_trait]
impl KeyVerifier for UnkeyVerifier {
    async fn verify(&self, key: &str) -> Result<Verdict, VerifyError> {
        let body = VerifyKeyBody {
            key,
            api_id: self.api_id.as_deref(),
        };

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(root_key) = &self.root_key {
            request = request.bearer_auth(root_key);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        tracing::debug!(status = %status, "Verification authority responded");

        interpret_response(status, &bytes)
    }
}

/// Map an authority response onto a verdict or a verification failure.
fn interpret_response(status: StatusCode, body: &[u8]) -> Result<Verdict, VerifyError> {
    if status.is_success() {
        let parsed: VerifyKeyResponse =
            serde_json::from_slice(body).map_err(|e| VerifyError::Decode(e.to_string()))?;

        return Ok(Verdict {
            valid: parsed.valid,
            code: parsed.code,
            error: None,
        });
    }

    if status.is_client_error() {
        if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) {
            return Ok(Verdict {
                valid: false,
                code: envelope.error.code.clone(),
                error: Some(envelope.error),
            });
        }
    }

    Err(VerifyError::Status(status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_body_becomes_verdict() {
        let verdict =
            interpret_response(StatusCode::OK, br#"{"valid":true,"code":"VALID"}"#).unwrap();
        assert!(verdict.valid);
        assert_eq!(verdict.code.as_deref(), Some("VALID"));
        assert!(verdict.error.is_none());
    }

    #[test]
    fn invalid_key_is_still_a_verdict() {
        let verdict =
            interpret_response(StatusCode::OK, br#"{"valid":false,"code":"EXPIRED"}"#).unwrap();
        assert!(!verdict.valid);
        assert!(verdict.error.is_none());
    }

    #[test]
    fn client_error_body_becomes_diagnostic() {
        let verdict = interpret_response(
            StatusCode::NOT_FOUND,
            br#"{"error":{"code":"NOT_FOUND","message":"key not found"}}"#,
        )
        .unwrap();

        let diagnostic = verdict.error.unwrap();
        assert_eq!(diagnostic.message, "key not found");
        assert_eq!(diagnostic.code.as_deref(), Some("NOT_FOUND"));
    }

    #[test]
    fn server_error_is_a_failure_even_with_error_body() {
        let result = interpret_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            br#"{"error":{"message":"boom"}}"#,
        );
        assert!(matches!(
            result,
            Err(VerifyError::Status(StatusCode::INTERNAL_SERVER_ERROR))
        ));
    }

    #[test]
    fn bare_client_error_is_a_failure() {
        let result = interpret_response(StatusCode::UNAUTHORIZED, b"unauthorized");
        assert!(matches!(
            result,
            Err(VerifyError::Status(StatusCode::UNAUTHORIZED))
        ));
    }

    #[test]
    fn undecodable_success_body_is_a_failure() {
        let result = interpret_response(StatusCode::OK, b"<html>");
        assert!(matches!(result, Err(VerifyError::Decode(_))));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let verifier = UnkeyVerifier::new("http://localhost:8080/");
        assert_eq!(
            verifier.endpoint(),
            "http://localhost:8080/v1/keys.verifyKey"
        );
    }
}
