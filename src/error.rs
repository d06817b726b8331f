//! Error types and HTTP error response handling.
//!
//! This module defines the errors a request can end with and how they are converted
//! into HTTP responses. Every body follows the GraphQL error convention, so a rejected
//! request looks like any other request-level failure of the engine.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{models::graphql::GraphQlResponse, services::gate::Rejection};

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Rejections**: the authorization gate refused the request
/// - **Validation Errors**: the GraphQL HTTP payload could not be read
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The gate denied the request before execution.
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// Request body or query string is not a GraphQL request.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("{0}")]
    InvalidRequest(String),
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "errors": [
///     { "message": "No API Key provided" }
///   ]
/// }
/// ```
///
/// # Status Code Mapping
///
/// - Clean rejections (missing key, authority diagnostic, invalid key) → 200 OK
/// - Verification unavailable → 503 Service Unavailable (cause is logged, not returned)
/// - `InvalidRequest` → 400 Bad Request
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Rejected(rejection) if rejection.is_clean() => StatusCode::OK,
            AppError::Rejected(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(GraphQlResponse::error(self.to_string()));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::verification::VerifyError;
    use axum::body::to_bytes;
    use serde_json::{Value, json};

    async fn render(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn clean_rejection_is_a_graphql_error() {
        let (status, body) = render(Rejection::MissingCredential.into()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "errors": [{ "message": "No API Key provided" }] }));
    }

    #[tokio::test]
    async fn diagnostic_message_is_not_rewritten() {
        let (_, body) =
            render(Rejection::VerificationDiagnostic("key not found".to_string()).into()).await;
        assert_eq!(body["errors"][0]["message"], "key not found");
    }

    #[tokio::test]
    async fn unavailable_hides_the_cause() {
        let error = Rejection::VerificationUnavailable(VerifyError::Timeout(5000));
        let (status, body) = render(error.into()).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body["errors"][0]["message"],
            "API Key verification is currently unavailable"
        );
    }

    #[tokio::test]
    async fn invalid_request_is_bad_request() {
        let (status, body) =
            render(AppError::InvalidRequest("Missing query".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["message"], "Missing query");
    }
}
