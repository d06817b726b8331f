//! GraphQL-over-HTTP request and response models.
//!
//! Rejections from the gate are rendered with the same [`GraphQlResponse`] shape as
//! execution errors, so callers only ever see one error convention.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An inbound GraphQL operation, as sent in a POST body or GET query string.
///
/// ```json
/// {
///   "query": "{ hello }",
///   "operationName": null,
///   "variables": {}
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    pub query: String,

    #[serde(default)]
    pub operation_name: Option<String>,

    #[serde(default)]
    pub variables: Option<Value>,
}

impl GraphQlRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            operation_name: None,
            variables: None,
        }
    }
}

/// Execution result. `data` is omitted when no execution took place and `errors` is
/// omitted when empty, so a clean result serializes as `{"data": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphQlResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphQlError {
    pub message: String,
}

impl GraphQlResponse {
    pub fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// A request-level failure: no `data` key, a single error.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            errors: vec![GraphQlError {
                message: message.into(),
            }],
        }
    }
}
