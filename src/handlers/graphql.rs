//! GraphQL endpoint handlers.
//!
//! This module implements the GraphQL-over-HTTP endpoint:
//! - GET {path}?query=...&operationName=...&variables=... - Execute from the query string
//! - POST {path} - Execute a JSON body
//!
//! Both routes sit behind the authorization gate.

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde::Deserialize;

use crate::{
    app::AppState,
    error::AppError,
    models::graphql::{GraphQlRequest, GraphQlResponse},
};

/// Query string parameters of a GET request.
///
/// `variables` arrives as a JSON-encoded string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlParams {
    pub query: Option<String>,
    pub operation_name: Option<String>,
    pub variables: Option<String>,
}

impl TryFrom<GraphQlParams> for GraphQlRequest {
    type Error = AppError;

    fn try_from(params: GraphQlParams) -> Result<Self, Self::Error> {
        let query = params
            .query
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| AppError::InvalidRequest("Must provide query string.".to_string()))?;

        let variables = params
            .variables
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|_| {
                    AppError::InvalidRequest("Variables are invalid JSON.".to_string())
                })
            })
            .transpose()?;

        Ok(GraphQlRequest {
            query,
            operation_name: params.operation_name,
            variables,
        })
    }
}

/// Execute a GraphQL operation sent as a query string.
///
/// # Endpoint
///
/// `GET /graphql?query={hello}`
///
/// # Response
///
/// - **Success (200 OK)**: `{"data": {"hello": "world"}}`
/// - **Error (400)**: no `query` parameter, or undecodable `variables`
pub async fn execute_get(
    State(state): State<AppState>,
    params: Result<Query<GraphQlParams>, QueryRejection>,
) -> Result<Json<GraphQlResponse>, AppError> {
    let Query(params) = params.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let request = GraphQlRequest::try_from(params)?;

    Ok(Json(state.engine.execute(request).await))
}

/// Execute a GraphQL operation sent as a JSON body.
///
/// # Endpoint
///
/// `POST /graphql`
///
/// # Request Body
///
/// ```json
/// { "query": "{ hello }" }
/// ```
///
/// # Response
///
/// - **Success (200 OK)**: engine result, including GraphQL validation errors
/// - **Error (400)**: body is not JSON or has no `query`
pub async fn execute_post(
    State(state): State<AppState>,
    body: Result<Json<GraphQlRequest>, JsonRejection>,
) -> Result<Json<GraphQlResponse>, AppError> {
    let Json(request) = body.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    if request.query.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "Must provide query string.".to_string(),
        ));
    }

    tracing::debug!(operation = ?request.operation_name, "Executing GraphQL request");

    Ok(Json(state.engine.execute(request).await))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(query: Option<&str>, variables: Option<&str>) -> GraphQlParams {
        GraphQlParams {
            query: query.map(str::to_string),
            operation_name: None,
            variables: variables.map(str::to_string),
        }
    }

    #[test]
    fn query_string_becomes_request() {
        let request =
            GraphQlRequest::try_from(params(Some("{ hello }"), Some(r#"{"a":1}"#))).unwrap();
        assert_eq!(request.query, "{ hello }");
        assert_eq!(request.variables, Some(serde_json::json!({ "a": 1 })));
    }

    #[test]
    fn missing_query_is_invalid() {
        let result = GraphQlRequest::try_from(params(None, None));
        assert!(matches!(result, Err(AppError::InvalidRequest(m)) if m == "Must provide query string."));

        let result = GraphQlRequest::try_from(params(Some("  "), None));
        assert!(result.is_err());
    }

    #[test]
    fn broken_variables_are_invalid() {
        let result = GraphQlRequest::try_from(params(Some("{ hello }"), Some("{")));
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }
}
