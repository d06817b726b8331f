//! Authorization gate middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the API key from the configured header
//! 2. Verify it with the authority through the gate
//! 3. Forward the untouched request to the handler, or
//! 4. Short-circuit with a GraphQL error so the handler never runs

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use tracing::Instrument;

use crate::{app::AppState, error::AppError};

/// Gate middleware function, installed with `from_fn_with_state`.
///
/// # Returns
///
/// - `Ok(Response)` produced by the next handler if the gate allowed the request
/// - `Err(AppError::Rejected)` otherwise; the body is never read
///
/// If the client disconnects while the key is being verified, this future is dropped and
/// the verification result is discarded.
pub async fn gate_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (parts, body) = request.into_parts();
    let span = tracing::info_span!(
        "auth_gate",
        method = %parts.method,
        path = %parts.uri.path()
    );

    // Step 1: Decide on the headers alone, the body is not touched
    state.gate.evaluate(&parts.headers).instrument(span).await?;

    // Step 2: Reassemble and hand the request over unchanged
    Ok(next.run(Request::from_parts(parts, body)).await)
}
