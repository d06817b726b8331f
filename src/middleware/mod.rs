//! HTTP middleware components.
//!
//! Middleware run before route handlers and can short-circuit a request
//! before the handler ever sees it.

/// Authorization gate middleware
pub mod auth;
/// Credential extraction from request metadata
pub mod credential;
