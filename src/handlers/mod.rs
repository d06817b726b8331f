//! HTTP request handlers (route handlers).
//!
//! Handlers only run for requests the authorization gate let through, except for the
//! public health check.

/// GraphQL endpoint
pub mod graphql;
/// Liveness endpoint
pub mod health;
