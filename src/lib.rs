//! Unkey GraphQL Gateway
//!
//! A GraphQL endpoint that checks every request's API key against the Unkey
//! verification API before the query is executed.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Authentication**: `x-unkey-api-key` header verified by an external authority
//! - **Execution**: pluggable [`services::engine::ExecutionEngine`]
//! - **Format**: GraphQL over HTTP, JSON responses
//!
//! # Request Flow
//!
//! 1. The router matches the GraphQL path
//! 2. [`middleware::auth::gate_middleware`] runs the [`services::gate::AuthGate`]
//! 3. Rejected requests get a GraphQL error and never reach the engine
//! 4. Allowed requests are executed and the engine's result is returned unchanged

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
