//! Data models shared by the gate, the verification client and the engine.

/// GraphQL-over-HTTP request and response shapes
pub mod graphql;
/// Verification authority verdicts
pub mod verdict;
