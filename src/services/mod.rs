//! Gateway services.
//!
//! Services hold the logic behind the HTTP layer: the authorization gate, the client for
//! the key verification authority, and the execution engine allowed requests reach.

pub mod engine;
pub mod gate;
pub mod verification;
