//! Authorization gate.
//!
//! The gate runs once per inbound request, before the execution engine sees the payload:
//!
//! 1. Extract the credential from the request metadata
//! 2. No credential → reject with "No API Key provided"
//! 3. Verify the credential with the authority (the only suspension point)
//! 4. Diagnostic from the authority → reject with that message, verbatim
//! 5. Key not valid → reject with "API Key is not valid for this request"
//! 6. Otherwise proceed, leaving the request untouched
//!
//! A verification call that fails outright, or does not finish within the configured
//! timeout, rejects with [`Rejection::VerificationUnavailable`], which the transport
//! renders as a 503 rather than an authentication message.
//!
//! The gate holds no per-request state. Concurrent evaluations share only the verifier,
//! which is read-only from the gate's point of view.

use std::{sync::Arc, time::Duration};

use axum::http::HeaderName;

use crate::{
    middleware::credential::{RequestMetadata, extract_credential, fingerprint},
    services::verification::{KeyVerifier, VerifyError},
};

/// The request may continue to the execution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Proceed;

/// Why the gate refused a request.
#[derive(Debug, thiserror::Error)]
pub enum Rejection {
    /// No credential field, or an empty one.
    #[error("No API Key provided")]
    MissingCredential,

    /// The authority reported a problem with the key; the message is passed through.
    #[error("{0}")]
    VerificationDiagnostic(String),

    /// The key was verified and is not valid.
    #[error("API Key is not valid for this request")]
    InvalidCredential,

    /// The authority could not be asked.
    #[error("API Key verification is currently unavailable")]
    VerificationUnavailable(#[source] VerifyError),
}

impl Rejection {
    /// Message shown to the caller.
    pub fn reason(&self) -> String {
        self.to_string()
    }

    /// Clean rejections are the caller's fault; the rest is ours.
    pub fn is_clean(&self) -> bool {
        !matches!(self, Rejection::VerificationUnavailable(_))
    }
}

/// Allow/deny decision for one request.
pub type Decision = Result<Proceed, Rejection>;

/// Gate that checks every request's API key before execution.
#[derive(Clone)]
pub struct AuthGate {
    verifier: Arc<dyn KeyVerifier>,
    header: HeaderName,
    timeout: Duration,
}

impl AuthGate {
    /// # Arguments
    ///
    /// * `verifier` - Client for the verification authority
    /// * `header` - Metadata field carrying the credential
    /// * `timeout` - Upper bound on a single verification call
    pub fn new(verifier: Arc<dyn KeyVerifier>, header: HeaderName, timeout: Duration) -> Self {
        Self {
            verifier,
            header,
            timeout,
        }
    }

    /// Decide whether a request carrying `metadata` may proceed.
    ///
    /// Dropping the returned future abandons the verification call; its result is never
    /// applied.
    pub async fn evaluate<M>(&self, metadata: &M) -> Decision
    where
        M: RequestMetadata + ?Sized,
    {
        let Some(key) = extract_credential(metadata, self.header.as_str()) else {
            tracing::info!("Rejected request without API key");
            return Err(Rejection::MissingCredential);
        };

        let key_id = fingerprint(key);

        let verdict = match tokio::time::timeout(self.timeout, self.verifier.verify(key)).await {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(e)) => {
                tracing::error!(key = %key_id, error = %e, "API key verification failed");
                return Err(Rejection::VerificationUnavailable(e));
            }
            Err(_) => {
                let e = VerifyError::Timeout(self.timeout.as_millis());
                tracing::error!(key = %key_id, error = %e, "API key verification failed");
                return Err(Rejection::VerificationUnavailable(e));
            }
        };

        // A diagnostic outranks the validity flag
        if let Some(diagnostic) = verdict.error {
            tracing::info!(
                key = %key_id,
                code = diagnostic.code.as_deref().unwrap_or("-"),
                "Verification authority refused API key"
            );
            return Err(Rejection::VerificationDiagnostic(diagnostic.message));
        }

        if !verdict.valid {
            tracing::info!(
                key = %key_id,
                code = verdict.code.as_deref().unwrap_or("-"),
                "Rejected invalid API key"
            );
            return Err(Rejection::InvalidCredential);
        }

        tracing::debug!(key = %key_id, "API key accepted");
        Ok(Proceed)
    }
}
