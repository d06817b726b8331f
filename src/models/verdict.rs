//! Verdict model returned by the key verification authority.
//!
//! A verdict describes what the authority thinks of a key. When `error` is present it is
//! authoritative and `valid` carries no meaning.

use serde::Deserialize;

/// Result of one verification call that reached the authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the key may be used for this request
    pub valid: bool,

    /// Machine-readable reason reported with the verdict (e.g. `NOT_FOUND`, `EXPIRED`)
    ///
    /// Only used for logging; callers never see it.
    pub code: Option<String>,

    /// The authority could not process the key at all
    pub error: Option<Diagnostic>,
}

/// A problem the authority reported about the key itself (malformed, unknown, revoked).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Diagnostic {
    pub message: String,

    #[serde(default)]
    pub code: Option<String>,
}

impl Verdict {
    pub fn valid() -> Self {
        Self {
            valid: true,
            code: Some("VALID".to_string()),
            error: None,
        }
    }

    pub fn invalid(code: impl Into<String>) -> Self {
        Self {
            valid: false,
            code: Some(code.into()),
            error: None,
        }
    }

    pub fn diagnostic(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            code: None,
            error: Some(Diagnostic {
                message: message.into(),
                code: None,
            }),
        }
    }
}
