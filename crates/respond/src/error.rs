// respond/src/error.rs — failure descriptor, status capabilities and the crate's own errors
use once_cell::sync::Lazy;
use serde::Serialize;
use std::fmt;

/// Status used whenever a failure carries no HTTP status of its own.
pub const INTERNAL_STATUS: u16 = 500;

/// Descriptor reported when a failure path is taken without any error.
pub static UNKNOWN_ERROR: Lazy<Failure> =
    Lazy::new(|| Failure::new(INTERNAL_STATUS, "unknown error"));

// ════════════════════════════════════════════════════════════
// 1. Capabilities
// ════════════════════════════════════════════════════════════

/// An error that knows which HTTP status it should be reported with, via `status()`.
///
/// Only takes effect once the type is registered with
/// [`Classifier::with_status`](crate::Classifier::with_status); unregistered types are reported as 500.
pub trait ErrorWithStatus: std::error::Error {
    fn status(&self) -> u16;
}

/// An error that knows which HTTP status it should be reported with, via `status_code()`.
///
/// Only takes effect once the type is registered with
/// [`Classifier::with_status_code`](crate::Classifier::with_status_code); unregistered types are reported as 500.
pub trait ErrorWithStatusCode: std::error::Error {
    fn status_code(&self) -> u16;
}

/// An error that knows which HTTP status it should be reported with, via `code()`.
///
/// Only takes effect once the type is registered with
/// [`Classifier::with_code`](crate::Classifier::with_code); unregistered types are reported as 500.
pub trait ErrorWithCode: std::error::Error {
    fn code(&self) -> u16;
}

// ════════════════════════════════════════════════════════════
// 2. Failure descriptor
// ════════════════════════════════════════════════════════════

/// The `{status, message}` pair written as the JSON body of every failed response.
///
/// The message always comes from the error's `Display`, never from the status
/// capability, so a type can say "this is a 404" without formatting its own text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub status: u16,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl Failure {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// The descriptor for "failed, but nobody said why".
    pub fn unknown() -> Self {
        UNKNOWN_ERROR.clone()
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_STATUS, message)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Failure {}

impl ErrorWithStatusCode for Failure {
    fn status_code(&self) -> u16 {
        self.status
    }
}

// ════════════════════════════════════════════════════════════
// 3. Errors raised by the responder itself
// ════════════════════════════════════════════════════════════

/// Failures produced while building a response. None of them carry a status,
/// so they are all reported as 500s.
#[derive(Debug, thiserror::Error)]
pub enum RespondError {
    #[error("unable to redirect to empty url")]
    EmptyRedirect,
    #[error("invalid value for header {name}")]
    InvalidHeader { name: &'static str },
    #[error("json marshal error: {0}")]
    Json(#[from] serde_json::Error),
}
