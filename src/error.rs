//! Error types for the shift marketplace client.

use crate::jobs::model::JobId;
use crate::validation::FieldErrors;

/// Top-level error type for the client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    #[error("Gate error: {0}")]
    Gate(#[from] GateError),

    #[error("Job error: {0}")]
    Job(#[from] JobError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Local form-field failures. Always recoverable; shown inline per field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} field(s) invalid: {}", .0.len(), .0.summary())]
pub struct ValidationErrors(pub FieldErrors);

impl ValidationErrors {
    /// Message for a single field, if it failed.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field)
    }
}

/// Network or API failures. Reported once, never retried.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("{method} {path} failed: {reason}")]
    Transport {
        method: String,
        path: String,
        reason: String,
    },

    #[error("{method} {path} returned {status}: {message}")]
    Status {
        method: String,
        path: String,
        status: u16,
        message: String,
    },

    #[error("Invalid response from {path}: {reason}")]
    Decode { path: String, reason: String },
}

impl RequestError {
    /// HTTP status code, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Role/status gate errors. A data or programming error, never silent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("Unrecognized job status: {0:?}")]
    InvalidStatus(String),
}

/// Job lifecycle and session errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    #[error("Job {id} not loaded in session")]
    NotFound { id: JobId },

    #[error("Job {id} is {state}, cannot transition to {target}")]
    InvalidTransition {
        id: JobId,
        state: String,
        target: String,
    },

    #[error("Action {action} is not available on job {id}")]
    ActionNotPermitted { id: JobId, action: String },

    #[error("Applicant {applicant_id} has not applied to job {id}")]
    UnknownApplicant { id: JobId, applicant_id: i64 },

    #[error("A {action} request for job {id} is already in flight")]
    ActionInFlight { id: JobId, action: String },

    #[error("Job {id} has no one to rate")]
    NoReviewee { id: JobId },

    #[error("No profile loaded; sign in and load the profile first")]
    NoProfile,
}

/// Result type alias for the client.
pub type Result<T> = std::result::Result<T, Error>;
