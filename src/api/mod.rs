//! Marketplace API seam.
//!
//! [`JobApi`] is the single async interface the dispatcher talks to. The
//! production implementation is [`HttpJobApi`]; tests substitute stubs.

pub mod http;

pub use http::HttpJobApi;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::accounts::{LoginRequest, LoginResponse, Profile, SignupRequest, WalletBalance};
use crate::error::RequestError;
use crate::jobs::model::{CreatedJob, Job, JobId, NewJob};
use crate::jobs::payment::{PaymentInit, PaymentProvider, PaymentRequest, PaymentVerification};

/// Which job list to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobScope {
    /// Every open listing (applicant browse view).
    All,
    /// Jobs posted by the signed-in client.
    Posted,
}

/// Response to starting a shift.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShiftStarted {
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
}

/// Response to ending a shift.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShiftEnded {
    /// Worked hours.
    #[serde(default)]
    pub duration: Option<Decimal>,
}

/// Feedback for the other party on a finished job.
#[derive(Debug, Clone, Serialize)]
pub struct RatingRequest {
    pub job_id: JobId,
    /// User being rated.
    pub reviewed_id: i64,
    pub rating: u8,
    pub feedback: String,
}

/// Server acknowledgement of a rating.
#[derive(Debug, Clone, Deserialize)]
pub struct RatingReceipt {
    pub rating_id: i64,
}

/// Backend-agnostic marketplace API.
///
/// Each method is exactly one request. Implementations never retry.
#[async_trait]
pub trait JobApi: Send + Sync {
    // ── Accounts ────────────────────────────────────────────────────

    /// Current user's profile and role.
    async fn whoami(&self) -> Result<Profile, RequestError>;

    async fn wallet_balance(&self) -> Result<WalletBalance, RequestError>;

    async fn signup(&self, request: &SignupRequest) -> Result<(), RequestError>;

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, RequestError>;

    // ── Jobs ────────────────────────────────────────────────────────

    async fn list_jobs(&self, scope: JobScope) -> Result<Vec<Job>, RequestError>;

    /// Fresh copy of a single job.
    async fn get_job(&self, id: JobId) -> Result<Job, RequestError>;

    async fn create_job(&self, job: &NewJob) -> Result<CreatedJob, RequestError>;

    async fn apply(&self, id: JobId) -> Result<(), RequestError>;

    // ── Saved jobs ──────────────────────────────────────────────────

    async fn save_job(&self, id: JobId) -> Result<(), RequestError>;

    async fn unsave_job(&self, id: JobId) -> Result<(), RequestError>;

    async fn saved_job_ids(&self) -> Result<Vec<JobId>, RequestError>;

    // ── Applicants ──────────────────────────────────────────────────

    async fn accept_applicant(&self, id: JobId, applicant_id: i64) -> Result<(), RequestError>;

    async fn decline_applicant(&self, id: JobId, applicant_id: i64) -> Result<(), RequestError>;

    // ── Shift lifecycle ─────────────────────────────────────────────

    async fn start_shift(&self, id: JobId) -> Result<ShiftStarted, RequestError>;

    async fn end_shift(&self, id: JobId) -> Result<ShiftEnded, RequestError>;

    async fn cancel_shift(&self, id: JobId) -> Result<(), RequestError>;

    async fn submit_rating(&self, request: &RatingRequest) -> Result<RatingReceipt, RequestError>;

    // ── Payments ────────────────────────────────────────────────────

    async fn initialize_payment(
        &self,
        provider: PaymentProvider,
        request: &PaymentRequest,
    ) -> Result<PaymentInit, RequestError>;

    async fn verify_payment(
        &self,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<PaymentVerification, RequestError>;
}
