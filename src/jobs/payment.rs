//! Payment quoting and gateway payloads.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::jobs::model::{Job, JobId};

/// Platform service fee, as a fraction of the job rate.
pub const SERVICE_FEE_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Supported payment gateways.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentProvider {
    Paystack,
    Flutterwave,
}

impl PaymentProvider {
    /// Path segment used by the payments API.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Paystack => "paystack",
            Self::Flutterwave => "flutterwave",
        }
    }
}

impl std::fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl std::str::FromStr for PaymentProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paystack" => Ok(Self::Paystack),
            "flutterwave" => Ok(Self::Flutterwave),
            other => Err(format!("unknown payment provider {other:?}")),
        }
    }
}

/// What the client pays for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentQuote {
    pub rate: Decimal,
    pub service_fee: Decimal,
    pub total: Decimal,
}

impl PaymentQuote {
    pub fn for_rate(rate: Decimal) -> Self {
        let service_fee = (rate * SERVICE_FEE_RATE).round_dp(2);
        Self {
            rate,
            service_fee,
            total: rate + service_fee,
        }
    }

    /// Prefers the server's totals when the job carries them.
    pub fn for_job(job: &Job) -> Self {
        match (job.service_fee, job.total_amount) {
            (Some(service_fee), Some(total)) if total > Decimal::ZERO => Self {
                rate: job.rate,
                service_fee,
                total,
            },
            _ => Self::for_rate(job.rate),
        }
    }
}

/// Body of an initialize-payment call.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    pub job_id: JobId,
    pub amount: Decimal,
    pub email: String,
    pub currency: String,
}

/// Gateway checkout handle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentInit {
    #[serde(alias = "link")]
    pub authorization_url: String,
    #[serde(alias = "tx_ref")]
    pub reference: String,
}

/// Result of verifying a gateway transaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentVerification {
    pub status: String,
    #[serde(default)]
    pub reference: Option<String>,
}

impl PaymentVerification {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success") || self.status.eq_ignore_ascii_case("successful")
    }
}
