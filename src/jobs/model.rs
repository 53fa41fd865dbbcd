//! Job data model: the job record, lifecycle status, and list filtering.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GateError;

/// Server-assigned job identifier.
pub type JobId = i64;

/// Lifecycle status of a job.
///
/// Valid transitions: Upcoming → Ongoing → Completed, or Upcoming → Canceled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Upcoming,
    Ongoing,
    Completed,
    Canceled,
}

impl JobStatus {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, target),
            (Upcoming, Ongoing) | (Ongoing, Completed) | (Upcoming, Canceled)
        )
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Canceled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upcoming" => Ok(Self::Upcoming),
            "ongoing" => Ok(Self::Ongoing),
            "completed" => Ok(Self::Completed),
            "canceled" => Ok(Self::Canceled),
            _ => Err(GateError::InvalidStatus(s.to_string())),
        }
    }
}

/// Day or night shift. The server's finer-grained slots fold into these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftType {
    #[serde(alias = "morning", alias = "afternoon")]
    Day,
    Night,
}

/// Single-day or multi-day job. The posting form submits "1" / "2".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    #[serde(alias = "1")]
    SingleDay,
    #[serde(alias = "2")]
    MultipleDays,
}

/// Payment state of a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    #[serde(alias = "Pending")]
    Pending,
    #[serde(alias = "Held")]
    Held,
    #[serde(alias = "Partial")]
    Partial,
    #[serde(alias = "Completed")]
    Completed,
    #[serde(alias = "Failed")]
    Failed,
    #[serde(alias = "Refunded")]
    Refunded,
}

/// Where an applicant stands on a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Applied,
    Shortlisted,
    Accepted,
    Rejected,
}

/// One applicant's application to a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub applicant_id: i64,
    #[serde(default)]
    pub applicant_name: String,
    pub status: ApplicationStatus,
}

/// A posted work shift, as consumed by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Currency per hour.
    #[serde(default)]
    pub rate: Decimal,
    /// Worked hours, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Decimal>,
    #[serde(default = "default_applicants_needed")]
    pub applicants_needed: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, with = "clock::option", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "clock::option", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_type: Option<ShiftType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<JobType>,
    /// Raw status as sent by the server; interpreted by the gate.
    pub status: String,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    /// User id of the client who posted the job.
    #[serde(default, alias = "employer_id", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_fee: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_shift_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub applicants: Vec<Application>,
}

fn default_applicants_needed() -> u32 {
    1
}

impl Job {
    /// Parsed lifecycle status. Unknown values are an `InvalidStatus`.
    pub fn status(&self) -> Result<JobStatus, GateError> {
        self.status.parse()
    }

    pub fn set_status(&mut self, status: JobStatus) {
        self.status = status.as_str().to_string();
    }

    pub fn applicant(&self, applicant_id: i64) -> Option<&Application> {
        self.applicants.iter().find(|a| a.applicant_id == applicant_id)
    }

    pub fn applicant_mut(&mut self, applicant_id: i64) -> Option<&mut Application> {
        self.applicants
            .iter_mut()
            .find(|a| a.applicant_id == applicant_id)
    }

    /// Time on the clock for an ongoing shift.
    pub fn shift_elapsed(&self, now: DateTime<Utc>) -> Option<TimeDelta> {
        match self.status() {
            Ok(JobStatus::Ongoing) => self.actual_shift_start.map(|start| now - start),
            _ => None,
        }
    }
}

/// Render an elapsed shift as `HH:MM:SS` for the running timer.
pub fn format_elapsed(elapsed: TimeDelta) -> String {
    let secs = elapsed.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Status tab on job lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(JobStatus),
}

/// List filter: a status tab plus a case-insensitive title search.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: StatusFilter,
    pub search: String,
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => job.status().map(|s| s == wanted).unwrap_or(false),
        };
        let needle = self.search.trim().to_lowercase();
        status_ok && (needle.is_empty() || job.title.to_lowercase().contains(&needle))
    }

    pub fn apply<'a, I>(&self, jobs: I) -> Vec<&'a Job>
    where
        I: IntoIterator<Item = &'a Job>,
    {
        jobs.into_iter().filter(|j| self.matches(j)).collect()
    }
}

/// Create-job payload. Carries no lifecycle status; the server assigns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewJob {
    pub title: String,
    pub location: String,
    pub industry: String,
    pub subcategory: String,
    pub rate: Decimal,
    pub applicants_needed: u32,
    pub job_type: JobType,
    pub shift_type: ShiftType,
    pub date: NaiveDate,
    #[serde(serialize_with = "clock::serialize")]
    pub start_time: NaiveTime,
    #[serde(serialize_with = "clock::serialize")]
    pub end_time: NaiveTime,
    pub payment_status: PaymentStatus,
}

/// Server acknowledgement of a new job.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedJob {
    pub job_id: JobId,
    pub transaction_ref: Uuid,
    /// Scheduled hours.
    #[serde(default)]
    pub duration: Option<Decimal>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Time-of-day serde: writes `HH:MM`, reads `HH:MM` or `HH:MM:SS`.
pub(crate) mod clock {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const WRITE_FORMAT: &str = "%H:%M";

    pub fn parse(raw: &str) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
            .or_else(|_| NaiveTime::parse_from_str(raw, WRITE_FORMAT))
            .ok()
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format(WRITE_FORMAT).to_string())
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
            match time {
                Some(t) => super::serialize(t, s),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
            let raw: Option<String> = Option::deserialize(d)?;
            match raw {
                None => Ok(None),
                Some(s) => parse(&s)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid time {s:?}"))),
            }
        }
    }
}
