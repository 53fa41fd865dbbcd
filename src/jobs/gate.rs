//! Role/status gate: which job actions a viewer may see.
//!
//! Pure functions; no I/O. The dispatcher asks the same gate before
//! issuing a call, so a button that is not shown cannot be triggered.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::accounts::Role;
use crate::error::GateError;
use crate::jobs::model::JobStatus;

/// A button or display element on a job card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobAction {
    Save,
    Unsave,
    ApplyNow,
    Cancel,
    StartShift,
    /// Running timer display for an ongoing shift.
    ShiftTimer,
    EndShift,
    TrackLocation,
    ShareLocation,
    Feedback,
}

impl std::fmt::Display for JobAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Save => "save",
            Self::Unsave => "unsave",
            Self::ApplyNow => "apply_now",
            Self::Cancel => "cancel",
            Self::StartShift => "start_shift",
            Self::ShiftTimer => "shift_timer",
            Self::EndShift => "end_shift",
            Self::TrackLocation => "track_location",
            Self::ShareLocation => "share_location",
            Self::Feedback => "feedback",
        };
        write!(f, "{s}")
    }
}

/// Who is looking at the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub role: Role,
    /// Applicant only: has an application on this job.
    pub has_applied: bool,
    /// Applicant only: the job is in the (optimistic) saved set.
    pub is_saved: bool,
}

impl Viewer {
    pub fn client() -> Self {
        Self {
            role: Role::Client,
            has_applied: false,
            is_saved: false,
        }
    }

    pub fn applicant(has_applied: bool, is_saved: bool) -> Self {
        Self {
            role: Role::Applicant,
            has_applied,
            is_saved,
        }
    }
}

/// Ordered actions for a known status.
pub fn actions_for(viewer: &Viewer, status: JobStatus) -> Vec<JobAction> {
    use JobAction::*;
    use JobStatus::*;

    match (viewer.role, status) {
        (Role::Client, Upcoming) => vec![Cancel, StartShift],
        (Role::Client, Ongoing) => vec![ShiftTimer, EndShift],
        (Role::Client, Completed | Canceled) => vec![Feedback],

        (Role::Applicant, status) if !viewer.has_applied => {
            let toggle = if viewer.is_saved { Unsave } else { Save };
            if status == Upcoming {
                vec![toggle, ApplyNow]
            } else {
                vec![toggle]
            }
        }
        (Role::Applicant, Upcoming) => vec![TrackLocation],
        (Role::Applicant, Ongoing) => vec![ShiftTimer, ShareLocation],
        (Role::Applicant, Completed | Canceled) => vec![Feedback],
    }
}

/// Ordered actions for a raw status string as received from the server.
///
/// Unknown statuses are an error, never an empty list.
pub fn visible_actions(viewer: &Viewer, status: &str) -> Result<Vec<JobAction>, GateError> {
    match status.parse::<JobStatus>() {
        Ok(status) => Ok(actions_for(viewer, status)),
        Err(e) => {
            warn!(status = %status, role = %viewer.role, "Unrecognized job status reached the gate");
            Err(e)
        }
    }
}

/// Whether `action` is among the visible actions.
pub fn is_permitted(viewer: &Viewer, status: &str, action: JobAction) -> Result<bool, GateError> {
    Ok(visible_actions(viewer, status)?.contains(&action))
}
