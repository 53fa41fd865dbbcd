//! Session store: the signed-in user's view of the marketplace.
//!
//! Shared by `Arc`. State sits behind a tokio `RwLock`; every change is
//! fanned out on a broadcast channel so front ends can re-render.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info};

use crate::accounts::{Profile, Role};
use crate::error::JobError;
use crate::jobs::model::{ApplicationStatus, Job, JobFilter, JobId, JobStatus, PaymentStatus};
use crate::jobs::saved::SavedJobIds;

/// Default broadcast channel capacity.
const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// Change notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ProfileLoaded { user_id: i64, role: Role },
    WalletUpdated { balance: Decimal },
    JobsLoaded { count: usize },
    JobUpdated { job_id: JobId, status: String },
    Applied { job_id: JobId },
    SavedChanged { job_id: JobId, saved: bool },
    ApplicantUpdated {
        job_id: JobId,
        applicant_id: i64,
        status: ApplicationStatus,
    },
    PaymentUpdated { job_id: JobId, status: PaymentStatus },
}

/// Everything the gate needs to know about one job for the current user.
#[derive(Debug, Clone)]
pub struct JobView {
    pub job: Job,
    pub has_applied: bool,
    /// Optimistic membership: the pending target if a toggle is in flight.
    pub is_saved: bool,
}

#[derive(Debug, Default)]
struct SessionState {
    profile: Option<Profile>,
    jobs: BTreeMap<JobId, Job>,
    saved: SavedJobIds,
    applied: HashSet<JobId>,
    /// Successful applications made through this session.
    applied_here: HashSet<JobId>,
}

impl SessionState {
    /// Jobs whose applicant list already names the current user.
    fn applied_from_jobs(&self) -> Vec<JobId> {
        let Some(profile) = &self.profile else {
            return Vec::new();
        };
        self.jobs
            .values()
            .filter(|job| job.applicant(profile.user_id).is_some())
            .map(|job| job.id)
            .collect()
    }

    fn rebuild_applied(&mut self) {
        let mut applied: HashSet<JobId> = self.applied_from_jobs().into_iter().collect();
        applied.extend(self.applied_here.iter().copied());
        self.applied = applied;
    }
}

pub struct Session {
    state: RwLock<SessionState>,
    tx: broadcast::Sender<SessionEvent>,
}

impl Session {
    pub fn new() -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        Arc::new(Self {
            state: RwLock::new(SessionState::default()),
            tx,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.tx.send(event);
    }

    // ── Profile ─────────────────────────────────────────────────────

    pub async fn set_profile(&self, profile: Profile) {
        info!(user_id = profile.user_id, role = %profile.role, "Profile loaded");
        let event = SessionEvent::ProfileLoaded {
            user_id: profile.user_id,
            role: profile.role,
        };
        {
            let mut state = self.state.write().await;
            let previous = state.profile.as_ref().map(|p| p.user_id);
            if previous.is_some_and(|id| id != profile.user_id) {
                debug!(user_id = profile.user_id, "User changed, clearing per-user sets");
                state.applied_here.clear();
                state.saved = SavedJobIds::new();
            }
            state.profile = Some(profile);
            state.rebuild_applied();
        }
        self.emit(event);
    }

    pub async fn profile(&self) -> Option<Profile> {
        self.state.read().await.profile.clone()
    }

    pub async fn role(&self) -> Option<Role> {
        self.state.read().await.profile.as_ref().map(|p| p.role)
    }

    /// Display-only copy of the server's wallet balance.
    pub async fn set_wallet_balance(&self, balance: Decimal) -> Result<(), JobError> {
        {
            let mut state = self.state.write().await;
            let profile = state.profile.as_mut().ok_or(JobError::NoProfile)?;
            profile.wallet_balance = balance;
        }
        self.emit(SessionEvent::WalletUpdated { balance });
        Ok(())
    }

    // ── Jobs ────────────────────────────────────────────────────────

    /// Replace the job list with a fresh server snapshot.
    pub async fn replace_jobs(&self, jobs: Vec<Job>) {
        let count = jobs.len();
        {
            let mut state = self.state.write().await;
            state.jobs = jobs.into_iter().map(|job| (job.id, job)).collect();
            state.rebuild_applied();
        }
        info!(count, "Job list replaced");
        self.emit(SessionEvent::JobsLoaded { count });
    }

    /// Insert or replace a single job from a fresh server copy.
    pub async fn upsert_job(&self, job: Job) {
        let event = SessionEvent::JobUpdated {
            job_id: job.id,
            status: job.status.clone(),
        };
        {
            let mut state = self.state.write().await;
            state.jobs.insert(job.id, job);
            state.rebuild_applied();
        }
        self.emit(event);
    }

    pub async fn job(&self, id: JobId) -> Option<Job> {
        self.state.read().await.jobs.get(&id).cloned()
    }

    /// Jobs matching `filter`, in id order.
    pub async fn jobs(&self, filter: &JobFilter) -> Vec<Job> {
        let state = self.state.read().await;
        filter.apply(state.jobs.values()).into_iter().cloned().collect()
    }

    pub async fn view(&self, id: JobId) -> Result<JobView, JobError> {
        let state = self.state.read().await;
        let job = state.jobs.get(&id).cloned().ok_or(JobError::NotFound { id })?;
        Ok(JobView {
            job,
            has_applied: state.applied.contains(&id),
            is_saved: state.saved.displayed(id),
        })
    }

    /// Apply `f` to a loaded job and broadcast the result.
    async fn update_job<F>(&self, id: JobId, f: F) -> Result<Job, JobError>
    where
        F: FnOnce(&mut Job),
    {
        let updated = {
            let mut state = self.state.write().await;
            let job = state.jobs.get_mut(&id).ok_or(JobError::NotFound { id })?;
            f(job);
            job.clone()
        };
        self.emit(SessionEvent::JobUpdated {
            job_id: id,
            status: updated.status.clone(),
        });
        Ok(updated)
    }

    /// Move a job along its lifecycle. Only valid edges are accepted.
    ///
    /// The check and the write happen under one lock, so of two racing
    /// transitions from the same state only the first lands.
    pub async fn transition(&self, id: JobId, target: JobStatus) -> Result<Job, JobError> {
        let updated = {
            let mut state = self.state.write().await;
            let job = state.jobs.get_mut(&id).ok_or(JobError::NotFound { id })?;
            let valid = job
                .status()
                .map(|current| current.can_transition_to(target))
                .unwrap_or(false);
            if !valid {
                return Err(JobError::InvalidTransition {
                    id,
                    state: job.status.clone(),
                    target: target.to_string(),
                });
            }
            job.set_status(target);
            job.clone()
        };
        info!(job_id = id, status = %target, "Job status changed");
        self.emit(SessionEvent::JobUpdated {
            job_id: id,
            status: updated.status.clone(),
        });
        Ok(updated)
    }

    /// Record the shift start time reported by the server.
    pub async fn set_shift_start(
        &self,
        id: JobId,
        start: chrono::DateTime<chrono::Utc>,
    ) -> Result<Job, JobError> {
        self.update_job(id, |job| job.actual_shift_start = Some(start))
            .await
    }

    pub async fn set_duration(&self, id: JobId, hours: Decimal) -> Result<Job, JobError> {
        self.update_job(id, |job| job.duration = Some(hours)).await
    }

    pub async fn set_applicant_status(
        &self,
        id: JobId,
        applicant_id: i64,
        status: ApplicationStatus,
    ) -> Result<(), JobError> {
        {
            let mut state = self.state.write().await;
            let job = state.jobs.get_mut(&id).ok_or(JobError::NotFound { id })?;
            let application = job
                .applicant_mut(applicant_id)
                .ok_or(JobError::UnknownApplicant { id, applicant_id })?;
            application.status = status;
        }
        info!(job_id = id, applicant_id, status = ?status, "Applicant status changed");
        self.emit(SessionEvent::ApplicantUpdated {
            job_id: id,
            applicant_id,
            status,
        });
        Ok(())
    }

    pub async fn set_payment_status(&self, id: JobId, status: PaymentStatus) -> Result<(), JobError> {
        {
            let mut state = self.state.write().await;
            let job = state.jobs.get_mut(&id).ok_or(JobError::NotFound { id })?;
            job.payment_status = status;
        }
        info!(job_id = id, status = ?status, "Payment status changed");
        self.emit(SessionEvent::PaymentUpdated { job_id: id, status });
        Ok(())
    }

    // ── Applications ────────────────────────────────────────────────

    pub async fn mark_applied(&self, id: JobId) {
        let inserted = {
            let mut state = self.state.write().await;
            state.applied_here.insert(id);
            state.applied.insert(id)
        };
        if inserted {
            info!(job_id = id, "Applied to job");
            self.emit(SessionEvent::Applied { job_id: id });
        }
    }

    pub async fn has_applied(&self, id: JobId) -> bool {
        self.state.read().await.applied.contains(&id)
    }

    // ── Saved jobs ──────────────────────────────────────────────────

    pub async fn replace_saved(&self, ids: Vec<JobId>) {
        debug!(count = ids.len(), "Saved jobs replaced");
        self.state.write().await.saved.replace(ids);
    }

    pub async fn saved_ids(&self) -> Vec<JobId> {
        self.state.read().await.saved.ids()
    }

    pub async fn is_saved(&self, id: JobId) -> bool {
        self.state.read().await.saved.displayed(id)
    }

    /// Start a save toggle; returns the target membership.
    pub async fn begin_toggle(&self, id: JobId) -> Result<bool, JobError> {
        let target = self.state.write().await.saved.begin_toggle(id)?;
        debug!(job_id = id, save = target, "Save toggle started");
        Ok(target)
    }

    pub async fn commit_toggle(&self, id: JobId) {
        let saved = {
            let mut state = self.state.write().await;
            state.saved.commit(id);
            state.saved.is_saved(id)
        };
        info!(job_id = id, saved, "Saved state changed");
        self.emit(SessionEvent::SavedChanged { job_id: id, saved });
    }

    pub async fn rollback_toggle(&self, id: JobId) {
        self.state.write().await.saved.rollback(id);
        debug!(job_id = id, "Save toggle rolled back");
    }
}
