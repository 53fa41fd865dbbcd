//! Action dispatcher: one entry point per user action.
//!
//! Every action runs the same pipeline. Local input is validated first,
//! then the role/status gate is asked, then exactly one API call is made,
//! and only a successful response touches the session. A failure is logged
//! and returned with the session left as it was.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::accounts::{LoginRequest, LoginResponse, Profile, Role, SignupRequest};
use crate::api::{JobApi, JobScope, RatingReceipt, RatingRequest};
use crate::config::ClientConfig;
use crate::error::{Error, JobError, RequestError, Result};
use crate::jobs::gate::{self, JobAction, Viewer};
use crate::jobs::model::{ApplicationStatus, CreatedJob, Job, JobId, JobStatus, PaymentStatus};
use crate::jobs::payment::{
    PaymentInit, PaymentProvider, PaymentQuote, PaymentRequest, PaymentVerification,
};
use crate::session::Session;
use crate::validation::{self, AccountForm, JobForm, LoginForm};

/// Drives user actions against the API and keeps the session in step.
pub struct ActionDispatcher {
    api: Arc<dyn JobApi>,
    session: Arc<Session>,
    config: ClientConfig,
}

impl ActionDispatcher {
    pub fn new(api: Arc<dyn JobApi>, session: Arc<Session>, config: ClientConfig) -> Self {
        Self {
            api,
            session,
            config,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Acting role: the configured override, else the loaded profile's.
    pub async fn role(&self) -> Result<Role> {
        if let Some(role) = self.config.role_override {
            return Ok(role);
        }
        Ok(self.session.role().await.ok_or(JobError::NoProfile)?)
    }

    async fn viewer(&self, id: JobId) -> Result<(Viewer, Job)> {
        let role = self.role().await?;
        let view = self.session.view(id).await?;
        let viewer = match role {
            Role::Client => Viewer::client(),
            Role::Applicant => Viewer::applicant(view.has_applied, view.is_saved),
        };
        Ok((viewer, view.job))
    }

    /// Refuse `action` unless the gate shows it for this job.
    async fn require(&self, id: JobId, action: JobAction) -> Result<Job> {
        let (viewer, job) = self.viewer(id).await?;
        if gate::is_permitted(&viewer, &job.status, action)? {
            Ok(job)
        } else {
            warn!(job_id = id, %action, status = %job.status, role = %viewer.role, "Action not permitted");
            Err(JobError::ActionNotPermitted {
                id,
                action: action.to_string(),
            }
            .into())
        }
    }

    async fn require_client(&self, id: JobId, action: &str) -> Result<()> {
        if self.role().await? == Role::Client {
            Ok(())
        } else {
            Err(JobError::ActionNotPermitted {
                id,
                action: action.to_string(),
            }
            .into())
        }
    }

    /// Gate result for a loaded job, in display order.
    pub async fn visible_actions(&self, id: JobId) -> Result<Vec<JobAction>> {
        let (viewer, job) = self.viewer(id).await?;
        Ok(gate::visible_actions(&viewer, &job.status)?)
    }

    // ── Loading ─────────────────────────────────────────────────────

    pub async fn load_profile(&self) -> Result<Profile> {
        let profile = self
            .api
            .whoami()
            .await
            .map_err(|e| failed("load_profile", None, e))?;
        self.session.set_profile(profile.clone()).await;
        Ok(profile)
    }

    pub async fn load_wallet_balance(&self) -> Result<Decimal> {
        if self.session.profile().await.is_none() {
            return Err(JobError::NoProfile.into());
        }
        let wallet = self
            .api
            .wallet_balance()
            .await
            .map_err(|e| failed("load_wallet_balance", None, e))?;
        self.session.set_wallet_balance(wallet.balance).await?;
        Ok(wallet.balance)
    }

    /// Replace the session's job list. Returns the number of jobs loaded.
    pub async fn load_jobs(&self, scope: JobScope) -> Result<usize> {
        let jobs = self
            .api
            .list_jobs(scope)
            .await
            .map_err(|e| failed("load_jobs", None, e))?;
        let count = jobs.len();
        self.session.replace_jobs(jobs).await;
        Ok(count)
    }

    pub async fn load_saved_jobs(&self) -> Result<Vec<JobId>> {
        let ids = self
            .api
            .saved_job_ids()
            .await
            .map_err(|e| failed("load_saved_jobs", None, e))?;
        self.session.replace_saved(ids.clone()).await;
        Ok(ids)
    }

    /// Fetch one job fresh from the server and store it in the session.
    pub async fn load_job(&self, id: JobId) -> Result<Job> {
        let job = self
            .api
            .get_job(id)
            .await
            .map_err(|e| failed("load_job", Some(id), e))?;
        self.session.upsert_job(job.clone()).await;
        Ok(job)
    }

    /// Profile, jobs and saved set, fetched concurrently.
    ///
    /// All three must succeed before any of them is applied.
    pub async fn refresh(&self, scope: JobScope) -> Result<()> {
        let (profile, jobs, saved) = futures::try_join!(
            self.api.whoami(),
            self.api.list_jobs(scope),
            self.api.saved_job_ids(),
        )
        .map_err(|e| failed("refresh", None, e))?;

        self.session.set_profile(profile).await;
        self.session.replace_jobs(jobs).await;
        self.session.replace_saved(saved).await;
        Ok(())
    }

    // ── Accounts ────────────────────────────────────────────────────

    pub async fn sign_up(&self, form: &AccountForm, role: Role) -> Result<()> {
        validation::validate_account(form).into_result()?;
        let request = SignupRequest {
            first_name: form.firstname.trim().to_string(),
            last_name: form.lastname.trim().to_string(),
            email: form.email.trim().to_string(),
            password: form.password.clone(),
            confirm_password: form.confirm_password.clone(),
            role,
        };
        self.api
            .signup(&request)
            .await
            .map_err(|e| failed("sign_up", None, e))?;
        info!(email = %request.email, %role, "Account created");
        Ok(())
    }

    pub async fn sign_in(&self, form: &LoginForm) -> Result<LoginResponse> {
        validation::validate_login(form).into_result()?;
        let request = LoginRequest {
            email: form.email.trim().to_string(),
            password: form.password.clone(),
        };
        let response = self
            .api
            .login(&request)
            .await
            .map_err(|e| failed("sign_in", None, e))?;
        info!(user_id = response.user_id, "Signed in");
        Ok(response)
    }

    // ── Applicant actions ───────────────────────────────────────────

    pub async fn apply_to_job(&self, id: JobId) -> Result<()> {
        self.require(id, JobAction::ApplyNow).await?;
        self.api
            .apply(id)
            .await
            .map_err(|e| failed("apply", Some(id), e))?;
        self.session.mark_applied(id).await;
        Ok(())
    }

    /// Save or unsave a job. Returns the new membership.
    ///
    /// Only one toggle per job may be in flight; a second one fails with
    /// `ActionInFlight`. A failed call rolls the membership back.
    pub async fn toggle_save_job(&self, id: JobId) -> Result<bool> {
        let (viewer, job) = self.viewer(id).await?;
        let action = if viewer.is_saved {
            JobAction::Unsave
        } else {
            JobAction::Save
        };
        if !gate::is_permitted(&viewer, &job.status, action)? {
            return Err(JobError::ActionNotPermitted {
                id,
                action: action.to_string(),
            }
            .into());
        }

        let save = self.session.begin_toggle(id).await?;
        let outcome = if save {
            self.api.save_job(id).await
        } else {
            self.api.unsave_job(id).await
        };

        match outcome {
            Ok(()) => {
                self.session.commit_toggle(id).await;
                Ok(save)
            }
            Err(e) => {
                self.session.rollback_toggle(id).await;
                Err(failed("toggle_save", Some(id), e))
            }
        }
    }

    // ── Client actions ──────────────────────────────────────────────

    pub async fn accept_applicant(&self, id: JobId, applicant_id: i64) -> Result<()> {
        self.decide_applicant(id, applicant_id, ApplicationStatus::Accepted)
            .await
    }

    pub async fn decline_applicant(&self, id: JobId, applicant_id: i64) -> Result<()> {
        self.decide_applicant(id, applicant_id, ApplicationStatus::Rejected)
            .await
    }

    async fn decide_applicant(
        &self,
        id: JobId,
        applicant_id: i64,
        decision: ApplicationStatus,
    ) -> Result<()> {
        let action = match decision {
            ApplicationStatus::Accepted => "accept_applicant",
            _ => "decline_applicant",
        };
        self.require_client(id, action).await?;
        let job = self.session.view(id).await?.job;
        if job.status()?.is_terminal() {
            return Err(JobError::ActionNotPermitted {
                id,
                action: action.to_string(),
            }
            .into());
        }
        if job.applicant(applicant_id).is_none() {
            return Err(JobError::UnknownApplicant { id, applicant_id }.into());
        }

        let call = match decision {
            ApplicationStatus::Accepted => self.api.accept_applicant(id, applicant_id).await,
            _ => self.api.decline_applicant(id, applicant_id).await,
        };
        call.map_err(|e| failed(action, Some(id), e))?;

        self.session
            .set_applicant_status(id, applicant_id, decision)
            .await?;
        Ok(())
    }

    pub async fn start_shift(&self, id: JobId) -> Result<Job> {
        self.require(id, JobAction::StartShift).await?;
        let started = self
            .api
            .start_shift(id)
            .await
            .map_err(|e| failed("start_shift", Some(id), e))?;
        self.session.transition(id, JobStatus::Ongoing).await?;
        let start = started.start_time.unwrap_or_else(Utc::now);
        Ok(self.session.set_shift_start(id, start).await?)
    }

    pub async fn end_shift(&self, id: JobId) -> Result<Job> {
        self.require(id, JobAction::EndShift).await?;
        let ended = self
            .api
            .end_shift(id)
            .await
            .map_err(|e| failed("end_shift", Some(id), e))?;
        let job = self.session.transition(id, JobStatus::Completed).await?;
        match ended.duration {
            Some(hours) => Ok(self.session.set_duration(id, hours).await?),
            None => Ok(job),
        }
    }

    pub async fn cancel_shift(&self, id: JobId) -> Result<Job> {
        self.require(id, JobAction::Cancel).await?;
        self.api
            .cancel_shift(id)
            .await
            .map_err(|e| failed("cancel_shift", Some(id), e))?;
        Ok(self.session.transition(id, JobStatus::Canceled).await?)
    }

    /// Rate the other party on a finished job.
    ///
    /// A client rates the accepted applicant; an applicant rates the client
    /// who posted the job.
    pub async fn submit_feedback(&self, id: JobId, rating: u8, text: &str) -> Result<RatingReceipt> {
        validation::validate_feedback(rating, text).into_result()?;
        let job = self.require(id, JobAction::Feedback).await?;
        let reviewed_id = match self.role().await? {
            Role::Client => job
                .applicants
                .iter()
                .find(|a| a.status == ApplicationStatus::Accepted)
                .map(|a| a.applicant_id),
            Role::Applicant => job.client_id,
        }
        .ok_or(JobError::NoReviewee { id })?;
        let request = RatingRequest {
            job_id: id,
            reviewed_id,
            rating,
            feedback: text.trim().to_string(),
        };
        let receipt = self
            .api
            .submit_rating(&request)
            .await
            .map_err(|e| failed("submit_feedback", Some(id), e))?;
        info!(job_id = id, rating, "Feedback submitted");
        Ok(receipt)
    }

    /// Validate and post a new job. The session list is not touched; the
    /// next load picks the job up.
    pub async fn create_job(&self, form: &JobForm) -> Result<CreatedJob> {
        let new_job = form.to_new_job()?;
        if self.role().await? != Role::Client {
            return Err(JobError::ActionNotPermitted {
                id: 0,
                action: "create_job".into(),
            }
            .into());
        }
        let created = self
            .api
            .create_job(&new_job)
            .await
            .map_err(|e| failed("create_job", None, e))?;
        info!(
            job_id = created.job_id,
            transaction_ref = %created.transaction_ref,
            "Job created"
        );
        Ok(created)
    }

    // ── Payments ────────────────────────────────────────────────────

    /// Start a gateway checkout for the job's rate plus service fee.
    pub async fn initiate_payment(&self, id: JobId, provider: PaymentProvider) -> Result<PaymentInit> {
        self.require_client(id, "initiate_payment").await?;
        let profile = self.session.profile().await.ok_or(JobError::NoProfile)?;
        let job = self.session.view(id).await?.job;
        if job.payment_status != PaymentStatus::Pending {
            return Err(JobError::ActionNotPermitted {
                id,
                action: "initiate_payment".into(),
            }
            .into());
        }

        let quote = PaymentQuote::for_job(&job);
        let request = PaymentRequest {
            job_id: id,
            amount: quote.total,
            email: profile.email,
            currency: self.config.currency.clone(),
        };
        let init = self
            .api
            .initialize_payment(provider, &request)
            .await
            .map_err(|e| failed("initiate_payment", Some(id), e))?;
        info!(job_id = id, %provider, amount = %quote.total, reference = %init.reference, "Payment initialized");
        Ok(init)
    }

    /// Check a checkout with the gateway. Success marks the job `held`.
    pub async fn verify_payment(
        &self,
        id: JobId,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<PaymentVerification> {
        self.require_client(id, "verify_payment").await?;
        self.session.view(id).await?;
        let verification = self
            .api
            .verify_payment(provider, reference)
            .await
            .map_err(|e| failed("verify_payment", Some(id), e))?;
        if verification.is_success() {
            self.session.set_payment_status(id, PaymentStatus::Held).await?;
        } else {
            warn!(job_id = id, %provider, status = %verification.status, "Payment not confirmed");
        }
        Ok(verification)
    }
}

/// Log a failed call and wrap it.
fn failed(action: &str, job_id: Option<JobId>, err: RequestError) -> Error {
    warn!(action, job_id = ?job_id, error = %err, "Action failed");
    Error::Request(err)
}
