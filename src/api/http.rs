//! reqwest-backed [`JobApi`] against the marketplace REST back end.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::accounts::{LoginRequest, LoginResponse, Profile, SignupRequest, WalletBalance};
use crate::api::{JobApi, JobScope, RatingReceipt, RatingRequest, ShiftEnded, ShiftStarted};
use crate::config::ClientConfig;
use crate::error::{ConfigError, RequestError};
use crate::jobs::model::{CreatedJob, Job, JobId, NewJob};
use crate::jobs::payment::{PaymentInit, PaymentProvider, PaymentRequest, PaymentVerification};

#[derive(Deserialize)]
struct JobList {
    #[serde(default)]
    jobs: Vec<Job>,
}

#[derive(Deserialize)]
struct SavedJobList {
    #[serde(default)]
    saved_jobs: Vec<SavedJobEntry>,
}

#[derive(Deserialize)]
struct SavedJobEntry {
    job_id: JobId,
}

/// Error payload. Endpoints disagree on the key, so all three are read and
/// the first present wins.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.error.or(self.detail).or(self.message)
    }
}

/// HTTP client for the marketplace API.
///
/// Session cookies from `login` are kept in the client's cookie store; a
/// configured bearer token is attached to every request.
pub struct HttpJobApi {
    base_url: String,
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpJobApi {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            base_url: config.base_url.clone(),
            client,
            config,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.api_url(path));
        match &self.config.api_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<Response, RequestError> {
        debug!(%method, path, "API request");
        let resp = builder.send().await.map_err(|e| {
            warn!(%method, path, error = %e, "API request failed");
            RequestError::Transport {
                method: method.to_string(),
                path: path.to_string(),
                reason: e.to_string(),
            }
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
        warn!(%method, path, status = status.as_u16(), %message, "API returned error");
        Err(RequestError::Status {
            method: method.to_string(),
            path: path.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(path: &str, resp: Response) -> Result<T, RequestError> {
        resp.json::<T>().await.map_err(|e| RequestError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RequestError> {
        let resp = self
            .send(Method::GET, path, self.request(Method::GET, path))
            .await?;
        Self::decode(path, resp).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, RequestError>
    where
        B: serde::Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, path).json(body);
        let resp = self.send(Method::POST, path, builder).await?;
        Self::decode(path, resp).await
    }

    /// POST with no body; the response body is ignored.
    async fn post_empty(&self, path: &str) -> Result<(), RequestError> {
        self.send(Method::POST, path, self.request(Method::POST, path))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl JobApi for HttpJobApi {
    async fn whoami(&self) -> Result<Profile, RequestError> {
        self.get_json("/jobs/whoami").await
    }

    async fn wallet_balance(&self) -> Result<WalletBalance, RequestError> {
        self.get_json("/jobs/wallet/balance/").await
    }

    async fn signup(&self, request: &SignupRequest) -> Result<(), RequestError> {
        let path = "/jobs/signup";
        let builder = self.request(Method::POST, path).json(request);
        self.send(Method::POST, path, builder).await.map(|_| ())
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, RequestError> {
        self.post_json("/jobs/login", request).await
    }

    async fn list_jobs(&self, scope: JobScope) -> Result<Vec<Job>, RequestError> {
        let path = match scope {
            JobScope::All => "/jobs/alljobs",
            JobScope::Posted => "/jobs/clientjobs",
        };
        let list: JobList = self.get_json(path).await?;
        Ok(list.jobs)
    }

    async fn get_job(&self, id: JobId) -> Result<Job, RequestError> {
        self.get_json(&format!("/jobs/{id}")).await
    }

    async fn create_job(&self, job: &NewJob) -> Result<CreatedJob, RequestError> {
        self.post_json("/jobs/create-job", job).await
    }

    async fn apply(&self, id: JobId) -> Result<(), RequestError> {
        self.post_empty(&format!("/jobs/{id}/apply")).await
    }

    async fn save_job(&self, id: JobId) -> Result<(), RequestError> {
        self.post_empty(&format!("/jobs/save-job/{id}")).await
    }

    async fn unsave_job(&self, id: JobId) -> Result<(), RequestError> {
        let path = format!("/jobs/save-job/{id}");
        self.send(Method::DELETE, &path, self.request(Method::DELETE, &path))
            .await
            .map(|_| ())
    }

    async fn saved_job_ids(&self) -> Result<Vec<JobId>, RequestError> {
        let list: SavedJobList = self.get_json("/jobs/saved-jobs").await?;
        Ok(list.saved_jobs.into_iter().map(|e| e.job_id).collect())
    }

    async fn accept_applicant(&self, id: JobId, applicant_id: i64) -> Result<(), RequestError> {
        self.post_empty(&format!("/jobs/{id}/applications/{applicant_id}/accept"))
            .await
    }

    async fn decline_applicant(&self, id: JobId, applicant_id: i64) -> Result<(), RequestError> {
        self.post_empty(&format!("/jobs/{id}/applications/{applicant_id}/decline"))
            .await
    }

    async fn start_shift(&self, id: JobId) -> Result<ShiftStarted, RequestError> {
        self.post_json(&format!("/jobs/{id}/start-shift"), &serde_json::json!({}))
            .await
    }

    async fn end_shift(&self, id: JobId) -> Result<ShiftEnded, RequestError> {
        self.post_json(&format!("/jobs/{id}/end-shift"), &serde_json::json!({}))
            .await
    }

    async fn cancel_shift(&self, id: JobId) -> Result<(), RequestError> {
        self.post_empty(&format!("/jobs/{id}/cancel")).await
    }

    async fn submit_rating(&self, request: &RatingRequest) -> Result<RatingReceipt, RequestError> {
        self.post_json("/jobs/ratings", request).await
    }

    async fn initialize_payment(
        &self,
        provider: PaymentProvider,
        request: &PaymentRequest,
    ) -> Result<PaymentInit, RequestError> {
        self.post_json(&format!("/payments/{}/initialize", provider.slug()), request)
            .await
    }

    async fn verify_payment(
        &self,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<PaymentVerification, RequestError> {
        let path = format!("/payments/{}/verify", provider.slug());
        let builder = self
            .request(Method::GET, &path)
            .query(&[("reference", reference)]);
        let resp = self.send(Method::GET, &path, builder).await?;
        Self::decode(&path, resp).await
    }
}
