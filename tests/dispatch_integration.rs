//! Integration tests for the HTTP API client and dispatcher.
//!
//! Each test spins up an Axum stub of the marketplace back end on a random
//! port and drives the real `HttpJobApi` through the dispatcher.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use paeshift_client::accounts::Role;
use paeshift_client::api::{HttpJobApi, JobApi, JobScope};
use paeshift_client::config::ClientConfig;
use paeshift_client::dispatch::ActionDispatcher;
use paeshift_client::error::{Error, RequestError};
use paeshift_client::jobs::JobAction;
use paeshift_client::jobs::model::PaymentStatus;
use paeshift_client::jobs::payment::PaymentProvider;
use paeshift_client::session::{Session, SessionEvent};
use paeshift_client::validation::JobForm;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Job the stub refuses applications for.
const FULL_JOB: i64 = 13;

#[derive(Default)]
struct Backend {
    role: String,
    saved: BTreeSet<i64>,
    requests: Vec<String>,
    bodies: HashMap<String, Value>,
    auth: Option<String>,
}

type Shared = Arc<Mutex<Backend>>;

fn jobs_json() -> Value {
    json!({
        "jobs": [
            {
                "id": 1, "title": "Event Waiter", "status": "upcoming",
                "location": "Lekki", "rate": "4000.00",
                "service_fee": "200.00", "total_amount": "4200.00",
                "payment_status": "Pending",
                "start_time": "09:00:00", "end_time": "17:00:00",
                "applicants": [
                    { "id": 5, "applicant_id": 21, "applicant_name": "Tunde", "status": "applied" }
                ]
            },
            { "id": 2, "title": "Night Cleaner", "status": "ongoing", "rate": "2500" },
            { "id": 13, "title": "Bartender", "status": "upcoming", "rate": "3000" },
            {
                "id": 3, "title": "Usher", "status": "completed", "rate": "2000",
                "employer_id": 7,
                "applicants": [
                    { "id": 6, "applicant_id": 21, "applicant_name": "Tunde", "status": "accepted" }
                ]
            }
        ]
    })
}

fn record(state: &Shared, headers: &HeaderMap, line: String) {
    let mut backend = state.lock().unwrap();
    backend.auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    backend.requests.push(line);
}

async fn whoami(State(state): State<Shared>, headers: HeaderMap) -> Json<Value> {
    record(&state, &headers, "GET whoami".into());
    let role = state.lock().unwrap().role.clone();
    Json(json!({
        "user_id": 7, "username": "ada", "first_name": "Ada", "last_name": "Obi",
        "email": "ada@example.com", "role": role, "wallet_balance": "0.00"
    }))
}

async fn all_jobs(State(state): State<Shared>, headers: HeaderMap) -> Json<Value> {
    record(&state, &headers, "GET alljobs".into());
    Json(jobs_json())
}

async fn client_jobs(State(state): State<Shared>, headers: HeaderMap) -> Json<Value> {
    record(&state, &headers, "GET clientjobs".into());
    Json(jobs_json())
}

async fn get_job(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    record(&state, &headers, format!("GET job {id}"));
    let found = jobs_json()["jobs"]
        .as_array()
        .and_then(|jobs| jobs.iter().find(|j| j["id"] == id).cloned());
    match found {
        Some(mut job) => {
            job["title"] = json!(format!("{} (refreshed)", job["title"].as_str().unwrap()));
            (StatusCode::OK, Json(job))
        }
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))),
    }
}

async fn ratings(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    record(&state, &headers, "POST ratings".into());
    state.lock().unwrap().bodies.insert("ratings".into(), body);
    Json(json!({ "message": "Rating submitted", "rating_id": 88 }))
}

async fn saved_jobs(State(state): State<Shared>, headers: HeaderMap) -> Json<Value> {
    record(&state, &headers, "GET saved-jobs".into());
    let saved: Vec<Value> = state
        .lock()
        .unwrap()
        .saved
        .iter()
        .map(|id| json!({ "saved_job_id": 100 + id, "job_id": id }))
        .collect();
    Json(json!({ "saved_jobs": saved }))
}

async fn save_job(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Json<Value> {
    record(&state, &headers, format!("POST save-job {id}"));
    state.lock().unwrap().saved.insert(id);
    Json(json!({ "message": "Job saved successfully" }))
}

async fn unsave_job(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Json<Value> {
    record(&state, &headers, format!("DELETE save-job {id}"));
    state.lock().unwrap().saved.remove(&id);
    Json(json!({ "message": "Job removed from saved" }))
}

async fn apply(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    record(&state, &headers, format!("POST apply {id}"));
    if id == FULL_JOB {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": "Job is full" })))
    } else {
        (StatusCode::OK, Json(json!({ "application_id": 55 })))
    }
}

async fn start_shift(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Json<Value> {
    record(&state, &headers, format!("POST start-shift {id}"));
    Json(json!({ "status": "shift_started", "start_time": "2025-03-01T09:00:00Z" }))
}

async fn create_job(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    record(&state, &headers, "POST create-job".into());
    state.lock().unwrap().bodies.insert("create-job".into(), body);
    Json(json!({
        "message": "Job created",
        "job_id": 42,
        "transaction_ref": "6f1c2d3e-4b5a-4c6d-8e7f-9a0b1c2d3e4f",
        "duration": "8.00"
    }))
}

async fn initialize_payment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(provider): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    record(&state, &headers, format!("POST initialize {provider}"));
    state.lock().unwrap().bodies.insert("initialize".into(), body);
    Json(json!({ "authorization_url": "https://checkout.example/abc", "reference": "PS-991" }))
}

async fn verify_payment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(provider): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let reference = query.get("reference").cloned().unwrap_or_default();
    record(&state, &headers, format!("GET verify {provider} {reference}"));
    Json(json!({ "status": "success", "reference": reference }))
}

async fn wallet(State(state): State<Shared>, headers: HeaderMap) -> Json<Value> {
    record(&state, &headers, "GET wallet".into());
    Json(json!({ "balance": "1200.50" }))
}

/// Start the stub back end on a random port, return (base url, state).
async fn start_server(role: Role) -> (String, Shared) {
    let state: Shared = Arc::new(Mutex::new(Backend {
        role: role.to_string(),
        ..Backend::default()
    }));

    let app = Router::new()
        .route("/jobs/whoami", get(whoami))
        .route("/jobs/alljobs", get(all_jobs))
        .route("/jobs/clientjobs", get(client_jobs))
        .route("/jobs/saved-jobs", get(saved_jobs))
        .route("/jobs/save-job/{id}", post(save_job).delete(unsave_job))
        .route("/jobs/create-job", post(create_job))
        .route("/jobs/ratings", post(ratings))
        .route("/jobs/{id}", get(get_job))
        .route("/jobs/wallet/balance/", get(wallet))
        .route("/jobs/{id}/apply", post(apply))
        .route("/jobs/{id}/start-shift", post(start_shift))
        .route("/payments/{provider}/initialize", post(initialize_payment))
        .route("/payments/{provider}/verify", get(verify_payment))
        .with_state(Arc::clone(&state));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://127.0.0.1:{port}"), state)
}

fn dispatcher(config: ClientConfig) -> ActionDispatcher {
    let api: Arc<dyn JobApi> = Arc::new(HttpJobApi::new(config.clone()).unwrap());
    ActionDispatcher::new(api, Session::new(), config)
}

fn requests(state: &Shared) -> Vec<String> {
    state.lock().unwrap().requests.clone()
}

// ── Applicant flows ──────────────────────────────────────────────────

#[tokio::test]
async fn refresh_loads_profile_jobs_and_saved() {
    timeout(TEST_TIMEOUT, async {
        let (base, state) = start_server(Role::Applicant).await;
        state.lock().unwrap().saved.insert(2);
        let d = dispatcher(ClientConfig::with_base_url(&base).unwrap());

        d.refresh(JobScope::All).await.unwrap();

        let profile = d.session().profile().await.unwrap();
        assert_eq!(profile.role, Role::Applicant);
        assert_eq!(profile.display_name(), "Ada Obi");
        assert_eq!(d.session().saved_ids().await, vec![2]);
        assert_eq!(
            d.visible_actions(1).await.unwrap(),
            vec![JobAction::Save, JobAction::ApplyNow]
        );
        assert_eq!(d.visible_actions(2).await.unwrap(), vec![JobAction::Unsave]);

        let mut seen = requests(&state);
        seen.sort();
        assert_eq!(seen, vec!["GET alljobs", "GET saved-jobs", "GET whoami"]);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn save_and_unsave_round_trip_through_server() {
    timeout(TEST_TIMEOUT, async {
        let (base, state) = start_server(Role::Applicant).await;
        let d = dispatcher(ClientConfig::with_base_url(&base).unwrap());
        d.refresh(JobScope::All).await.unwrap();
        let mut events = d.session().subscribe();

        assert!(d.toggle_save_job(1).await.unwrap());
        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::SavedChanged { job_id: 1, saved: true }
        );
        assert!(state.lock().unwrap().saved.contains(&1));

        assert!(!d.toggle_save_job(1).await.unwrap());
        assert!(state.lock().unwrap().saved.is_empty());
        assert!(d.session().saved_ids().await.is_empty());

        let seen = requests(&state);
        assert_eq!(&seen[3..], ["POST save-job 1", "DELETE save-job 1"]);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn apply_error_message_is_surfaced() {
    timeout(TEST_TIMEOUT, async {
        let (base, _state) = start_server(Role::Applicant).await;
        let d = dispatcher(ClientConfig::with_base_url(&base).unwrap());
        d.refresh(JobScope::All).await.unwrap();

        let err = d.apply_to_job(FULL_JOB).await.unwrap_err();
        match err {
            Error::Request(RequestError::Status { status, message, .. }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Job is full");
            }
            other => panic!("expected status error, got {other:?}"),
        }
        assert!(!d.session().has_applied(FULL_JOB).await);

        d.apply_to_job(1).await.unwrap();
        assert!(d.session().has_applied(1).await);
        assert_eq!(d.visible_actions(1).await.unwrap(), vec![JobAction::TrackLocation]);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn missing_route_is_a_status_error() {
    timeout(TEST_TIMEOUT, async {
        let (base, _state) = start_server(Role::Applicant).await;
        let api = HttpJobApi::new(ClientConfig::with_base_url(&base).unwrap()).unwrap();
        let err = api.cancel_shift(1).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    timeout(TEST_TIMEOUT, async {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let api = HttpJobApi::new(
            ClientConfig::with_base_url(format!("http://127.0.0.1:{port}")).unwrap(),
        )
        .unwrap();
        let err = api.whoami().await.unwrap_err();
        assert!(matches!(err, RequestError::Transport { .. }));
    })
    .await
    .expect("test timed out");
}

// ── Client flows ─────────────────────────────────────────────────────

#[tokio::test]
async fn create_job_posts_typed_payload() {
    timeout(TEST_TIMEOUT, async {
        let (base, state) = start_server(Role::Client).await;
        let d = dispatcher(ClientConfig::with_base_url(&base).unwrap());
        d.load_profile().await.unwrap();

        let form = JobForm {
            title: "Event Waiter".into(),
            location: "Lekki".into(),
            industry: "Hospitality".into(),
            subcategory: "Waiter".into(),
            rate: "4000".into(),
            applicants_needed: "3".into(),
            job_type: "1".into(),
            shift_type: "night".into(),
            date: "2025-03-01".into(),
            start_time: "18:00".into(),
            end_time: "23:30".into(),
        };
        let created = d.create_job(&form).await.unwrap();
        assert_eq!(created.job_id, 42);
        assert_eq!(created.duration, Some(dec!(8.00)));

        let body = state.lock().unwrap().bodies["create-job"].clone();
        assert_eq!(body["title"], "Event Waiter");
        assert_eq!(body["applicants_needed"], 3);
        assert_eq!(body["job_type"], "single_day");
        assert_eq!(body["shift_type"], "night");
        assert_eq!(body["date"], "2025-03-01");
        assert_eq!(body["start_time"], "18:00");
        assert_eq!(body["end_time"], "23:30");
        assert_eq!(body["payment_status"], "pending");
        assert!(body.get("status").is_none());

        let posts: Vec<String> = requests(&state)
            .into_iter()
            .filter(|r| r.starts_with("POST"))
            .collect();
        assert_eq!(posts, vec!["POST create-job"]);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn load_job_refreshes_the_session_copy() {
    timeout(TEST_TIMEOUT, async {
        let (base, state) = start_server(Role::Applicant).await;
        let d = dispatcher(ClientConfig::with_base_url(&base).unwrap());
        d.refresh(JobScope::All).await.unwrap();

        let job = d.load_job(1).await.unwrap();
        assert_eq!(job.title, "Event Waiter (refreshed)");
        assert_eq!(d.session().job(1).await.unwrap().title, "Event Waiter (refreshed)");
        assert!(requests(&state).contains(&"GET job 1".to_string()));

        let err = d.load_job(404).await.unwrap_err();
        match err {
            Error::Request(RequestError::Status { status, message, .. }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not found.");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn feedback_rates_the_accepted_applicant() {
    timeout(TEST_TIMEOUT, async {
        let (base, state) = start_server(Role::Client).await;
        let d = dispatcher(ClientConfig::with_base_url(&base).unwrap());
        d.refresh(JobScope::Posted).await.unwrap();

        let receipt = d.submit_feedback(3, 5, " Punctual and polite ").await.unwrap();
        assert_eq!(receipt.rating_id, 88);

        let body = state.lock().unwrap().bodies["ratings"].clone();
        assert_eq!(
            body,
            json!({
                "job_id": 3,
                "reviewed_id": 21,
                "rating": 5,
                "feedback": "Punctual and polite"
            })
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn start_shift_records_server_start_time() {
    timeout(TEST_TIMEOUT, async {
        let (base, _state) = start_server(Role::Client).await;
        let d = dispatcher(ClientConfig::with_base_url(&base).unwrap());
        d.refresh(JobScope::Posted).await.unwrap();

        let job = d.start_shift(1).await.unwrap();
        assert_eq!(job.status, "ongoing");
        assert_eq!(
            job.actual_shift_start.unwrap().to_rfc3339(),
            "2025-03-01T09:00:00+00:00"
        );
        assert_eq!(
            d.visible_actions(1).await.unwrap(),
            vec![JobAction::ShiftTimer, JobAction::EndShift]
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn payment_initialize_then_verify() {
    timeout(TEST_TIMEOUT, async {
        let (base, state) = start_server(Role::Client).await;
        let d = dispatcher(ClientConfig::with_base_url(&base).unwrap());
        d.refresh(JobScope::Posted).await.unwrap();

        let init = d.initiate_payment(1, PaymentProvider::Paystack).await.unwrap();
        assert_eq!(init.reference, "PS-991");

        let body = state.lock().unwrap().bodies["initialize"].clone();
        assert_eq!(body["job_id"], 1);
        assert_eq!(body["amount"], "4200.00");
        assert_eq!(body["email"], "ada@example.com");
        assert_eq!(body["currency"], "NGN");

        d.verify_payment(1, PaymentProvider::Paystack, &init.reference)
            .await
            .unwrap();
        assert_eq!(
            d.session().job(1).await.unwrap().payment_status,
            PaymentStatus::Held
        );
        assert!(requests(&state).contains(&"GET verify paystack PS-991".to_string()));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn bearer_token_and_wallet() {
    timeout(TEST_TIMEOUT, async {
        let (base, state) = start_server(Role::Client).await;
        let config = ClientConfig {
            api_token: Some(SecretString::from("tok-123".to_string())),
            ..ClientConfig::with_base_url(&base).unwrap()
        };
        let d = dispatcher(config);
        d.load_profile().await.unwrap();

        let balance = d.load_wallet_balance().await.unwrap();
        assert_eq!(balance, dec!(1200.50));
        assert_eq!(
            d.session().profile().await.unwrap().wallet_balance,
            dec!(1200.50)
        );
        assert_eq!(state.lock().unwrap().auth.as_deref(), Some("Bearer tok-123"));
    })
    .await
    .expect("test timed out");
}
