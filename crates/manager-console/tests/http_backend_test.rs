//! HTTP contract tests: `HttpBackend` against an in-process axum server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use manager_console::{
    AssumeYes, BackendError, ConsoleConfig, EmployeeAction, HttpBackend, ManagerBackend,
    ManagerWorkflow, Outcome, Session, SessionHandle, SessionStore, SessionUser,
};
use reputation::{AdvisoryThresholds, VipDecision};
use serde_json::{json, Value};

const TOKEN: &str = "tok-manager";

#[derive(Debug, Clone)]
struct Recorded {
    method: Method,
    path: String,
    authorization: Option<String>,
    body: Option<Value>,
}

type Log = Arc<Mutex<Vec<Recorded>>>;

async fn handle(
    State(log): State<Log>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let path = uri.path().to_string();
    log.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        authorization: authorization.clone(),
        body: serde_json::from_str(&body).ok(),
    });

    let expected = format!("Bearer {TOKEN}");
    if authorization.as_deref() != Some(expected.as_str()) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "Invalid token"})))
            .into_response();
    }

    match (method, path.as_str()) {
        (Method::GET, "/api/manager/customers") => Json(json!([
            {"user_id": 3, "name": "Cara", "email": "cara@example.com",
             "total_balance": 250.0, "amount_warnings": 0, "vip_status": 1}
        ]))
        .into_response(),
        (Method::GET, "/api/manager/feedback") => Json(json!([
            {"feedback_id": 42, "feedback_type": "Complaint", "feedback_from": 5,
             "feedback_for": 9, "message": "Cold food", "complaint_status": "Under Review",
             "created_at": "Tue, 14 Jan 2025 10:00:00 GMT"}
        ]))
        .into_response(),
        (Method::GET, "/api/manager/employees") => {
            Json(json!({"employees": "not a list"})).into_response()
        }
        (Method::GET, "/api/manager/stats") => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        (Method::POST, "/api/manager/bids/99/approve") => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Justification required for approving higher bid"})),
        )
            .into_response(),
        (Method::POST, _) => Json(json!({"message": "ok"})).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn serve() -> (String, Log) {
    let log: Log = Arc::default();
    let app = Router::new().fallback(handle).with_state(log.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/api"), log)
}

fn config(api_url: &str, session_path: std::path::PathBuf) -> ConsoleConfig {
    ConsoleConfig {
        api_url: api_url.to_string(),
        request_timeout: Duration::from_secs(5),
        session_path,
        thresholds: AdvisoryThresholds::default(),
    }
}

fn manager_session(token: &str) -> Session {
    Session::new(
        token,
        SessionUser {
            id: 1,
            name: "Morgan".into(),
            role: "manager".into(),
            email: None,
        },
    )
}

async fn backend() -> (HttpBackend, SessionHandle, Log) {
    let (url, log) = serve().await;
    let session = SessionHandle::new(Some(manager_session(TOKEN)));
    let backend = HttpBackend::new(&config(&url, "unused.json".into()), session.clone()).unwrap();
    (backend, session, log)
}

fn last(log: &Log) -> Recorded {
    log.lock().unwrap().last().cloned().expect("a request was made")
}

#[tokio::test]
async fn requests_carry_bearer_token_and_decode_wire_shapes() {
    let (backend, _, log) = backend().await;

    let customers = backend.list_customers().await.unwrap();
    assert!(customers[0].vip_status);
    assert_eq!(
        last(&log).authorization.as_deref(),
        Some("Bearer tok-manager")
    );

    let feedback = backend.list_feedback().await.unwrap();
    assert!(feedback[0].is_actionable());
    assert_eq!(feedback[0].feedback_type, reputation::FeedbackType::Complaint);
}

#[tokio::test]
async fn dismiss_sends_reporter_id() {
    let (backend, _, log) = backend().await;

    backend.dismiss_feedback(42, 5).await.unwrap();

    let req = last(&log);
    assert_eq!(req.method, Method::POST);
    assert_eq!(req.path, "/api/manager/feedback/42/dismiss");
    assert_eq!(req.body, Some(json!({"reporter_id": 5})));
}

#[tokio::test]
async fn approve_bid_always_sends_a_justification_field() {
    let (backend, _, log) = backend().await;

    backend.approve_bid(12, Some("Knows the area")).await.unwrap();
    assert_eq!(last(&log).body, Some(json!({"justification": "Knows the area"})));

    backend.approve_bid(13, None).await.unwrap();
    let req = last(&log);
    assert_eq!(req.path, "/api/manager/bids/13/approve");
    assert_eq!(req.body, Some(json!({"justification": ""})));
}

#[tokio::test]
async fn action_paths_match_the_backend_routes() {
    let (backend, _, log) = backend().await;

    backend.approve_feedback(42).await.unwrap();
    backend.reject_bid(4).await.unwrap();
    backend
        .decide_vip_request(11, VipDecision::Approve)
        .await
        .unwrap();
    backend.decide_vip_request(12, VipDecision::Reject).await.unwrap();
    backend.demote_vip(3).await.unwrap();
    backend.deregister_customer(5).await.unwrap();
    backend
        .employee_action(9, EmployeeAction::Promote)
        .await
        .unwrap();

    let paths: Vec<String> = log.lock().unwrap().iter().map(|r| r.path.clone()).collect();
    assert_eq!(
        paths,
        vec![
            "/api/manager/feedback/42/approve",
            "/api/manager/bids/4/reject",
            "/api/manager/vip/11/approve",
            "/api/manager/vip/12/reject",
            "/api/manager/vip/3/demote",
            "/api/manager/customers/5/deregister",
            "/api/manager/employees/9/promote",
        ]
    );
}

#[tokio::test]
async fn business_rejection_keeps_backend_reason() {
    let (backend, session, _) = backend().await;

    let err = backend.approve_bid(99, None).await.unwrap_err();

    assert_eq!(
        err,
        BackendError::Rejected {
            status: 400,
            message: Some("Justification required for approving higher bid".into()),
        }
    );
    assert!(session.is_active());
}

#[tokio::test]
async fn rejection_without_body_has_no_reason() {
    let (backend, _, _) = backend().await;

    let err = backend.stats().await.unwrap_err();

    assert_eq!(
        err,
        BackendError::Rejected {
            status: 500,
            message: None
        }
    );
}

#[tokio::test]
async fn unexpected_body_is_a_decode_error() {
    let (backend, _, _) = backend().await;

    let err = backend.list_employees().await.unwrap_err();

    assert!(matches!(err, BackendError::Decode(_)));
}

#[tokio::test]
async fn unauthorized_invalidates_and_clears_stored_session() {
    let (url, _) = serve().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let store = SessionStore::new(&path);
    store.save(&manager_session("stale-token")).unwrap();

    let session = SessionHandle::from_store(SessionStore::new(&path));
    let backend = HttpBackend::new(&config(&url, path.clone()), session.clone()).unwrap();

    let err = backend.list_vip_requests().await.unwrap_err();

    assert_eq!(err, BackendError::Unauthorized);
    assert!(!session.is_active());
    assert!(!path.exists());
}

#[tokio::test]
async fn missing_session_never_reaches_the_network() {
    let (url, log) = serve().await;
    let backend =
        HttpBackend::new(&config(&url, "unused.json".into()), SessionHandle::new(None)).unwrap();

    let err = backend.list_pending_bids().await.unwrap_err();

    assert_eq!(err, BackendError::Unauthorized);
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let session = SessionHandle::new(Some(manager_session(TOKEN)));
    let backend =
        HttpBackend::new(&config(&format!("http://{addr}/api"), "unused.json".into()), session)
            .unwrap();

    let err = backend.list_feedback().await.unwrap_err();

    assert!(matches!(err, BackendError::Transport(_)));
}

#[tokio::test]
async fn applied_promotion_is_not_reported_as_failed() {
    let (url, log) = serve().await;
    let session = SessionHandle::new(Some(manager_session(TOKEN)));
    let backend = HttpBackend::new(&config(&url, "unused.json".into()), session.clone()).unwrap();
    let mut workflow =
        ManagerWorkflow::new(Arc::new(backend), session, AdvisoryThresholds::default()).unwrap();

    let outcome = workflow
        .employee_action(9, EmployeeAction::Promote, &AssumeYes)
        .await
        .unwrap();

    let Outcome::Done(notice) = outcome else {
        panic!("promotion was applied");
    };
    assert!(!notice.retriable);
    assert!(notice.message.contains("could not be refreshed"));

    let posts = log
        .lock()
        .unwrap()
        .iter()
        .filter(|r| r.method == Method::POST)
        .count();
    assert_eq!(posts, 1);
}
