//! Bounty Escrow Server
//!
//! HTTP/JSON front of the escrow service. The caller's principal travels in
//! the `x-principal` header.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::access::{is_valid_principal, CallContext};
use crate::command::Command;
use crate::config::Config;
use crate::error::LedgerError;
use crate::events::EventRecord;
use crate::ledger::AuditReport;
use crate::service::{EscrowService, ServiceError};
use crate::types::{
    Amount, Bounty, BountyId, LedgerSummary, Page, Principal, Submission, SubmissionId,
};

/// Header carrying the calling principal.
pub const PRINCIPAL_HEADER: &str = "x-principal";

const DEFAULT_PAGE_LIMIT: u64 = 50;
const MAX_PAGE_LIMIT: u64 = 500;

pub struct AppState {
    pub service: Arc<EscrowService>,
    pub config: Config,
    pub started_at: std::time::Instant,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config", get(config_handler))
        .route("/ledger", get(ledger_handler))
        .route("/bounties", get(list_bounties_handler).post(create_bounty_handler))
        .route("/bounties/count", get(count_bounties_handler))
        .route("/bounties/:id", get(get_bounty_handler))
        .route("/bounties/:id/activate", post(activate_bounty_handler))
        .route("/bounties/:id/close", post(close_bounty_handler))
        .route(
            "/bounties/:id/submissions",
            get(list_bounty_submissions_handler).post(create_submission_handler),
        )
        .route(
            "/bounties/:id/submissions/count",
            get(count_bounty_submissions_handler),
        )
        .route(
            "/bounties/:id/submissions/:sid",
            get(get_bounty_submission_handler),
        )
        .route(
            "/bounties/:id/submissions/:sid/accept",
            post(accept_submission_handler),
        )
        .route(
            "/bounties/:id/submissions/:sid/reject",
            post(reject_submission_handler),
        )
        .route("/submissions/:id", get(get_submission_handler))
        .route("/principals/:p/bounties", get(list_my_bounties_handler))
        .route("/principals/:p/bounties/count", get(count_my_bounties_handler))
        .route("/principals/:p/bounties/:index", get(get_my_bounty_handler))
        .route("/principals/:p/submissions", get(list_my_submissions_handler))
        .route(
            "/principals/:p/submissions/count",
            get(count_my_submissions_handler),
        )
        .route(
            "/principals/:p/submissions/:index",
            get(get_my_submission_handler),
        )
        .route("/principals/:p/balance", get(balance_handler))
        .route("/events", get(events_handler))
        .route("/audit", get(audit_handler))
        .route("/admin/pause", post(pause_handler))
        .route("/admin/unpause", post(unpause_handler))
        .route("/admin/owner", post(transfer_ownership_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    /// A mutating call failed.
    Service(ServiceError),
    /// A read failed.
    Ledger(LedgerError),
    BadRequest(String),
    /// The worker running a mutating call went away.
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        AppError::Service(err)
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError::Ledger(err)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

fn ledger_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::Paused => StatusCode::SERVICE_UNAVAILABLE,
        LedgerError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
        LedgerError::Unauthorized { .. } => StatusCode::FORBIDDEN,
        LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
        LedgerError::InvalidState { .. } | LedgerError::InsufficientBalance { .. } => {
            StatusCode::CONFLICT
        }
        LedgerError::FundsMismatch { .. } | LedgerError::AmountOverflow => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Service(ServiceError::Rejected { command, source }) => (
                ledger_status(&source),
                ErrorBody {
                    error: source.kind().to_string(),
                    message: source.to_string(),
                    operation: Some(command.to_string()),
                },
            ),
            AppError::Service(ServiceError::Journal { command, message }) => {
                error!("Journal failure on {}: {}", command, message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "INTERNAL_ERROR".to_string(),
                        message: "Internal server error".to_string(),
                        operation: Some(command.to_string()),
                    },
                )
            }
            AppError::Ledger(err) => (
                ledger_status(&err),
                ErrorBody {
                    error: err.kind().to_string(),
                    message: err.to_string(),
                    operation: None,
                },
            ),
            AppError::Internal(message) => {
                error!("Mutating call aborted: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "INTERNAL_ERROR".to_string(),
                        message: "Internal server error".to_string(),
                        operation: None,
                    },
                )
            }
            AppError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "BAD_REQUEST".to_string(),
                    message,
                    operation: None,
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

// ============================================================================
// EXTRACTORS
// ============================================================================

/// Call context built from the `x-principal` header. Validation happens in
/// the service so a bad principal is reported against the attempted call.
pub struct Caller(pub CallContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(PRINCIPAL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok(Caller(CallContext::new(raw)))
    }
}

fn principal_param(raw: String) -> Result<Principal, AppError> {
    if !is_valid_principal(&raw) {
        return Err(AppError::BadRequest(format!("Invalid principal {:?}", raw)));
    }
    Ok(Principal::new(raw))
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl PageQuery {
    fn bounds(&self) -> (u64, u64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT);
        (self.offset.unwrap_or(0), limit)
    }
}

// ============================================================================
// RESPONSES
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub paused: bool,
    pub persistent: bool,
    pub uptime_secs: u64,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub principal: Principal,
    pub balance: Amount,
}

/// Result of a committed call.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommitResponse {
    /// Id assigned by a create call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub record: EventRecord,
}

impl From<EventRecord> for CommitResponse {
    fn from(record: EventRecord) -> Self {
        Self {
            id: record.event.created_id(),
            record,
        }
    }
}

/// Runs a mutating call on the blocking pool. It takes the ledger lock and
/// may write the journal.
async fn execute(
    state: &AppState,
    caller: CallContext,
    command: Command,
) -> Result<Json<CommitResponse>, AppError> {
    let service = Arc::clone(&state.service);
    let record = tokio::task::spawn_blocking(move || service.execute(&caller, command))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(Json(record.into()))
}

// ============================================================================
// LEDGER
// ============================================================================

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        paused: state.service.summary().paused,
        persistent: state.service.is_persistent(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn config_handler(State(state): State<Arc<AppState>>) -> Json<Config> {
    Json(state.config.clone())
}

async fn ledger_handler(State(state): State<Arc<AppState>>) -> Json<LedgerSummary> {
    Json(state.service.summary())
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub since: u64,
}

async fn events_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> Json<Vec<EventRecord>> {
    Json(state.service.events_since(query.since))
}

async fn audit_handler(State(state): State<Arc<AppState>>) -> Json<AuditReport> {
    Json(state.service.audit())
}

// ============================================================================
// BOUNTIES
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateBountyRequest {
    pub data: String,
    pub target_reward: Amount,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActivateBountyRequest {
    pub amount: Amount,
    /// Funds attached to the call.
    pub value: Amount,
}

async fn list_bounties_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Json<Page<Bounty>> {
    let (offset, limit) = query.bounds();
    Json(state.service.bounties_page(offset, limit))
}

async fn count_bounties_handler(State(state): State<Arc<AppState>>) -> Json<CountResponse> {
    Json(CountResponse {
        count: state.service.get_count_bounties(),
    })
}

async fn get_bounty_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<BountyId>,
) -> Result<Json<Bounty>, AppError> {
    Ok(Json(state.service.get_bounty(id)?))
}

async fn create_bounty_handler(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Json(req): Json<CreateBountyRequest>,
) -> Result<Json<CommitResponse>, AppError> {
    execute(
        &state,
        caller,
        Command::CreateBounty {
            data: req.data,
            target_reward: req.target_reward,
        },
    )
    .await
}

async fn activate_bounty_handler(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(id): Path<BountyId>,
    Json(req): Json<ActivateBountyRequest>,
) -> Result<Json<CommitResponse>, AppError> {
    execute(
        &state,
        caller,
        Command::ActivateBounty {
            id,
            amount: req.amount,
            funds: req.value,
        },
    )
    .await
}

async fn close_bounty_handler(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(id): Path<BountyId>,
) -> Result<Json<CommitResponse>, AppError> {
    execute(&state, caller, Command::CloseBounty { id }).await
}

// ============================================================================
// SUBMISSIONS
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSubmissionRequest {
    pub data: String,
}

async fn list_bounty_submissions_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<BountyId>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Submission>>, AppError> {
    let (offset, limit) = query.bounds();
    Ok(Json(state.service.bounty_submissions_page(id, offset, limit)?))
}

async fn count_bounty_submissions_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<BountyId>,
) -> Result<Json<CountResponse>, AppError> {
    Ok(Json(CountResponse {
        count: state.service.get_count_bounty_submissions(id)?,
    }))
}

/// `:sid` is a position within the bounty's submissions.
async fn get_bounty_submission_handler(
    State(state): State<Arc<AppState>>,
    Path((id, index)): Path<(BountyId, u64)>,
) -> Result<Json<Submission>, AppError> {
    Ok(Json(state.service.get_bounty_submission(id, index)?))
}

async fn create_submission_handler(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path(bounty_id): Path<BountyId>,
    Json(req): Json<CreateSubmissionRequest>,
) -> Result<Json<CommitResponse>, AppError> {
    execute(
        &state,
        caller,
        Command::CreateSubmission {
            bounty_id,
            data: req.data,
        },
    )
    .await
}

async fn accept_submission_handler(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path((bounty_id, submission_id)): Path<(BountyId, SubmissionId)>,
) -> Result<Json<CommitResponse>, AppError> {
    execute(
        &state,
        caller,
        Command::AcceptSubmission {
            bounty_id,
            submission_id,
        },
    )
    .await
}

async fn reject_submission_handler(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Path((bounty_id, submission_id)): Path<(BountyId, SubmissionId)>,
) -> Result<Json<CommitResponse>, AppError> {
    execute(
        &state,
        caller,
        Command::RejectSubmission {
            bounty_id,
            submission_id,
        },
    )
    .await
}

async fn get_submission_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SubmissionId>,
) -> Result<Json<Submission>, AppError> {
    Ok(Json(state.service.get_submission(id)?))
}

// ============================================================================
// PER-PRINCIPAL READS
// ============================================================================

async fn list_my_bounties_handler(
    State(state): State<Arc<AppState>>,
    Path(p): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Bounty>>, AppError> {
    let principal = principal_param(p)?;
    let (offset, limit) = query.bounds();
    Ok(Json(state.service.my_bounties_page(&principal, offset, limit)))
}

async fn count_my_bounties_handler(
    State(state): State<Arc<AppState>>,
    Path(p): Path<String>,
) -> Result<Json<CountResponse>, AppError> {
    let principal = principal_param(p)?;
    Ok(Json(CountResponse {
        count: state.service.get_count_my_bounties(&principal),
    }))
}

async fn get_my_bounty_handler(
    State(state): State<Arc<AppState>>,
    Path((p, index)): Path<(String, u64)>,
) -> Result<Json<Bounty>, AppError> {
    let principal = principal_param(p)?;
    Ok(Json(state.service.get_my_bounty(&principal, index)?))
}

async fn list_my_submissions_handler(
    State(state): State<Arc<AppState>>,
    Path(p): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Submission>>, AppError> {
    let principal = principal_param(p)?;
    let (offset, limit) = query.bounds();
    Ok(Json(
        state.service.my_submissions_page(&principal, offset, limit),
    ))
}

async fn count_my_submissions_handler(
    State(state): State<Arc<AppState>>,
    Path(p): Path<String>,
) -> Result<Json<CountResponse>, AppError> {
    let principal = principal_param(p)?;
    Ok(Json(CountResponse {
        count: state.service.get_count_my_submissions(&principal),
    }))
}

async fn get_my_submission_handler(
    State(state): State<Arc<AppState>>,
    Path((p, index)): Path<(String, u64)>,
) -> Result<Json<Submission>, AppError> {
    let principal = principal_param(p)?;
    Ok(Json(state.service.get_my_submission(&principal, index)?))
}

async fn balance_handler(
    State(state): State<Arc<AppState>>,
    Path(p): Path<String>,
) -> Result<Json<BalanceResponse>, AppError> {
    let principal = principal_param(p)?;
    let balance = state.service.balance_of(&principal);
    Ok(Json(BalanceResponse { principal, balance }))
}

// ============================================================================
// ADMIN
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferOwnershipRequest {
    pub new_owner: String,
}

async fn pause_handler(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
) -> Result<Json<CommitResponse>, AppError> {
    execute(&state, caller, Command::Pause).await
}

async fn unpause_handler(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
) -> Result<Json<CommitResponse>, AppError> {
    execute(&state, caller, Command::Unpause).await
}

async fn transfer_ownership_handler(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    Json(req): Json<TransferOwnershipRequest>,
) -> Result<Json<CommitResponse>, AppError> {
    let new_owner = Principal::new(req.new_owner);
    execute(&state, caller, Command::TransferOwnership { new_owner }).await
}

/// Run the server
pub async fn run_server(config: Config, service: Arc<EscrowService>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState {
        service,
        config,
        started_at: std::time::Instant::now(),
    });

    let app = create_router(state);

    info!("Starting bounty escrow server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerOptions;
    use axum::body::Body;
    use axum::http::Request;
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    const OWNER: &str = "0xowner";

    fn app() -> Router {
        let service = Arc::new(EscrowService::in_memory(
            Principal::new(OWNER),
            LedgerOptions::default(),
        ));
        create_router(Arc::new(AppState {
            service,
            config: Config::default(),
            started_at: std::time::Instant::now(),
        }))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post(uri: &str, principal: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(p) = principal {
            builder = builder.header(PRINCIPAL_HEADER, p);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn send<T: DeserializeOwned>(app: &Router, req: Request<Body>) -> (StatusCode, T) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn funded_bounty(app: &Router, issuer: &str, amount: Amount) -> u64 {
        let body = format!(r#"{{"data":"bounty","target_reward":{}}}"#, amount);
        let (status, created): (_, CommitResponse) =
            send(app, post("/bounties", Some(issuer), &body)).await;
        assert_eq!(status, StatusCode::OK);
        let id = created.id.unwrap();

        let body = format!(r#"{{"amount":{},"value":{}}}"#, amount, amount);
        let uri = format!("/bounties/{}/activate", id);
        let (status, _): (_, CommitResponse) = send(app, post(&uri, Some(issuer), &body)).await;
        assert_eq!(status, StatusCode::OK);
        id
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let (status, health): (_, HealthResponse) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(health.healthy);
        assert!(!health.persistent);
    }

    #[tokio::test]
    async fn test_bounty_lifecycle_over_http() {
        let app = app();
        let one_ether: Amount = 1_000_000_000_000_000_000;
        let b = funded_bounty(&app, "0xalice", one_ether).await;

        let (status, created): (_, CommitResponse) = send(
            &app,
            post(
                &format!("/bounties/{}/submissions", b),
                Some("0xbob"),
                r#"{"data":"fix"}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let s = created.id.unwrap();

        let (status, _): (_, CommitResponse) = send(
            &app,
            post(
                &format!("/bounties/{}/submissions/{}/accept", b, s),
                Some("0xalice"),
                "",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, balance): (_, BalanceResponse) =
            send(&app, get("/principals/0xbob/balance")).await;
        assert_eq!(balance.balance, one_ether);

        let (_, bounty): (_, Bounty) = send(&app, get(&format!("/bounties/{}", b))).await;
        assert_eq!(bounty.balance, 0);

        let (_, count): (_, CountResponse) = send(&app, get("/bounties/count")).await;
        assert_eq!(count.count, 1);

        let (_, mine): (_, Page<Submission>) =
            send(&app, get("/principals/0xbob/submissions")).await;
        assert_eq!(mine.count, 1);
        assert_eq!(mine.items[0].id, s);

        let (_, events): (_, Vec<EventRecord>) = send(&app, get("/events?since=2")).await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].seq, 2);

        let (_, report): (_, AuditReport) = send(&app, get("/audit")).await;
        assert!(report.is_healthy());
    }

    #[tokio::test]
    async fn test_error_mapping() {
        let app = app();
        let b = funded_bounty(&app, "0xalice", 10).await;

        let (status, body): (_, ErrorBody) = send(
            &app,
            post(&format!("/bounties/{}/close", b), Some("0xmallory"), ""),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.error, "UNAUTHORIZED");
        assert_eq!(body.operation.as_deref(), Some("close_bounty(id=0)"));

        let (status, body): (_, ErrorBody) =
            send(&app, post("/bounties/0/close", None, "")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.error, "UNAUTHORIZED");

        let (status, body): (_, ErrorBody) = send(&app, get("/bounties/42")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "NOT_FOUND");
        assert!(body.operation.is_none());

        let (status, body): (_, ErrorBody) = send(
            &app,
            post(
                "/bounties/0/activate",
                Some("0xalice"),
                r#"{"amount":10,"value":10}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error, "INVALID_STATE");

        let (status, _): (_, CommitResponse) =
            send(&app, post("/bounties", Some("0xalice"), r#"{"data":"b","target_reward":5}"#))
                .await;
        assert_eq!(status, StatusCode::OK);
        let (status, body): (_, ErrorBody) = send(
            &app,
            post(
                "/bounties/1/activate",
                Some("0xalice"),
                r#"{"amount":5,"value":4}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error, "FUNDS_MISMATCH");
    }

    #[tokio::test]
    async fn test_pause_over_http() {
        let app = app();

        let (status, _): (_, ErrorBody) = send(&app, post("/admin/pause", Some("0xalice"), "")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _): (_, CommitResponse) =
            send(&app, post("/admin/pause", Some(OWNER), "")).await;
        assert_eq!(status, StatusCode::OK);

        let create = r#"{"data":"b","target_reward":1}"#;
        let (status, body): (_, ErrorBody) =
            send(&app, post("/bounties", Some("0xalice"), create)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.error, "PAUSED");

        let (_, summary): (_, LedgerSummary) = send(&app, get("/ledger")).await;
        assert!(summary.paused);

        let (status, _): (_, CommitResponse) =
            send(&app, post("/admin/unpause", Some(OWNER), "")).await;
        assert_eq!(status, StatusCode::OK);
        let (status, created): (_, CommitResponse) =
            send(&app, post("/bounties", Some("0xalice"), create)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created.id, Some(0));
    }

    #[tokio::test]
    async fn test_transfer_ownership_over_http() {
        let app = app();
        let (status, _): (_, CommitResponse) = send(
            &app,
            post("/admin/owner", Some(OWNER), r#"{"new_owner":"0xnew"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, summary): (_, LedgerSummary) = send(&app, get("/ledger")).await;
        assert_eq!(summary.owner, Principal::new("0xnew"));

        let (status, body): (_, ErrorBody) = send(
            &app,
            post("/admin/owner", Some("0xnew"), r#"{"new_owner":"bad owner"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error, "INVALID_STATE");

        // A non-owner learns nothing about the proposed owner.
        let (status, body): (_, ErrorBody) = send(
            &app,
            post("/admin/owner", Some("0xalice"), r#"{"new_owner":"bad owner"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.error, "UNAUTHORIZED");
        let (_, summary): (_, LedgerSummary) = send(&app, get("/ledger")).await;
        assert_eq!(summary.owner, Principal::new("0xnew"));
    }

    #[tokio::test]
    async fn test_paused_ledger_answers_anonymous_calls_with_paused() {
        let app = app();
        let (status, _): (_, CommitResponse) =
            send(&app, post("/admin/pause", Some(OWNER), "")).await;
        assert_eq!(status, StatusCode::OK);

        let create = r#"{"data":"b","target_reward":1}"#;
        for principal in [None, Some("not a principal")] {
            let (status, body): (_, ErrorBody) =
                send(&app, post("/bounties", principal, create)).await;
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(body.error, "PAUSED");
        }

        let (status, body): (_, ErrorBody) = send(&app, post("/admin/unpause", None, "")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.error, "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_reserved_characters_in_principal_paths() {
        let app = app();
        let issuer = "0xa?b#c/d";
        let (status, created): (_, CommitResponse) = send(
            &app,
            post("/bounties", Some(issuer), r#"{"data":"b","target_reward":1}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, mine): (_, Page<Bounty>) =
            send(&app, get("/principals/0xa%3Fb%23c%2Fd/bounties")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine.count, 1);
        assert_eq!(mine.items[0].id, created.id.unwrap());
        assert_eq!(mine.items[0].issuer, Principal::new(issuer));
    }

    #[test]
    fn test_page_query_is_capped() {
        let query = PageQuery {
            offset: Some(3),
            limit: Some(10_000),
        };
        assert_eq!(query.bounds(), (3, MAX_PAGE_LIMIT));
        assert_eq!(PageQuery::default().bounds(), (0, DEFAULT_PAGE_LIMIT));
    }
}
