use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use crate::execution::ExecutionCoordinator;
use crate::observability::MetricsRegistry;
use crate::rules::RuleBook;

use super::request::QueryBody;
use super::response::{EvaluateResponse, ErrorResponse, HealthResponse, QueryResult, ReadyResponse};

/// Shared application state.
pub struct AppState {
    /// Routes and answers queries
    pub coordinator: Arc<ExecutionCoordinator>,

    /// Current rule book (updated via watch channel)
    pub rule_book_rx: watch::Receiver<Arc<RuleBook>>,

    pub metrics: Arc<MetricsRegistry>,

    /// Application start time
    pub start_time: Instant,

    /// Application version
    pub version: String,
}

/// Create the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/query", post(handle_query))
        .route("/v1/policy/evaluate", post(handle_evaluate))
        .route("/health", get(handle_health))
        .route("/ready", get(handle_ready))
        .route("/metrics", get(handle_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn empty_query() -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::bad_request("query must not be empty")),
    )
        .into_response()
}

/// Route and answer a query.
async fn handle_query(
    State(state): State<Arc<AppState>>,
    Json(body): Json<QueryBody>,
) -> axum::response::Response {
    if body.query.trim().is_empty() {
        return empty_query();
    }

    let request = body.into_query_request();
    let session_id = request.session_id.clone();

    match state.coordinator.execute_detailed(request).await {
        Ok(outcome) => (StatusCode::OK, Json(QueryResult::from(outcome))).into_response(),
        Err(e) => {
            let status = if e.is_cloud_unavailable() {
                StatusCode::SERVICE_UNAVAILABLE
            } else {
                StatusCode::BAD_GATEWAY
            };

            (
                status,
                Json(ErrorResponse::new(e.to_string(), e.code()).with_session(session_id)),
            )
                .into_response()
        }
    }
}

/// Evaluate the current policy against a query without dispatching it.
async fn handle_evaluate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<QueryBody>,
) -> axum::response::Response {
    if body.query.trim().is_empty() {
        return empty_query();
    }

    let request = body.into_query_request();
    let evaluation = state.coordinator.evaluate(&request);
    let policy_version = state.rule_book_rx.borrow().policy_version.clone();

    (
        StatusCode::OK,
        Json(EvaluateResponse {
            decision: evaluation.decision,
            matched_rule: evaluation.matched_rule,
            rules_checked: evaluation.rules_checked,
            policy_version,
            session_id: request.session_id,
        }),
    )
        .into_response()
}

/// Health check endpoint.
async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let book = state.rule_book_rx.borrow();

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        policy_version: book.policy_version.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Readiness check endpoint.
async fn handle_ready(State(state): State<Arc<AppState>>) -> axum::response::Response {
    let book = state.rule_book_rx.borrow();

    if book.is_placeholder() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("No policy loaded", "NOT_READY")),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        Json(ReadyResponse {
            ready: true,
            policy_version: book.policy_version.clone(),
            rules: book.rules.len(),
            enabled_rules: book.enabled_count(),
            cloud_configured: state.coordinator.has_cloud(),
        }),
    )
        .into_response()
}

/// Metrics endpoint (Prometheus format).
async fn handle_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (rules, enabled) = {
        let book = state.rule_book_rx.borrow();
        (book.rules.len(), book.enabled_count())
    };

    let body = format!(
        r#"{}
# HELP routegate_uptime_seconds Application uptime in seconds
# TYPE routegate_uptime_seconds counter
routegate_uptime_seconds {}

# HELP routegate_rules Number of rules loaded
# TYPE routegate_rules gauge
routegate_rules {}

# HELP routegate_enabled_rules Number of enabled rules loaded
# TYPE routegate_enabled_rules gauge
routegate_enabled_rules {}
"#,
        state.metrics.to_prometheus(),
        state.start_time.elapsed().as_secs(),
        rules,
        enabled,
    );

    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; charset=utf-8",
        )],
        body,
    )
}
