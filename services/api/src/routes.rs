use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::{Local, NaiveDate};
use pps_engine::config::AcademicConfig;
use pps_engine::error::AppError;
use pps_engine::workflows::practicum::{
    ledger, practicum_router, EligibilityCriteria, EligibilityEvaluator, PracticeId,
    PracticeRecord, PracticumRepository, SelectionNotifier, SelectionService, SpecialtyArea,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Ad hoc ledger evaluation, for records not yet stored anywhere.
#[derive(Debug, Deserialize)]
pub(crate) struct LedgerEvaluationRequest {
    pub(crate) practices: Vec<PracticeRecord>,
    #[serde(default)]
    pub(crate) specialty: Option<String>,
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LedgerEvaluationResponse {
    pub(crate) evaluated_on: NaiveDate,
    pub(crate) finished_overdue: Vec<PracticeId>,
    pub(crate) summary: String,
    pub(crate) criteria: EligibilityCriteria,
}

pub(crate) fn with_practicum_routes<R, N>(service: Arc<SelectionService<R, N>>) -> axum::Router
where
    R: PracticumRepository + 'static,
    N: SelectionNotifier + 'static,
{
    let evaluator = Arc::new(service.evaluator().clone());

    practicum_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/eligibility/evaluate",
            axum::routing::post(ledger_evaluation_endpoint),
        )
        .layer(Extension(evaluator))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn ledger_evaluation_endpoint(
    Extension(evaluator): Extension<Arc<EligibilityEvaluator>>,
    Json(payload): Json<LedgerEvaluationRequest>,
) -> Result<Json<LedgerEvaluationResponse>, AppError> {
    let LedgerEvaluationRequest {
        mut practices,
        specialty,
        today,
    } = payload;

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let specialty = specialty.as_deref().and_then(SpecialtyArea::parse);
    Ok(Json(evaluate_ledger(
        &evaluator,
        &mut practices,
        specialty.as_ref(),
        today,
    )))
}

/// Evaluate a detached ledger, treating overdue practices as finished.
pub(crate) fn evaluate_ledger(
    evaluator: &EligibilityEvaluator,
    practices: &mut [PracticeRecord],
    specialty: Option<&SpecialtyArea>,
    today: NaiveDate,
) -> LedgerEvaluationResponse {
    let finished_overdue = ledger::finish_overdue(practices, today);
    let criteria = evaluator.evaluate(practices, specialty);

    LedgerEvaluationResponse {
        evaluated_on: today,
        finished_overdue,
        summary: criteria.summary(),
        criteria,
    }
}

pub(crate) fn evaluator_from_env() -> Result<EligibilityEvaluator, AppError> {
    let academic = AcademicConfig::from_env()?;
    Ok(EligibilityEvaluator::new(academic.eligibility))
}
