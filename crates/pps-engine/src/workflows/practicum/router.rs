use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use super::domain::{EnrollmentId, OpeningId, StudentId};
use super::repository::{PracticumRepository, RepositoryError, SelectionNotifier};
use super::service::{SelectionService, SelectionServiceError};

type SharedService<R, N> = Arc<SelectionService<R, N>>;

#[derive(Debug, Deserialize)]
pub(crate) struct SelectionRequest {
    pub(crate) selected: bool,
}

/// Router builder exposing eligibility, ranking, and selection endpoints.
pub fn practicum_router<R, N>(service: SharedService<R, N>) -> Router
where
    R: PracticumRepository + 'static,
    N: SelectionNotifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/students/:student_id/eligibility",
            get(eligibility_handler::<R, N>),
        )
        .route(
            "/api/v1/openings/:opening_id/ranking",
            get(ranking_handler::<R, N>),
        )
        .route(
            "/api/v1/openings/:opening_id/close",
            post(close_handler::<R, N>),
        )
        .route(
            "/api/v1/enrollments/:enrollment_id/selection",
            put(selection_handler::<R, N>),
        )
        .route(
            "/api/v1/enrollments/:enrollment_id/toggle",
            post(toggle_handler::<R, N>),
        )
        .with_state(service)
}

pub(crate) async fn eligibility_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(student_id): Path<String>,
) -> Response
where
    R: PracticumRepository + 'static,
    N: SelectionNotifier + 'static,
{
    let today = Local::now().date_naive();
    match service.eligibility(&StudentId(student_id), today) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn ranking_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(opening_id): Path<String>,
) -> Response
where
    R: PracticumRepository + 'static,
    N: SelectionNotifier + 'static,
{
    match service.rank_opening(&OpeningId(opening_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn selection_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(enrollment_id): Path<String>,
    Json(request): Json<SelectionRequest>,
) -> Response
where
    R: PracticumRepository + 'static,
    N: SelectionNotifier + 'static,
{
    match service.set_selection(&EnrollmentId(enrollment_id), request.selected) {
        Ok(change) => (StatusCode::OK, Json(change)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn toggle_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(enrollment_id): Path<String>,
) -> Response
where
    R: PracticumRepository + 'static,
    N: SelectionNotifier + 'static,
{
    match service.toggle_selection(&EnrollmentId(enrollment_id)) {
        Ok(change) => (StatusCode::OK, Json(change)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn close_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(opening_id): Path<String>,
) -> Response
where
    R: PracticumRepository + 'static,
    N: SelectionNotifier + 'static,
{
    match service.close_opening(&OpeningId(opening_id)).await {
        Ok(report) => {
            let status = if report.is_clean() {
                StatusCode::OK
            } else {
                StatusCode::MULTI_STATUS
            };
            (status, Json(report)).into_response()
        }
        Err(err) => error_response(err),
    }
}

fn error_response(err: SelectionServiceError) -> Response {
    let status = match &err {
        SelectionServiceError::StudentNotFound(_)
        | SelectionServiceError::OpeningNotFound(_)
        | SelectionServiceError::EnrollmentNotFound(_)
        | SelectionServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        SelectionServiceError::OpeningNotOpen { .. }
        | SelectionServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        SelectionServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    let payload = json!({
        "error": err.to_string(),
    });
    (status, Json(payload)).into_response()
}
