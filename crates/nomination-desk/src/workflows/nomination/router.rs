use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::service::{NominationError, NominationService};
use crate::workflows::roster::{CandidateRepository, RepositoryError};

#[derive(Debug, Deserialize)]
pub(crate) struct NominateRequest {
    pub(crate) count: usize,
}

/// Router builder exposing the nomination order endpoints.
pub fn nomination_router<R>(service: Arc<NominationService<R>>) -> Router
where
    R: CandidateRepository + 'static,
{
    Router::new()
        .route("/api/v1/nomination/order", get(order_handler::<R>))
        .route(
            "/api/v1/nomination/order/recompute",
            post(recompute_handler::<R>),
        )
        .route("/api/v1/nomination/nominate", post(nominate_handler::<R>))
        .with_state(service)
}

pub(crate) async fn order_handler<R>(State(service): State<Arc<NominationService<R>>>) -> Response
where
    R: CandidateRepository + 'static,
{
    match service.current_order() {
        Ok(order) => (StatusCode::OK, axum::Json(order)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn recompute_handler<R>(
    State(service): State<Arc<NominationService<R>>>,
) -> Response
where
    R: CandidateRepository + 'static,
{
    match service.recompute() {
        Ok(order) => (StatusCode::OK, axum::Json(order)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn nominate_handler<R>(
    State(service): State<Arc<NominationService<R>>>,
    axum::Json(request): axum::Json<NominateRequest>,
) -> Response
where
    R: CandidateRepository + 'static,
{
    match service.nominate_next(request.count) {
        Ok(nominated) => {
            let payload = json!({ "nominated": nominated });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn error_response(error: NominationError) -> Response {
    let status = match &error {
        // stored roster breaks a precondition the ingestion boundary should have caught
        NominationError::Roster(_) => StatusCode::UNPROCESSABLE_ENTITY,
        NominationError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        NominationError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
