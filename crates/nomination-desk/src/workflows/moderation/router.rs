use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    Decision, ModeratorId, SecondaryApproval, SubmissionId, SubmissionPayload, WaiverIntent,
};
use super::repository::{ModerationStore, NotificationQueue};
use super::service::{ModerationError, ModerationService};
use crate::workflows::roster::{CandidateId, RepositoryError};

const DEFAULT_QUEUE_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub(crate) struct WaiverIntentRequest {
    pub(crate) candidate_id: CandidateId,
    #[serde(flatten)]
    pub(crate) intent: WaiverIntent,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SecondaryApprovalRequest {
    pub(crate) candidate_id: CandidateId,
    #[serde(flatten)]
    pub(crate) approval: SecondaryApproval,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EditRequest {
    pub(crate) candidate_id: CandidateId,
    pub(crate) payload: SubmissionPayload,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DecisionRequest {
    pub(crate) decision: Decision,
    pub(crate) moderator_id: ModeratorId,
    #[serde(default)]
    pub(crate) notify: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueueQuery {
    pub(crate) limit: Option<usize>,
}

/// Router builder exposing candidate submission and moderator decision endpoints.
pub fn moderation_router<S, N>(service: Arc<ModerationService<S, N>>) -> Router
where
    S: ModerationStore + 'static,
    N: NotificationQueue + 'static,
{
    Router::new()
        .route(
            "/api/v1/submissions/waiver-intents",
            post(waiver_intent_handler::<S, N>),
        )
        .route(
            "/api/v1/submissions/secondary-approvals",
            post(secondary_approval_handler::<S, N>),
        )
        .route("/api/v1/submissions/pending", get(queue_handler::<S, N>))
        .route(
            "/api/v1/submissions/:submission_id",
            get(status_handler::<S, N>).put(edit_handler::<S, N>),
        )
        .route(
            "/api/v1/submissions/:submission_id/decision",
            post(decision_handler::<S, N>),
        )
        .with_state(service)
}

pub(crate) async fn waiver_intent_handler<S, N>(
    State(service): State<Arc<ModerationService<S, N>>>,
    axum::Json(request): axum::Json<WaiverIntentRequest>,
) -> Response
where
    S: ModerationStore + 'static,
    N: NotificationQueue + 'static,
{
    match service.submit_waiver_intent(&request.candidate_id, request.intent) {
        Ok(record) => (StatusCode::ACCEPTED, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn secondary_approval_handler<S, N>(
    State(service): State<Arc<ModerationService<S, N>>>,
    axum::Json(request): axum::Json<SecondaryApprovalRequest>,
) -> Response
where
    S: ModerationStore + 'static,
    N: NotificationQueue + 'static,
{
    match service.submit_secondary_approval(&request.candidate_id, request.approval) {
        Ok(record) => (StatusCode::ACCEPTED, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn edit_handler<S, N>(
    State(service): State<Arc<ModerationService<S, N>>>,
    Path(submission_id): Path<String>,
    axum::Json(request): axum::Json<EditRequest>,
) -> Response
where
    S: ModerationStore + 'static,
    N: NotificationQueue + 'static,
{
    let id = SubmissionId(submission_id);
    match service.edit_submission(&request.candidate_id, &id, request.payload) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<S, N>(
    State(service): State<Arc<ModerationService<S, N>>>,
    Path(submission_id): Path<String>,
) -> Response
where
    S: ModerationStore + 'static,
    N: NotificationQueue + 'static,
{
    match service.get(&SubmissionId(submission_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn queue_handler<S, N>(
    State(service): State<Arc<ModerationService<S, N>>>,
    Query(query): Query<QueueQuery>,
) -> Response
where
    S: ModerationStore + 'static,
    N: NotificationQueue + 'static,
{
    let limit = query.limit.unwrap_or(DEFAULT_QUEUE_LIMIT);
    match service.pending_queue(limit) {
        Ok(records) => (StatusCode::OK, axum::Json(records)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn decision_handler<S, N>(
    State(service): State<Arc<ModerationService<S, N>>>,
    Path(submission_id): Path<String>,
    axum::Json(request): axum::Json<DecisionRequest>,
) -> Response
where
    S: ModerationStore + 'static,
    N: NotificationQueue + 'static,
{
    let id = SubmissionId(submission_id);
    match service.decide(&id, request.decision, &request.moderator_id, request.notify) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: ModerationError) -> Response {
    let status = match &error {
        ModerationError::RecordNotFound(_) | ModerationError::CandidateNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        ModerationError::InvalidState { .. } | ModerationError::StaleDecision(_) => {
            StatusCode::CONFLICT
        }
        ModerationError::NotOwner { .. } => StatusCode::FORBIDDEN,
        ModerationError::KindMismatch { .. } | ModerationError::InvalidSubmission(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ModerationError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ModerationError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
