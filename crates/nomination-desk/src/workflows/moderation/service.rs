use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::derivation::{approval_update, rejection_update};
use super::domain::{
    Decision, ModeratorId, SecondaryApproval, SubmissionId, SubmissionKind, SubmissionPayload,
    SubmissionRecord, SubmissionStatus, WaiverIntent,
};
use super::repository::{
    ModerationStore, Notification, NotificationQueue, WaiverChange,
};
use crate::workflows::clock::{Clock, SystemClock};
use crate::workflows::roster::normalizer::clean_note;
use crate::workflows::roster::{Candidate, CandidateId, RepositoryError};

/// Error raised by the moderation workflow. No variant leaves a partial write behind.
#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    #[error("submission {0} not found")]
    RecordNotFound(SubmissionId),
    #[error("submission {id} is {status}, only pending submissions can change")]
    InvalidState {
        id: SubmissionId,
        status: SubmissionStatus,
    },
    #[error("candidate {0} not found")]
    CandidateNotFound(CandidateId),
    #[error("submission {0} was decided concurrently")]
    StaleDecision(SubmissionId),
    #[error("submission {id} does not belong to candidate {candidate}")]
    NotOwner {
        id: SubmissionId,
        candidate: CandidateId,
    },
    #[error("submission {id} is a {expected} and cannot be replaced by a {found}")]
    KindMismatch {
        id: SubmissionId,
        expected: &'static str,
        found: &'static str,
    },
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result of the post-commit notification hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "delivery", content = "detail", rename_all = "snake_case")]
pub enum NotificationDelivery {
    NotRequested,
    Enqueued,
    Failed(String),
}

/// Mutation result returned to the caller after a decision commits.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionOutcome {
    pub record: SubmissionRecord,
    pub candidate: Candidate,
    pub waiver_change: WaiverChange,
    pub notification: NotificationDelivery,
}

static SUBMISSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_submission_id() -> SubmissionId {
    let id = SUBMISSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SubmissionId(format!("sub-{id:06}"))
}

/// Service composing the store, clock, and notification hook around moderator decisions.
pub struct ModerationService<S, N> {
    store: Arc<S>,
    notifications: Arc<N>,
    clock: Arc<dyn Clock>,
}

impl<S, N> ModerationService<S, N>
where
    S: ModerationStore + 'static,
    N: NotificationQueue + 'static,
{
    pub fn new(store: Arc<S>, notifications: Arc<N>) -> Self {
        Self::with_clock(store, notifications, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<S>, notifications: Arc<N>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            notifications,
            clock,
        }
    }

    /// Record a waiver declaration, reusing the candidate's pending one if it exists.
    pub fn submit_waiver_intent(
        &self,
        candidate_id: &CandidateId,
        intent: WaiverIntent,
    ) -> Result<SubmissionRecord, ModerationError> {
        self.require_candidate(candidate_id)?;
        let payload = SubmissionPayload::WaiverIntent(WaiverIntent {
            kind: intent.kind,
            note: clean_note(intent.note),
        });

        if let Some(existing) = self
            .store
            .find_pending(candidate_id, SubmissionKind::WaiverIntent)?
        {
            if let Some(updated) = self.replace_pending(existing, payload.clone())? {
                return Ok(updated);
            }
            // decided while we were replacing it; this intent starts a new record
        }

        let record = SubmissionRecord::pending(
            next_submission_id(),
            candidate_id.clone(),
            payload.clone(),
            self.clock.now(),
        );

        match self.store.insert(record) {
            Ok(stored) => {
                info!(submission = %stored.id, candidate = %candidate_id, "waiver intent submitted");
                Ok(stored)
            }
            Err(RepositoryError::Conflict) => {
                // lost a race with another submission for the same candidate
                let existing = self
                    .store
                    .find_pending(candidate_id, SubmissionKind::WaiverIntent)?
                    .ok_or(RepositoryError::Conflict)?;
                let id = existing.id.clone();
                self.replace_pending(existing, payload)?
                    .ok_or(ModerationError::StaleDecision(id))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Record an approval in another examination. Candidates may hold any number of these.
    pub fn submit_secondary_approval(
        &self,
        candidate_id: &CandidateId,
        approval: SecondaryApproval,
    ) -> Result<SubmissionRecord, ModerationError> {
        self.require_candidate(candidate_id)?;
        let approval = sanitize_secondary(approval)?;

        let record = SubmissionRecord::pending(
            next_submission_id(),
            candidate_id.clone(),
            SubmissionPayload::SecondaryApproval(approval),
            self.clock.now(),
        );
        let stored = self.store.insert(record)?;
        info!(submission = %stored.id, candidate = %candidate_id, "secondary approval submitted");
        Ok(stored)
    }

    /// Owner edit of a still-pending submission; the record keeps its id and stays pending.
    pub fn edit_submission(
        &self,
        candidate_id: &CandidateId,
        submission_id: &SubmissionId,
        payload: SubmissionPayload,
    ) -> Result<SubmissionRecord, ModerationError> {
        let record = self.get(submission_id)?;

        if &record.candidate_id != candidate_id {
            return Err(ModerationError::NotOwner {
                id: record.id,
                candidate: candidate_id.clone(),
            });
        }
        if !record.is_pending() {
            return Err(ModerationError::InvalidState {
                id: record.id,
                status: record.status,
            });
        }
        if record.kind() != payload.kind() {
            let expected = record.kind().label();
            return Err(ModerationError::KindMismatch {
                id: record.id,
                expected,
                found: payload.kind().label(),
            });
        }

        let payload = match payload {
            SubmissionPayload::SecondaryApproval(approval) => {
                SubmissionPayload::SecondaryApproval(sanitize_secondary(approval)?)
            }
            SubmissionPayload::WaiverIntent(intent) => SubmissionPayload::WaiverIntent(WaiverIntent {
                kind: intent.kind,
                note: clean_note(intent.note),
            }),
        };

        let id = record.id.clone();
        match self.replace_pending(record, payload)? {
            Some(updated) => Ok(updated),
            None => {
                let current = self.get(&id)?;
                Err(ModerationError::InvalidState {
                    id: current.id,
                    status: current.status,
                })
            }
        }
    }

    /// Approve or reject a pending submission on behalf of an authorized moderator.
    ///
    /// The record status and the derived candidate waiver change are committed together.
    /// When `notify` is set, an approval enqueues a notification after the commit; enqueue
    /// failures are logged and reported in the outcome but never fail the decision. The queue
    /// only accepts the hand-off, see [`NotificationQueue`].
    pub fn decide(
        &self,
        submission_id: &SubmissionId,
        decision: Decision,
        moderator: &ModeratorId,
        notify: bool,
    ) -> Result<DecisionOutcome, ModerationError> {
        let mut record = self.get(submission_id)?;
        if !record.is_pending() {
            return Err(ModerationError::InvalidState {
                id: record.id,
                status: record.status,
            });
        }
        self.require_candidate(&record.candidate_id)?;

        let now = self.clock.now();
        let decided_on = now.date_naive();
        let waiver = match decision {
            Decision::Approve => approval_update(&record.payload, decided_on),
            Decision::Reject => rejection_update(&record.payload, decided_on),
        };

        record.status = decision.resulting_status();
        record.decided_by = Some(moderator.clone());
        record.decided_at = Some(now);
        record.updated_at = now;

        let (candidate, waiver_change) = self
            .store
            .commit_decision(&record, waiver.as_ref())
            .map_err(|error| match error {
                RepositoryError::Conflict => ModerationError::StaleDecision(record.id.clone()),
                RepositoryError::NotFound => {
                    ModerationError::CandidateNotFound(record.candidate_id.clone())
                }
                other => ModerationError::Repository(other),
            })?;

        info!(
            submission = %record.id,
            candidate = %record.candidate_id,
            moderator = %moderator,
            %decision,
            kind = record.kind().label(),
            waiver_change = ?waiver_change,
            "submission decided"
        );

        let notification = if notify && decision == Decision::Approve {
            self.dispatch(&record, &candidate)
        } else {
            NotificationDelivery::NotRequested
        };

        Ok(DecisionOutcome {
            record,
            candidate,
            waiver_change,
            notification,
        })
    }

    pub fn get(&self, submission_id: &SubmissionId) -> Result<SubmissionRecord, ModerationError> {
        self.store
            .fetch_submission(submission_id)?
            .ok_or_else(|| ModerationError::RecordNotFound(submission_id.clone()))
    }

    /// Oldest-first queue of submissions awaiting a moderator.
    pub fn pending_queue(&self, limit: usize) -> Result<Vec<SubmissionRecord>, ModerationError> {
        Ok(self.store.pending(limit)?)
    }

    pub fn history(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<Vec<SubmissionRecord>, ModerationError> {
        self.require_candidate(candidate_id)?;
        Ok(self.store.for_candidate(candidate_id)?)
    }

    fn require_candidate(&self, candidate_id: &CandidateId) -> Result<Candidate, ModerationError> {
        self.store
            .fetch(candidate_id)?
            .ok_or_else(|| ModerationError::CandidateNotFound(candidate_id.clone()))
    }

    /// Swap the payload of a pending record. `None` when a moderator decided it first.
    fn replace_pending(
        &self,
        mut record: SubmissionRecord,
        payload: SubmissionPayload,
    ) -> Result<Option<SubmissionRecord>, ModerationError> {
        record.payload = payload;
        record.status = SubmissionStatus::Pending;
        record.updated_at = self.clock.now();

        match self.store.update_pending(record.clone()) {
            Ok(()) => {
                info!(submission = %record.id, candidate = %record.candidate_id, "pending submission updated");
                Ok(Some(record))
            }
            Err(RepositoryError::Conflict) => {
                warn!(submission = %record.id, "submission decided before the edit landed");
                Ok(None)
            }
            Err(other) => Err(other.into()),
        }
    }

    fn dispatch(&self, record: &SubmissionRecord, candidate: &Candidate) -> NotificationDelivery {
        let notification = approval_notification(record, candidate);
        match self.notifications.enqueue(notification) {
            Ok(()) => NotificationDelivery::Enqueued,
            Err(error) => {
                warn!(submission = %record.id, %error, "approval notification not enqueued");
                NotificationDelivery::Failed(error.to_string())
            }
        }
    }
}

fn sanitize_secondary(approval: SecondaryApproval) -> Result<SecondaryApproval, ModerationError> {
    let agency = approval.agency.trim().to_string();
    let role = approval.role.trim().to_string();
    if agency.is_empty() {
        return Err(ModerationError::InvalidSubmission(
            "agency is required".to_string(),
        ));
    }
    if role.is_empty() {
        return Err(ModerationError::InvalidSubmission("role is required".to_string()));
    }

    Ok(SecondaryApproval {
        agency,
        role,
        pool: clean_note(approval.pool),
        note: clean_note(approval.note),
        ..approval
    })
}

fn approval_notification(record: &SubmissionRecord, candidate: &Candidate) -> Notification {
    let title = match &record.payload {
        SubmissionPayload::SecondaryApproval(approval) => {
            format!("Approval at {} confirmed", approval.agency)
        }
        SubmissionPayload::WaiverIntent(_) => "Waiver declaration approved".to_string(),
    };
    let body = format!(
        "{} ({} #{}) now has waiver status {}.",
        candidate.name, candidate.pool, candidate.pool_rank, candidate.waiver_status
    );

    let mut metadata = BTreeMap::new();
    metadata.insert("submission_id".to_string(), record.id.0.clone());
    metadata.insert("candidate_id".to_string(), candidate.id.0.clone());
    metadata.insert("kind".to_string(), record.kind().label().to_string());
    if let Some(moderator) = &record.decided_by {
        metadata.insert("moderator_id".to_string(), moderator.0.clone());
    }

    Notification {
        title,
        body,
        metadata,
    }
}
