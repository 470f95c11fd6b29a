use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{SubmissionId, SubmissionKind, SubmissionRecord};
use crate::workflows::roster::{
    Candidate, CandidateId, CandidateRepository, RepositoryError, WaiverStatus,
};

/// Candidate waiver write attached to a moderation decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WaiverUpdate {
    Overwrite {
        status: WaiverStatus,
        note: Option<String>,
    },
    /// Compare-and-swap to `NONE`, skipped when the current status differs from `expected`.
    ResetIfCurrent { expected: WaiverStatus },
}

/// What a committed decision did to the candidate's waiver fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WaiverChange {
    /// The decision carried no waiver update.
    Untouched,
    Applied {
        previous: WaiverStatus,
        current: WaiverStatus,
    },
    /// Guarded reset found a status set by another path and left it alone.
    Preserved {
        expected: WaiverStatus,
        found: WaiverStatus,
    },
}

impl WaiverUpdate {
    /// Apply the update to a candidate row. Stores call this inside their transaction.
    pub fn apply(&self, candidate: &mut Candidate) -> WaiverChange {
        let previous = candidate.waiver_status;
        match self {
            WaiverUpdate::Overwrite { status, note } => {
                candidate.waiver_status = *status;
                candidate.waiver_note = note.clone();
                WaiverChange::Applied {
                    previous,
                    current: *status,
                }
            }
            WaiverUpdate::ResetIfCurrent { expected } if previous == *expected => {
                candidate.waiver_status = WaiverStatus::None;
                candidate.waiver_note = None;
                WaiverChange::Applied {
                    previous,
                    current: WaiverStatus::None,
                }
            }
            WaiverUpdate::ResetIfCurrent { expected } => WaiverChange::Preserved {
                expected: *expected,
                found: previous,
            },
        }
    }
}

/// Storage abstraction over submission records.
pub trait SubmissionRepository: Send + Sync {
    fn fetch_submission(&self, id: &SubmissionId)
        -> Result<Option<SubmissionRecord>, RepositoryError>;
    fn find_pending(
        &self,
        candidate_id: &CandidateId,
        kind: SubmissionKind,
    ) -> Result<Option<SubmissionRecord>, RepositoryError>;
    fn for_candidate(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<Vec<SubmissionRecord>, RepositoryError>;
    fn pending(&self, limit: usize) -> Result<Vec<SubmissionRecord>, RepositoryError>;
    /// Must fail with `Conflict` when the id exists, or when the record is a pending waiver
    /// intent and the candidate already has one.
    fn insert(&self, record: SubmissionRecord) -> Result<SubmissionRecord, RepositoryError>;
    /// Replace a record that is still pending. Returns `NotFound` when the id is unknown and
    /// `Conflict` when the stored record was decided in the meantime; nothing is written then.
    fn update_pending(&self, record: SubmissionRecord) -> Result<(), RepositoryError>;
}

/// Store able to persist a decision and its candidate mutation as one unit.
pub trait ModerationStore: CandidateRepository + SubmissionRepository {
    /// Write the decided `record` and apply `waiver` to its candidate atomically.
    ///
    /// Implementations must hold a transaction (or equivalent lock) across the pending
    /// check, the waiver compare-and-swap and both writes. Returns `Conflict` when the stored
    /// record is missing or no longer pending, and `NotFound` when the candidate is missing;
    /// in both cases nothing is written.
    fn commit_decision(
        &self,
        record: &SubmissionRecord,
        waiver: Option<&WaiverUpdate>,
    ) -> Result<(Candidate, WaiverChange), RepositoryError>;
}

/// Trait describing outbound notification hooks (e-mail, push, committee feed).
///
/// `enqueue` runs on the decision path after the commit, so implementations must only hand the
/// notification off (outbox row, channel send) and never deliver it inline.
pub trait NotificationQueue: Send + Sync {
    fn enqueue(&self, notification: Notification) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub metadata: BTreeMap<String, String>,
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification queue unavailable: {0}")]
    Unavailable(String),
}
