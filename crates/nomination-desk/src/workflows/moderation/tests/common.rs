use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::clock::FixedClock;
use crate::workflows::memory::InMemoryStore;
use crate::workflows::moderation::{
    AcceptanceIntent, AppointmentStatus, ModerationService, ModerationStore, ModeratorId,
    Notification, NotificationError, NotificationQueue, SecondaryApproval, SubmissionId,
    SubmissionKind, SubmissionRecord, SubmissionRepository, SubmissionStatus, WaiverChange,
    WaiverIntent, WaiverIntentKind, WaiverUpdate,
};
use crate::workflows::roster::{
    Candidate, CandidateId, CandidateRepository, NominationState, Pool, RepositoryError,
};

pub(super) fn decision_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 14, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn candidate_id() -> CandidateId {
    CandidateId("cand-001".to_string())
}

pub(super) fn other_candidate_id() -> CandidateId {
    CandidateId("cand-002".to_string())
}

pub(super) fn moderator() -> ModeratorId {
    ModeratorId("mod-ana".to_string())
}

pub(super) fn seeded_store() -> InMemoryStore {
    InMemoryStore::with_candidates(vec![
        Candidate::new("cand-001", "Joana Prado", Pool::Open, 4),
        Candidate::new("cand-002", "Marcos Teles", Pool::RaceReserved, 1),
    ])
    .expect("store seeds")
}

pub(super) fn waiver_intent(kind: WaiverIntentKind, note: Option<&str>) -> WaiverIntent {
    WaiverIntent {
        kind,
        note: note.map(str::to_string),
    }
}

pub(super) fn secondary_approval(
    already_appointed: AppointmentStatus,
    intends_to_accept: AcceptanceIntent,
) -> SecondaryApproval {
    SecondaryApproval {
        agency: "Tribunal Regional Federal".to_string(),
        role: "Analista Judiciário".to_string(),
        pool: Some("AMPLA".to_string()),
        rank: Some(12),
        intends_to_accept,
        already_appointed,
        note: None,
    }
}

pub(super) fn build_service() -> (
    ModerationService<InMemoryStore, MemoryNotifications>,
    Arc<InMemoryStore>,
    Arc<MemoryNotifications>,
) {
    let store = Arc::new(seeded_store());
    let notifications = Arc::new(MemoryNotifications::default());
    let service = ModerationService::with_clock(
        store.clone(),
        notifications.clone(),
        Arc::new(FixedClock(decision_time())),
    );
    (service, store, notifications)
}

pub(super) fn current_candidate(store: &InMemoryStore, id: &CandidateId) -> Candidate {
    store
        .fetch(id)
        .expect("fetch succeeds")
        .expect("candidate present")
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifications {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<Notification> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .clone()
    }
}

impl NotificationQueue for MemoryNotifications {
    fn enqueue(&self, notification: Notification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct FailingNotifications;

impl NotificationQueue for FailingNotifications {
    fn enqueue(&self, _notification: Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Unavailable("smtp relay down".to_string()))
    }
}

pub(super) struct UnavailableStore;

impl CandidateRepository for UnavailableStore {
    fn list_by_pool(&self, _pool: Pool) -> Result<Vec<Candidate>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_nomination_positions(
        &self,
        _positions: &[(CandidateId, u32)],
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_nomination_states(
        &self,
        _ids: &[CandidateId],
        _state: NominationState,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl SubmissionRepository for UnavailableStore {
    fn fetch_submission(
        &self,
        _id: &SubmissionId,
    ) -> Result<Option<SubmissionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn find_pending(
        &self,
        _candidate_id: &CandidateId,
        _kind: SubmissionKind,
    ) -> Result<Option<SubmissionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn for_candidate(
        &self,
        _candidate_id: &CandidateId,
    ) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn pending(&self, _limit: usize) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert(&self, _record: SubmissionRecord) -> Result<SubmissionRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_pending(&self, _record: SubmissionRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl ModerationStore for UnavailableStore {
    fn commit_decision(
        &self,
        _record: &SubmissionRecord,
        _waiver: Option<&WaiverUpdate>,
    ) -> Result<(Candidate, WaiverChange), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Store where a moderator approves the stored record just before every owner edit lands.
pub(super) struct DecidingStore {
    pub(super) inner: InMemoryStore,
}

impl DecidingStore {
    pub(super) fn seeded() -> Self {
        Self {
            inner: seeded_store(),
        }
    }
}

impl CandidateRepository for DecidingStore {
    fn list_by_pool(&self, pool: Pool) -> Result<Vec<Candidate>, RepositoryError> {
        self.inner.list_by_pool(pool)
    }

    fn fetch(&self, id: &CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn update_nomination_positions(
        &self,
        positions: &[(CandidateId, u32)],
    ) -> Result<(), RepositoryError> {
        self.inner.update_nomination_positions(positions)
    }

    fn update_nomination_states(
        &self,
        ids: &[CandidateId],
        state: NominationState,
    ) -> Result<(), RepositoryError> {
        self.inner.update_nomination_states(ids, state)
    }
}

impl SubmissionRepository for DecidingStore {
    fn fetch_submission(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<SubmissionRecord>, RepositoryError> {
        self.inner.fetch_submission(id)
    }

    fn find_pending(
        &self,
        candidate_id: &CandidateId,
        kind: SubmissionKind,
    ) -> Result<Option<SubmissionRecord>, RepositoryError> {
        self.inner.find_pending(candidate_id, kind)
    }

    fn for_candidate(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        self.inner.for_candidate(candidate_id)
    }

    fn pending(&self, limit: usize) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        self.inner.pending(limit)
    }

    fn insert(&self, record: SubmissionRecord) -> Result<SubmissionRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn update_pending(&self, record: SubmissionRecord) -> Result<(), RepositoryError> {
        if let Some(mut stored) = self.inner.fetch_submission(&record.id)? {
            if stored.is_pending() {
                stored.status = SubmissionStatus::Approved;
                stored.decided_by = Some(moderator());
                stored.decided_at = Some(decision_time());
                self.inner.commit_decision(&stored, None)?;
            }
        }
        self.inner.update_pending(record)
    }
}

impl ModerationStore for DecidingStore {
    fn commit_decision(
        &self,
        record: &SubmissionRecord,
        waiver: Option<&WaiverUpdate>,
    ) -> Result<(Candidate, WaiverChange), RepositoryError> {
        self.inner.commit_decision(record, waiver)
    }
}

pub(super) fn build_racing_service() -> (
    ModerationService<DecidingStore, MemoryNotifications>,
    Arc<DecidingStore>,
) {
    let store = Arc::new(DecidingStore::seeded());
    let service = ModerationService::with_clock(
        store.clone(),
        Arc::new(MemoryNotifications::default()),
        Arc::new(FixedClock(decision_time())),
    );
    (service, store)
}

/// Queue that records the stored status of each submission at the moment it is enqueued.
pub(super) struct CommitObservingQueue {
    pub(super) store: Arc<InMemoryStore>,
    pub(super) seen: Mutex<Vec<SubmissionStatus>>,
}

impl NotificationQueue for CommitObservingQueue {
    fn enqueue(&self, notification: Notification) -> Result<(), NotificationError> {
        let id = notification
            .metadata
            .get("submission_id")
            .cloned()
            .unwrap_or_default();
        let status = self
            .store
            .fetch_submission(&SubmissionId(id))
            .ok()
            .flatten()
            .map(|record| record.status)
            .unwrap_or(SubmissionStatus::Pending);
        self.seen.lock().expect("queue mutex poisoned").push(status);
        Ok(())
    }
}
