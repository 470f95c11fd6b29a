use std::sync::{Arc, Mutex, MutexGuard};

use crate::workflows::moderation::{
    ModerationStore, SubmissionId, SubmissionKind, SubmissionRecord, SubmissionRepository,
    SubmissionStatus, WaiverChange, WaiverUpdate,
};
use crate::workflows::roster::{
    Candidate, CandidateId, CandidateRepository, NominationState, Pool, RepositoryError,
};

#[derive(Debug, Default)]
struct StoreState {
    candidates: Vec<Candidate>,
    submissions: Vec<SubmissionRecord>,
}

/// Mutex-backed store for the API server, demos and tests.
///
/// A single lock covers candidates and submissions, which makes every commit serializable.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn with_candidates<I>(candidates: I) -> Result<Self, RepositoryError>
    where
        I: IntoIterator<Item = Candidate>,
    {
        let store = Self::default();
        for candidate in candidates {
            store.add_candidate(candidate)?;
        }
        Ok(store)
    }

    pub fn add_candidate(&self, candidate: Candidate) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if state.candidates.iter().any(|existing| existing.id == candidate.id) {
            return Err(RepositoryError::Conflict);
        }
        state.candidates.push(candidate);
        Ok(())
    }

    pub fn candidates(&self) -> Result<Vec<Candidate>, RepositoryError> {
        Ok(self.lock()?.candidates.clone())
    }

    pub fn submissions(&self) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        Ok(self.lock()?.submissions.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }
}

impl CandidateRepository for InMemoryStore {
    fn list_by_pool(&self, pool: Pool) -> Result<Vec<Candidate>, RepositoryError> {
        let state = self.lock()?;
        let mut members: Vec<Candidate> = state
            .candidates
            .iter()
            .filter(|candidate| candidate.pool == pool)
            .cloned()
            .collect();
        members.sort_by_key(|candidate| candidate.pool_rank);
        Ok(members)
    }

    fn fetch(&self, id: &CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .candidates
            .iter()
            .find(|candidate| &candidate.id == id)
            .cloned())
    }

    fn update_nomination_positions(
        &self,
        positions: &[(CandidateId, u32)],
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if positions
            .iter()
            .any(|(id, _)| !state.candidates.iter().any(|candidate| &candidate.id == id))
        {
            return Err(RepositoryError::NotFound);
        }

        for candidate in state.candidates.iter_mut() {
            candidate.nomination_position = positions
                .iter()
                .find(|(id, _)| id == &candidate.id)
                .map(|(_, position)| *position);
        }
        Ok(())
    }

    fn update_nomination_states(
        &self,
        ids: &[CandidateId],
        nomination_state: NominationState,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if ids
            .iter()
            .any(|id| !state.candidates.iter().any(|candidate| &candidate.id == id))
        {
            return Err(RepositoryError::NotFound);
        }

        for candidate in state
            .candidates
            .iter_mut()
            .filter(|candidate| ids.contains(&candidate.id))
        {
            candidate.nomination_state = nomination_state;
        }
        Ok(())
    }
}

impl SubmissionRepository for InMemoryStore {
    fn fetch_submission(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<SubmissionRecord>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .submissions
            .iter()
            .find(|record| &record.id == id)
            .cloned())
    }

    fn find_pending(
        &self,
        candidate_id: &CandidateId,
        kind: SubmissionKind,
    ) -> Result<Option<SubmissionRecord>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .submissions
            .iter()
            .find(|record| {
                &record.candidate_id == candidate_id && record.kind() == kind && record.is_pending()
            })
            .cloned())
    }

    fn for_candidate(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .submissions
            .iter()
            .filter(|record| &record.candidate_id == candidate_id)
            .cloned()
            .collect())
    }

    fn pending(&self, limit: usize) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .submissions
            .iter()
            .filter(|record| record.is_pending())
            .take(limit)
            .cloned()
            .collect())
    }

    fn insert(&self, record: SubmissionRecord) -> Result<SubmissionRecord, RepositoryError> {
        let mut state = self.lock()?;
        if state.submissions.iter().any(|existing| existing.id == record.id) {
            return Err(RepositoryError::Conflict);
        }
        if record.kind() == SubmissionKind::WaiverIntent
            && record.is_pending()
            && state.submissions.iter().any(|existing| {
                existing.candidate_id == record.candidate_id
                    && existing.kind() == SubmissionKind::WaiverIntent
                    && existing.is_pending()
            })
        {
            return Err(RepositoryError::Conflict);
        }
        state.submissions.push(record.clone());
        Ok(record)
    }

    fn update_pending(&self, record: SubmissionRecord) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let slot = state
            .submissions
            .iter_mut()
            .find(|existing| existing.id == record.id)
            .ok_or(RepositoryError::NotFound)?;
        if !slot.is_pending() {
            return Err(RepositoryError::Conflict);
        }
        *slot = record;
        Ok(())
    }
}

impl ModerationStore for InMemoryStore {
    fn commit_decision(
        &self,
        record: &SubmissionRecord,
        waiver: Option<&WaiverUpdate>,
    ) -> Result<(Candidate, WaiverChange), RepositoryError> {
        let mut state = self.lock()?;
        let StoreState {
            candidates,
            submissions,
        } = &mut *state;

        let stored = submissions
            .iter_mut()
            .find(|existing| existing.id == record.id)
            .ok_or(RepositoryError::Conflict)?;
        if stored.status != SubmissionStatus::Pending {
            return Err(RepositoryError::Conflict);
        }

        let candidate = candidates
            .iter_mut()
            .find(|candidate| candidate.id == record.candidate_id)
            .ok_or(RepositoryError::NotFound)?;

        let change = match waiver {
            Some(update) => update.apply(candidate),
            None => WaiverChange::Untouched,
        };
        *stored = record.clone();

        Ok((candidate.clone(), change))
    }
}
