use std::sync::Arc;

use tracing::info;

use super::engine::{NominationEntry, NominationOrder, OrderEngine};
use crate::workflows::roster::{
    CandidateId, CandidateRepository, NominationState, Pool, PoolSnapshot, RepositoryError,
    RosterError,
};

/// Error raised while loading pools or persisting derived order.
#[derive(Debug, thiserror::Error)]
pub enum NominationError {
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Service re-deriving the nomination order from whatever the candidate store holds now.
pub struct NominationService<R> {
    repository: Arc<R>,
    engine: OrderEngine,
}

impl<R> NominationService<R>
where
    R: CandidateRepository + 'static,
{
    pub fn new(repository: Arc<R>, engine: OrderEngine) -> Self {
        Self { repository, engine }
    }

    pub fn engine(&self) -> &OrderEngine {
        &self.engine
    }

    /// Fresh read of every pool, validated at this boundary before the engine sees it.
    pub fn snapshot(&self) -> Result<PoolSnapshot, NominationError> {
        let mut candidates = Vec::new();
        for pool in Pool::ALL {
            candidates.extend(self.repository.list_by_pool(pool)?);
        }
        Ok(PoolSnapshot::validated(candidates)?)
    }

    pub fn current_order(&self) -> Result<NominationOrder, NominationError> {
        let snapshot = self.snapshot()?;
        Ok(self.engine.compute_order(&snapshot))
    }

    /// Compute the order and write every candidate's position back to the store.
    pub fn recompute(&self) -> Result<NominationOrder, NominationError> {
        let order = self.current_order()?;
        self.repository
            .update_nomination_positions(&order.positions())?;
        info!(candidates = order.len(), "nomination order recomputed");
        Ok(order)
    }

    /// Nominate the next `count` awaiting candidates in canonical order.
    ///
    /// The batch is written in one store call, so a failure leaves every candidate awaiting.
    pub fn nominate_next(&self, count: usize) -> Result<Vec<NominationEntry>, NominationError> {
        let order = self.recompute()?;
        let nominated: Vec<NominationEntry> = order
            .next_awaiting(count)
            .into_iter()
            .map(|entry| NominationEntry {
                nomination_state: NominationState::Nominated,
                ..entry.clone()
            })
            .collect();

        let ids: Vec<CandidateId> = nominated
            .iter()
            .map(|entry| entry.candidate_id.clone())
            .collect();
        self.repository
            .update_nomination_states(&ids, NominationState::Nominated)?;

        info!(requested = count, nominated = nominated.len(), "candidates nominated");
        Ok(nominated)
    }
}
