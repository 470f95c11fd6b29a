use super::domain::{Candidate, CandidateId, NominationState, Pool};

/// Storage abstraction over candidate rows so the engines can run without a database.
pub trait CandidateRepository: Send + Sync {
    /// Candidates of one pool by ascending rank, insertion order breaking ties.
    fn list_by_pool(&self, pool: Pool) -> Result<Vec<Candidate>, RepositoryError>;
    fn fetch(&self, id: &CandidateId) -> Result<Option<Candidate>, RepositoryError>;
    /// Bulk write of derived positions after the order engine runs.
    fn update_nomination_positions(
        &self,
        positions: &[(CandidateId, u32)],
    ) -> Result<(), RepositoryError>;
    /// Set `state` on every listed candidate, all or nothing. `NotFound` when any id is
    /// unknown, in which case no row changes.
    fn update_nomination_states(
        &self,
        ids: &[CandidateId],
        state: NominationState,
    ) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists or changed concurrently")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
