use std::collections::{BTreeMap, HashMap, HashSet};

use super::domain::{Candidate, CandidateId, Pool};

/// Precondition violations detected before a roster reaches the order engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    #[error("candidate {candidate} has pool rank 0; ranks start at 1")]
    ZeroRank { candidate: CandidateId },
    #[error("{pool} rank {rank} is held by both {first} and {second}")]
    DuplicateRank {
        pool: Pool,
        rank: u32,
        first: CandidateId,
        second: CandidateId,
    },
    #[error("candidate {0} appears more than once")]
    DuplicateCandidate(CandidateId),
}

/// Read-only view of every pool, each ordered by ascending pool rank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolSnapshot {
    pools: BTreeMap<Pool, Vec<Candidate>>,
}

impl PoolSnapshot {
    /// Group candidates by pool without validating ranks. Equal ranks keep insertion order.
    pub fn from_candidates<I>(candidates: I) -> Self
    where
        I: IntoIterator<Item = Candidate>,
    {
        let mut pools: BTreeMap<Pool, Vec<Candidate>> =
            Pool::ALL.iter().map(|pool| (*pool, Vec::new())).collect();

        for candidate in candidates {
            pools.entry(candidate.pool).or_default().push(candidate);
        }

        for members in pools.values_mut() {
            members.sort_by_key(|candidate| candidate.pool_rank);
        }

        Self { pools }
    }

    /// Build a snapshot, rejecting zero ranks, duplicate ranks within a pool and repeated ids.
    pub fn validated<I>(candidates: I) -> Result<Self, RosterError>
    where
        I: IntoIterator<Item = Candidate>,
    {
        let candidates: Vec<Candidate> = candidates.into_iter().collect();
        let mut seen_ids = HashSet::new();
        let mut seen_ranks: HashMap<(Pool, u32), &CandidateId> = HashMap::new();

        for candidate in &candidates {
            if !seen_ids.insert(&candidate.id) {
                return Err(RosterError::DuplicateCandidate(candidate.id.clone()));
            }
            if candidate.pool_rank == 0 {
                return Err(RosterError::ZeroRank {
                    candidate: candidate.id.clone(),
                });
            }
            if let Some(first) = seen_ranks.insert((candidate.pool, candidate.pool_rank), &candidate.id)
            {
                return Err(RosterError::DuplicateRank {
                    pool: candidate.pool,
                    rank: candidate.pool_rank,
                    first: first.clone(),
                    second: candidate.id.clone(),
                });
            }
        }

        Ok(Self::from_candidates(candidates))
    }

    pub fn pool(&self, pool: Pool) -> &[Candidate] {
        self.pools.get(&pool).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total(&self) -> usize {
        self.pools.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> {
        self.pools.values().flatten()
    }
}
