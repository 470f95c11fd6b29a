use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::error;

use super::pattern::ReservationPattern;
use crate::workflows::roster::{CandidateId, NominationState, Pool, PoolSnapshot};

/// One slot of the canonical nomination sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NominationEntry {
    pub position: u32,
    pub candidate_id: CandidateId,
    pub name: String,
    pub pool: Pool,
    pub pool_rank: u32,
    /// Pool the position reserves; differs from `pool` when the draw fell back.
    pub reserved_for: Pool,
    pub nomination_state: NominationState,
}

impl NominationEntry {
    pub fn is_fallback(&self) -> bool {
        self.pool != self.reserved_for
    }
}

/// Ordered nomination sequence with 1-based, gapless positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NominationOrder {
    entries: Vec<NominationEntry>,
}

impl NominationOrder {
    pub fn entries(&self) -> &[NominationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, position: u32) -> Option<&NominationEntry> {
        let index = usize::try_from(position).ok()?.checked_sub(1)?;
        self.entries.get(index)
    }

    pub fn position_of(&self, id: &CandidateId) -> Option<u32> {
        self.entries
            .iter()
            .find(|entry| &entry.candidate_id == id)
            .map(|entry| entry.position)
    }

    /// `(candidate, position)` pairs ready for a bulk position write.
    pub fn positions(&self) -> Vec<(CandidateId, u32)> {
        self.entries
            .iter()
            .map(|entry| (entry.candidate_id.clone(), entry.position))
            .collect()
    }

    /// The next `limit` candidates still awaiting nomination, in order.
    pub fn next_awaiting(&self, limit: usize) -> Vec<&NominationEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.nomination_state == NominationState::Awaiting)
            .take(limit)
            .collect()
    }
}

/// Pure interleaving of the quota pools into a single nomination order.
#[derive(Debug, Clone, Default)]
pub struct OrderEngine {
    pattern: ReservationPattern,
}

impl OrderEngine {
    pub fn new(pattern: ReservationPattern) -> Self {
        Self { pattern }
    }

    pub fn pattern(&self) -> &ReservationPattern {
        &self.pattern
    }

    pub fn compute_order(&self, snapshot: &PoolSnapshot) -> NominationOrder {
        let total = snapshot.total();
        let fallbacks: BTreeMap<Pool, Vec<Pool>> = Pool::ALL
            .iter()
            .map(|pool| (*pool, self.pattern.fallback_order(*pool)))
            .collect();
        let mut cursors: BTreeMap<Pool, usize> =
            Pool::ALL.iter().map(|pool| (*pool, 0)).collect();
        let mut entries = Vec::with_capacity(total);

        for position in (1..).take(total) {
            let reserved_for = self.pattern.preferred_pool(position);
            let order = fallbacks
                .get(&reserved_for)
                .map(Vec::as_slice)
                .unwrap_or(&Pool::ALL);

            let drawn = order.iter().find_map(|pool| {
                let cursor = cursors.get_mut(pool)?;
                let candidate = snapshot.pool(*pool).get(*cursor)?;
                *cursor += 1;
                Some(candidate)
            });

            let Some(candidate) = drawn else {
                // unreachable while `total` equals the summed pool sizes
                debug_assert!(false, "no candidate left for position {position}");
                error!(position, total, "nomination position left unassigned");
                continue;
            };

            entries.push(NominationEntry {
                position,
                candidate_id: candidate.id.clone(),
                name: candidate.name.clone(),
                pool: candidate.pool,
                pool_rank: candidate.pool_rank,
                reserved_for,
                nomination_state: candidate.nomination_state,
            });
        }

        NominationOrder { entries }
    }
}
