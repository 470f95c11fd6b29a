use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::workflows::roster::Pool;

#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("failed to read reservation pattern: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid reservation pattern JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("rule for {pool} repeats every 0 positions")]
    ZeroCycle { pool: Pool },
    #[error("fallback list for {preferred} names {pool} more than once")]
    RepeatedFallback { preferred: Pool, pool: Pool },
}

/// Periodic part of a rule: matches `after + every`, `after + 2 * every`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionCycle {
    pub after: u32,
    pub every: u32,
}

/// Positions reserved for one pool: explicit anchors plus an optional cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRule {
    pub pool: Pool,
    #[serde(default)]
    pub anchors: Vec<u32>,
    #[serde(default)]
    pub cycle: Option<PositionCycle>,
}

impl ReservationRule {
    pub fn matches(&self, position: u32) -> bool {
        if self.anchors.contains(&position) {
            return true;
        }

        match self.cycle {
            Some(PositionCycle { after, every }) if every > 0 && position > after => {
                (position - after) % every == 0
            }
            _ => false,
        }
    }
}

/// Positional quota law applied by the order engine.
///
/// Rules are evaluated in order and the first match wins, so a position claimed by two
/// quotas goes to the earlier rule. Positions matching no rule belong to `default_pool`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationPattern {
    pub rules: Vec<ReservationRule>,
    #[serde(default = "default_pool")]
    pub default_pool: Pool,
    #[serde(default)]
    pub fallbacks: BTreeMap<Pool, Vec<Pool>>,
}

fn default_pool() -> Pool {
    Pool::Open
}

impl Default for ReservationPattern {
    fn default() -> Self {
        Self::federal_quota()
    }
}

impl ReservationPattern {
    /// Indigenous at 10 then every 35th, disability at 5, 11 then every 10th, race-reserved
    /// at 3, 8 then every 5th; open competition everywhere else.
    pub fn federal_quota() -> Self {
        let rules = vec![
            ReservationRule {
                pool: Pool::Indigenous,
                anchors: vec![10],
                cycle: Some(PositionCycle {
                    after: 10,
                    every: 35,
                }),
            },
            ReservationRule {
                pool: Pool::Disability,
                anchors: vec![5, 11],
                cycle: Some(PositionCycle {
                    after: 11,
                    every: 10,
                }),
            },
            ReservationRule {
                pool: Pool::RaceReserved,
                anchors: vec![3, 8],
                cycle: Some(PositionCycle { after: 8, every: 5 }),
            },
        ];

        let fallbacks = BTreeMap::from([
            (
                Pool::Indigenous,
                vec![Pool::Indigenous, Pool::RaceReserved, Pool::Disability, Pool::Open],
            ),
            (
                Pool::RaceReserved,
                vec![Pool::RaceReserved, Pool::Open, Pool::Disability, Pool::Indigenous],
            ),
            (
                Pool::Disability,
                vec![Pool::Disability, Pool::Open, Pool::RaceReserved, Pool::Indigenous],
            ),
            (
                Pool::Open,
                vec![Pool::Open, Pool::RaceReserved, Pool::Disability, Pool::Indigenous],
            ),
        ]);

        Self {
            rules,
            default_pool: Pool::Open,
            fallbacks,
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PatternError> {
        let pattern: Self = serde_json::from_reader(reader)?;
        pattern.validate()?;
        Ok(pattern)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PatternError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn validate(&self) -> Result<(), PatternError> {
        for rule in &self.rules {
            if matches!(rule.cycle, Some(PositionCycle { every: 0, .. })) {
                return Err(PatternError::ZeroCycle { pool: rule.pool });
            }
        }

        for (preferred, order) in &self.fallbacks {
            for (index, pool) in order.iter().enumerate() {
                if order[..index].contains(pool) {
                    return Err(PatternError::RepeatedFallback {
                        preferred: *preferred,
                        pool: *pool,
                    });
                }
            }
        }

        Ok(())
    }

    pub fn preferred_pool(&self, position: u32) -> Pool {
        self.rules
            .iter()
            .find(|rule| rule.matches(position))
            .map(|rule| rule.pool)
            .unwrap_or(self.default_pool)
    }

    /// Draw order when `preferred` is the pool a position reserves.
    ///
    /// Always starts with `preferred` and always lists every pool exactly once; pools
    /// missing from the configured list are appended in canonical order.
    pub fn fallback_order(&self, preferred: Pool) -> Vec<Pool> {
        let mut order = vec![preferred];
        let configured = self.fallbacks.get(&preferred).into_iter().flatten();

        for pool in configured.chain(Pool::ALL.iter()) {
            if !order.contains(pool) {
                order.push(*pool);
            }
        }

        order
    }
}
