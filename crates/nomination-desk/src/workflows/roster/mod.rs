//! Candidate roster: domain types, the legacy-value normalization boundary, CSV import and
//! the validated pool snapshot consumed by the order engine.

pub mod domain;
pub mod normalizer;
mod parser;
pub mod repository;
pub mod snapshot;

pub use domain::{Candidate, CandidateId, NominationState, Pool, WaiverStatus};
pub use normalizer::{canonical_token, LegacyValueError};
pub use parser::RowError;
pub use repository::{CandidateRepository, RepositoryError};
pub use snapshot::{PoolSnapshot, RosterError};

use std::io::Read;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum RosterImportError {
    #[error("failed to read roster: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid roster CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid roster value at {0}")]
    Row(#[from] RowError),
    #[error("roster rejected: {0}")]
    Roster(#[from] RosterError),
}

/// Loads committee roster exports into candidates, normalizing legacy spellings on the way in.
pub struct RosterImporter;

impl RosterImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Candidate>, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse and validate a roster; the result is safe to feed to [`PoolSnapshot::validated`].
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Candidate>, RosterImportError> {
        let candidates = parser::parse_candidates(reader)?;
        PoolSnapshot::validated(candidates.iter().cloned())?;
        Ok(candidates)
    }

    pub fn snapshot_from_reader<R: Read>(reader: R) -> Result<PoolSnapshot, RosterImportError> {
        let candidates = parser::parse_candidates(reader)?;
        Ok(PoolSnapshot::validated(candidates)?)
    }
}
