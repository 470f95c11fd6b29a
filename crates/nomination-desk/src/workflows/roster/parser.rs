use serde::{Deserialize, Deserializer};
use std::io::Read;

use super::domain::{Candidate, CandidateId, NominationState, Pool, WaiverStatus};
use super::normalizer::{clean_note, LegacyValueError};
use super::RosterImportError;

#[derive(Debug, thiserror::Error)]
pub enum RowError {
    #[error("row {row}: {source}")]
    Value {
        row: usize,
        #[source]
        source: LegacyValueError,
    },
    #[error("row {row}: missing {column}")]
    Missing { row: usize, column: &'static str },
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(alias = "ID", alias = "inscricao")]
    id: String,
    #[serde(alias = "Name", alias = "nome")]
    name: String,
    #[serde(alias = "Pool", alias = "lista")]
    pool: String,
    #[serde(alias = "Rank", alias = "classificacao")]
    rank: u32,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    waiver_status: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    waiver_note: Option<String>,
}

impl RosterRow {
    fn into_candidate(self, row: usize) -> Result<Candidate, RowError> {
        let id = self.id.trim().to_string();
        if id.is_empty() {
            return Err(RowError::Missing { row, column: "id" });
        }

        let pool = Pool::from_legacy(&self.pool).map_err(|source| RowError::Value { row, source })?;
        let waiver_status = WaiverStatus::from_legacy_opt(self.waiver_status.as_deref())
            .map_err(|source| RowError::Value { row, source })?;

        Ok(Candidate {
            id: CandidateId(id),
            name: self.name.trim().to_string(),
            pool,
            pool_rank: self.rank,
            nomination_position: None,
            nomination_state: NominationState::Awaiting,
            waiver_status,
            waiver_note: clean_note(self.waiver_note),
        })
    }
}

pub(crate) fn parse_candidates<R: Read>(reader: R) -> Result<Vec<Candidate>, RosterImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut candidates = Vec::new();

    for (index, record) in csv_reader.deserialize::<RosterRow>().enumerate() {
        let row = record?;
        // header is row 1
        candidates.push(row.into_candidate(index + 2)?);
    }

    Ok(candidates)
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
