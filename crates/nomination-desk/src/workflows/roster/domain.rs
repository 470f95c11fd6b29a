use std::fmt;

use serde::{Deserialize, Serialize};

use super::normalizer::{canonical_token, LegacyValueError};

/// Identifier wrapper for candidates registered in the roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(pub String);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Admission quota a candidate competes under. Fixed at registration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum Pool {
    Open,
    Disability,
    RaceReserved,
    Indigenous,
}

impl Pool {
    /// Canonical pool order, also used to complete partial fallback lists.
    pub const ALL: [Pool; 4] = [
        Pool::Open,
        Pool::RaceReserved,
        Pool::Disability,
        Pool::Indigenous,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Pool::Open => "OPEN",
            Pool::Disability => "DISABILITY",
            Pool::RaceReserved => "RACE_RESERVED",
            Pool::Indigenous => "INDIGENOUS",
        }
    }

    pub fn from_legacy(raw: &str) -> Result<Self, LegacyValueError> {
        match canonical_token(raw).as_str() {
            "OPEN" | "AMPLA" | "AMPLA_CONCORRENCIA" | "AC" => Ok(Pool::Open),
            "DISABILITY" | "PCD" | "PNE" | "DEFICIENCIA" => Ok(Pool::Disability),
            "RACE_RESERVED" | "NEGROS" | "PPP" | "PRETOS_E_PARDOS" | "COTA_RACIAL" => {
                Ok(Pool::RaceReserved)
            }
            "INDIGENOUS" | "INDIGENA" | "INDIGENAS" => Ok(Pool::Indigenous),
            _ => Err(LegacyValueError::new("pool", raw)),
        }
    }
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<String> for Pool {
    type Error = LegacyValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_legacy(&value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NominationState {
    #[default]
    Awaiting,
    Nominated,
}

impl NominationState {
    pub const fn label(self) -> &'static str {
        match self {
            NominationState::Awaiting => "AWAITING",
            NominationState::Nominated => "NOMINATED",
        }
    }
}

/// Candidate's declared intent to give up their own seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum WaiverStatus {
    #[default]
    None,
    Interested,
    Confirmed,
}

impl WaiverStatus {
    pub const fn label(self) -> &'static str {
        match self {
            WaiverStatus::None => "NONE",
            WaiverStatus::Interested => "INTERESTED",
            WaiverStatus::Confirmed => "CONFIRMED",
        }
    }

    /// Maps stored spellings (`null`, `TALVEZ`, `SIM` and their aliases) onto the closed set.
    pub fn from_legacy(raw: &str) -> Result<Self, LegacyValueError> {
        match canonical_token(raw).as_str() {
            "" | "NONE" | "NULL" | "NAO" => Ok(WaiverStatus::None),
            "INTERESTED" | "TALVEZ" | "PROVAVEL" | "INTERESSE" => Ok(WaiverStatus::Interested),
            "CONFIRMED" | "SIM" | "CONFIRMADO" | "ENVIADO" => Ok(WaiverStatus::Confirmed),
            _ => Err(LegacyValueError::new("waiver_status", raw)),
        }
    }

    pub fn from_legacy_opt(raw: Option<&str>) -> Result<Self, LegacyValueError> {
        raw.map_or(Ok(WaiverStatus::None), Self::from_legacy)
    }
}

impl fmt::Display for WaiverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<String> for WaiverStatus {
    type Error = LegacyValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_legacy(&value)
    }
}

/// A person who passed the examination and sits in exactly one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub pool: Pool,
    pub pool_rank: u32,
    /// Derived by the order engine; persisted for display only.
    #[serde(default)]
    pub nomination_position: Option<u32>,
    #[serde(default)]
    pub nomination_state: NominationState,
    #[serde(default)]
    pub waiver_status: WaiverStatus,
    #[serde(default)]
    pub waiver_note: Option<String>,
}

impl Candidate {
    pub fn new(id: impl Into<String>, name: impl Into<String>, pool: Pool, pool_rank: u32) -> Self {
        Self {
            id: CandidateId(id.into()),
            name: name.into(),
            pool,
            pool_rank,
            nomination_position: None,
            nomination_state: NominationState::Awaiting,
            waiver_status: WaiverStatus::None,
            waiver_note: None,
        }
    }
}
