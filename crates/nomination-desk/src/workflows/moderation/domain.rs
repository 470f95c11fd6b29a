use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::roster::normalizer::{canonical_token, LegacyValueError};
use crate::workflows::roster::CandidateId;

/// Identifier wrapper for candidate submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubmissionId(pub String);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Committee member deciding a submission, already authorized by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModeratorId(pub String);

impl fmt::Display for ModeratorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! legacy_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => $label:literal [$($alias:literal),*]),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            pub fn from_legacy(raw: &str) -> Result<Self, LegacyValueError> {
                let token = canonical_token(raw);
                $(
                    if token == $label $(|| token == $alias)* {
                        return Ok($name::$variant);
                    }
                )+
                Err(LegacyValueError::new($field, raw))
            }
        }

        impl TryFrom<String> for $name {
            type Error = LegacyValueError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::from_legacy(&value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

legacy_enum! {
    /// Lifecycle of a submission. Approved and rejected are terminal.
    SubmissionStatus, "status" {
        Pending => "PENDING" ["PENDENTE"],
        Approved => "APPROVED" ["APROVADO"],
        Rejected => "REJECTED" ["REJEITADO", "RECUSADO"],
    }
}

legacy_enum! {
    /// Whether the candidate intends to take the other appointment.
    AcceptanceIntent, "intends_to_accept" {
        Yes => "YES" ["SIM"],
        No => "NO" ["NAO"],
        Maybe => "MAYBE" ["TALVEZ", "PROVAVEL"],
    }
}

legacy_enum! {
    /// Whether the candidate already took office in the other examination.
    AppointmentStatus, "already_appointed" {
        Yes => "YES" ["SIM", "POSSE", "EMPOSSADO"],
        No => "NO" ["NAO"],
        InProgress => "IN_PROGRESS" ["EM_ANDAMENTO", "ANDAMENTO", "EM_PROCESSO"],
    }
}

legacy_enum! {
    /// Waiver declaration: interest only, or the formal request already sent.
    WaiverIntentKind, "waiver_kind" {
        Interested => "INTERESTED" ["INTERESSE", "TALVEZ"],
        Sent => "SENT" ["ENVIADO", "SIM"],
    }
}

/// Approval in another public examination, reported by the candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryApproval {
    /// Hiring body (órgão) of the other examination.
    pub agency: String,
    pub role: String,
    /// Pool in the other examination; informational only.
    #[serde(default)]
    pub pool: Option<String>,
    #[serde(default)]
    pub rank: Option<u32>,
    pub intends_to_accept: AcceptanceIntent,
    pub already_appointed: AppointmentStatus,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaiverIntent {
    pub kind: WaiverIntentKind,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    SecondaryApproval,
    WaiverIntent,
}

impl SubmissionKind {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionKind::SecondaryApproval => "secondary_approval",
            SubmissionKind::WaiverIntent => "waiver_intent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum SubmissionPayload {
    SecondaryApproval(SecondaryApproval),
    WaiverIntent(WaiverIntent),
}

impl SubmissionPayload {
    pub fn kind(&self) -> SubmissionKind {
        match self {
            SubmissionPayload::SecondaryApproval(_) => SubmissionKind::SecondaryApproval,
            SubmissionPayload::WaiverIntent(_) => SubmissionKind::WaiverIntent,
        }
    }
}

/// Candidate-authored record awaiting or carrying a moderator decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: SubmissionId,
    pub candidate_id: CandidateId,
    pub status: SubmissionStatus,
    pub payload: SubmissionPayload,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub decided_by: Option<ModeratorId>,
    #[serde(default)]
    pub decided_at: Option<DateTime<Utc>>,
}

impl SubmissionRecord {
    pub fn pending(
        id: SubmissionId,
        candidate_id: CandidateId,
        payload: SubmissionPayload,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            candidate_id,
            status: SubmissionStatus::Pending,
            payload,
            submitted_at: now,
            updated_at: now,
            decided_by: None,
            decided_at: None,
        }
    }

    pub fn kind(&self) -> SubmissionKind {
        self.payload.kind()
    }

    pub fn is_pending(&self) -> bool {
        self.status == SubmissionStatus::Pending
    }
}

/// Moderator verdict on a pending submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub const fn resulting_status(self) -> SubmissionStatus {
        match self {
            Decision::Approve => SubmissionStatus::Approved,
            Decision::Reject => SubmissionStatus::Rejected,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Approve => f.write_str("approve"),
            Decision::Reject => f.write_str("reject"),
        }
    }
}
