use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{
    AcceptanceIntent, AppointmentStatus, SecondaryApproval, SubmissionPayload, WaiverIntent,
    WaiverIntentKind,
};
use super::repository::WaiverUpdate;
use crate::workflows::roster::WaiverStatus;

/// Waiver status and note a submission establishes once approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaiverDerivation {
    pub status: WaiverStatus,
    pub note: String,
}

/// Waiver state implied by a submission, or `None` when it carries no waiver signal.
pub fn derive_waiver(payload: &SubmissionPayload, decided_on: NaiveDate) -> Option<WaiverDerivation> {
    match payload {
        SubmissionPayload::SecondaryApproval(approval) => {
            derive_from_secondary(approval, decided_on)
        }
        SubmissionPayload::WaiverIntent(intent) => Some(derive_from_intent(intent, decided_on)),
    }
}

fn derive_from_secondary(
    approval: &SecondaryApproval,
    decided_on: NaiveDate,
) -> Option<WaiverDerivation> {
    let date = decided_on.format("%Y-%m-%d");

    if approval.already_appointed == AppointmentStatus::Yes {
        return Some(WaiverDerivation {
            status: WaiverStatus::Confirmed,
            note: format!(
                "Appointed as {} at {}; confirmed {}",
                approval.role, approval.agency, date
            ),
        });
    }

    if approval.intends_to_accept == AcceptanceIntent::Yes {
        return Some(WaiverDerivation {
            status: WaiverStatus::Interested,
            note: format!(
                "Intends to accept {} at {}; recorded {}",
                approval.role, approval.agency, date
            ),
        });
    }

    None
}

fn derive_from_intent(intent: &WaiverIntent, decided_on: NaiveDate) -> WaiverDerivation {
    let status = match intent.kind {
        WaiverIntentKind::Sent => WaiverStatus::Confirmed,
        WaiverIntentKind::Interested => WaiverStatus::Interested,
    };

    let note = match intent.note.as_deref().map(str::trim) {
        Some(note) if !note.is_empty() => note.to_string(),
        _ => match intent.kind {
            WaiverIntentKind::Sent => {
                format!("Waiver request sent; confirmed {}", decided_on.format("%Y-%m-%d"))
            }
            WaiverIntentKind::Interested => format!(
                "Interested in waiving seat; recorded {}",
                decided_on.format("%Y-%m-%d")
            ),
        },
    };

    WaiverDerivation { status, note }
}

/// Approval overwrites unconditionally: it is the newest authoritative fact.
pub(crate) fn approval_update(
    payload: &SubmissionPayload,
    decided_on: NaiveDate,
) -> Option<WaiverUpdate> {
    derive_waiver(payload, decided_on).map(|derived| WaiverUpdate::Overwrite {
        status: derived.status,
        note: Some(derived.note),
    })
}

/// Rejecting a waiver intent retracts only the status that intent would have set.
///
/// Secondary approvals are advisory, so their rejection never touches the candidate.
pub(crate) fn rejection_update(
    payload: &SubmissionPayload,
    decided_on: NaiveDate,
) -> Option<WaiverUpdate> {
    match payload {
        SubmissionPayload::WaiverIntent(intent) => Some(WaiverUpdate::ResetIfCurrent {
            expected: derive_from_intent(intent, decided_on).status,
        }),
        SubmissionPayload::SecondaryApproval(_) => None,
    }
}
