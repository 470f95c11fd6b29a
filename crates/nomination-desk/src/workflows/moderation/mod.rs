//! Moderation of candidate submissions (secondary-exam approvals and waiver declarations)
//! and the waiver status each decision derives or retracts.

pub mod derivation;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use derivation::{derive_waiver, WaiverDerivation};
pub use domain::{
    AcceptanceIntent, AppointmentStatus, Decision, ModeratorId, SecondaryApproval, SubmissionId,
    SubmissionKind, SubmissionPayload, SubmissionRecord, SubmissionStatus, WaiverIntent,
    WaiverIntentKind,
};
pub use repository::{
    ModerationStore, Notification, NotificationError, NotificationQueue, SubmissionRepository,
    WaiverChange, WaiverUpdate,
};
pub use router::moderation_router;
pub use service::{DecisionOutcome, ModerationError, ModerationService, NotificationDelivery};
