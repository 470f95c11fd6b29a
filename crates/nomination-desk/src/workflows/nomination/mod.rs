//! Quota-interleaved nomination order: the reservation pattern, the pure order engine and
//! the service that re-derives and persists positions.

pub mod engine;
pub mod pattern;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use engine::{NominationEntry, NominationOrder, OrderEngine};
pub use pattern::{PatternError, PositionCycle, ReservationPattern, ReservationRule};
pub use router::nomination_router;
pub use service::{NominationError, NominationService};
