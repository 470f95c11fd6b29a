use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use axum::http::StatusCode;
use tower::ServiceExt;

use super::*;
use crate::workflows::memory::InMemoryStore;
use crate::workflows::roster::{
    Candidate, CandidateId, CandidateRepository, NominationState, Pool, PoolSnapshot,
    RepositoryError,
};

fn pool_members(pool: Pool, prefix: &str, count: u32) -> Vec<Candidate> {
    (1..=count)
        .map(|rank| {
            Candidate::new(
                format!("{prefix}-{rank:02}"),
                format!("{} candidate {rank}", pool.label()),
                pool,
                rank,
            )
        })
        .collect()
}

fn snapshot_of(sizes: &[(Pool, u32)]) -> PoolSnapshot {
    let candidates = sizes.iter().flat_map(|(pool, count)| {
        let prefix = pool.label().to_ascii_lowercase();
        pool_members(*pool, &prefix, *count)
    });
    PoolSnapshot::validated(candidates).expect("snapshot is valid")
}

/// Pools sized to fill the federal pattern exactly for 50 positions.
fn federal_fifty() -> PoolSnapshot {
    snapshot_of(&[
        (Pool::Open, 33),
        (Pool::RaceReserved, 10),
        (Pool::Disability, 5),
        (Pool::Indigenous, 2),
    ])
}

fn ids(order: &NominationOrder) -> Vec<&str> {
    order
        .entries()
        .iter()
        .map(|entry| entry.candidate_id.0.as_str())
        .collect()
}

#[test]
fn every_candidate_gets_exactly_one_gapless_position() {
    let snapshot = snapshot_of(&[
        (Pool::Open, 17),
        (Pool::RaceReserved, 2),
        (Pool::Disability, 9),
        (Pool::Indigenous, 4),
    ]);
    let order = OrderEngine::default().compute_order(&snapshot);

    assert_eq!(order.len(), snapshot.total());
    let positions: Vec<u32> = order.entries().iter().map(|entry| entry.position).collect();
    let expected: Vec<u32> = (1..=32).collect();
    assert_eq!(positions, expected);

    let unique: BTreeSet<&str> = ids(&order).into_iter().collect();
    assert_eq!(unique.len(), snapshot.total());
}

#[test]
fn fifty_positions_follow_the_federal_pattern() {
    let order = OrderEngine::default().compute_order(&federal_fifty());
    assert_eq!(order.len(), 50);

    let mut expected: BTreeMap<u32, Pool> = (1..=50).map(|position| (position, Pool::Open)).collect();
    for position in [3, 8, 13, 18, 23, 28, 33, 38, 43, 48] {
        expected.insert(position, Pool::RaceReserved);
    }
    for position in [5, 11, 21, 31, 41] {
        expected.insert(position, Pool::Disability);
    }
    for position in [10, 45] {
        expected.insert(position, Pool::Indigenous);
    }

    for entry in order.entries() {
        assert_eq!(
            entry.pool, expected[&entry.position],
            "position {} went to {}",
            entry.position, entry.pool
        );
        assert!(!entry.is_fallback(), "position {} fell back", entry.position);
    }
}

#[test]
fn pool_members_keep_rank_order_across_the_sequence() {
    let order = OrderEngine::default().compute_order(&federal_fifty());

    for pool in Pool::ALL {
        let ranks: Vec<u32> = order
            .entries()
            .iter()
            .filter(|entry| entry.pool == pool)
            .map(|entry| entry.pool_rank)
            .collect();
        let mut sorted = ranks.clone();
        sorted.sort_unstable();
        assert_eq!(ranks, sorted, "{pool} drawn out of rank order");
    }
}

#[test]
fn empty_disability_pool_falls_back_to_open_first() {
    let snapshot = snapshot_of(&[
        (Pool::Open, 10),
        (Pool::RaceReserved, 3),
        (Pool::Indigenous, 1),
    ]);
    let order = OrderEngine::default().compute_order(&snapshot);

    let fifth = order.get(5).expect("position 5 assigned");
    assert_eq!(fifth.reserved_for, Pool::Disability);
    assert_eq!(fifth.pool, Pool::Open);
    assert!(fifth.is_fallback());
    // positions 1, 2 and 4 took open ranks 1..=3
    assert_eq!(fifth.pool_rank, 4);
}

#[test]
fn disability_position_draws_race_reserved_once_open_is_exhausted() {
    // positions 1, 2 and 4 use up the three open candidates
    let snapshot = snapshot_of(&[
        (Pool::Open, 3),
        (Pool::RaceReserved, 3),
        (Pool::Indigenous, 1),
    ]);
    let order = OrderEngine::default().compute_order(&snapshot);

    let fifth = order.get(5).expect("position 5 assigned");
    assert_eq!(fifth.reserved_for, Pool::Disability);
    assert_eq!(fifth.pool, Pool::RaceReserved);
    assert_eq!(fifth.pool_rank, 2);
}

#[test]
fn disability_position_draws_indigenous_when_open_and_race_are_exhausted() {
    let snapshot = snapshot_of(&[
        (Pool::Open, 3),
        (Pool::RaceReserved, 1),
        (Pool::Indigenous, 2),
    ]);
    let order = OrderEngine::default().compute_order(&snapshot);

    let fifth = order.get(5).expect("position 5 assigned");
    assert_eq!(fifth.reserved_for, Pool::Disability);
    assert_eq!(fifth.pool, Pool::Indigenous);
    assert_eq!(fifth.pool_rank, 1);
    assert_eq!(order.len(), 6);
}

#[test]
fn fallback_skips_exhausted_pools_in_configured_order() {
    let snapshot = snapshot_of(&[(Pool::RaceReserved, 4), (Pool::Indigenous, 2)]);
    let order = OrderEngine::default().compute_order(&snapshot);

    // open position 1 with no open candidates draws race-reserved first
    let first = order.get(1).expect("position 1 assigned");
    assert_eq!(first.reserved_for, Pool::Open);
    assert_eq!(first.pool, Pool::RaceReserved);

    let pools: Vec<Pool> = order.entries().iter().map(|entry| entry.pool).collect();
    assert_eq!(
        pools,
        vec![
            Pool::RaceReserved,
            Pool::RaceReserved,
            Pool::RaceReserved,
            Pool::RaceReserved,
            Pool::Indigenous,
            Pool::Indigenous,
        ]
    );
}

#[test]
fn identical_snapshots_serialize_identically() {
    let engine = OrderEngine::default();
    let snapshot = federal_fifty();

    let first = serde_json::to_vec(&engine.compute_order(&snapshot)).expect("serializes");
    let second = serde_json::to_vec(&engine.compute_order(&snapshot)).expect("serializes");
    assert_eq!(first, second);
}

#[test]
fn small_roster_interleaves_through_fallbacks() {
    let snapshot = PoolSnapshot::validated(vec![
        Candidate::new("C2", "Second", Pool::Open, 2),
        Candidate::new("C3", "Third", Pool::Disability, 1),
        Candidate::new("C1", "First", Pool::Open, 1),
    ])
    .expect("snapshot is valid");

    let order = OrderEngine::default().compute_order(&snapshot);
    assert_eq!(ids(&order), vec!["C1", "C2", "C3"]);

    let third = order.get(3).expect("position 3 assigned");
    assert_eq!(third.reserved_for, Pool::RaceReserved);
    assert_eq!(third.pool, Pool::Disability);
}

#[test]
fn custom_pattern_reserves_early_positions() {
    let pattern = ReservationPattern::from_reader(
        r#"{
            "rules": [{ "pool": "RACE_RESERVED", "anchors": [2, 3] }],
            "fallbacks": { "RACE_RESERVED": ["OPEN", "DISABILITY", "INDIGENOUS"] }
        }"#
        .as_bytes(),
    )
    .expect("pattern parses");
    let snapshot = PoolSnapshot::validated(vec![
        Candidate::new("C1", "First", Pool::Open, 1),
        Candidate::new("C2", "Second", Pool::Open, 2),
        Candidate::new("C3", "Third", Pool::Disability, 1),
    ])
    .expect("snapshot is valid");

    let order = OrderEngine::new(pattern).compute_order(&snapshot);
    assert_eq!(ids(&order), vec!["C1", "C2", "C3"]);
    assert_eq!(
        order.get(2).map(|entry| entry.reserved_for),
        Some(Pool::RaceReserved)
    );
}

#[test]
fn empty_snapshot_yields_empty_order() {
    let order = OrderEngine::default().compute_order(&PoolSnapshot::default());
    assert!(order.is_empty());
    assert_eq!(order.get(1), None);
    assert_eq!(order.get(0), None);
}

fn seeded_service() -> (NominationService<InMemoryStore>, Arc<InMemoryStore>) {
    let store = Arc::new(
        InMemoryStore::with_candidates(vec![
            Candidate::new("open-1", "Helena Dias", Pool::Open, 1),
            Candidate::new("open-2", "Rui Costa", Pool::Open, 2),
            Candidate::new("race-1", "Iara Souza", Pool::RaceReserved, 1),
            Candidate::new("open-3", "Lia Matos", Pool::Open, 3),
        ])
        .expect("store seeds"),
    );
    let service = NominationService::new(store.clone(), OrderEngine::default());
    (service, store)
}

#[test]
fn recompute_writes_positions_back() {
    let (service, store) = seeded_service();
    let order = service.recompute().expect("recompute succeeds");

    assert_eq!(order.position_of(&CandidateId("race-1".to_string())), Some(3));
    let stored = store
        .fetch(&CandidateId("open-3".to_string()))
        .expect("fetch")
        .expect("present");
    assert_eq!(stored.nomination_position, Some(4));
}

#[test]
fn nominate_next_skips_already_nominated_candidates() {
    let (service, store) = seeded_service();

    let first = service.nominate_next(2).expect("nominate succeeds");
    let first_ids: Vec<_> = first.iter().map(|entry| entry.candidate_id.0.as_str()).collect();
    assert_eq!(first_ids, vec!["open-1", "open-2"]);

    let second = service.nominate_next(5).expect("nominate succeeds");
    let second_ids: Vec<_> = second.iter().map(|entry| entry.candidate_id.0.as_str()).collect();
    assert_eq!(second_ids, vec!["race-1", "open-3"]);

    let everyone = store.candidates().expect("candidates");
    assert!(everyone
        .iter()
        .all(|candidate| candidate.nomination_state == NominationState::Nominated));

    // nomination never moves anyone
    let order = service.current_order().expect("order");
    assert_eq!(ids(&order), vec!["open-1", "open-2", "race-1", "open-3"]);
}

/// Store whose nomination-state write is offline.
struct StateWriteOutage(InMemoryStore);

impl CandidateRepository for StateWriteOutage {
    fn list_by_pool(&self, pool: Pool) -> Result<Vec<Candidate>, RepositoryError> {
        self.0.list_by_pool(pool)
    }

    fn fetch(&self, id: &CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        self.0.fetch(id)
    }

    fn update_nomination_positions(
        &self,
        positions: &[(CandidateId, u32)],
    ) -> Result<(), RepositoryError> {
        self.0.update_nomination_positions(positions)
    }

    fn update_nomination_states(
        &self,
        _ids: &[CandidateId],
        _state: NominationState,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("write timeout".to_string()))
    }
}

#[test]
fn failed_batch_nomination_leaves_everyone_awaiting() {
    let (_, store) = seeded_service();
    let service = NominationService::new(
        Arc::new(StateWriteOutage((*store).clone())),
        OrderEngine::default(),
    );

    assert!(matches!(
        service.nominate_next(3),
        Err(NominationError::Repository(RepositoryError::Unavailable(_)))
    ));
    let everyone = store.candidates().expect("candidates");
    assert!(everyone
        .iter()
        .all(|candidate| candidate.nomination_state == NominationState::Awaiting));
}

#[test]
fn duplicate_ranks_in_store_surface_as_roster_errors() {
    let store = Arc::new(
        InMemoryStore::with_candidates(vec![
            Candidate::new("a", "A", Pool::Open, 1),
            Candidate::new("b", "B", Pool::Open, 1),
        ])
        .expect("store seeds"),
    );
    let service = NominationService::new(store, OrderEngine::default());

    assert!(matches!(
        service.current_order(),
        Err(NominationError::Roster(_))
    ));
}

#[tokio::test]
async fn order_route_serves_current_order() {
    let (service, _) = seeded_service();
    let response = nomination_router(Arc::new(service))
        .oneshot(
            axum::http::Request::get("/api/v1/nomination/order")
                .body(axum::body::Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let payload: serde_json::Value = serde_json::from_slice(&body).expect("json payload");
    assert_eq!(payload["entries"][2]["candidate_id"], "race-1");
    assert_eq!(payload["entries"][2]["reserved_for"], "RACE_RESERVED");
}

#[tokio::test]
async fn nominate_route_returns_nominated_entries() {
    let (service, _) = seeded_service();
    let response = nomination_router(Arc::new(service))
        .oneshot(
            axum::http::Request::post("/api/v1/nomination/nominate")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(r#"{"count":1}"#))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let payload: serde_json::Value = serde_json::from_slice(&body).expect("json payload");
    assert_eq!(payload["nominated"][0]["candidate_id"], "open-1");
    assert_eq!(payload["nominated"][0]["nomination_state"], "NOMINATED");
}
