//! Behavioural properties of the sync engine, driven against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use turbo_cart_sync::prelude::*;

fn kes(cents: i64) -> Money {
    Money::new(cents, Currency::KES)
}

fn catalog() -> Arc<InMemoryStore> {
    Arc::new(
        InMemoryStore::new(Currency::KES)
            .with_product("p0", "Kiondo Basket", kes(125_000))
            .with_product("p1", "Kikoi", kes(80_000))
            .with_product("p2", "Soapstone Bowl", kes(45_050)),
    )
}

fn engine(store: &Arc<InMemoryStore>) -> SyncEngine<Arc<InMemoryStore>> {
    SyncEngine::new("cart-1", store.clone(), SyncConfig::default())
}

fn quantities(snapshot: &CartSnapshot) -> Vec<(String, u32)> {
    snapshot
        .items()
        .iter()
        .map(|line| (line.product_id().to_string(), line.quantity()))
        .collect()
}

fn assert_subtotal_consistent(snapshot: &CartSnapshot) {
    let expected = snapshot
        .items()
        .iter()
        .map(|line| line.unit_price().amount_cents * i64::from(line.quantity()))
        .sum::<i64>();
    assert_eq!(snapshot.subtotal().amount_cents, expected);
    assert_eq!(project(snapshot).subtotal_formatted, kes(expected).display_amount());
}

#[tokio::test(start_paused = true)]
async fn test_mutations_reach_store_in_order_one_at_a_time() {
    let store = catalog();
    store.set_latency(Duration::from_millis(5));
    let engine = engine(&store);

    let tickets: Vec<MutationTicket> = (0..20).map(|i| engine.add(format!("p{}", i % 3))).collect();
    let submitted: Vec<RequestId> = tickets.iter().map(MutationTicket::request_id).collect();

    for result in join_all(tickets).await {
        result.unwrap();
    }

    let received: Vec<RequestId> = store
        .mutation_log()
        .iter()
        .map(|op| op.request_id)
        .collect();
    assert_eq!(received, submitted);
    assert_eq!(store.max_concurrent_mutations(), 1);

    let snapshot = engine.current_snapshot();
    assert_eq!(snapshot.item_count(), 20);
    assert_eq!(
        quantities(&snapshot),
        vec![("p0".to_string(), 7), ("p1".to_string(), 7), ("p2".to_string(), 6)]
    );
    assert_eq!(engine.pending_count(), 0);
    assert_eq!(engine.state(), SyncState::Idle);
}

#[tokio::test]
async fn test_remove_of_absent_product_is_quiet() {
    let store = catalog();
    store.seed_line("p1", 2);
    let engine = engine(&store);
    let before = engine.refresh().await.unwrap();
    let mut events = engine.subscribe();

    let after = engine.remove("p2").await.unwrap();

    assert!(after.same_contents(&before));
    assert!(!events
        .drain()
        .iter()
        .any(|e| matches!(e, CartEvent::MutationFailed { .. })));
}

#[tokio::test]
async fn test_subtotal_matches_lines_at_every_step() {
    let store = catalog();
    let engine = engine(&store);

    let steps = [
        Mutation::add_quantity("p2", 3),
        Mutation::add("p0"),
        Mutation::increase("p2"),
        Mutation::decrease("p0"),
        Mutation::add_quantity("p1", 2),
    ];
    for mutation in steps {
        let ticket = engine.apply(mutation);
        assert_subtotal_consistent(&engine.optimistic_snapshot());
        let confirmed = ticket.await.unwrap();
        assert_subtotal_consistent(&confirmed);
    }

    assert_eq!(engine.current_snapshot().subtotal(), kes(3 * 45_050 + 45_050 + 2 * 80_000));
}

#[tokio::test]
async fn test_add_then_decrement_to_removal_restores_cart() {
    let store = catalog();
    store.seed_line("p0", 1);
    let engine = engine(&store);
    let before = engine.refresh().await.unwrap();

    engine.add("p1").await.unwrap();
    assert_eq!(engine.current_snapshot().item_count(), 2);
    let after = engine.decrease("p1").await.unwrap();

    assert!(after.same_contents(&before));
    assert!(after.version() > before.version());
}

#[tokio::test(start_paused = true)]
async fn test_late_refresh_is_discarded() {
    let store = catalog();
    store.seed_line("p0", 1);
    let engine = engine(&store);
    let mut confirmed = engine.watch_confirmed();

    // R1 answers after R2 and carries older data.
    store.delay_next_fetches([Duration::from_millis(100), Duration::from_millis(10)]);
    let r1 = engine.refresh();
    let r2 = async {
        store.seed_line("p0", 3);
        engine.refresh().await
    };
    let (r1, r2) = futures::join!(r1, r2);

    let r2 = r2.unwrap();
    assert_eq!(quantities(&r2), vec![("p0".to_string(), 3)]);
    assert_eq!(r1.unwrap(), r2);

    let latest = engine.current_snapshot();
    assert_eq!(latest, r2);
    assert_eq!(latest.version(), 1);

    assert!(confirmed.has_changed().unwrap());
    assert_eq!(quantities(&confirmed.borrow_and_update()), vec![("p0".to_string(), 3)]);
}

#[tokio::test(start_paused = true)]
async fn test_reordered_mutation_refreshes_never_overshoot() {
    let store = catalog();
    store.set_latency(Duration::from_millis(5));
    // The refresh after the first add answers after the one after the second.
    store.delay_next_fetches([Duration::from_millis(100), Duration::from_millis(10)]);
    let engine = engine(&store);
    let mut events = engine.subscribe();
    let listing = || ProductListing::new("Kiondo Basket", kes(125_000));

    let first = engine.add_listing("p0", 1, listing());
    let second = engine.add_listing("p0", 1, listing());
    let (first, second) = futures::join!(first, second);
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first, second);
    let latest = engine.current_snapshot();
    assert_eq!(quantities(&latest), vec![("p0".to_string(), 2)]);
    assert_eq!(latest.version(), 1);
    assert_eq!(engine.pending_count(), 0);

    let seen: Vec<(u64, bool)> = events
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            CartEvent::SnapshotChanged { model, confirmed } => Some((model.item_count, confirmed)),
            _ => None,
        })
        .collect();
    assert_eq!(seen, vec![(1, false), (2, false), (2, true)]);
}

#[tokio::test]
async fn test_add_increase_remove_end_to_end() {
    let store = catalog();
    let engine = engine(&store);
    let mut events = engine.subscribe();

    let snapshot = engine.apply(Mutation::add_quantity("p1", 2)).await.unwrap();
    assert_eq!(quantities(&snapshot), vec![("p1".to_string(), 2)]);
    assert_eq!(snapshot.subtotal(), kes(160_000));

    let snapshot = engine.increase("p1").await.unwrap();
    assert_eq!(quantities(&snapshot), vec![("p1".to_string(), 3)]);
    assert_eq!(project(&snapshot).subtotal_display, "Ksh 2400.00");

    let snapshot = engine.remove("p1").await.unwrap();
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.version(), 3);

    match events.drain().last() {
        Some(CartEvent::SnapshotChanged { model, confirmed }) => {
            assert!(*confirmed);
            assert!(model.is_empty);
            assert_eq!(model.subtotal_formatted, "0.00");
        }
        other => panic!("expected final confirmed snapshot, got {other:?}"),
    }
}

#[tokio::test]
async fn test_failed_add_rolls_back_and_reports_once() {
    let store = catalog();
    store.seed_line("p0", 1);
    let engine = engine(&store);
    let before = engine.refresh().await.unwrap();
    let mut events = engine.subscribe();

    store.fail_next_mutation(TransportError::Http {
        status: 500,
        message: "Internal Server Error".into(),
    });
    let ticket = engine.add_listing("p1", 1, ProductListing::new("Kikoi", kes(80_000)));
    assert_eq!(engine.optimistic_snapshot().item_count(), 2);

    let err = ticket.await.unwrap_err();
    assert!(matches!(err, SyncError::MutationFailed { .. }));
    assert_eq!(err.transport_error().map(|e| e.is_not_found()), Some(false));

    assert_eq!(engine.current_snapshot(), before);
    assert!(engine.optimistic_snapshot().same_contents(&before));

    let failures: Vec<CartEvent> = events
        .drain()
        .into_iter()
        .filter(|e| matches!(e, CartEvent::MutationFailed { .. }))
        .collect();
    assert_eq!(failures.len(), 1);

    let snapshot = engine.add("p1").await.unwrap();
    assert_eq!(snapshot.item_count(), 2);
}

#[tokio::test]
async fn test_observer_sees_optimistic_then_confirmed() {
    #[derive(Default)]
    struct Recorder {
        seen: Vec<(u64, bool)>,
    }

    impl CartObserver for Recorder {
        fn on_snapshot_changed(&mut self, model: &RenderModel, confirmed: bool) {
            self.seen.push((model.item_count, confirmed));
        }
    }

    let store = catalog();
    let engine = engine(&store);
    let events = engine.subscribe();

    engine
        .add_listing("p2", 2, ProductListing::new("Soapstone Bowl", kes(45_050)))
        .await
        .unwrap();
    engine.shutdown().await;

    let mut recorder = Recorder::default();
    events.forward_to(&mut recorder).await;
    assert_eq!(recorder.seen, vec![(2, false), (2, true)]);
}
