//! Integration tests for the cart manager.
//!
//! These drive `CartManager` through its public API with stub collaborators
//! and check the three copies of state (memory, stock, storage) agree after
//! every operation.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use rocketcart::{CartChange, CartError, CartManager, CartStorage, FileStore, NotifyLevel};
use rocketcart_core::{ItemId, Quantity};
use rocketcart_integration_tests::{
    CatalogMode, RecordingNotifier, StockMode, StubCatalog, StubInventory, TestCart,
};

fn id(n: i32) -> ItemId {
    ItemId::new(n)
}

// =============================================================================
// Walkthrough
// =============================================================================

#[tokio::test]
async fn test_full_walkthrough() {
    let t = TestCart::with_titles(&[(1, 3)], &[(1, "A")]);

    // add → one line, quantity 1
    assert_eq!(t.manager.add(id(1)).await.unwrap(), CartChange::Added { id: id(1) });
    let cart = t.manager.cart();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].attributes.title, "A");
    assert_eq!(cart[0].quantity, Quantity::ONE);
    assert_eq!(t.notifier.last().0, NotifyLevel::Success);
    t.assert_persisted();

    // set to 3 → accepted
    t.manager.set_quantity(id(1), 3).await.unwrap();
    assert_eq!(t.manager.line(id(1)).unwrap().quantity.get(), 3);
    t.assert_persisted();

    // set to 4 → exceeds stock, unchanged
    let err = t.manager.set_quantity(id(1), 4).await.unwrap_err();
    assert!(matches!(
        err,
        CartError::OutOfStock {
            requested: 4,
            available: 3,
            ..
        }
    ));
    assert_eq!(t.manager.line(id(1)).unwrap().quantity.get(), 3);
    t.assert_persisted();

    // remove → empty
    assert_eq!(t.manager.remove(id(1)).await.unwrap(), CartChange::Removed { id: id(1) });
    assert!(t.manager.cart().is_empty());
    t.assert_persisted();

    // remove again → already absent
    let err = t.manager.remove(id(1)).await.unwrap_err();
    assert!(matches!(err, CartError::AlreadyAbsent(i) if i == id(1)));
    assert_eq!(t.notifier.last().0, NotifyLevel::Error);
}

// =============================================================================
// Properties
// =============================================================================

#[tokio::test]
async fn test_remove_never_added_fails_for_any_item() {
    let t = TestCart::new(&[(1, 3)]);
    t.manager.add(id(1)).await.unwrap();
    let before = t.manager.cart();
    let writes = t.store.writes();

    for n in 2..20 {
        let err = t.manager.remove(id(n)).await.unwrap_err();
        assert!(matches!(err, CartError::AlreadyAbsent(_)));
    }

    assert_eq!(t.manager.cart(), before);
    assert_eq!(t.store.writes(), writes);
}

#[tokio::test]
async fn test_add_with_no_stock_never_writes() {
    let t = TestCart::new(&[(1, 0), (2, 0), (3, 0)]);

    for n in 1..=3 {
        let err = t.manager.add(id(n)).await.unwrap_err();
        assert!(matches!(err, CartError::OutOfStock { available: 0, .. }));
    }

    assert!(t.manager.cart().is_empty());
    assert_eq!(t.store.writes(), 0);
    assert_eq!(t.store.stored_cart(), None);
}

#[tokio::test]
async fn test_storage_matches_memory_after_every_success() {
    let t = TestCart::new(&[(1, 5), (2, 5), (3, 5)]);

    t.manager.add(id(1)).await.unwrap();
    t.assert_persisted();
    t.manager.add(id(2)).await.unwrap();
    t.assert_persisted();
    t.manager.add(id(2)).await.unwrap();
    t.assert_persisted();
    t.manager.set_quantity(id(1), 4).await.unwrap();
    t.assert_persisted();
    t.manager.add(id(3)).await.unwrap();
    t.assert_persisted();
    t.manager.remove(id(2)).await.unwrap();
    t.assert_persisted();
    t.manager.clear().await.unwrap();
    t.assert_persisted();
}

#[tokio::test]
async fn test_add_twice_yields_one_line() {
    let t = TestCart::new(&[(1, 2)]);
    t.manager.add(id(1)).await.unwrap();
    t.manager.add(id(1)).await.unwrap();

    let cart = t.manager.cart();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].quantity.get(), 2);
}

#[tokio::test]
async fn test_set_quantity_zero_equals_remove() {
    let via_remove = TestCart::new(&[(1, 3), (2, 3)]);
    let via_zero = TestCart::new(&[(1, 3), (2, 3)]);

    for t in [&via_remove, &via_zero] {
        t.manager.add(id(1)).await.unwrap();
        t.manager.add(id(2)).await.unwrap();
    }

    via_remove.manager.remove(id(1)).await.unwrap();
    via_zero.manager.set_quantity(id(1), 0).await.unwrap();

    assert_eq!(via_remove.manager.cart(), via_zero.manager.cart());
    assert_eq!(via_remove.store.stored_cart(), via_zero.store.stored_cart());
}

#[tokio::test]
async fn test_set_quantity_zero_on_missing_line() {
    let t = TestCart::new(&[(1, 3)]);
    let err = t.manager.set_quantity(id(1), 0).await.unwrap_err();
    assert!(matches!(err, CartError::AlreadyAbsent(_)));
}

#[tokio::test]
async fn test_set_quantity_never_creates_line() {
    let t = TestCart::new(&[(1, 3)]);
    let err = t.manager.set_quantity(id(1), 1).await.unwrap_err();
    assert!(matches!(err, CartError::NotInCart(_)));
    assert!(t.manager.cart().is_empty());
}

// =============================================================================
// Failure kinds
// =============================================================================

#[tokio::test]
async fn test_failure_kinds_have_distinct_messages() {
    let t = TestCart::new(&[(1, 0), (2, 3)]);

    t.manager.add(id(1)).await.unwrap_err();
    let out_of_stock = t.notifier.last().1;

    t.manager.add(id(99)).await.unwrap_err();
    let unknown = t.notifier.last().1;

    t.inventory.set_mode(StockMode::Fail);
    let err = t.manager.add(id(2)).await.unwrap_err();
    assert!(matches!(err, CartError::Transient { .. }));
    let transient = t.notifier.last().1;

    assert_ne!(out_of_stock, unknown);
    assert_ne!(unknown, transient);
    assert_ne!(out_of_stock, transient);
    assert!(t.manager.cart().is_empty());
}

#[tokio::test]
async fn test_catalog_failures_after_stock_check() {
    let t = TestCart::new(&[(1, 3)]);

    t.catalog.set_mode(CatalogMode::NotFound);
    let err = t.manager.add(id(1)).await.unwrap_err();
    assert!(matches!(err, CartError::NotFound(item) if item == id(1)));
    let unknown = t.notifier.last();

    t.catalog.set_mode(CatalogMode::Fail);
    let err = t.manager.add(id(1)).await.unwrap_err();
    assert!(matches!(err, CartError::Transient { id: item, .. } if item == id(1)));
    let transient = t.notifier.last();

    assert_eq!(unknown.0, NotifyLevel::Error);
    assert_eq!(transient.0, NotifyLevel::Error);
    assert_ne!(unknown.1, transient.1);
    assert_eq!(t.inventory.calls(), 2);
    assert_eq!(t.catalog.calls(), 2);
    assert!(t.manager.cart().is_empty());
    assert_eq!(t.store.writes(), 0);
    assert_eq!(t.store.stored_cart(), None);

    // Once the catalog answers, the same add goes through.
    t.catalog.set_mode(CatalogMode::Immediate);
    t.manager.add(id(1)).await.unwrap();
    assert_eq!(t.manager.item_count(), 1);
    t.assert_persisted();
}

#[tokio::test]
async fn test_persist_failure_is_critical_and_rolled_back() {
    let t = TestCart::new(&[(1, 3), (2, 3)]);
    t.manager.add(id(1)).await.unwrap();
    let before = t.manager.cart();

    t.store.fail_writes(true);
    let err = t.manager.add(id(2)).await.unwrap_err();

    assert!(matches!(err, CartError::Persist(_)));
    assert_eq!(t.notifier.last().0, NotifyLevel::Critical);
    assert_eq!(t.manager.cart(), before);
    t.assert_persisted();

    // The same change succeeds once storage recovers.
    t.store.fail_writes(false);
    t.manager.add(id(2)).await.unwrap();
    assert_eq!(t.manager.cart().len(), 2);
    t.assert_persisted();
}

#[tokio::test]
async fn test_hung_lookup_times_out_as_transient() {
    let inventory = StubInventory::with(&[(1, 3)]);
    inventory.set_mode(StockMode::Hang);
    let notifier = Arc::new(RecordingNotifier::default());
    let manager = CartManager::hydrate(
        Arc::clone(&inventory),
        StubCatalog::default(),
        CartStorage::new(rocketcart::MemoryStore::new()),
        notifier.clone(),
    )
    .with_lookup_timeout(Duration::from_millis(50));

    let err = manager.add(id(1)).await.unwrap_err();
    assert!(matches!(err, CartError::Transient { .. }));
    assert!(manager.cart().is_empty());

    // The lock is released: a later operation proceeds normally.
    inventory.set_mode(StockMode::Immediate);
    manager.add(id(1)).await.unwrap();
    assert_eq!(manager.item_count(), 1);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn test_concurrent_adds_do_not_duplicate() {
    let t = TestCart::new(&[(1, 5)]);
    t.inventory.set_mode(StockMode::Delayed(Duration::from_millis(20)));

    let (a, b) = tokio::join!(t.manager.add(id(1)), t.manager.add(id(1)));
    a.unwrap();
    b.unwrap();

    let cart = t.manager.cart();
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].quantity.get(), 2);
    t.assert_persisted();
}

#[tokio::test]
async fn test_concurrent_adds_respect_stock() {
    let t = TestCart::new(&[(1, 1)]);
    t.inventory.set_mode(StockMode::Delayed(Duration::from_millis(20)));

    let (a, b) = tokio::join!(t.manager.add(id(1)), t.manager.add(id(1)));
    assert_eq!(usize::from(a.is_ok()) + usize::from(b.is_ok()), 1);
    assert_eq!(t.manager.item_count(), 1);
}

#[tokio::test]
async fn test_concurrent_operations_from_tasks() {
    let t = TestCart::new(&[(1, 10), (2, 10)]);
    t.inventory.set_mode(StockMode::Delayed(Duration::from_millis(5)));
    let manager = Arc::new(t.manager);

    let mut handles = Vec::new();
    for n in [1, 2, 1, 2, 1] {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move { manager.add(id(n)).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(manager.line(id(1)).unwrap().quantity.get(), 3);
    assert_eq!(manager.line(id(2)).unwrap().quantity.get(), 2);
    assert_eq!(
        t.store.stored_cart().unwrap(),
        rocketcart_core::Cart::from_lines(manager.cart()).unwrap()
    );
}

// =============================================================================
// Hydration
// =============================================================================

#[tokio::test]
async fn test_corrupt_snapshot_hydrates_empty() {
    let t = TestCart::from_stored(&[(1, 3)], "this is not json {");
    assert!(t.manager.cart().is_empty());

    // The corrupt entry is replaced on the first successful write.
    t.manager.add(id(1)).await.unwrap();
    t.assert_persisted();
}

#[tokio::test]
async fn test_snapshot_with_zero_quantity_is_corrupt() {
    let t = TestCart::from_stored(&[], r#"[{"id":1,"title":"A","price":"1","amount":0}]"#);
    assert!(t.manager.cart().is_empty());
}

#[tokio::test]
async fn test_legacy_snapshot_hydrates() {
    let raw = r#"[{"id":2,"title":"Tênis","price":139.9,"image":"https://example.com/2.jpg","amount":2}]"#;
    let t = TestCart::from_stored(&[(2, 5)], raw);

    let line = t.manager.line(id(2)).unwrap();
    assert_eq!(line.quantity.get(), 2);
    assert_eq!(line.attributes.title, "Tênis");
    assert_eq!(t.manager.item_count(), 2);

    t.manager.add(id(2)).await.unwrap();
    assert_eq!(t.manager.line(id(2)).unwrap().quantity.get(), 3);
}

#[tokio::test]
async fn test_file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let inventory = StubInventory::with(&[(1, 3), (2, 3)]);

    {
        let manager = CartManager::hydrate(
            Arc::clone(&inventory),
            StubCatalog::default(),
            CartStorage::new(FileStore::open(dir.path()).unwrap()),
            Arc::new(RecordingNotifier::default()),
        );
        manager.add(id(1)).await.unwrap();
        manager.add(id(2)).await.unwrap();
        manager.set_quantity(id(2), 3).await.unwrap();
    }

    let restored = CartManager::hydrate(
        Arc::clone(&inventory),
        StubCatalog::default(),
        CartStorage::new(FileStore::open(dir.path()).unwrap()),
        Arc::new(RecordingNotifier::default()),
    );
    assert_eq!(restored.cart().len(), 2);
    assert_eq!(restored.item_count(), 4);
}

// =============================================================================
// Observers
// =============================================================================

#[tokio::test]
async fn test_observers_only_see_committed_state() {
    let t = TestCart::new(&[(1, 1)]);
    let mut rx = t.manager.subscribe();

    t.manager.add(id(1)).await.unwrap();
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().len(), 1);

    t.manager.add(id(1)).await.unwrap_err();
    assert!(!rx.has_changed().unwrap());

    t.manager.clear().await.unwrap();
    assert!(rx.borrow_and_update().is_empty());
    assert_eq!(
        t.notifier.all().iter().filter(|(level, _)| *level == NotifyLevel::Success).count(),
        2
    );
}
