//! Unit tests for `BroadcastHub`.
//!
//! These tests exercise the hub directly, without performing any HTTP
//! upgrades. They verify register/unregister semantics, broadcast delivery
//! and graceful shutdown behaviour.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::ws::Message;
use chrono::Utc;
use smartsense_api::ws::BroadcastHub;
use smartsense_core::reading::{Envelope, Reading, SafetyTier};

fn envelope(gas_level: u32) -> Envelope {
    Envelope::new(Reading::new(24.5, 60.0, gas_level), SafetyTier::Safe, Utc::now())
}

fn text(msg: Message) -> serde_json::Value {
    match msg {
        Message::Text(t) => serde_json::from_str(t.as_str()).unwrap(),
        other => panic!("Expected Text message, got: {other:?}"),
    }
}

fn gas_of(msg: Message) -> u64 {
    text(msg)["gas_level"].as_u64().unwrap()
}

/// Drain everything currently queued for a receiver.
fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<Message>) -> Vec<u64> {
    let mut gas = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        gas.push(gas_of(msg));
    }
    gas
}

// ---------------------------------------------------------------------------
// Test: new hub starts with zero observers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_hub_has_zero_observers() {
    let hub = BroadcastHub::new();

    assert_eq!(hub.observer_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: register() issues distinct handles
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_issues_distinct_handles() {
    let hub = BroadcastHub::new();

    let (id1, _rx1) = hub.register().await;
    let (id2, _rx2) = hub.register().await;

    assert_ne!(id1, id2);
    assert_eq!(hub.observer_count().await, 2);
}

// ---------------------------------------------------------------------------
// Test: unregister() twice is a no-op the second time
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unregister_twice_is_noop() {
    let hub = BroadcastHub::new();

    let (id1, _rx1) = hub.register().await;
    let (_id2, _rx2) = hub.register().await;

    hub.unregister(&id1).await;
    assert_eq!(hub.observer_count().await, 1);

    hub.unregister(&id1).await;
    assert_eq!(hub.observer_count().await, 1);
}

// ---------------------------------------------------------------------------
// Test: broadcast() delivers exactly once to every observer
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_delivers_once_to_each_observer() {
    let hub = BroadcastHub::new();

    let (_id1, mut rx1) = hub.register().await;
    let (_id2, mut rx2) = hub.register().await;
    let (_id3, mut rx3) = hub.register().await;

    let delivered = hub.broadcast(&envelope(150)).await;
    assert_eq!(delivered, 3);

    for rx in [&mut rx1, &mut rx2, &mut rx3] {
        let json = text(rx.recv().await.expect("observer should receive broadcast"));
        assert_eq!(json["gas_level"], 150);
        assert_eq!(json["status"], "SAFE");
        assert!(rx.try_recv().is_err(), "Expected exactly one delivery");
    }
}

// ---------------------------------------------------------------------------
// Test: broadcast() with no observers is a no-op
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_without_observers_returns_zero() {
    let hub = BroadcastHub::new();

    assert_eq!(hub.broadcast(&envelope(100)).await, 0);
}

// ---------------------------------------------------------------------------
// Test: a failed delivery does not block others or drop the observer
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_delivery_skips_observer_without_unregistering() {
    let hub = BroadcastHub::new();

    let (_dead, dead_rx) = hub.register().await;
    let (_live, mut live_rx) = hub.register().await;
    drop(dead_rx);

    let delivered = hub.broadcast(&envelope(200)).await;

    assert_eq!(delivered, 1);
    assert_eq!(text(live_rx.recv().await.unwrap())["gas_level"], 200);
    assert_eq!(
        hub.observer_count().await,
        2,
        "Removal is left to the connection task"
    );
}

// ---------------------------------------------------------------------------
// Test: broadcasts arrive in submission order
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcasts_arrive_in_order() {
    let hub = BroadcastHub::new();
    let (_id, mut rx) = hub.register().await;

    for gas in [100, 200, 300] {
        hub.broadcast(&envelope(gas)).await;
    }

    for gas in [100, 200, 300] {
        assert_eq!(text(rx.recv().await.unwrap())["gas_level"], gas);
    }
}

// ---------------------------------------------------------------------------
// Test: an unregistered observer receives nothing further
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unregistered_observer_receives_nothing() {
    let hub = BroadcastHub::new();
    let (id, mut rx) = hub.register().await;

    hub.unregister(&id).await;
    hub.broadcast(&envelope(100)).await;

    // The hub dropped its sender, so the channel is closed and empty.
    assert!(rx.recv().await.is_none());
}

// ---------------------------------------------------------------------------
// Test: ping_all() sends a Ping frame
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ping_all_sends_ping() {
    let hub = BroadcastHub::new();
    let (_id, mut rx) = hub.register().await;

    hub.ping_all().await;

    let msg = rx.recv().await.expect("observer should receive ping");
    assert!(matches!(msg, Message::Ping(_)), "Expected Ping, got: {msg:?}");
}

// ---------------------------------------------------------------------------
// Test: shutdown_all() sends Close and clears all observers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let hub = BroadcastHub::new();

    let (_id1, mut rx1) = hub.register().await;
    let (_id2, mut rx2) = hub.register().await;

    hub.shutdown_all().await;

    assert_eq!(hub.observer_count().await, 0);

    for rx in [&mut rx1, &mut rx2] {
        let msg = rx.recv().await.expect("observer should receive Close");
        assert!(
            matches!(msg, Message::Close(None)),
            "Expected Close(None), got: {msg:?}"
        );
        assert!(rx.recv().await.is_none(), "Channel should be closed after shutdown");
    }
}

// ---------------------------------------------------------------------------
// Test: register/unregister churn during concurrent broadcasts
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn churn_during_concurrent_broadcasts_delivers_at_most_once() {
    const PER_PRODUCER: u32 = 200;
    const SECOND_PRODUCER_BASE: u32 = 10_000;

    let hub = Arc::new(BroadcastHub::new());

    // Registered before any broadcast begins: must see everything once.
    let mut stable = Vec::new();
    for _ in 0..3 {
        stable.push(hub.register().await.1);
    }

    let stop = Arc::new(AtomicBool::new(false));
    let mut churners = Vec::new();
    for _ in 0..4 {
        let hub = Arc::clone(&hub);
        let stop = Arc::clone(&stop);
        churners.push(tokio::spawn(async move {
            while !stop.load(Ordering::SeqCst) {
                let (id, mut rx) = hub.register().await;
                tokio::task::yield_now().await;
                hub.unregister(&id).await;

                let received = drain(&mut rx);
                let distinct: HashSet<u64> = received.iter().copied().collect();
                assert_eq!(
                    distinct.len(),
                    received.len(),
                    "an observer received the same envelope twice: {received:?}"
                );
            }
        }));
    }

    let producers: Vec<_> = [0, SECOND_PRODUCER_BASE]
        .into_iter()
        .map(|base| {
            let hub = Arc::clone(&hub);
            tokio::spawn(async move {
                for gas in base..base + PER_PRODUCER {
                    hub.broadcast(&envelope(gas)).await;
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    for producer in producers {
        producer.await.unwrap();
    }
    stop.store(true, Ordering::SeqCst);
    for churner in churners {
        churner.await.unwrap();
    }

    assert_eq!(hub.observer_count().await, stable.len());

    for rx in &mut stable {
        let received = drain(rx);
        assert_eq!(received.len(), 2 * PER_PRODUCER as usize);

        let distinct: HashSet<u64> = received.iter().copied().collect();
        assert_eq!(distinct.len(), received.len(), "duplicate delivery");

        // Each producer's envelopes arrive in the order it sent them.
        for base in [0, SECOND_PRODUCER_BASE] {
            let from_producer: Vec<u64> = received
                .iter()
                .copied()
                .filter(|g| (u64::from(base)..u64::from(base + PER_PRODUCER)).contains(g))
                .collect();
            let expected: Vec<u64> = (base..base + PER_PRODUCER).map(u64::from).collect();
            assert_eq!(from_producer, expected);
        }
    }
}

// ---------------------------------------------------------------------------
// Test: an observer joining mid-stream sees a gap-free suffix
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn late_observer_receives_contiguous_suffix() {
    const TOTAL: u64 = 500;

    let hub = Arc::new(BroadcastHub::new());

    let producer = {
        let hub = Arc::clone(&hub);
        tokio::spawn(async move {
            for gas in 0..TOTAL {
                hub.broadcast(&envelope(gas as u32)).await;
                tokio::task::yield_now().await;
            }
        })
    };

    let late = {
        let hub = Arc::clone(&hub);
        tokio::spawn(async move {
            for _ in 0..20 {
                tokio::task::yield_now().await;
            }
            hub.register().await.1
        })
    };

    let mut rx = late.await.unwrap();
    producer.await.unwrap();

    let received = drain(&mut rx);
    if let Some(&first) = received.first() {
        let expected: Vec<u64> = (first..TOTAL).collect();
        assert_eq!(received, expected, "no replay, no gaps, no duplicates");
    }
}
