//! End-to-end dispatcher scenarios.

mod common;

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use topicbus::{BusConfig, BusError, EventBus, TaskPriority};

use common::{init_test_logging, wait_until};

#[test]
fn sum_is_delivered_within_a_second() {
    init_test_logging();
    let bus = EventBus::new();
    bus.init(BusConfig::dynamic(2, 4).task_max(1024)).unwrap();
    bus.register_event("Add").unwrap();

    let recorded = Arc::new(AtomicI64::new(0));
    let sink = Arc::clone(&recorded);
    bus.subscribe("Add", move |(a, b): (i64, i64)| {
        sink.store(a + b, Ordering::SeqCst);
    })
    .unwrap();

    bus.publish("Add", (77i64, 88i64)).unwrap();

    assert!(wait_until(Duration::from_secs(1), || {
        recorded.load(Ordering::SeqCst) == 165
    }));
    bus.shutdown();
}

#[test]
fn high_priority_tasks_run_before_low() {
    init_test_logging();
    // A single worker makes execution order equal queue order.
    let bus = EventBus::new();
    bus.init(BusConfig::fixed(1).priority().task_max(64)).unwrap();
    bus.register_event("E").unwrap();

    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    bus.subscribe("E", move |value: i32| {
        sink.lock().unwrap().push(value);
    })
    .unwrap();

    // Hold the worker so every following publish queues up behind the gate.
    let gate = Arc::new(Barrier::new(2));
    bus.register_event("gate").unwrap();
    let held = Arc::clone(&gate);
    bus.subscribe("gate", move |(): ()| {
        held.wait();
    })
    .unwrap();
    bus.publish_with_priority(TaskPriority::High, "gate", ())
        .unwrap();

    // Six LOW then six HIGH, with distinguishable values.
    for value in 0..6 {
        bus.publish_with_priority(TaskPriority::Low, "E", value)
            .unwrap();
    }
    for value in 100..106 {
        bus.publish_with_priority(TaskPriority::High, "E", value)
            .unwrap();
    }

    gate.wait();
    assert!(wait_until(Duration::from_secs(2), || {
        log.lock().unwrap().len() == 12
    }));

    let drained = log.lock().unwrap().clone();
    // The HIGH-tagged values form a contiguous prefix, in insertion order.
    assert_eq!(&drained[..6], &[100, 101, 102, 103, 104, 105]);
    assert_eq!(&drained[6..], &[0, 1, 2, 3, 4, 5]);
    bus.shutdown();
}

#[test]
fn priority_delivery_completes_on_an_elastic_pool() {
    init_test_logging();
    let bus = EventBus::new();
    bus.init(BusConfig::dynamic(2, 4).priority().task_max(1024))
        .unwrap();
    bus.register_event("E").unwrap();

    let delivered = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&delivered);
    bus.subscribe("E", move |value: u64| {
        // A bounded, value-dependent delay keeps workers busy unevenly.
        thread::sleep(Duration::from_millis(value % 7));
        sink.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();

    for value in 0..6u64 {
        bus.publish_with_priority(TaskPriority::Low, "E", value)
            .unwrap();
    }
    for value in 6..12u64 {
        bus.publish_with_priority(TaskPriority::High, "E", value)
            .unwrap();
    }

    assert!(wait_until(Duration::from_secs(3), || {
        delivered.load(Ordering::SeqCst) == 12
    }));
    bus.shutdown();
}

#[test]
fn subscribe_safe_auto_registers() {
    init_test_logging();
    let bus = EventBus::new();
    bus.init(BusConfig::fixed(1)).unwrap();

    let hits = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&hits);
    bus.subscribe_safe("new", move |_: &'static str| {
        sink.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();

    assert!(bus.is_event_registered("new"));
    bus.publish("new", "hello").unwrap();
    assert!(wait_until(Duration::from_secs(1), || {
        hits.load(Ordering::SeqCst) == 1
    }));
    bus.shutdown();
}

#[test]
fn unsubscribe_stops_delivery_to_that_handler_only() {
    init_test_logging();
    let bus = EventBus::new();
    bus.init(BusConfig::fixed(1)).unwrap();
    bus.register_event("U").unwrap();

    let first_hits = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&first_hits);
    let _first = bus
        .subscribe("U", move |_: String| {
            sink.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    let second_hits = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&second_hits);
    let second = bus
        .subscribe("U", move |_: String| {
            sink.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    assert!(bus.unsubscribe("U", second).unwrap());
    bus.publish("U", String::from("msg")).unwrap();

    assert!(wait_until(Duration::from_secs(1), || {
        first_hits.load(Ordering::SeqCst) == 1
    }));
    assert_eq!(second_hits.load(Ordering::SeqCst), 0);

    // An id is found exactly once.
    assert!(!bus.unsubscribe("U", second).unwrap());
    bus.shutdown();
}

#[test]
fn overflowing_publish_is_rejected_and_queue_unchanged() {
    init_test_logging();
    let bus = EventBus::new();
    bus.init(BusConfig::fixed(1).task_max(4)).unwrap();
    bus.register_event("slow").unwrap();

    let delivered = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&delivered);
    bus.subscribe("slow", move |_: u8| {
        sink.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();

    // Hold the single worker so queued publishes cannot drain.
    let gate = Arc::new(Barrier::new(2));
    bus.register_event("gate").unwrap();
    let held = Arc::clone(&gate);
    bus.subscribe("gate", move |(): ()| {
        held.wait();
    })
    .unwrap();
    bus.publish("gate", ()).unwrap();
    assert!(wait_until(Duration::from_secs(1), || bus.queued_tasks() == 0));

    // Four fill the queue; the fifth overflows.
    for value in 0..4u8 {
        bus.publish("slow", value).unwrap();
    }
    assert!(matches!(bus.publish("slow", 4u8), Err(BusError::QueueFull)));
    assert_eq!(bus.queued_tasks(), 4);

    // The accepted four are eventually delivered.
    gate.wait();
    assert!(wait_until(Duration::from_secs(2), || {
        delivered.load(Ordering::SeqCst) == 4
    }));
    bus.shutdown();
}

#[test]
fn invalid_configs_and_uninitialized_calls_are_rejected() {
    init_test_logging();
    let bus = EventBus::new();

    assert!(matches!(
        bus.init(BusConfig::dynamic(10, 5)),
        Err(BusError::Configuration { .. })
    ));
    assert!(matches!(
        bus.init(BusConfig::fixed(0)),
        Err(BusError::Configuration { .. })
    ));
    assert!(matches!(
        bus.init(BusConfig::fixed(1).task_max(0)),
        Err(BusError::Configuration { .. })
    ));

    assert!(matches!(
        bus.register_event("x"),
        Err(BusError::NotInitialized)
    ));
    assert!(matches!(
        bus.publish("x", 1),
        Err(BusError::NotInitialized)
    ));
}

#[test]
fn fifo_publish_enqueues_in_subscription_order() {
    init_test_logging();
    let bus = EventBus::new();
    bus.init(BusConfig::fixed(1)).unwrap();
    bus.register_event("ordered").unwrap();

    let log = Arc::new(Mutex::new(Vec::new()));
    for tag in ["h1", "h2", "h3"] {
        let sink = Arc::clone(&log);
        bus.subscribe("ordered", move |_: u8| {
            sink.lock().unwrap().push(tag);
        })
        .unwrap();
    }

    bus.publish("ordered", 0u8).unwrap();
    assert!(wait_until(Duration::from_secs(1), || {
        log.lock().unwrap().len() == 3
    }));
    assert_eq!(*log.lock().unwrap(), vec!["h1", "h2", "h3"]);
    bus.shutdown();
}

#[test]
fn register_is_idempotent_across_publishes() {
    init_test_logging();
    let bus = EventBus::new();
    bus.init(BusConfig::fixed(1)).unwrap();

    bus.register_event("tick").unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&hits);
    bus.subscribe("tick", move |(): ()| {
        sink.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();
    bus.register_event("tick").unwrap();

    assert_eq!(bus.subscriber_count("tick"), 1);
    bus.publish("tick", ()).unwrap();
    assert!(wait_until(Duration::from_secs(1), || {
        hits.load(Ordering::SeqCst) == 1
    }));
    bus.shutdown();
}

#[test]
fn zero_argument_handler_matches_any_payload() {
    init_test_logging();
    let bus = EventBus::new();
    bus.init(BusConfig::fixed(1)).unwrap();
    bus.register_event("mixed").unwrap();

    let fallback_hits = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&fallback_hits);
    bus.subscribe("mixed", move |(): ()| {
        sink.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();

    bus.publish("mixed", (1u8, 2u8)).unwrap();
    bus.publish("mixed", String::from("text")).unwrap();
    bus.publish("mixed", ()).unwrap();

    assert!(wait_until(Duration::from_secs(1), || {
        fallback_hits.load(Ordering::SeqCst) == 3
    }));
    bus.shutdown();
}
