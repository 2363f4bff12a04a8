//! End-to-end close-protocol scenarios, driven turn by turn on the manual
//! scheduler so task interleavings are explicit.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rill_streaming::{Chunk, DeferredBody, ManualScheduler, Schedule, StreamError};

struct Fixture {
    body: DeferredBody,
    scheduler: ManualScheduler,
    received: Arc<Mutex<Vec<String>>>,
    finalized: Arc<AtomicUsize>,
}

impl Fixture {
    fn new() -> Self {
        let scheduler = ManualScheduler::new();
        let body = DeferredBody::new(Arc::new(scheduler.clone()));
        let finalized = Arc::new(AtomicUsize::new(0));
        let f = finalized.clone();
        body.on_finalize(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        Self {
            body,
            scheduler,
            received: Arc::new(Mutex::new(Vec::new())),
            finalized,
        }
    }

    fn register_consumer(&self) {
        let sink = self.received.clone();
        let finalized = self.finalized.clone();
        self.body
            .on_chunk(move |chunk: Chunk| {
                // Finalize must never precede a delivered chunk.
                assert_eq!(finalized.load(Ordering::SeqCst), 0);
                sink.lock().unwrap().push(chunk.as_text().unwrap().to_string());
            })
            .unwrap();
    }

    fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    fn finalize_count(&self) -> usize {
        self.finalized.load(Ordering::SeqCst)
    }
}

// Scenario A: chunks buffered before any consumer exists, graceful close,
// then a late consumer drains everything before finalize.
#[test]
fn late_consumer_receives_buffered_chunks_then_finalize() {
    let fx = Fixture::new();

    fx.body.chunk("a").unwrap();
    fx.body.chunk("b").unwrap();
    fx.body.close(true);
    fx.scheduler.run_all();

    // Nothing delivered, nothing finalized: the queue waits for a consumer.
    assert_eq!(fx.received(), Vec::<String>::new());
    assert_eq!(fx.finalize_count(), 0);

    fx.register_consumer();
    fx.scheduler.run_all();

    assert_eq!(fx.received(), vec!["a", "b"]);
    assert_eq!(fx.finalize_count(), 1);
}

// Scenario B: a hard close immediately after a write drops the chunk even
// though its delivery pass was already scheduled.
#[test]
fn hard_close_drops_chunk_scheduled_for_delivery() {
    let fx = Fixture::new();
    fx.register_consumer();

    fx.body.chunk("x").unwrap();
    fx.body.close_now();
    fx.scheduler.run_all();

    assert_eq!(fx.received(), Vec::<String>::new());
    assert_eq!(fx.finalize_count(), 1);
}

// Scenario C: the before-close hook emits one last chunk, delivered after
// everything already queued and before finalize.
#[test]
fn before_close_chunk_is_delivered_last() {
    let fx = Fixture::new();
    fx.register_consumer();

    let producer = fx.body.clone();
    fx.body.before_close(move || {
        producer.chunk("bye").unwrap();
    });

    fx.body.chunk("ohai").unwrap();
    fx.body.chunk("ohai").unwrap();
    fx.body.close(true);
    fx.scheduler.run_all();

    assert_eq!(fx.received(), vec!["ohai", "ohai", "bye"]);
    assert_eq!(fx.finalize_count(), 1);
}

// Scenario D: writing after close fails and leaves the queue as it was.
#[test]
fn write_after_close_fails_without_disturbing_queue() {
    let fx = Fixture::new();

    fx.body.chunk("kept").unwrap();
    fx.body.close(true);

    assert_eq!(fx.body.chunk("late"), Err(StreamError::ClosedConnection));
    assert!(!fx.body.is_empty());

    fx.register_consumer();
    fx.scheduler.run_all();

    assert_eq!(fx.received(), vec!["kept"]);
    assert_eq!(fx.finalize_count(), 1);
}

// Ordering property: arbitrary chunk sequences arrive in enqueue order no
// matter how many loop turns the drain takes.
#[test]
fn chunks_arrive_in_enqueue_order_across_turns() {
    let fx = Fixture::new();
    fx.register_consumer();

    let expected: Vec<String> = (0..10).map(|i| format!("c{}", i)).collect();
    for c in &expected {
        fx.body.chunk(c.as_str()).unwrap();
    }

    // Drain one turn at a time; each turn delivers at most one group.
    let mut turns = 0;
    while fx.scheduler.run_next() {
        turns += 1;
        assert!(turns < 100, "drain did not terminate");
    }

    assert_eq!(fx.received(), expected);
}

// Fairness property: a single pass never delivers more than one group, so a
// long queue leaves tasks pending between groups.
#[test]
fn one_group_per_loop_turn() {
    let fx = Fixture::new();
    fx.register_consumer();

    fx.body.chunk("first").unwrap();
    fx.body.chunk("second").unwrap();

    fx.scheduler.run_next();
    assert_eq!(fx.received(), vec!["first"]);

    fx.scheduler.run_next();
    fx.scheduler.run_all();
    assert_eq!(fx.received(), vec!["first", "second"]);
}

// Interleaved production: chunks written from "later" turns (as a timer
// would) still arrive in order and drain fully on a graceful close.
#[test]
fn producer_interleaved_with_drain() {
    let fx = Fixture::new();
    fx.register_consumer();

    fx.body.chunk("t0").unwrap();
    let body = fx.body.clone();
    fx.scheduler.schedule(Box::new(move || {
        body.chunk("t1").unwrap();
        let body2 = body.clone();
        body.close(true);
        assert!(body2.is_closed());
    }));
    fx.scheduler.run_all();

    assert_eq!(fx.received(), vec!["t0", "t1"]);
    assert_eq!(fx.finalize_count(), 1);
}

// Close twice in both orders: exactly one finalize.
#[test]
fn graceful_then_hard_close_finalizes_once() {
    let fx = Fixture::new();
    fx.register_consumer();

    fx.body.chunk("only").unwrap();
    fx.body.close(true);
    fx.body.close_now();
    fx.scheduler.run_all();

    // The hard close won the race before anything drained.
    assert_eq!(fx.received(), Vec::<String>::new());
    assert_eq!(fx.finalize_count(), 1);
}

#[test]
fn hard_then_graceful_close_finalizes_once() {
    let fx = Fixture::new();
    fx.register_consumer();

    fx.body.close_now();
    fx.body.close(true);
    fx.scheduler.run_all();

    assert_eq!(fx.finalize_count(), 1);
}
