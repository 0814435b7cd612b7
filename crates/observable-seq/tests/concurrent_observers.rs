#![forbid(unsafe_code)]

//! Concurrency stress tests.
//!
//! These tests hammer one sequence from many threads and check:
//! 1. No registration is lost or duplicated.
//! 2. Mutations never interleave their notifications.
//! 3. A slow observer does not block registration on another thread.
//! 4. Manual notifications serialize with mutation dispatch.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::Duration;

use observable_seq::{FnObserver, ObservableSequence, Observer, Removal};

const THREADS: usize = 16;
const PER_THREAD: usize = 200;

#[derive(Default)]
struct Counter {
    modified: AtomicUsize,
    removed: AtomicUsize,
}

impl Observer for Counter {
    fn on_modified(&self) {
        self.modified.fetch_add(1, Ordering::SeqCst);
    }

    fn on_removed(&self, _removal: Removal) {
        self.removed.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn concurrent_distinct_registrations_are_all_kept() {
    let seq: Arc<ObservableSequence<u32>> = Arc::new(ObservableSequence::new());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let seq = Arc::clone(&seq);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..PER_THREAD {
                    let replaced =
                        seq.register_observer(format!("t{t}-{i}"), Arc::new(Counter::default()));
                    assert!(!replaced);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(seq.observer_count(), THREADS * PER_THREAD);
    let tags: HashSet<String> = seq.observers().tags().into_iter().collect();
    assert_eq!(tags.len(), THREADS * PER_THREAD);
}

#[test]
fn concurrent_same_tag_registration_keeps_one() {
    let seq: Arc<ObservableSequence<u32>> = Arc::new(ObservableSequence::new());
    let replaced = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let seq = Arc::clone(&seq);
            let replaced = Arc::clone(&replaced);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                if seq.register_observer("shared", Arc::new(Counter::default())) {
                    replaced.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(seq.observer_count(), 1);
    assert_eq!(replaced.load(Ordering::SeqCst), THREADS - 1);
}

#[test]
fn concurrent_appends_notify_once_each() {
    let seq: Arc<ObservableSequence<usize>> = Arc::new(ObservableSequence::new());
    let counter = Arc::new(Counter::default());
    seq.register_observer("count", counter.clone());

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let seq = Arc::clone(&seq);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    seq.append(t * PER_THREAD + i);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let total = THREADS * PER_THREAD;
    assert_eq!(seq.len(), total);
    assert_eq!(counter.modified.load(Ordering::SeqCst), total);
    assert_eq!(seq.version(), total as u64);

    let mut items = seq.to_vec();
    items.sort_unstable();
    assert_eq!(items, (0..total).collect::<Vec<_>>());
}

#[test]
fn notifications_never_interleave() {
    let seq: Arc<ObservableSequence<usize>> = Arc::new(ObservableSequence::new());
    let in_flight = Arc::new(AtomicBool::new(false));
    let overlaps = Arc::new(AtomicUsize::new(0));

    let flag = Arc::clone(&in_flight);
    let bad = Arc::clone(&overlaps);
    seq.register_observer(
        "exclusive",
        Arc::new(FnObserver::new().with_modified(move || {
            if flag.swap(true, Ordering::SeqCst) {
                bad.fetch_add(1, Ordering::SeqCst);
            }
            thread::yield_now();
            flag.store(false, Ordering::SeqCst);
        })),
    );

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let seq = Arc::clone(&seq);
            thread::spawn(move || {
                for i in 0..100 {
                    seq.append(t * 100 + i);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    assert_eq!(seq.len(), 800);
}

#[test]
fn mixed_mutations_keep_counts_consistent() {
    let seq: Arc<ObservableSequence<usize>> = Arc::new(ObservableSequence::new());
    let counter = Arc::new(Counter::default());
    seq.register_observer("count", counter.clone());
    let successes = Arc::new(Mutex::new((0usize, 0usize)));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let seq = Arc::clone(&seq);
            let successes = Arc::clone(&successes);
            thread::spawn(move || {
                let mut adds = 0;
                let mut removes = 0;
                for i in 0..100 {
                    if (t + i) % 3 == 0 {
                        if seq.remove_at(0).is_ok() {
                            removes += 1;
                        }
                    } else {
                        seq.append(i);
                        adds += 1;
                    }
                }
                let mut s = successes.lock().unwrap();
                s.0 += adds;
                s.1 += removes;
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let (adds, removes) = *successes.lock().unwrap();
    assert_eq!(counter.modified.load(Ordering::SeqCst), adds);
    assert_eq!(counter.removed.load(Ordering::SeqCst), removes);
    assert_eq!(seq.len(), adds - removes);
}

#[test]
fn slow_observer_does_not_block_registration() {
    let seq: Arc<ObservableSequence<u8>> = Arc::new(ObservableSequence::new());
    let (entered_tx, entered_rx) = mpsc::channel::<()>();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let entered_tx = Mutex::new(entered_tx);
    let release_rx = Mutex::new(release_rx);

    seq.register_observer(
        "slow",
        Arc::new(FnObserver::new().with_modified(move || {
            entered_tx.lock().unwrap().send(()).unwrap();
            release_rx.lock().unwrap().recv().unwrap();
        })),
    );

    let mutator = {
        let seq = Arc::clone(&seq);
        thread::spawn(move || seq.append(1))
    };

    entered_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("slow observer should start");

    // Registration proceeds while the slow observer holds the dispatch.
    assert!(!seq.register_observer("late", Arc::new(Counter::default())));
    assert!(seq.unregister_observer("late"));

    release_tx.send(()).unwrap();
    assert!(mutator.join().unwrap());
    assert_eq!(seq.len(), 1);
}

#[test]
fn manual_notification_waits_for_in_flight_dispatch() {
    let seq: Arc<ObservableSequence<u8>> = Arc::new(ObservableSequence::new());
    let in_flight = Arc::new(AtomicBool::new(false));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let calls = Arc::new(AtomicUsize::new(0));
    let (entered_tx, entered_rx) = mpsc::channel::<()>();
    let entered_tx = Mutex::new(entered_tx);

    let flag = Arc::clone(&in_flight);
    let bad = Arc::clone(&overlaps);
    let count = Arc::clone(&calls);
    seq.register_observer(
        "slow",
        Arc::new(FnObserver::new().with_modified(move || {
            if flag.swap(true, Ordering::SeqCst) {
                bad.fetch_add(1, Ordering::SeqCst);
            }
            count.fetch_add(1, Ordering::SeqCst);
            let _ = entered_tx.lock().unwrap().send(());
            thread::sleep(Duration::from_millis(50));
            flag.store(false, Ordering::SeqCst);
        })),
    );

    let mutator = {
        let seq = Arc::clone(&seq);
        thread::spawn(move || seq.append(1))
    };

    entered_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("append dispatch should start");

    // Blocks on the sequence lock until the append's dispatch has returned.
    seq.notify_modified();

    assert!(mutator.join().unwrap());
    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    // Inspection through the registry cannot dispatch.
    assert_eq!(seq.observers().tags(), vec!["slow"]);
}
