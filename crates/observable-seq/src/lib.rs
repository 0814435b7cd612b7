#![forbid(unsafe_code)]

//! Thread-safe observable sequence.
//!
//! This crate provides an ordered collection that notifies a dynamic set of
//! tagged observers whenever its contents change:
//!
//! - [`ObservableSequence`]: an index-addressable `Vec`-backed container with
//!   a vetted mutation surface. Each mutation either succeeds and notifies or
//!   fails cleanly.
//! - [`ObserverRegistry`]: a concurrent tag → [`Observer`] map with fan-out
//!   dispatch, embedded in every sequence.
//! - [`Removal`]: what a removed notification describes, a single index or a
//!   bulk clear.
//!
//! # Architecture
//!
//! ```text
//!  caller thread                       ObservableSequence<T>
//! ───────────────┐   ┌────────────────────────────────────────────────┐
//!  append/insert │──►│ ReentrantMutex<RefCell<Vec<T>>>  (coarse lock)  │
//!  remove/clear  │   │        │ structural change, borrow released   │
//!                │   │        ▼                                       │
//!                │   │ ObserverRegistry (DashMap<tag, Arc<Observer>>)  │
//!                │   │        │ snapshot, shard locks released        │
//!                │   │        ▼                                       │
//!                │   │ on_modified() / on_removed(Removal) per entry   │
//! ───────────────┘   └────────────────────────────────────────────────┘
//!  register/unregister ──► ObserverRegistry directly (no coarse lock)
//! ```
//!
//! # Invariants
//!
//! 1. Every successful size-changing mutation triggers exactly one
//!    notification per observer present when dispatch starts.
//! 2. Failed mutations change nothing and notify nobody.
//! 3. Observers are not called in any particular order.
//! 4. Dispatch is synchronous: a mutation returns after every observer has
//!    returned.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use observable_seq::{FnObserver, ObservableSequence, Removal};
//!
//! let seq = ObservableSequence::new();
//! let modified = Arc::new(AtomicUsize::new(0));
//!
//! let m = Arc::clone(&modified);
//! seq.register_observer(
//!     "counter",
//!     Arc::new(FnObserver::new().with_modified(move || {
//!         m.fetch_add(1, Ordering::SeqCst);
//!     })),
//! );
//!
//! seq.append("a");
//! seq.append_all(["b", "c"]);
//! assert_eq!(modified.load(Ordering::SeqCst), 2);
//! assert_eq!(seq.to_vec(), vec!["a", "b", "c"]);
//!
//! assert_eq!(seq.remove_at(0), Ok("a"));
//! assert_eq!(Removal::Bulk.position(), -1);
//! ```

pub mod config;
pub mod error;
pub mod observer;
pub mod registry;
pub mod sequence;

pub use config::SequenceConfig;
pub use error::{SequenceError, UnsupportedOperation};
pub use observer::{BULK_POSITION, FnObserver, Observer, Removal, TracingObserver};
pub use registry::ObserverRegistry;
pub use sequence::ObservableSequence;
