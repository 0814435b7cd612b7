#![forbid(unsafe_code)]

//! Tagged observer registry with fan-out dispatch.
//!
//! # Design
//!
//! Observers live in a sharded concurrent map keyed by tag. Registration,
//! removal and dispatch may run from any number of threads at once; each
//! operation only locks the shard it touches.
//!
//! Dispatch first collects a snapshot of `(tag, Arc<dyn Observer>)` pairs and
//! releases every shard lock, then calls the observers. Consequences:
//!
//! - a slow observer never blocks registration on another thread;
//! - an observer may register or unregister (itself included) from inside its
//!   callback; the change applies to the next dispatch;
//! - every observer present when the snapshot is taken is called exactly once.
//!
//! # Failure Modes
//!
//! - **Panicking observer**: the panic is caught, logged with the observer's
//!   tag, and delivery continues with the remaining observers. Once all have
//!   been called, the first panic is resumed on the dispatching thread.
//! - **Ordering**: iteration order follows the map's shards and is not
//!   related to registration order. Callers must not rely on it.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use dashmap::DashMap;

use crate::observer::{Observer, Removal};

type Snapshot = Vec<(String, Arc<dyn Observer>)>;

/// Concurrent map from tag to observer.
#[derive(Default)]
pub struct ObserverRegistry {
    entries: DashMap<String, Arc<dyn Observer>>,
    trace_dispatch: bool,
}

impl ObserverRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with room for `capacity` observers.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity),
            trace_dispatch: false,
        }
    }

    /// Emit a `trace` event for every dispatch.
    #[must_use]
    pub fn with_trace_dispatch(mut self, enabled: bool) -> Self {
        self.trace_dispatch = enabled;
        self
    }

    /// Register `observer` under `tag`, replacing any previous observer with
    /// the same tag.
    ///
    /// Returns `true` if an observer was replaced.
    pub fn register(&self, tag: impl Into<String>, observer: Arc<dyn Observer>) -> bool {
        let tag = tag.into();
        let replaced = self.entries.insert(tag.clone(), observer).is_some();
        tracing::debug!(tag = %tag, replaced, "observer registered");
        replaced
    }

    /// Remove the observer registered under `tag`.
    ///
    /// Returns `true` if an observer was removed.
    pub fn unregister(&self, tag: &str) -> bool {
        let removed = self.entries.remove(tag).is_some();
        if removed {
            tracing::debug!(tag = %tag, "observer unregistered");
        }
        removed
    }

    /// Remove every observer.
    pub fn clear(&self) {
        let count = self.entries.len();
        self.entries.clear();
        tracing::debug!(count, "all observers unregistered");
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no observer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an observer is registered under `tag`.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Registered tags, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        tags.sort_unstable();
        tags
    }

    /// Call [`Observer::on_modified`] on every registered observer.
    ///
    /// Callers hold the owning sequence's lock.
    pub(crate) fn notify_modified(&self) {
        self.dispatch("modified", |observer| observer.on_modified());
    }

    /// Call [`Observer::on_removed`] on every registered observer.
    pub(crate) fn notify_removed(&self, removal: Removal) {
        self.dispatch("removed", |observer| observer.on_removed(removal));
    }

    fn snapshot(&self) -> Snapshot {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect()
    }

    fn dispatch(&self, event: &'static str, call: impl Fn(&dyn Observer)) {
        let snapshot = self.snapshot();
        if self.trace_dispatch {
            tracing::trace!(event, observers = snapshot.len(), "dispatch");
        }

        let mut first_panic: Option<Box<dyn Any + Send>> = None;
        for (tag, observer) in &snapshot {
            let result = panic::catch_unwind(AssertUnwindSafe(|| call(observer.as_ref())));
            if let Err(payload) = result {
                tracing::warn!(
                    tag = %tag,
                    event,
                    info = %panic_message(payload.as_ref()),
                    "observer panicked"
                );
                first_panic.get_or_insert(payload);
            }
        }

        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("tags", &self.tags())
            .field("trace_dispatch", &self.trace_dispatch)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
