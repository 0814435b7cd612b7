#![forbid(unsafe_code)]

//! Ordered, index-addressable sequence with change notification.
//!
//! # Design
//!
//! [`ObservableSequence<T>`] owns a `Vec<T>` behind a per-instance
//! re-entrant mutex and embeds an [`ObserverRegistry`]. Only the vetted
//! mutation surface below exists, so no mutation can skip notification.
//!
//! Every mutation follows the same shape:
//!
//! ```text
//! lock ──► borrow_mut ──► structural change ──► release borrow ──► dispatch ──► unlock
//! ```
//!
//! The lock is held across dispatch, so a mutation and its notification are
//! one atomic unit for other threads. The `RefCell` borrow is released before
//! dispatch, so observers may read the sequence from inside a callback.
//!
//! # Notifications
//!
//! | Operation                 | Notification                       |
//! |---------------------------|------------------------------------|
//! | `append`, `insert`        | `on_modified`                      |
//! | `append_all`, `insert_all`| one `on_modified` (none if empty)  |
//! | `remove_by_value`         | `on_removed(At(k))` if found       |
//! | `remove_at`               | `on_removed(At(index))`            |
//! | `clear`                   | `on_removed(Bulk)` if non-empty    |
//! | `remove_range`, `remove_all` | never (always unsupported)     |
//!
//! # Failure Modes
//!
//! - **Out-of-range index**: `insert`, `insert_all` and `remove_at` return
//!   [`SequenceError::IndexOutOfBounds`]; nothing changes, nobody is notified.
//! - **Panicking observer**: the structural change stays applied, the other
//!   observers are still called, then the panic reaches the caller.
//! - **Mutation inside [`with`](ObservableSequence::with)**: panics (the
//!   items are borrowed for the closure's duration).

use std::cell::RefCell;
use std::fmt;
use std::ops::RangeBounds;
use std::sync::Arc;

use parking_lot::ReentrantMutex;

use crate::config::SequenceConfig;
use crate::error::{SequenceError, UnsupportedOperation};
use crate::observer::{Observer, Removal};
use crate::registry::ObserverRegistry;

struct SequenceState<T> {
    items: Vec<T>,
    version: u64,
}

/// Thread-safe ordered sequence that notifies tagged observers on change.
///
/// Share between threads with `Arc<ObservableSequence<T>>`.
///
/// # Invariants
///
/// 1. Every successful size-changing mutation triggers exactly one
///    notification per registered observer.
/// 2. Failed or no-op mutations notify nobody.
/// 3. `version` increments by exactly 1 per notifying mutation.
/// 4. At most one observer per tag.
pub struct ObservableSequence<T> {
    state: ReentrantMutex<RefCell<SequenceState<T>>>,
    observers: ObserverRegistry,
    config: SequenceConfig,
}

impl<T> Default for ObservableSequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ObservableSequence<T> {
    /// Create an empty sequence with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SequenceConfig::default())
    }

    /// Create an empty sequence with the given configuration.
    #[must_use]
    pub fn with_config(config: SequenceConfig) -> Self {
        let observers = ObserverRegistry::with_capacity(config.observer_capacity)
            .with_trace_dispatch(config.trace_dispatch);
        Self {
            state: ReentrantMutex::new(RefCell::new(SequenceState {
                items: Vec::with_capacity(config.initial_capacity),
                version: 0,
            })),
            observers,
            config,
        }
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Append `item` at the end and notify `on_modified`.
    ///
    /// Always returns `true`; the sequence is unbounded.
    pub fn append(&self, item: T) -> bool {
        let guard = self.state.lock();
        {
            let mut state = guard.borrow_mut();
            state.items.push(item);
            state.version += 1;
        }
        self.observers.notify_modified();
        true
    }

    /// Insert `item` at `index`, shifting later elements right, and notify
    /// `on_modified`.
    ///
    /// # Errors
    ///
    /// [`SequenceError::IndexOutOfBounds`] if `index > len`.
    pub fn insert(&self, index: usize, item: T) -> Result<(), SequenceError> {
        let guard = self.state.lock();
        {
            let mut state = guard.borrow_mut();
            let len = state.items.len();
            if index > len {
                return Err(SequenceError::IndexOutOfBounds { index, len });
            }
            state.items.insert(index, item);
            state.version += 1;
        }
        self.observers.notify_modified();
        Ok(())
    }

    /// Append every item in order with a single `on_modified`.
    ///
    /// Returns `false` without notifying when `items` is empty.
    pub fn append_all(&self, items: impl IntoIterator<Item = T>) -> bool {
        // Collected before locking: the iterator may run arbitrary code.
        let items: Vec<T> = items.into_iter().collect();
        if items.is_empty() {
            return false;
        }

        let guard = self.state.lock();
        {
            let mut state = guard.borrow_mut();
            state.items.extend(items);
            state.version += 1;
        }
        self.observers.notify_modified();
        true
    }

    /// Insert every item at `index`, keeping their order, with a single
    /// `on_modified`.
    ///
    /// Returns `Ok(false)` without notifying when `items` is empty.
    ///
    /// # Errors
    ///
    /// [`SequenceError::IndexOutOfBounds`] if `index > len`, checked before
    /// the empty-input short-circuit.
    pub fn insert_all(
        &self,
        index: usize,
        items: impl IntoIterator<Item = T>,
    ) -> Result<bool, SequenceError> {
        let items: Vec<T> = items.into_iter().collect();

        let guard = self.state.lock();
        {
            let mut state = guard.borrow_mut();
            let len = state.items.len();
            if index > len {
                return Err(SequenceError::IndexOutOfBounds { index, len });
            }
            if items.is_empty() {
                return Ok(false);
            }
            let tail = state.items.split_off(index);
            state.items.extend(items);
            state.items.extend(tail);
            state.version += 1;
        }
        self.observers.notify_modified();
        Ok(true)
    }

    /// Remove the first element equal to `item` and notify
    /// `on_removed(At(k))` with its former index.
    ///
    /// Returns `false` without notifying when no element matches.
    pub fn remove_by_value(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        let guard = self.state.lock();
        let removed = {
            let mut state = guard.borrow_mut();
            let found = state.items.iter().position(|x| x == item);
            found.map(|index| {
                let value = state.items.remove(index);
                state.version += 1;
                (index, value)
            })
        };

        match removed {
            Some((index, _value)) => {
                self.observers.notify_removed(Removal::At(index));
                true
            }
            None => false,
        }
    }

    /// Remove and return the element at `index`, notifying
    /// `on_removed(At(index))`.
    ///
    /// # Errors
    ///
    /// [`SequenceError::IndexOutOfBounds`] if `index >= len`.
    pub fn remove_at(&self, index: usize) -> Result<T, SequenceError> {
        let guard = self.state.lock();
        let removed = {
            let mut state = guard.borrow_mut();
            let len = state.items.len();
            if index >= len {
                return Err(SequenceError::IndexOutOfBounds { index, len });
            }
            state.version += 1;
            state.items.remove(index)
        };
        self.observers.notify_removed(Removal::At(index));
        Ok(removed)
    }

    /// Range removal is not supported.
    ///
    /// # Errors
    ///
    /// Always [`UnsupportedOperation::RemoveRange`], whatever the range.
    pub fn remove_range(&self, range: impl RangeBounds<usize>) -> Result<(), SequenceError> {
        let _ = range;
        Err(self.reject(UnsupportedOperation::RemoveRange))
    }

    /// Collection-based removal is not supported; use [`clear`](Self::clear).
    ///
    /// # Errors
    ///
    /// Always [`UnsupportedOperation::RemoveAll`], whatever the items.
    pub fn remove_all(&self, items: impl IntoIterator<Item = T>) -> Result<bool, SequenceError> {
        let _ = items;
        Err(self.reject(UnsupportedOperation::RemoveAll))
    }

    /// Remove every element and notify `on_removed(Bulk)`.
    ///
    /// Does nothing when already empty.
    pub fn clear(&self) {
        let guard = self.state.lock();
        let removed = {
            let mut state = guard.borrow_mut();
            if state.items.is_empty() {
                return;
            }
            state.version += 1;
            std::mem::replace(
                &mut state.items,
                Vec::with_capacity(self.config.initial_capacity),
            )
        };
        self.observers.notify_removed(Removal::Bulk);
        drop(removed);
    }

    /// Notify `on_modified` without changing the contents.
    ///
    /// Runs under the sequence lock like any mutation.
    pub fn notify_modified(&self) {
        let _guard = self.state.lock();
        self.observers.notify_modified();
    }

    /// Notify `on_removed(removal)` without changing the contents.
    ///
    /// Runs under the sequence lock like any mutation.
    pub fn notify_removed(&self, removal: Removal) {
        let _guard = self.state.lock();
        self.observers.notify_removed(removal);
    }

    fn reject(&self, op: UnsupportedOperation) -> SequenceError {
        tracing::debug!(op = op.name(), "rejected unsupported operation");
        SequenceError::Unsupported(op)
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    /// Register `observer` under `tag`, replacing any observer with the same
    /// tag. Returns `true` if one was replaced.
    pub fn register_observer(&self, tag: impl Into<String>, observer: Arc<dyn Observer>) -> bool {
        self.observers.register(tag, observer)
    }

    /// Unregister the observer under `tag`. Returns `true` if one existed.
    pub fn unregister_observer(&self, tag: &str) -> bool {
        self.observers.unregister(tag)
    }

    /// Unregister every observer.
    pub fn unregister_all_observers(&self) {
        self.observers.clear();
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// The embedded observer registry, for inspection.
    ///
    /// Dispatch is not reachable through it; use
    /// [`notify_modified`](Self::notify_modified) or
    /// [`notify_removed`](Self::notify_removed), which take the sequence lock.
    #[must_use]
    pub fn observers(&self) -> &ObserverRegistry {
        &self.observers
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.with(<[T]>::len)
    }

    /// Whether the sequence has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.with(<[T]>::is_empty)
    }

    /// Number of notifying mutations applied so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        let guard = self.state.lock();
        guard.borrow().version
    }

    /// Configuration this sequence was built with.
    #[must_use]
    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    /// Run `f` with the current elements.
    ///
    /// # Panics
    ///
    /// Panics if `f` mutates this sequence.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        let guard = self.state.lock();
        let state = guard.borrow();
        f(&state.items)
    }

    /// Clone of the element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T>
    where
        T: Clone,
    {
        self.with(|items| items.get(index).cloned())
    }

    /// Clone of the first element.
    #[must_use]
    pub fn first(&self) -> Option<T>
    where
        T: Clone,
    {
        self.with(|items| items.first().cloned())
    }

    /// Clone of the last element.
    #[must_use]
    pub fn last(&self) -> Option<T>
    where
        T: Clone,
    {
        self.with(|items| items.last().cloned())
    }

    /// Index of the first element equal to `item`.
    #[must_use]
    pub fn index_of(&self, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.with(|items| items.iter().position(|x| x == item))
    }

    /// Whether any element equals `item`.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.with(|items| items.contains(item))
    }

    /// Clone of all elements in order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.with(<[T]>::to_vec)
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.state.lock();
        let state = guard.borrow();
        f.debug_struct("ObservableSequence")
            .field("items", &state.items)
            .field("version", &state.version)
            .field("observer_count", &self.observers.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
