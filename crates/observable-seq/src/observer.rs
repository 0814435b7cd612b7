#![forbid(unsafe_code)]

//! Observer capability and the removal event it receives.
//!
//! An [`Observer`] is implemented by the embedding application and
//! registered on a sequence under a tag. Both callbacks default to no-ops,
//! so an observer only overrides the events it cares about.
//!
//! # Removal positions
//!
//! A removal is either a single index ([`Removal::At`]) or a bulk clear
//! ([`Removal::Bulk`]). Bulk removals have no index that describes them and
//! should be handled as a full refresh. [`Removal::position`] exposes the
//! flat integer view where bulk maps to [`BULK_POSITION`].

use std::fmt;

/// Integer position reported for a bulk removal by [`Removal::position`].
pub const BULK_POSITION: i64 = -1;

/// What a removed notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Removal {
    /// A single element was removed from this index.
    At(usize),
    /// Every element was removed at once.
    Bulk,
}

impl Removal {
    /// Index of the removed element, `None` for a bulk removal.
    #[must_use]
    pub const fn index(self) -> Option<usize> {
        match self {
            Self::At(index) => Some(index),
            Self::Bulk => None,
        }
    }

    /// Whether this is a bulk removal.
    #[must_use]
    pub const fn is_bulk(self) -> bool {
        matches!(self, Self::Bulk)
    }

    /// Flat integer position: the index, or [`BULK_POSITION`] for a bulk
    /// removal.
    #[must_use]
    pub fn position(self) -> i64 {
        match self {
            Self::At(index) => i64::try_from(index).unwrap_or(i64::MAX),
            Self::Bulk => BULK_POSITION,
        }
    }
}

impl fmt::Display for Removal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At(index) => write!(f, "at {index}"),
            Self::Bulk => write!(f, "bulk"),
        }
    }
}

/// Receiver of sequence change notifications.
///
/// Callbacks run synchronously on the thread that performed the mutation,
/// while the sequence lock is held. They may read the sequence (the lock is
/// re-entrant) and may register or unregister observers.
///
/// No ordering between observers is guaranteed.
pub trait Observer: Send + Sync + 'static {
    /// Content was added.
    fn on_modified(&self) {}

    /// Content was removed.
    fn on_removed(&self, removal: Removal) {
        let _ = removal;
    }
}

type ModifiedFn = Box<dyn Fn() + Send + Sync>;
type RemovedFn = Box<dyn Fn(Removal) + Send + Sync>;

/// Observer backed by closures.
///
/// ```
/// use observable_seq::{FnObserver, Observer, Removal};
///
/// let observer = FnObserver::new()
///     .with_modified(|| println!("modified"))
///     .with_removed(|removal: Removal| println!("removed {removal}"));
/// observer.on_modified();
/// ```
#[derive(Default)]
pub struct FnObserver {
    modified: Option<ModifiedFn>,
    removed: Option<RemovedFn>,
}

impl FnObserver {
    /// Observer with no callbacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the callback for modified notifications.
    #[must_use]
    pub fn with_modified(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.modified = Some(Box::new(f));
        self
    }

    /// Set the callback for removed notifications.
    #[must_use]
    pub fn with_removed(mut self, f: impl Fn(Removal) + Send + Sync + 'static) -> Self {
        self.removed = Some(Box::new(f));
        self
    }
}

impl Observer for FnObserver {
    fn on_modified(&self) {
        if let Some(f) = &self.modified {
            f();
        }
    }

    fn on_removed(&self, removal: Removal) {
        if let Some(f) = &self.removed {
            f(removal);
        }
    }
}

impl fmt::Debug for FnObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnObserver")
            .field("modified", &self.modified.is_some())
            .field("removed", &self.removed.is_some())
            .finish()
    }
}

/// Observer that logs every notification through `tracing` at debug level.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    label: String,
}

impl TracingObserver {
    /// Create an observer whose events carry `label`.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Label attached to logged events.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Observer for TracingObserver {
    fn on_modified(&self) {
        tracing::debug!(target: "observable_seq::observer", label = %self.label, "modified");
    }

    fn on_removed(&self, removal: Removal) {
        tracing::debug!(
            target: "observable_seq::observer",
            label = %self.label,
            position = removal.position(),
            "removed"
        );
    }
}
