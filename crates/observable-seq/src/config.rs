#![forbid(unsafe_code)]

//! Construction-time settings for an observable sequence.

/// Configuration for [`ObservableSequence`](crate::ObservableSequence).
///
/// All fields are public; the `with_*` helpers allow chained construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceConfig {
    /// Capacity reserved for items up front.
    pub initial_capacity: usize,
    /// Capacity hint for the observer registry.
    pub observer_capacity: usize,
    /// Emit a `trace` event for every dispatch.
    pub trace_dispatch: bool,
}

impl SequenceConfig {
    /// Default configuration: no reserved capacity, dispatch tracing off.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reserved item capacity.
    #[must_use]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set the observer registry capacity hint.
    #[must_use]
    pub fn with_observer_capacity(mut self, capacity: usize) -> Self {
        self.observer_capacity = capacity;
        self
    }

    /// Enable or disable per-dispatch trace events.
    #[must_use]
    pub fn with_trace_dispatch(mut self, enabled: bool) -> Self {
        self.trace_dispatch = enabled;
        self
    }
}
