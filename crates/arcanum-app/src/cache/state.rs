//! Observable resource state.
//!
//! Views publish their current value/loading/error triple through a watch
//! channel; presentation layers subscribe and re-render on change. This is
//! the explicit replacement for reactive observable fields: the contract is
//! only "value changed, notify observers".

use std::sync::Arc;
use tokio::sync::watch;

/// The displayed state of one resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<V> {
    pub value: Option<V>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<V> Default for ResourceState<V> {
    fn default() -> Self {
        Self {
            value: None,
            loading: false,
            error: None,
        }
    }
}

/// Owner side of an observable resource state.
///
/// Cheap to clone; all clones publish into the same channel.
#[derive(Clone)]
pub struct StateCell<V> {
    tx: Arc<watch::Sender<ResourceState<V>>>,
}

impl<V: Clone> StateCell<V> {
    /// Creates a cell holding the default (empty, idle) state.
    pub fn new() -> Self {
        Self::with_value(None)
    }

    /// Creates a cell pre-populated with a value (e.g. from a cache hit).
    pub fn with_value(value: Option<V>) -> Self {
        let (tx, _rx) = watch::channel(ResourceState {
            value,
            loading: false,
            error: None,
        });
        Self { tx: Arc::new(tx) }
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<V>> {
        self.tx.subscribe()
    }

    /// A snapshot of the current state.
    pub fn get(&self) -> ResourceState<V> {
        self.tx.borrow().clone()
    }

    /// Replaces the value and clears the error flag (successful load).
    pub fn set_value(&self, value: V) {
        self.tx.send_modify(|state| {
            state.value = Some(value);
            state.error = None;
        });
    }

    /// Publishes a value without touching the error flag (stale serve).
    pub fn show_cached(&self, value: V) {
        self.tx.send_modify(|state| {
            state.value = Some(value);
        });
    }

    /// Sets or clears the loading flag.
    pub fn set_loading(&self, loading: bool) {
        self.tx.send_modify(|state| {
            state.loading = loading;
        });
    }

    /// Records a failure. The displayed value resets only when the caller
    /// had nothing cached to keep showing.
    pub fn set_error(&self, message: String, keep_value: bool) {
        self.tx.send_modify(|state| {
            state.error = Some(message);
            if !keep_value {
                state.value = None;
            }
        });
    }
}

impl<V: Clone> Default for StateCell<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observers_see_changes() {
        let cell: StateCell<i32> = StateCell::new();
        let rx = cell.subscribe();

        cell.set_loading(true);
        cell.set_value(7);

        let state = rx.borrow();
        assert_eq!(state.value, Some(7));
        assert!(state.loading);
        assert_eq!(state.error, None);
    }

    #[test]
    fn test_error_keeps_or_resets_value() {
        let cell: StateCell<i32> = StateCell::new();
        cell.set_value(7);

        cell.set_error("失败".to_string(), true);
        assert_eq!(cell.get().value, Some(7));

        cell.set_error("失败".to_string(), false);
        assert_eq!(cell.get().value, None);
    }

    #[test]
    fn test_success_clears_error() {
        let cell: StateCell<i32> = StateCell::new();
        cell.set_error("失败".to_string(), false);
        cell.set_value(1);
        assert_eq!(cell.get().error, None);
    }
}
