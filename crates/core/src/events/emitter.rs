//! Event emitter for circuit breaker state changes

use super::types::StateChange;
use crate::constants::STATE_EVENT_CAPACITY;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Receives state change notifications synchronously
pub trait StateListener: Send + Sync {
    /// Called once per state change, after the breaker lock is released.
    ///
    /// Changes from one emitter reach each listener in sequence order.
    fn on_state_change(&self, change: &StateChange);
}

impl<F> StateListener for F
where
    F: Fn(&StateChange) + Send + Sync,
{
    fn on_state_change(&self, change: &StateChange) {
        self(change)
    }
}

/// Handle returned by [`StateEvents::add_listener`], used to remove the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Fan-out point for state changes: a broadcast channel for async consumers
/// and a listener list for synchronous observers.
///
/// [`publish`](Self::publish) is called under the owner's lock and fixes the
/// delivery order; [`dispatch`](Self::dispatch) is called after that lock is
/// released and hands queued changes to listeners one at a time, in order.
pub struct StateEvents {
    sender: broadcast::Sender<StateChange>,
    listeners: RwLock<Vec<(ListenerId, Arc<dyn StateListener>)>>,
    next_id: AtomicU64,
    pending: Mutex<VecDeque<StateChange>>,
    /// Held while draining `pending`; the flag marks a drain already running on this thread
    dispatching: ReentrantMutex<Cell<bool>>,
}

impl StateEvents {
    /// Create an emitter with the given broadcast channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
            pending: Mutex::new(VecDeque::new()),
            dispatching: ReentrantMutex::new(Cell::new(false)),
        }
    }

    /// Register a listener
    pub fn add_listener(&self, listener: Arc<dyn StateListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, listener));
        debug!(listener_id = id.0, "State listener added");
        id
    }

    /// Remove a listener, returning whether it was registered
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let initial_len = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        let removed = listeners.len() != initial_len;
        if removed {
            debug!(listener_id = id.0, "State listener removed");
        }
        removed
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Create a receiver for the broadcast channel
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.sender.subscribe()
    }

    /// Send a change to channel subscribers and queue it for listeners.
    ///
    /// Never blocks, so it may be called while holding the breaker lock. The
    /// order of `publish` calls is the order every observer sees.
    pub fn publish(&self, change: &StateChange) {
        if self.sender.send(change.clone()).is_err() {
            trace!(breaker = %change.breaker, "No state change receivers");
        }
        self.pending.lock().push_back(change.clone());
    }

    /// Deliver queued changes to listeners.
    ///
    /// Returns once every change published before the call has been
    /// delivered. A change published from inside a listener is delivered by
    /// the drain already running on that thread, after the current change.
    pub fn dispatch(&self) {
        let guard = self.dispatching.lock();
        if guard.get() {
            return;
        }
        guard.set(true);
        let _running = DrainFlag(&*guard);

        loop {
            let next = self.pending.lock().pop_front();
            match next {
                Some(change) => self.notify_listeners(&change),
                None => break,
            }
        }
    }

    // Listeners may add or remove listeners from inside the callback.
    fn notify_listeners(&self, change: &StateChange) {
        let listeners: Vec<_> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in &listeners {
            listener.on_state_change(change);
        }
    }
}

/// Clears the draining flag even if a listener panics
struct DrainFlag<'a>(&'a Cell<bool>);

impl Drop for DrainFlag<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Default for StateEvents {
    fn default() -> Self {
        Self::new(STATE_EVENT_CAPACITY)
    }
}

impl std::fmt::Debug for StateEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateEvents")
            .field("listeners", &self.listener_count())
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CircuitState;
    use parking_lot::Mutex;

    fn change(sequence: u64) -> StateChange {
        StateChange::new("sim", CircuitState::Closed, CircuitState::Open, sequence)
    }

    #[test]
    fn test_listener_add_and_remove() {
        let events = StateEvents::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let id = events.add_listener(Arc::new(move |c: &StateChange| {
            sink.lock().push(c.sequence);
        }));
        assert_eq!(events.listener_count(), 1);

        events.publish(&change(1));
        events.dispatch();
        assert!(events.remove_listener(id));
        assert!(!events.remove_listener(id));
        events.publish(&change(2));
        events.dispatch();

        assert_eq!(*seen.lock(), vec![1]);
    }

    #[tokio::test]
    async fn test_broadcast_subscribers_receive_in_order() {
        let events = StateEvents::new(8);
        let mut rx = events.subscribe();

        events.publish(&change(1));
        events.publish(&change(2));

        assert_eq!(rx.recv().await.unwrap().sequence, 1);
        assert_eq!(rx.recv().await.unwrap().sequence, 2);
    }

    #[test]
    fn test_publish_without_receivers_is_harmless() {
        let events = StateEvents::default();
        events.publish(&change(1));
        events.dispatch();
        assert_eq!(events.listener_count(), 0);
    }

    #[test]
    fn test_dispatch_delivers_queued_changes_in_order() {
        let events = StateEvents::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        events.add_listener(Arc::new(move |c: &StateChange| {
            sink.lock().push(c.sequence);
        }));

        for sequence in 1..=3 {
            events.publish(&change(sequence));
        }
        events.dispatch();
        events.dispatch();

        assert_eq!(*seen.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn test_change_published_by_listener_follows_current_change() {
        let events = Arc::new(StateEvents::default());
        let first = Arc::new(Mutex::new(Vec::new()));
        let second = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&first);
        let inner = Arc::clone(&events);
        events.add_listener(Arc::new(move |c: &StateChange| {
            sink.lock().push(c.sequence);
            if c.sequence == 1 {
                inner.publish(&change(2));
                inner.dispatch();
            }
        }));
        let sink = Arc::clone(&second);
        events.add_listener(Arc::new(move |c: &StateChange| {
            sink.lock().push(c.sequence);
        }));

        events.publish(&change(1));
        events.dispatch();

        assert_eq!(*first.lock(), vec![1, 2]);
        assert_eq!(*second.lock(), vec![1, 2]);
    }
}
