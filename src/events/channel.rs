//! # Named-event dispatch table.
//!
//! [`EventChannel`] maps an event name to an ordered list of listeners. It backs
//! both [`Method`](crate::Method) (`request` / `cancel`) and
//! [`Subscription`](crate::Subscription) (`response`).
//!
//! ## Rules
//! - Listeners run **synchronously**, in registration order, on the emitting task.
//! - The table lock is not held while listeners run, so a listener may register
//!   further listeners; those only see later emissions.
//! - Emitting a name with no listeners is a no-op.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;

/// Shared listener callback.
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync + 'static>;

/// Listener registry keyed by event name.
pub struct EventChannel<K, T> {
    listeners: Mutex<HashMap<K, Vec<Listener<T>>>>,
}

impl<K, T> EventChannel<K, T>
where
    K: Copy + Eq + Hash,
{
    /// Creates an empty channel.
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
        }
    }

    /// Appends a listener for `name`.
    pub fn on<F>(&self, name: K, listener: F)
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.listeners
            .lock()
            .entry(name)
            .or_default()
            .push(Arc::new(listener));
    }

    /// Invokes every listener of `name` with `payload`; returns how many ran.
    pub fn emit(&self, name: K, payload: &T) -> usize {
        let snapshot: Vec<Listener<T>> = match self.listeners.lock().get(&name) {
            Some(list) => list.clone(),
            None => return 0,
        };
        for listener in &snapshot {
            listener(payload);
        }
        snapshot.len()
    }

    /// Number of listeners registered for `name`.
    pub fn listener_count(&self, name: K) -> usize {
        self.listeners.lock().get(&name).map_or(0, Vec::len)
    }

    /// Drops every listener.
    pub fn clear(&self) {
        self.listeners.lock().clear();
    }
}

impl<K, T> Default for EventChannel<K, T>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, PartialEq, Eq, Hash)]
    enum Name {
        A,
        B,
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let ch: EventChannel<Name, u32> = EventChannel::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let seen = seen.clone();
            ch.on(Name::A, move |v: &u32| seen.lock().push((tag, *v)));
        }

        assert_eq!(ch.emit(Name::A, &7), 3);
        assert_eq!(
            *seen.lock(),
            vec![("first", 7), ("second", 7), ("third", 7)]
        );
    }

    #[test]
    fn names_are_isolated() {
        let ch: EventChannel<Name, ()> = EventChannel::new();
        ch.on(Name::A, |_| {});
        assert_eq!(ch.emit(Name::B, &()), 0);
        assert_eq!(ch.listener_count(Name::A), 1);
        assert_eq!(ch.listener_count(Name::B), 0);
    }

    #[test]
    fn listener_may_register_more_listeners() {
        let ch: Arc<EventChannel<Name, ()>> = Arc::new(EventChannel::new());
        let inner = ch.clone();
        ch.on(Name::A, move |_| inner.on(Name::A, |_| {}));

        assert_eq!(ch.emit(Name::A, &()), 1);
        assert_eq!(ch.listener_count(Name::A), 2);
    }
}
