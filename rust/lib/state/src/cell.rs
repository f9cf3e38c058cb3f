use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

/// Callback type for state change notifications.
pub type ChangeHandler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Unique handle for a subscription, returned by [`StateCell::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Clone)]
struct HandlerEntry<T> {
    id: SubscriptionId,
    handler: ChangeHandler<T>,
}

/// A single observable value.
///
/// - `set(value)` replaces the value and notifies all subscribers.
/// - `update(f)` mutates in place and notifies all subscribers.
/// - `update_if(f)` mutates in place and notifies only when `f` returns true.
/// - `get()` reads a clone of the current value.
///
/// Subscribers are called synchronously on the writer's thread, after the
/// value lock has been released, so a handler may read the cell (or write
/// it again) without deadlocking. No ordering is guaranteed among handlers.
pub struct StateCell<T> {
    value: RwLock<T>,
    handlers: RwLock<Vec<HandlerEntry<T>>>,
    next_id: AtomicU64,
}

impl<T: Clone + Send + Sync + 'static> StateCell<T> {
    /// Create a cell holding `initial`, with no subscribers.
    pub fn new(initial: T) -> Self {
        Self {
            value: RwLock::new(initial),
            handlers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Clone of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Read the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    /// Replace the value and notify all subscribers.
    pub fn set(&self, value: T) {
        let snapshot = {
            let mut current = self.value.write();
            *current = value;
            current.clone()
        };
        self.notify(&snapshot);
    }

    /// Mutate the value in place and notify all subscribers.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let (out, snapshot) = {
            let mut current = self.value.write();
            let out = f(&mut current);
            (out, current.clone())
        };
        self.notify(&snapshot);
        out
    }

    /// Mutate the value in place; notify only if `f` reports a change.
    ///
    /// The check and the write happen under the same lock, so concurrent
    /// writers cannot interleave between them.
    pub fn update_if(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        let snapshot = {
            let mut current = self.value.write();
            if !f(&mut current) {
                return false;
            }
            current.clone()
        };
        self.notify(&snapshot);
        true
    }

    /// Register a change handler. Returns an id for [`StateCell::unsubscribe`].
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().push(HandlerEntry {
            id,
            handler: Arc::new(handler),
        });
        id
    }

    /// Remove a handler. Returns false if the id was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|entry| entry.id != id);
        handlers.len() < before
    }

    /// Number of registered handlers.
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }

    fn notify(&self, value: &T) {
        // Clone the list so handlers can (un)subscribe while being called.
        let handlers: Vec<HandlerEntry<T>> = self.handlers.read().clone();
        for entry in handlers {
            (entry.handler)(value);
        }
    }
}

impl<T: Clone + Send + Sync + 'static> StateCell<T> {
    /// Subscribe and get a guard that unsubscribes when dropped.
    pub fn watch<F>(self: &Arc<Self>, handler: F) -> Subscription<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.subscribe(handler);
        Subscription {
            cell: Arc::downgrade(self),
            id,
        }
    }
}

impl<T: Clone + Default + Send + Sync + 'static> Default for StateCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// RAII subscription: unsubscribes from its cell on drop.
///
/// Holds only a weak reference, so it never keeps the cell alive.
pub struct Subscription<T: Clone + Send + Sync + 'static> {
    cell: Weak<StateCell<T>>,
    id: SubscriptionId,
}

impl<T: Clone + Send + Sync + 'static> Subscription<T> {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(cell) = self.cell.upgrade() {
            cell.unsubscribe(self.id);
        }
    }
}
