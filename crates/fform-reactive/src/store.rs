#![forbid(unsafe_code)]

//! Observable single-value state cells.
//!
//! # Design
//!
//! [`Store<S>`] wraps an `Rc<S>` snapshot in shared, reference-counted
//! storage. The snapshot is never mutated in place: [`update`](Store::update)
//! hands the current snapshot to a reducer and stores whatever `Rc` the
//! reducer returns. Listeners are notified with `(new, old)` only when the
//! returned `Rc` is a different allocation than the current one.
//!
//! # Failure Modes
//!
//! - **Listener panics**: The snapshot has already been replaced; remaining
//!   listeners of that cycle are not called. The store stays usable.
//! - **Re-entrant update**: A listener may call `update` on the store that is
//!   notifying it. The nested update runs its own notification cycle to
//!   completion, and the outer cycle then stops: its remaining listeners were
//!   already called with the newer snapshot. The last `new` any listener
//!   receives is therefore always the current snapshot. The `old` half of a
//!   nested pair may be a snapshot the listener never saw.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::subscription::Subscription;

type Listener<S> = dyn Fn(&Rc<S>, &Rc<S>);

struct ListenerEntry<S> {
    id: u64,
    active: Cell<bool>,
    callback: Box<Listener<S>>,
}

struct StoreInner<S> {
    state: RefCell<Rc<S>>,
    listeners: RefCell<Vec<Rc<ListenerEntry<S>>>>,
    next_listener_id: Cell<u64>,
    version: Cell<u64>,
}

impl<S> StoreInner<S> {
    fn detach(&self, id: u64) {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(pos) = listeners.iter().position(|entry| entry.id == id) {
            let entry = listeners.remove(pos);
            entry.active.set(false);
        }
    }
}

/// A shared, observable cell holding one immutable snapshot.
///
/// Cloning a `Store` creates a new handle to the **same** cell.
pub struct Store<S> {
    inner: Rc<StoreInner<S>>,
}

/// Non-owning handle to a [`Store`], for use inside listener callbacks that
/// must not keep the store alive.
pub struct WeakStore<S> {
    inner: Weak<StoreInner<S>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S> Clone for WeakStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &*self.inner.state.borrow())
            .field("version", &self.inner.version.get())
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

impl<S: 'static> Store<S> {
    /// Create a store seeded with `initial`.
    pub fn new(initial: S) -> Self {
        Self::from_rc(Rc::new(initial))
    }

    /// Create a store seeded with an existing snapshot.
    pub fn from_rc(initial: Rc<S>) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                state: RefCell::new(initial),
                listeners: RefCell::new(Vec::new()),
                next_listener_id: Cell::new(0),
                version: Cell::new(0),
            }),
        }
    }

    /// The current snapshot.
    #[must_use]
    pub fn get(&self) -> Rc<S> {
        Rc::clone(&self.inner.state.borrow())
    }

    /// Apply `reducer` to the current snapshot and store its result.
    ///
    /// When the result is a different allocation than the current snapshot,
    /// every subscribed listener is called with `(new, old)` before this
    /// method returns. The reducer runs without any internal borrow held, so
    /// it may freely call [`get`](Self::get).
    pub fn update(&self, reducer: impl FnOnce(&Rc<S>) -> Rc<S>) -> Rc<S> {
        let old = self.get();
        let new = reducer(&old);
        if Rc::ptr_eq(&old, &new) {
            return new;
        }
        *self.inner.state.borrow_mut() = Rc::clone(&new);
        self.inner.version.set(self.inner.version.get() + 1);
        self.notify(&new, &old);
        new
    }

    /// Replace the snapshot outright. Equivalent to `update(|_| next)`.
    pub fn replace(&self, next: Rc<S>) -> Rc<S> {
        self.update(move |_| next)
    }

    /// Register a listener called with `(new, old)` on every change.
    pub fn subscribe(&self, listener: impl Fn(&Rc<S>, &Rc<S>) + 'static) -> Subscription {
        let id = self.inner.next_listener_id.get();
        self.inner.next_listener_id.set(id + 1);
        self.inner.listeners.borrow_mut().push(Rc::new(ListenerEntry {
            id,
            active: Cell::new(true),
            callback: Box::new(listener),
        }));

        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.detach(id);
            }
        })
    }

    /// Number of snapshot replacements since creation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Number of currently attached listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Whether two handles refer to the same cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Create a non-owning handle.
    #[must_use]
    pub fn downgrade(&self) -> WeakStore<S> {
        WeakStore {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn notify(&self, new: &Rc<S>, old: &Rc<S>) {
        // Iterate over a copy: listeners may subscribe or unsubscribe while
        // being notified.
        let listeners: Vec<Rc<ListenerEntry<S>>> = self.inner.listeners.borrow().clone();
        tracing::trace!(
            message = "store.notify",
            version = self.inner.version.get(),
            listeners = listeners.len()
        );
        let cycle = self.inner.version.get();
        for entry in listeners {
            if self.inner.version.get() != cycle {
                tracing::trace!(message = "store.notify.superseded", version = cycle);
                break;
            }
            if entry.active.get() {
                (entry.callback)(new, old);
            }
        }
    }
}

impl<S: 'static> WeakStore<S> {
    /// Recover the store if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Store<S>> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
