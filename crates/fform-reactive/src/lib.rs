#![forbid(unsafe_code)]

//! Reactive state cells for FrankenForms.
//!
//! This crate provides the change-tracking primitives the form engine is
//! built on:
//!
//! - [`Store`]: A shared cell holding one immutable `Rc<S>` snapshot, with
//!   change notification via subscriber callbacks.
//! - [`Subscription`]: RAII guard that unsubscribes on drop, or explicitly
//!   through the idempotent [`Subscription::unsubscribe`].
//!
//! # Architecture
//!
//! `Store<S>` uses `Rc<..>` for single-threaded shared ownership. A change is
//! detected by allocation identity (`Rc::ptr_eq`), never by deep comparison:
//! a reducer that wants to signal "nothing changed" returns the `Rc` it was
//! given.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per update that replaces the snapshot.
//! 2. Subscribers are notified in registration order, synchronously, before
//!    `update` returns.
//! 3. Returning the current snapshot from a reducer is a no-op (no version
//!    bump, no notifications).
//! 4. A listener removed during a notification cycle is not called for the
//!    rest of that cycle; a listener added during a cycle is called from the
//!    next cycle on.
//! 5. Unsubscribing is idempotent and safe after the store was dropped.

pub mod store;
pub mod subscription;

pub use store::{Store, WeakStore};
pub use subscription::Subscription;
