#![forbid(unsafe_code)]

//! Scalar field nodes.
//!
//! State machine: `on_focus` sets focus and visited, `on_blur` clears focus,
//! `on_change` replaces the value, `set_submitted` sets the submitted flag,
//! `reset` restores the seeded state. `on_change` does not revalidate; the
//! owning form's validation pass does.

use std::fmt;
use std::rc::{Rc, Weak};

use fform_reactive::{Store, Subscription};

use super::{FieldState, patch};
use crate::validation::{ValidationContext, Validator};
use crate::value::{ChangeInput, Value};

struct BasicInner {
    name: String,
    validate: Validator,
    initial: Rc<FieldState>,
    store: Store<FieldState>,
}

/// A scalar input node.
#[derive(Clone)]
pub struct BasicField {
    inner: Rc<BasicInner>,
}

#[derive(Clone)]
pub struct WeakBasicField {
    inner: Weak<BasicInner>,
}

impl BasicField {
    /// Seed a node with `initial` and the error `validate` reports for it
    /// outside of any form context.
    pub fn new(name: impl Into<String>, initial: &Value, validate: Validator) -> Self {
        let error = validate.validate(initial, &ValidationContext::default());
        let seeded = Rc::new(FieldState::new(initial.clone(), error));
        Self {
            inner: Rc::new(BasicInner {
                name: name.into(),
                validate,
                store: Store::from_rc(Rc::clone(&seeded)),
                initial: seeded,
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn state(&self) -> Rc<FieldState> {
        self.inner.store.get()
    }

    #[must_use]
    pub fn value(&self) -> Value {
        self.inner.store.get().value.clone()
    }

    /// Observe local state changes.
    pub fn subscribe_state(&self, listener: impl Fn(&FieldState) + 'static) -> Subscription {
        self.inner.store.subscribe(move |new, _| listener(new))
    }

    pub fn on_focus(&self) {
        self.edit(|s| {
            s.has_focus = true;
            s.is_visited = true;
        });
    }

    pub fn on_blur(&self) {
        self.edit(|s| s.has_focus = false);
    }

    /// Accepts a raw value or an event-like object.
    pub fn on_change(&self, input: impl Into<ChangeInput>) {
        let value = input.into().into_value();
        self.edit(move |s| s.value = value);
    }

    pub fn validate(&self, context: &ValidationContext) {
        let current = self.inner.store.get();
        let error = self.inner.validate.validate(&current.value, context);
        if error == current.error {
            return;
        }
        tracing::trace!(
            message = "field.error",
            name = %self.inner.name,
            invalid = error.is_some()
        );
        self.edit(move |s| s.error = error);
    }

    pub fn set_submitted(&self, is_submitted: bool) {
        self.edit(|s| s.is_submitted = is_submitted);
    }

    pub fn reset(&self) {
        let initial = Rc::clone(&self.inner.initial);
        self.inner.store.update(move |_| initial);
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakBasicField {
        WeakBasicField {
            inner: Rc::downgrade(&self.inner),
        }
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn store(&self) -> &Store<FieldState> {
        &self.inner.store
    }

    fn edit(&self, edit: impl FnOnce(&mut FieldState)) {
        self.inner.store.update(|current| patch(current, edit));
    }
}

impl fmt::Debug for BasicField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicField")
            .field("name", &self.inner.name)
            .field("state", &*self.inner.store.get())
            .finish()
    }
}

impl WeakBasicField {
    #[must_use]
    pub fn upgrade(&self) -> Option<BasicField> {
        self.inner.upgrade().map(|inner| BasicField { inner })
    }
}
