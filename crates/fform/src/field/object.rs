#![forbid(unsafe_code)]

//! Object field nodes: a fixed set of named children.

use std::fmt;
use std::rc::{Rc, Weak};

use fform_reactive::{Store, Subscription};

use super::{Children, FieldNode, ObjectState, child_name, patch};
use crate::schema::{Fields, normalize};
use crate::snapshot;
use crate::validation::{ValidationContext, Validator};
use crate::value::Value;

struct ObjectInner {
    name: String,
    validate: Validator,
    initial: Rc<ObjectState>,
    store: Store<ObjectState>,
}

/// A node with named children.
#[derive(Clone)]
pub struct ObjectField {
    inner: Rc<ObjectInner>,
}

#[derive(Clone)]
pub struct WeakObjectField {
    inner: Weak<ObjectInner>,
}

impl ObjectField {
    /// Build one child per declared field, each seeded from the matching key
    /// of `initial` (`null` when absent).
    pub fn new(name: impl Into<String>, initial: &Value, validate: Validator, fields: &Fields) -> Self {
        let name = name.into();
        let children: Children = fields
            .iter()
            .map(|(key, field)| {
                let seed = initial.get(key).unwrap_or(&Value::Null);
                let child = FieldNode::create(child_name(&name, key), seed, &normalize(field));
                (key.to_string(), child)
            })
            .collect();

        let value = snapshot::object_value(&children);
        let error = validate.validate(&value, &ValidationContext::default());
        let seeded = Rc::new(ObjectState::new(children, error));

        Self {
            inner: Rc::new(ObjectInner {
                name,
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
    pub fn state(&self) -> Rc<ObjectState> {
        self.inner.store.get()
    }

    /// Observe local state changes (own error, submitted flag).
    pub fn subscribe_state(&self, listener: impl Fn(&ObjectState) + 'static) -> Subscription {
        self.inner.store.subscribe(move |new, _| listener(new))
    }

    #[must_use]
    pub fn fields(&self) -> Rc<Children> {
        Rc::clone(&self.inner.store.get().children)
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<FieldNode> {
        self.inner.store.get().children.get(name).cloned()
    }

    /// Aggregated value of the children.
    #[must_use]
    pub fn value(&self) -> Value {
        snapshot::object_value(&self.inner.store.get().children)
    }

    /// Validate this node against its current value, then each child with
    /// this node's value appended to the ancestor chain.
    pub fn validate(&self, context: &ValidationContext) {
        let state = self.inner.store.get();
        let value = snapshot::object_value(&state.children);
        let error = self.inner.validate.validate(&value, context);
        if error != state.error {
            tracing::trace!(
                message = "field.error",
                name = %self.inner.name,
                invalid = error.is_some()
            );
            self.inner.store.update(|current| patch(current, |s| s.error = error));
        }

        let child_context = context.with_parent(value);
        for child in state.children.values() {
            child.validate(&child_context);
        }
    }

    pub fn set_submitted(&self, is_submitted: bool) {
        let state = self
            .inner
            .store
            .update(|current| patch(current, |s| s.is_submitted = is_submitted));
        for child in state.children.values() {
            child.set_submitted(is_submitted);
        }
    }

    pub fn reset(&self) {
        let initial = Rc::clone(&self.inner.initial);
        let state = self.inner.store.update(move |_| initial);
        for child in state.children.values() {
            child.reset();
        }
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakObjectField {
        WeakObjectField {
            inner: Rc::downgrade(&self.inner),
        }
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn store(&self) -> &Store<ObjectState> {
        &self.inner.store
    }
}

impl PartialEq for ObjectField {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.store.get();
        f.debug_struct("ObjectField")
            .field("name", &self.inner.name)
            .field("fields", &state.children.keys().collect::<Vec<_>>())
            .field("error", &state.error)
            .finish()
    }
}

impl WeakObjectField {
    #[must_use]
    pub fn upgrade(&self) -> Option<ObjectField> {
        self.inner.upgrade().map(|inner| ObjectField { inner })
    }
}
