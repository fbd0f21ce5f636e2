#![forbid(unsafe_code)]

//! Array field nodes: a resizable list of object children built from one
//! shared template.
//!
//! Element names use a per-array counter (`items[0]`, `items[1]`, ...) that
//! only ever grows, so a name is never reused after `remove` or `reset`.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use fform_reactive::{Store, Subscription};

use super::{ArrayState, ContainerState, ObjectField, patch};
use crate::schema::Fields;
use crate::snapshot;
use crate::validation::{ValidationContext, ValidationResult, Validator};
use crate::value::Value;

struct ArrayInner {
    name: String,
    validate: Validator,
    template: Rc<Fields>,
    initial_value: Value,
    initial_error: ValidationResult,
    next_id: Cell<u64>,
    store: Store<ArrayState>,
}

impl ArrayInner {
    fn element(&self, initial: &Value) -> ObjectField {
        build_element(&self.name, &self.next_id, &self.template, initial)
    }

    fn elements(&self, initial: &Value) -> Vec<ObjectField> {
        build_elements(&self.name, &self.next_id, &self.template, initial)
    }
}

fn build_element(name: &str, next_id: &Cell<u64>, template: &Fields, initial: &Value) -> ObjectField {
    let id = next_id.get();
    next_id.set(id + 1);
    ObjectField::new(format!("{name}[{id}]"), initial, Validator::always_valid(), template)
}

fn build_elements(name: &str, next_id: &Cell<u64>, template: &Fields, initial: &Value) -> Vec<ObjectField> {
    initial
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|item| build_element(name, next_id, template, item))
                .collect()
        })
        .unwrap_or_default()
}

/// A node holding a list of object children.
#[derive(Clone)]
pub struct ArrayField {
    inner: Rc<ArrayInner>,
}

#[derive(Clone)]
pub struct WeakArrayField {
    inner: Weak<ArrayInner>,
}

impl ArrayField {
    /// Build one element per item of `initial` (none when it is not an
    /// array).
    pub fn new(name: impl Into<String>, initial: &Value, validate: Validator, template: &Rc<Fields>) -> Self {
        let name = name.into();
        let next_id = Cell::new(0);
        let children = build_elements(&name, &next_id, template, initial);
        let initial_value = snapshot::array_value(&children);
        let initial_error = validate.validate(&initial_value, &ValidationContext::default());
        let state = ContainerState::new(children, initial_error.clone());

        Self {
            inner: Rc::new(ArrayInner {
                name,
                validate,
                template: Rc::clone(template),
                initial_value,
                initial_error,
                next_id,
                store: Store::new(state),
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn state(&self) -> Rc<ArrayState> {
        self.inner.store.get()
    }

    /// Observe local state changes (children list, own error, submitted
    /// flag).
    pub fn subscribe_state(&self, listener: impl Fn(&ArrayState) + 'static) -> Subscription {
        self.inner.store.subscribe(move |new, _| listener(new))
    }

    #[must_use]
    pub fn children(&self) -> Rc<Vec<ObjectField>> {
        Rc::clone(&self.inner.store.get().children)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.store.get().children.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aggregated value of the elements.
    #[must_use]
    pub fn value(&self) -> Value {
        snapshot::array_value(&self.inner.store.get().children)
    }

    /// Append an element seeded with `initial` and return it.
    pub fn add(&self, initial: impl Into<Value>) -> ObjectField {
        let element = self.inner.element(&initial.into());
        let added = element.clone();
        let state = self.inner.store.update(move |current| {
            let mut children = Vec::with_capacity(current.children.len() + 1);
            children.extend(current.children.iter().cloned());
            children.push(added);
            Rc::new(ContainerState {
                children: Rc::new(children),
                error: current.error.clone(),
                is_submitted: current.is_submitted,
            })
        });
        tracing::trace!(
            message = "array.add",
            name = %self.inner.name,
            element = %element.name(),
            len = state.children.len()
        );
        element
    }

    /// Remove `element` (matched by identity). Returns whether it was a
    /// member.
    pub fn remove(&self, element: &ObjectField) -> bool {
        let mut removed = false;
        let state = self.inner.store.update(|current| {
            if !current.children.iter().any(|child| child.ptr_eq(element)) {
                return Rc::clone(current);
            }
            removed = true;
            let children: Vec<ObjectField> = current
                .children
                .iter()
                .filter(|child| !child.ptr_eq(element))
                .cloned()
                .collect();
            Rc::new(ContainerState {
                children: Rc::new(children),
                error: current.error.clone(),
                is_submitted: current.is_submitted,
            })
        });
        tracing::trace!(
            message = "array.remove",
            name = %self.inner.name,
            element = %element.name(),
            removed,
            len = state.children.len()
        );
        removed
    }

    /// Validate this node against its current value, then each element with
    /// this node's value appended to the ancestor chain.
    pub fn validate(&self, context: &ValidationContext) {
        let state = self.inner.store.get();
        let value = snapshot::array_value(&state.children);
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
        for child in state.children.iter() {
            child.validate(&child_context);
        }
    }

    pub fn set_submitted(&self, is_submitted: bool) {
        let state = self
            .inner
            .store
            .update(|current| patch(current, |s| s.is_submitted = is_submitted));
        for child in state.children.iter() {
            child.set_submitted(is_submitted);
        }
    }

    /// Replace the elements with fresh ones built from the original initial
    /// value.
    pub fn reset(&self) {
        let children = self.inner.elements(&self.inner.initial_value);
        self.inner.store.replace(Rc::new(ContainerState::new(
            children,
            self.inner.initial_error.clone(),
        )));
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakArrayField {
        WeakArrayField {
            inner: Rc::downgrade(&self.inner),
        }
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn store(&self) -> &Store<ArrayState> {
        &self.inner.store
    }
}

impl fmt::Debug for ArrayField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.store.get();
        f.debug_struct("ArrayField")
            .field("name", &self.inner.name)
            .field("len", &state.children.len())
            .field("error", &state.error)
            .finish()
    }
}

impl WeakArrayField {
    #[must_use]
    pub fn upgrade(&self) -> Option<ArrayField> {
        self.inner.upgrade().map(|inner| ArrayField { inner })
    }
}
