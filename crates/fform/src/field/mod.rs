#![forbid(unsafe_code)]

//! The live field tree.
//!
//! A [`FieldNode`] is one of three variants, each owning a [`Store`] for its
//! local state:
//!
//! - [`BasicField`]: a scalar input with value, error and interaction flags.
//! - [`ObjectField`]: a fixed set of named children plus its own error.
//! - [`ArrayField`]: an ordered, resizable list of object children built from
//!   one shared template, plus its own error.
//!
//! Aggregated values and errors are never stored on containers; they are
//! computed on demand by [`crate::snapshot`].
//!
//! # Invariants
//!
//! 1. Only a node mutates its own store.
//! 2. Children collections are copy-on-write: a structural change always
//!    replaces the `Rc` holding them, so "did children change" is
//!    `Rc::ptr_eq`.
//! 3. Reducers return the current snapshot when nothing changed, so no-op
//!    mutations do not notify.
//! 4. Node names are unique within a tree at any instant.
//!
//! [`Store`]: fform_reactive::Store

pub mod array;
pub mod basic;
pub mod object;

use std::fmt;
use std::rc::Rc;

use fform_reactive::Subscription;
use indexmap::IndexMap;

use crate::error::{FormError, Result};
use crate::schema::CanonicalField;
use crate::snapshot::{self, Snapshot};
use crate::validation::{ValidationContext, ValidationResult};
use crate::value::Value;

pub use array::{ArrayField, WeakArrayField};
pub use basic::{BasicField, WeakBasicField};
pub use object::{ObjectField, WeakObjectField};

/// Variant tag of a node. Immutable for the node's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Basic,
    Object,
    Array,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Basic => "basic",
            Self::Object => "object",
            Self::Array => "array",
        })
    }
}

/// Local state of a basic node.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldState {
    pub value: Value,
    pub error: ValidationResult,
    pub is_submitted: bool,
    pub is_visited: bool,
    pub has_focus: bool,
}

impl FieldState {
    #[must_use]
    pub fn new(value: Value, error: ValidationResult) -> Self {
        Self {
            value,
            error,
            is_submitted: false,
            is_visited: false,
            has_focus: false,
        }
    }

    #[must_use]
    pub fn invalid(&self) -> bool {
        self.error.is_some()
    }

    /// Whether the UI should display the error right now.
    #[must_use]
    pub fn show_error(&self) -> bool {
        self.invalid() && !self.has_focus && (self.is_visited || self.is_submitted)
    }
}

/// Local state of a container node. `error` is the node's own validator
/// result only.
#[derive(Debug)]
pub struct ContainerState<C> {
    pub children: Rc<C>,
    pub error: ValidationResult,
    pub is_submitted: bool,
}

impl<C> ContainerState<C> {
    #[must_use]
    pub fn new(children: C, error: ValidationResult) -> Self {
        Self {
            children: Rc::new(children),
            error,
            is_submitted: false,
        }
    }

    /// Own validity, children not included.
    #[must_use]
    pub fn invalid(&self) -> bool {
        self.error.is_some()
    }
}

impl<C> Clone for ContainerState<C> {
    fn clone(&self) -> Self {
        Self {
            children: Rc::clone(&self.children),
            error: self.error.clone(),
            is_submitted: self.is_submitted,
        }
    }
}

impl<C> PartialEq for ContainerState<C> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.children, &other.children)
            && self.error == other.error
            && self.is_submitted == other.is_submitted
    }
}

/// Named children of an object node, in declaration order.
pub type Children = IndexMap<String, FieldNode>;

pub type ObjectState = ContainerState<Children>;
pub type ArrayState = ContainerState<Vec<ObjectField>>;

/// Apply `edit` to a copy of `current`; hand back `current` itself when the
/// edit changed nothing.
pub(crate) fn patch<S: Clone + PartialEq>(current: &Rc<S>, edit: impl FnOnce(&mut S)) -> Rc<S> {
    let mut next = S::clone(current);
    edit(&mut next);
    if next == **current {
        Rc::clone(current)
    } else {
        Rc::new(next)
    }
}

pub(crate) fn child_name(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

/// A node of the live form tree.
///
/// Cloning yields another handle to the same node; equality is identity.
#[derive(Clone)]
pub enum FieldNode {
    Basic(BasicField),
    Object(ObjectField),
    Array(ArrayField),
}

/// Non-owning handle to a [`FieldNode`].
#[derive(Clone)]
pub enum WeakFieldNode {
    Basic(WeakBasicField),
    Object(WeakObjectField),
    Array(WeakArrayField),
}

impl FieldNode {
    /// Build the node for `field` (and, recursively, its children) against
    /// `initial`.
    pub fn create(name: impl Into<String>, initial: &Value, field: &CanonicalField) -> Self {
        let name = name.into();
        match field {
            CanonicalField::Basic { validate } => {
                Self::Basic(BasicField::new(name, initial, validate.clone()))
            }
            CanonicalField::Object { validate, fields } => {
                Self::Object(ObjectField::new(name, initial, validate.clone(), fields))
            }
            CanonicalField::Array { validate, fields } => {
                Self::Array(ArrayField::new(name, initial, validate.clone(), fields))
            }
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Basic(field) => field.name(),
            Self::Object(field) => field.name(),
            Self::Array(field) => field.name(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Basic(_) => FieldKind::Basic,
            Self::Object(_) => FieldKind::Object,
            Self::Array(_) => FieldKind::Array,
        }
    }

    /// Run this node's validator and then its descendants'.
    pub fn validate(&self, context: &ValidationContext) {
        match self {
            Self::Basic(field) => field.validate(context),
            Self::Object(field) => field.validate(context),
            Self::Array(field) => field.validate(context),
        }
    }

    /// Mark this node and all descendants (un)submitted.
    pub fn set_submitted(&self, is_submitted: bool) {
        match self {
            Self::Basic(field) => field.set_submitted(is_submitted),
            Self::Object(field) => field.set_submitted(is_submitted),
            Self::Array(field) => field.set_submitted(is_submitted),
        }
    }

    /// Restore this node and all descendants to their initial state.
    pub fn reset(&self) {
        match self {
            Self::Basic(field) => field.reset(),
            Self::Object(field) => field.reset(),
            Self::Array(field) => field.reset(),
        }
    }

    /// Aggregated value.
    #[must_use]
    pub fn value(&self) -> Value {
        snapshot::value(self)
    }

    /// Aggregated `{value, error, invalid}`.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        snapshot::get(self)
    }

    /// See [`snapshot::subscribe`].
    pub fn subscribe(&self, listener: impl Fn(&Snapshot) + 'static) -> Subscription {
        snapshot::subscribe(self, listener)
    }

    /// See [`snapshot::subscribe_value`].
    pub fn subscribe_value(&self, listener: impl Fn(&Value) + 'static) -> Subscription {
        snapshot::subscribe_value(self, listener)
    }

    #[must_use]
    pub fn as_basic(&self) -> Option<&BasicField> {
        match self {
            Self::Basic(field) => Some(field),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectField> {
        match self {
            Self::Object(field) => Some(field),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&ArrayField> {
        match self {
            Self::Array(field) => Some(field),
            _ => None,
        }
    }

    pub fn try_basic(&self) -> Result<&BasicField> {
        self.as_basic().ok_or_else(|| self.mismatch(FieldKind::Basic))
    }

    pub fn try_object(&self) -> Result<&ObjectField> {
        self.as_object().ok_or_else(|| self.mismatch(FieldKind::Object))
    }

    pub fn try_array(&self) -> Result<&ArrayField> {
        self.as_array().ok_or_else(|| self.mismatch(FieldKind::Array))
    }

    fn mismatch(&self, expected: FieldKind) -> FormError {
        FormError::KindMismatch {
            name: self.name().to_string(),
            expected,
            actual: self.kind(),
        }
    }

    /// Depth-first search for the node called `name`, this node included.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<FieldNode> {
        if self.name() == name {
            return Some(self.clone());
        }
        match self {
            Self::Basic(_) => None,
            Self::Object(field) => field.fields().values().find_map(|child| child.find(name)),
            Self::Array(field) => field
                .children()
                .iter()
                .find_map(|child| FieldNode::Object(child.clone()).find(name)),
        }
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakFieldNode {
        match self {
            Self::Basic(field) => WeakFieldNode::Basic(field.downgrade()),
            Self::Object(field) => WeakFieldNode::Object(field.downgrade()),
            Self::Array(field) => WeakFieldNode::Array(field.downgrade()),
        }
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Basic(a), Self::Basic(b)) => a.ptr_eq(b),
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Array(a), Self::Array(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl PartialEq for FieldNode {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for FieldNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldNode")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .finish()
    }
}

impl From<BasicField> for FieldNode {
    fn from(field: BasicField) -> Self {
        Self::Basic(field)
    }
}

impl From<ObjectField> for FieldNode {
    fn from(field: ObjectField) -> Self {
        Self::Object(field)
    }
}

impl From<ArrayField> for FieldNode {
    fn from(field: ArrayField) -> Self {
        Self::Array(field)
    }
}

impl WeakFieldNode {
    #[must_use]
    pub fn upgrade(&self) -> Option<FieldNode> {
        match self {
            Self::Basic(field) => field.upgrade().map(FieldNode::Basic),
            Self::Object(field) => field.upgrade().map(FieldNode::Object),
            Self::Array(field) => field.upgrade().map(FieldNode::Array),
        }
    }
}
