#![forbid(unsafe_code)]

//! The form root.
//!
//! A [`Form`] owns the root object node, keeps the whole tree validated and
//! dispatches submissions.
//!
//! # Invariants
//!
//! 1. After `create`, `reset` and every value change, each node's error
//!    reflects a top-down validation pass over the current form value.
//! 2. A validation pass only touches errors, so it never triggers another
//!    pass.
//! 3. `submit` always reaches the handler, valid or not.
//! 4. `reset` runs exactly one validation pass, after every node is back in
//!    its initial state. Subscribers never see errors computed against a
//!    partly reset tree.
//!
//! # Example
//!
//! ```
//! use fform::{Form, FormOptions};
//! use fform::schema::Fields;
//! use fform::validation::{min, number, required};
//! use serde_json::json;
//!
//! let fields = Fields::new()
//!     .field("name", required())
//!     .field("age", vec![number(), min(18.0)]);
//! let form = Form::create(FormOptions::new(fields).initial_values(json!({"name": "", "age": 20})));
//! assert!(form.snapshot().invalid);
//!
//! let name = form.field("name").unwrap();
//! name.try_basic().unwrap().on_change("Ann");
//! assert!(!form.snapshot().invalid);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use fform_reactive::Subscription;

use crate::error::{FormError, Result};
use crate::field::{FieldNode, ObjectField};
use crate::schema::Fields;
use crate::snapshot::{self, Snapshot};
use crate::validation::{ValidationContext, Validator, compose};
use crate::value::Value;

/// Handler invoked with the aggregated snapshot on submit.
pub type SubmitHandler = Rc<dyn Fn(&Snapshot)>;

/// Identifier of a form instance, used to derive element ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormId(String);

impl FormId {
    /// A fresh random (UUID v4) identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FormId {
    fn default() -> Self {
        Self::random()
    }
}

impl From<&str> for FormId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for FormId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything needed to build a [`Form`].
#[derive(Clone)]
pub struct FormOptions {
    pub(crate) fields: Fields,
    pub(crate) initial_values: Value,
    pub(crate) validate: Vec<Validator>,
    pub(crate) on_submit: Option<SubmitHandler>,
    pub(crate) id: Option<FormId>,
}

impl FormOptions {
    #[must_use]
    pub fn new(fields: Fields) -> Self {
        Self {
            fields,
            initial_values: Value::Null,
            validate: Vec::new(),
            on_submit: None,
            id: None,
        }
    }

    /// Seed values, keyed like the schema. Missing keys start as `null`.
    #[must_use]
    pub fn initial_values(mut self, values: impl Into<Value>) -> Self {
        self.initial_values = values.into();
        self
    }

    /// Rules for the form as a whole, run against the full form value.
    #[must_use]
    pub fn validate(mut self, rules: impl IntoIterator<Item = Validator>) -> Self {
        self.validate = rules.into_iter().collect();
        self
    }

    #[must_use]
    pub fn on_submit(mut self, handler: impl Fn(&Snapshot) + 'static) -> Self {
        self.on_submit = Some(Rc::new(handler));
        self
    }

    /// Use a caller-chosen id instead of a random one.
    #[must_use]
    pub fn id(mut self, id: impl Into<FormId>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl fmt::Debug for FormOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormOptions")
            .field("fields", &self.fields)
            .field("initial_values", &self.initial_values)
            .field("validate", &self.validate)
            .field("on_submit", &self.on_submit.is_some())
            .field("id", &self.id)
            .finish()
    }
}

/// A native submit event whose default action can be suppressed.
pub trait SubmitEvent {
    fn prevent_default(&mut self);
}

/// A live form.
pub struct Form {
    id: FormId,
    root: ObjectField,
    on_submit: RefCell<Option<SubmitHandler>>,
    paused: Rc<Cell<bool>>,
    _revalidate: Subscription,
}

/// Suppresses revalidation until dropped.
struct PauseGuard<'a>(&'a Cell<bool>);

impl<'a> PauseGuard<'a> {
    fn new(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for PauseGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Form {
    /// Build the field tree, validate it once and keep it validated.
    #[must_use]
    pub fn create(options: FormOptions) -> Self {
        let FormOptions {
            fields,
            initial_values,
            validate,
            on_submit,
            id,
        } = options;
        let id = id.unwrap_or_else(FormId::random);
        let root = ObjectField::new("", &initial_values, compose(validate), &fields);
        tracing::debug!(message = "form.create", form_id = %id, fields = fields.len());

        validate_tree(&id, &root);

        let weak_root = root.downgrade();
        let pass_id = id.clone();
        let paused = Rc::new(Cell::new(false));
        let listener_paused = Rc::clone(&paused);
        let revalidate = snapshot::subscribe_value(&FieldNode::Object(root.clone()), move |_| {
            if listener_paused.get() {
                return;
            }
            if let Some(root) = weak_root.upgrade() {
                validate_tree(&pass_id, &root);
            }
        });

        Self {
            id,
            root,
            on_submit: RefCell::new(on_submit),
            paused,
            _revalidate: revalidate,
        }
    }

    #[must_use]
    pub fn id(&self) -> &FormId {
        &self.id
    }

    #[must_use]
    pub fn root(&self) -> &ObjectField {
        &self.root
    }

    /// The root as a generic node.
    #[must_use]
    pub fn node(&self) -> FieldNode {
        FieldNode::Object(self.root.clone())
    }

    /// Resolve a node by its full name (`address.city`, `items[3].title`).
    pub fn field(&self, name: &str) -> Result<FieldNode> {
        self.node()
            .find(name)
            .ok_or_else(|| FormError::unknown_field(name))
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        snapshot::get(&self.node())
    }

    #[must_use]
    pub fn value(&self) -> Value {
        self.root.value()
    }

    /// Run a full validation pass now.
    pub fn validate(&self) {
        validate_tree(&self.id, &self.root);
    }

    /// Observe the whole form.
    pub fn subscribe(&self, listener: impl Fn(&Snapshot) + 'static) -> Subscription {
        snapshot::subscribe(&self.node(), listener)
    }

    pub fn set_on_submit(&self, handler: impl Fn(&Snapshot) + 'static) {
        self.replace_on_submit(Some(Rc::new(handler)));
    }

    pub(crate) fn replace_on_submit(&self, handler: Option<SubmitHandler>) {
        *self.on_submit.borrow_mut() = handler;
    }

    /// A document-unique id for `node`: `"{form_id}-{node_name}"`.
    #[must_use]
    pub fn element_id(&self, node: &FieldNode) -> String {
        format!("{}-{}", self.id, node.name())
    }

    /// Mark the tree submitted and hand the snapshot to the submit handler.
    pub fn submit(&self) -> Snapshot {
        self.root.set_submitted(true);
        let snapshot = self.snapshot();
        tracing::debug!(
            message = "form.submit",
            form_id = %self.id,
            invalid = snapshot.invalid
        );
        let handler = self.on_submit.borrow().clone();
        if let Some(handler) = handler {
            handler(&snapshot);
        }
        snapshot
    }

    /// [`Form::submit`] for a native event, suppressing its default action.
    pub fn submit_event(&self, event: &mut impl SubmitEvent) -> Snapshot {
        event.prevent_default();
        self.submit()
    }

    /// Restore every node to its initial state and revalidate.
    pub fn reset(&self) {
        {
            let _pause = PauseGuard::new(&self.paused);
            self.root.reset();
        }
        validate_tree(&self.id, &self.root);
        tracing::debug!(message = "form.reset", form_id = %self.id);
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("id", &self.id)
            .field("root", &self.root)
            .finish()
    }
}

fn validate_tree(id: &FormId, root: &ObjectField) {
    let _span = tracing::debug_span!("form.validate", form_id = %id).entered();
    root.validate(&ValidationContext::new(root.value()));
}
