#![forbid(unsafe_code)]

//! Validation composition.
//!
//! A field's declared validation (one rule, a list of rules, or nothing) is
//! normalized into a single [`Validator`] with a uniform signature:
//! `(value, context) -> ValidationResult`.
//!
//! # Invariants
//!
//! 1. Composed rules run in declaration order.
//! 2. The first rule that reports a [`Message`] short-circuits; later rules
//!    are never invoked.
//! 3. Composing zero rules yields a validator that always passes.
//! 4. Validators only read: they receive ancestor values by value and never
//!    see the live tree.

pub mod rules;

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::value::Value;

pub use rules::{
    email, if_form_has_value, if_parent_has_value, max, max_length, message, min, min_length,
    number, optional, required,
};

/// A structured validation failure, rendered by the UI through its `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

impl Message {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_param(mut self, param: impl Into<Value>) -> Self {
        self.params.push(param.into());
        self
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self.params.iter().map(Value::to_string).collect();
            write!(f, "({})", params.join(", "))?;
        }
        Ok(())
    }
}

/// `None` when valid.
pub type ValidationResult = Option<Message>;

/// What a validator may know about the rest of the form.
///
/// `form` is the whole form value at the start of the validation pass;
/// `parents` holds the values of the node's ancestors, closest last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationContext {
    form: Rc<Value>,
    parents: Vec<Rc<Value>>,
}

impl ValidationContext {
    /// Context for a validation pass over a form whose value is `form`.
    #[must_use]
    pub fn new(form: Value) -> Self {
        Self {
            form: Rc::new(form),
            parents: Vec::new(),
        }
    }

    #[must_use]
    pub fn form(&self) -> &Value {
        &self.form
    }

    /// Ancestor values, outermost first.
    pub fn parents(&self) -> impl DoubleEndedIterator<Item = &Value> + ExactSizeIterator {
        self.parents.iter().map(|parent| &**parent)
    }

    /// The closest ancestor value.
    #[must_use]
    pub fn parent(&self) -> Option<&Value> {
        self.parents.last().map(|parent| &**parent)
    }

    /// The context seen by the children of a node whose value is `value`.
    #[must_use]
    pub fn with_parent(&self, value: Value) -> Self {
        let mut parents = self.parents.clone();
        parents.push(Rc::new(value));
        Self {
            form: Rc::clone(&self.form),
            parents,
        }
    }
}

/// A validation rule.
///
/// Closures `Fn(&Value, &ValidationContext) -> ValidationResult` implement
/// this trait, so do the rule structs in [`rules`].
pub trait Validate {
    fn validate(&self, value: &Value, context: &ValidationContext) -> ValidationResult;
}

impl<F> Validate for F
where
    F: Fn(&Value, &ValidationContext) -> ValidationResult,
{
    fn validate(&self, value: &Value, context: &ValidationContext) -> ValidationResult {
        self(value, context)
    }
}

/// Shared handle to a rule. Cloning is cheap; equality is identity.
#[derive(Clone)]
pub struct Validator {
    rule: Rc<dyn Validate>,
}

impl Validator {
    /// Wrap a rule value.
    pub fn new(rule: impl Validate + 'static) -> Self {
        Self {
            rule: Rc::new(rule),
        }
    }

    /// Wrap a closure.
    pub fn from_fn(
        f: impl Fn(&Value, &ValidationContext) -> ValidationResult + 'static,
    ) -> Self {
        Self::new(f)
    }

    /// The validator that accepts everything.
    #[must_use]
    pub fn always_valid() -> Self {
        optional()
    }

    pub fn validate(&self, value: &Value, context: &ValidationContext) -> ValidationResult {
        self.rule.validate(value, context)
    }
}

impl PartialEq for Validator {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.rule), Rc::as_ptr(&other.rule))
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validator({:p})", Rc::as_ptr(&self.rule))
    }
}

struct Composed(Vec<Validator>);

impl Validate for Composed {
    fn validate(&self, value: &Value, context: &ValidationContext) -> ValidationResult {
        self.0.iter().find_map(|v| v.validate(value, context))
    }
}

/// Fold a list of validators into one, first failure wins.
pub fn compose(validators: impl IntoIterator<Item = Validator>) -> Validator {
    let mut validators: Vec<Validator> = validators.into_iter().collect();
    match validators.len() {
        0 => Validator::always_valid(),
        1 => validators.remove(0),
        _ => Validator::new(Composed(validators)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn empty_composition_is_always_valid() {
        let v = compose(Vec::new());
        assert_eq!(v.validate(&json!(null), &ValidationContext::default()), None);
        assert_eq!(v.validate(&json!("x"), &ValidationContext::default()), None);
    }

    #[test]
    fn first_failure_short_circuits() {
        let calls = Rc::new(Cell::new(0u32));
        let calls_clone = Rc::clone(&calls);
        let v1 = Validator::from_fn(|_, _| Some(Message::new("first")));
        let v2 = Validator::from_fn(move |_, _| {
            calls_clone.set(calls_clone.get() + 1);
            Some(Message::new("second"))
        });

        let composed = compose([v1, v2]);
        let result = composed.validate(&json!(1), &ValidationContext::default());
        assert_eq!(result, Some(Message::new("first")));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn later_rule_reports_when_earlier_pass() {
        let composed = compose([
            Validator::from_fn(|_, _| None),
            Validator::from_fn(|v, _| v.is_null().then(|| Message::new("missing"))),
        ]);
        assert_eq!(
            composed.validate(&json!(null), &ValidationContext::default()),
            Some(Message::new("missing"))
        );
        assert_eq!(composed.validate(&json!(1), &ValidationContext::default()), None);
    }

    #[test]
    fn single_rule_composition_keeps_identity() {
        let v = Validator::from_fn(|_, _| None);
        assert_eq!(compose([v.clone()]), v);
    }

    #[test]
    fn context_parents_closest_last() {
        let ctx = ValidationContext::new(json!({"a": 1}))
            .with_parent(json!("outer"))
            .with_parent(json!("inner"));
        assert_eq!(ctx.form(), &json!({"a": 1}));
        assert_eq!(ctx.parent(), Some(&json!("inner")));
        let parents: Vec<&Value> = ctx.parents().collect();
        assert_eq!(parents, vec![&json!("outer"), &json!("inner")]);
    }

    #[test]
    fn message_display_and_serde() {
        let m = Message::new("min").with_param(18);
        assert_eq!(m.to_string(), "min(18)");
        assert_eq!(
            serde_json::to_value(&m).expect("serialize"),
            json!({"id": "min", "params": [18]})
        );
    }

    #[test]
    fn validator_equality_is_identity() {
        let a = Validator::from_fn(|_, _| None);
        let b = Validator::from_fn(|_, _| None);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
