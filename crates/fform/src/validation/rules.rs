#![forbid(unsafe_code)]

//! Built-in validation rules.
//!
//! Parameterless rules are shared per thread, so `required()` returns the
//! same [`Validator`] every time and schemas built from them compare equal.

use std::sync::LazyLock;

use regex::Regex;

use super::{Message, Validate, ValidationContext, ValidationResult, Validator};
use crate::value::{Value, from_number, is_truthy, length, to_number};

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".+@.+\..+").expect("email pattern is valid"));

thread_local! {
    static OPTIONAL: Validator = Validator::new(Optional);
    static REQUIRED: Validator = Validator::new(Required);
    static NUMBER: Validator = Validator::new(Number);
    static EMAIL_RULE: Validator = Validator::new(Email);
}

/// Build a [`Message`] from an id and its parameters.
pub fn message(id: impl Into<String>, params: impl IntoIterator<Item = Value>) -> Message {
    Message {
        id: id.into(),
        params: params.into_iter().collect(),
    }
}

/// Accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Optional;

impl Validate for Optional {
    fn validate(&self, _: &Value, _: &ValidationContext) -> ValidationResult {
        None
    }
}

/// Fails with `required` on falsy values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Required;

impl Validate for Required {
    fn validate(&self, value: &Value, _: &ValidationContext) -> ValidationResult {
        (!is_truthy(value)).then(|| Message::new("required"))
    }
}

/// Fails with `number` unless the value is a JSON number.
#[derive(Debug, Clone, Copy, Default)]
pub struct Number;

impl Validate for Number {
    fn validate(&self, value: &Value, _: &ValidationContext) -> ValidationResult {
        (!value.is_number()).then(|| Message::new("number"))
    }
}

/// Fails with `email` on set values that do not look like an address.
#[derive(Debug, Clone, Copy, Default)]
pub struct Email;

impl Validate for Email {
    fn validate(&self, value: &Value, _: &ValidationContext) -> ValidationResult {
        if !is_truthy(value) {
            return None;
        }
        let matches = match value {
            Value::String(s) => EMAIL.is_match(s),
            other => EMAIL.is_match(&other.to_string()),
        };
        (!matches).then(|| Message::new("email"))
    }
}

/// Fails with `min` when the numeric reading is below the bound.
#[derive(Debug, Clone, Copy)]
pub struct Min(pub f64);

impl Validate for Min {
    fn validate(&self, value: &Value, _: &ValidationContext) -> ValidationResult {
        to_number(value)
            .is_some_and(|n| n < self.0)
            .then(|| Message::new("min").with_param(from_number(self.0)))
    }
}

/// Fails with `max` when the numeric reading is above the bound.
#[derive(Debug, Clone, Copy)]
pub struct Max(pub f64);

impl Validate for Max {
    fn validate(&self, value: &Value, _: &ValidationContext) -> ValidationResult {
        to_number(value)
            .is_some_and(|n| n > self.0)
            .then(|| Message::new("max").with_param(from_number(self.0)))
    }
}

/// Fails with `minLength` when a string or array is too short.
#[derive(Debug, Clone, Copy)]
pub struct MinLength(pub usize);

impl Validate for MinLength {
    fn validate(&self, value: &Value, _: &ValidationContext) -> ValidationResult {
        length(value)
            .is_some_and(|len| len < self.0)
            .then(|| Message::new("minLength").with_param(self.0))
    }
}

/// Fails with `maxLength` when a string or array is too long.
#[derive(Debug, Clone, Copy)]
pub struct MaxLength(pub usize);

impl Validate for MaxLength {
    fn validate(&self, value: &Value, _: &ValidationContext) -> ValidationResult {
        length(value)
            .is_some_and(|len| len > self.0)
            .then(|| Message::new("maxLength").with_param(self.0))
    }
}

pub fn optional() -> Validator {
    OPTIONAL.with(Validator::clone)
}

pub fn required() -> Validator {
    REQUIRED.with(Validator::clone)
}

pub fn number() -> Validator {
    NUMBER.with(Validator::clone)
}

pub fn email() -> Validator {
    EMAIL_RULE.with(Validator::clone)
}

pub fn min(bound: f64) -> Validator {
    Validator::new(Min(bound))
}

pub fn max(bound: f64) -> Validator {
    Validator::new(Max(bound))
}

pub fn min_length(bound: usize) -> Validator {
    Validator::new(MinLength(bound))
}

pub fn max_length(bound: usize) -> Validator {
    Validator::new(MaxLength(bound))
}

/// Run `rule` only when `predicate` holds for the whole form value.
pub fn if_form_has_value(predicate: impl Fn(&Value) -> bool + 'static, rule: Validator) -> Validator {
    Validator::from_fn(move |value, context| {
        if predicate(context.form()) {
            rule.validate(value, context)
        } else {
            None
        }
    })
}

/// Run `rule` only when `predicate` holds for the closest ancestor value
/// (`null` when there is none).
pub fn if_parent_has_value(
    predicate: impl Fn(&Value) -> bool + 'static,
    rule: Validator,
) -> Validator {
    Validator::from_fn(move |value, context| {
        let parent = context.parent().unwrap_or(&Value::Null);
        if predicate(parent) {
            rule.validate(value, context)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(v: &Validator, value: Value) -> Option<String> {
        v.validate(&value, &ValidationContext::default())
            .map(|m| m.to_string())
    }

    #[test]
    fn required_rejects_falsy() {
        assert_eq!(check(&required(), json!("")), Some("required".into()));
        assert_eq!(check(&required(), json!(null)), Some("required".into()));
        assert_eq!(check(&required(), json!(false)), Some("required".into()));
        assert_eq!(check(&required(), json!("Ann")), None);
    }

    #[test]
    fn number_only_accepts_json_numbers() {
        assert_eq!(check(&number(), json!("20")), Some("number".into()));
        assert_eq!(check(&number(), json!("")), Some("number".into()));
        assert_eq!(check(&number(), json!(20)), None);
        assert_eq!(check(&number(), json!(2.5)), None);
    }

    #[test]
    fn min_and_max_bounds() {
        assert_eq!(check(&min(18.0), json!(17)), Some("min(18)".into()));
        assert_eq!(check(&min(18.0), json!(18)), None);
        assert_eq!(check(&max(10.0), json!("11")), Some("max(10)".into()));
        assert_eq!(check(&max(10.0), json!("ten")), None);
        assert_eq!(check(&min(0.5), json!(0.25)), Some("min(0.5)".into()));
    }

    #[test]
    fn bound_params_serialize_as_written() {
        let error = min(18.0).validate(&json!(12), &ValidationContext::default());
        assert_eq!(
            serde_json::to_value(error).expect("serialize"),
            json!({"id": "min", "params": [18]})
        );
    }

    #[test]
    fn length_bounds() {
        assert_eq!(check(&min_length(3), json!("ab")), Some("minLength(3)".into()));
        assert_eq!(check(&min_length(3), json!(null)), Some("minLength(3)".into()));
        assert_eq!(check(&max_length(1), json!([1, 2])), Some("maxLength(1)".into()));
        assert_eq!(check(&max_length(1), json!(5)), None);
    }

    #[test]
    fn email_shape() {
        assert_eq!(check(&email(), json!("")), None);
        assert_eq!(check(&email(), json!("ann@example.org")), None);
        assert_eq!(check(&email(), json!("ann")), Some("email".into()));
    }

    #[test]
    fn parameterless_rules_are_shared() {
        assert_eq!(required(), required());
        assert_eq!(email(), email());
        assert_ne!(required(), number());
        assert_ne!(min(1.0), min(1.0));
    }

    #[test]
    fn conditional_on_form() {
        let rule = if_form_has_value(|form| form["subscribe"] == json!(true), required());
        let on = ValidationContext::new(json!({"subscribe": true}));
        let off = ValidationContext::new(json!({"subscribe": false}));
        assert_eq!(rule.validate(&json!(""), &on), Some(Message::new("required")));
        assert_eq!(rule.validate(&json!(""), &off), None);
    }

    #[test]
    fn conditional_on_parent() {
        let rule = if_parent_has_value(|parent| parent["kind"] == json!("company"), required());
        let company = ValidationContext::new(json!({})).with_parent(json!({"kind": "company"}));
        let person = ValidationContext::new(json!({})).with_parent(json!({"kind": "person"}));
        assert_eq!(rule.validate(&json!(null), &company), Some(Message::new("required")));
        assert_eq!(rule.validate(&json!(null), &person), None);
        assert_eq!(rule.validate(&json!(null), &ValidationContext::default()), None);
    }

    #[test]
    fn message_helper() {
        let m = message("date", [json!("dd-mm-yyyy")]);
        assert_eq!(m.id, "date");
        assert_eq!(m.params, vec![json!("dd-mm-yyyy")]);
    }
}
