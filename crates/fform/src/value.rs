#![forbid(unsafe_code)]

//! Field values and the change-input surface.
//!
//! Values are JSON-shaped ([`serde_json::Value`]) so a form's aggregated value
//! can be handed to any serde consumer unchanged. The coercion helpers here
//! follow the loose scalar semantics that browser form controls produce:
//! text inputs report strings, checkboxes report booleans, and rules are
//! expected to cope with both.

use serde::Deserialize;

pub use serde_json::{Map, Value};

/// Whether a value counts as "set".
///
/// `null`, `false`, `0`, `NaN` and the empty string are falsy; everything
/// else, including empty arrays and objects, is truthy.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Numeric reading of a value for range comparisons.
///
/// Numbers pass through, strings are parsed after trimming (the empty string
/// reads as `0`), booleans read as `0`/`1` and `null` as `0`. Anything else,
/// or an unparseable string, has no numeric reading.
#[must_use]
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(0.0)
            } else {
                trimmed.parse::<f64>().ok().filter(|f| !f.is_nan())
            }
        }
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// A number as JSON, written the way a script engine would print it:
/// integral values carry no fraction (`18`, not `18.0`) and non-finite
/// values become `null`.
#[must_use]
pub fn from_number(n: f64) -> Value {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

/// Length of a string (in chars) or array; `null` has length `0`.
#[must_use]
pub fn length(value: &Value) -> Option<usize> {
    match value {
        Value::Null => Some(0),
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// The `target` of an event-like change input.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EventTarget {
    #[serde(default)]
    pub value: Value,
    /// Present for checkbox-like controls.
    #[serde(default)]
    pub checked: Option<bool>,
}

/// An event-like object as delivered by a native form control.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct InputEvent {
    pub target: EventTarget,
}

impl InputEvent {
    /// A text-like control reporting `value`.
    #[must_use]
    pub fn with_value(value: impl Into<Value>) -> Self {
        Self {
            target: EventTarget {
                value: value.into(),
                checked: None,
            },
        }
    }

    /// A checkbox-like control reporting `checked`.
    #[must_use]
    pub fn with_checked(checked: bool) -> Self {
        Self {
            target: EventTarget {
                value: Value::Null,
                checked: Some(checked),
            },
        }
    }

    /// The value this event carries: `checked` when present, else `value`.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self.target.checked {
            Some(checked) => Value::Bool(checked),
            None => self.target.value,
        }
    }
}

/// Argument of `on_change`: either a raw value or an event-like object.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeInput {
    Value(Value),
    Event(InputEvent),
}

impl ChangeInput {
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Value(value) => value,
            Self::Event(event) => event.into_value(),
        }
    }
}

impl From<Value> for ChangeInput {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<InputEvent> for ChangeInput {
    fn from(event: InputEvent) -> Self {
        Self::Event(event)
    }
}

impl From<&str> for ChangeInput {
    fn from(value: &str) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<String> for ChangeInput {
    fn from(value: String) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<bool> for ChangeInput {
    fn from(value: bool) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<i64> for ChangeInput {
    fn from(value: i64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<i32> for ChangeInput {
    fn from(value: i32) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<u64> for ChangeInput {
    fn from(value: u64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<f64> for ChangeInput {
    fn from(value: f64) -> Self {
        Self::Value(Value::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_print_without_spurious_fraction() {
        assert_eq!(from_number(18.0), json!(18));
        assert_eq!(from_number(-3.0), json!(-3));
        assert_eq!(from_number(2.5), json!(2.5));
        assert_eq!(from_number(f64::NAN), Value::Null);
        assert_eq!(from_number(f64::INFINITY), Value::Null);
    }

    #[test]
    fn truthiness() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(!is_truthy(&falsy), "{falsy} should be falsy");
        }
        for truthy in [json!(true), json!(-1), json!("0"), json!([]), json!({})] {
            assert!(is_truthy(&truthy), "{truthy} should be truthy");
        }
    }

    #[test]
    fn number_coercion() {
        assert_eq!(to_number(&json!(20)), Some(20.0));
        assert_eq!(to_number(&json!(" 17 ")), Some(17.0));
        assert_eq!(to_number(&json!("")), Some(0.0));
        assert_eq!(to_number(&json!(true)), Some(1.0));
        assert_eq!(to_number(&json!("abc")), None);
        assert_eq!(to_number(&json!([1])), None);
    }

    #[test]
    fn lengths() {
        assert_eq!(length(&json!("héllo")), Some(5));
        assert_eq!(length(&json!([1, 2])), Some(2));
        assert_eq!(length(&json!(null)), Some(0));
        assert_eq!(length(&json!(3)), None);
    }

    #[test]
    fn event_prefers_checked() {
        assert_eq!(InputEvent::with_checked(true).into_value(), json!(true));
        assert_eq!(InputEvent::with_value("x").into_value(), json!("x"));
    }

    #[test]
    fn event_deserializes_from_dom_shape() {
        let event: InputEvent =
            serde_json::from_value(json!({ "target": { "value": "on", "checked": false } }))
                .expect("event json");
        assert_eq!(ChangeInput::from(event).into_value(), json!(false));
    }

    #[test]
    fn raw_inputs_convert() {
        assert_eq!(ChangeInput::from("a").into_value(), json!("a"));
        assert_eq!(ChangeInput::from(3).into_value(), json!(3));
        assert_eq!(ChangeInput::from(json!({"file": "a.png"})).into_value(), json!({"file": "a.png"}));
    }
}
