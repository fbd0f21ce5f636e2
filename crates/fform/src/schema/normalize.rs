#![forbid(unsafe_code)]

//! Shorthand descriptor → canonical field.

use std::rc::Rc;

use super::{Field, Fields};
use crate::validation::{Validator, compose};

/// The single shape field constructors operate on.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalField {
    Basic {
        validate: Validator,
    },
    Object {
        validate: Validator,
        fields: Rc<Fields>,
    },
    Array {
        validate: Validator,
        fields: Rc<Fields>,
    },
}

impl CanonicalField {
    #[must_use]
    pub fn validator(&self) -> &Validator {
        match self {
            Self::Basic { validate } | Self::Object { validate, .. } | Self::Array { validate, .. } => {
                validate
            }
        }
    }

    /// Object shape over `fields` without validation of its own, as used for
    /// array elements.
    #[must_use]
    pub fn element(fields: &Rc<Fields>) -> Self {
        Self::Object {
            validate: Validator::always_valid(),
            fields: Rc::clone(fields),
        }
    }
}

/// Resolve a descriptor. First match wins: bare function, bare list, array,
/// object, anything else.
#[must_use]
pub fn normalize(field: &Field) -> CanonicalField {
    match field {
        Field::Rule(rule) => CanonicalField::Basic {
            validate: rule.clone(),
        },
        Field::Rules(rules) => CanonicalField::Basic {
            validate: compose(rules.iter().cloned()),
        },
        Field::Array { validate, fields } => CanonicalField::Array {
            validate: compose(validate.iter().cloned()),
            fields: Rc::clone(fields),
        },
        Field::Object { validate, fields } => CanonicalField::Object {
            validate: compose(validate.iter().cloned()),
            fields: Rc::clone(fields),
        },
        Field::Plain => CanonicalField::Basic {
            validate: Validator::always_valid(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{array_with, object};
    use crate::validation::{Message, ValidationContext, number, required};
    use serde_json::json;

    #[test]
    fn bare_rule_becomes_basic() {
        let canonical = normalize(&Field::from(required()));
        assert!(matches!(canonical, CanonicalField::Basic { ref validate } if *validate == required()));
    }

    #[test]
    fn bare_list_is_composed() {
        let canonical = normalize(&Field::from([required(), number()]));
        let CanonicalField::Basic { validate } = canonical else {
            panic!("expected basic");
        };
        let ctx = ValidationContext::default();
        assert_eq!(validate.validate(&json!(""), &ctx), Some(Message::new("required")));
        assert_eq!(validate.validate(&json!("x"), &ctx), Some(Message::new("number")));
    }

    #[test]
    fn plain_and_empty_lists_are_always_valid() {
        let ctx = ValidationContext::default();
        for field in [Field::Plain, Field::Rules(Vec::new())] {
            let canonical = normalize(&field);
            assert!(matches!(canonical, CanonicalField::Basic { .. }));
            assert_eq!(canonical.validator().validate(&json!(null), &ctx), None);
        }
    }

    #[test]
    fn containers_keep_their_children() {
        let children = Fields::new().field("name", required());
        let canonical = normalize(&array_with([required()], children.clone()));
        let CanonicalField::Array { fields, .. } = canonical else {
            panic!("expected array");
        };
        assert_eq!(*fields, children);

        let canonical = normalize(&object(children));
        assert!(matches!(canonical, CanonicalField::Object { ref fields, .. } if fields.len() == 1));
    }
}
