#![forbid(unsafe_code)]

//! Author-facing field descriptors.
//!
//! Schemas are written in shorthand and normalized before use:
//!
//! ```
//! use fform::schema::{Fields, array};
//! use fform::validation::{min, number, required};
//!
//! let fields = Fields::new()
//!     .field("name", required())
//!     .field("age", [number(), min(18.0)])
//!     .field("items", array(Fields::new().field("name", required())));
//! assert_eq!(fields.len(), 3);
//! ```

pub mod decl;
pub mod normalize;

use std::rc::Rc;

use indexmap::IndexMap;

use crate::validation::Validator;

pub use normalize::{CanonicalField, normalize};

/// One field as declared by the author.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Field {
    /// A bare validation function.
    Rule(Validator),
    /// A bare list of validation functions.
    Rules(Vec<Validator>),
    /// A fixed set of named children.
    Object {
        validate: Vec<Validator>,
        fields: Rc<Fields>,
    },
    /// A list of elements sharing one child template.
    Array {
        validate: Vec<Validator>,
        fields: Rc<Fields>,
    },
    /// No validation (`{}`).
    #[default]
    Plain,
}

/// Ordered mapping of child name to descriptor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fields {
    entries: IndexMap<String, Field>,
}

impl Fields {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a named child.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field: impl Into<Field>) -> Self {
        self.entries.insert(name.into(), field.into());
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.entries.iter().map(|(name, field)| (name.as_str(), field))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Field)> for Fields {
    fn from_iter<I: IntoIterator<Item = (S, Field)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(name, field)| (name.into(), field)).collect(),
        }
    }
}

impl From<Validator> for Field {
    fn from(rule: Validator) -> Self {
        Self::Rule(rule)
    }
}

impl From<Vec<Validator>> for Field {
    fn from(rules: Vec<Validator>) -> Self {
        Self::Rules(rules)
    }
}

impl<const N: usize> From<[Validator; N]> for Field {
    fn from(rules: [Validator; N]) -> Self {
        Self::Rules(rules.into())
    }
}

impl From<Fields> for Field {
    fn from(fields: Fields) -> Self {
        object(fields)
    }
}

/// An object field without validation of its own.
pub fn object(fields: Fields) -> Field {
    object_with(Vec::new(), fields)
}

/// An object field validated as a whole by `validate`.
pub fn object_with(validate: impl IntoIterator<Item = Validator>, fields: Fields) -> Field {
    Field::Object {
        validate: validate.into_iter().collect(),
        fields: Rc::new(fields),
    }
}

/// An array field without validation of its own.
pub fn array(fields: Fields) -> Field {
    array_with(Vec::new(), fields)
}

/// An array field validated as a whole by `validate`.
pub fn array_with(validate: impl IntoIterator<Item = Validator>, fields: Fields) -> Field {
    Field::Array {
        validate: validate.into_iter().collect(),
        fields: Rc::new(fields),
    }
}
