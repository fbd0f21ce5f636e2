#![forbid(unsafe_code)]

use thiserror::Error;

use crate::field::FieldKind;

pub type Result<T> = std::result::Result<T, FormError>;

/// Usage faults. Validation failures are never reported through this type;
/// they live in the `error` slot of the node they belong to.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("schema JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("undeclared field type `{kind}` at `{path}`")]
    UnknownFieldType { path: String, kind: String },

    #[error("unknown validation rule `{rule}` at `{path}`")]
    UnknownRule { path: String, rule: String },

    #[error("invalid parameter for rule `{rule}` at `{path}`: {reason}")]
    InvalidRule {
        path: String,
        rule: String,
        reason: String,
    },

    #[error("no field named `{name}`")]
    UnknownField { name: String },

    #[error("field `{name}` is {actual}, expected {expected}")]
    KindMismatch {
        name: String,
        expected: FieldKind,
        actual: FieldKind,
    },
}

impl FormError {
    #[must_use]
    pub fn unknown_field(name: impl Into<String>) -> Self {
        Self::UnknownField { name: name.into() }
    }

    pub(crate) fn invalid_rule(
        path: impl Into<String>,
        rule: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidRule {
            path: path.into(),
            rule: rule.into(),
            reason: reason.into(),
        }
    }
}
