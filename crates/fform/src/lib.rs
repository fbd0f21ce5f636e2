#![forbid(unsafe_code)]

//! FrankenForms: a reactive form-state engine.
//!
//! A schema ([`schema::Fields`]) describes a tree of fields. [`Form::create`]
//! turns it into a live tree of [`FieldNode`]s seeded from initial values,
//! keeps every node's error up to date with a top-down validation pass after
//! each value change, and exposes aggregated [`Snapshot`]s that hosts can
//! read or subscribe to.
//!
//! The engine is single-threaded and synchronous: every mutation has
//! notified all subscribers by the time it returns.

pub mod error;
pub mod field;
pub mod form;
pub mod schema;
pub mod session;
pub mod snapshot;
pub mod validation;
pub mod value;

pub use error::{FormError, Result};
pub use field::{ArrayField, BasicField, FieldKind, FieldNode, FieldState, ObjectField};
pub use form::{Form, FormId, FormOptions, SubmitEvent};
pub use fform_reactive::Subscription;
pub use session::FormSession;
pub use snapshot::{FieldError, Snapshot};
pub use validation::{Message, ValidationContext, ValidationResult, Validator};
pub use value::{InputEvent, Value};

/// Everything a host usually needs, in one import.
pub mod prelude {
    pub use crate::schema::{Field, Fields, array, array_with, object, object_with};
    pub use crate::validation::{
        compose, email, if_form_has_value, if_parent_has_value, max, max_length, message, min,
        min_length, number, optional, required,
    };
    pub use crate::{
        FieldNode, Form, FormOptions, FormSession, Message, Snapshot, Validator, Value,
    };
}
