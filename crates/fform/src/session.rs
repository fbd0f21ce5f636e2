#![forbid(unsafe_code)]

//! Form sessions: keep one [`Form`] across repeated option updates.
//!
//! A host that re-renders usually rebuilds its [`FormOptions`] every time.
//! The session only rebuilds the form when the schema or the initial values
//! actually changed; otherwise it keeps the live tree (and whatever the user
//! typed) and just swaps the submit handler.
//!
//! Schemas compare structurally with validators compared by identity, so a
//! schema built once and reused never triggers a rebuild, while one rebuilt
//! from fresh closures does. Initial values compare deeply.

use crate::form::{Form, FormId, FormOptions};
use crate::schema::Fields;
use crate::value::Value;

pub struct FormSession {
    form: Form,
    fields: Fields,
    initial_values: Value,
    rebuilds: u64,
}

impl FormSession {
    #[must_use]
    pub fn new(options: FormOptions) -> Self {
        let fields = options.fields.clone();
        let initial_values = options.initial_values.clone();
        Self {
            form: Form::create(options),
            fields,
            initial_values,
            rebuilds: 0,
        }
    }

    /// Apply freshly built options, rebuilding the form only when needed.
    ///
    /// A rebuilt form keeps the current id unless `options` names one.
    pub fn update(&mut self, mut options: FormOptions) -> &Form {
        let schema_changed = options.fields != self.fields;
        let values_changed = options.initial_values != self.initial_values;
        if !schema_changed && !values_changed {
            self.form.replace_on_submit(options.on_submit);
            return &self.form;
        }

        tracing::debug!(
            message = "form.rebuild",
            form_id = %self.form.id(),
            schema_changed,
            values_changed
        );
        let id: FormId = options
            .id
            .take()
            .unwrap_or_else(|| self.form.id().clone());
        self.fields = options.fields.clone();
        self.initial_values = options.initial_values.clone();
        self.form = Form::create(options.id(id));
        self.rebuilds += 1;
        &self.form
    }

    #[must_use]
    pub fn current(&self) -> &Form {
        &self.form
    }

    /// How many times the form was rebuilt since the session started.
    #[must_use]
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }
}
