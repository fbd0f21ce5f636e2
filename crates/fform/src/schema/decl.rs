#![forbid(unsafe_code)]

//! Declarative (JSON) schemas.
//!
//! Lets a schema be shipped as data instead of code. Rules are referenced by
//! name:
//!
//! ```json
//! {
//!   "name": "required",
//!   "age": ["number", { "min": 18 }],
//!   "items": { "type": "array", "fields": { "title": ["required", { "maxLength": 40 }] } },
//!   "note": {}
//! }
//! ```
//!
//! A string is one named rule, a single-key object is a parameterized rule,
//! an array is a list of rules, and an object using only the keys `type`,
//! `fields` and `validate` is a typed descriptor.

use indexmap::IndexMap;
use serde::Deserialize;

use super::{Field, Fields, array_with, object_with};
use crate::error::{FormError, Result};
use crate::validation::{
    Validator, email, max, max_length, min, min_length, number, optional, required,
};
use crate::value::Value;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldDecl {
    Rules(Vec<RuleDecl>),
    Typed(TypedDecl),
    Rule(RuleDecl),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TypedDecl {
    #[serde(rename = "type")]
    kind: Option<String>,
    fields: Option<IndexMap<String, FieldDecl>>,
    validate: Option<ValidateDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ValidateDecl {
    Many(Vec<RuleDecl>),
    One(RuleDecl),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RuleDecl {
    Named(String),
    Parameterized(IndexMap<String, Value>),
}

impl Fields {
    /// Parse a JSON schema document whose top level is the field mapping.
    pub fn from_json_str(source: &str) -> Result<Self> {
        let decls: IndexMap<String, FieldDecl> = serde_json::from_str(source)?;
        fields_from_decls(decls, "")
    }

    /// Convert an already-parsed JSON schema.
    pub fn from_json(source: Value) -> Result<Self> {
        let decls: IndexMap<String, FieldDecl> = serde_json::from_value(source)?;
        fields_from_decls(decls, "")
    }
}

fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

fn fields_from_decls(decls: IndexMap<String, FieldDecl>, path: &str) -> Result<Fields> {
    decls
        .into_iter()
        .map(|(name, decl)| {
            let field = field_from_decl(decl, &child_path(path, &name))?;
            Ok((name, field))
        })
        .collect()
}

fn field_from_decl(decl: FieldDecl, path: &str) -> Result<Field> {
    match decl {
        FieldDecl::Rule(rule) => Ok(Field::Rule(rule_from_decl(rule, path)?)),
        FieldDecl::Rules(rules) => Ok(Field::Rules(rules_from_decls(rules, path)?)),
        FieldDecl::Typed(typed) => typed_from_decl(typed, path),
    }
}

fn typed_from_decl(typed: TypedDecl, path: &str) -> Result<Field> {
    let validate = match typed.validate {
        None => Vec::new(),
        Some(ValidateDecl::One(rule)) => vec![rule_from_decl(rule, path)?],
        Some(ValidateDecl::Many(rules)) => rules_from_decls(rules, path)?,
    };
    let children = || fields_from_decls(typed.fields.unwrap_or_default(), path);

    match typed.kind.as_deref() {
        None | Some("basic") => Ok(Field::Rules(validate)),
        Some("object") => Ok(object_with(validate, children()?)),
        Some("array") => Ok(array_with(validate, children()?)),
        Some(other) => Err(FormError::UnknownFieldType {
            path: path.to_string(),
            kind: other.to_string(),
        }),
    }
}

fn rules_from_decls(rules: Vec<RuleDecl>, path: &str) -> Result<Vec<Validator>> {
    rules
        .into_iter()
        .map(|rule| rule_from_decl(rule, path))
        .collect()
}

fn rule_from_decl(rule: RuleDecl, path: &str) -> Result<Validator> {
    match rule {
        RuleDecl::Named(name) => match name.as_str() {
            "required" => Ok(required()),
            "optional" => Ok(optional()),
            "number" => Ok(number()),
            "email" => Ok(email()),
            _ => Err(FormError::UnknownRule {
                path: path.to_string(),
                rule: name,
            }),
        },
        RuleDecl::Parameterized(entries) => match entries.first() {
            Some((name, param)) if entries.len() == 1 => parameterized_rule(name, param, path),
            _ => {
                let keys: Vec<&str> = entries.keys().map(String::as_str).collect();
                Err(FormError::invalid_rule(
                    path,
                    keys.join(","),
                    "a parameterized rule has exactly one key",
                ))
            }
        },
    }
}

fn parameterized_rule(name: &str, param: &Value, path: &str) -> Result<Validator> {
    let number_param = || {
        param
            .as_f64()
            .ok_or_else(|| FormError::invalid_rule(path, name, format!("expected a number, got {param}")))
    };
    let length_param = || {
        param
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| {
                FormError::invalid_rule(path, name, format!("expected a length, got {param}"))
            })
    };

    match name {
        "min" => Ok(min(number_param()?)),
        "max" => Ok(max(number_param()?)),
        "minLength" => Ok(min_length(length_param()?)),
        "maxLength" => Ok(max_length(length_param()?)),
        _ => Err(FormError::UnknownRule {
            path: path.to_string(),
            rule: name.to_string(),
        }),
    }
}
