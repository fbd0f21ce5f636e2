//! End-to-end behavior of a live form: scenario flows, cross-field
//! revalidation, dynamic arrays and reset.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use fform::prelude::*;
use fform::schema::Fields;
use fform::{FieldState, FormError, InputEvent};
use pretty_assertions::assert_eq;
use serde_json::json;

fn basic_error(form: &Form, name: &str) -> Option<Message> {
    form.field(name)
        .and_then(|node| node.try_basic().map(|field| field.state().error.clone()))
        .expect("basic field")
}

fn change(form: &Form, name: &str, value: impl Into<fform::value::ChangeInput>) {
    form.field(name)
        .and_then(|node| node.try_basic().map(|field| field.on_change(value)))
        .expect("basic field");
}

// ── Scenario ─────────────────────────────────────────────────────────

#[test]
fn name_and_age_scenario() {
    let fields = Fields::new()
        .field("name", required())
        .field("age", [number(), min(18.0)]);
    let submitted = Rc::new(RefCell::new(Vec::new()));
    let submitted_clone = Rc::clone(&submitted);
    let form = Form::create(
        FormOptions::new(fields)
            .initial_values(json!({"name": "", "age": ""}))
            .on_submit(move |s| submitted_clone.borrow_mut().push(s.value.clone())),
    );

    assert_eq!(basic_error(&form, "name"), Some(Message::new("required")));
    assert_eq!(basic_error(&form, "age"), Some(Message::new("number")));

    change(&form, "age", 12);
    assert_eq!(basic_error(&form, "age"), Some(Message::new("min").with_param(18)));

    change(&form, "age", 21);
    change(&form, "name", InputEvent::with_value("Ann"));
    assert_eq!(basic_error(&form, "age"), None);
    assert_eq!(basic_error(&form, "name"), None);

    let snapshot = form.submit();
    assert!(!snapshot.invalid);
    assert_eq!(*submitted.borrow(), vec![json!({"name": "Ann", "age": 21})]);
}

// ── Cross-field ──────────────────────────────────────────────────────

#[test]
fn dependent_field_tracks_its_source() {
    let fields = Fields::new().field("a", Field::Plain).field(
        "b",
        Validator::from_fn(|value, ctx| (ctx.form()["a"] != *value).then(|| Message::new("equal"))),
    );
    let form = Form::create(FormOptions::new(fields).initial_values(json!({"a": "1", "b": "1"})));
    assert_eq!(basic_error(&form, "b"), None);

    change(&form, "a", "2");
    assert_eq!(basic_error(&form, "b"), Some(Message::new("equal")));

    change(&form, "b", "2");
    assert_eq!(basic_error(&form, "b"), None);
}

#[test]
fn conditional_rules_follow_form_and_parent() {
    let fields = Fields::new()
        .field("contact_by_mail", Field::Plain)
        .field(
            "email",
            if_form_has_value(|form| form["contact_by_mail"] == json!(true), required()),
        )
        .field(
            "people",
            array(Fields::new().field("adult", Field::Plain).field(
                "id_number",
                if_parent_has_value(|person| person["adult"] == json!(true), required()),
            )),
        );
    let form = Form::create(FormOptions::new(fields).initial_values(json!({
        "contact_by_mail": false,
        "people": [{"adult": true}, {"adult": false}]
    })));

    assert_eq!(basic_error(&form, "email"), None);
    change(&form, "contact_by_mail", InputEvent::with_checked(true));
    assert_eq!(basic_error(&form, "email"), Some(Message::new("required")));

    assert_eq!(basic_error(&form, "people[0].id_number"), Some(Message::new("required")));
    assert_eq!(basic_error(&form, "people[1].id_number"), None);
}

// ── Arrays ───────────────────────────────────────────────────────────

fn todo_form() -> Form {
    let fields = Fields::new().field(
        "todos",
        array_with([min_length(1)], Fields::new().field("title", [required(), max_length(10)])),
    );
    Form::create(FormOptions::new(fields).initial_values(json!({"todos": [{"title": "a"}, {"title": "b"}]})))
}

fn todos(form: &Form) -> fform::ArrayField {
    form.field("todos")
        .and_then(|node| node.try_array().cloned())
        .expect("array field")
}

#[test]
fn remove_keeps_sibling_identity_and_subscriptions() {
    let form = todo_form();
    let todos = todos(&form);
    let children = todos.children();
    let survivor = children[1].clone();

    let survivor_seen = Rc::new(Cell::new(0u32));
    let survivor_seen_clone = Rc::clone(&survivor_seen);
    let _survivor_sub = FieldNode::Object(survivor.clone())
        .subscribe(move |_| survivor_seen_clone.set(survivor_seen_clone.get() + 1));

    assert!(todos.remove(&children[0]));
    let after = todos.children();
    assert_eq!(after.len(), 1);
    assert!(after[0].ptr_eq(&survivor));
    assert_eq!(after[0].name(), "todos[1]");

    change(&form, "todos[1].title", "bb");
    assert!(survivor_seen.get() >= 1);
    assert_eq!(form.value(), json!({"todos": [{"title": "bb"}]}));
}

#[test]
fn form_subscription_follows_structure() {
    let form = todo_form();
    let todos = todos(&form);
    let values = Rc::new(RefCell::new(Vec::new()));
    let values_clone = Rc::clone(&values);
    let _sub = form.subscribe(move |s| values_clone.borrow_mut().push(s.value["todos"].clone()));

    let removed = todos.children()[0].clone();
    todos.remove(&removed);
    let added = todos.add(json!({"title": "c"}));
    assert_eq!(added.name(), "todos[2]");

    values.borrow_mut().clear();
    change(&form, "todos[2].title", "cc");
    assert!(values.borrow().iter().all(|v| *v == json!([{"title": "b"}, {"title": "cc"}])));
    assert!(!values.borrow().is_empty());

    values.borrow_mut().clear();
    removed
        .field("title")
        .and_then(|node| node.as_basic().cloned())
        .expect("title")
        .on_change("zz");
    assert!(values.borrow().is_empty(), "removed element is detached");
}

#[test]
fn array_rules_revalidate_on_structure_change() {
    let form = todo_form();
    let todos = todos(&form);
    for child in todos.children().iter() {
        todos.remove(child);
    }
    assert_eq!(
        todos.state().error,
        Some(Message::new("minLength").with_param(1))
    );
    assert!(form.snapshot().invalid);

    let added = todos.add(json!({"title": "way too long a title"}));
    assert_eq!(todos.state().error, None);
    let title = added.field("title").expect("title");
    assert_eq!(
        title.try_basic().expect("basic").state().error,
        Some(Message::new("maxLength").with_param(10))
    );
}

// ── State subscriptions ──────────────────────────────────────────────

#[test]
fn basic_state_subscribers_end_on_the_revalidated_state() {
    let form = Form::create(
        FormOptions::new(Fields::new().field("name", required())).initial_values(json!({"name": ""})),
    );
    let name = form.field("name").and_then(|n| n.try_basic().cloned()).expect("basic field");
    let seen: Rc<RefCell<Vec<FieldState>>> = Rc::new(RefCell::new(Vec::new()));
    let seen_clone = Rc::clone(&seen);
    let _sub = name.subscribe_state(move |state| seen_clone.borrow_mut().push(state.clone()));

    name.on_change("Ann");
    assert_eq!(seen.borrow().last(), Some(&*name.state()));
    assert!(!name.state().invalid());

    name.on_change("");
    assert_eq!(seen.borrow().last(), Some(&*name.state()));
    assert_eq!(name.state().error, Some(Message::new("required")));
}

#[test]
fn container_state_subscribers_end_on_the_revalidated_error() {
    let form = todo_form();
    let todos = todos(&form);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_clone = Rc::clone(&seen);
    let _sub = todos.subscribe_state(move |state| seen_clone.borrow_mut().push(state.error.clone()));

    for child in todos.children().iter() {
        todos.remove(child);
    }
    assert_eq!(seen.borrow().last(), Some(&todos.state().error));
    assert_eq!(todos.state().error, Some(Message::new("minLength").with_param(1)));

    todos.add(json!({"title": "x"}));
    assert_eq!(seen.borrow().last(), Some(&None));
    assert_eq!(todos.state().error, None);
}

// ── Reset ────────────────────────────────────────────────────────────

#[test]
fn reset_restores_the_initial_snapshot() {
    let form = todo_form();
    let initial = form.snapshot();
    let todos = todos(&form);

    todos.add(json!({"title": ""}));
    let first = todos.children()[0].clone();
    todos.remove(&first);
    change(&form, "todos[1].title", "changed");
    form.submit();
    assert_ne!(form.snapshot(), initial);

    form.reset();
    assert_eq!(form.snapshot(), initial);
    let names: Vec<String> = todos.children().iter().map(|c| c.name().to_string()).collect();
    assert_eq!(names, vec!["todos[3]", "todos[4]"]);
    assert!(!todos.state().is_submitted);
}

#[test]
fn reset_form_keeps_revalidating() {
    let form = todo_form();
    form.reset();
    change(&form, "todos[2].title", "");
    assert_eq!(basic_error(&form, "todos[2].title"), Some(Message::new("required")));
}

// ── Submission ───────────────────────────────────────────────────────

#[test]
fn invalid_submissions_are_delivered() {
    let fields = Fields::new().field("email", [required(), email()]);
    let calls = Rc::new(Cell::new(0u32));
    let calls_clone = Rc::clone(&calls);
    let form = Form::create(
        FormOptions::new(fields)
            .initial_values(json!({"email": "nope"}))
            .on_submit(move |s| {
                assert!(s.invalid);
                calls_clone.set(calls_clone.get() + 1);
            }),
    );
    let snapshot = form.submit();
    assert_eq!(calls.get(), 1);
    assert_eq!(snapshot.error.child("email").and_then(|e| e.own()), Some(&Message::new("email")));

    let email = form.field("email").expect("email");
    assert!(email.try_basic().expect("basic").state().show_error());
}

#[test]
fn lookups_report_unknown_names_and_kinds() {
    let form = todo_form();
    assert!(matches!(form.field("todos[9]"), Err(FormError::UnknownField { .. })));
    let todos = form.field("todos").expect("todos");
    assert!(matches!(todos.try_basic(), Err(FormError::KindMismatch { .. })));
}

// ── Declarative schema ───────────────────────────────────────────────

#[test]
fn json_schema_drives_a_form() {
    let fields = Fields::from_json_str(
        r#"{
            "name": "required",
            "age": ["number", { "min": 18 }],
            "tags": { "type": "array", "validate": { "maxLength": 2 }, "fields": { "label": "required" } }
        }"#,
    )
    .expect("schema parses");
    let form = Form::create(FormOptions::new(fields).initial_values(json!({
        "name": "Ann",
        "age": 30,
        "tags": [{"label": "x"}, {"label": "y"}, {"label": "z"}]
    })));
    let snapshot = form.snapshot();
    assert!(snapshot.invalid);
    assert_eq!(
        snapshot.error.child("tags").and_then(|e| e.own()),
        Some(&Message::new("maxLength").with_param(2))
    );
}
