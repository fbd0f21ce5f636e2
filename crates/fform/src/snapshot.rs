#![forbid(unsafe_code)]

//! Aggregated views over a field subtree.
//!
//! A [`Snapshot`] is `{value, error, invalid}` for any node: basic nodes pass
//! their local state through, containers fold their children in (object
//! children in declaration order, array children in sequence order).
//!
//! # Invariants
//!
//! 1. [`get`] is pure: two calls with no intervening mutation return equal
//!    snapshots.
//! 2. A container subscription always covers exactly the children the
//!    container currently holds. When the children collection is replaced
//!    the child subscriptions are torn down and rebuilt before the listener
//!    runs.
//! 3. Subscription callbacks only hold weak node handles; a subscription
//!    never keeps a tree alive.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Node dropped while subscribed | Callback becomes a no-op |
//! | Listener mutates the tree | Re-entrant notification, fresh state read |

use std::cell::RefCell;
use std::rc::Rc;

use fform_reactive::{Store, Subscription};
use indexmap::IndexMap;
use serde::Serialize;

use crate::field::{Children, ContainerState, FieldNode, ObjectField};
use crate::validation::{Message, ValidationResult};
use crate::value::{Map, Value};

/// Aggregated state of a node and its descendants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub value: Value,
    pub error: FieldError,
    /// Own error or any descendant error.
    pub invalid: bool,
}

/// Error tree mirroring the node tree.
///
/// Containers serialize as `{"self": <own>, "children": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldError {
    Basic(ValidationResult),
    Object {
        #[serde(rename = "self")]
        own: ValidationResult,
        children: IndexMap<String, FieldError>,
    },
    Array {
        #[serde(rename = "self")]
        own: ValidationResult,
        children: Vec<FieldError>,
    },
}

impl FieldError {
    /// The node's own validator result.
    #[must_use]
    pub fn own(&self) -> Option<&Message> {
        match self {
            Self::Basic(own) | Self::Object { own, .. } | Self::Array { own, .. } => own.as_ref(),
        }
    }

    #[must_use]
    pub fn child(&self, name: &str) -> Option<&FieldError> {
        match self {
            Self::Object { children, .. } => children.get(name),
            _ => None,
        }
    }

    #[must_use]
    pub fn at(&self, index: usize) -> Option<&FieldError> {
        match self {
            Self::Array { children, .. } => children.get(index),
            _ => None,
        }
    }

    /// Whether this node or any descendant carries an error.
    #[must_use]
    pub fn any(&self) -> bool {
        match self {
            Self::Basic(own) => own.is_some(),
            Self::Object { own, children } => {
                own.is_some() || children.values().any(FieldError::any)
            }
            Self::Array { own, children } => own.is_some() || children.iter().any(FieldError::any),
        }
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Aggregate `node` and its descendants.
#[must_use]
pub fn get(node: &FieldNode) -> Snapshot {
    match node {
        FieldNode::Basic(field) => {
            let state = field.state();
            Snapshot {
                value: state.value.clone(),
                error: FieldError::Basic(state.error.clone()),
                invalid: state.invalid(),
            }
        }
        FieldNode::Object(field) => object_snapshot(field),
        FieldNode::Array(field) => {
            let state = field.state();
            let mut invalid = state.invalid();
            let mut values = Vec::with_capacity(state.children.len());
            let mut errors = Vec::with_capacity(state.children.len());
            for child in state.children.iter() {
                let snapshot = object_snapshot(child);
                invalid |= snapshot.invalid;
                values.push(snapshot.value);
                errors.push(snapshot.error);
            }
            Snapshot {
                value: Value::Array(values),
                error: FieldError::Array {
                    own: state.error.clone(),
                    children: errors,
                },
                invalid,
            }
        }
    }
}

fn object_snapshot(field: &ObjectField) -> Snapshot {
    let state = field.state();
    let mut invalid = state.invalid();
    let mut values = Map::new();
    let mut errors = IndexMap::with_capacity(state.children.len());
    for (name, child) in state.children.iter() {
        let snapshot = get(child);
        invalid |= snapshot.invalid;
        values.insert(name.clone(), snapshot.value);
        errors.insert(name.clone(), snapshot.error);
    }
    Snapshot {
        value: Value::Object(values),
        error: FieldError::Object {
            own: state.error.clone(),
            children: errors,
        },
        invalid,
    }
}

/// Aggregated value only; cheaper than [`get`] when errors are not needed.
#[must_use]
pub fn value(node: &FieldNode) -> Value {
    match node {
        FieldNode::Basic(field) => field.value(),
        FieldNode::Object(field) => object_value(&field.state().children),
        FieldNode::Array(field) => array_value(&field.state().children),
    }
}

pub(crate) fn object_value(children: &Children) -> Value {
    Value::Object(
        children
            .iter()
            .map(|(name, child)| (name.clone(), value(child)))
            .collect(),
    )
}

pub(crate) fn array_value(children: &[ObjectField]) -> Value {
    Value::Array(children.iter().map(ObjectField::value).collect())
}

/// Values of several nodes, in order.
#[must_use]
pub fn values(nodes: &[FieldNode]) -> Vec<Value> {
    nodes.iter().map(value).collect()
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

type Notify = Rc<dyn Fn()>;

/// Call `notify` after any change in the subtree rooted at `node`.
fn subscribe_changes(node: &FieldNode, notify: Notify) -> Subscription {
    match node {
        FieldNode::Basic(field) => field.store().subscribe(move |_, _| notify()),
        FieldNode::Object(field) => subscribe_container(field.store(), notify),
        FieldNode::Array(field) => subscribe_container(field.store(), notify),
    }
}

/// A container's children collection, as far as subscriptions care.
trait ChildSet: 'static {
    fn subscribe_each(&self, notify: &Notify) -> Vec<Subscription>;
}

impl ChildSet for Children {
    fn subscribe_each(&self, notify: &Notify) -> Vec<Subscription> {
        self.values()
            .map(|child| subscribe_changes(child, Rc::clone(notify)))
            .collect()
    }
}

impl ChildSet for Vec<ObjectField> {
    fn subscribe_each(&self, notify: &Notify) -> Vec<Subscription> {
        self.iter()
            .map(|child| subscribe_container(child.store(), Rc::clone(notify)))
            .collect()
    }
}

struct Tracked<C> {
    children: Rc<C>,
    subscription: Subscription,
}

fn subscribe_container<C: ChildSet>(store: &Store<ContainerState<C>>, notify: Notify) -> Subscription {
    let children = Rc::clone(&store.get().children);
    let subscription = Subscription::group(children.subscribe_each(&notify));
    let tracked = Rc::new(RefCell::new(Tracked {
        children,
        subscription,
    }));

    let weak_store = store.downgrade();
    let listener_tracked = Rc::clone(&tracked);
    let own = store.subscribe(move |_, _| {
        // Re-read: a re-entrant update may already have superseded the
        // state this notification carries.
        if let Some(store) = weak_store.upgrade() {
            let current = Rc::clone(&store.get().children);
            let stale = !Rc::ptr_eq(&listener_tracked.borrow().children, &current);
            if stale {
                let old = std::mem::take(&mut listener_tracked.borrow_mut().subscription);
                drop(old);
                let fresh = Subscription::group(current.subscribe_each(&notify));
                let mut tracked = listener_tracked.borrow_mut();
                tracked.children = current;
                tracked.subscription = fresh;
            }
        }
        notify();
    });

    let detach_children = Subscription::new(move || {
        let old = std::mem::take(&mut tracked.borrow_mut().subscription);
        drop(old);
    });
    Subscription::group([own, detach_children])
}

/// Call `listener` with a fresh [`Snapshot`] after any change in the subtree
/// rooted at `node`, including array elements added later.
pub fn subscribe(node: &FieldNode, listener: impl Fn(&Snapshot) + 'static) -> Subscription {
    let weak = node.downgrade();
    subscribe_changes(
        node,
        Rc::new(move || {
            if let Some(node) = weak.upgrade() {
                listener(&get(&node));
            }
        }),
    )
}

/// Call `listener` whenever the aggregated value of `node` differs from the
/// last one delivered (or, initially, from the value at subscription time).
pub fn subscribe_value(node: &FieldNode, listener: impl Fn(&Value) + 'static) -> Subscription {
    let weak = node.downgrade();
    let last = RefCell::new(value(node));
    subscribe_changes(
        node,
        Rc::new(move || {
            let Some(node) = weak.upgrade() else {
                return;
            };
            let next = value(&node);
            if *last.borrow() == next {
                return;
            }
            last.replace(next.clone());
            listener(&next);
        }),
    )
}

/// Observe the values of several nodes together. Fires when any of them
/// changes value; the listener receives all values in order.
pub fn subscribe_values(
    nodes: &[FieldNode],
    listener: impl Fn(&[Value]) + 'static,
) -> Subscription {
    let weak: Vec<_> = nodes.iter().map(FieldNode::downgrade).collect();
    let last = RefCell::new(values(nodes));
    let notify: Notify = Rc::new(move || {
        let next: Vec<Value> = weak
            .iter()
            .map(|node| node.upgrade().map(|node| value(&node)).unwrap_or_default())
            .collect();
        if *last.borrow() == next {
            return;
        }
        last.replace(next.clone());
        listener(&next);
    });
    Subscription::group(
        nodes
            .iter()
            .map(|node| subscribe_changes(node, Rc::clone(&notify))),
    )
}
