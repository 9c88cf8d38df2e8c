//! Proptest strategies and a reference model for list operations.

use proptest::prelude::*;
use proxyland_core::{ObservableList, Value};
use serde_json::{Value as Json, json};

/// Null, booleans, integers, finite floats and short strings.
pub fn arb_scalar() -> impl Strategy<Value = Json> {
    prop_oneof![
        Just(Json::Null),
        any::<bool>().prop_map(Json::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        (-1.0e6f64..1.0e6).prop_map(|f| json!(f)),
        "[a-z ]{0,8}".prop_map(Json::String),
    ]
}

/// JSON trees up to three levels deep.
pub fn arb_json() -> impl Strategy<Value = Json> {
    arb_scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Json::Array),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                .prop_map(|fields| Json::Object(fields.into_iter().collect())),
        ]
    })
}

/// An object root, as bound data usually is.
pub fn arb_object() -> impl Strategy<Value = Json> {
    prop::collection::btree_map("[a-z]{1,4}", arb_json(), 0..5)
        .prop_map(|fields| Json::Object(fields.into_iter().collect()))
}

/// A list element in the reference model. `None` is a `Null` slot.
pub type Slot = Option<i64>;

/// One mutating list operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOp {
    Push(i64),
    Pop,
    Shift,
    Unshift(Vec<i64>),
    Splice {
        start: usize,
        delete_count: usize,
        items: Vec<i64>,
    },
    Set(usize, i64),
}

/// What a list operation returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpOutcome {
    Len(usize),
    Removed(Option<Slot>),
    Spliced(Vec<Slot>),
    Replaced(Option<Slot>),
}

pub fn arb_list_op() -> impl Strategy<Value = ListOp> {
    let small = || prop::collection::vec(-50i64..50, 0..4);
    prop_oneof![
        (-50i64..50).prop_map(ListOp::Push),
        Just(ListOp::Pop),
        Just(ListOp::Shift),
        small().prop_map(ListOp::Unshift),
        (0usize..10, 0usize..6, small()).prop_map(|(start, delete_count, items)| {
            ListOp::Splice {
                start,
                delete_count,
                items,
            }
        }),
        (0usize..12, -50i64..50).prop_map(|(index, value)| ListOp::Set(index, value)),
    ]
}

pub fn arb_list_ops(max: usize) -> impl Strategy<Value = Vec<ListOp>> {
    prop::collection::vec(arb_list_op(), 0..=max)
}

/// Apply `op` to a plain vector.
pub fn apply_reference(reference: &mut Vec<Slot>, op: &ListOp) -> OpOutcome {
    match op {
        ListOp::Push(value) => {
            reference.push(Some(*value));
            OpOutcome::Len(reference.len())
        }
        ListOp::Pop => OpOutcome::Removed(reference.pop()),
        ListOp::Shift => {
            OpOutcome::Removed((!reference.is_empty()).then(|| reference.remove(0)))
        }
        ListOp::Unshift(items) => {
            reference.splice(0..0, items.iter().copied().map(Some));
            OpOutcome::Len(reference.len())
        }
        ListOp::Splice {
            start,
            delete_count,
            items,
        } => {
            let start = (*start).min(reference.len());
            let end = start + (*delete_count).min(reference.len() - start);
            let removed = reference
                .splice(start..end, items.iter().copied().map(Some))
                .collect();
            OpOutcome::Spliced(removed)
        }
        ListOp::Set(index, value) => {
            if *index < reference.len() {
                let previous = std::mem::replace(&mut reference[*index], Some(*value));
                OpOutcome::Replaced(Some(previous))
            } else {
                reference.resize(*index, None);
                reference.push(Some(*value));
                OpOutcome::Replaced(None)
            }
        }
    }
}

fn slot(value: &Value) -> Slot {
    value.as_i64()
}

/// Apply `op` to an observable list.
pub fn apply_observable(list: &ObservableList, op: &ListOp) -> OpOutcome {
    match op {
        ListOp::Push(value) => OpOutcome::Len(list.push(*value)),
        ListOp::Pop => OpOutcome::Removed(list.pop().as_ref().map(slot)),
        ListOp::Shift => OpOutcome::Removed(list.shift().as_ref().map(slot)),
        ListOp::Unshift(items) => OpOutcome::Len(list.unshift(items.iter().copied())),
        ListOp::Splice {
            start,
            delete_count,
            items,
        } => OpOutcome::Spliced(
            list.splice(*start, *delete_count, items.iter().copied())
                .iter()
                .map(slot)
                .collect(),
        ),
        ListOp::Set(index, value) => {
            OpOutcome::Replaced(list.set(*index, *value).as_ref().map(slot))
        }
    }
}

/// Snapshot an observable list of integers and nulls.
#[must_use]
pub fn slots(list: &ObservableList) -> Vec<Slot> {
    list.with(|items| items.iter().map(slot).collect())
}
