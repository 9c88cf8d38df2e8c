#![no_main]

use std::cell::Cell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use proxyland_core::{Notifier, Value, wrap};

#[derive(Arbitrary, Debug)]
enum Op {
    Push(i16),
    Pop,
    Shift,
    Unshift(Vec<i16>),
    Splice { start: u8, delete_count: u8, items: Vec<i16> },
    Set(u8, i16),
}

fuzz_target!(|ops: Vec<Op>| {
    let signals = Rc::new(Cell::new(0usize));
    let counted = Rc::clone(&signals);
    let notifier = Notifier::new(move || counted.set(counted.get() + 1));
    let root = wrap(Value::from(Vec::<i64>::new()), &notifier);
    let Some(list) = root.as_list() else {
        return;
    };
    let mut reference: Vec<Option<i64>> = Vec::new();

    for (step, op) in ops.iter().take(256).enumerate() {
        match op {
            Op::Push(v) => {
                reference.push(Some(i64::from(*v)));
                assert_eq!(list.push(*v), reference.len());
            }
            Op::Pop => {
                assert_eq!(list.pop().map(|v| v.as_i64()), reference.pop());
            }
            Op::Shift => {
                let expected = (!reference.is_empty()).then(|| reference.remove(0));
                assert_eq!(list.shift().map(|v| v.as_i64()), expected);
            }
            Op::Unshift(items) => {
                reference.splice(0..0, items.iter().map(|v| Some(i64::from(*v))));
                assert_eq!(list.unshift(items.iter().copied()), reference.len());
            }
            Op::Splice {
                start,
                delete_count,
                items,
            } => {
                let start = usize::from(*start);
                let delete_count = usize::from(*delete_count);
                let from = start.min(reference.len());
                let to = from + delete_count.min(reference.len() - from);
                let expected: Vec<Option<i64>> = reference
                    .splice(from..to, items.iter().map(|v| Some(i64::from(*v))))
                    .collect();
                let removed: Vec<Option<i64>> = list
                    .splice(start, delete_count, items.iter().copied())
                    .iter()
                    .map(Value::as_i64)
                    .collect();
                assert_eq!(removed, expected);
            }
            Op::Set(index, v) => {
                let index = usize::from(*index);
                let expected = if index < reference.len() {
                    Some(std::mem::replace(&mut reference[index], Some(i64::from(*v))))
                } else {
                    reference.resize(index, None);
                    reference.push(Some(i64::from(*v)));
                    None
                };
                assert_eq!(list.set(index, *v).map(|old| old.as_i64()), expected);
            }
        }
        assert_eq!(signals.get(), step + 1);
        assert_eq!(list.len(), reference.len());
    }

    let snapshot: Vec<Option<i64>> = list.iter().map(|v| v.as_i64()).collect();
    assert_eq!(snapshot, reference);
});
