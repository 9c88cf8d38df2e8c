//! Benchmarks for update passes and wrapping.
//!
//! Run with: cargo bench -p proxyland-core --bench update_bench

use std::cell::RefCell;
use std::rc::Rc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use proxyland_core::{Engine, Notifier, Target, TargetRef, Value, wrap};
use serde_json::json;
use std::hint::black_box;

/// A target that only keeps the last text it was given.
#[derive(Default)]
struct Sink(RefCell<String>);

impl Target for Sink {
    fn set_text_content(&self, text: Option<&str>) {
        let mut slot = self.0.borrow_mut();
        slot.clear();
        slot.push_str(text.unwrap_or_default());
    }

    fn set_attribute(&self, _name: &str, value: &str) {
        self.set_text_content(Some(value));
    }

    fn remove_attribute(&self, _name: &str) {}
}

fn engine_with_bindings(count: usize) -> Engine {
    let engine = Engine::new(json!({"value": 0, "list": (0..64).collect::<Vec<_>>()}));
    for i in 0..count {
        let target: TargetRef = Rc::new(Sink::default());
        if i % 2 == 0 {
            engine.bind_field(target, "value").expect("handle binding");
        } else {
            engine
                .bind_map(target, |d| d.get("list").and_then(|l| l.as_list().map(|l| l.join(","))))
                .expect("handle binding");
        }
    }
    engine
}

fn bench_full_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/full_update");

    for count in [1usize, 16, 128] {
        group.throughput(Throughput::Elements(count as u64));
        let engine = engine_with_bindings(count);
        group.bench_with_input(BenchmarkId::new("bindings", count), &(), |b, _| {
            b.iter(|| black_box(engine.full_update()))
        });
    }

    group.finish();
}

fn bench_push_signal(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/push_signal");

    for count in [1usize, 16, 128] {
        let engine = engine_with_bindings(count);
        let list = engine
            .data()
            .get("list")
            .and_then(|v| v.as_list().cloned())
            .expect("list field");
        group.bench_with_input(BenchmarkId::new("bindings", count), &(), |b, _| {
            b.iter(|| {
                list.push(1);
                black_box(list.pop())
            })
        });
    }

    group.finish();
}

fn bench_wrap(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree/wrap");
    let notifier = Notifier::new(|| {});

    for width in [8usize, 64, 512] {
        let raw = json!({
            "rows": (0..width).map(|i| json!({"id": i, "tags": ["a", "b"]})).collect::<Vec<_>>()
        });
        group.throughput(Throughput::Elements(width as u64));
        group.bench_with_input(BenchmarkId::new("rows", width), &raw, |b, raw| {
            b.iter(|| black_box(wrap(Value::from(raw), &notifier)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_full_update, bench_push_signal, bench_wrap);

criterion_main!(benches);
