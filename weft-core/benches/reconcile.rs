use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use weft_core::memory::MemoryTarget;
use weft_core::prelude::*;

fn table(rows: usize, highlight: usize) -> Node {
    element("table")
        .children((0..rows).map(|row| {
            let mut tr = element("tr").attr("row", row);
            if row == highlight {
                tr = tr.class("highlight");
            }
            tr.child(element("td").child(format!("cell {row}")))
        }))
        .build()
}

fn mount_wide_tree(c: &mut Criterion) {
    c.bench_function("mount_1000_rows", |b| {
        b.iter_batched(
            || {
                let mut target = MemoryTarget::new();
                let container = target.create_container("app");
                (Renderer::new(target), container)
            },
            |(mut renderer, container)| {
                renderer.render(table(1000, 0), container);
                renderer.flush().expect("mount");
                black_box(renderer.last_commit());
            },
            BatchSize::SmallInput,
        );
    });
}

fn rerender_one_change(c: &mut Criterion) {
    let mut target = MemoryTarget::new();
    let container = target.create_container("app");
    let mut renderer = Renderer::new(target);
    renderer.render(table(1000, 0), container);
    renderer.flush().expect("mount");

    let mut highlight = 0;
    c.bench_function("rerender_1000_rows_one_change", |b| {
        b.iter(|| {
            highlight = (highlight + 1) % 1000;
            renderer.render(table(1000, highlight), container);
            renderer.flush().expect("render");
            renderer.adapter_mut().clear_ops();
        });
    });
}

fn sliced_pass(c: &mut Criterion) {
    c.bench_function("mount_1000_rows_in_64_unit_slices", |b| {
        b.iter_batched(
            || {
                let mut target = MemoryTarget::new();
                let container = target.create_container("app");
                let mut renderer = Renderer::new(target);
                renderer.render(table(1000, 0), container);
                renderer
            },
            |mut renderer| loop {
                if let WorkStatus::Committed(summary) = renderer.work(&mut UnitBudget::new(64)).expect("work") {
                    break black_box(summary);
                }
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, mount_wide_tree, rerender_one_change, sliced_pass);
criterion_main!(benches);
