use criterion::{criterion_group, criterion_main, Criterion};
use indexmap::IndexMap;
use nest::{KeyFn, NestOperator, Rollup, Scalar, SortSpec};

type Row = IndexMap<String, Scalar>;

fn make_rows(rows: usize) -> Vec<Row> {
    (0..rows)
        .map(|i| {
            let mut row = IndexMap::with_capacity(3);
            row.insert("group".to_string(), Scalar::Str(format!("group-{}", i % 4)));
            row.insert("bucket".to_string(), Scalar::I64((i % 16) as i64));
            row.insert("value".to_string(), Scalar::F64((i % 10) as f64));
            row
        })
        .collect()
}

fn bench_nest_operator(c: &mut Criterion) {
    let rows = make_rows(4096);
    let nest = NestOperator::new()
        .add_key("group")
        .add_key("bucket")
        .set_sort_keys(SortSpec::descending())
        .unwrap()
        .set_sort_values(SortSpec::by_key(|r: &Row| r.get("value").cloned()));

    c.bench_function("nest_map", |b| {
        b.iter(|| {
            let _ = nest.map(&rows).unwrap();
        })
    });
    c.bench_function("nest_entries", |b| {
        b.iter(|| {
            let _ = nest.entries(&rows).unwrap();
        })
    });

    let summed = nest.clone().with_rollup(Rollup::sum(KeyFn::item("value")));
    c.bench_function("nest_map_rollup_sum", |b| {
        b.iter(|| {
            let _ = summed.map(&rows).unwrap();
        })
    });
}

criterion_group!(nesting, bench_nest_operator);
criterion_main!(nesting);
