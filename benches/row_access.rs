use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use result_row::metadata::{MetadataOptions, ResultMetadata};
use result_row::types::{ColumnKey, DataType, Field, Schema, Value};

fn wide_meta(coerce_types: bool) -> Arc<ResultMetadata> {
    let fields = (0..16)
        .map(|i| Field::new(format!("col_{i}"), DataType::Int64).with_alias(format!("c{i}")))
        .collect();
    let opts = MetadataOptions {
        coerce_types,
        ..MetadataOptions::default()
    };
    Arc::new(ResultMetadata::new(Schema::new(fields), opts))
}

fn raw_ints() -> Vec<Value> {
    (0..16).map(Value::Int64).collect()
}

fn raw_text() -> Vec<Value> {
    (0..16).map(|i| Value::from(i.to_string())).collect()
}

fn bench_construction(c: &mut Criterion) {
    let plain = wide_meta(false);
    let coerced = wide_meta(true);

    c.bench_function("make_row/no_processors", |b| {
        b.iter(|| plain.make_row(black_box(raw_ints())).unwrap())
    });
    c.bench_function("make_row/coerce_text", |b| {
        b.iter(|| coerced.make_row(black_box(raw_text())).unwrap())
    });
}

fn bench_lookup(c: &mut Criterion) {
    let meta = wide_meta(false);
    let row = meta.make_row(raw_ints()).unwrap();
    let key = ColumnKey::from("c9");

    c.bench_function("get/positional", |b| b.iter(|| row.get(black_box(-3)).unwrap().clone()));
    c.bench_function("get_by_key/alias", |b| {
        b.iter(|| row.get_by_key(black_box(&key)).unwrap().clone())
    });

    let ex = meta.extractor(["col_1", "c5", "col_12", "c15"]);
    c.bench_function("extractor/4_keys", |b| b.iter(|| ex.call(black_box(&row)).unwrap()));
}

criterion_group!(benches, bench_construction, bench_lookup);
criterion_main!(benches);
