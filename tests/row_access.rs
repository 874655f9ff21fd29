use std::collections::HashMap;
use std::sync::Arc;

use result_row::keymap::{KeyRecord, Keymap};
use result_row::metadata::{MetadataOptions, ResultMetadata};
use result_row::processors::{processor, to_upper, Processor};
use result_row::row::{Item, NoFallback, Row, SliceSpec};
use result_row::types::{ColumnKey, DataType, Field, Schema, Value};
use result_row::{ErrorKind, RowError};

fn xy_row() -> Row<NoFallback> {
    let keymap: Keymap = [
        ("x", KeyRecord::new(Some(0), 0i64, "x")),
        ("y", KeyRecord::new(Some(1), 0i64, "y")),
    ]
    .into_iter()
    .collect();
    Row::new(
        Arc::new(NoFallback),
        &[None, Some(to_upper())],
        Arc::new(keymap),
        vec![Value::from("a"), Value::from("b")],
    )
    .unwrap()
}

fn numbers_row(n: i64) -> Row<NoFallback> {
    let processors: Vec<Option<Processor>> = vec![None; n as usize];
    Row::new(
        Arc::new(NoFallback),
        &processors,
        Arc::new(Keymap::default()),
        (0..n).map(Value::Int64).collect(),
    )
    .unwrap()
}

#[test]
fn upper_processor_scenario() {
    let row = xy_row();
    assert_eq!(row.get(0).unwrap(), &Value::from("a"));
    assert_eq!(row.get_by_key(&"y".into()).unwrap(), &Value::from("B"));
    assert_eq!(row.len(), 2);
    assert_eq!(
        row.iter().cloned().collect::<Vec<_>>(),
        vec![Value::from("a"), Value::from("B")]
    );
}

#[test]
fn ambiguous_alias_scenario() {
    let keymap: Keymap = [("dup", KeyRecord::new(None, 0i64, "dup"))]
        .into_iter()
        .collect();
    let row = Row::new(
        Arc::new(NoFallback),
        &[None],
        Arc::new(keymap),
        vec![Value::Int64(1)],
    )
    .unwrap();

    let err = row.get_by_key(&"dup".into()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Ambiguous);
    assert_eq!(
        err.to_string(),
        "Ambiguous column name 'dup' in result set column descriptions"
    );
}

#[test]
fn processors_apply_to_matching_positions_only() {
    let double = processor(|v| match v {
        Value::Int64(i) => Ok(Value::Int64(i * 2)),
        other => Ok(other),
    });
    let row = Row::new(
        Arc::new(NoFallback),
        &[Some(double.clone()), None, Some(double)],
        Arc::new(Keymap::default()),
        vec![Value::Int64(1), Value::Int64(2), Value::Int64(3)],
    )
    .unwrap();
    assert_eq!(
        row.to_vec(),
        vec![Value::Int64(2), Value::Int64(2), Value::Int64(6)]
    );
}

#[test]
fn construction_fails_only_on_length_mismatch() {
    for (values, processors) in [(0usize, 1usize), (2, 1), (1, 3)] {
        let procs: Vec<Option<Processor>> = vec![None; processors];
        let err = Row::new(
            Arc::new(NoFallback),
            &procs,
            Arc::new(Keymap::default()),
            vec![Value::Null; values],
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
    }

    let empty = Row::new(
        Arc::new(NoFallback),
        &[],
        Arc::new(Keymap::default()),
        Vec::new(),
    )
    .unwrap();
    assert!(empty.is_empty());
}

#[test]
fn processor_error_is_carried_as_source() {
    use std::error::Error as _;

    let failing = processor(|_| Err("bad input".into()));
    let err = Row::new(
        Arc::new(NoFallback),
        &[Some(failing)],
        Arc::new(Keymap::default()),
        vec![Value::Null],
    )
    .unwrap_err();
    assert_eq!(err.source().unwrap().to_string(), "bad input");
}

#[test]
fn slices_match_positional_gets() {
    let row = numbers_row(6);
    let len = row.len() as isize;
    let normalize = |i: isize| if i < 0 { (i + len).max(0) } else { i.min(len) };
    for a in -8..8isize {
        for b in -8..8isize {
            let expected: Vec<Value> = (normalize(a)..normalize(b))
                .map(|i| row.get(i).unwrap().clone())
                .collect();
            assert_eq!(row.slice(a..b).unwrap(), expected, "slice {a}..{b}");
        }
    }
}

#[test]
fn stepped_and_reversed_slices() {
    let row = numbers_row(5);
    assert_eq!(
        row.slice(SliceSpec::default().with_step(-2)).unwrap(),
        vec![Value::Int64(4), Value::Int64(2), Value::Int64(0)]
    );
    assert_eq!(
        row.slice(SliceSpec::new(Some(1), None, Some(3))).unwrap(),
        vec![Value::Int64(1), Value::Int64(4)]
    );
    assert!(matches!(
        row.slice(SliceSpec::default().with_step(0)).unwrap_err(),
        RowError::ZeroSliceStep
    ));
}

#[test]
fn subscript_returns_projection_for_slices() {
    let row = numbers_row(3);
    match row.get_item(1isize..).unwrap() {
        Item::Values(vs) => assert_eq!(vs, vec![Value::Int64(1), Value::Int64(2)]),
        other => panic!("expected projection, got {other:?}"),
    }
    assert_eq!(row.get_item(-3isize).unwrap().as_value(), Some(&Value::Int64(0)));
    assert_eq!(
        row.get_item(5isize).unwrap_err().kind(),
        ErrorKind::Index
    );
}

#[test]
fn keyed_lookup_matches_positional_lookup() {
    let schema = Schema::new(vec![
        Field::new("id", DataType::Int64).with_alias("pk"),
        Field::new("name", DataType::Utf8),
    ]);
    let meta = Arc::new(ResultMetadata::new(schema, MetadataOptions::default()));
    let row = meta
        .make_row(vec![Value::Int64(9), Value::from("Ada")])
        .unwrap();

    for (key, record) in meta.keymap().iter() {
        let pos = record.position.unwrap() as isize;
        assert_eq!(row.get_by_key(key).unwrap(), row.get(pos).unwrap());
    }
    assert_eq!(row.get_by_key(&ColumnKey::Token(1)).unwrap(), &Value::from("Ada"));
}

#[test]
fn rows_work_as_map_keys() {
    let schema = Schema::new(vec![Field::new("id", DataType::Int64)]);
    let meta = Arc::new(ResultMetadata::new(schema, MetadataOptions::default()));
    let a = meta.make_row(vec![Value::Int64(1)]).unwrap();
    let b = numbers_row(2).slice(1isize..).unwrap();

    let mut counts: HashMap<Row<ResultMetadata>, usize> = HashMap::new();
    *counts.entry(a.clone()).or_default() += 1;
    *counts.entry(meta.make_row(b).unwrap()).or_default() += 1;
    assert_eq!(counts.len(), 1);
    assert_eq!(counts[&a], 2);
}

#[test]
fn attribute_access_reports_attribute_errors() {
    let row = xy_row();
    let err = row.get_attr("nope").unwrap_err();
    assert!(matches!(err, RowError::NoSuchAttribute { ref name } if name == "nope"));
    assert!(row.get_attr("y").is_ok());
}

#[test]
fn rows_are_shareable_across_threads() {
    let row = Arc::new(xy_row());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let row = Arc::clone(&row);
            std::thread::spawn(move || row.get_by_key(&"y".into()).unwrap().clone())
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), Value::from("B"));
    }
}
