use rowdoc::testing::*;
use rowdoc::*;
use serde_json::json;

#[test]
fn field_types_parse_tags_and_aliases() {
    assert_eq!(FieldType::parse("INT64"), FieldType::Integer);
    assert_eq!(FieldType::parse("float64"), FieldType::Float);
    assert_eq!(FieldType::parse("Bool"), FieldType::Boolean);
    assert_eq!(FieldType::parse("STRUCT"), FieldType::Record);
    assert_eq!(FieldType::parse("GEOGRAPHY"), FieldType::Other("GEOGRAPHY".into()));
    assert_eq!(FieldType::Integer.to_string(), "INTEGER");
    assert_eq!(FieldType::Other("JSON".into()).as_str(), "JSON");
}

#[test]
fn schema_serializes_as_field_array() -> anyhow::Result<()> {
    let schema = TableSchema::new(vec![
        FieldSchema::new("id", "INT64"),
        FieldSchema::new("pt", "RECORD").with_fields(vec![FieldSchema::new("x", "FLOAT")]),
    ]);
    let value = serde_json::to_value(&schema)?;
    assert_eq!(
        value,
        json!([
            {"name": "id", "type": "INTEGER"},
            {"name": "pt", "type": "RECORD", "fields": [{"name": "x", "type": "FLOAT"}]}
        ])
    );
    assert_eq!(serde_json::from_value::<TableSchema>(value)?, schema);
    assert_eq!(schema.position("pt"), Some(1));
    Ok(())
}

#[test]
fn raw_values_read_from_json_cells() {
    let bytes = FieldSchema::new("b", "BYTES");
    assert_eq!(RawValue::from_json(&bytes, &json!("AQI=")), RawValue::Bytes(vec![1, 2]));
    assert_eq!(RawValue::from_json(&bytes, &json!([1, 2])), RawValue::Bytes(vec![1, 2]));
    assert_eq!(
        RawValue::from_json(&bytes, &json!("not base64!")),
        RawValue::Text("not base64!".into())
    );

    let text = FieldSchema::new("s", "STRING");
    assert_eq!(RawValue::from_json(&text, &json!(null)), RawValue::Null);
    assert_eq!(RawValue::from_json(&text, &json!(true)), RawValue::Bool(true));
    assert_eq!(RawValue::from_json(&text, &json!(3)), RawValue::Int(3));
    assert_eq!(RawValue::from_json(&text, &json!(1.5)), RawValue::Float(1.5));

    let nested = FieldSchema::new("r", "RECORD")
        .with_fields(vec![FieldSchema::new("a", "INTEGER"), FieldSchema::new("b", "STRING")]);
    assert_eq!(
        RawValue::from_json(&nested, &json!({"b": "x", "a": 1})),
        RawValue::Record(vec![("a".into(), RawValue::Int(1)), ("b".into(), RawValue::Text("x".into()))])
    );
}

#[test]
fn raw_values_render_their_text() {
    assert_eq!(RawValue::Int(-3).to_string(), "-3");
    assert_eq!(RawValue::Float(2.5).to_string(), "2.5");
    assert_eq!(RawValue::Float(7.0).to_string(), "7.0");
    assert_eq!(RawValue::Bool(false).to_string(), "false");
    assert_eq!(RawValue::Bytes(b"hi".to_vec()).to_string(), "hi");
    assert_eq!(RawValue::from(None::<i64>), RawValue::Null);
}

#[test]
fn records_look_up_fields_by_name() {
    let record = record_of(vec![("a", "STRING", "x".into()), ("b", "INTEGER", 2i64.into())]);
    assert_eq!(record.field("b"), Some(&RawValue::Int(2)));
    assert_eq!(record.field("c"), None);
    assert_eq!(record.to_json(), json!({"a": "x", "b": 2}));
}

#[test]
fn tagged_values_use_store_value_names() -> anyhow::Result<()> {
    let cases = vec![
        (TaggedValue::Null, json!("nullValue")),
        (TaggedValue::Boolean(true), json!({"booleanValue": true})),
        (TaggedValue::Integer(7), json!({"integerValue": 7})),
        (TaggedValue::Double(0.5), json!({"doubleValue": 0.5})),
        (TaggedValue::String("s".into()), json!({"stringValue": "s"})),
        (TaggedValue::Bytes(vec![1, 2]), json!({"bytesValue": "AQI="})),
        (
            TaggedValue::Timestamp(Timestamp { seconds: 1, nanos: 2 }),
            json!({"timestampValue": {"seconds": 1, "nanos": 2}}),
        ),
    ];
    for (value, expected) in cases {
        assert_eq!(serde_json::to_value(&value)?, expected);
        assert_eq!(serde_json::from_value::<TaggedValue>(expected)?, value);
    }
    Ok(())
}

#[test]
fn non_finite_doubles_use_named_strings() -> anyhow::Result<()> {
    let cases = [
        (f64::INFINITY, json!({"doubleValue": "Infinity"})),
        (f64::NEG_INFINITY, json!({"doubleValue": "-Infinity"})),
    ];
    for (x, expected) in cases {
        assert_eq!(serde_json::to_value(TaggedValue::Double(x))?, expected);
        assert_eq!(serde_json::from_value::<TaggedValue>(expected)?, TaggedValue::Double(x));
    }
    let nan = serde_json::to_value(TaggedValue::Double(f64::NAN))?;
    assert_eq!(nan, json!({"doubleValue": "NaN"}));
    assert!(serde_json::from_value::<TaggedValue>(nan)?.as_f64().is_some_and(f64::is_nan));
    assert_eq!(
        serde_json::from_value::<TaggedValue>(json!({"doubleValue": 3}))?,
        TaggedValue::Double(3.0)
    );
    assert!(serde_json::from_value::<TaggedValue>(json!({"doubleValue": "big"})).is_err());
    Ok(())
}

#[test]
fn tagged_value_accessors() {
    assert_eq!(TaggedValue::Integer(4).as_i64(), Some(4));
    assert_eq!(TaggedValue::Double(4.5).as_f64(), Some(4.5));
    assert_eq!(TaggedValue::String("s".into()).as_str(), Some("s"));
    assert_eq!(TaggedValue::Bytes(vec![1]).as_bytes(), Some(&[1u8][..]));
    assert!(TaggedValue::Null.is_null());
    assert_eq!(TaggedValue::Integer(4).kind(), "integerValue");
}

#[test]
fn diagnostics_collect_dropped_records() -> anyhow::Result<()> {
    let record = record_of(vec![("n", "INTEGER", "oops".into())]);
    let err = convert_record(&record).unwrap_err();

    let mut diagnostics = DiagnosticsCollector::new();
    diagnostics.record(DroppedRecord::conversion(&record, err));
    assert_eq!(diagnostics.dropped_count(), 1);
    assert_eq!(diagnostics.count_by_stage(Stage::Convert), 1);
    assert_eq!(diagnostics.count_by_stage(Stage::Assemble), 0);

    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("dropped.json");
    diagnostics.write_to_file(&path)?;
    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    assert_eq!(written[0]["content"], r#"{"n":"oops"}"#);
    assert!(written[0].get("cause").is_none());
    Ok(())
}
