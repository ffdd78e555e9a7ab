use rowdoc::testing::*;
use rowdoc::*;

fn options() -> ExportOptions {
    ExportOptions::new("SELECT * FROM events", "exports", "run-42").with_project_id("proj")
}

fn fast_qos() -> WriteQos {
    WriteQos::default().with_retry(RetryConfig {
        initial_delay_ms: 1,
        max_delay_ms: 2,
        ..RetryConfig::default()
    })
}

fn sequential() -> Runner {
    Runner::new(ExecMode::Sequential)
}

#[test]
fn single_row_becomes_one_document() -> anyhow::Result<()> {
    let warehouse = FakeWarehouseIO::new();
    warehouse.add_table(
        "events",
        sample_schema(),
        vec![vec![7i64.into(), "hello".into(), vec![1u8, 2].into()]],
    );
    let store = FakeDocumentStore::new();

    let report = run_export(&options(), &warehouse, &store, &fast_qos(), &sequential())?;
    assert_eq!(report.records_read, 1);
    assert_eq!(report.documents_written, 1);
    assert_eq!(report.dropped(), 0);

    let docs = store.documents();
    assert_eq!(docs.len(), 1);
    let (path, fields) = &docs[0];
    assert_document_path(path, &DocumentTarget::new("proj", "(default)", "exports", "run-42"));
    assert_eq!(
        *fields,
        fields_of(vec![
            ("id", TaggedValue::Integer(7)),
            ("label", TaggedValue::String("hello".into())),
            ("blob", TaggedValue::Bytes(vec![1, 2])),
        ])
    );
    Ok(())
}

#[test]
fn geography_is_exported_as_text() -> anyhow::Result<()> {
    let warehouse = FakeWarehouseIO::new();
    warehouse.add_table(
        "events",
        TableSchema::new(vec![FieldSchema::new("where", "GEOGRAPHY")]),
        vec![vec!["POINT(-122.35 47.62)".into()]],
    );
    let store = FakeDocumentStore::new();

    run_export(&options(), &warehouse, &store, &fast_qos(), &sequential())?;
    let (_, fields) = &store.documents()[0];
    assert_eq!(fields["where"], TaggedValue::String("POINT(-122.35 47.62)".into()));
    Ok(())
}

#[test]
fn bad_records_are_dropped_and_reported() -> anyhow::Result<()> {
    let warehouse = FakeWarehouseIO::new();
    warehouse.add_table(
        "events",
        TableSchema::new(vec![FieldSchema::new("n", "INTEGER")]),
        vec![vec!["1".into()], vec!["12abc".into()], vec!["3".into()]],
    );
    let store = FakeDocumentStore::new();

    let report = run_export(&options(), &warehouse, &store, &fast_qos(), &sequential())?;
    assert_eq!(report.records_read, 3);
    assert_eq!(report.documents_written, 2);
    assert_eq!(report.dropped(), 1);
    assert_eq!(report.diagnostics.count_by_stage(Stage::Convert), 1);

    let dropped = &report.diagnostics.dropped()[0];
    assert!(dropped.content.contains("12abc"), "{dropped}");
    assert!(matches!(
        dropped.cause,
        Some(RecordError::Convert(ConvertError::Parse { .. }))
    ));

    let mut values: Vec<i64> = store
        .documents()
        .iter()
        .filter_map(|(_, f)| f["n"].as_i64())
        .collect();
    values.sort_unstable();
    assert_eq!(values, vec![1, 3]);

    let json: serde_json::Value = serde_json::from_str(&report.diagnostics_json()?)?;
    assert_eq!(json[0]["stage"], "convert");
    Ok(())
}

#[test]
fn parallel_and_sequential_runs_write_the_same_fields() -> anyhow::Result<()> {
    let rows: Vec<Vec<RawValue>> = (0..1_000i64)
        .map(|i| vec![i.into(), format!("label-{i}").into(), vec![(i % 256) as u8].into()])
        .collect();
    let warehouse = FakeWarehouseIO::new();
    warehouse.add_table("events", sample_schema(), rows);

    let seq_store = FakeDocumentStore::new();
    run_export(&options(), &warehouse, &seq_store, &fast_qos(), &sequential())?;
    let par_store = FakeDocumentStore::new();
    let parallel = Runner::new(ExecMode::Parallel {
        threads: Some(4),
        partitions: Some(7),
    });
    run_export(&options(), &warehouse, &par_store, &fast_qos(), &parallel)?;

    let by_id = |store: &FakeDocumentStore| {
        let mut docs: Vec<_> = store.documents().into_iter().map(|(_, f)| f).collect();
        docs.sort_by_key(|f| f["id"].as_i64());
        docs
    };
    assert_eq!(by_id(&seq_store), by_id(&par_store));
    assert_eq!(par_store.len(), 1_000);
    // 1000 writes in batches of at most 500.
    assert_eq!(par_store.batch_sizes(), vec![500, 500]);
    Ok(())
}

#[test]
fn rerunning_creates_new_documents() -> anyhow::Result<()> {
    let warehouse = sample_warehouse("events");
    let store = FakeDocumentStore::new();
    run_export(&options(), &warehouse, &store, &fast_qos(), &sequential())?;
    run_export(&options(), &warehouse, &store, &fast_qos(), &sequential())?;
    assert_eq!(store.len(), 2 * sample_rows().len());
    Ok(())
}

#[test]
fn transient_store_failures_are_retried() -> anyhow::Result<()> {
    let warehouse = sample_warehouse("events");
    let store = FakeDocumentStore::new();
    store.fail_next_batches(2, ErrorKind::ServiceUnavailable);

    let report = run_export(&options(), &warehouse, &store, &fast_qos(), &sequential())?;
    assert_eq!(report.documents_written, 3);
    assert_eq!(report.retries, 2);
    assert_eq!(store.batch_calls(), 3);
    assert_eq!(store.len(), 3);
    Ok(())
}

#[test]
fn permanent_store_failure_aborts_the_run() {
    let warehouse = sample_warehouse("events");
    let store = FakeDocumentStore::new();
    store.fail_next_batches(1, ErrorKind::Authorization);

    let err = run_export(&options(), &warehouse, &store, &fast_qos(), &sequential()).unwrap_err();
    let cloud = err.downcast_ref::<CloudIOError>().expect("store error");
    assert_eq!(cloud.kind, ErrorKind::Authorization);
    assert!(store.is_empty());
}

#[test]
fn missing_table_aborts_the_run() {
    let warehouse = FakeWarehouseIO::new();
    let store = FakeDocumentStore::new();
    let err = run_export(&options(), &warehouse, &store, &fast_qos(), &sequential()).unwrap_err();
    assert_eq!(
        err.downcast_ref::<CloudIOError>().map(|e| e.kind),
        Some(ErrorKind::NotFound)
    );
}

#[test]
fn invalid_options_fail_before_reading() {
    let warehouse = sample_warehouse("events");
    let store = FakeDocumentStore::new();
    let bad = ExportOptions::new("SELECT * FROM events", "exports", "run/42").with_project_id("proj");

    let err = run_export(&bad, &warehouse, &store, &fast_qos(), &sequential()).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ConfigError>(),
        Some(&ConfigError::InvalidRunId("run/42".into()))
    );
    assert_eq!(store.batch_calls(), 0);
}

#[test]
fn empty_result_writes_nothing() -> anyhow::Result<()> {
    let warehouse = FakeWarehouseIO::new();
    warehouse.add_table("events", sample_schema(), Vec::new());
    let store = FakeDocumentStore::new();

    let report = run_export(&options(), &warehouse, &store, &fast_qos(), &Runner::default())?;
    assert_eq!(report.records_read, 0);
    assert_eq!(report.batches, 0);
    assert_eq!(store.batch_calls(), 0);
    Ok(())
}

#[test]
fn read_query_with_applies_the_parse_function() -> anyhow::Result<()> {
    let p = Pipeline::default();
    let warehouse = sample_warehouse("events");
    let labels = read_query_with(&p, &warehouse, "SELECT * FROM events", |r: &Record| {
        r.field("label").map(ToString::to_string)
    })?
    .collect_seq()?;
    assert_eq!(
        labels,
        vec![Some("hello".to_string()), Some("world".to_string()), Some("null".to_string())]
    );
    Ok(())
}
