use rowdoc::testing::*;
use rowdoc::*;
use std::time::Instant;

fn writes(n: usize) -> anyhow::Result<Vec<DocumentWrite>> {
    let assembler = DocumentAssembler::new(DocumentTarget::new("p", "(default)", "c", "r"));
    (0..n)
        .map(|i| {
            let fields = fields_of(vec![("i", TaggedValue::Integer(i as i64))]);
            Ok(assembler.assemble(fields)?)
        })
        .collect()
}

fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        initial_delay_ms: 1,
        max_delay_ms: 2,
        backoff_multiplier: 2.0,
    }
}

#[test]
fn writes_are_split_into_batches() -> anyhow::Result<()> {
    let store = FakeDocumentStore::new();
    let mut sink = DocumentSink::new(&store, WriteQos::default().with_batch_size(4))?;

    let report = sink.write_all(&writes(10)?)?;
    assert_eq!(
        report,
        SinkReport {
            documents_written: 10,
            batches: 3,
            retries: 0
        }
    );
    assert_eq!(store.batch_sizes(), vec![4, 4, 2]);
    assert_eq!(store.len(), 10);
    Ok(())
}

#[test]
fn only_failed_writes_are_resent() -> anyhow::Result<()> {
    let store = FakeDocumentStore::new();
    store.fail_next_write(1, ErrorKind::Aborted);
    let qos = WriteQos::default().with_retry(fast_retry(3));
    let mut sink = DocumentSink::new(&store, qos)?;

    let report = sink.write_all(&writes(3)?)?;
    assert_eq!(report.documents_written, 3);
    assert_eq!(report.batches, 1);
    assert_eq!(store.batch_sizes(), vec![3, 1]);
    assert_eq!(store.len(), 3);
    Ok(())
}

#[test]
fn non_retryable_write_failure_is_fatal() -> anyhow::Result<()> {
    let store = FakeDocumentStore::new();
    store.fail_next_write(0, ErrorKind::InvalidInput);
    let mut sink = DocumentSink::new(&store, WriteQos::default().with_retry(fast_retry(3)))?;

    let batch = writes(2)?;
    let err = sink.write_all(&batch).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidInput);
    assert_eq!(err.source.as_deref(), Some(batch[0].name.as_str()));
    assert_eq!(store.batch_calls(), 1);
    Ok(())
}

#[test]
fn retry_budget_is_bounded() -> anyhow::Result<()> {
    let store = FakeDocumentStore::new();
    store.fail_next_batches(10, ErrorKind::Timeout);
    let mut sink = DocumentSink::new(&store, WriteQos::default().with_retry(fast_retry(3)))?;

    let err = sink.write_all(&writes(1)?).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Timeout);
    assert!(err.message.starts_with("batch 0:"), "{err}");
    assert_eq!(store.batch_calls(), 3);
    assert!(store.is_empty());
    Ok(())
}

#[test]
fn earlier_batches_stay_applied_after_a_failure() -> anyhow::Result<()> {
    let store = FakeDocumentStore::new();
    let qos = WriteQos::default()
        .with_batch_size(2)
        .with_retry(RetryConfig::no_retry());
    let mut sink = DocumentSink::new(&store, qos)?;

    sink.write_all(&writes(2)?)?;
    store.fail_next_batches(1, ErrorKind::Authentication);
    assert!(sink.write_all(&writes(2)?).is_err());
    assert_eq!(store.len(), 2);
    Ok(())
}

#[test]
fn rate_limit_spreads_writes_over_time() -> anyhow::Result<()> {
    let store = FakeDocumentStore::new();
    let qos = WriteQos::default()
        .with_batch_size(10)
        .with_max_writes_per_second(100);
    let mut sink = DocumentSink::new(&store, qos)?;

    let start = Instant::now();
    // The first 100 writes drain the bucket, the next 50 need ~0.5s of refill.
    sink.write_all(&writes(150)?)?;
    let elapsed = start.elapsed();
    assert!(elapsed.as_millis() >= 400, "finished in {elapsed:?}");
    assert_eq!(store.len(), 150);
    Ok(())
}

#[test]
fn invalid_qos_is_rejected() {
    let store = FakeDocumentStore::new();
    let err = DocumentSink::new(&store, WriteQos::default().with_batch_size(MAX_BATCH_SIZE + 1))
        .err()
        .expect("oversized batch rejected");
    assert!(matches!(err, ConfigError::Qos(_)));
}
