//! Batched, throttled, retrying writer of document write intents.
//!
//! Writes are grouped into batches of at most [`MAX_BATCH_SIZE`], optionally
//! throttled by a writes-per-second budget, and retried with exponential
//! backoff. A rejected batch is retried whole; a batch where only some writes
//! failed is retried with just those writes. Any non-retryable failure, or a
//! retryable one that outlives the retry budget, aborts the run.

use crate::document::DocumentWrite;
use crate::error::ConfigError;
use crate::io::cloud::helpers::{RetryConfig, retry_with_backoff};
use crate::io::cloud::traits::{CloudIOError, CloudResult, DocumentStoreIO, ErrorKind};
use serde::Serialize;
use std::borrow::Cow;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Largest batch the document store accepts in one call.
pub const MAX_BATCH_SIZE: usize = 500;

/// Quality-of-service settings for the sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriteQos {
    pub batch_size: usize,
    pub retry: RetryConfig,
    /// Writes per second across the run (0 = unlimited).
    pub max_writes_per_second: u32,
}

impl Default for WriteQos {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            retry: RetryConfig::default(),
            max_writes_per_second: 0,
        }
    }
}

impl WriteQos {
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_max_writes_per_second(mut self, rate: u32) -> Self {
        self.max_writes_per_second = rate;
        self
    }

    /// # Errors
    ///
    /// Fails when the batch size is outside `1..=MAX_BATCH_SIZE` or the retry
    /// policy allows no attempt at all.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::Qos(format!(
                "batch size must be in 1..={MAX_BATCH_SIZE}, got {}",
                self.batch_size
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Qos("retry max_attempts must be at least 1".into()));
        }
        Ok(())
    }
}

/// Token bucket refilled continuously at `rate` tokens per second.
///
/// A request larger than the capacity waits for a full bucket and then drives
/// the balance negative, so the long-run rate still holds.
#[derive(Debug)]
pub(crate) struct TokenBucket {
    capacity: f64,
    tokens: f64,
    rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub(crate) fn new(rate: u32) -> Self {
        let rate = f64::from(rate.max(1));
        Self {
            capacity: rate,
            tokens: rate,
            rate,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_refill = now;
    }

    /// Time to wait before `n` tokens may be taken.
    pub(crate) fn wait_for(&mut self, n: usize) -> Duration {
        self.refill();
        #[allow(clippy::cast_precision_loss)]
        let needed = (n as f64).min(self.capacity);
        if self.tokens >= needed {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((needed - self.tokens) / self.rate)
        }
    }

    /// Take `n` tokens, sleeping first if the bucket is short. Returns the wait.
    pub(crate) fn acquire(&mut self, n: usize) -> Duration {
        let wait = self.wait_for(n);
        if !wait.is_zero() {
            std::thread::sleep(wait);
            self.refill();
        }
        #[allow(clippy::cast_precision_loss)]
        let taken = n as f64;
        self.tokens -= taken;
        wait
    }
}

/// Totals for one [`DocumentSink::write_all`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SinkReport {
    pub documents_written: usize,
    pub batches: usize,
    /// Store calls beyond the first for each batch.
    pub retries: usize,
}

/// Applies write intents to a [`DocumentStoreIO`].
pub struct DocumentSink<'a, S: DocumentStoreIO + ?Sized> {
    store: &'a S,
    qos: WriteQos,
    bucket: Option<TokenBucket>,
}

impl<'a, S: DocumentStoreIO + ?Sized> DocumentSink<'a, S> {
    /// # Errors
    ///
    /// See [`WriteQos::validate`].
    pub fn new(store: &'a S, qos: WriteQos) -> Result<Self, ConfigError> {
        qos.validate()?;
        let bucket = (qos.max_writes_per_second > 0)
            .then(|| TokenBucket::new(qos.max_writes_per_second));
        Ok(Self { store, qos, bucket })
    }

    #[must_use]
    pub fn qos(&self) -> &WriteQos {
        &self.qos
    }

    /// Apply every write, batch by batch.
    ///
    /// # Errors
    ///
    /// Returns the first non-retryable store error, or the last retryable one
    /// once the retry budget is spent. Batches committed before the failure
    /// stay applied.
    pub fn write_all(&mut self, writes: &[DocumentWrite]) -> CloudResult<SinkReport> {
        let mut report = SinkReport::default();
        for (index, chunk) in writes.chunks(self.qos.batch_size).enumerate() {
            let (written, retries) = self.write_batch(index, chunk)?;
            report.documents_written += written;
            report.retries += retries;
            report.batches += 1;
            debug!(batch = index, size = chunk.len(), "batch committed");
        }
        Ok(report)
    }

    fn write_batch(&mut self, index: usize, chunk: &[DocumentWrite]) -> CloudResult<(usize, usize)> {
        let retry = self.qos.retry;
        let store = self.store;
        let mut pending: Cow<'_, [DocumentWrite]> = Cow::Borrowed(chunk);
        let mut written = 0;
        let mut calls = 0;
        let mut round = 0;

        loop {
            round += 1;
            let mut attempt = 0;
            let bucket = &mut self.bucket;
            let statuses = retry_with_backoff(&retry, || {
                calls += 1;
                attempt += 1;
                if attempt > 1 {
                    warn!(batch = index, attempt, "retrying rejected batch");
                }
                if let Some(bucket) = bucket.as_mut() {
                    let waited = bucket.acquire(pending.len());
                    if !waited.is_zero() {
                        debug!(batch = index, ?waited, "throttled");
                    }
                }
                store.batch_write(&pending)
            })
            .map_err(|e| batch_error(index, e))?;

            if statuses.len() != pending.len() {
                return Err(CloudIOError::new(
                    ErrorKind::InternalError,
                    format!(
                        "batch {index}: store returned {} statuses for {} writes",
                        statuses.len(),
                        pending.len()
                    ),
                ));
            }

            let mut failed = Vec::new();
            let mut last_error = None;
            for (write, status) in pending.iter().zip(statuses) {
                match status {
                    Ok(()) => written += 1,
                    Err(e) if e.is_retryable() => {
                        failed.push(write.clone());
                        last_error = Some(e);
                    }
                    Err(e) => {
                        return Err(batch_error(index, e).with_source(write.name.to_string()));
                    }
                }
            }

            let Some(last_error) = last_error else {
                return Ok((written, calls - 1));
            };
            if round >= retry.max_attempts {
                return Err(batch_error(index, last_error));
            }
            warn!(
                batch = index,
                failed = failed.len(),
                error = %last_error,
                "retrying failed writes"
            );
            std::thread::sleep(retry.delay_after(round));
            pending = Cow::Owned(failed);
        }
    }
}

fn batch_error(index: usize, err: CloudIOError) -> CloudIOError {
    CloudIOError {
        message: format!("batch {index}: {}", err.message),
        ..err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_within_capacity_does_not_wait() {
        let mut bucket = TokenBucket::new(100);
        assert_eq!(bucket.wait_for(50), Duration::ZERO);
        assert_eq!(bucket.acquire(50), Duration::ZERO);
        assert_eq!(bucket.wait_for(40), Duration::ZERO);
    }

    #[test]
    fn test_bucket_short_of_tokens_waits() {
        let mut bucket = TokenBucket::new(10);
        bucket.acquire(10);
        let wait = bucket.wait_for(5);
        assert!(wait > Duration::from_millis(300), "waited {wait:?}");
        assert!(wait <= Duration::from_millis(500), "waited {wait:?}");
    }

    #[test]
    fn test_oversized_request_caps_at_capacity() {
        let mut bucket = TokenBucket::new(1000);
        // More than a second's budget is still granted once the bucket is full.
        assert_eq!(bucket.wait_for(5000), Duration::ZERO);
    }

    #[test]
    fn test_qos_validation() {
        assert!(WriteQos::default().validate().is_ok());
        assert!(WriteQos::default().with_batch_size(0).validate().is_err());
        assert!(WriteQos::default().with_batch_size(501).validate().is_err());
        let no_attempts = RetryConfig {
            max_attempts: 0,
            ..RetryConfig::default()
        };
        assert!(WriteQos::default().with_retry(no_attempts).validate().is_err());
    }
}
