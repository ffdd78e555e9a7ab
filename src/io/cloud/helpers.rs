//! Retry, backoff and query helpers for cloud collaborators.

use crate::io::cloud::traits::CloudResult;
use std::time::Duration;

// ============================================================================
// Retry Helper
// ============================================================================

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// No retries, no waiting.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            backoff_multiplier: 1.0,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self
            .backoff_multiplier
            .max(1.0)
            .powi(i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX));
        // Float-to-int casts saturate, so an infinite factor lands on max_delay_ms.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let ms = (self.initial_delay_ms as f64 * factor) as u64;
        Duration::from_millis(ms.min(self.max_delay_ms))
    }
}

/// Retry a function with exponential backoff
///
/// Only errors whose kind is retryable (network, timeout, unavailable,
/// throttled, aborted) are retried.
///
/// # Errors
///
/// Returns the last error once it is not retryable or attempts are exhausted.
pub fn retry_with_backoff<F, T>(config: &RetryConfig, mut operation: F) -> CloudResult<T>
where
    F: FnMut() -> CloudResult<T>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation() {
            Ok(result) => return Ok(result),
            Err(err) => {
                if !err.is_retryable() || attempt >= config.max_attempts {
                    return Err(err);
                }
                std::thread::sleep(config.delay_after(attempt));
            }
        }
    }
}

// ============================================================================
// Query Helper
// ============================================================================

/// Table named by a `SELECT ... FROM <table> ...` query, with backticks and a
/// trailing `;` removed. Local backends only understand this shape.
#[must_use]
pub fn table_of_query(sql: &str) -> Option<&str> {
    let parts: Vec<&str> = sql.split_whitespace().collect();
    if !parts.first()?.eq_ignore_ascii_case("SELECT") {
        return None;
    }
    let from = parts.iter().position(|p| p.eq_ignore_ascii_case("FROM"))?;
    let table = parts.get(from + 1)?;
    Some(table.trim_end_matches(';').trim_matches('`'))
}
