//! Seam around the external vision/LLM extraction call.
//!
//! The call itself lives outside this crate. What lives here is the contract
//! an extractor implements, the classification of its failures, the parsing
//! of a model reply into a [`GradeRecord`], and a retry driver that callers
//! may wrap around any extractor.

use crate::model::GradeRecord;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// Transient (quota, rate limiting). Worth another attempt.
    #[error("extraction temporarily unavailable: {0}")]
    Retryable(String),
    /// Malformed output or a failure another attempt will not fix.
    #[error("extraction failed: {0}")]
    Terminal(String),
}

impl ExtractError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExtractError::Retryable(_))
    }
}

pub trait Extractor {
    fn extract(&self, image: &[u8], mime_type: &str) -> Result<GradeRecord, ExtractError>;
}

const RETRYABLE_MARKERS: &[&str] = &["429", "rate", "quota", "resource exhausted"];

/// Classifies a raw provider error message.
pub fn classify_failure(message: impl Into<String>) -> ExtractError {
    let message = message.into();
    let lower = message.to_lowercase();
    if RETRYABLE_MARKERS.iter().any(|m| lower.contains(m)) {
        ExtractError::Retryable(message)
    } else {
        ExtractError::Terminal(message)
    }
}

/// Strips the markdown fence models tend to wrap JSON in.
fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest;
    }
    if let Some(rest) = body.strip_prefix("```") {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// Parses a model reply into a grade record. Any parse failure is terminal.
pub fn parse_extraction_text(text: &str) -> Result<GradeRecord, ExtractError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(ExtractError::Terminal("empty extraction response".to_string()));
    }
    serde_json::from_str(body)
        .map_err(|e| ExtractError::Terminal(format!("unparseable extraction response: {e}")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry that follows the zero-based `attempt`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Runs `extractor`, retrying retryable failures with exponential backoff.
///
/// Terminal failures return immediately. No sleep follows the last attempt.
/// `sleep` is injected so callers choose how to wait.
pub fn extract_with_retry<E, S>(
    extractor: &E,
    image: &[u8],
    mime_type: &str,
    policy: &RetryPolicy,
    mut sleep: S,
) -> Result<GradeRecord, ExtractError>
where
    E: Extractor + ?Sized,
    S: FnMut(Duration),
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt: u32 = 0;
    loop {
        match extractor.extract(image, mime_type) {
            Ok(record) => return Ok(record),
            Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts = attempts,
                    delay_ms = delay.as_millis() as u64,
                    "extraction rate limited, retrying"
                );
                sleep(delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
