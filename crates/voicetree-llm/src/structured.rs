//! Structured completion: request, validate, retry
//!
//! Every LLM-derived datum is schema-validated before it can touch the
//! tree. Validation failure counts against the same attempt budget as a
//! transport failure; once the budget is exhausted the error propagates
//! and the caller aborts the cycle.

use crate::provider::{LlmError, LlmProvider, LlmRequest, LlmResult};
use crate::retry::RetryConfig;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Complete `request` and deserialize the response into `T`, retrying on
/// transient transport errors and schema violations.
pub async fn call_structured<T: DeserializeOwned>(
    provider: &dyn LlmProvider,
    request: LlmRequest,
    retry: &RetryConfig,
) -> LlmResult<T> {
    let mut attempt = 0u32;
    loop {
        let err = match provider.complete(request.clone()).await {
            Ok(text) => {
                let json = extract_json(&text);
                match serde_json::from_str::<T>(json) {
                    Ok(value) => return Ok(value),
                    Err(e) => {
                        warn!("response failed schema validation: {}", e);
                        LlmError::MalformedOutput(e.to_string())
                    }
                }
            }
            Err(e) => e,
        };

        attempt += 1;
        if attempt >= retry.max_attempts || !err.is_retryable() {
            return Err(err);
        }
        let delay = retry.backoff_delay(attempt - 1);
        debug!(
            "llm attempt {}/{} failed ({}), retrying in {:?}",
            attempt, retry.max_attempts, err, delay
        );
        tokio::time::sleep(delay).await;
    }
}

/// Strip markdown fences and leading prose so that a response like
/// "```json\n{...}\n```" still parses. Returns the original text when no
/// JSON-looking region is found; the serde error then reports the real
/// content.
pub fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    let inner = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    let start = inner.find(|c: char| c == '{' || c == '[');
    let end = inner.rfind(|c: char| c == '}' || c == ']');
    match (start, end) {
        (Some(s), Some(e)) if s < e => &inner[s..=e],
        _ => inner,
    }
}
