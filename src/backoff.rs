// SPDX-FileCopyrightText: 2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Retry helper with exponential backoff for remote API calls.
///
/// GitHub answers statistics endpoints with `202 Accepted` while it warms its
/// caches; those responses surface as deserialize failures and are absorbed
/// here the same way as transient network errors.
use std::time::Duration;

use masterror::AppError;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Policy controlling retry attempts and delays.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Maximum number of attempts before the last error is returned.
    pub max_attempts:     u32,
    /// Initial delay between attempts in milliseconds.
    pub initial_delay_ms: u64,
    /// Multiplier applied to the delay after every failed attempt.
    pub factor:           f64
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts:     4,
            initial_delay_ms: 1000,
            factor:           2.0
        }
    }
}

/// Executes an async operation, retrying failures with exponential backoff.
///
/// # Arguments
///
/// * `policy` - Attempt limit and delay configuration
/// * `operation_name` - Name of the operation for logging
/// * `f` - Async closure producing the fallible future
///
/// # Errors
///
/// Returns the last error encountered once all attempts are exhausted.
pub async fn with_backoff<F, Fut, T>(
    policy: &BackoffPolicy,
    operation_name: &str,
    mut f: F
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AppError>>
{
    let mut delay_ms = policy.initial_delay_ms;

    for attempt in 1..=policy.max_attempts {
        match f().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("{operation_name} recovered on attempt {attempt}");
                }
                return Ok(result);
            }
            Err(error) if attempt < policy.max_attempts => {
                warn!(
                    "{operation_name} attempt {attempt}/{max} failed: {error}; next try in {delay_ms}ms",
                    max = policy.max_attempts
                );
                sleep(Duration::from_millis(delay_ms)).await;
                delay_ms = (delay_ms as f64 * policy.factor) as u64;
            }
            Err(error) => {
                warn!(
                    "{operation_name} gave up after {max} attempts: {error}",
                    max = policy.max_attempts
                );
                return Err(error);
            }
        }
    }

    Err(AppError::service(format!("{operation_name}: retry policy allows no attempts")))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use serde_json::{Value, json};

    use super::*;

    fn quick_policy(max_attempts: u32) -> BackoffPolicy {
        BackoffPolicy {
            max_attempts,
            initial_delay_ms: 1,
            factor: 2.0
        }
    }

    #[test]
    fn policy_default_values() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.initial_delay_ms, 1000);
        assert_eq!(policy.factor, 2.0);
    }

    #[tokio::test]
    async fn first_attempt_success_returns_without_delay() {
        let document = with_backoff(&BackoffPolicy::default(), "rest lookup", || async {
            Ok::<_, AppError>(json!({ "views": [] }))
        })
        .await
        .expect("lookup should succeed");

        assert!(document.get("views").is_some());
    }

    #[tokio::test]
    async fn stats_endpoint_warmup_is_absorbed() {
        // GitHub answers /stats/contributors with 202 and an empty body until
        // its cache is warm; the client surfaces that as a deserialize error.
        let attempts = AtomicU32::new(0);
        let policy = quick_policy(4);

        let document: Value = with_backoff(&policy, "contributor stats", || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if attempt < 3 {
                    Err(AppError::service(
                        "GET /repos/octocat/hello/stats/contributors failed: \
                         failed to deserialize empty 202 response"
                    ))
                } else {
                    Ok(json!([{ "author": { "login": "octocat" }, "weeks": [] }]))
                }
            }
        })
        .await
        .expect("warmup should resolve within the attempt budget");

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert!(document.as_array().is_some_and(|entries| entries.len() == 1));
    }

    #[tokio::test]
    async fn exhausted_attempts_return_the_last_error() {
        let attempts = AtomicU32::new(0);
        let policy = quick_policy(2);

        let result = with_backoff(&policy, "graphql query", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<Value, _>(AppError::service("GraphQL query failed: 502 Bad Gateway")) }
        })
        .await;

        assert!(result.is_err(), "persistent outage must propagate");
        assert_eq!(attempts.load(Ordering::SeqCst), 2, "no attempts past the policy limit");
    }
}
