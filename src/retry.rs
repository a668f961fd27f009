//! Retry with exponential backoff for transient filesystem errors

use crate::error::{ErrorRecoveryConfig, Result, RouterError};
use std::future::Future;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct RetryManager {
	config: ErrorRecoveryConfig,
}

impl RetryManager {
	pub fn new(config: ErrorRecoveryConfig) -> Self {
		Self { config }
	}

	/// Run `operation_fn` until it succeeds, fails with a non-retryable error,
	/// or exhausts `max_retries`.
	pub async fn execute<T, F, Fut>(&self, operation_name: &str, mut operation_fn: F) -> Result<T>
	where
		F: FnMut() -> Fut + Send,
		Fut: Future<Output = Result<T>> + Send,
	{
		let mut attempt = 0;
		let start_time = std::time::Instant::now();

		loop {
			let error = match operation_fn().await {
				Ok(result) => {
					if attempt > 0 {
						debug!(
							"Operation '{}' succeeded after {} attempts in {:?}",
							operation_name,
							attempt + 1,
							start_time.elapsed()
						);
					}
					return Ok(result);
				}
				Err(error) => error,
			};

			if !error.is_retryable() {
				return Err(error);
			}

			if attempt >= self.config.max_retries {
				if self.config.max_retries == 0 {
					return Err(error);
				}
				warn!(
					"Operation '{}' failed after {} attempts over {:?}, giving up",
					operation_name,
					attempt + 1,
					start_time.elapsed()
				);
				return Err(RouterError::RecoveryFailed {
					operation: operation_name.to_string(),
					attempts: attempt + 1,
					total_duration: start_time.elapsed(),
					last_error: error.to_string(),
				});
			}

			let delay = self.config.delay_for_attempt(attempt);
			warn!(
				"Operation '{}' failed (attempt {}), retrying in {:?}: {}",
				operation_name,
				attempt + 1,
				delay,
				error
			);
			tokio::time::sleep(delay).await;
			attempt += 1;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU32, Ordering};
	use std::sync::Arc;
	use std::time::Duration;

	fn fast_config(max_retries: u32) -> ErrorRecoveryConfig {
		ErrorRecoveryConfig {
			max_retries,
			initial_retry_delay: Duration::from_millis(1),
			..Default::default()
		}
	}

	fn interrupted() -> RouterError {
		std::io::Error::new(std::io::ErrorKind::Interrupted, "interrupted").into()
	}

	#[tokio::test]
	async fn test_retry_success_after_failures() {
		let retry = RetryManager::new(fast_config(3));
		let counter = Arc::new(AtomicU32::new(0));

		let result = retry
			.execute("flaky", || {
				let counter = counter.clone();
				async move {
					if counter.fetch_add(1, Ordering::SeqCst) < 2 {
						Err(interrupted())
					} else {
						Ok("moved")
					}
				}
			})
			.await;

		assert_eq!(result.unwrap(), "moved");
		assert_eq!(counter.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn test_retry_max_attempts_exceeded() {
		let retry = RetryManager::new(fast_config(2));
		let result: Result<()> = retry.execute("always", || async { Err(interrupted()) }).await;

		match result.unwrap_err() {
			RouterError::RecoveryFailed { attempts, .. } => assert_eq!(attempts, 3),
			other => panic!("Expected RecoveryFailed error, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn test_non_retryable_error_is_returned_immediately() {
		let retry = RetryManager::new(fast_config(3));
		let counter = Arc::new(AtomicU32::new(0));

		let result: Result<()> = retry
			.execute("denied", || {
				let counter = counter.clone();
				async move {
					counter.fetch_add(1, Ordering::SeqCst);
					Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into())
				}
			})
			.await;

		assert!(matches!(result, Err(RouterError::Io(_))));
		assert_eq!(counter.load(Ordering::SeqCst), 1);
	}
}
