use std::time::Duration;
use thiserror::Error;

/// Core router error types
///
/// Errors raised while routing a single document are defined in
/// `crate::routing::RoutingError` and wrapped here when they cross the
/// library boundary.
#[derive(Error, Debug)]
pub enum RouterError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Notify error: {0}")]
	Notify(#[from] notify::Error),

	#[error("JSON serialization error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("YAML frontmatter error: {0}")]
	Yaml(#[from] serde_yaml::Error),

	#[error("Invalid path: {path}")]
	InvalidPath { path: String },

	#[error("Router not initialized")]
	NotInitialized,

	#[error("Configuration error: {parameter} - {reason}")]
	ConfigurationError { parameter: String, reason: String },

	#[error("Recovery failed: {operation} after {attempts} attempts over {total_duration:?} - {last_error}")]
	RecoveryFailed {
		operation: String,
		attempts: u32,
		total_duration: Duration,
		last_error: String,
	},

	#[error("Routing error: {0}")]
	Routing(#[from] crate::routing::RoutingError),
}

/// Error recovery configuration
#[derive(Debug, Clone)]
pub struct ErrorRecoveryConfig {
	/// Maximum number of retry attempts for recoverable errors
	pub max_retries: u32,
	/// Initial retry delay
	pub initial_retry_delay: Duration,
	/// Maximum retry delay (for exponential backoff)
	pub max_retry_delay: Duration,
	/// Exponential backoff multiplier
	pub backoff_multiplier: f64,
}

impl Default for ErrorRecoveryConfig {
	fn default() -> Self {
		Self {
			max_retries: 3,
			initial_retry_delay: Duration::from_millis(50),
			max_retry_delay: Duration::from_secs(2),
			backoff_multiplier: 2.0,
		}
	}
}

impl ErrorRecoveryConfig {
	/// Calculate the delay for a given retry attempt
	pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
		let delay_ms = self.initial_retry_delay.as_millis() as f64
			* self.backoff_multiplier.powi(attempt as i32);

		std::cmp::min(Duration::from_millis(delay_ms as u64), self.max_retry_delay)
	}
}

impl RouterError {
	/// Check if this error indicates that the operation should be retried
	pub fn is_retryable(&self) -> bool {
		match self {
			RouterError::Io(io_err) => matches!(
				io_err.kind(),
				std::io::ErrorKind::TimedOut
					| std::io::ErrorKind::Interrupted
					| std::io::ErrorKind::WouldBlock
			),
			RouterError::Notify(_) => true,

			RouterError::Json(_)
			| RouterError::Yaml(_)
			| RouterError::InvalidPath { .. }
			| RouterError::NotInitialized
			| RouterError::ConfigurationError { .. }
			| RouterError::RecoveryFailed { .. }
			| RouterError::Routing(_) => false,
		}
	}

	/// Get error category for logging
	pub fn category(&self) -> &'static str {
		match self {
			RouterError::Io(_) => "io",
			RouterError::Notify(_) => "notify",
			RouterError::Json(_) | RouterError::Yaml(_) => "serialization",
			RouterError::InvalidPath { .. } => "configuration",
			RouterError::NotInitialized => "initialization",
			RouterError::ConfigurationError { .. } => "configuration",
			RouterError::RecoveryFailed { .. } => "recovery",
			RouterError::Routing(routing_err) => routing_err.category(),
		}
	}

	/// Create a configuration error
	pub fn configuration_error(parameter: &str, reason: &str) -> Self {
		RouterError::ConfigurationError {
			parameter: parameter.to_string(),
			reason: reason.to_string(),
		}
	}
}

pub type Result<T> = std::result::Result<T, RouterError>;
