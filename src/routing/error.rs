//! Routing specific error types

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoutingError {
	#[error("Invalid regex pattern {pattern:?} on field {field}: {reason}")]
	InvalidPattern {
		field: String,
		pattern: String,
		reason: String,
	},

	#[error("Move failed: {from} -> {to} - {reason}")]
	MoveFailed {
		from: String,
		to: String,
		reason: String,
	},

	#[error("Destination already exists: {path}")]
	DestinationExists { path: String },

	#[error("Metadata unavailable for {path}: {cause}")]
	MetadataUnavailable { path: String, cause: String },

	#[error("Invalid rule {rule_id}: {reason}")]
	InvalidRule { rule_id: String, reason: String },
}

impl RoutingError {
	/// Get error category for logging
	pub fn category(&self) -> &'static str {
		match self {
			RoutingError::InvalidPattern { .. } => "configuration",
			RoutingError::MoveFailed { .. } => "move",
			RoutingError::DestinationExists { .. } => "collision",
			RoutingError::MetadataUnavailable { .. } => "metadata",
			RoutingError::InvalidRule { .. } => "configuration",
		}
	}

	pub fn invalid_pattern(field: &str, pattern: &str, reason: &str) -> Self {
		RoutingError::InvalidPattern {
			field: field.to_string(),
			pattern: pattern.to_string(),
			reason: reason.to_string(),
		}
	}

	pub fn move_failed(from: &Path, to: &Path, reason: &str) -> Self {
		RoutingError::MoveFailed {
			from: from.display().to_string(),
			to: to.display().to_string(),
			reason: reason.to_string(),
		}
	}

	pub fn destination_exists(path: impl AsRef<Path>) -> Self {
		RoutingError::DestinationExists { path: path.as_ref().display().to_string() }
	}

	pub fn metadata_unavailable(path: &Path, cause: &str) -> Self {
		RoutingError::MetadataUnavailable {
			path: path.display().to_string(),
			cause: cause.to_string(),
		}
	}
}
