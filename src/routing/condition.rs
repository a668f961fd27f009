use crate::metadata::MetadataSnapshot;
use crate::routing::error::RoutingError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
	Equals,
	Contains,
	Regex,
}

/// One `field <operator> value` test against a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
	pub field: String,
	pub operator: Operator,
	pub value: String,
}

impl Condition {
	pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
		Self { field: field.into(), operator, value: value.into() }
	}

	pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
		Self::new(field, Operator::Equals, value)
	}

	pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
		Self::new(field, Operator::Contains, value)
	}

	pub fn regex(field: impl Into<String>, pattern: impl Into<String>) -> Self {
		Self::new(field, Operator::Regex, pattern)
	}

	/// Evaluate without a pattern cache; regexes are compiled on every call
	pub fn evaluate(&self, snapshot: &MetadataSnapshot) -> bool {
		ConditionEvaluator::new().evaluate(snapshot, self)
	}

	fn compile(&self) -> Result<Regex, RoutingError> {
		Regex::new(&self.value)
			.map_err(|e| RoutingError::invalid_pattern(&self.field, &self.value, &e.to_string()))
	}
}

/// Evaluates conditions, compiling each distinct regex pattern once.
///
/// Patterns that fail to compile are remembered as invalid so the warning is
/// emitted once per pattern rather than once per event.
#[derive(Debug, Default)]
pub struct ConditionEvaluator {
	patterns: Mutex<HashMap<String, Option<Regex>>>,
}

impl ConditionEvaluator {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn evaluate(&self, snapshot: &MetadataSnapshot, condition: &Condition) -> bool {
		let Some(stored) = snapshot.get(&condition.field).filter(|v| v.is_truthy()) else {
			return false;
		};
		let stored = stored.as_text();

		match condition.operator {
			Operator::Equals => stored == condition.value,
			Operator::Contains => stored.contains(condition.value.as_str()),
			Operator::Regex => self.is_match(condition, &stored),
		}
	}

	/// Number of distinct patterns that failed to compile
	pub fn invalid_pattern_count(&self) -> usize {
		let patterns = self.patterns.lock().unwrap_or_else(|e| e.into_inner());
		patterns.values().filter(|p| p.is_none()).count()
	}

	/// Forget every compiled pattern, e.g. after the rule list was reloaded
	pub fn clear(&self) {
		self.patterns.lock().unwrap_or_else(|e| e.into_inner()).clear();
	}

	fn is_match(&self, condition: &Condition, stored: &str) -> bool {
		let mut patterns = self.patterns.lock().unwrap_or_else(|e| e.into_inner());
		let compiled = patterns
			.entry(condition.value.clone())
			.or_insert_with(|| match condition.compile() {
				Ok(regex) => Some(regex),
				Err(e) => {
					warn!("{} (condition evaluates to false)", e);
					None
				}
			});

		compiled.as_ref().map(|regex| regex.is_match(stored)).unwrap_or(false)
	}
}
