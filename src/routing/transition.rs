//! Edge detection between consecutive metadata observations

use crate::metadata::MetadataSnapshot;
use crate::routing::condition::ConditionEvaluator;
use crate::routing::matcher::matches;
use crate::rules::Rule;

/// How a rule's match state changed between two observations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
	/// false -> true, the only transition that fires
	Rising,
	/// true -> true
	Holding,
	/// true -> false
	Falling,
	/// false -> false
	Idle,
}

impl Transition {
	pub fn between(matched_before: bool, matches_now: bool) -> Self {
		match (matched_before, matches_now) {
			(false, true) => Transition::Rising,
			(true, true) => Transition::Holding,
			(true, false) => Transition::Falling,
			(false, false) => Transition::Idle,
		}
	}

	pub fn fires(self) -> bool {
		self == Transition::Rising
	}
}

/// Classify the change in `rule`'s match state from `previous` to `current`.
///
/// A missing previous snapshot (first sighting) counts as "did not match".
pub fn detect(
	evaluator: &ConditionEvaluator, rule: &Rule, current: Option<&MetadataSnapshot>,
	previous: Option<&MetadataSnapshot>,
) -> Transition {
	let matches_now = matches(evaluator, current, rule);
	let matched_before = previous.is_some() && matches(evaluator, previous, rule);
	Transition::between(matched_before, matches_now)
}

pub fn should_fire(
	evaluator: &ConditionEvaluator, rule: &Rule, current: Option<&MetadataSnapshot>,
	previous: Option<&MetadataSnapshot>,
) -> bool {
	detect(evaluator, rule, current, previous).fires()
}
