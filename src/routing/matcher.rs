use crate::metadata::MetadataSnapshot;
use crate::routing::condition::ConditionEvaluator;
use crate::rules::Rule;

/// Whether every condition of `rule` holds for `snapshot`.
///
/// An absent or empty snapshot never matches. A rule without conditions
/// matches every non-empty snapshot.
pub fn matches(
	evaluator: &ConditionEvaluator, snapshot: Option<&MetadataSnapshot>, rule: &Rule,
) -> bool {
	let Some(snapshot) = snapshot.filter(|s| !s.is_empty()) else {
		return false;
	};

	rule.conditions
		.iter()
		.all(|condition| evaluator.evaluate(snapshot, condition))
}

impl Rule {
	/// Match without a shared pattern cache
	pub fn matches(&self, snapshot: Option<&MetadataSnapshot>) -> bool {
		matches(&ConditionEvaluator::new(), snapshot, self)
	}
}
