use crate::rules::RuleId;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Per (document, rule) application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleState {
	NotYetApplied,
	Applied,
}

/// Records which rules already fired for a document at its current path
#[derive(Debug, Default)]
pub struct AppliedRuleTracker {
	applied: HashMap<PathBuf, HashSet<RuleId>>,
}

impl AppliedRuleTracker {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn has_applied(&self, path: &Path, rule_id: RuleId) -> bool {
		self.applied
			.get(path)
			.map(|set| set.contains(&rule_id))
			.unwrap_or(false)
	}

	pub fn state(&self, path: &Path, rule_id: RuleId) -> RuleState {
		if self.has_applied(path, rule_id) {
			RuleState::Applied
		} else {
			RuleState::NotYetApplied
		}
	}

	pub fn mark_applied(&mut self, path: &Path, rule_id: RuleId) {
		self.applied
			.entry(path.to_path_buf())
			.or_default()
			.insert(rule_id);
	}

	/// Transfer the applied set from `old_path` to `new_path`.
	///
	/// Whatever was recorded at `new_path` belonged to a document that no
	/// longer lives there and is replaced.
	pub fn rekey(&mut self, old_path: &Path, new_path: &Path) {
		if old_path == new_path {
			return;
		}

		match self.applied.remove(old_path) {
			Some(set) => {
				self.applied.insert(new_path.to_path_buf(), set);
			}
			None => {
				self.applied.remove(new_path);
			}
		}
	}

	/// Rules applied at `path`
	pub fn applied_at(&self, path: &Path) -> impl Iterator<Item = &RuleId> {
		self.applied.get(path).into_iter().flatten()
	}

	/// Number of tracked documents
	pub fn len(&self) -> usize {
		self.applied.len()
	}

	pub fn is_empty(&self) -> bool {
		self.applied.is_empty()
	}
}
