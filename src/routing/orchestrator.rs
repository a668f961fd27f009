use crate::error::Result;
use crate::events::{Document, RouteRecord};
use crate::metadata::{MetadataIndex, MetadataSnapshot};
use crate::mover::Mover;
use crate::routing::condition::ConditionEvaluator;
use crate::routing::monitoring::RoutingStats;
use crate::routing::snapshot_cache::PreviousSnapshotCache;
use crate::routing::tracker::{AppliedRuleTracker, RuleState};
use crate::routing::transition::{self, Transition};
use crate::rules::{Rule, RuleId, RuleStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// What a single change notification led to
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingOutcome {
	/// The document has no structured metadata; nothing was recorded
	NoMetadata,
	/// No rule scopes the document, or every scoping rule already fired
	NoCandidates,
	/// Candidates exist but none saw a rising edge
	NoTransition,
	/// The firing rule's destination is where the document already is; the
	/// rule is marked applied and the mover is not called
	AlreadyInPlace { rule_id: RuleId },
	Moved(RouteRecord),
	/// The move primitive failed; the rule stays eligible
	MoveFailed { rule_id: RuleId, destination: PathBuf, reason: String },
}

impl RoutingOutcome {
	pub fn moved(&self) -> Option<&RouteRecord> {
		match self {
			RoutingOutcome::Moved(record) => Some(record),
			_ => None,
		}
	}
}

/// State shared by all events; one lock serializes every `on_change` call
#[derive(Debug, Default)]
struct RoutingState {
	applied: AppliedRuleTracker,
	snapshots: PreviousSnapshotCache,
	stats: RoutingStats,
}

/// Top-level coordinator turning metadata changes into at most one move each
pub struct Router {
	rules: RuleStore,
	index: Arc<dyn MetadataIndex>,
	mover: Arc<dyn Mover>,
	evaluator: ConditionEvaluator,
	state: Mutex<RoutingState>,
}

impl Router {
	pub fn new<I, M>(rules: RuleStore, index: I, mover: M) -> Self
	where
		I: MetadataIndex + 'static,
		M: Mover + 'static,
	{
		Self {
			rules,
			index: Arc::new(index),
			mover: Arc::new(mover),
			evaluator: ConditionEvaluator::new(),
			state: Mutex::new(RoutingState::default()),
		}
	}

	pub fn rules(&self) -> &RuleStore {
		&self.rules
	}

	/// Reload the rule list from `path`, dropping patterns compiled for the old rules
	pub async fn reload_rules(&self, path: &Path) -> Result<usize> {
		let count = self.rules.reload(path).await?;
		self.evaluator.clear();
		Ok(count)
	}

	/// Handle one metadata-change notification.
	///
	/// Never fails: metadata read errors and move failures are logged and
	/// reported through the returned outcome.
	pub async fn on_change(&self, document: &Document) -> RoutingOutcome {
		let mut state = self.state.lock().await;
		state.stats.record_event_processed();

		let current = match self.index.snapshot(document).await {
			Ok(Some(snapshot)) => snapshot,
			Ok(None) => {
				debug!("No metadata for {:?}", document.path);
				state.stats.record_missing_metadata();
				return RoutingOutcome::NoMetadata;
			}
			Err(e) => {
				warn!("Failed to read metadata for {:?}: {}", document.path, e);
				state.stats.record_missing_metadata();
				return RoutingOutcome::NoMetadata;
			}
		};

		// Captured for the next event before any rule is evaluated
		let previous = state.snapshots.replace(&document.path, current.clone());

		let rules = self.rules.rules();
		let candidates: Vec<&Rule> = rules
			.iter()
			.filter(|rule| rule.covers(&document.path))
			.filter(|rule| state.applied.state(&document.path, rule.id) == RuleState::NotYetApplied)
			.collect();

		if candidates.is_empty() {
			debug!("No candidate rules for {:?}", document.path);
			return RoutingOutcome::NoCandidates;
		}

		let Some(rule) = self.first_firing(document, &candidates, &current, previous.as_ref())
		else {
			return RoutingOutcome::NoTransition;
		};

		let destination = rule.destination_for(&document.name);
		if destination == document.path {
			debug!("Rule {} fired for {:?}, already in place", rule.id, document.path);
			state.applied.mark_applied(&document.path, rule.id);
			return RoutingOutcome::AlreadyInPlace { rule_id: rule.id };
		}

		match self.mover.rename(document, &destination).await {
			Ok(()) => {
				state.applied.mark_applied(&document.path, rule.id);
				state.applied.rekey(&document.path, &destination);
				state.snapshots.rekey(&document.path, &destination);
				state.stats.record_move();

				let record = RouteRecord::new(rule.id, document.path.clone(), destination);
				info!("Routed {:?} -> {:?} (rule {})", record.from, record.to, rule.id);
				if let Ok(json) = record.to_json() {
					debug!("Route JSON: {}", json);
				}
				RoutingOutcome::Moved(record)
			}
			Err(e) => {
				warn!(
					"Failed to move {:?} -> {:?} for rule {} [{}]: {}",
					document.path,
					destination,
					rule.id,
					e.category(),
					e
				);
				state.stats.record_move_failure();
				RoutingOutcome::MoveFailed {
					rule_id: rule.id,
					destination,
					reason: e.to_string(),
				}
			}
		}
	}

	/// First candidate, in declaration order, whose match state rises
	fn first_firing<'a>(
		&self, document: &Document, candidates: &[&'a Rule], current: &MetadataSnapshot,
		previous: Option<&MetadataSnapshot>,
	) -> Option<&'a Rule> {
		let verbose = self.rules.debug();

		candidates.iter().copied().find(|rule| {
			let transition = transition::detect(&self.evaluator, rule, Some(current), previous);
			if verbose {
				info!("Rule {} on {:?}: {:?}", rule.id, document.path, transition);
			} else {
				debug!("Rule {} on {:?}: {:?}", rule.id, document.path, transition);
			}
			transition == Transition::Rising
		})
	}

	pub async fn has_applied(&self, path: &Path, rule_id: RuleId) -> bool {
		self.state.lock().await.applied.has_applied(path, rule_id)
	}

	pub async fn previous_snapshot(&self, path: &Path) -> Option<MetadataSnapshot> {
		self.state.lock().await.snapshots.get(path).cloned()
	}

	pub async fn stats(&self) -> RoutingStats {
		let state = self.state.lock().await;
		RoutingStats {
			tracked_documents: state.applied.len(),
			cached_snapshots: state.snapshots.len(),
			invalid_patterns: self.evaluator.invalid_pattern_count(),
			..state.stats.clone()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::{Result, RouterError};
	use crate::routing::Condition;
	use async_trait::async_trait;
	use std::collections::HashMap;
	use std::sync::Mutex as StdMutex;

	#[derive(Clone, Default)]
	struct MemoryIndex {
		snapshots: Arc<StdMutex<HashMap<PathBuf, MetadataSnapshot>>>,
	}

	impl MemoryIndex {
		fn set(&self, path: &str, pairs: &[(&str, &str)]) {
			let snapshot = pairs.iter().copied().collect();
			self.snapshots.lock().unwrap().insert(PathBuf::from(path), snapshot);
		}
	}

	#[async_trait]
	impl MetadataIndex for MemoryIndex {
		async fn snapshot(&self, document: &Document) -> Result<Option<MetadataSnapshot>> {
			Ok(self.snapshots.lock().unwrap().get(&document.path).cloned())
		}
	}

	#[derive(Clone, Default)]
	struct FailingMover {
		attempts: Arc<StdMutex<u32>>,
	}

	#[async_trait]
	impl Mover for FailingMover {
		async fn rename(&self, _: &Document, _: &Path) -> Result<()> {
			*self.attempts.lock().unwrap() += 1;
			Err(RouterError::Io(std::io::Error::new(
				std::io::ErrorKind::PermissionDenied,
				"read-only vault",
			)))
		}
	}

	fn done_rule() -> Rule {
		Rule::new("Inbox", "Done", vec![Condition::equals("status", "done")])
	}

	#[tokio::test]
	async fn test_no_metadata_is_noop() {
		let router = Router::new(
			RuleStore::new(vec![done_rule()]),
			MemoryIndex::default(),
			crate::mover::DryRunMover,
		);

		let outcome = router.on_change(&Document::new("Inbox/a.md")).await;
		assert_eq!(outcome, RoutingOutcome::NoMetadata);
		assert!(router.previous_snapshot(Path::new("Inbox/a.md")).await.is_none());
	}

	#[tokio::test]
	async fn test_cache_updated_even_without_candidates() {
		let index = MemoryIndex::default();
		index.set("Elsewhere/a.md", &[("status", "done")]);
		let router =
			Router::new(RuleStore::new(vec![done_rule()]), index, crate::mover::DryRunMover);

		let outcome = router.on_change(&Document::new("Elsewhere/a.md")).await;
		assert_eq!(outcome, RoutingOutcome::NoCandidates);
		assert!(router.previous_snapshot(Path::new("Elsewhere/a.md")).await.is_some());
	}

	#[tokio::test]
	async fn test_move_failure_keeps_rule_eligible() {
		let index = MemoryIndex::default();
		index.set("Inbox/a.md", &[("status", "done")]);
		let mover = FailingMover::default();
		let rule = done_rule();
		let rule_id = rule.id;
		let router = Router::new(RuleStore::new(vec![rule]), index.clone(), mover.clone());
		let document = Document::new("Inbox/a.md");

		let outcome = router.on_change(&document).await;
		assert!(matches!(outcome, RoutingOutcome::MoveFailed { .. }));
		assert!(!router.has_applied(&document.path, rule_id).await);

		// Still matching: no new rising edge, so no retry on a plain re-save
		router.on_change(&document).await;
		assert_eq!(*mover.attempts.lock().unwrap(), 1);

		// A fresh false -> true transition tries again
		index.set("Inbox/a.md", &[("status", "open")]);
		router.on_change(&document).await;
		index.set("Inbox/a.md", &[("status", "done")]);
		router.on_change(&document).await;
		assert_eq!(*mover.attempts.lock().unwrap(), 2);

		let stats = router.stats().await;
		assert_eq!(stats.move_failures, 2);
		assert_eq!(stats.moves_performed, 0);
	}

	#[tokio::test]
	async fn test_rule_targeting_current_folder_is_consumed_in_place() {
		let index = MemoryIndex::default();
		index.set("Done/a.md", &[("status", "done")]);
		let rule = Rule::new("", "Done", vec![Condition::equals("status", "done")]);
		let rule_id = rule.id;
		let mover = FailingMover::default();
		let router = Router::new(RuleStore::new(vec![rule]), index, mover.clone());

		let outcome = router.on_change(&Document::new("Done/a.md")).await;
		assert_eq!(outcome, RoutingOutcome::AlreadyInPlace { rule_id });
		assert!(router.has_applied(Path::new("Done/a.md"), rule_id).await);
		assert_eq!(*mover.attempts.lock().unwrap(), 0);
	}

	#[tokio::test]
	async fn test_reload_forgets_patterns_of_removed_rules() {
		let dir = tempfile::TempDir::new().unwrap();
		let settings_path = dir.path().join("settings.json");
		RuleStore::new(vec![done_rule()]).save(&settings_path).await.unwrap();

		let index = MemoryIndex::default();
		index.set("Inbox/a.md", &[("code", "proj-1")]);
		let broken = Rule::new("Inbox", "Done", vec![Condition::regex("code", "[unterminated")]);
		let router = Router::new(RuleStore::new(vec![broken]), index, crate::mover::DryRunMover);

		router.on_change(&Document::new("Inbox/a.md")).await;
		assert_eq!(router.stats().await.invalid_patterns, 1);

		assert_eq!(router.reload_rules(&settings_path).await.unwrap(), 1);
		assert_eq!(router.stats().await.invalid_patterns, 0);
	}
}
