/// Counters describing what the router has done since startup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutingStats {
	pub events_processed: u64,
	pub events_without_metadata: u64,
	pub moves_performed: u64,
	pub move_failures: u64,
	pub tracked_documents: usize,
	pub cached_snapshots: usize,
	pub invalid_patterns: usize,
}

impl RoutingStats {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn record_event_processed(&mut self) {
		self.events_processed += 1;
	}

	pub fn record_missing_metadata(&mut self) {
		self.events_without_metadata += 1;
	}

	pub fn record_move(&mut self) {
		self.moves_performed += 1;
	}

	pub fn record_move_failure(&mut self) {
		self.move_failures += 1;
	}

	/// Fraction of attempted moves that failed
	pub fn failure_rate(&self) -> f32 {
		let attempts = self.moves_performed + self.move_failures;
		if attempts == 0 {
			0.0
		} else {
			self.move_failures as f32 / attempts as f32
		}
	}
}
