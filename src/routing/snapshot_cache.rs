use crate::metadata::MetadataSnapshot;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Last observed snapshot per document path
#[derive(Debug, Default)]
pub struct PreviousSnapshotCache {
	snapshots: HashMap<PathBuf, MetadataSnapshot>,
}

impl PreviousSnapshotCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, path: &Path) -> Option<&MetadataSnapshot> {
		self.snapshots.get(path)
	}

	/// Store `current` for the next event and hand back what was there
	pub fn replace(&mut self, path: &Path, current: MetadataSnapshot) -> Option<MetadataSnapshot> {
		self.snapshots.insert(path.to_path_buf(), current)
	}

	/// Move the entry for `old_path` to `new_path`, overwriting any stale entry
	pub fn rekey(&mut self, old_path: &Path, new_path: &Path) {
		if old_path == new_path {
			return;
		}

		match self.snapshots.remove(old_path) {
			Some(snapshot) => {
				self.snapshots.insert(new_path.to_path_buf(), snapshot);
			}
			None => {
				self.snapshots.remove(new_path);
			}
		}
	}

	pub fn len(&self) -> usize {
		self.snapshots.len()
	}

	pub fn is_empty(&self) -> bool {
		self.snapshots.is_empty()
	}
}
