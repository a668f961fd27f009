//! Common test utilities for the rust-router library

#![allow(dead_code)]

use async_trait::async_trait;
use rust_router::{Document, MetadataIndex, MetadataSnapshot, Mover, Result, RouterError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Metadata index backed by a map the test mutates between events
#[derive(Clone, Default)]
pub struct MemoryIndex {
	snapshots: Arc<Mutex<HashMap<PathBuf, MetadataSnapshot>>>,
}

impl MemoryIndex {
	pub fn set(&self, path: &str, pairs: &[(&str, &str)]) {
		let snapshot = pairs.iter().copied().collect();
		self.snapshots.lock().unwrap().insert(PathBuf::from(path), snapshot);
	}

	pub fn clear(&self, path: &str) {
		self.snapshots.lock().unwrap().remove(Path::new(path));
	}
}

#[async_trait]
impl MetadataIndex for MemoryIndex {
	async fn snapshot(&self, document: &Document) -> Result<Option<MetadataSnapshot>> {
		Ok(self.snapshots.lock().unwrap().get(&document.path).cloned())
	}
}

/// Mover that records every request and moves the entry inside a `MemoryIndex`
#[derive(Clone, Default)]
pub struct RecordingMover {
	moves: Arc<Mutex<Vec<(PathBuf, PathBuf)>>>,
	index: Option<MemoryIndex>,
	fail: Arc<Mutex<bool>>,
}

impl RecordingMover {
	pub fn backed_by(index: &MemoryIndex) -> Self {
		Self { index: Some(index.clone()), ..Default::default() }
	}

	pub fn moves(&self) -> Vec<(PathBuf, PathBuf)> {
		self.moves.lock().unwrap().clone()
	}

	pub fn set_failing(&self, fail: bool) {
		*self.fail.lock().unwrap() = fail;
	}
}

#[async_trait]
impl Mover for RecordingMover {
	async fn rename(&self, document: &Document, new_path: &Path) -> Result<()> {
		if *self.fail.lock().unwrap() {
			return Err(RouterError::Io(std::io::Error::new(
				std::io::ErrorKind::PermissionDenied,
				"simulated failure",
			)));
		}

		self.moves
			.lock()
			.unwrap()
			.push((document.path.clone(), new_path.to_path_buf()));

		if let Some(index) = &self.index {
			let mut snapshots = index.snapshots.lock().unwrap();
			if let Some(snapshot) = snapshots.remove(&document.path) {
				snapshots.insert(new_path.to_path_buf(), snapshot);
			}
		}
		Ok(())
	}
}

/// Create a temporary vault directory
pub fn setup_vault() -> TempDir {
	TempDir::new().expect("Failed to create temp vault")
}

/// Write a markdown note, creating parent folders
pub fn write_note(vault: &Path, relative: &str, frontmatter: Option<&str>) {
	let path = vault.join(relative);
	std::fs::create_dir_all(path.parent().unwrap()).unwrap();
	let content = match frontmatter {
		Some(fm) => format!("---\n{fm}\n---\n# Note\n"),
		None => "# Note\n".to_string(),
	};
	std::fs::write(path, content).unwrap();
}
