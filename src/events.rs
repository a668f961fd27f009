use crate::rules::RuleId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A document in the vault, addressed by its vault-relative path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Document {
	pub path: PathBuf,
	pub name: String,
}

impl Document {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		let path = path.into();
		let name = path
			.file_name()
			.map(|n| n.to_string_lossy().to_string())
			.unwrap_or_default();
		Self { path, name }
	}

	/// Build a document from an absolute path below `root`
	pub fn from_absolute(root: &Path, absolute: &Path) -> Option<Self> {
		absolute.strip_prefix(root).ok().map(Self::new)
	}

	pub fn is_markdown(&self) -> bool {
		self.path
			.extension()
			.map(|ext| ext.eq_ignore_ascii_case("md"))
			.unwrap_or(false)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ChangeKind {
	Create,
	Write,
	Rename,
	Remove,
	Other(String),
}

impl From<notify::EventKind> for ChangeKind {
	fn from(kind: notify::EventKind) -> Self {
		match kind {
			notify::EventKind::Create(_) => ChangeKind::Create,
			notify::EventKind::Modify(notify::event::ModifyKind::Name(_)) => ChangeKind::Rename,
			notify::EventKind::Modify(_) => ChangeKind::Write,
			notify::EventKind::Remove(_) => ChangeKind::Remove,
			notify::EventKind::Access(_) => ChangeKind::Other("Access".to_string()),
			_ => ChangeKind::Other(format!("{kind:?}")),
		}
	}
}

impl ChangeKind {
	/// Whether the document may now carry different metadata
	pub fn may_change_metadata(&self) -> bool {
		matches!(self, ChangeKind::Create | ChangeKind::Write | ChangeKind::Rename)
	}
}

/// A change notification for one path, as delivered by the watcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
	pub id: Uuid,
	pub kind: ChangeKind,
	pub path: PathBuf,
	pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
	pub fn new(kind: ChangeKind, path: PathBuf) -> Self {
		Self { id: Uuid::new_v4(), kind, path, timestamp: Utc::now() }
	}
}

/// Record of a routing action that relocated a document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteRecord {
	pub rule_id: RuleId,
	pub from: PathBuf,
	pub to: PathBuf,
	pub timestamp: DateTime<Utc>,
}

impl RouteRecord {
	pub fn new(rule_id: RuleId, from: PathBuf, to: PathBuf) -> Self {
		Self { rule_id, from, to, timestamp: Utc::now() }
	}

	pub fn to_json(&self) -> serde_json::Result<String> {
		serde_json::to_string(self)
	}
}
