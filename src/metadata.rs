//! Document metadata snapshots and the index that produces them
//!
//! A snapshot is the scalar view of a document's YAML frontmatter at one
//! instant. Non-scalar values (null, sequences, mappings) are not part of it.

use crate::error::Result;
use crate::events::Document;
use crate::routing::RoutingError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A single scalar frontmatter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
	Bool(bool),
	Number(serde_yaml::Number),
	Text(String),
}

impl FieldValue {
	/// String form compared by condition operators
	pub fn as_text(&self) -> String {
		match self {
			FieldValue::Text(text) => text.clone(),
			FieldValue::Bool(value) => value.to_string(),
			FieldValue::Number(number) => number.to_string(),
		}
	}

	/// Empty text, `false` and zero are falsy
	pub fn is_truthy(&self) -> bool {
		match self {
			FieldValue::Text(text) => !text.is_empty(),
			FieldValue::Bool(value) => *value,
			FieldValue::Number(number) => match number.as_f64() {
				Some(value) => value != 0.0 && !value.is_nan(),
				None => true,
			},
		}
	}

	fn from_yaml(value: serde_yaml::Value) -> Option<Self> {
		match value {
			serde_yaml::Value::Bool(value) => Some(FieldValue::Bool(value)),
			serde_yaml::Value::Number(number) => Some(FieldValue::Number(number)),
			serde_yaml::Value::String(text) => Some(FieldValue::Text(text)),
			serde_yaml::Value::Tagged(tagged) => {
				let tagged = *tagged;
				Self::from_yaml(tagged.value)
			}
			serde_yaml::Value::Null
			| serde_yaml::Value::Sequence(_)
			| serde_yaml::Value::Mapping(_) => None,
		}
	}
}

impl From<&str> for FieldValue {
	fn from(value: &str) -> Self {
		FieldValue::Text(value.to_string())
	}
}

impl From<String> for FieldValue {
	fn from(value: String) -> Self {
		FieldValue::Text(value)
	}
}

impl From<bool> for FieldValue {
	fn from(value: bool) -> Self {
		FieldValue::Bool(value)
	}
}

impl From<i64> for FieldValue {
	fn from(value: i64) -> Self {
		FieldValue::Number(value.into())
	}
}

/// Immutable field -> value view of a document's metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataSnapshot {
	fields: BTreeMap<String, FieldValue>,
}

impl MetadataSnapshot {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, field: &str) -> Option<&FieldValue> {
		self.fields.get(field)
	}

	pub fn len(&self) -> usize {
		self.fields.len()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	pub fn fields(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
		self.fields.iter()
	}

	/// Parse the leading `---` fenced YAML block of a markdown document.
	///
	/// Returns `Ok(None)` when the document has no frontmatter block.
	pub fn from_markdown(content: &str) -> Result<Option<Self>> {
		let Some(block) = frontmatter_block(content) else {
			return Ok(None);
		};

		if block.trim().is_empty() {
			return Ok(Some(Self::new()));
		}

		let value: serde_yaml::Value = serde_yaml::from_str(block)?;
		let serde_yaml::Value::Mapping(mapping) = value else {
			return Ok(Some(Self::new()));
		};

		let fields = mapping
			.into_iter()
			.filter_map(|(key, value)| {
				let key = match key {
					serde_yaml::Value::String(key) => key,
					other => FieldValue::from_yaml(other)?.as_text(),
				};
				Some((key, FieldValue::from_yaml(value)?))
			})
			.collect();

		Ok(Some(Self { fields }))
	}
}

impl<K, V> FromIterator<(K, V)> for MetadataSnapshot
where
	K: Into<String>,
	V: Into<FieldValue>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self {
			fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
		}
	}
}

/// Extract the text between the opening and closing frontmatter fences
fn frontmatter_block(content: &str) -> Option<&str> {
	let content = content.strip_prefix('\u{feff}').unwrap_or(content);
	let mut lines = content.split_inclusive('\n');

	let opening = lines.next()?;
	if opening.trim_end() != "---" {
		return None;
	}

	let start = opening.len();
	let mut offset = start;
	for line in lines {
		let trimmed = line.trim_end();
		if trimmed == "---" || trimmed == "..." {
			return Some(&content[start..offset]);
		}
		offset += line.len();
	}

	None
}

/// Source of current metadata snapshots for documents
#[async_trait]
pub trait MetadataIndex: Send + Sync {
	/// Current snapshot, or `None` when the document has no structured metadata
	async fn snapshot(&self, document: &Document) -> Result<Option<MetadataSnapshot>>;
}

/// Reads frontmatter straight from markdown files under a vault root
#[derive(Debug, Clone)]
pub struct FrontmatterIndex {
	root: PathBuf,
}

impl FrontmatterIndex {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}
}

#[async_trait]
impl MetadataIndex for FrontmatterIndex {
	async fn snapshot(&self, document: &Document) -> Result<Option<MetadataSnapshot>> {
		let full_path = self.root.join(&document.path);
		let content = match tokio::fs::read_to_string(&full_path).await {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				debug!("Document vanished before indexing: {:?}", full_path);
				return Ok(None);
			}
			Err(e) => {
				return Err(RoutingError::metadata_unavailable(&document.path, &e.to_string()).into());
			}
		};

		MetadataSnapshot::from_markdown(&content)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_scalar_frontmatter() {
		let content = "---\nstatus: done\ncount: 3\narchived: false\n---\n# Title\n";
		let snapshot = MetadataSnapshot::from_markdown(content).unwrap().unwrap();

		assert_eq!(snapshot.len(), 3);
		assert_eq!(snapshot.get("status").unwrap().as_text(), "done");
		assert_eq!(snapshot.get("count").unwrap().as_text(), "3");
		assert!(!snapshot.get("archived").unwrap().is_truthy());
	}

	#[test]
	fn test_non_scalars_are_skipped() {
		let content = "---\ntags:\n  - a\n  - b\nempty:\nnested:\n  k: v\ntitle: x\n---\n";
		let snapshot = MetadataSnapshot::from_markdown(content).unwrap().unwrap();

		assert_eq!(snapshot.len(), 1);
		assert!(snapshot.get("tags").is_none());
		assert!(snapshot.get("empty").is_none());
	}

	#[test]
	fn test_missing_and_empty_frontmatter() {
		assert!(MetadataSnapshot::from_markdown("# Just a note\n").unwrap().is_none());
		assert!(MetadataSnapshot::from_markdown("---\nstatus: done\n").unwrap().is_none());

		let empty = MetadataSnapshot::from_markdown("---\n---\nbody").unwrap().unwrap();
		assert!(empty.is_empty());
	}

	#[test]
	fn test_invalid_yaml_is_an_error() {
		let result = MetadataSnapshot::from_markdown("---\nstatus: [unclosed\n---\n");
		assert!(result.is_err());
	}

	#[test]
	fn test_truthiness() {
		assert!(!FieldValue::from("").is_truthy());
		assert!(FieldValue::from("false").is_truthy());
		assert!(!FieldValue::from(false).is_truthy());
		assert!(!FieldValue::from(0i64).is_truthy());
		assert!(FieldValue::from(42i64).is_truthy());
	}

	#[tokio::test]
	async fn test_frontmatter_index_reads_files() {
		let dir = tempfile::TempDir::new().unwrap();
		std::fs::create_dir_all(dir.path().join("Inbox")).unwrap();
		std::fs::write(dir.path().join("Inbox/a.md"), "---\nstatus: done\n---\n").unwrap();

		let index = FrontmatterIndex::new(dir.path());
		let snapshot = index.snapshot(&Document::new("Inbox/a.md")).await.unwrap();
		assert_eq!(snapshot.unwrap().get("status").unwrap().as_text(), "done");

		let missing = index.snapshot(&Document::new("Inbox/gone.md")).await.unwrap();
		assert!(missing.is_none());
	}

	#[tokio::test]
	async fn test_unreadable_document_reports_its_path() {
		let dir = tempfile::TempDir::new().unwrap();
		std::fs::create_dir_all(dir.path().join("Inbox/folder.md")).unwrap();

		let index = FrontmatterIndex::new(dir.path());
		let err = index.snapshot(&Document::new("Inbox/folder.md")).await.unwrap_err();

		assert_eq!(err.category(), "metadata");
		assert!(err.to_string().contains("Inbox/folder.md"));
	}
}
