//! Rule records and the live, ordered rule store
//!
//! Rules are persisted as JSON in the settings file:
//!
//! ```json
//! {
//!   "debug": false,
//!   "rules": [
//!     {
//!       "id": "6f1c...",
//!       "sourceFolder": "Inbox",
//!       "destinationFolder": "Done",
//!       "conditions": [{ "field": "status", "operator": "equals", "value": "done" }]
//!     }
//!   ]
//! }
//! ```
//!
//! Declaration order is the firing tie-break, so the store never reorders
//! rules on its own.

use crate::error::{Result, RouterError};
use crate::routing::{Condition, RoutingError};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Stable rule identity, assigned once when the rule is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(Uuid);

impl RuleId {
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}
}

impl Default for RuleId {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Display for RuleId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.0.fmt(f)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
	pub id: RuleId,
	pub source_folder: PathBuf,
	pub destination_folder: PathBuf,
	pub conditions: Vec<Condition>,
}

impl Rule {
	pub fn new(
		source_folder: impl Into<PathBuf>, destination_folder: impl Into<PathBuf>,
		conditions: Vec<Condition>,
	) -> Self {
		Self {
			id: RuleId::new(),
			source_folder: normalize_folder(&source_folder.into()),
			destination_folder: normalize_folder(&destination_folder.into()),
			conditions,
		}
	}

	/// Whether `path` lies inside this rule's source folder.
	///
	/// The comparison is component-wise, so `Inbox` does not scope `Inbox2/a.md`.
	/// An empty source folder scopes the whole vault.
	pub fn covers(&self, path: &Path) -> bool {
		path.starts_with(&self.source_folder)
	}

	/// Destination path for a document named `name`
	pub fn destination_for(&self, name: &str) -> PathBuf {
		self.destination_folder.join(name)
	}

	/// Reject destinations that would leave the vault
	pub fn validate(&self) -> std::result::Result<(), RoutingError> {
		let escapes = self
			.destination_folder
			.components()
			.any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));

		if escapes {
			return Err(RoutingError::InvalidRule {
				rule_id: self.id.to_string(),
				reason: format!(
					"destination {:?} must be a relative path inside the vault",
					self.destination_folder
				),
			});
		}

		Ok(())
	}
}

/// Drop `.` components; document paths never carry them
fn normalize_folder(folder: &Path) -> PathBuf {
	folder
		.components()
		.filter(|c| !matches!(c, Component::CurDir))
		.collect()
}

/// Persisted router settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouterSettings {
	#[serde(default)]
	pub debug: bool,
	#[serde(default)]
	pub rules: Vec<Rule>,
}

/// On-disk rule shape; `id` may be missing in hand-written files
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRule {
	id: Option<RuleId>,
	#[serde(default)]
	source_folder: PathBuf,
	#[serde(default)]
	destination_folder: PathBuf,
	#[serde(default)]
	conditions: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct StoredSettings {
	#[serde(default)]
	debug: bool,
	#[serde(default)]
	rules: Vec<StoredRule>,
}

impl RouterSettings {
	/// Parse settings JSON, assigning ids to rules that lack one.
	///
	/// The returned flag is true when ids were assigned and the file should be
	/// written back so they stay stable across reloads.
	pub fn from_json(json: &str) -> Result<(Self, bool)> {
		let stored: StoredSettings = serde_json::from_str(json)?;
		let mut assigned = false;

		let mut rules = Vec::with_capacity(stored.rules.len());
		for stored_rule in stored.rules {
			let id = stored_rule.id.unwrap_or_else(|| {
				assigned = true;
				RuleId::new()
			});
			let rule = Rule {
				id,
				source_folder: normalize_folder(&stored_rule.source_folder),
				destination_folder: normalize_folder(&stored_rule.destination_folder),
				conditions: stored_rule.conditions,
			};

			match rule.validate() {
				Ok(()) => rules.push(rule),
				Err(e) => warn!("Skipping rule: {}", e),
			}
		}

		Ok((Self { debug: stored.debug, rules }, assigned))
	}

	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string_pretty(self)?)
	}
}

/// Shared, live-editable ordered rule list
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
	settings: Arc<RwLock<RouterSettings>>,
}

impl RuleStore {
	pub fn new(rules: Vec<Rule>) -> Self {
		Self::from_settings(RouterSettings { debug: false, rules })
	}

	pub fn from_settings(settings: RouterSettings) -> Self {
		Self { settings: Arc::new(RwLock::new(settings)) }
	}

	/// Load the settings file, creating an empty one when it does not exist
	pub async fn load(path: &Path) -> Result<Self> {
		let store = Self::default();
		store.reload(path).await?;
		Ok(store)
	}

	/// Replace the in-memory settings with the file's contents.
	///
	/// Returns the number of rules now loaded.
	pub async fn reload(&self, path: &Path) -> Result<usize> {
		let json = match tokio::fs::read_to_string(path).await {
			Ok(json) => json,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				info!("No settings at {:?}, starting with an empty rule list", path);
				*self.write() = RouterSettings::default();
				self.save(path).await?;
				return Ok(0);
			}
			Err(e) => return Err(e.into()),
		};

		let (settings, assigned_ids) = RouterSettings::from_json(&json)?;
		let count = settings.rules.len();
		*self.write() = settings;

		if assigned_ids {
			debug!("Assigned ids to new rules, persisting {:?}", path);
			self.save(path).await?;
		}

		info!("Loaded {} routing rules from {:?}", count, path);
		Ok(count)
	}

	pub async fn save(&self, path: &Path) -> Result<()> {
		let json = self.read().to_json()?;
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			tokio::fs::create_dir_all(parent).await?;
		}
		tokio::fs::write(path, json).await?;
		Ok(())
	}

	/// Point-in-time copy of the ordered rule list
	pub fn rules(&self) -> Vec<Rule> {
		self.read().rules.clone()
	}

	pub fn debug(&self) -> bool {
		self.read().debug
	}

	pub fn len(&self) -> usize {
		self.read().rules.len()
	}

	pub fn is_empty(&self) -> bool {
		self.read().rules.is_empty()
	}

	/// Append a rule at the lowest priority
	pub fn add_rule(&self, mut rule: Rule) -> Result<RuleId> {
		rule.source_folder = normalize_folder(&rule.source_folder);
		rule.destination_folder = normalize_folder(&rule.destination_folder);
		rule.validate()?;
		let id = rule.id;
		self.write().rules.push(rule);
		Ok(id)
	}

	pub fn remove_rule(&self, id: RuleId) -> Option<Rule> {
		let mut settings = self.write();
		let index = settings.rules.iter().position(|r| r.id == id)?;
		Some(settings.rules.remove(index))
	}

	/// Move the rule at `from` to position `to`, shifting the others
	pub fn move_rule(&self, from: usize, to: usize) -> Result<()> {
		let mut settings = self.write();
		let len = settings.rules.len();
		if from >= len || to >= len {
			return Err(RouterError::configuration_error(
				"rule index",
				&format!("move {from} -> {to} out of range for {len} rules"),
			));
		}

		let rule = settings.rules.remove(from);
		settings.rules.insert(to, rule);
		Ok(())
	}

	fn read(&self) -> RwLockReadGuard<'_, RouterSettings> {
		self.settings.read().unwrap_or_else(|e| e.into_inner())
	}

	fn write(&self) -> RwLockWriteGuard<'_, RouterSettings> {
		self.settings.write().unwrap_or_else(|e| e.into_inner())
	}
}
