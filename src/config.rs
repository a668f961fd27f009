use crate::error::{ErrorRecoveryConfig, Result, RouterError};
use std::path::PathBuf;

/// Directory (relative to the vault root) holding router state
pub const SETTINGS_DIR: &str = ".router";
pub const SETTINGS_FILE: &str = "settings.json";

/// Configuration for a router instance
#[derive(Debug, Clone)]
pub struct RouterConfig {
	/// Root of the watched vault; document paths are relative to it
	pub vault_root: PathBuf,
	/// JSON file holding the debug flag and the ordered rule list
	pub settings_path: PathBuf,
	/// Create destination folders that do not exist yet
	pub create_missing_folders: bool,
	/// Log moves instead of performing them
	pub dry_run: bool,
	/// Retry policy for transient move failures
	pub retry: ErrorRecoveryConfig,
}

impl RouterConfig {
	/// Default configuration for a vault, with settings under `<vault>/.router/`
	pub fn for_vault(vault_root: impl Into<PathBuf>) -> Self {
		let vault_root = vault_root.into();
		Self {
			settings_path: vault_root.join(SETTINGS_DIR).join(SETTINGS_FILE),
			vault_root,
			create_missing_folders: false,
			dry_run: false,
			retry: ErrorRecoveryConfig::default(),
		}
	}

	pub fn validate(&self) -> Result<()> {
		if !self.vault_root.is_dir() {
			return Err(RouterError::InvalidPath {
				path: self.vault_root.to_string_lossy().to_string(),
			});
		}

		if self.settings_path.as_os_str().is_empty() {
			return Err(RouterError::configuration_error(
				"settings_path",
				"must not be empty",
			));
		}

		if self.retry.backoff_multiplier < 1.0 {
			return Err(RouterError::configuration_error(
				"retry.backoff_multiplier",
				"must be at least 1.0",
			));
		}

		Ok(())
	}
}
