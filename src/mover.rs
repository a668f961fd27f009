//! Move primitives used to relocate routed documents

use crate::error::{ErrorRecoveryConfig, Result, RouterError};
use crate::events::Document;
use crate::retry::RetryManager;
use crate::routing::RoutingError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Relocates a document to a new vault-relative path.
///
/// Implementations must be atomic from the caller's point of view: on `Ok`
/// the document lives at `new_path` only, on `Err` nothing moved.
#[async_trait]
pub trait Mover: Send + Sync {
	async fn rename(&self, document: &Document, new_path: &Path) -> Result<()>;
}

/// Moves files on the local filesystem below a vault root
#[derive(Debug, Clone)]
pub struct FsMover {
	root: PathBuf,
	create_missing_folders: bool,
	retry: RetryManager,
}

impl FsMover {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self {
			root: root.into(),
			create_missing_folders: false,
			retry: RetryManager::default(),
		}
	}

	pub fn with_create_missing_folders(mut self, create: bool) -> Self {
		self.create_missing_folders = create;
		self
	}

	pub fn with_retry(mut self, config: ErrorRecoveryConfig) -> Self {
		self.retry = RetryManager::new(config);
		self
	}
}

#[async_trait]
impl Mover for FsMover {
	async fn rename(&self, document: &Document, new_path: &Path) -> Result<()> {
		let from = self.root.join(&document.path);
		let to = self.root.join(new_path);

		if tokio::fs::try_exists(&to).await? {
			return Err(RoutingError::destination_exists(new_path).into());
		}

		if let Some(parent) = to.parent() {
			if !tokio::fs::try_exists(parent).await? {
				if !self.create_missing_folders {
					return Err(RoutingError::move_failed(
						&document.path,
						new_path,
						"destination folder does not exist",
					)
					.into());
				}
				debug!("Creating destination folder {:?}", parent);
				tokio::fs::create_dir_all(parent).await?;
			}
		}

		self.retry
			.execute("rename", || {
				let (from, to) = (from.clone(), to.clone());
				async move { tokio::fs::rename(&from, &to).await.map_err(RouterError::from) }
			})
			.await
	}
}

/// Reports every move as successful without touching the filesystem
#[derive(Debug, Clone, Default)]
pub struct DryRunMover;

#[async_trait]
impl Mover for DryRunMover {
	async fn rename(&self, document: &Document, new_path: &Path) -> Result<()> {
		info!("[dry-run] would move {:?} -> {:?}", document.path, new_path);
		Ok(())
	}
}
