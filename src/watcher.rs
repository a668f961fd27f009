use crate::config::RouterConfig;
use crate::error::{Result, RouterError};
use crate::events::{ChangeEvent, ChangeKind, Document};
use crate::routing::{Router, RoutingOutcome};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc as tokio_mpsc;
use tracing::{debug, error, info, warn};

/// Feeds filesystem changes under a vault into a [`Router`].
///
/// Changes to the settings file reload the rule store instead of being routed.
pub struct RouterWatcher {
	config: RouterConfig,
	router: Arc<Router>,
	vault_root: PathBuf,
	settings_path: PathBuf,
	event_sender: Option<tokio_mpsc::UnboundedSender<ChangeEvent>>,
	event_receiver: Option<tokio_mpsc::UnboundedReceiver<ChangeEvent>>,
}

impl RouterWatcher {
	pub fn new(config: RouterConfig, router: Arc<Router>) -> Self {
		let (tx, rx) = tokio_mpsc::unbounded_channel();

		Self {
			vault_root: config.vault_root.clone(),
			settings_path: config.settings_path.clone(),
			config,
			router,
			event_sender: Some(tx),
			event_receiver: Some(rx),
		}
	}

	pub async fn start_watching(&mut self) -> Result<()> {
		self.config.validate()?;

		// notify reports canonical paths on some platforms
		self.vault_root = self.config.vault_root.canonicalize()?;
		if let Ok(settings_path) = self.config.settings_path.canonicalize() {
			self.settings_path = settings_path;
		}

		info!("Starting to route documents under {:?}", self.vault_root);

		let (notify_tx, notify_rx) = mpsc::channel();
		let mut watcher = RecommendedWatcher::new(
			notify_tx,
			Config::default().with_poll_interval(Duration::from_millis(100)),
		)?;
		watcher.watch(&self.vault_root, RecursiveMode::Recursive)?;

		let event_tx = self
			.event_sender
			.take()
			.ok_or(RouterError::NotInitialized)?;
		tokio::spawn(async move {
			Self::process_notify_events(notify_rx, event_tx).await;
		});

		// `watcher` must stay alive for as long as events are processed
		self.process_events().await
	}

	async fn process_notify_events(
		notify_rx: mpsc::Receiver<notify::Result<Event>>,
		event_tx: tokio_mpsc::UnboundedSender<ChangeEvent>,
	) {
		// notify delivers through std::sync::mpsc, so drain it on a blocking thread
		tokio::task::spawn_blocking(move || {
			for result in notify_rx {
				match result {
					Ok(event) => {
						debug!("Received notify event: {:?}", event);
						let kind = ChangeKind::from(event.kind);
						for path in event.paths {
							if event_tx.send(ChangeEvent::new(kind.clone(), path)).is_err() {
								error!("Event receiver dropped, stopping notify forwarding");
								return;
							}
						}
					}
					Err(e) => error!("Notify error: {}", e),
				}
			}
		})
		.await
		.unwrap_or_else(|e| {
			error!("Notify processing task panicked: {}", e);
		});
	}

	async fn process_events(&mut self) -> Result<()> {
		let mut receiver = self
			.event_receiver
			.take()
			.ok_or(RouterError::NotInitialized)?;

		info!("Event processing loop started");

		while let Some(event) = receiver.recv().await {
			self.handle_event(event).await;
		}

		warn!("Event processing loop ended");
		Ok(())
	}

	/// Route one change event; events are handled strictly in arrival order
	pub async fn handle_event(&self, event: ChangeEvent) -> Option<RoutingOutcome> {
		if event.path == self.settings_path {
			// atomic saves arrive as a rename onto the settings path
			if event.kind.may_change_metadata() {
				self.reload_rules().await;
			}
			return None;
		}

		if !event.kind.may_change_metadata() {
			debug!("Ignoring {:?} on {:?}", event.kind, event.path);
			return None;
		}

		let document = Document::from_absolute(&self.vault_root, &event.path)?;
		if !document.is_markdown() || document.path.starts_with(crate::config::SETTINGS_DIR) {
			return None;
		}

		Some(self.router.on_change(&document).await)
	}

	async fn reload_rules(&self) {
		match self.router.reload_rules(&self.config.settings_path).await {
			Ok(count) => info!("Reloaded {} rules", count),
			Err(e) => warn!("Keeping previous rules, settings reload failed: {}", e),
		}
	}
}
