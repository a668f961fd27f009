use clap::Parser;
use rust_router::{
	Document, DryRunMover, FrontmatterIndex, FsMover, Router, RouterConfig, RouterWatcher, RuleStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "router")]
#[command(about = "Moves markdown documents when their frontmatter newly matches a routing rule")]
struct Cli {
	/// Vault directory to watch
	#[arg(short, long)]
	vault: PathBuf,

	/// Settings file with the ordered rule list (default: <vault>/.router/settings.json)
	#[arg(short, long)]
	settings: Option<PathBuf>,

	/// Enable verbose logging
	#[arg(long)]
	verbose: bool,

	/// Log moves instead of performing them
	#[arg(long)]
	dry_run: bool,

	/// Create destination folders that do not exist yet
	#[arg(long)]
	create_folders: bool,

	/// Evaluate a single vault-relative document once and exit
	#[arg(long)]
	once: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let mut config = RouterConfig::for_vault(cli.vault);
	if let Some(settings) = cli.settings {
		config.settings_path = settings;
	}
	config.create_missing_folders = cli.create_folders;
	config.dry_run = cli.dry_run;
	config.validate()?;

	let rules = RuleStore::load(&config.settings_path).await?;

	let level = if cli.verbose || rules.debug() {
		Level::DEBUG
	} else {
		Level::INFO
	};
	tracing_subscriber::fmt().with_max_level(level).init();

	info!(
		"Loaded {} rules from {:?} for vault {:?}",
		rules.len(),
		config.settings_path,
		config.vault_root
	);

	let index = FrontmatterIndex::new(&config.vault_root);
	let router = if config.dry_run {
		Router::new(rules, index, DryRunMover)
	} else {
		let mover = FsMover::new(&config.vault_root)
			.with_create_missing_folders(config.create_missing_folders)
			.with_retry(config.retry.clone());
		Router::new(rules, index, mover)
	};

	if let Some(path) = cli.once {
		let outcome = router.on_change(&Document::new(path)).await;
		info!("Outcome: {:?}", outcome);
		return Ok(());
	}

	let mut watcher = RouterWatcher::new(config, Arc::new(router));

	tokio::select! {
		result = watcher.start_watching() => result?,
		_ = tokio::signal::ctrl_c() => info!("Shutting down router..."),
	}

	Ok(())
}

