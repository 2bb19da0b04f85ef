//! pluginsync - load order inspection and repair from the command line
//!
//! Drives [`LoadOrderService`] against a game installation with no mod manager
//! in front of it: every plugin in the data directory is treated as untracked.
//!
//! # Execution Flow
//!
//! 1. Load `pluginsync.yaml` (plus `PLUGINSYNC_*` overrides) from the config directory
//! 2. Initialize logging (rotating file + optional console)
//! 3. Create the tokio runtime, state manager and service
//! 4. Run the requested command
//! 5. Log the metrics summary and shut the runtime down

use anyhow::Result;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};
use pluginsync::metrics::Metrics;
use pluginsync::models::LoadOrder;
use pluginsync::services::{
    Collaborators, FixId, FixedDiscovery, GameStore, LoadOrderService, TracingNotificationSink,
    UnmanagedModIndex,
};
use pluginsync::{APP_NAME, ConfigManager, StateManager, VERSION};
use std::sync::Arc;
use std::time::Duration;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "pluginsync")]
#[command(about = "Inspect and repair the plugin load order of a Gamebryo game")]
#[command(version)]
struct Cli {
    /// Game installation root
    #[arg(short, long, value_name = "PATH")]
    game_root: Utf8PathBuf,

    /// Directory holding pluginsync.yaml
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    config_dir: Utf8PathBuf,

    /// Store the game was installed from
    #[arg(long, value_enum, default_value_t = StoreArg::Steam)]
    store: StoreArg,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the reconciled load order
    Show,
    /// Report native order problems and missing plugin files
    Check,
    /// Apply one repair and save the result
    Fix {
        #[arg(value_enum)]
        fix: FixArg,
    },
    /// Rewrite plugins.txt with only the native plugins
    Reset,
    /// Copy plugins.txt aside for a profile
    Backup {
        #[arg(default_value = "default")]
        profile: String,
    },
    /// Restore the plugins.txt backup of a profile (Xbox store only)
    Restore {
        #[arg(default_value = "default")]
        profile: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StoreArg {
    Steam,
    Xbox,
    Other,
}

impl From<StoreArg> for GameStore {
    fn from(store: StoreArg) -> Self {
        match store {
            StoreArg::Steam => GameStore::Steam,
            StoreArg::Xbox => GameStore::Xbox,
            StoreArg::Other => GameStore::Other,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FixArg {
    NativeOrder,
    EnableNatives,
    DisableExcluded,
    RemoveInvalid,
}

impl From<FixArg> for FixId {
    fn from(fix: FixArg) -> Self {
        match fix {
            FixArg::NativeOrder => FixId::RepairNativeOrder,
            FixArg::EnableNatives => FixId::EnableNativePlugins,
            FixArg::DisableExcluded => FixId::DisableExcludedPlugins,
            FixArg::RemoveInvalid => FixId::RemoveInvalidEntries,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_manager = ConfigManager::new(&cli.config_dir)?;
    let mut config = config_manager.load_config()?;
    config.logging.debug |= cli.verbose;

    let _guard = pluginsync::logging::init_logging(&config.logging)?;
    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("pluginsync-worker")
        .build()?;

    let metrics = Arc::new(Metrics::new());
    let collaborators = Collaborators {
        discovery: Arc::new(FixedDiscovery::new(
            &cli.game_root,
            &config.load_order.data_path,
            cli.store.into(),
        )),
        mods: Arc::new(UnmanagedModIndex),
        notifications: Arc::new(TracingNotificationSink),
    };

    let result = runtime.block_on(async {
        let service = LoadOrderService::new(
            collaborators,
            config,
            StateManager::new(),
            Arc::clone(&metrics),
        );
        run(&service, cli.command).await
    });

    metrics.log_summary();
    runtime.shutdown_timeout(Duration::from_secs(5));
    tracing::info!("Shutdown complete");

    result
}

async fn run(service: &LoadOrderService, command: Command) -> Result<()> {
    match command {
        Command::Show => {
            let order = service.deserialize().await?;
            print_order(&order);
        }
        Command::Check => {
            let order = service.deserialize().await?;
            match service.check(&order).await {
                Some(result) => println!("{} invalid entries", result.invalid.len()),
                None => println!("No missing plugin files"),
            }
        }
        Command::Fix { fix } => {
            let order = service.apply_fix(fix.into()).await?;
            print_order(&order);
            service.flush_pending_check().await;
        }
        Command::Reset => {
            let order = service.reset_plugins_file().await?;
            print_order(&order);
            service.flush_pending_check().await;
        }
        Command::Backup { profile } => match service.backup_plugins_file(&profile).await? {
            Some(path) => println!("Backed up to {}", path),
            None => println!("No plugins file to back up"),
        },
        Command::Restore { profile } => {
            if service.restore_plugins_file(&profile).await? {
                println!("Restored plugins file for profile {}", profile);
            } else {
                println!("Nothing restored");
            }
        }
    }
    Ok(())
}

fn print_order(order: &LoadOrder) {
    for (index, entry) in order.iter().enumerate() {
        let marker = if entry.is_effectively_enabled() { 'x' } else { ' ' };
        let suffix = if entry.invalid { " (missing)" } else { "" };
        println!("{:>3} [{}] {}{}", index, marker, entry.name, suffix);
    }
}
