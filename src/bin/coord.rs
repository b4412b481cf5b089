//! Coordinator binary

use clap::{builder::FalseyValueParser, ArgAction, Args, Parser, Subcommand};
use hellopi::common::{Config, CoordinatorConfig, Profile};
use hellopi::coordinator::{Coordinator, DeleteFilter, MessageStore, StartupMode};
use std::net::IpAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hellopi-coord")]
#[command(about = "Records Raspberry Pi check-ins and lists hostname → address")]
#[command(version)]
struct Cli {
    /// Configuration file (default: ./hellopi.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StoreArgs {
    /// SQLite database file
    #[arg(long, env = "DATABASE")]
    db: Option<PathBuf>,

    /// Deployment profile (selects the default database location)
    #[arg(long, env = "HELLOPI_PROFILE", value_enum)]
    profile: Option<Profile>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start coordinator server
    Serve {
        /// Interface to listen on
        #[arg(long)]
        bind: Option<IpAddr>,

        /// HTTP port
        #[arg(long, env = "PORT")]
        port: Option<u16>,

        /// Verbose logging
        #[arg(long, env = "DEBUG", action = ArgAction::SetTrue, value_parser = FalseyValueParser::new())]
        debug: bool,

        /// Drop and recreate the message table before serving
        #[arg(long)]
        reset: bool,

        /// Keep entries from test runs instead of removing them on startup
        #[arg(long)]
        keep_test_entries: bool,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Remove entries left behind by test runs, then exit
    Clean {
        #[command(flatten)]
        store: StoreArgs,
    },
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.to_string().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn apply_store_args(config: &mut CoordinatorConfig, args: StoreArgs) {
    if let Some(profile) = args.profile {
        config.profile = profile;
    }
    if let Some(db) = args.db {
        config.db_path = Some(db);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // File and environment first, then CLI flags on top
    let config = Config::load_from(cli.config.as_deref())?;
    let mut coord_config = config.coordinator;

    match cli.command {
        Commands::Serve {
            bind,
            port,
            debug,
            reset,
            keep_test_entries,
            store,
        } => {
            if let Some(bind) = bind {
                coord_config.host = bind;
            }
            if let Some(port) = port {
                coord_config.port = port;
            }
            if debug {
                coord_config.debug = true;
            }
            if keep_test_entries {
                coord_config.clean_test_entries = false;
            }
            apply_store_args(&mut coord_config, store);

            let level = if coord_config.debug {
                "debug"
            } else {
                config.log_level.as_str()
            };
            init_tracing(level);

            let mode = if reset {
                StartupMode::Reset
            } else {
                StartupMode::Normal
            };
            Coordinator::new(coord_config).serve(mode).await?;
        }

        Commands::Clean { store } => {
            init_tracing(&config.log_level);
            apply_store_args(&mut coord_config, store);

            let store = MessageStore::new(coord_config.database_path());
            store.initialize().await?;
            let removed = store
                .delete_matching(&DeleteFilter::test_entries())
                .await?;
            println!("Cleaned {} test entries from {}", removed, store.path().display());
        }
    }

    Ok(())
}
