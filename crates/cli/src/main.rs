//! RocketCart CLI - inspect and edit the persisted cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! cart-cli show
//!
//! # Add one unit of item 3
//! cart-cli add 3
//!
//! # Set item 3 to five units (0 removes the line)
//! cart-cli set 3 5
//!
//! # Remove item 3, or everything
//! cart-cli remove 3
//! cart-cli clear
//! ```
//!
//! Configuration is read from the environment; see `rocketcart::config`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use clap::{Parser, Subcommand};
use rocketcart::{
    CachedCatalog, CartConfig, CartManager, CartStorage, FileStore, HttpApi, TracingNotifier,
};
use rocketcart_core::ItemId;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "cart-cli")]
#[command(author, version, about = "RocketCart cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current cart
    Show,
    /// Add one unit of an item
    Add {
        /// Item ID
        id: ItemId,
    },
    /// Remove an item's line
    Remove {
        /// Item ID
        id: ItemId,
    },
    /// Set an item's quantity (0 removes it)
    Set {
        /// Item ID
        id: ItemId,
        /// New quantity
        quantity: u32,
    },
    /// Remove every line
    Clear,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CartConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match CartConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rocketcart=info,rocketcart_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &CartConfig) -> Result<(), Box<dyn std::error::Error>> {
    let api = HttpApi::new(&config.api)?;
    let catalog = CachedCatalog::new(api.clone(), config.catalog_ttl);
    let store = FileStore::open(&config.store_dir)?;
    tracing::debug!(dir = %store.dir().display(), "Opened cart store");
    let storage = CartStorage::new(store);

    let manager = CartManager::hydrate(api, catalog, storage, Arc::new(TracingNotifier))
        .with_lookup_timeout(config.api.timeout);

    match cli.command {
        Commands::Show => {}
        Commands::Add { id } => {
            manager.add(id).await?;
        }
        Commands::Remove { id } => {
            manager.remove(id).await?;
        }
        Commands::Set { id, quantity } => {
            manager.set_quantity(id, quantity).await?;
        }
        Commands::Clear => {
            manager.clear().await?;
        }
    }

    commands::show::print_cart(&manager.cart());
    Ok(())
}
