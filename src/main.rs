use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use songbook_server::catalog_store::{CatalogStore, SqliteCatalogStore};
use songbook_server::config::{AppConfig, CliConfig, FileConfig};
use songbook_server::server::{run_server, RequestsLoggingLevel};

/// Resolve `s` against the working directory; the path need not exist yet.
fn absolute_path(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if path.is_absolute() {
        return Ok(path);
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(&path))
        .map_err(|e| format!("Failed to get current dir: {}", e))
}

fn existing_dir(s: &str) -> Result<PathBuf, String> {
    let path = absolute_path(s)?;
    if !path.is_dir() {
        return Err(format!("Not an existing directory: {}", s));
    }
    Ok(path)
}

/// Song catalog server with duplicate detection, faceted search and reviews.
#[derive(Parser, Debug)]
#[clap(version)]
struct CliArgs {
    /// TOML configuration file. Its values override the arguments below.
    #[clap(long, value_parser = absolute_path)]
    pub config: Option<PathBuf>,

    /// Directory holding catalog.db, created on first start.
    #[clap(long, value_parser = existing_dir)]
    pub db_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// How much of each request to log.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Static frontend served in place of the stats page at `/`.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_dir: self.db_dir.clone(),
            port: self.port,
            logging_level: self.logging_level.clone(),
            frontend_dir_path: self.frontend_dir_path.clone(),
        }
    }

    fn resolve(&self) -> Result<AppConfig> {
        let file_config = self
            .config
            .as_deref()
            .map(|path| {
                info!("Loading configuration from {:?}", path);
                FileConfig::load(path)
            })
            .transpose()?;
        AppConfig::resolve(&self.to_cli_config(), file_config)
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("LOG_LEVEL")
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .try_init()
        .context("Failed to install tracing subscriber")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    init_logging()?;

    let app_config = cli_args.resolve()?;
    info!(
        "Catalog at {:?}, {} read connections, search {:?}",
        app_config.catalog_db_path(),
        app_config.read_pool_size,
        app_config.search
    );

    let catalog_store: Arc<dyn CatalogStore> = Arc::new(SqliteCatalogStore::new(
        app_config.catalog_db_path(),
        app_config.read_pool_size,
    )?);

    run_server(
        catalog_store,
        app_config.search,
        app_config.logging_level,
        app_config.port,
        app_config.frontend_dir_path,
    )
    .await
}
