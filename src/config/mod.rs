//! Runtime configuration: CLI arguments merged with an optional TOML file.

mod file_config;

pub use file_config::{FileConfig, SearchConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{anyhow, bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_READ_POOL_SIZE: usize = 4;

/// CLI arguments that take part in config resolution.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub read_pool_size: usize,
    pub search: SearchSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    pub per_page: usize,
    pub autocomplete_limit: usize,
    /// How many of a song's most frequent review tags are shown and matched.
    pub top_tags_count: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            per_page: 20,
            autocomplete_limit: 10,
            top_tags_count: 3,
        }
    }
}

impl SearchSettings {
    /// Defaults with any value present in the `[search]` table applied.
    fn merged(file: SearchConfig) -> Result<Self> {
        let defaults = Self::default();
        let settings = Self {
            per_page: file.per_page.unwrap_or(defaults.per_page),
            autocomplete_limit: file
                .autocomplete_limit
                .unwrap_or(defaults.autocomplete_limit),
            top_tags_count: file.top_tags_count.unwrap_or(defaults.top_tags_count),
        };
        if settings.per_page == 0 {
            bail!("search.per_page must be at least 1");
        }
        Ok(settings)
    }
}

fn resolve_db_dir(file_value: Option<String>, cli_value: Option<&PathBuf>) -> Result<PathBuf> {
    let db_dir = file_value
        .map(PathBuf::from)
        .or_else(|| cli_value.cloned())
        .ok_or_else(|| anyhow!("db_dir must be specified via --db-dir or in config file"))?;
    if !db_dir.exists() {
        bail!("Database directory does not exist: {:?}", db_dir);
    }
    if !db_dir.is_dir() {
        bail!("db_dir is not a directory: {:?}", db_dir);
    }
    Ok(db_dir)
}

impl AppConfig {
    /// Merge CLI and file configuration. File values win where present; an
    /// unrecognized file logging level keeps the CLI one.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let read_pool_size = file.read_pool_size.unwrap_or(DEFAULT_READ_POOL_SIZE);
        if read_pool_size == 0 {
            bail!("read_pool_size must be at least 1");
        }

        Ok(Self {
            db_dir: resolve_db_dir(file.db_dir, cli.db_dir.as_ref())?,
            port: file.port.unwrap_or(cli.port),
            logging_level: file
                .logging_level
                .as_deref()
                .and_then(parse_logging_level)
                .unwrap_or_else(|| cli.logging_level.clone()),
            frontend_dir_path: file
                .frontend_dir_path
                .or_else(|| cli.frontend_dir_path.clone()),
            read_pool_size,
            search: SearchSettings::merged(file.search.unwrap_or_default())?,
        })
    }

    pub fn catalog_db_path(&self) -> PathBuf {
        self.db_dir.join("catalog.db")
    }
}

/// Case-insensitive, via clap's ValueEnum.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
