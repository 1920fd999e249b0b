use std::collections::{BTreeMap, HashMap};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment};
use pricewatch_catalog::{CatalogClientConfig, DEFAULT_CATALOG_URL, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use tracing::debug;
use xdg::BaseDirectories;

/// Name of pricewatch managed directories (config, data, cache)
const PRICEWATCH_DIR_NAME: &str = "pricewatch";
pub const PRICEWATCH_CONFIG_FILE: &str = "pricewatch.toml";
const PRICEWATCH_CONFIG_DIR_VAR: &str = "PRICEWATCH_CONFIG_DIR";
const PRICEWATCH_ENV_PREFIX: &str = "PRICEWATCH_";
/// Catalog url as set for the web frontend, used unless overridden
const API_BASE_URL_VAR: &str = "API_BASE_URL";

const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Config {
    /// Base url of the catalog API
    pub catalog_url: String,

    /// Offers fetched per page
    pub page_size: u32,

    /// Delay before a search is sent
    pub search_debounce_ms: u64,

    /// User agent sent with every request
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Additional headers sent with every request
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,
}

impl Config {
    /// Read the config from config files and `PRICEWATCH_*` variables.
    ///
    /// Sources, last wins:
    /// - built-in defaults (`$API_BASE_URL` sets the default catalog url)
    /// - `pricewatch.toml` in the XDG config directories
    /// - `$PRICEWATCH_CONFIG_DIR/pricewatch.toml`
    /// - `PRICEWATCH_<KEY>` variables
    pub fn parse() -> Result<Config> {
        let config_files = BaseDirectories::with_prefix(PRICEWATCH_DIR_NAME)
            .find_config_files(PRICEWATCH_CONFIG_FILE)
            .collect::<Vec<_>>();
        Self::from_sources(config_files, env::vars().collect())
    }

    pub(crate) fn from_sources(
        mut config_files: Vec<PathBuf>,
        vars: HashMap<String, String>,
    ) -> Result<Config> {
        if let Some(config_dir) = vars.get(PRICEWATCH_CONFIG_DIR_VAR) {
            debug!("`${PRICEWATCH_CONFIG_DIR_VAR}` set: {config_dir}");
            config_files.push(PathBuf::from(config_dir).join(PRICEWATCH_CONFIG_FILE));
        }

        let default_url = vars
            .get(API_BASE_URL_VAR)
            .map(String::as_str)
            .unwrap_or(DEFAULT_CATALOG_URL);

        let mut builder = HierarchicalConfig::builder()
            .set_default("catalog_url", default_url)?
            .set_default("page_size", DEFAULT_PAGE_SIZE)?
            .set_default("search_debounce_ms", DEFAULT_SEARCH_DEBOUNCE_MS)?;

        for file in config_files {
            debug!(?file, "adding config file");
            builder = builder.add_source(
                config::File::from(file)
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }

        // override via env variables
        let pricewatch_envs = vars
            .into_iter()
            .filter(|(k, _)| k != PRICEWATCH_CONFIG_DIR_VAR)
            .filter_map(|(k, v)| {
                k.strip_prefix(PRICEWATCH_ENV_PREFIX)
                    .map(|k| (k.to_owned(), v))
            })
            .collect::<HashMap<_, _>>();
        builder = builder.add_source(
            Environment::default()
                .source(Some(pricewatch_envs))
                .try_parsing(true),
        );

        let config: Config = builder
            .build()?
            .try_deserialize()
            .context("Could not parse config")?;
        debug!(?config, "loaded config");
        Ok(config)
    }

    pub fn catalog_client_config(&self) -> CatalogClientConfig {
        CatalogClientConfig {
            extra_headers: self.extra_headers.clone(),
            user_agent: self.user_agent.clone(),
            ..CatalogClientConfig::with_url(self.catalog_url.clone())
        }
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}
