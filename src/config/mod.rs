use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

const CONFIG_FILE_STEM: &str = "contribstats";
const ENV_PREFIX: &str = "CONTRIBSTATS";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub user_agents: Vec<String>,
    /// Versions not matching this pattern are skipped when discovered.
    pub version_pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub default_format: String,
    pub output_stem: String,
    /// Length of the default reporting window, ending today.
    pub window_days: i64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://translate.openstack.org/rest".to_string(),
            user_agents: vec![
                "Mozilla/5.0 (X11; Ubuntu; Linux x86_64) Gecko/20100101 Firefox/32.0".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_9_6) AppleWebKit/537.78.2".to_string(),
                "Mozilla/5.0 (Windows NT 6.3; WOW64) Gecko/20100101 Firefox/32.0".to_string(),
                "Mozilla/5.0 (Macintosh; Intel Mac OS X) Chrome/37.0.2062.120".to_string(),
                "Mozilla/5.0 (Windows NT 6.1; WOW64; Trident/7.0; rv:11.0) like Gecko".to_string(),
            ],
            version_pattern: r"^(master[-,a-z]*|stable-[a-z]+)$".to_string(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_format: "csv".to_string(),
            output_stem: "zanata_stats_output".to_string(),
            window_days: 180,
        }
    }
}

impl Config {
    /// Layers built-in defaults, then the config file, then `CONTRIBSTATS_*`
    /// environment variables (`__` separates nested keys).
    ///
    /// Without an explicit `path`, an optional `contribstats.{toml,yaml,json}`
    /// in the working directory is picked up.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => ::config::File::from(path).required(true),
            None => ::config::File::with_name(CONFIG_FILE_STEM).required(false),
        };

        let config: Config = ::config::Config::builder()
            .add_source(::config::Config::try_from(&Config::default())?)
            .add_source(file)
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }
}
