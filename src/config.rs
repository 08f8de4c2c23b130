use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Tunable learning parameters.
///
/// The defaults reproduce the reference behavior of the engine; tests and
/// the documented numeric properties all assume these values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    /// Minimum weighted similarity for an entry to join a cluster, and for
    /// a cluster to match an existing pattern description
    pub similarity_threshold: f64,
    /// Minimum cluster size before the analyzer searches for a pattern match
    pub min_group_size: usize,
    /// Maximum number of candidate patterns fetched per cluster
    pub candidate_limit: usize,
    /// Default number of unanalyzed entries fetched per analysis batch
    pub default_batch_size: usize,
    /// Base confidence assigned to a pattern before counting occurrences
    pub confidence_base: f64,
    /// Confidence gained per recorded occurrence
    pub confidence_step: f64,
    /// Hard upper bound on any pattern confidence
    pub confidence_cap: f64,
    /// Confidence gained per clustered entry when reinforcing a pattern
    pub reinforce_step: f64,
    /// Confidence stamped on history entries once analyzed
    pub analyzed_confidence: f64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
            min_group_size: 3,
            candidate_limit: 10,
            default_batch_size: 100,
            confidence_base: 0.3,
            confidence_step: 0.1,
            confidence_cap: 0.95,
            reinforce_step: 0.05,
            analyzed_confidence: 0.8,
        }
    }
}

impl EngineParams {
    /// Confidence for a pattern that has been observed `occurrence_count` times
    pub fn confidence_for(&self, occurrence_count: u64) -> f64 {
        (self.confidence_base + occurrence_count as f64 * self.confidence_step)
            .min(self.confidence_cap)
    }

    /// Confidence after a cluster of `group_size` entries reinforced a pattern
    pub fn reinforced_confidence(&self, current: f64, group_size: usize) -> f64 {
        (current + group_size as f64 * self.reinforce_step).min(self.confidence_cap)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineParams,
    /// Snapshot store location for the CLI host; defaults to the data dir
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Config::default();
            config.save()?;
            return Ok(config);
        }

        let contents = fs::read_to_string(&config_path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(&config_path, toml_string)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("config.toml"))
    }

    /// Default location of the CLI snapshot store
    pub fn default_store_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("store.json"))
    }

    /// Base data directory for configuration and snapshots
    pub fn data_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Could not determine home directory")?;

        Ok(home.join(".errlearn"))
    }
}
