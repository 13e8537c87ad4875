//! Configuration loading and typed config structures for the Plotcoin simulation.
//!
//! The canonical configuration lives in `plotcoin-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads the file. Every section and
//! every field has a default, so an empty document is a valid configuration.

use std::path::Path;

use plotcoin_agents::{InvestmentPolicy, ProfileBounds};
use plotcoin_economy::catalog::{ANTMINER_S9, HIA_375};
use plotcoin_economy::{CatalogItem, EconomyError, EquipmentCatalog};
use plotcoin_types::GridCoord;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Environment variable that overrides `world.seed`.
pub const SEED_ENV_VAR: &str = "PLOTCOIN_SEED";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The values parsed but cannot drive a session (e.g. a zero period).
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `plotcoin-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Map and allocation settings.
    #[serde(default)]
    pub world: WorldConfig,

    /// Money, reward, and timing parameters.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Bot population and profile bounds.
    #[serde(default)]
    pub bots: BotsConfig,

    /// Purchasable equipment.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Drifting clouds.
    #[serde(default)]
    pub weather: WeatherConfig,

    /// How long the engine binary runs.
    #[serde(default)]
    pub run: RunConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `PLOTCOIN_SEED`, when set to an integer, overrides `world.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if [`SimulationConfig::validate`] fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if [`SimulationConfig::validate`] fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.world.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check every repeating period and the bot window bounds.
    ///
    /// Catalog defaults and the starter budget are checked when the
    /// session builds its catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.economy.block_time_secs == 0 {
            return Err(invalid("economy.block_time_secs must be at least 1"));
        }
        if self.economy.energy_period_mins == 0 {
            return Err(invalid("economy.energy_period_mins must be at least 1"));
        }
        if self.weather.enabled && self.weather.move_interval_secs == 0 {
            return Err(invalid("weather.move_interval_secs must be at least 1"));
        }
        if self.bots.min_window_mins == 0 {
            return Err(invalid("bots.min_window_mins must be at least 1"));
        }
        if self.bots.max_window_mins < self.bots.min_window_mins {
            return Err(invalid("bots.max_window_mins is below bots.min_window_mins"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

/// Map and allocation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Where the first claim is placed.
    #[serde(default = "default_location")]
    pub default_location: GridCoord,

    /// Buffer kept around every claim, in tiles.
    #[serde(default = "default_proximity")]
    pub proximity: u32,

    /// Smallest width the global region is padded to.
    #[serde(default = "default_min_region_width")]
    pub min_region_width: u32,

    /// Smallest height the global region is padded to.
    #[serde(default = "default_min_region_height")]
    pub min_region_height: u32,

    /// How many times the allocator may widen its search ring.
    #[serde(default = "default_max_ring_expansions")]
    pub max_ring_expansions: u32,
}

impl WorldConfig {
    /// Override the seed from `PLOTCOIN_SEED` when it holds an integer.
    pub fn apply_env_overrides(&mut self) {
        if let Some(seed) = std::env::var(SEED_ENV_VAR)
            .ok()
            .and_then(|val| val.trim().parse().ok())
        {
            self.seed = seed;
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            default_location: default_location(),
            proximity: default_proximity(),
            min_region_width: default_min_region_width(),
            min_region_height: default_min_region_height(),
            max_ring_expansions: default_max_ring_expansions(),
        }
    }
}

/// Money, reward, and timing parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EconomyConfig {
    /// Cash every new claim starts with, in USD.
    #[serde(default = "default_starting_cash")]
    pub starting_cash: Decimal,

    /// Bitcoin paid per block.
    #[serde(default = "default_reward_btc")]
    pub reward_btc: Decimal,

    /// USD per BTC.
    #[serde(default = "default_exchange_rate")]
    pub exchange_rate: Decimal,

    /// Seconds between lottery draws and contract settlements.
    #[serde(default = "default_block_time_secs")]
    pub block_time_secs: u64,

    /// Minutes between energy collections for each piece of equipment.
    #[serde(default = "default_energy_period_mins")]
    pub energy_period_mins: u32,
}

impl EconomyConfig {
    /// Seconds between energy collections.
    pub fn energy_period_secs(&self) -> u64 {
        u64::from(self.energy_period_mins).saturating_mul(crate::clock::SECONDS_PER_MINUTE)
    }
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_cash: default_starting_cash(),
            reward_btc: default_reward_btc(),
            exchange_rate: default_exchange_rate(),
            block_time_secs: default_block_time_secs(),
            energy_period_mins: default_energy_period_mins(),
        }
    }
}

/// Bot population and the ranges bot profiles are drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotsConfig {
    /// Bots spawned by the engine binary.
    #[serde(default = "default_bot_count")]
    pub count: u32,

    /// Shortest analysis window in minutes.
    #[serde(default = "default_min_window_mins")]
    pub min_window_mins: u32,

    /// Longest analysis window in minutes.
    #[serde(default = "default_max_window_mins")]
    pub max_window_mins: u32,

    /// Lowest cash ratio.
    #[serde(default = "default_ratio_low")]
    pub min_cash_ratio: Decimal,

    /// Highest cash ratio.
    #[serde(default = "default_ratio_high")]
    pub max_cash_ratio: Decimal,

    /// Lowest self-sustain ratio.
    #[serde(default = "default_ratio_low")]
    pub min_self_sustain_ratio: Decimal,

    /// Highest self-sustain ratio.
    #[serde(default = "default_ratio_high")]
    pub max_self_sustain_ratio: Decimal,

    /// Which equipment investing bots buy.
    #[serde(default)]
    pub investment_policy: InvestmentPolicy,
}

impl BotsConfig {
    /// The profile bounds described by this section.
    pub const fn bounds(&self) -> ProfileBounds {
        ProfileBounds {
            min_window_mins: self.min_window_mins,
            max_window_mins: self.max_window_mins,
            min_cash_ratio: self.min_cash_ratio,
            max_cash_ratio: self.max_cash_ratio,
            min_self_sustain_ratio: self.min_self_sustain_ratio,
            max_self_sustain_ratio: self.max_self_sustain_ratio,
        }
    }
}

impl Default for BotsConfig {
    fn default() -> Self {
        Self {
            count: default_bot_count(),
            min_window_mins: default_min_window_mins(),
            max_window_mins: default_max_window_mins(),
            min_cash_ratio: default_ratio_low(),
            max_cash_ratio: default_ratio_high(),
            min_self_sustain_ratio: default_ratio_low(),
            max_self_sustain_ratio: default_ratio_high(),
            investment_policy: InvestmentPolicy::default(),
        }
    }
}

/// Purchasable equipment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogConfig {
    /// Catalog id bought when a miner is requested without a model.
    #[serde(default = "default_miner_id")]
    pub default_miner: String,

    /// Catalog id bought when a panel is requested without a model.
    #[serde(default = "default_panel_id")]
    pub default_panel: String,

    /// Every purchasable model.
    #[serde(default = "EquipmentCatalog::standard_items")]
    pub items: Vec<CatalogItem>,
}

impl CatalogConfig {
    /// Build the catalog and resolve its defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::UnknownEquipment`] or
    /// [`EconomyError::CatalogKindMismatch`] for a bad default id.
    pub fn build(&self) -> Result<EquipmentCatalog, EconomyError> {
        EquipmentCatalog::new(self.items.clone(), &self.default_miner, &self.default_panel)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_miner: default_miner_id(),
            default_panel: default_panel_id(),
            items: EquipmentCatalog::standard_items(),
        }
    }
}

/// Drifting clouds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WeatherConfig {
    /// Whether clouds are spawned at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Clouds spawned once the first claim exists.
    #[serde(default = "default_cloud_count")]
    pub clouds: u32,

    /// Seconds between cloud steps.
    #[serde(default = "default_move_interval_secs")]
    pub move_interval_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            clouds: default_cloud_count(),
            move_interval_secs: default_move_interval_secs(),
        }
    }
}

/// How long the engine binary runs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Simulated seconds to run.
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,

    /// Human players spawned alongside the bots.
    #[serde(default = "default_human_count")]
    pub humans: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_duration_secs(),
            humans: default_human_count(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    42
}

const fn default_location() -> GridCoord {
    GridCoord::ORIGIN
}

const fn default_proximity() -> u32 {
    1
}

const fn default_min_region_width() -> u32 {
    10
}

const fn default_min_region_height() -> u32 {
    5
}

const fn default_max_ring_expansions() -> u32 {
    64
}

fn default_starting_cash() -> Decimal {
    Decimal::new(5000, 0)
}

fn default_reward_btc() -> Decimal {
    Decimal::new(65, 1)
}

fn default_exchange_rate() -> Decimal {
    Decimal::new(23_000, 0)
}

const fn default_block_time_secs() -> u64 {
    600
}

const fn default_energy_period_mins() -> u32 {
    10
}

const fn default_bot_count() -> u32 {
    3
}

const fn default_min_window_mins() -> u32 {
    5
}

const fn default_max_window_mins() -> u32 {
    10
}

const fn default_ratio_low() -> Decimal {
    Decimal::ZERO
}

const fn default_ratio_high() -> Decimal {
    Decimal::ONE
}

fn default_miner_id() -> String {
    ANTMINER_S9.to_owned()
}

fn default_panel_id() -> String {
    HIA_375.to_owned()
}

const fn default_true() -> bool {
    true
}

const fn default_cloud_count() -> u32 {
    3
}

const fn default_move_interval_secs() -> u64 {
    10
}

const fn default_duration_secs() -> u64 {
    14_400
}

const fn default_human_count() -> u32 {
    1
}

fn default_log_level() -> String {
    "info".to_owned()
}
