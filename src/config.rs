use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use validator::{Validate, ValidationError};
use std::path::Path;
use std::time::Duration;

use crate::models::{ScoringThresholds, ScoringWeights};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub appwrite: AppwriteSettings,
    pub collection: CollectionSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppwriteSettings {
    pub endpoint: String,
    pub api_key: String,
    pub project_id: String,
    pub database_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSettings {
    pub profiles: String,
    pub matches: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

/// Queue, undo and refresh policy for each swipe session
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "default_low_water_mark")]
    pub low_water_mark: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_undo_capacity")]
    pub undo_capacity: usize,
    #[serde(default = "default_refresh_cooldown_secs")]
    pub refresh_cooldown_secs: u64,
    #[serde(default = "default_match_expiry_hours")]
    pub match_expiry_hours: i64,
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            low_water_mark: default_low_water_mark(),
            batch_size: default_batch_size(),
            undo_capacity: default_undo_capacity(),
            refresh_cooldown_secs: default_refresh_cooldown_secs(),
            match_expiry_hours: default_match_expiry_hours(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

impl EngineSettings {
    pub fn refresh_cooldown(&self) -> Duration {
        Duration::from_secs(self.refresh_cooldown_secs)
    }

    pub fn match_expiry(&self) -> chrono::Duration {
        chrono::Duration::hours(self.match_expiry_hours)
    }
}

fn default_low_water_mark() -> usize { 5 }
fn default_batch_size() -> usize { 20 }
fn default_undo_capacity() -> usize { 10 }
fn default_refresh_cooldown_secs() -> u64 { 60 }
fn default_match_expiry_hours() -> i64 { crate::core::matcher::DEFAULT_MATCH_EXPIRY_HOURS }
fn default_session_idle_secs() -> u64 { 1800 }

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ScoringSettings {
    #[validate(nested)]
    #[serde(default)]
    pub weights: WeightsConfig,
    #[validate(nested)]
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WeightsConfig {
    #[validate(range(min = 0.0))]
    #[serde(default = "default_criterion_weight")]
    pub energy: f64,
    #[validate(range(min = 0.0))]
    #[serde(default = "default_criterion_weight")]
    pub size: f64,
    #[validate(range(min = 0.0))]
    #[serde(default = "default_criterion_weight")]
    pub age: f64,
    #[validate(range(min = 0.0))]
    #[serde(default = "default_criterion_weight")]
    pub distance: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            energy: default_criterion_weight(),
            size: default_criterion_weight(),
            age: default_criterion_weight(),
            distance: default_criterion_weight(),
        }
    }
}

fn default_criterion_weight() -> f64 { 0.25 }

/// Thresholds must satisfy 0 <= is_match <= high_compatibility <= perfect_match <= 1
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_threshold_order"))]
pub struct ThresholdsConfig {
    #[serde(default = "default_match_threshold")]
    pub is_match: f64,
    #[serde(default = "default_high_threshold")]
    pub high_compatibility: f64,
    #[serde(default = "default_perfect_threshold")]
    pub perfect_match: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            is_match: default_match_threshold(),
            high_compatibility: default_high_threshold(),
            perfect_match: default_perfect_threshold(),
        }
    }
}

fn validate_threshold_order(thresholds: &ThresholdsConfig) -> Result<(), ValidationError> {
    let ordered = 0.0 <= thresholds.is_match
        && thresholds.is_match <= thresholds.high_compatibility
        && thresholds.high_compatibility <= thresholds.perfect_match
        && thresholds.perfect_match <= 1.0;
    if !ordered {
        return Err(ValidationError::new("thresholds_out_of_order"));
    }
    Ok(())
}

fn default_match_threshold() -> f64 { 0.7 }
fn default_high_threshold() -> f64 { 0.8 }
fn default_perfect_threshold() -> f64 { 0.95 }

impl ScoringSettings {
    pub fn weights(&self) -> ScoringWeights {
        ScoringWeights {
            energy: self.weights.energy,
            size: self.weights.size,
            age: self.weights.age,
            distance: self.weights.distance,
        }
    }

    pub fn thresholds(&self) -> ScoringThresholds {
        ScoringThresholds {
            is_match: self.thresholds.is_match,
            high_compatibility: self.thresholds.high_compatibility,
            perfect_match: self.thresholds.perfect_match,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with PAWMATCH_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., PAWMATCH__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("PAWMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize::<Self>()?.validated()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("PAWMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize::<Self>()?.validated()
    }

    /// Reject scoring values the matcher cannot work with
    fn validated(self) -> Result<Self, ConfigError> {
        self.scoring
            .validate()
            .map_err(|e| ConfigError::Message(format!("Invalid scoring settings: {}", e)))?;
        Ok(self)
    }
}

/// Apply secrets provided through plain environment variables
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    // DATABASE_URL wins over the file value when present
    if let Ok(database_url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", database_url)?;
    }
    if let Ok(api_key) = env::var("APPWRITE_API_KEY") {
        builder = builder.set_override("appwrite.api_key", api_key)?;
    }
    if let Ok(project_id) = env::var("APPWRITE_PROJECT_ID") {
        builder = builder.set_override("appwrite.project_id", project_id)?;
    }

    builder.build()
}
