// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Configuration module

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::export::ExportFormat;

/// Longest duration any setting may span, one hundred years in seconds
pub const MAX_DURATION_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level
    pub log_level: String,

    /// Simulation configuration
    pub simulation: SimulationConfig,

    /// Alert evaluation configuration
    pub alerts: AlertConfig,

    /// Security configuration
    pub security: SecurityConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Export configuration
    pub export: ExportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            simulation: SimulationConfig::default(),
            alerts: AlertConfig::default(),
            security: SecurityConfig::default(),
            database: DatabaseConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config {:?}", path))?;
        config
            .validate()
            .with_context(|| format!("invalid config {:?}", path))?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Reject values the simulation, alerts or auth cannot run with
    pub fn validate(&self) -> Result<()> {
        check_probability(
            "simulation.event_probability",
            self.simulation.event_probability,
        )?;
        check_probability(
            "simulation.disconnection_probability",
            self.simulation.disconnection_probability,
        )?;

        check_duration("alerts.cooldown_secs", self.alerts.cooldown_secs)?;
        check_duration("alerts.traffic_window_secs", self.alerts.traffic_window_secs)?;

        let lockout = self.security.lockout_minutes;
        ensure!(
            lockout >= 0,
            "security.lockout_minutes must not be negative, got {}",
            lockout
        );
        check_duration("security.lockout_minutes", (lockout as u64).saturating_mul(60))?;
        check_duration(
            "security.session_timeout_secs",
            self.security.session_timeout_secs,
        )?;

        check_duration(
            "database.retention_days",
            u64::from(self.database.retention_days) * 24 * 60 * 60,
        )?;
        check_duration(
            "database.cleanup_interval_secs",
            self.database.cleanup_interval_secs,
        )?;
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("footfall"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

fn check_probability(name: &str, value: f64) -> Result<()> {
    ensure!(
        value.is_finite() && (0.0..=1.0).contains(&value),
        "{} must be between 0 and 1, got {}",
        name,
        value
    );
    Ok(())
}

fn check_duration(name: &str, secs: u64) -> Result<()> {
    ensure!(
        secs <= MAX_DURATION_SECS,
        "{} spans more than {} seconds",
        name,
        MAX_DURATION_SECS
    );
    Ok(())
}

/// How many people a single simulated event carries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GroupSizeMode {
    /// Always one person per event
    Single,
    /// Mall-like mix of singles, couples and groups up to six
    Realistic,
}

/// Simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Shortest pause between cycles in milliseconds
    pub min_interval_ms: u64,

    /// Longest pause between cycles in milliseconds
    pub max_interval_ms: u64,

    /// Chance that an active device reports anything in a cycle
    pub event_probability: f64,

    /// Chance that a device drops its link in a cycle
    pub disconnection_probability: f64,

    pub group_size: GroupSizeMode,

    /// Also store a cumulative counter snapshot each cycle
    pub record_readings: bool,

    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 2000,
            max_interval_ms: 8000,
            event_probability: 0.7,
            disconnection_probability: 0.02,
            group_size: GroupSizeMode::Single,
            record_readings: false,
            seed: None,
        }
    }
}

/// Alert evaluation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Minimum seconds between two alerts of the same kind for one device
    pub cooldown_secs: u64,

    /// Window used to count entries for traffic peaks
    pub traffic_window_secs: u64,

    /// Alerts kept in memory by the engine
    pub history_size: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 300,
            traffic_window_secs: 300,
            history_size: 1000,
        }
    }
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Minimum password length
    pub min_password_length: usize,

    /// Failed logins before a username is locked out
    pub lockout_threshold: u32,

    /// Lockout duration in minutes
    pub lockout_minutes: i64,

    /// Session timeout in seconds
    pub session_timeout_secs: u64,

    /// Security events kept in memory
    pub audit_log_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            min_password_length: 8,
            lockout_threshold: 5,
            lockout_minutes: 15,
            session_timeout_secs: 3600,
            audit_log_size: 1000,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database path
    pub path: PathBuf,

    /// Retention period in days
    pub retention_days: u32,

    /// How often the engine purges expired rows
    pub cleanup_interval_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/footfall.db"),
            retention_days: 30,
            cleanup_interval_secs: 3600,
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub path: PathBuf,
    pub format: ExportFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/exports"),
            format: ExportFormat::Csv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_survives_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.simulation.min_interval_ms, 2000);
        assert_eq!(parsed.simulation.group_size, GroupSizeMode::Single);
        assert_eq!(parsed.alerts.cooldown_secs, 300);
        assert_eq!(parsed.database.retention_days, 30);
        assert_eq!(parsed.export.format, ExportFormat::Csv);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            log_level = "debug"

            [simulation]
            seed = 7
            group_size = "realistic"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.log_level, "debug");
        assert_eq!(parsed.simulation.seed, Some(7));
        assert_eq!(parsed.simulation.group_size, GroupSizeMode::Realistic);
        assert_eq!(parsed.simulation.max_interval_ms, 8000);
        assert_eq!(parsed.security.min_password_length, 8);
    }

    #[test]
    fn test_unknown_top_level_keys_are_ignored() {
        let parsed: Config = toml::from_str(
            r#"
            app_name = "footfall"
            data_dir = "./data"
            log_level = "warn"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.log_level, "warn");
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_nan_probability_is_rejected() {
        let parsed: Config = toml::from_str(
            r#"
            [simulation]
            event_probability = nan
            seed = 1
            "#,
        )
        .unwrap();
        let err = parsed.validate().unwrap_err();
        assert!(err.to_string().contains("simulation.event_probability"));
    }

    #[test]
    fn test_out_of_range_probability_is_rejected() {
        let mut config = Config::default();
        config.simulation.disconnection_probability = 1.5;
        assert!(config.validate().is_err());

        config.simulation.disconnection_probability = -0.1;
        assert!(config.validate().is_err());

        config.simulation.disconnection_probability = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_oversized_durations_are_rejected() {
        let mut config = Config::default();
        config.security.lockout_minutes = i64::MAX;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("security.lockout_minutes"));

        config.security.lockout_minutes = -1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.alerts.cooldown_secs = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.security.session_timeout_secs = MAX_DURATION_SECS + 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.database.retention_days = u32::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let path = std::env::temp_dir().join(format!(
            "footfall-config-{}.toml",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, "[simulation]\nevent_probability = 2.0\n").unwrap();

        let result = Config::load(&path);
        std::fs::remove_file(&path).unwrap();

        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("simulation.event_probability"));
    }
}
