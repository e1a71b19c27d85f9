//! Configuration management for pennywise
//!
//! This module handles loading, validation, and defaults of the
//! pennywise configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use error::ConfigError;

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Live feeds kept attached at once; the least recently used is dropped first
    #[serde(default = "default_max_live_feeds")]
    pub max_live_feeds: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_live_feeds: default_max_live_feeds(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8081
}

fn default_max_live_feeds() -> usize {
    256
}

/// Data directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding the store snapshot
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
    /// Snapshot file name (relative to `path`)
    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: String,
    /// Write the snapshot back after every change
    #[serde(default = "default_true")]
    pub persist: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            snapshot_file: default_snapshot_file(),
            persist: true,
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("./data")
}

fn default_snapshot_file() -> String {
    "store.json".to_string()
}

fn default_true() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Pagination settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Operations per page in the history list
    #[serde(default = "default_records_per_page")]
    pub records_per_page: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            records_per_page: default_records_per_page(),
        }
    }
}

fn default_records_per_page() -> usize {
    10
}

/// Statistics settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Period selected when a request does not name one
    #[serde(default)]
    pub default_period: Period,
    /// Number of daily buckets in the trend
    #[serde(default = "default_trend_days")]
    pub trend_days: usize,
    /// Number of monthly buckets in the balance history
    #[serde(default = "default_balance_months")]
    pub balance_months: usize,
    /// First day of the calendar week
    #[serde(default)]
    pub week_start: WeekStart,
    /// Offset from UTC used to cut calendar days, in minutes
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            default_period: Period::Monthly,
            trend_days: default_trend_days(),
            balance_months: default_balance_months(),
            week_start: WeekStart::Sunday,
            utc_offset_minutes: 0,
        }
    }
}

fn default_trend_days() -> usize {
    30
}

fn default_balance_months() -> usize {
    12
}

/// Calendar period used for aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Current calendar day
    Daily,
    /// Current calendar week
    Weekly,
    /// Current calendar month
    Monthly,
    /// Current calendar year
    Annual,
}

impl Default for Period {
    fn default() -> Self {
        Period::Monthly
    }
}

impl std::str::FromStr for Period {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "day" => Ok(Period::Daily),
            "weekly" | "week" => Ok(Period::Weekly),
            "monthly" | "month" => Ok(Period::Monthly),
            "annual" | "yearly" | "year" => Ok(Period::Annual),
            _ => Err(format!("Invalid period: {}", s)),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Daily => write!(f, "daily"),
            Period::Weekly => write!(f, "weekly"),
            Period::Monthly => write!(f, "monthly"),
            Period::Annual => write!(f, "annual"),
        }
    }
}

/// First day of the week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    Sunday,
    Monday,
}

impl Default for WeekStart {
    fn default() -> Self {
        WeekStart::Sunday
    }
}

/// Currency and number formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// Currency symbol shown next to amounts
    #[serde(default = "default_currency")]
    pub symbol: String,
    /// Number of decimal places
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
    /// Thousands separator
    #[serde(default = "default_thousands_sep")]
    pub thousands_separator: String,
    /// Decimal separator
    #[serde(default = "default_decimal_sep")]
    pub decimal_separator: String,
    /// Currency symbol position ("before" or "after")
    #[serde(default)]
    pub symbol_position: SymbolPosition,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            symbol: default_currency(),
            decimal_places: default_decimal_places(),
            thousands_separator: default_thousands_sep(),
            decimal_separator: default_decimal_sep(),
            symbol_position: SymbolPosition::After,
        }
    }
}

fn default_currency() -> String {
    "€".to_string()
}

fn default_decimal_places() -> u32 {
    2
}

fn default_thousands_sep() -> String {
    ",".to_string()
}

fn default_decimal_sep() -> String {
    ".".to_string()
}

/// Currency symbol position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolPosition {
    Before,
    After,
}

impl Default for SymbolPosition {
    fn default() -> Self {
        SymbolPosition::After
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Data directory settings
    #[serde(default)]
    pub data: DataConfig,
    /// Pagination settings
    #[serde(default)]
    pub pagination: PaginationConfig,
    /// Statistics settings
    #[serde(default)]
    pub stats: StatsConfig,
    /// Currency settings
    #[serde(default)]
    pub currency: CurrencyConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Largest offset any real time zone uses, in minutes
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError { message: e.to_string() })?;

        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::InvalidYaml { message: e.to_string() })?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if self.server.max_live_feeds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_live_feeds".to_string(),
                reason: "At least one live feed must be allowed".to_string(),
            });
        }

        if self.pagination.records_per_page == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pagination.records_per_page".to_string(),
                reason: "Page size must be at least 1".to_string(),
            });
        }

        if !(1..=366).contains(&self.stats.trend_days) {
            return Err(ConfigError::InvalidValue {
                field: "stats.trend_days".to_string(),
                reason: "Trend length must be between 1 and 366 days".to_string(),
            });
        }

        if !(1..=120).contains(&self.stats.balance_months) {
            return Err(ConfigError::InvalidValue {
                field: "stats.balance_months".to_string(),
                reason: "Balance history must be between 1 and 120 months".to_string(),
            });
        }

        if self.stats.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::InvalidValue {
                field: "stats.utc_offset_minutes".to_string(),
                reason: "Offset must be within +/- 14 hours".to_string(),
            });
        }

        if self.currency.decimal_places > 10 {
            return Err(ConfigError::InvalidValue {
                field: "currency.decimal_places".to_string(),
                reason: "Decimal places must be between 0 and 10".to_string(),
            });
        }

        if self.data.snapshot_file.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "data.snapshot_file".to_string(),
                reason: "Snapshot file name cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Get the full path to the store snapshot file
    pub fn snapshot_path(&self) -> PathBuf {
        self.data.path.join(&self.data.snapshot_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.server.max_live_feeds, 256);
        assert_eq!(config.pagination.records_per_page, 10);
        assert_eq!(config.stats.default_period, Period::Monthly);
        assert_eq!(config.stats.trend_days, 30);
        assert_eq!(config.stats.balance_months, 12);
        assert_eq!(config.stats.week_start, WeekStart::Sunday);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("server:\n  port: 9000\nstats:\n  week_start: monday\n").unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.stats.week_start, WeekStart::Monday);
        assert_eq!(config.stats.trend_days, 30);
        assert_eq!(config.snapshot_path(), PathBuf::from("./data").join("store.json"));
    }

    #[test]
    fn test_bundled_default_config_is_valid() {
        let config = Config::from_yaml(Config::generate_default()).unwrap();
        assert_eq!(config.pagination.records_per_page, 10);
        assert_eq!(config.stats.default_period, Period::Monthly);
    }

    #[test]
    fn test_invalid_yaml() {
        let err = Config::from_yaml("server: [").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidYaml { .. }));
    }

    #[test]
    fn test_rejects_zero_page_size() {
        let err = Config::from_yaml("pagination:\n  records_per_page: 0\n").unwrap_err();
        match err {
            ConfigError::InvalidValue { field, .. } => assert_eq!(field, "pagination.records_per_page"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_zero_live_feeds() {
        let err = Config::from_yaml("server:\n  max_live_feeds: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field, .. } if field == "server.max_live_feeds"));
    }

    #[test]
    fn test_rejects_out_of_range_offset() {
        let mut config = Config::default();
        config.stats.utc_offset_minutes = 15 * 60;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load("/definitely/not/here/pennywise.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_period_from_str() {
        assert_eq!("daily".parse::<Period>().unwrap(), Period::Daily);
        assert_eq!("Week".parse::<Period>().unwrap(), Period::Weekly);
        assert_eq!("monthly".parse::<Period>().unwrap(), Period::Monthly);
        assert_eq!("year".parse::<Period>().unwrap(), Period::Annual);
        assert!("fortnight".parse::<Period>().is_err());
        assert_eq!(Period::Annual.to_string(), "annual");
    }
}
