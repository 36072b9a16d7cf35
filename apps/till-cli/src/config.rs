//! # Till Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TILL_DB_PATH=/var/lib/till/till.db                                 │
//! │     TILL_COMPANY_ID=bakery-01                                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, or the platform config dir:                       │
//! │     ~/.config/till-pos/till.toml (Linux)                               │
//! │     ~/Library/Application Support/com.till.pos/till.toml (macOS)       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/till/till.db"
//! max_connections = 5
//!
//! [company]
//! id = "bakery-01"
//! name = "Corner Bakery"
//!
//! [operator]
//! id = "ana"
//! name = "Ana"
//!
//! [checkout]
//! require_open_session = true
//!
//! [payments]
//! cash_method = "CASH"
//! fallback_method = "PIX"
//!
//! [[payments.methods]]
//! code = "CASH"
//! label = "Cash"
//!
//! [[payments.methods]]
//! code = "PIX"
//! label = "PIX"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use till_core::{Actor, Company, CoreError, PaymentCatalog};

const CONFIG_FILE: &str = "till.toml";
const DATABASE_FILE: &str = "till.db";

// =============================================================================
// Errors
// =============================================================================

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid payment catalog: {0}")]
    Catalog(#[from] CoreError),

    #[error("Could not determine a data directory; set TILL_DB_PATH")]
    NoDataDir,

    #[error("Failed to create data directory: {0}")]
    CreateDir(#[source] std::io::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// `[database]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to `till.db` in the platform data dir.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

/// `[company]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanySettings {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl Default for CompanySettings {
    fn default() -> Self {
        CompanySettings {
            id: "default-company".to_string(),
            name: "Default Company".to_string(),
        }
    }
}

/// `[operator]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorSettings {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl Default for OperatorSettings {
    fn default() -> Self {
        OperatorSettings {
            id: "operator".to_string(),
            name: "Operator".to_string(),
        }
    }
}

/// `[checkout]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutSettings {
    /// Refuse sales while no cash session is open.
    #[serde(default)]
    pub require_open_session: bool,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TillConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub company: CompanySettings,

    #[serde(default)]
    pub operator: OperatorSettings,

    #[serde(default)]
    pub checkout: CheckoutSettings,

    #[serde(default)]
    pub payments: PaymentCatalog,
}

impl TillConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`--config` or the platform `till.toml`)
    /// 3. Environment variables
    ///
    /// An explicit `--config` path must exist; the platform file is optional.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(&path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    fn from_file(path: &Path) -> ConfigResult<Self> {
        info!(?path, "Loading till config from file");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.company.id.trim().is_empty() {
            return Err(ConfigError::Invalid("company.id cannot be empty".into()));
        }
        if self.operator.id.trim().is_empty() {
            return Err(ConfigError::Invalid("operator.id cannot be empty".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        self.payments.validate()?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `TILL_*` overrides read through `var`.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("TILL_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(id) = var("TILL_COMPANY_ID") {
            self.company.id = id;
        }
        if let Some(name) = var("TILL_COMPANY_NAME") {
            self.company.name = name;
        }

        if let Some(id) = var("TILL_OPERATOR_ID") {
            self.operator.id = id;
        }
        if let Some(name) = var("TILL_OPERATOR_NAME") {
            self.operator.name = name;
        }

        if let Some(flag) = var("TILL_REQUIRE_OPEN_SESSION") {
            match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.checkout.require_open_session = true,
                "0" | "false" | "no" | "off" => self.checkout.require_open_session = false,
                _ => warn!(value = %flag, "Ignoring unrecognised TILL_REQUIRE_OPEN_SESSION"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "till", "pos")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Database file to open, creating the data directory when defaulted.
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let dirs = directories::ProjectDirs::from("com", "till", "pos").ok_or(ConfigError::NoDataDir)?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir).map_err(ConfigError::CreateDir)?;

        Ok(data_dir.join(DATABASE_FILE))
    }

    pub fn company(&self) -> Company {
        Company::new(&self.company.id, &self.company.name)
    }

    pub fn operator(&self) -> Actor {
        Actor::new(&self.operator.id, &self.operator.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = TillConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.checkout.require_open_session);
        assert_eq!(config.payments.cash_method.as_str(), "CASH");
    }

    #[test]
    fn test_toml_sections() {
        let config: TillConfig = toml::from_str(
            r#"
            [company]
            id = "bakery-01"
            name = "Corner Bakery"

            [checkout]
            require_open_session = true

            [payments]
            cash_method = "CASH"
            fallback_method = "CASH"

            [[payments.methods]]
            code = "CASH"
            label = "Cash"
            "#,
        )
        .unwrap();

        assert_eq!(config.company.id, "bakery-01");
        assert_eq!(config.operator.id, "operator");
        assert!(config.checkout.require_open_session);
        assert_eq!(config.payments.methods.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_win() {
        let mut config = TillConfig::default();
        config.apply_overrides(vars(&[
            ("TILL_DB_PATH", "/tmp/other.db"),
            ("TILL_COMPANY_ID", "kiosk"),
            ("TILL_OPERATOR_NAME", "Bruno"),
            ("TILL_REQUIRE_OPEN_SESSION", "yes"),
        ]));

        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/other.db")));
        assert_eq!(config.company.id, "kiosk");
        assert_eq!(config.operator.name, "Bruno");
        assert!(config.checkout.require_open_session);
    }

    #[test]
    fn test_unrecognised_flag_is_ignored() {
        let mut config = TillConfig::default();
        config.apply_overrides(vars(&[("TILL_REQUIRE_OPEN_SESSION", "maybe")]));
        assert!(!config.checkout.require_open_session);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = TillConfig::default();
        config.company.id = "  ".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = TillConfig::default();
        config.payments.fallback_method = "VOUCHER".into();
        assert!(matches!(config.validate(), Err(ConfigError::Catalog(_))));
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let err = TillConfig::load(Some(PathBuf::from("/nonexistent/till.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
