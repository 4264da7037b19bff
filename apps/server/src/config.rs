//! # Server Configuration
//!
//! Layered settings, later sources win:
//!
//! ```text
//! built-in defaults
//!      │
//!      ▼
//! kitab.toml                 (optional, working directory)
//!      │
//!      ▼
//! kitab.{KITAB_ENV}.toml     (optional, e.g. kitab.production.toml)
//!      │
//!      ▼
//! KITAB_* environment        (KITAB_PORT, KITAB_SESSION_SECRET, ...)
//! ```
//!
//! `kitab.example.toml` at the repository root lists every key.

use std::path::PathBuf;

use config::{Config, Environment, File};
use kitab_core::ShopClock;
use serde::{Deserialize, Serialize};

/// Session secret used when none is configured. Refused in production.
pub const DEV_SESSION_SECRET: &str = "kitab-dev-secret-change-in-production";

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// `development`, `production` or `testing` (from `KITAB_ENV`)
    #[serde(default = "default_environment")]
    pub environment: String,

    pub host: String,
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Directory holding book cover images
    pub upload_dir: PathBuf,

    /// Request body limit for uploads (default: 16MB)
    pub max_upload_bytes: usize,

    /// HMAC secret for admin session tokens
    pub session_secret: String,

    /// Admin session lifetime in seconds
    pub session_lifetime_secs: i64,

    /// Biteship API key; shipping lookups fail without it
    pub biteship_api_key: Option<String>,
    pub biteship_base_url: String,
    pub biteship_origin_area_id: String,
    /// Comma separated courier codes
    pub biteship_couriers: String,

    /// Where `/uploads/{name}` redirects when the file is missing
    pub placeholder_image_url: String,

    /// Shop calendar offset from UTC in minutes (420 = WIB).
    /// Unset means the host's own offset.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

fn default_environment() -> String {
    "development".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            environment: default_environment(),
            host: "127.0.0.1".to_string(),
            port: 5000,
            database_path: PathBuf::from("./data/kitab.db"),
            upload_dir: PathBuf::from("./uploads"),
            max_upload_bytes: 16 * 1024 * 1024,
            session_secret: DEV_SESSION_SECRET.to_string(),
            session_lifetime_secs: 12 * 60 * 60,
            biteship_api_key: None,
            biteship_base_url: "https://api.biteship.com".to_string(),
            biteship_origin_area_id: "IDNP6IDNC10".to_string(),
            biteship_couriers: "jnt,jne,sicepat".to_string(),
            placeholder_image_url: "https://placehold.co/400x600/e2e8f0/4a5568?text=Gambar+Tidak+Ditemukan"
                .to_string(),
            utc_offset_minutes: None,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from files and `KITAB_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("KITAB_ENV").unwrap_or_else(|_| default_environment());
        let defaults = ServerConfig::default();

        let settings = Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("database_path", defaults.database_path.to_string_lossy().into_owned())?
            .set_default("upload_dir", defaults.upload_dir.to_string_lossy().into_owned())?
            .set_default("max_upload_bytes", defaults.max_upload_bytes as i64)?
            .set_default("session_secret", defaults.session_secret)?
            .set_default("session_lifetime_secs", defaults.session_lifetime_secs)?
            .set_default("biteship_base_url", defaults.biteship_base_url)?
            .set_default("biteship_origin_area_id", defaults.biteship_origin_area_id)?
            .set_default("biteship_couriers", defaults.biteship_couriers)?
            .set_default("placeholder_image_url", defaults.placeholder_image_url)?
            .add_source(File::with_name("kitab").required(false))
            .add_source(File::with_name(&format!("kitab.{}", environment)).required(false))
            .add_source(Environment::with_prefix("KITAB").try_parsing(true))
            .build()?;

        let mut config: ServerConfig = settings.try_deserialize()?;
        config.environment = environment;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that are unsafe or unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.is_production() && self.session_secret == DEV_SESSION_SECRET {
            return Err(ConfigError::InsecureSecret);
        }
        if self.session_secret.len() < 16 {
            return Err(ConfigError::InvalidValue("session_secret (min 16 chars)".to_string()));
        }
        if self.session_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("session_lifetime_secs".to_string()));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::InvalidValue("max_upload_bytes".to_string()));
        }
        self.clock()?;
        Ok(())
    }

    /// Calendar for sale-date filters, recap times and export names.
    pub fn clock(&self) -> Result<ShopClock, ConfigError> {
        match self.utc_offset_minutes {
            Some(minutes) => ShopClock::from_offset_minutes(minutes)
                .map_err(|_| ConfigError::InvalidValue("utc_offset_minutes".to_string())),
            None => Ok(ShopClock::system()),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("KITAB_SESSION_SECRET must be set in production")]
    InsecureSecret,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "127.0.0.1:5000");
        assert_eq!(config.max_upload_bytes, 16_777_216);
    }

    #[test]
    fn test_production_refuses_dev_secret() {
        let mut config = ServerConfig {
            environment: "production".to_string(),
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InsecureSecret)));

        config.session_secret = "a-long-production-secret-value".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_utc_offset() {
        let config = ServerConfig {
            utc_offset_minutes: Some(420),
            ..ServerConfig::default()
        };
        assert_eq!(config.clock().unwrap().offset_minutes(), 420);

        let config = ServerConfig {
            utc_offset_minutes: Some(24 * 60),
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_short_secret_rejected() {
        let config = ServerConfig {
            session_secret: "short".to_string(),
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }
}
