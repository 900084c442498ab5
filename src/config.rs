use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Redis connection URL (cart/wishlist snapshot store)
    pub redis_url: String,

    /// Secret used to verify bearer tokens minted by the identity provider
    #[validate(length(min = 32))]
    pub jwt_secret: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Currency code used across the storefront (single-currency system)
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Tax rate applied to the cart subtotal (e.g., 0.18 for 18%)
    #[serde(default = "default_tax_rate")]
    #[validate(custom = "validate_rate")]
    pub tax_rate: f64,

    /// Share of the subtotal collected up front on cash-on-delivery orders
    #[serde(default = "default_cod_advance_rate")]
    #[validate(custom = "validate_rate")]
    pub cod_advance_rate: f64,

    /// Minimum subtotal (whole currency units) for the online payment path
    #[serde(default = "default_min_online_amount")]
    pub min_online_amount: u64,

    /// How long a suspended online payment attempt stays redeemable
    #[serde(default = "default_online_payment_timeout_secs")]
    pub online_payment_timeout_secs: u64,

    /// Payment gateway API base URL
    #[serde(default = "default_gateway_base_url")]
    pub gateway_base_url: String,

    /// Payment gateway public key id (shared with the hosted payment UI)
    #[serde(default)]
    pub gateway_key_id: String,

    /// Payment gateway key secret (held server-side, signs/verifies callbacks)
    #[serde(default)]
    pub gateway_key_secret: String,

    /// Mail provider endpoint for outbound notifications
    #[serde(default = "default_mailer_endpoint")]
    pub mailer_endpoint: String,

    /// Mail provider API key
    #[serde(default)]
    pub mailer_api_key: String,

    /// Sender address for outbound notifications
    #[serde(default = "default_mailer_from")]
    pub mailer_from: String,

    /// Event channel capacity for async event processing
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl AppConfig {
    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Returns true if explicit CORS origins are configured
    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_ref()
            .map(|raw| raw.split(',').any(|origin| !origin.trim().is_empty()))
            .unwrap_or(false)
    }

    /// Whether we should fall back to permissive CORS
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_max_connections() -> u32 {
    16
}
fn default_db_min_connections() -> u32 {
    2
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_currency() -> String {
    "INR".to_string()
}

fn default_tax_rate() -> f64 {
    0.18
}

fn default_cod_advance_rate() -> f64 {
    0.10
}

fn default_min_online_amount() -> u64 {
    500
}

fn default_online_payment_timeout_secs() -> u64 {
    900
}

fn default_gateway_base_url() -> String {
    "https://api.gateway.example.com".to_string()
}

fn default_mailer_endpoint() -> String {
    "https://api.mail.example.com/v1/send".to_string()
}

fn default_mailer_from() -> String {
    "orders@storefront.example.com".to_string()
}

fn default_event_channel_capacity() -> usize {
    1024
}

fn validate_rate(rate: f64) -> Result<(), ValidationError> {
    if !rate.is_finite() || rate < 0.0 || rate > 1.0 {
        let mut err = ValidationError::new("rate");
        err.message = Some("rate must be a finite value between 0.0 and 1.0".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("storefront_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    // NOTE: jwt_secret has no default - it MUST be provided via environment
    // variable or config file so token verification never runs on a guessable key.
    let config = Config::builder()
        .set_default("database_url", "sqlite://storefront.db?mode=rwc")?
        .set_default("redis_url", "redis://localhost:6379")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    if config.get_string("jwt_secret").is_err() {
        error!("JWT secret is not configured. Set APP__JWT_SECRET with the identity provider's verification secret (minimum 32 characters).");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "jwt_secret is required but not configured. Set APP__JWT_SECRET environment variable."
                .into(),
        )));
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".into(),
            redis_url: "redis://localhost:6379".into(),
            jwt_secret: "a".repeat(32),
            host: "127.0.0.1".into(),
            port: 8080,
            environment: "development".into(),
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            currency: default_currency(),
            tax_rate: default_tax_rate(),
            cod_advance_rate: default_cod_advance_rate(),
            min_online_amount: default_min_online_amount(),
            online_payment_timeout_secs: default_online_payment_timeout_secs(),
            gateway_base_url: default_gateway_base_url(),
            gateway_key_id: "key_test".into(),
            gateway_key_secret: "secret_test".into(),
            mailer_endpoint: default_mailer_endpoint(),
            mailer_api_key: String::new(),
            mailer_from: default_mailer_from(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    #[test]
    fn defaults_follow_storefront_policy() {
        let cfg = base_config();
        assert_eq!(cfg.currency, "INR");
        assert!((cfg.tax_rate - 0.18).abs() < f64::EPSILON);
        assert!((cfg.cod_advance_rate - 0.10).abs() < f64::EPSILON);
        assert_eq!(cfg.min_online_amount, 500);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_rates() {
        let mut cfg = base_config();
        cfg.tax_rate = 1.5;
        assert!(cfg.validate().is_err());

        cfg.tax_rate = 0.18;
        cfg.cod_advance_rate = -0.1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_short_jwt_secret() {
        let mut cfg = base_config();
        cfg.jwt_secret = "short".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn permissive_cors_only_in_development_or_opt_in() {
        let mut cfg = base_config();
        assert!(cfg.should_allow_permissive_cors());

        cfg.environment = "production".into();
        assert!(!cfg.should_allow_permissive_cors());

        cfg.cors_allow_any_origin = true;
        assert!(cfg.should_allow_permissive_cors());
    }
}
