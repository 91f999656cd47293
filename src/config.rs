use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::env as std_env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_TARGET_COVERAGE_DAYS: u32 = 14;
const DEFAULT_DEAD_STOCK_AFTER_DAYS: i64 = 30;
const DEFAULT_STALE_VELOCITY_FLOOR: f64 = 0.1;
const DEFAULT_TREND_BAND_PCT: f64 = 5.0;
const DEFAULT_MIN_RESTOCK_QTY: i32 = 5;
const DEFAULT_JITTER_SPREAD: f64 = 0.12;
const DEFAULT_CRITICAL_COVERAGE_DAYS: f64 = 2.0;
const DEFAULT_LOW_COVERAGE_DAYS: f64 = 7.0;

/// Forecast policy knobs consumed by the forecasting service.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ForecastConfig {
    /// Restock-to coverage target in days
    #[serde(default = "default_target_coverage_days")]
    #[validate(range(min = 1, max = 60))]
    pub target_coverage_days: u32,

    /// Days without a sale before a slow mover counts as dead stock
    #[serde(default = "default_dead_stock_after_days")]
    #[validate(range(min = 7, max = 365))]
    pub dead_stock_after_days: i64,

    /// Daily velocity below this counts as "effectively not selling"
    #[serde(default = "default_stale_velocity_floor")]
    #[validate(custom = "validate_velocity_floor")]
    pub stale_velocity_floor: f64,

    /// Week-over-week change (percent) within which a trend reads as stable
    #[serde(default = "default_trend_band_pct")]
    #[validate(custom = "validate_trend_band")]
    pub trend_band_pct: f64,

    /// Minimum suggested quantity when an out-of-stock product still has demand
    #[serde(default = "default_min_restock_qty")]
    #[validate(range(min = 1, max = 1000))]
    pub min_restock_qty: i32,

    /// Coverage at or below this many days is critical
    #[serde(default = "default_critical_coverage_days")]
    #[validate(range(min = 0.5, max = 30.0))]
    pub critical_coverage_days: f64,

    /// Coverage at or below this many days (but above critical) is low
    #[serde(default = "default_low_coverage_days")]
    #[validate(range(min = 1.0, max = 90.0))]
    pub low_coverage_days: f64,

    /// Multiplicative jitter spread for chart series (0.12 = ±12%)
    #[serde(default = "default_jitter_spread")]
    #[validate(custom = "validate_jitter_spread")]
    pub jitter_spread: f64,

    /// Disable to make demand series fully deterministic
    #[serde(default = "default_true_bool")]
    pub jitter_enabled: bool,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            target_coverage_days: default_target_coverage_days(),
            dead_stock_after_days: default_dead_stock_after_days(),
            stale_velocity_floor: default_stale_velocity_floor(),
            trend_band_pct: default_trend_band_pct(),
            min_restock_qty: default_min_restock_qty(),
            critical_coverage_days: default_critical_coverage_days(),
            low_coverage_days: default_low_coverage_days(),
            jitter_spread: default_jitter_spread(),
            jitter_enabled: true,
        }
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    #[validate(length(min = 1))]
    pub database_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default = "default_true_bool")]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback
    #[serde(default = "default_false_bool")]
    pub cors_allow_any_origin: bool,

    /// CORS: allow credentials
    #[serde(default)]
    pub cors_allow_credentials: bool,

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

    /// Request timeout for the HTTP layer (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Forecast policy
    #[serde(default)]
    #[validate]
    pub forecast: ForecastConfig,
}

impl AppConfig {
    /// Gets database URL reference
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Creates a new configuration with defaults for everything else
    pub fn new(database_url: String, host: String, port: u16, environment: String) -> Self {
        Self {
            database_url,
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: true,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            cors_allow_credentials: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            forecast: ForecastConfig::default(),
        }
    }

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

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.should_allow_permissive_cors() && !self.has_cors_allowed_origins() {
            let mut err = ValidationError::new("cors_allowed_origins_required");
            err.message = Some(
                "Set APP__CORS_ALLOWED_ORIGINS for non-development environments or explicitly opt-in via APP__CORS_ALLOW_ANY_ORIGIN=true".into(),
            );
            errors.add("cors_allowed_origins", err);
        }

        if self.forecast.critical_coverage_days >= self.forecast.low_coverage_days {
            let mut err = ValidationError::new("coverage_tiers");
            err.message =
                Some("critical_coverage_days must be below low_coverage_days".into());
            errors.add("forecast", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
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

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Default value functions
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
fn default_request_timeout_secs() -> u64 {
    30
}

fn default_false_bool() -> bool {
    false
}
fn default_true_bool() -> bool {
    true
}

fn default_target_coverage_days() -> u32 {
    DEFAULT_TARGET_COVERAGE_DAYS
}
fn default_dead_stock_after_days() -> i64 {
    DEFAULT_DEAD_STOCK_AFTER_DAYS
}
fn default_stale_velocity_floor() -> f64 {
    DEFAULT_STALE_VELOCITY_FLOOR
}
fn default_trend_band_pct() -> f64 {
    DEFAULT_TREND_BAND_PCT
}
fn default_min_restock_qty() -> i32 {
    DEFAULT_MIN_RESTOCK_QTY
}
fn default_jitter_spread() -> f64 {
    DEFAULT_JITTER_SPREAD
}
fn default_critical_coverage_days() -> f64 {
    DEFAULT_CRITICAL_COVERAGE_DAYS
}
fn default_low_coverage_days() -> f64 {
    DEFAULT_LOW_COVERAGE_DAYS
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_velocity_floor(floor: f64) -> Result<(), ValidationError> {
    if !floor.is_finite() || floor < 0.0 || floor >= 1.0 {
        let mut err = ValidationError::new("stale_velocity_floor");
        err.message = Some("stale_velocity_floor must be a finite value in [0.0, 1.0)".into());
        return Err(err);
    }
    Ok(())
}

fn validate_trend_band(band: f64) -> Result<(), ValidationError> {
    if !band.is_finite() || band < 0.0 || band > 50.0 {
        let mut err = ValidationError::new("trend_band_pct");
        err.message = Some("trend_band_pct must be a finite percentage between 0 and 50".into());
        return Err(err);
    }
    Ok(())
}

fn validate_jitter_spread(spread: f64) -> Result<(), ValidationError> {
    // Charts advertise a ±10-15% wobble; anything wider stops being cosmetic.
    if !spread.is_finite() || spread < 0.0 || spread > 0.15 {
        let mut err = ValidationError::new("jitter_spread");
        err.message = Some("jitter_spread must be a finite value between 0.0 and 0.15".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("minimart_api={},tower_http=debug", level);
    let filter_directive = std_env::var("RUST_LOG")
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
/// 1. Default config (config/default.toml)
/// 2. Environment-specific config (config/{env}.toml)
/// 3. Docker config (config/docker.toml) if DOCKER env var is set
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
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

    let mut builder = Config::builder()
        .set_default("database_url", "sqlite://minimart.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", 8080)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false));

    if env::var("DOCKER").is_ok() {
        info!("Docker environment detected");
        builder =
            builder.add_source(File::with_name(&format!("{}/docker", CONFIG_DIR)).required(false));
    }

    let config = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration security validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}
