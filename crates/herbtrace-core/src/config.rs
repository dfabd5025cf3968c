//! Configuration loading and typed config structures for HerbTrace.
//!
//! The canonical configuration lives in `herbtrace-config.yaml` at the
//! project root. Every field has a default, so an empty file (or no file
//! at all) yields a working configuration.

use std::path::Path;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

use herbtrace_geo::{AUTHORIZED_ORIGIN, DEFAULT_RADIUS_KM, Geofence};
use herbtrace_ledger::validation::DEFAULT_MIN_EFFICIENCY_PERCENT;
use herbtrace_ledger::{GasSchedule, Validator};
use herbtrace_types::Coordinate;

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
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `herbtrace-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TraceConfig {
    /// Authorized collection zone.
    #[serde(default)]
    pub geofence: GeofenceConfig,

    /// Validation thresholds.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Simulated network parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Batch registry settings.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// HTTP listener.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TraceConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `HERBTRACE_HOST` overrides `server.host`
    /// - `HERBTRACE_PORT` overrides `server.port`
    /// - `HERBTRACE_VERIFY_BASE_URL` overrides `registry.verify_base_url`
    /// - `HERBTRACE_LOG_LEVEL` overrides `logging.level`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load from `path` if it exists, otherwise use defaults. Environment
    /// overrides apply either way.
    ///
    /// # Errors
    ///
    /// Same as [`from_file`](Self::from_file) when the file exists.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yml reads an empty document as unit, not as an empty map.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override selected values with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HERBTRACE_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("HERBTRACE_PORT") {
            match val.parse() {
                Ok(port) => self.server.port = port,
                Err(e) => warn!(value = %val, error = %e, "ignoring invalid HERBTRACE_PORT"),
            }
        }
        if let Ok(val) = std::env::var("HERBTRACE_VERIFY_BASE_URL") {
            self.registry.verify_base_url = val;
        }
        if let Ok(val) = std::env::var("HERBTRACE_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    /// The validator described by the geofence and validation sections.
    pub const fn validator(&self) -> Validator {
        Validator::new(
            self.geofence.to_geofence(),
            self.validation.min_efficiency_percent,
        )
    }
}

/// Authorized collection zone.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeofenceConfig {
    /// Origin latitude in degrees.
    #[serde(default = "default_origin_latitude")]
    pub latitude: f64,

    /// Origin longitude in degrees.
    #[serde(default = "default_origin_longitude")]
    pub longitude: f64,

    /// Radius in kilometers.
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,
}

impl GeofenceConfig {
    /// Build the zone.
    pub const fn to_geofence(&self) -> Geofence {
        Geofence::new(Coordinate::new(self.latitude, self.longitude), self.radius_km)
    }
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self {
            latitude: default_origin_latitude(),
            longitude: default_origin_longitude(),
            radius_km: default_radius_km(),
        }
    }
}

/// Validation thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ValidationConfig {
    /// Processing steps below this output/input percentage are rejected.
    #[serde(default = "default_min_efficiency_percent")]
    pub min_efficiency_percent: Decimal,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_efficiency_percent: default_min_efficiency_percent(),
        }
    }
}

/// Simulated network parameters. None of these model real behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Wait before a submission is appended.
    #[serde(default = "default_network_delay_ms")]
    pub network_delay_ms: u64,

    /// Wait before a verification lookup answers.
    #[serde(default = "default_verify_delay_ms")]
    pub verify_delay_ms: u64,

    /// Upper bound on either wait; exceeding it fails the request.
    #[serde(default = "default_confirmation_timeout_ms")]
    pub confirmation_timeout_ms: u64,

    /// Gas ranges per event type.
    #[serde(default)]
    pub gas: GasSchedule,
}

impl SimulationConfig {
    /// Zero delays with the default gas schedule, for tests and tooling.
    pub fn without_delay() -> Self {
        Self {
            network_delay_ms: 0,
            verify_delay_ms: 0,
            ..Self::default()
        }
    }

    /// Submission delay.
    pub const fn network_delay(&self) -> Duration {
        Duration::from_millis(self.network_delay_ms)
    }

    /// Verification delay.
    pub const fn verify_delay(&self) -> Duration {
        Duration::from_millis(self.verify_delay_ms)
    }

    /// Confirmation timeout.
    pub const fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.confirmation_timeout_ms)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            network_delay_ms: default_network_delay_ms(),
            verify_delay_ms: default_verify_delay_ms(),
            confirmation_timeout_ms: default_confirmation_timeout_ms(),
            gas: GasSchedule::default(),
        }
    }
}

/// Batch registry settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegistryConfig {
    /// Base of the consumer-facing verification URL encoded in QR labels.
    #[serde(default = "default_verify_base_url")]
    pub verify_base_url: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            verify_base_url: default_verify_base_url(),
        }
    }
}

/// HTTP listener.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset (trace, debug, info, warn, error).
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
// Defaults
// ---------------------------------------------------------------------------

const fn default_origin_latitude() -> f64 {
    AUTHORIZED_ORIGIN.latitude
}

const fn default_origin_longitude() -> f64 {
    AUTHORIZED_ORIGIN.longitude
}

const fn default_radius_km() -> f64 {
    DEFAULT_RADIUS_KM
}

const fn default_min_efficiency_percent() -> Decimal {
    DEFAULT_MIN_EFFICIENCY_PERCENT
}

const fn default_network_delay_ms() -> u64 {
    1000
}

const fn default_verify_delay_ms() -> u64 {
    500
}

const fn default_confirmation_timeout_ms() -> u64 {
    5000
}

fn default_verify_base_url() -> String {
    "https://herbtrace.vercel.app".to_owned()
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}
