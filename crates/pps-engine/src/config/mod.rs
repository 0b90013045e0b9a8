use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::workflows::practicum::{EligibilityConfig, ScoreWeights};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub academic: AcademicConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::parse(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            academic: AcademicConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

/// Accreditation thresholds and ranking weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcademicConfig {
    pub eligibility: EligibilityConfig,
    pub weights: ScoreWeights,
}

impl AcademicConfig {
    /// Read `PPS_*` variables; unset ones keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let eligibility = EligibilityConfig {
            hours_total_required: env_or(
                "PPS_HOURS_TOTAL_REQUIRED",
                defaults.eligibility.hours_total_required,
            )?,
            hours_specialty_required: env_or(
                "PPS_HOURS_SPECIALTY_REQUIRED",
                defaults.eligibility.hours_specialty_required,
            )?,
            rotation_areas_required: env_or(
                "PPS_ROTATION_AREAS_REQUIRED",
                defaults.eligibility.rotation_areas_required,
            )?,
            require_graded_reports: env_or(
                "PPS_REQUIRE_GRADED_REPORTS",
                defaults.eligibility.require_graded_reports,
            )?,
        };

        let weights = ScoreWeights {
            finished_coursework: env_or(
                "PPS_SCORE_FINISHED_COURSEWORK",
                defaults.weights.finished_coursework,
            )?,
            taking_electives: env_or(
                "PPS_SCORE_TAKING_ELECTIVES",
                defaults.weights.taking_electives,
            )?,
            owes_finals: env_or("PPS_SCORE_OWES_FINALS", defaults.weights.owes_finals)?,
            per_hour: env_or("PPS_SCORE_PER_HOUR", defaults.weights.per_hour)?,
            works_bonus: env_optional("PPS_SCORE_WORKS_BONUS")?,
        };

        Ok(Self {
            eligibility,
            weights,
        })
    }
}

fn env_optional<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        Err(_) => Ok(None),
    }
}

fn env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    Ok(env_optional(key)?.unwrap_or(default))
}

/// Source of academic thresholds, e.g. a settings table maintained by staff.
pub trait ThresholdProvider: Send + Sync {
    fn thresholds(&self) -> Result<AcademicConfig, ConfigError>;
}

/// Provider backed by a fixed configuration value.
#[derive(Debug, Clone, Default)]
pub struct StaticThresholds(pub AcademicConfig);

impl ThresholdProvider for StaticThresholds {
    fn thresholds(&self) -> Result<AcademicConfig, ConfigError> {
        Ok(self.0.clone())
    }
}

/// Provider reading `PPS_*` environment variables on each call.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvThresholds;

impl ThresholdProvider for EnvThresholds {
    fn thresholds(&self) -> Result<AcademicConfig, ConfigError> {
        AcademicConfig::from_env()
    }
}

/// Ask the provider for thresholds, falling back to the documented defaults when it has none.
pub fn resolve_thresholds(provider: &dyn ThresholdProvider) -> AcademicConfig {
    match provider.thresholds() {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "academic thresholds unavailable, using defaults");
            AcademicConfig::default()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16")]
    InvalidPort,
    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost { source: std::net::AddrParseError },
    #[error("{key} has an invalid value '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("academic thresholds are not configured")]
    MissingThresholds,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    const KEYS: [&str; 13] = [
        "APP_ENV",
        "APP_HOST",
        "APP_PORT",
        "APP_LOG_LEVEL",
        "PPS_HOURS_TOTAL_REQUIRED",
        "PPS_HOURS_SPECIALTY_REQUIRED",
        "PPS_ROTATION_AREAS_REQUIRED",
        "PPS_REQUIRE_GRADED_REPORTS",
        "PPS_SCORE_FINISHED_COURSEWORK",
        "PPS_SCORE_TAKING_ELECTIVES",
        "PPS_SCORE_OWES_FINALS",
        "PPS_SCORE_PER_HOUR",
        "PPS_SCORE_WORKS_BONUS",
    ];

    fn reset_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    struct MissingProvider;

    impl ThresholdProvider for MissingProvider {
        fn thresholds(&self) -> Result<AcademicConfig, ConfigError> {
            Err(ConfigError::MissingThresholds)
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.academic.eligibility.hours_total_required, 250);
        assert_eq!(config.academic.eligibility.hours_specialty_required, 70);
        assert_eq!(config.academic.eligibility.rotation_areas_required, 3);
        assert_eq!(config.academic.weights.works_bonus, None);
    }

    #[test]
    fn academic_overrides_are_read_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PPS_HOURS_TOTAL_REQUIRED", "200");
        env::set_var("PPS_REQUIRE_GRADED_REPORTS", "true");
        env::set_var("PPS_SCORE_WORKS_BONUS", "20");
        let config = AcademicConfig::from_env().expect("overrides parse");
        reset_env();
        assert_eq!(config.eligibility.hours_total_required, 200);
        assert!(config.eligibility.require_graded_reports);
        assert_eq!(config.weights.works_bonus, Some(20.0));
    }

    #[test]
    fn malformed_threshold_is_rejected() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PPS_ROTATION_AREAS_REQUIRED", "three");
        let result = AcademicConfig::from_env();
        reset_env();
        match result {
            Err(ConfigError::InvalidValue { key, value }) => {
                assert_eq!(key, "PPS_ROTATION_AREAS_REQUIRED");
                assert_eq!(value, "three");
            }
            other => panic!("expected invalid value error, got {other:?}"),
        }
    }

    #[test]
    fn missing_thresholds_fall_back_to_defaults() {
        let config = resolve_thresholds(&MissingProvider);
        assert_eq!(config, AcademicConfig::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        reset_env();
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }
}
