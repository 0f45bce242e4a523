//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup. Thresholds used by the telemetry
//! pipeline and the challenge rules are carried here and handed to the
//! services explicitly.

use std::env;
use std::str::FromStr;

/// Which persistence backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// In-process tables, lost on restart
    Memory,
    /// Google Cloud Firestore
    Firestore,
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "firestore" => Ok(StorageBackend::Firestore),
            _ => Err(()),
        }
    }
}

/// Limits applied to incoming coordinates and collectible pickup.
#[derive(Debug, Clone, Copy)]
pub struct TelemetryConfig {
    /// Maximum digits after the decimal point for latitude/longitude
    pub coordinate_precision: u32,
    /// Pickup radius around a collectible item, in meters
    pub collect_radius_meters: f64,
    /// Half-width of the coarse search box, in degrees
    pub collect_search_degrees: f64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            coordinate_precision: 4,
            collect_radius_meters: 100.0,
            collect_search_degrees: 0.001,
        }
    }
}

/// Thresholds for the challenge rules.
#[derive(Debug, Clone, Copy)]
pub struct ChallengeThresholds {
    pub ten_runs_count: u32,
    pub fifty_km_total_km: f64,
    pub fast_run_min_km: f64,
    pub fast_run_max_seconds: i64,
}

impl Default for ChallengeThresholds {
    fn default() -> Self {
        Self {
            ten_runs_count: 10,
            fifty_km_total_km: 50.0,
            fast_run_min_km: 2.0,
            fast_run_max_seconds: 600,
        }
    }
}

/// Company contact details served by `/api/company_details`.
#[derive(Debug, Clone)]
pub struct CompanyInfo {
    pub name: String,
    pub slogan: String,
    pub contacts: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    pub storage: StorageBackend,
    /// GCP project ID (Firestore backend only)
    pub gcp_project_id: String,
    pub telemetry: TelemetryConfig,
    pub challenges: ChallengeThresholds,
    pub company: CompanyInfo,
}

impl Config {
    /// Config for tests: in-memory storage and default thresholds.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            storage: StorageBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            telemetry: TelemetryConfig::default(),
            challenges: ChallengeThresholds::default(),
            company: CompanyInfo {
                name: "Test Running Club".to_string(),
                slogan: "Keep moving".to_string(),
                contacts: "club@example.com".to_string(),
            },
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let storage = match env::var("STORAGE_BACKEND") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("STORAGE_BACKEND", raw))?,
            Err(_) => StorageBackend::Memory,
        };

        let gcp_project_id = match (storage, env::var("GCP_PROJECT_ID")) {
            (_, Ok(id)) => id,
            (StorageBackend::Firestore, Err(_)) => {
                return Err(ConfigError::Missing("GCP_PROJECT_ID"))
            }
            (StorageBackend::Memory, Err(_)) => "local-dev".to_string(),
        };

        let telemetry_defaults = TelemetryConfig::default();
        let challenge_defaults = ChallengeThresholds::default();

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: parse_var("PORT", 8080)?,
            storage,
            gcp_project_id,
            telemetry: TelemetryConfig {
                coordinate_precision: parse_var(
                    "COORDINATE_PRECISION",
                    telemetry_defaults.coordinate_precision,
                )?,
                collect_radius_meters: parse_var(
                    "COLLECT_RADIUS_METERS",
                    telemetry_defaults.collect_radius_meters,
                )?,
                collect_search_degrees: parse_var(
                    "COLLECT_SEARCH_DEGREES",
                    telemetry_defaults.collect_search_degrees,
                )?,
            },
            challenges: ChallengeThresholds {
                ten_runs_count: parse_var("TEN_RUNS_COUNT", challenge_defaults.ten_runs_count)?,
                fifty_km_total_km: parse_var(
                    "FIFTY_KM_TOTAL_KM",
                    challenge_defaults.fifty_km_total_km,
                )?,
                fast_run_min_km: parse_var("FAST_RUN_MIN_KM", challenge_defaults.fast_run_min_km)?,
                fast_run_max_seconds: parse_var(
                    "FAST_RUN_MAX_SECONDS",
                    challenge_defaults.fast_run_max_seconds,
                )?,
            },
            company: CompanyInfo {
                name: env::var("COMPANY_NAME").unwrap_or_else(|_| "Run Tracker".to_string()),
                slogan: env::var("COMPANY_SLOGAN").unwrap_or_default(),
                contacts: env::var("COMPANY_CONTACTS").unwrap_or_default(),
            },
        })
    }
}

/// Read an optional variable, falling back to `default` only when it is unset.
fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
