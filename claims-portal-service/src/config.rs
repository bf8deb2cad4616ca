use claims_core::FraudThresholds;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_ORDS_BASE_URL: &str = "http://localhost:8080/ords/admin";
const DEFAULT_UPLOAD_DIR: &str = "uploads/claims";

/// Runtime settings, read from the environment
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    /// PostgreSQL connection string; the in-memory store is used when unset.
    pub database_url: Option<String>,
    pub ords_base_url: String,
    pub upload_dir: PathBuf,
    pub fraud_model_url: Option<String>,
    pub fraud_model_api_key: Option<String>,
    pub fraud_thresholds: FraudThresholds,
    /// Applied to ORDS and fraud model requests when set.
    pub upstream_timeout: Option<Duration>,
    /// Echo internal error details to clients (`APP_ENV=development`).
    pub expose_errors: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            ords_base_url: DEFAULT_ORDS_BASE_URL.to_string(),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            fraud_model_url: None,
            fraud_model_api_key: None,
            fraud_thresholds: FraudThresholds::default(),
            upstream_timeout: None,
            expose_errors: false,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let thresholds = defaults.fraud_thresholds;
        let high = parse_or(value("FRAUD_THRESH_HIGH"), "FRAUD_THRESH_HIGH", thresholds.high());
        let medium = parse_or(value("FRAUD_THRESH_MED"), "FRAUD_THRESH_MED", thresholds.medium());
        let timeout_secs: u64 = parse_or(value("UPSTREAM_TIMEOUT_SECS"), "UPSTREAM_TIMEOUT_SECS", 0);

        Self {
            port: parse_or(value("PORT"), "PORT", defaults.port),
            database_url: value("DATABASE_URL"),
            ords_base_url: value("ORDS_BASE_URL").unwrap_or(defaults.ords_base_url),
            upload_dir: value("UPLOAD_DIR").map(PathBuf::from).unwrap_or(defaults.upload_dir),
            fraud_model_url: value("FRAUD_MODEL_URL"),
            fraud_model_api_key: value("FRAUD_MODEL_API_KEY"),
            fraud_thresholds: FraudThresholds::new(high, medium),
            upstream_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            expose_errors: value("APP_ENV").is_some_and(|env| env.eq_ignore_ascii_case("development")),
        }
    }
}

fn parse_or<T: FromStr + Copy>(raw: Option<String>, key: &str, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Ignoring malformed setting");
            default
        }),
    }
}
