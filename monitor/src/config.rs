use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use market::DetectionConfig;

use crate::error::ConfigError;

pub const DEFAULT_BVMT_API_URL: &str =
    "https://www.bvmt.com.tn/rest_api/rest/market/groups/11,12,52,95,99";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Detector thresholds, validated before the config is handed out.
    pub detection: DetectionConfig,

    // =========================
    // Background driver
    // =========================
    /// Period between two producer polls.
    pub poll_interval: Duration,

    /// Bound of the driver's tick outcome channel. Outcomes are dropped,
    /// not queued, once it is full.
    pub outcome_capacity: usize,

    // =========================
    // Snapshot sources
    // =========================
    /// BVMT market-groups endpoint.
    pub bvmt_api_url: String,

    /// JSON snapshot file used when the live feed fails.
    pub fixture_path: Option<PathBuf>,

    // =========================
    // Surfaces
    // =========================
    pub bind_addr: SocketAddr,

    /// When set, raised alerts are also written to this database.
    pub alert_database_url: Option<String>,

    /// `APP_ENV=production` switches to JSON logs.
    pub json_logs: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Unset keys take their
    /// defaults; set but unparseable keys are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = DetectionConfig::default();

        let detection = DetectionConfig {
            volume_z: parse_or(&lookup, "ANOMALY_VOLUME_Z", defaults.volume_z)?,
            price_jump_pct: parse_or(&lookup, "ANOMALY_PRICE_JUMP_PCT", defaults.price_jump_pct)?,
            imbalance_ratio: parse_or(
                &lookup,
                "ANOMALY_IMBALANCE_RATIO",
                defaults.imbalance_ratio,
            )?,
            spread_z: parse_or(&lookup, "ANOMALY_SPREAD_Z", defaults.spread_z)?,
            min_history: parse_or(&lookup, "ANOMALY_MIN_HISTORY", defaults.min_history)?,
            history_capacity: parse_or(
                &lookup,
                "ANOMALY_HISTORY_CAPACITY",
                defaults.history_capacity,
            )?,
            rapid_move_pct: parse_or(&lookup, "ANOMALY_RAPID_MOVE_PCT", defaults.rapid_move_pct)?,
            ..defaults
        };
        detection.validate()?;

        let poll_secs: u64 = parse_or(&lookup, "POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        if poll_secs == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }

        let bind_addr = parse_or(&lookup, "API_BIND_ADDR", default_bind_addr()?)?;

        Ok(Self {
            detection,
            poll_interval: Duration::from_secs(poll_secs),
            outcome_capacity: 64,
            bvmt_api_url: non_empty(&lookup, "BVMT_API_URL")
                .unwrap_or_else(|| DEFAULT_BVMT_API_URL.to_string()),
            fixture_path: non_empty(&lookup, "SNAPSHOT_FIXTURE_PATH").map(PathBuf::from),
            bind_addr,
            alert_database_url: non_empty(&lookup, "ALERT_DATABASE_URL"),
            json_logs: lookup("APP_ENV").is_some_and(|v| v == "production"),
        })
    }
}

fn non_empty<F>(lookup: &F, var: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn default_bind_addr() -> Result<SocketAddr, ConfigError> {
    DEFAULT_BIND_ADDR
        .parse()
        .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            var: "API_BIND_ADDR",
            value: DEFAULT_BIND_ADDR.to_string(),
            reason: e.to_string(),
        })
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match non_empty(lookup, var) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
