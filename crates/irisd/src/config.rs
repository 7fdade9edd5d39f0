use iris_core::config::{ConfigError, EngineConfig};
use iris_store::Store;
use std::path::PathBuf;

/// Which message bus the daemon registers on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusKind {
    Session,
    System,
}

/// Daemon configuration, loaded from environment variables.
pub struct Config {
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
    /// Optional TOML file with engine parameters.
    pub engine_config_path: Option<PathBuf>,
    /// Good cross-checked matches required to accept a probe.
    pub acceptance_threshold: Option<usize>,
    /// Hamming distance below which a correspondence counts as good.
    pub good_match_distance: Option<u32>,
    /// Cap on descriptors per image.
    pub max_features: Option<usize>,
    /// Extract from the strongest detected eye region instead of the whole frame.
    pub crop_to_detected_region: Option<bool>,
    pub bus: BusKind,
}

impl Config {
    /// Load configuration from `IRIS_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let db_path = std::env::var("IRIS_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Store::default_path());

        Self {
            db_path,
            engine_config_path: std::env::var("IRIS_CONFIG").ok().map(PathBuf::from),
            acceptance_threshold: env_parse("IRIS_ACCEPT_THRESHOLD"),
            good_match_distance: env_parse("IRIS_GOOD_MATCH_DISTANCE"),
            max_features: env_parse("IRIS_MAX_FEATURES"),
            crop_to_detected_region: std::env::var("IRIS_CROP_TO_REGION")
                .ok()
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false")),
            bus: match std::env::var("IRIS_BUS").as_deref() {
                Ok("system") => BusKind::System,
                _ => BusKind::Session,
            },
        }
    }

    /// Engine parameters: the TOML file (if any) with environment overrides applied.
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let mut config = match &self.engine_config_path {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        if let Some(v) = self.acceptance_threshold {
            config.matching.acceptance_threshold = v;
        }
        if let Some(v) = self.good_match_distance {
            config.matching.good_match_distance = v;
        }
        if let Some(v) = self.max_features {
            config.features.max_features = v;
        }
        if let Some(v) = self.crop_to_detected_region {
            config.detector.crop_to_detected_region = v;
        }
        config.validate()?;
        Ok(config)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable override");
            None
        }
    }
}
