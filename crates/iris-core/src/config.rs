//! Engine configuration.
//!
//! Built once at startup and shared by reference with every request. All
//! fields have defaults, so an empty TOML document is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level engine configuration, one section per pipeline stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub preprocess: PreprocessConfig,
    pub detector: DetectorConfig,
    pub features: FeatureConfig,
    pub matching: MatchConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Width every frame is resized to before extraction.
    pub canonical_width: u32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self { canonical_width: 320 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Window growth factor between detector scales.
    pub scale_factor: f32,
    /// A region survives only when more than this many raw hits agree on it.
    pub min_neighbors: usize,
    /// Smallest window height in pixels (width is 1.5× height).
    pub min_size: u32,
    /// Extract from the strongest detected region instead of the whole frame.
    ///
    /// Off by default: detection on webcam frames is unstable, and cropping
    /// to a jittery box rejects genuine users. Whole-frame extraction pulls
    /// some background texture into the descriptor set in exchange.
    pub crop_to_detected_region: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            scale_factor: 1.3,
            min_neighbors: 5,
            min_size: 16,
            crop_to_detected_region: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Keypoints retained after ranking by response.
    pub max_features: usize,
    /// Descriptor length; a multiple of 8, at most 512.
    pub descriptor_bits: usize,
    /// FAST intensity threshold.
    pub fast_threshold: u8,
    pub pyramid_levels: u8,
    pub pyramid_scale: f32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            max_features: 500,
            descriptor_bits: 256,
            fast_threshold: 20,
            pyramid_levels: 8,
            pyramid_scale: 1.2,
        }
    }
}

/// Matching thresholds.
///
/// Both defaults were calibrated for 256-bit descriptors and a 500-keypoint
/// cap; recalibrate if either changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// A cross-checked pair counts when its Hamming distance is below this.
    pub good_match_distance: u32,
    /// Minimum score for acceptance (inclusive).
    pub acceptance_threshold: usize,
    /// Compare gallery records on the rayon pool.
    pub parallel_scan: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            good_match_distance: 50,
            acceptance_threshold: 30,
            parallel_scan: false,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&src)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.preprocess.canonical_width < 64 {
            return invalid(format!(
                "preprocess.canonical_width must be at least 64, got {}",
                self.preprocess.canonical_width
            ));
        }
        if !(self.detector.scale_factor > 1.0) {
            return invalid(format!(
                "detector.scale_factor must be greater than 1.0, got {}",
                self.detector.scale_factor
            ));
        }
        if self.detector.min_size < 6 {
            return invalid(format!(
                "detector.min_size must be at least 6, got {}",
                self.detector.min_size
            ));
        }
        let bits = self.features.descriptor_bits;
        if bits == 0 || bits % 8 != 0 || bits > crate::features::MAX_DESCRIPTOR_BITS {
            return invalid(format!(
                "features.descriptor_bits must be a multiple of 8 in 8..={}, got {bits}",
                crate::features::MAX_DESCRIPTOR_BITS
            ));
        }
        if self.features.max_features == 0 {
            return invalid("features.max_features must be positive".into());
        }
        if self.features.pyramid_levels == 0 {
            return invalid("features.pyramid_levels must be positive".into());
        }
        if !(self.features.pyramid_scale > 1.0) {
            return invalid(format!(
                "features.pyramid_scale must be greater than 1.0, got {}",
                self.features.pyramid_scale
            ));
        }
        if self.matching.good_match_distance as usize > bits {
            tracing::warn!(
                good_match_distance = self.matching.good_match_distance,
                descriptor_bits = bits,
                "good-match distance exceeds descriptor width; every cross-checked pair will count"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.preprocess.canonical_width, 320);
        assert_eq!(config.detector.scale_factor, 1.3);
        assert_eq!(config.detector.min_neighbors, 5);
        assert!(!config.detector.crop_to_detected_region);
        assert_eq!(config.features.max_features, 500);
        assert_eq!(config.features.descriptor_bits, 256);
        assert_eq!(config.matching.good_match_distance, 50);
        assert_eq!(config.matching.acceptance_threshold, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_toml_override() {
        let config = EngineConfig::from_toml_str(
            r#"
            [matching]
            acceptance_threshold = 40

            [detector]
            crop_to_detected_region = true
            "#,
        )
        .unwrap();
        assert_eq!(config.matching.acceptance_threshold, 40);
        assert_eq!(config.matching.good_match_distance, 50);
        assert!(config.detector.crop_to_detected_region);
        assert_eq!(config.preprocess.canonical_width, 320);
    }

    #[test]
    fn test_rejects_bad_descriptor_bits() {
        let err = EngineConfig::from_toml_str("[features]\ndescriptor_bits = 100\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "got {err:?}");
    }

    #[test]
    fn test_rejects_scale_factor_of_one() {
        let err = EngineConfig::from_toml_str("[detector]\nscale_factor = 1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "got {err:?}");
    }

    #[test]
    fn test_rejects_unparseable() {
        let err = EngineConfig::from_toml_str("[matching\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "got {err:?}");
    }
}
