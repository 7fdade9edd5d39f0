//! The extraction pipeline: decode → preprocess → { detect, extract }.

use crate::config::{ConfigError, EngineConfig};
use crate::detector::{draw_regions, RegionDetector};
use crate::features::{ExtractError, FeatureExtractor, Features};
use crate::matcher::BruteForceMatcher;
use crate::policy::{ScanReport, VerificationPolicy};
use crate::preprocess::{decode_image, PreprocessError, Preprocessor};
use crate::types::{BoundingBox, DescriptorSet, EnrollmentRecord};
use image::{DynamicImage, RgbImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Everything extracted from one frame.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub features: Features,
    /// Eye regions in source-image coordinates, strongest first.
    pub regions: Vec<BoundingBox>,
    /// Source image with the regions drawn on it.
    pub preview: RgbImage,
    /// Whether extraction ran on a detected region rather than the whole frame.
    pub cropped: bool,
}

impl Analysis {
    pub fn descriptors(&self) -> &DescriptorSet {
        &self.features.descriptors
    }
}

/// Stage instances built once from a validated [`EngineConfig`].
///
/// Shared by reference across requests; holds no per-request state.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: EngineConfig,
    preprocessor: Preprocessor,
    detector: RegionDetector,
    extractor: FeatureExtractor,
    policy: VerificationPolicy<BruteForceMatcher>,
}

impl Pipeline {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let pipeline = Self {
            preprocessor: Preprocessor::new(&config.preprocess),
            detector: RegionDetector::new(&config.detector),
            extractor: FeatureExtractor::new(&config.features),
            policy: VerificationPolicy::from_config(&config.matching),
            config,
        };
        tracing::info!(
            canonical_width = pipeline.config.preprocess.canonical_width,
            max_features = pipeline.config.features.max_features,
            descriptor_bits = pipeline.extractor.descriptor_bits(),
            good_match_distance = pipeline.config.matching.good_match_distance,
            acceptance_threshold = pipeline.config.matching.acceptance_threshold,
            crop_to_detected_region = pipeline.config.detector.crop_to_detected_region,
            "pipeline initialised"
        );
        Ok(pipeline)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn policy(&self) -> &VerificationPolicy<BruteForceMatcher> {
        &self.policy
    }

    /// Decode an encoded image and analyse it.
    pub fn analyze_bytes(&self, bytes: &[u8]) -> Result<Analysis, PipelineError> {
        let image = decode_image(bytes)?;
        self.analyze(&image)
    }

    /// Detect eye regions for the preview and extract descriptors.
    ///
    /// Extraction uses the whole frame unless `crop_to_detected_region` is
    /// set and a region was found. Detection scans at the canonical width.
    pub fn analyze(&self, image: &DynamicImage) -> Result<Analysis, PipelineError> {
        self.preprocessor.check_geometry(image.width(), image.height())?;
        let regions = self.detector.detect_frame(image, self.preprocessor.canonical_width());
        let preview = draw_regions(image, &regions);

        let crop = if self.config.detector.crop_to_detected_region {
            regions.first().and_then(|region| crop_region(image, region))
        } else {
            None
        };
        if self.config.detector.crop_to_detected_region && crop.is_none() {
            tracing::debug!("no eye region to crop to; extracting from the whole frame");
        }
        let cropped = crop.is_some();
        let source = crop.as_ref().unwrap_or(image);

        let canonical = self.preprocessor.process(source)?;
        let features = self.extractor.extract(&canonical)?;

        tracing::debug!(
            regions = regions.len(),
            descriptors = features.descriptors.len(),
            cropped,
            "frame analysed"
        );

        Ok(Analysis {
            features,
            regions,
            preview,
            cropped,
        })
    }

    /// Verify a probe against a gallery snapshot.
    pub fn verify(&self, probe: &DescriptorSet, gallery: &[EnrollmentRecord]) -> ScanReport {
        self.policy.verify(probe, gallery)
    }
}

/// Crop `image` to `region`, clamped to the image bounds.
fn crop_region(image: &DynamicImage, region: &BoundingBox) -> Option<DynamicImage> {
    let x = region.x.max(0.0).round() as u32;
    let y = region.y.max(0.0).round() as u32;
    if x >= image.width() || y >= image.height() {
        return None;
    }
    let w = (region.width.round() as u32).min(image.width() - x);
    let h = (region.height.round() as u32).min(image.height() - y);
    if w == 0 || h == 0 {
        return None;
    }
    Some(image.crop_imm(x, y, w, h))
}
