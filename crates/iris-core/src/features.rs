//! Oriented FAST keypoints and rotated BRIEF descriptors over an image pyramid.
//!
//! Each pyramid level is searched for FAST-9 corners, candidates from all
//! levels are ranked by corner response, and the strongest are described by
//! a fixed set of pairwise intensity tests rotated to the keypoint's
//! intensity-centroid orientation.

use crate::config::FeatureConfig;
use crate::types::{Descriptor, DescriptorSet, Keypoint};
use image::imageops::FilterType;
use image::GrayImage;
use imageproc::corners::corners_fast9;
use imageproc::filter::gaussian_blur_f32;
use crate::pattern::SAMPLING_PATTERN;
use thiserror::Error;

/// Longest descriptor the sampling pattern can produce.
pub const MAX_DESCRIPTOR_BITS: usize = 512;

// --- Named constants ---
const PATTERN_RADIUS: i32 = 13;
const ORIENTATION_RADIUS: i32 = 15;
/// Border kept clear on every level so that both the orientation disc and
/// the pattern rotated by any angle (13·√2 < 19) stay inside the image.
const EDGE_MARGIN: u32 = 19;
const SMOOTHING_SIGMA: f32 = 2.0;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no features detected; recapture with the eye closer to the camera")]
    NoFeaturesDetected,
}

/// A test pair (x1, y1, x2, y2) relative to the keypoint, unrotated.
pub(crate) type TestPair = (i8, i8, i8, i8);

fn sampling_pattern() -> &'static [TestPair] {
    &SAMPLING_PATTERN
}

/// Keypoints and their descriptors, strongest first.
#[derive(Debug, Clone)]
pub struct Features {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: DescriptorSet,
}

/// Corner found on one pyramid level, in that level's pixel grid.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    level: u8,
    x: u32,
    y: u32,
    score: f32,
}

/// ORB-style extractor with fixed parameters.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    max_features: usize,
    descriptor_bits: usize,
    fast_threshold: u8,
    pyramid_levels: u8,
    pyramid_scale: f32,
    pattern: &'static [TestPair],
}

impl FeatureExtractor {
    pub fn new(config: &FeatureConfig) -> Self {
        Self {
            max_features: config.max_features,
            // Whole bytes only; validated configs already satisfy this.
            descriptor_bits: config.descriptor_bits.clamp(8, MAX_DESCRIPTOR_BITS) / 8 * 8,
            fast_threshold: config.fast_threshold,
            pyramid_levels: config.pyramid_levels,
            pyramid_scale: config.pyramid_scale,
            pattern: sampling_pattern(),
        }
    }

    pub fn descriptor_bits(&self) -> usize {
        self.descriptor_bits
    }

    /// Detect, rank and describe keypoints in a canonical grayscale frame.
    pub fn extract(&self, gray: &GrayImage) -> Result<Features, ExtractError> {
        let pyramid = self.build_pyramid(gray);

        let mut candidates = Vec::new();
        for (level, image) in pyramid.iter().enumerate() {
            let found = detect_level(image, self.fast_threshold, level as u8);
            tracing::trace!(level, width = image.width(), corners = found.len(), "pyramid level");
            candidates.extend(found);
        }
        let detected = candidates.len();

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.level.cmp(&b.level))
                .then(a.y.cmp(&b.y))
                .then(a.x.cmp(&b.x))
        });
        candidates.truncate(self.max_features);

        if candidates.is_empty() {
            tracing::debug!(levels = pyramid.len(), "no keypoints detected");
            return Err(ExtractError::NoFeaturesDetected);
        }

        let smoothed: Vec<GrayImage> = pyramid
            .iter()
            .map(|level| gaussian_blur_f32(level, SMOOTHING_SIGMA))
            .collect();

        let mut keypoints = Vec::with_capacity(candidates.len());
        let mut descriptors = Vec::with_capacity(candidates.len());
        for c in &candidates {
            let level = c.level as usize;
            let angle = intensity_centroid_angle(&pyramid[level], c.x, c.y);
            let bits = describe(&smoothed[level], c.x, c.y, angle, &self.pattern[..self.descriptor_bits]);
            let scale = self.pyramid_scale.powi(c.level as i32);
            keypoints.push(Keypoint {
                x: c.x as f32 * scale,
                y: c.y as f32 * scale,
                level: c.level,
                angle,
                response: c.score,
            });
            descriptors.push(bits);
        }

        tracing::debug!(
            detected,
            kept = keypoints.len(),
            levels = pyramid.len(),
            "extracted features"
        );

        Ok(Features {
            keypoints,
            descriptors: DescriptorSet::from_uniform(self.descriptor_bits, descriptors),
        })
    }

    /// Level 0 is the input; each further level is `pyramid_scale` smaller.
    /// Stops once a level cannot hold a single describable keypoint.
    fn build_pyramid(&self, gray: &GrayImage) -> Vec<GrayImage> {
        let min_side = 2 * EDGE_MARGIN + 1;
        let mut levels = Vec::new();
        let (w0, h0) = gray.dimensions();

        for level in 0..self.pyramid_levels {
            let scale = self.pyramid_scale.powi(level as i32);
            let w = (w0 as f32 / scale).round() as u32;
            let h = (h0 as f32 / scale).round() as u32;
            if w < min_side || h < min_side {
                break;
            }
            if level == 0 {
                levels.push(gray.clone());
            } else {
                levels.push(image::imageops::resize(gray, w, h, FilterType::Triangle));
            }
        }
        levels
    }
}

/// FAST-9 corners on one level with 3×3 non-maximum suppression, restricted
/// to the describable interior.
fn detect_level(image: &GrayImage, threshold: u8, level: u8) -> Vec<Candidate> {
    let (w, h) = image.dimensions();
    let corners = corners_fast9(image, threshold);
    if corners.is_empty() {
        return Vec::new();
    }

    let mut score_map = vec![0f32; (w * h) as usize];
    for c in &corners {
        score_map[(c.y * w + c.x) as usize] = c.score.max(f32::MIN_POSITIVE);
    }

    corners
        .iter()
        .filter(|c| {
            c.x >= EDGE_MARGIN && c.y >= EDGE_MARGIN && c.x < w - EDGE_MARGIN && c.y < h - EDGE_MARGIN
        })
        .filter(|c| {
            let own = score_map[(c.y * w + c.x) as usize];
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx = (c.x as i32 + dx) as u32;
                    let ny = (c.y as i32 + dy) as u32;
                    let other = score_map[(ny * w + nx) as usize];
                    // On a plateau the first corner in raster order survives.
                    let earlier = dy < 0 || (dy == 0 && dx < 0);
                    if other > own || (other == own && earlier) {
                        return false;
                    }
                }
            }
            true
        })
        .map(|c| Candidate {
            level,
            x: c.x,
            y: c.y,
            score: c.score,
        })
        .collect()
}

/// Orientation of the intensity centroid of a disc around (cx, cy), radians.
fn intensity_centroid_angle(image: &GrayImage, cx: u32, cy: u32) -> f32 {
    let mut m01 = 0i64;
    let mut m10 = 0i64;
    let r2 = ORIENTATION_RADIUS * ORIENTATION_RADIUS;

    for dy in -ORIENTATION_RADIUS..=ORIENTATION_RADIUS {
        let span = ((r2 - dy * dy) as f32).sqrt() as i32;
        let y = (cy as i32 + dy) as u32;
        for dx in -span..=span {
            let x = (cx as i32 + dx) as u32;
            let v = image.get_pixel(x, y).0[0] as i64;
            m10 += dx as i64 * v;
            m01 += dy as i64 * v;
        }
    }

    (m01 as f32).atan2(m10 as f32)
}

/// Rotated BRIEF: bit i is set when the first sample of test i is darker
/// than the second.
fn describe(smoothed: &GrayImage, cx: u32, cy: u32, angle: f32, pattern: &[TestPair]) -> Descriptor {
    let (sin_a, cos_a) = angle.sin_cos();
    let (cx, cy) = (cx as f32, cy as f32);
    let sample = |x: i8, y: i8| -> u8 {
        let (x, y) = (x as f32, y as f32);
        let px = (cx + x * cos_a - y * sin_a).round() as u32;
        let py = (cy + x * sin_a + y * cos_a).round() as u32;
        smoothed.get_pixel(px, py).0[0]
    };

    let mut bytes = vec![0u8; pattern.len().div_ceil(8)];
    for (i, &(x1, y1, x2, y2)) in pattern.iter().enumerate() {
        if sample(x1, y1) < sample(x2, y2) {
            bytes[i / 8] |= 1 << (i % 8);
        }
    }
    Descriptor(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// Blocky deterministic noise with a few bright squares on top.
    fn textured(width: u32, height: u32, seed: u32) -> GrayImage {
        let hash = |x: u32, y: u32| -> u8 {
            let mut v = x.wrapping_mul(374_761_393) ^ y.wrapping_mul(668_265_263) ^ seed;
            v = (v ^ (v >> 13)).wrapping_mul(1_274_126_177);
            (v >> 24) as u8
        };
        GrayImage::from_fn(width, height, |x, y| {
            let in_square = (x / 40 + y / 40) % 3 == 0 && x % 40 > 10 && x % 40 < 28 && y % 40 > 8 && y % 40 < 30;
            if in_square {
                Luma([230])
            } else {
                Luma([hash(x / 5, y / 5) / 2 + 20])
            }
        })
    }

    #[test]
    fn test_pattern_is_bounded_and_distinct() {
        let a = sampling_pattern();
        assert_eq!(a.len(), MAX_DESCRIPTOR_BITS);
        for &(x1, y1, x2, y2) in a {
            for v in [x1, y1, x2, y2] {
                assert!((v as i32).abs() <= PATTERN_RADIUS);
            }
            assert_ne!((x1, y1), (x2, y2));
        }
    }

    #[test]
    fn test_pattern_leading_pairs_are_pinned() {
        // Stored descriptors depend on these exact offsets.
        assert_eq!(
            &sampling_pattern()[..4],
            &[(-8, -1, 0, 2), (-1, 12, 10, -1), (1, -2, 9, -4), (-2, -3, -4, -1)]
        );
        assert_eq!(sampling_pattern()[MAX_DESCRIPTOR_BITS - 1], (-3, 8, 6, -5));
    }

    #[test]
    fn test_uniform_image_has_no_features() {
        let extractor = FeatureExtractor::new(&FeatureConfig::default());
        let gray = GrayImage::from_pixel(320, 240, Luma([128]));
        assert_eq!(extractor.extract(&gray).unwrap_err(), ExtractError::NoFeaturesDetected);
    }

    #[test]
    fn test_too_small_image_has_no_features() {
        let extractor = FeatureExtractor::new(&FeatureConfig::default());
        let gray = textured(30, 30, 1);
        assert_eq!(extractor.extract(&gray).unwrap_err(), ExtractError::NoFeaturesDetected);
    }

    #[test]
    fn test_extract_textured_image() {
        let config = FeatureConfig::default();
        let extractor = FeatureExtractor::new(&config);
        let features = extractor.extract(&textured(320, 240, 7)).unwrap();

        assert!(!features.descriptors.is_empty());
        assert!(features.descriptors.len() <= config.max_features);
        assert_eq!(features.descriptors.bit_width(), 256);
        assert_eq!(features.keypoints.len(), features.descriptors.len());
        // Ranked by response
        for pair in features.keypoints.windows(2) {
            assert!(pair[0].response >= pair[1].response);
        }
    }

    #[test]
    fn test_extract_is_bit_identical_across_runs() {
        let extractor = FeatureExtractor::new(&FeatureConfig::default());
        let gray = textured(320, 240, 11);
        let a = extractor.extract(&gray).unwrap();
        let b = FeatureExtractor::new(&FeatureConfig::default()).extract(&gray).unwrap();
        assert_eq!(a.descriptors, b.descriptors);
        assert_eq!(a.keypoints, b.keypoints);
    }

    #[test]
    fn test_max_features_cap() {
        let config = FeatureConfig { max_features: 10, ..FeatureConfig::default() };
        let features = FeatureExtractor::new(&config).extract(&textured(320, 240, 3)).unwrap();
        assert_eq!(features.descriptors.len(), 10);
    }

    #[test]
    fn test_descriptor_bits_follow_config() {
        let config = FeatureConfig { descriptor_bits: 512, ..FeatureConfig::default() };
        let features = FeatureExtractor::new(&config).extract(&textured(320, 240, 5)).unwrap();
        assert_eq!(features.descriptors.bit_width(), 512);
        assert!(features.descriptors.iter().all(|d| d.as_bytes().len() == 64));
    }

    #[test]
    fn test_pyramid_levels_shrink() {
        let extractor = FeatureExtractor::new(&FeatureConfig::default());
        let pyramid = extractor.build_pyramid(&GrayImage::new(320, 240));
        assert!(pyramid.len() > 1);
        assert_eq!(pyramid[0].dimensions(), (320, 240));
        assert_eq!(pyramid[1].dimensions(), (267, 200));
        for level in &pyramid {
            assert!(level.width() > 2 * EDGE_MARGIN && level.height() > 2 * EDGE_MARGIN);
        }
    }

    #[test]
    fn test_centroid_angle_points_to_bright_side() {
        let right = GrayImage::from_fn(41, 41, |x, _| Luma([if x > 20 { 200 } else { 10 }]));
        assert!(intensity_centroid_angle(&right, 20, 20).abs() < 1e-3);

        let below = GrayImage::from_fn(41, 41, |_, y| Luma([if y > 20 { 200 } else { 10 }]));
        let angle = intensity_centroid_angle(&below, 20, 20);
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-3, "got {angle}");
    }

    #[test]
    fn test_descriptor_survives_quarter_turn() {
        let gray = textured(120, 120, 21);
        let rotated = image::imageops::rotate90(&gray);
        let pattern = &sampling_pattern()[..256];

        let (cx, cy) = (50u32, 45u32);
        // rotate90 maps (x, y) to (h - 1 - y, x)
        let (rx, ry) = (gray.height() - 1 - cy, cx);

        let angle = intensity_centroid_angle(&gray, cx, cy);
        let rangle = intensity_centroid_angle(&rotated, rx, ry);
        let d1 = describe(&gaussian_blur_f32(&gray, SMOOTHING_SIGMA), cx, cy, angle, pattern);
        let d2 = describe(&gaussian_blur_f32(&rotated, SMOOTHING_SIGMA), rx, ry, rangle, pattern);

        let distance = d1.hamming(&d2).unwrap();
        assert!(distance < 40, "rotated descriptor drifted by {distance} bits");
    }

    #[test]
    fn test_describe_sets_expected_bit() {
        // Left half dark, right half bright; angle 0 keeps the pattern unrotated.
        let gray = GrayImage::from_fn(41, 41, |x, _| Luma([if x > 20 { 200 } else { 10 }]));
        let pattern: [TestPair; 2] = [(-5, 0, 5, 0), (5, 0, -5, 0)];
        let d = describe(&gray, 20, 20, 0.0, &pattern);
        assert_eq!(d.as_bytes(), &[0b0000_0001]);
    }
}
