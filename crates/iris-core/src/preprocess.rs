//! Frame decoding and normalisation: canonical resize and histogram equalisation.

use crate::config::PreprocessConfig;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("image could not be decoded: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("unsupported frame geometry {width}x{height}: too tall to normalise")]
    UnsupportedGeometry { width: u32, height: u32 },
}

/// Tallest accepted height-to-width ratio. Bounds the canonical frame at
/// `MAX_ASPECT_RATIO * canonical_width` rows.
pub const MAX_ASPECT_RATIO: u32 = 4;

/// Decode an encoded image (JPEG, PNG, ...) into a pixel grid.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, PreprocessError> {
    let image = image::load_from_memory(bytes)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(PreprocessError::EmptyImage {
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(image)
}

/// Converts frames to the canonical grayscale form used for extraction.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    canonical_width: u32,
}

impl Preprocessor {
    pub fn new(config: &PreprocessConfig) -> Self {
        Self {
            canonical_width: config.canonical_width,
        }
    }

    pub fn canonical_width(&self) -> u32 {
        self.canonical_width
    }

    /// Canonical size for a `width`×`height` frame, or an error for frames
    /// that are empty or too tall to resize.
    pub fn check_geometry(&self, width: u32, height: u32) -> Result<(u32, u32), PreprocessError> {
        if width == 0 || height == 0 {
            return Err(PreprocessError::EmptyImage { width, height });
        }
        let (target_w, target_h) = canonical_dimensions(width, height, self.canonical_width);
        if u64::from(target_h) > u64::from(self.canonical_width) * u64::from(MAX_ASPECT_RATIO) {
            return Err(PreprocessError::UnsupportedGeometry { width, height });
        }
        Ok((target_w, target_h))
    }

    /// Grayscale, resize to the canonical width (aspect preserved), equalise.
    pub fn process(&self, image: &DynamicImage) -> Result<GrayImage, PreprocessError> {
        let (width, height) = (image.width(), image.height());
        let (target_w, target_h) = self.check_geometry(width, height)?;

        let gray = image.to_luma8();
        let resized = if (target_w, target_h) == (width, height) {
            gray
        } else {
            image::imageops::resize(&gray, target_w, target_h, FilterType::Triangle)
        };

        let mut equalized = resized;
        equalize_histogram(&mut equalized);
        tracing::debug!(
            src_width = width,
            src_height = height,
            width = target_w,
            height = target_h,
            "preprocessed frame"
        );
        Ok(equalized)
    }
}

/// Output size for a `width`×`height` frame: fixed width, height scaled and
/// truncated, never below one row.
pub fn canonical_dimensions(width: u32, height: u32, canonical_width: u32) -> (u32, u32) {
    let scale = canonical_width as f64 / width as f64;
    let target_h = ((height as f64 * scale).min(u32::MAX as f64) as u32).max(1);
    (canonical_width, target_h)
}

/// Global histogram equalisation in-place.
///
/// Maps each level through the normalised CDF, anchored so the darkest
/// occupied level lands on 0 and the brightest on 255. A single-level image
/// is left untouched.
pub fn equalize_histogram(gray: &mut GrayImage) {
    let total = gray.as_raw().len();
    if total == 0 {
        return;
    }

    let mut hist = [0u32; 256];
    for &p in gray.as_raw() {
        hist[p as usize] += 1;
    }

    let mut cdf = [0u32; 256];
    cdf[0] = hist[0];
    for i in 1..256 {
        cdf[i] = cdf[i - 1] + hist[i];
    }

    let cdf_min = cdf.iter().copied().find(|&v| v > 0).unwrap_or(0);
    let denom = total as u32 - cdf_min;
    if denom == 0 {
        return;
    }

    let mut lut = [0u8; 256];
    for (i, slot) in lut.iter_mut().enumerate() {
        let v = cdf[i].saturating_sub(cdf_min) as f32 / denom as f32 * 255.0;
        *slot = v.round().clamp(0.0, 255.0) as u8;
    }

    for p in gray.pixels_mut() {
        p.0[0] = lut[p.0[0] as usize];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    fn stddev(data: &[u8]) -> f32 {
        let n = data.len() as f32;
        let mean = data.iter().map(|&b| b as f32).sum::<f32>() / n;
        let variance = data.iter().map(|&b| (b as f32 - mean).powi(2)).sum::<f32>() / n;
        variance.sqrt()
    }

    #[test]
    fn test_canonical_dimensions_landscape() {
        assert_eq!(canonical_dimensions(640, 480, 320), (320, 240));
    }

    #[test]
    fn test_canonical_dimensions_truncates() {
        // 333 * 320 / 1000 = 106.56 → 106
        assert_eq!(canonical_dimensions(1000, 333, 320), (320, 106));
    }

    #[test]
    fn test_canonical_dimensions_upscale_and_floor() {
        assert_eq!(canonical_dimensions(100, 400, 320), (320, 1280));
        assert_eq!(canonical_dimensions(5000, 1, 320), (320, 1));
    }

    #[test]
    fn test_process_width_is_canonical_for_any_aspect() {
        let pre = Preprocessor::new(&PreprocessConfig::default());
        for (w, h) in [(640, 480), (1280, 720), (200, 600), (320, 10), (97, 33)] {
            let img = DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
                Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
            }));
            let out = pre.process(&img).unwrap();
            assert_eq!(out.width(), 320, "input {w}x{h}");
        }
    }

    #[test]
    fn test_process_is_deterministic() {
        let pre = Preprocessor::new(&PreprocessConfig::default());
        let img = DynamicImage::ImageLuma8(GrayImage::from_fn(500, 300, |x, y| {
            Luma([((x * 7 + y * 13) % 251) as u8])
        }));
        let a = pre.process(&img).unwrap();
        let b = pre.process(&img).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn test_process_rejects_empty() {
        let pre = Preprocessor::new(&PreprocessConfig::default());
        let img = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        assert!(matches!(
            pre.process(&img),
            Err(PreprocessError::EmptyImage { width: 0, height: 0 })
        ));
    }

    #[test]
    fn test_process_rejects_one_pixel_wide_column() {
        let pre = Preprocessor::new(&PreprocessConfig::default());
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(1, 5000, Luma([40])));
        assert!(matches!(
            pre.process(&img),
            Err(PreprocessError::UnsupportedGeometry { width: 1, height: 5000 })
        ));
    }

    #[test]
    fn test_check_geometry_aspect_limit() {
        let pre = Preprocessor::new(&PreprocessConfig::default());
        assert_eq!(pre.check_geometry(100, 400).unwrap(), (320, 1280));
        assert_eq!(pre.check_geometry(5000, 1).unwrap(), (320, 1));
        assert!(matches!(
            pre.check_geometry(100, 401),
            Err(PreprocessError::UnsupportedGeometry { .. })
        ));
        assert!(matches!(
            pre.check_geometry(1, u32::MAX),
            Err(PreprocessError::UnsupportedGeometry { .. })
        ));
    }

    #[test]
    fn test_equalize_stretches_contrast() {
        // Low-contrast 16x16 image: all pixels between 100–110
        let mut gray = GrayImage::from_fn(16, 16, |x, y| Luma([100 + ((y * 16 + x) % 11) as u8]));
        let orig = stddev(gray.as_raw());
        equalize_histogram(&mut gray);
        let new = stddev(gray.as_raw());
        assert!(new > orig, "equalisation should increase contrast: {orig:.2} → {new:.2}");
        assert_eq!(gray.as_raw().iter().copied().min(), Some(0));
        assert_eq!(gray.as_raw().iter().copied().max(), Some(255));
    }

    #[test]
    fn test_equalize_uniform_untouched() {
        let mut gray = GrayImage::from_pixel(8, 8, Luma([77]));
        equalize_histogram(&mut gray);
        assert!(gray.as_raw().iter().all(|&p| p == 77));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode_image(b"definitely not a jpeg").unwrap_err();
        assert!(matches!(err, PreprocessError::Decode(_)));
    }

    #[test]
    fn test_decode_png_roundtrip_dimensions() {
        let img = RgbImage::from_pixel(12, 7, Rgb([10, 20, 30]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let decoded = decode_image(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 7));
    }
}
