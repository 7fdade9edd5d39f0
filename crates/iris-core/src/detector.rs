//! Multi-scale eye-region detector on integral images.
//!
//! Slides a 3:2 window over the frame at geometrically growing sizes and
//! scores a 3×3 cell layout: a dark centre cell (pupil/iris) must be darker
//! than the cells either side of it (sclera, eye corners) and the band below
//! it (lower lid, cheek). Raw hits are clustered and only clusters with more
//! than `min_neighbors` members are reported. Boxes are for annotation; the
//! extractor does not depend on them unless cropping is configured.
//!
//! Frames wider than the working width are scanned on a downscaled copy and
//! the boxes mapped back to source coordinates.

use crate::config::DetectorConfig;
use crate::types::BoundingBox;
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

// --- Named constants ---
const WINDOW_ASPECT: f32 = 1.5;
const MIN_WINDOW_STDDEV: f64 = 10.0;
/// Required centre-to-surround contrast, in window standard deviations.
const MIN_CONTRAST: f64 = 0.35;
const GROUP_EPS: f32 = 0.2;
const OUTPUT_NMS_THRESHOLD: f32 = 0.3;
const ANNOTATION_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Summed-area tables for pixel values and squared pixel values.
struct IntegralImage {
    stride: usize,
    sum: Vec<u64>,
    sq_sum: Vec<u64>,
}

impl IntegralImage {
    fn new(gray: &GrayImage) -> Self {
        let w = gray.width() as usize;
        let h = gray.height() as usize;
        let stride = w + 1;
        let mut sum = vec![0u64; stride * (h + 1)];
        let mut sq_sum = vec![0u64; stride * (h + 1)];
        let raw = gray.as_raw();

        for y in 0..h {
            let mut row = 0u64;
            let mut row_sq = 0u64;
            for x in 0..w {
                let p = raw[y * w + x] as u64;
                row += p;
                row_sq += p * p;
                sum[(y + 1) * stride + x + 1] = sum[y * stride + x + 1] + row;
                sq_sum[(y + 1) * stride + x + 1] = sq_sum[y * stride + x + 1] + row_sq;
            }
        }

        Self { stride, sum, sq_sum }
    }

    fn rect(table: &[u64], stride: usize, x: u32, y: u32, w: u32, h: u32) -> u64 {
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + w as usize, y0 + h as usize);
        table[y1 * stride + x1] + table[y0 * stride + x0]
            - table[y0 * stride + x1]
            - table[y1 * stride + x0]
    }

    fn mean(&self, x: u32, y: u32, w: u32, h: u32) -> f64 {
        Self::rect(&self.sum, self.stride, x, y, w, h) as f64 / (w as f64 * h as f64)
    }

    fn stddev(&self, x: u32, y: u32, w: u32, h: u32) -> f64 {
        let n = w as f64 * h as f64;
        let mean = Self::rect(&self.sum, self.stride, x, y, w, h) as f64 / n;
        let sq = Self::rect(&self.sq_sum, self.stride, x, y, w, h) as f64 / n;
        (sq - mean * mean).max(0.0).sqrt()
    }
}

/// Eye-region detector with fixed scale parameters.
#[derive(Debug, Clone)]
pub struct RegionDetector {
    scale_factor: f32,
    min_neighbors: usize,
    min_size: u32,
}

impl RegionDetector {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            scale_factor: config.scale_factor,
            min_neighbors: config.min_neighbors,
            min_size: config.min_size,
        }
    }

    /// Detect on `image` scanned at no more than `working_width` columns.
    /// Boxes are returned in `image` coordinates, strongest first.
    pub fn detect_frame(&self, image: &DynamicImage, working_width: u32) -> Vec<BoundingBox> {
        let (width, height) = (image.width(), image.height());
        let gray = image.to_luma8();
        if width <= working_width || working_width == 0 {
            return self.detect(&gray);
        }

        let small_h = ((height as f64 * working_width as f64 / width as f64) as u32).max(1);
        let small = image::imageops::resize(&gray, working_width, small_h, FilterType::Triangle);
        let sx = width as f32 / working_width as f32;
        let sy = height as f32 / small_h as f32;

        self.detect(&small)
            .into_iter()
            .map(|b| BoundingBox {
                x: (b.x * sx).round(),
                y: (b.y * sy).round(),
                width: (b.width * sx).round(),
                height: (b.height * sy).round(),
                confidence: b.confidence,
            })
            .collect()
    }

    /// Detect eye-like regions, strongest first. An empty result is normal.
    pub fn detect(&self, gray: &GrayImage) -> Vec<BoundingBox> {
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Vec::new();
        }

        let integral = IntegralImage::new(gray);
        let mut hits = Vec::new();
        let mut win_h = self.min_size as f32;
        let mut scales = 0usize;

        loop {
            let h = win_h.round() as u32;
            let w = (win_h * WINDOW_ASPECT).round() as u32;
            if w > width || h > height {
                break;
            }
            let step = (h / 8).max(2) as usize;
            for y in (0..=height - h).step_by(step) {
                for x in (0..=width - w).step_by(step) {
                    if let Some(score) = eye_response(&integral, x, y, w, h) {
                        hits.push(BoundingBox {
                            x: x as f32,
                            y: y as f32,
                            width: w as f32,
                            height: h as f32,
                            confidence: score as f32,
                        });
                    }
                }
            }
            scales += 1;
            win_h *= self.scale_factor;
        }

        let raw_hits = hits.len();
        let grouped = group_hits(hits, self.min_neighbors);
        let mut regions = nms(grouped, OUTPUT_NMS_THRESHOLD);
        regions.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        tracing::debug!(scales, raw_hits, regions = regions.len(), "eye region detection");
        regions
    }
}

/// Score one window; `None` when it does not look like an eye.
fn eye_response(integral: &IntegralImage, x: u32, y: u32, w: u32, h: u32) -> Option<f64> {
    let std = integral.stddev(x, y, w, h);
    if std < MIN_WINDOW_STDDEV {
        return None;
    }

    let cw = w / 3;
    let ch = h / 3;
    let center = integral.mean(x + cw, y + ch, cw, ch);
    let left = integral.mean(x, y + ch, cw, ch);
    let right = integral.mean(x + 2 * cw, y + ch, cw, ch);
    let lower = integral.mean(x, y + 2 * ch, 3 * cw, ch);

    let contrast = (left - center).min(right - center).min(lower - center) / std;
    (contrast >= MIN_CONTRAST).then_some(contrast)
}

/// Two raw hits belong together when every edge is within `eps` of the
/// smaller box's mean side length.
fn similar(a: &BoundingBox, b: &BoundingBox) -> bool {
    let delta = GROUP_EPS * (a.width.min(b.width) + a.height.min(b.height)) * 0.5;
    (a.x - b.x).abs() <= delta
        && (a.y - b.y).abs() <= delta
        && (a.x + a.width - b.x - b.width).abs() <= delta
        && (a.y + a.height - b.y - b.height).abs() <= delta
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Cluster raw hits and average each cluster with more than `min_neighbors`
/// members. Confidence of an output box = cluster size.
///
/// Candidates are swept in `x` order: two hits can only be similar when their
/// left edges are within `GROUP_EPS` of the narrower box's mean side, so the
/// inner scan stops once the gap exceeds that bound for the current hit.
fn group_hits(hits: Vec<BoundingBox>, min_neighbors: usize) -> Vec<BoundingBox> {
    let n = hits.len();
    let mut parent: Vec<usize> = (0..n).collect();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| hits[a].x.total_cmp(&hits[b].x));
    for (pos, &i) in order.iter().enumerate() {
        let reach = GROUP_EPS * (hits[i].width + hits[i].height) * 0.5;
        for &j in &order[pos + 1..] {
            if hits[j].x - hits[i].x > reach {
                break;
            }
            if similar(&hits[i], &hits[j]) {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[rj.max(ri)] = ri.min(rj);
                }
            }
        }
    }

    // (count, [sum x, sum y, sum w, sum h]) in first-seen order
    let mut slot: Vec<Option<usize>> = vec![None; n];
    let mut clusters: Vec<(usize, [f32; 4])> = Vec::new();
    for i in 0..n {
        let root = find(&mut parent, i);
        let h = &hits[i];
        match slot[root] {
            Some(k) => {
                let (count, acc) = &mut clusters[k];
                *count += 1;
                acc[0] += h.x;
                acc[1] += h.y;
                acc[2] += h.width;
                acc[3] += h.height;
            }
            None => {
                slot[root] = Some(clusters.len());
                clusters.push((1, [h.x, h.y, h.width, h.height]));
            }
        }
    }

    clusters
        .into_iter()
        .filter(|(count, _)| *count > min_neighbors)
        .map(|(count, acc)| {
            let c = count as f32;
            BoundingBox {
                x: (acc[0] / c).round(),
                y: (acc[1] / c).round(),
                width: (acc[2] / c).round(),
                height: (acc[3] / c).round(),
                confidence: c,
            }
        })
        .collect()
}

/// Non-Maximum Suppression: remove overlapping detections.
fn nms(mut detections: Vec<BoundingBox>, iou_threshold: f32) -> Vec<BoundingBox> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; detections.len()];

    for i in 0..detections.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(detections[i].clone());

        for j in (i + 1)..detections.len() {
            if suppressed[j] {
                continue;
            }
            if iou(&detections[i], &detections[j]) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}

/// Compute Intersection-over-Union between two bounding boxes.
fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);

    let inter_w = (x2 - x1).max(0.0);
    let inter_h = (y2 - y1).max(0.0);
    let inter_area = inter_w * inter_h;

    let area_a = a.width * a.height;
    let area_b = b.width * b.height;
    let union_area = area_a + area_b - inter_area;

    if union_area > 0.0 {
        inter_area / union_area
    } else {
        0.0
    }
}

/// Copy of `image` with a 2-pixel green box around each region.
pub fn draw_regions(image: &DynamicImage, regions: &[BoundingBox]) -> RgbImage {
    let mut canvas = image.to_rgb8();
    for region in regions {
        let (x, y) = (region.x.round() as i32, region.y.round() as i32);
        let (w, h) = (region.width.round() as u32, region.height.round() as u32);
        if w == 0 || h == 0 {
            continue;
        }
        draw_hollow_rect_mut(&mut canvas, Rect::at(x, y).of_size(w, h), ANNOTATION_COLOR);
        if w > 2 && h > 2 {
            draw_hollow_rect_mut(
                &mut canvas,
                Rect::at(x + 1, y + 1).of_size(w - 2, h - 2),
                ANNOTATION_COLOR,
            );
        }
    }
    canvas
}
