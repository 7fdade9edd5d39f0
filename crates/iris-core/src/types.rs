use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Axis-aligned box around a detected eye region, in source-image pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Number of raw detector hits merged into this box.
    pub confidence: f32,
}

/// A FAST corner promoted to a feature location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Column in level-0 (canonical image) coordinates.
    pub x: f32,
    /// Row in level-0 (canonical image) coordinates.
    pub y: f32,
    /// Pyramid level the corner was found on.
    pub level: u8,
    /// Intensity-centroid orientation in radians.
    pub angle: f32,
    pub response: f32,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("descriptor bit-width must be a positive multiple of 8, got {0}")]
    InvalidBitWidth(usize),
    #[error("descriptor {index} has {actual} bits, set expects {expected}")]
    MixedBitWidth {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("descriptor blob of {len} bytes is not a whole number of {bit_width}-bit descriptors")]
    TruncatedBlob { len: usize, bit_width: usize },
}

/// Fixed-length binary descriptor, packed little-endian into bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Descriptor(pub Vec<u8>);

impl Descriptor {
    pub fn bit_width(&self) -> usize {
        self.0.len() * 8
    }

    /// Number of differing bits, or `None` when the widths differ.
    pub fn hamming(&self, other: &Descriptor) -> Option<u32> {
        if self.0.len() != other.0.len() {
            return None;
        }
        Some(hamming_bytes(&self.0, &other.0))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Hamming distance over equal-length byte slices, eight bytes at a time.
#[inline]
pub(crate) fn hamming_bytes(a: &[u8], b: &[u8]) -> u32 {
    let mut sum = 0;
    let mut chunks_a = a.chunks_exact(8);
    let mut chunks_b = b.chunks_exact(8);
    for (ca, cb) in (&mut chunks_a).zip(&mut chunks_b) {
        let wa = u64::from_le_bytes([ca[0], ca[1], ca[2], ca[3], ca[4], ca[5], ca[6], ca[7]]);
        let wb = u64::from_le_bytes([cb[0], cb[1], cb[2], cb[3], cb[4], cb[5], cb[6], cb[7]]);
        sum += (wa ^ wb).count_ones();
    }
    for (x, y) in chunks_a.remainder().iter().zip(chunks_b.remainder()) {
        sum += (x ^ y).count_ones();
    }
    sum
}

/// Descriptors extracted from one image. Every member has the same bit-width.
///
/// Deserialisation goes through [`DescriptorSet::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedDescriptorSet")]
pub struct DescriptorSet {
    bit_width: usize,
    descriptors: Vec<Descriptor>,
}

#[derive(Deserialize)]
struct UncheckedDescriptorSet {
    bit_width: usize,
    descriptors: Vec<Descriptor>,
}

impl TryFrom<UncheckedDescriptorSet> for DescriptorSet {
    type Error = DescriptorError;

    fn try_from(raw: UncheckedDescriptorSet) -> Result<Self, Self::Error> {
        DescriptorSet::new(raw.bit_width, raw.descriptors)
    }
}

impl DescriptorSet {
    /// Build a set, rejecting descriptors whose width differs from `bit_width`.
    pub fn new(bit_width: usize, descriptors: Vec<Descriptor>) -> Result<Self, DescriptorError> {
        if bit_width == 0 || bit_width % 8 != 0 {
            return Err(DescriptorError::InvalidBitWidth(bit_width));
        }
        if let Some((index, d)) = descriptors
            .iter()
            .enumerate()
            .find(|(_, d)| d.bit_width() != bit_width)
        {
            return Err(DescriptorError::MixedBitWidth {
                index,
                expected: bit_width,
                actual: d.bit_width(),
            });
        }
        Ok(Self {
            bit_width,
            descriptors,
        })
    }

    /// Build a set whose descriptors are known to be `bit_width` wide.
    pub(crate) fn from_uniform(bit_width: usize, descriptors: Vec<Descriptor>) -> Self {
        debug_assert!(descriptors.iter().all(|d| d.bit_width() == bit_width));
        Self {
            bit_width,
            descriptors,
        }
    }

    /// An empty set of the given width.
    pub fn empty(bit_width: usize) -> Self {
        Self {
            bit_width,
            descriptors: Vec::new(),
        }
    }

    /// Rebuild a set from a concatenated blob (the storage layout).
    pub fn from_blob(bit_width: usize, blob: &[u8]) -> Result<Self, DescriptorError> {
        if bit_width == 0 || bit_width % 8 != 0 {
            return Err(DescriptorError::InvalidBitWidth(bit_width));
        }
        let stride = bit_width / 8;
        if blob.len() % stride != 0 {
            return Err(DescriptorError::TruncatedBlob {
                len: blob.len(),
                bit_width,
            });
        }
        let descriptors = blob
            .chunks_exact(stride)
            .map(|chunk| Descriptor(chunk.to_vec()))
            .collect();
        Ok(Self {
            bit_width,
            descriptors,
        })
    }

    /// Concatenate all descriptors into one blob.
    pub fn to_blob(&self) -> Vec<u8> {
        let mut blob = Vec::with_capacity(self.descriptors.len() * self.bit_width / 8);
        for d in &self.descriptors {
            blob.extend_from_slice(&d.0);
        }
        blob
    }

    pub fn bit_width(&self) -> usize {
        self.bit_width
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Descriptor> {
        self.descriptors.iter()
    }
}

/// One enrolled identity as read back from storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    /// Storage-assigned record id; attendance events reference it.
    pub id: i64,
    /// Organisation-issued identity key (e.g. staff or student number).
    pub identity: String,
    pub name: String,
    /// Organisational attribute, e.g. department.
    pub attribute: String,
    pub descriptors: DescriptorSet,
    pub created_at: String,
}

/// The identity an accepted verification resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedIdentity {
    pub record_id: i64,
    pub identity: String,
    pub name: String,
    pub attribute: String,
}

impl From<&EnrollmentRecord> for MatchedIdentity {
    fn from(record: &EnrollmentRecord) -> Self {
        Self {
            record_id: record.id,
            identity: record.identity.clone(),
            name: record.name.clone(),
            attribute: record.attribute.clone(),
        }
    }
}

/// Result of verifying a probe against the gallery.
#[derive(Debug, Clone)]
pub struct VerificationResult {
    /// Present only when the best score cleared the acceptance threshold.
    pub matched: Option<MatchedIdentity>,
    /// Best score observed across the gallery, reported on rejection too.
    pub score: usize,
    /// Source image with detected eye regions drawn on it.
    pub preview: Option<image::RgbImage>,
}

impl VerificationResult {
    pub fn rejected(score: usize) -> Self {
        Self {
            matched: None,
            score,
            preview: None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.matched.is_some()
    }

    pub fn with_preview(mut self, preview: image::RgbImage) -> Self {
        self.preview = Some(preview);
        self
    }
}
