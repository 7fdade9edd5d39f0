//! Cross-checked Hamming matching between two descriptor sets.

use crate::config::MatchConfig;
use crate::types::{hamming_bytes, DescriptorSet};
use std::fmt;

/// Why a (probe, enrolled) pair was not scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyProbe,
    EmptyEnrolled,
    IncompatibleBitWidth { probe: usize, enrolled: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyProbe => write!(f, "probe has no descriptors"),
            SkipReason::EmptyEnrolled => write!(f, "enrolled set has no descriptors"),
            SkipReason::IncompatibleBitWidth { probe, enrolled } => {
                write!(f, "descriptor width mismatch: probe {probe} bits, enrolled {enrolled} bits")
            }
        }
    }
}

/// Outcome of comparing a probe against one enrolled set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Number of good cross-checked correspondences.
    Scored(usize),
    Skipped(SkipReason),
}

impl Comparison {
    /// Score contribution; a skipped pair scores 0.
    pub fn score(&self) -> usize {
        match self {
            Comparison::Scored(score) => *score,
            Comparison::Skipped(_) => 0,
        }
    }
}

/// Strategy for scoring a probe set against one enrolled set.
///
/// Implementations must be pure: the same pair always yields the same
/// comparison, and no call may depend on another.
pub trait Matcher: Send + Sync {
    fn compare(&self, probe: &DescriptorSet, enrolled: &DescriptorSet) -> Comparison;
}

/// One mutually-nearest descriptor pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correspondence {
    pub probe_idx: usize,
    pub enrolled_idx: usize,
    pub distance: u32,
}

/// Exhaustive matcher: O(P × E) distances per pair of sets.
#[derive(Debug, Clone)]
pub struct BruteForceMatcher {
    good_match_distance: u32,
}

impl BruteForceMatcher {
    pub fn new(good_match_distance: u32) -> Self {
        Self { good_match_distance }
    }

    pub fn from_config(config: &MatchConfig) -> Self {
        Self::new(config.good_match_distance)
    }

    pub fn good_match_distance(&self) -> u32 {
        self.good_match_distance
    }

    /// All mutual nearest-neighbour pairs, in probe order. Widths must match.
    pub fn cross_checked(&self, probe: &DescriptorSet, enrolled: &DescriptorSet) -> Vec<Correspondence> {
        let forward = nearest(probe, enrolled);
        let backward = nearest(enrolled, probe);

        forward
            .into_iter()
            .enumerate()
            .filter_map(|(probe_idx, (enrolled_idx, distance))| {
                (backward[enrolled_idx].0 == probe_idx).then_some(Correspondence {
                    probe_idx,
                    enrolled_idx,
                    distance,
                })
            })
            .collect()
    }
}

impl Default for BruteForceMatcher {
    fn default() -> Self {
        Self::from_config(&MatchConfig::default())
    }
}

impl Matcher for BruteForceMatcher {
    fn compare(&self, probe: &DescriptorSet, enrolled: &DescriptorSet) -> Comparison {
        if probe.is_empty() {
            return Comparison::Skipped(SkipReason::EmptyProbe);
        }
        if enrolled.is_empty() {
            return Comparison::Skipped(SkipReason::EmptyEnrolled);
        }
        if probe.bit_width() != enrolled.bit_width() {
            return Comparison::Skipped(SkipReason::IncompatibleBitWidth {
                probe: probe.bit_width(),
                enrolled: enrolled.bit_width(),
            });
        }

        let good = self
            .cross_checked(probe, enrolled)
            .iter()
            .filter(|c| c.distance < self.good_match_distance)
            .count();
        Comparison::Scored(good)
    }
}

/// For every descriptor in `from`, the index and distance of its nearest
/// neighbour in `to`. The lowest index wins distance ties. `to` must be
/// non-empty.
fn nearest(from: &DescriptorSet, to: &DescriptorSet) -> Vec<(usize, u32)> {
    from.iter()
        .map(|a| {
            let mut best = (0usize, u32::MAX);
            for (j, b) in to.iter().enumerate() {
                let d = hamming_bytes(a.as_bytes(), b.as_bytes());
                if d < best.1 {
                    best = (j, d);
                }
            }
            best
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Descriptor;

    /// 256-bit descriptor with the first `n` bits set.
    fn with_bits(n: usize) -> Descriptor {
        let mut bytes = vec![0u8; 32];
        for i in 0..n {
            bytes[i / 8] |= 1 << (i % 8);
        }
        Descriptor(bytes)
    }

    fn set(descriptors: Vec<Descriptor>) -> DescriptorSet {
        let bits = descriptors.first().map_or(256, Descriptor::bit_width);
        DescriptorSet::new(bits, descriptors).unwrap()
    }

    #[test]
    fn test_identical_sets_match_fully() {
        let a = set(vec![with_bits(0), with_bits(100), with_bits(200)]);
        let result = BruteForceMatcher::new(50).compare(&a, &a.clone());
        assert_eq!(result, Comparison::Scored(3));
    }

    #[test]
    fn test_cross_check_drops_one_sided_match() {
        // Both probe descriptors are nearest to e0, but e0 only points back to p1.
        let probe = set(vec![with_bits(10), with_bits(5)]);
        let enrolled = set(vec![with_bits(0)]);
        let matcher = BruteForceMatcher::new(50);

        let pairs = matcher.cross_checked(&probe, &enrolled);
        assert_eq!(pairs, vec![Correspondence { probe_idx: 1, enrolled_idx: 0, distance: 5 }]);
        assert_eq!(matcher.compare(&probe, &enrolled), Comparison::Scored(1));
    }

    #[test]
    fn test_distance_threshold_is_strict() {
        let matcher = BruteForceMatcher::new(50);
        let enrolled = set(vec![with_bits(0)]);
        assert_eq!(matcher.compare(&set(vec![with_bits(49)]), &enrolled), Comparison::Scored(1));
        assert_eq!(matcher.compare(&set(vec![with_bits(50)]), &enrolled), Comparison::Scored(0));
    }

    #[test]
    fn test_tie_goes_to_lowest_index() {
        let probe = set(vec![with_bits(4)]);
        let enrolled = set(vec![with_bits(0), with_bits(8)]);
        // Both enrolled descriptors are 4 bits away; index 0 wins.
        let pairs = BruteForceMatcher::new(50).cross_checked(&probe, &enrolled);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].enrolled_idx, 0);
    }

    #[test]
    fn test_empty_sides_are_skipped() {
        let matcher = BruteForceMatcher::new(50);
        let full = set(vec![with_bits(1)]);
        let empty = DescriptorSet::empty(256);
        assert_eq!(matcher.compare(&empty, &full), Comparison::Skipped(SkipReason::EmptyProbe));
        assert_eq!(matcher.compare(&full, &empty), Comparison::Skipped(SkipReason::EmptyEnrolled));
        assert_eq!(matcher.compare(&full, &empty).score(), 0);
    }

    #[test]
    fn test_width_mismatch_is_skipped() {
        let matcher = BruteForceMatcher::new(50);
        let narrow = set(vec![Descriptor(vec![0u8; 16])]);
        let wide = set(vec![with_bits(0)]);
        assert_eq!(
            matcher.compare(&wide, &narrow),
            Comparison::Skipped(SkipReason::IncompatibleBitWidth { probe: 256, enrolled: 128 })
        );
    }

    #[test]
    fn test_skip_reason_display() {
        let reason = SkipReason::IncompatibleBitWidth { probe: 256, enrolled: 512 };
        assert_eq!(
            reason.to_string(),
            "descriptor width mismatch: probe 256 bits, enrolled 512 bits"
        );
    }
}
