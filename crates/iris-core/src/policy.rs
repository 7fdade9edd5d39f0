//! Gallery scan and accept/reject decision.

use crate::config::MatchConfig;
use crate::matcher::{BruteForceMatcher, Comparison, Matcher, SkipReason};
use crate::types::{DescriptorSet, EnrollmentRecord, MatchedIdentity, VerificationResult};
use rayon::prelude::*;

/// A gallery record the scan could not score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub record_id: i64,
    pub identity: String,
    pub reason: SkipReason,
}

/// Verification result plus scan diagnostics.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub result: VerificationResult,
    /// Matcher invocations performed; zero when the scan short-circuits.
    pub comparisons: usize,
    pub skipped: Vec<SkippedRecord>,
}

/// Picks the best-scoring gallery record and applies the acceptance threshold.
///
/// Each call is a pure function of (probe, gallery snapshot, configuration).
#[derive(Debug, Clone)]
pub struct VerificationPolicy<M: Matcher = BruteForceMatcher> {
    matcher: M,
    acceptance_threshold: usize,
    parallel_scan: bool,
}

impl VerificationPolicy<BruteForceMatcher> {
    pub fn from_config(config: &MatchConfig) -> Self {
        Self::new(BruteForceMatcher::from_config(config), config.acceptance_threshold)
            .with_parallel_scan(config.parallel_scan)
    }
}

impl<M: Matcher> VerificationPolicy<M> {
    pub fn new(matcher: M, acceptance_threshold: usize) -> Self {
        Self {
            matcher,
            acceptance_threshold,
            parallel_scan: false,
        }
    }

    /// Score gallery records on the rayon pool. The decision is unchanged:
    /// results are reduced in gallery order either way.
    pub fn with_parallel_scan(mut self, parallel_scan: bool) -> Self {
        self.parallel_scan = parallel_scan;
        self
    }

    pub fn matcher(&self) -> &M {
        &self.matcher
    }

    pub fn acceptance_threshold(&self) -> usize {
        self.acceptance_threshold
    }

    /// Verify `probe` against every record in `gallery`.
    ///
    /// The first record (in gallery order) with the highest score is the
    /// candidate; later records with an equal score do not replace it.
    pub fn verify(&self, probe: &DescriptorSet, gallery: &[EnrollmentRecord]) -> ScanReport {
        if probe.is_empty() {
            tracing::debug!("empty probe; gallery scan skipped");
            return ScanReport {
                result: VerificationResult::rejected(0),
                comparisons: 0,
                skipped: Vec::new(),
            };
        }

        let comparisons: Vec<Comparison> = if self.parallel_scan {
            gallery
                .par_iter()
                .map(|record| self.matcher.compare(probe, &record.descriptors))
                .collect()
        } else {
            gallery
                .iter()
                .map(|record| self.matcher.compare(probe, &record.descriptors))
                .collect()
        };

        let mut best: Option<(usize, usize)> = None;
        let mut skipped = Vec::new();
        for (idx, (record, comparison)) in gallery.iter().zip(&comparisons).enumerate() {
            match *comparison {
                Comparison::Scored(score) => {
                    if best.map_or(true, |(_, best_score)| score > best_score) {
                        best = Some((idx, score));
                    }
                }
                Comparison::Skipped(reason) => {
                    tracing::warn!(
                        record_id = record.id,
                        identity = %record.identity,
                        %reason,
                        "gallery record skipped"
                    );
                    skipped.push(SkippedRecord {
                        record_id: record.id,
                        identity: record.identity.clone(),
                        reason,
                    });
                }
            }
        }

        let result = match best {
            Some((idx, score)) if score >= self.acceptance_threshold => {
                let record = &gallery[idx];
                tracing::info!(
                    record_id = record.id,
                    identity = %record.identity,
                    score,
                    threshold = self.acceptance_threshold,
                    "probe accepted"
                );
                VerificationResult {
                    matched: Some(MatchedIdentity::from(record)),
                    score,
                    preview: None,
                }
            }
            _ => {
                let score = best.map_or(0, |(_, score)| score);
                tracing::info!(
                    score,
                    threshold = self.acceptance_threshold,
                    gallery = gallery.len(),
                    "probe rejected"
                );
                VerificationResult::rejected(score)
            }
        };

        ScanReport {
            result,
            comparisons: comparisons.len(),
            skipped,
        }
    }
}
