//! Enrollment and check-in flows over a storage collaborator.
//!
//! The core never touches storage directly: it reads the gallery and writes
//! records through [`EnrollmentStore`], before and after the pure pipeline
//! and policy calls.

use crate::features::ExtractError;
use crate::pipeline::{Pipeline, PipelineError};
use crate::policy::SkippedRecord;
use crate::types::{BoundingBox, DescriptorSet, EnrollmentRecord, VerificationResult};
use chrono::{DateTime, Utc};
use image::{DynamicImage, RgbImage};
use thiserror::Error;

/// Storage operations the flows depend on.
pub trait EnrollmentStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Every enrollment, in insertion order. Must be a consistent snapshot.
    fn fetch_all_enrollments(&self) -> Result<Vec<EnrollmentRecord>, Self::Error>;

    /// Persist a new enrollment and return its record id.
    fn append_enrollment(
        &self,
        identity: &str,
        name: &str,
        attribute: &str,
        descriptors: &DescriptorSet,
    ) -> Result<i64, Self::Error>;

    /// Record that `record_id` checked in at `timestamp`; returns the event id.
    fn append_attendance_event(&self, record_id: i64, timestamp: DateTime<Utc>) -> Result<i64, Self::Error>;
}

#[derive(Error, Debug)]
pub enum AttendanceError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("storage error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AttendanceError {
    fn store<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        AttendanceError::Store(Box::new(err))
    }

    /// True when the frame decoded but yielded no keypoints.
    pub fn is_no_features(&self) -> bool {
        matches!(
            self,
            AttendanceError::Pipeline(PipelineError::Extract(ExtractError::NoFeaturesDetected))
        )
    }
}

/// Who is being enrolled.
#[derive(Debug, Clone, Copy)]
pub struct EnrollmentRequest<'a> {
    pub identity: &'a str,
    pub name: &'a str,
    pub attribute: &'a str,
}

impl EnrollmentRequest<'_> {
    fn validate(&self) -> Result<(), AttendanceError> {
        for (field, value) in [
            ("identity", self.identity),
            ("name", self.name),
            ("attribute", self.attribute),
        ] {
            if value.trim().is_empty() {
                return Err(AttendanceError::MissingField(field));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct EnrollOutcome {
    pub record_id: i64,
    pub descriptor_count: usize,
    pub regions: Vec<BoundingBox>,
    pub preview: RgbImage,
}

#[derive(Debug, Clone)]
pub struct CheckInOutcome {
    /// Verification result, preview attached.
    pub result: VerificationResult,
    /// Attendance event written for an accepted check-in.
    pub event_id: Option<i64>,
    pub regions: Vec<BoundingBox>,
    pub skipped: Vec<SkippedRecord>,
}

/// Extract descriptors from `image` and store them under `request`.
///
/// A frame without keypoints is refused; nothing is written.
pub fn enroll<S: EnrollmentStore>(
    pipeline: &Pipeline,
    store: &S,
    request: EnrollmentRequest<'_>,
    image: &DynamicImage,
) -> Result<EnrollOutcome, AttendanceError> {
    request.validate()?;
    let analysis = pipeline.analyze(image)?;

    let record_id = store
        .append_enrollment(
            request.identity.trim(),
            request.name.trim(),
            request.attribute.trim(),
            analysis.descriptors(),
        )
        .map_err(AttendanceError::store)?;

    tracing::info!(
        record_id,
        identity = request.identity,
        descriptors = analysis.descriptors().len(),
        regions = analysis.regions.len(),
        "enrolled"
    );

    Ok(EnrollOutcome {
        record_id,
        descriptor_count: analysis.descriptors().len(),
        regions: analysis.regions,
        preview: analysis.preview,
    })
}

/// Verify `image` against the stored gallery and log attendance on a match.
pub fn check_in<S: EnrollmentStore>(
    pipeline: &Pipeline,
    store: &S,
    image: &DynamicImage,
    now: DateTime<Utc>,
) -> Result<CheckInOutcome, AttendanceError> {
    let analysis = pipeline.analyze(image)?;
    let gallery = store.fetch_all_enrollments().map_err(AttendanceError::store)?;
    let report = pipeline.verify(analysis.descriptors(), &gallery);

    let event_id = match &report.result.matched {
        Some(identity) => Some(
            store
                .append_attendance_event(identity.record_id, now)
                .map_err(AttendanceError::store)?,
        ),
        None => None,
    };

    Ok(CheckInOutcome {
        result: report.result.with_preview(analysis.preview),
        event_id,
        regions: analysis.regions,
        skipped: report.skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use image::{GrayImage, Luma};
    use std::cell::RefCell;

    #[derive(Default)]
    struct MemoryStore {
        records: RefCell<Vec<EnrollmentRecord>>,
        events: RefCell<Vec<(i64, DateTime<Utc>)>>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("memory store failure")]
    struct MemoryError;

    impl EnrollmentStore for MemoryStore {
        type Error = MemoryError;

        fn fetch_all_enrollments(&self) -> Result<Vec<EnrollmentRecord>, MemoryError> {
            Ok(self.records.borrow().clone())
        }

        fn append_enrollment(
            &self,
            identity: &str,
            name: &str,
            attribute: &str,
            descriptors: &DescriptorSet,
        ) -> Result<i64, MemoryError> {
            let mut records = self.records.borrow_mut();
            let id = records.len() as i64 + 1;
            records.push(EnrollmentRecord {
                id,
                identity: identity.into(),
                name: name.into(),
                attribute: attribute.into(),
                descriptors: descriptors.clone(),
                created_at: String::new(),
            });
            Ok(id)
        }

        fn append_attendance_event(&self, record_id: i64, timestamp: DateTime<Utc>) -> Result<i64, MemoryError> {
            let mut events = self.events.borrow_mut();
            events.push((record_id, timestamp));
            Ok(events.len() as i64)
        }
    }

    fn blank_frame() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(640, 480, Luma([120])))
    }

    /// Blocky hash noise; different seeds give unrelated texture.
    fn textured_frame(seed: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(640, 480, |x, y| {
            let mut v = (x / 6).wrapping_mul(374_761_393) ^ (y / 6).wrapping_mul(668_265_263) ^ seed;
            v = (v ^ (v >> 13)).wrapping_mul(1_274_126_177);
            Luma([(v >> 24) as u8 / 2 + 40])
        }))
    }

    fn request(identity: &str) -> EnrollmentRequest<'_> {
        EnrollmentRequest { identity, name: identity, attribute: "Physics" }
    }

    #[test]
    fn test_enroll_requires_all_fields() {
        let pipeline = Pipeline::new(EngineConfig::default()).unwrap();
        let store = MemoryStore::default();
        let request = EnrollmentRequest { identity: "S-1", name: "  ", attribute: "Physics" };

        let err = enroll(&pipeline, &store, request, &blank_frame()).unwrap_err();
        assert!(matches!(err, AttendanceError::MissingField("name")));
        assert!(store.records.borrow().is_empty());
    }

    #[test]
    fn test_enroll_without_features_writes_nothing() {
        let pipeline = Pipeline::new(EngineConfig::default()).unwrap();
        let store = MemoryStore::default();
        let request = EnrollmentRequest { identity: "S-1", name: "Ada", attribute: "Physics" };

        let err = enroll(&pipeline, &store, request, &blank_frame()).unwrap_err();
        assert!(err.is_no_features(), "got {err:?}");
        assert!(store.records.borrow().is_empty());
    }

    #[test]
    fn test_check_in_logs_one_event_for_matched_record() {
        let pipeline = Pipeline::new(EngineConfig::default()).unwrap();
        let store = MemoryStore::default();
        let (ada, brin) = (textured_frame(11), textured_frame(977));
        enroll(&pipeline, &store, request("S-2"), &brin).unwrap();
        let enrolled = enroll(&pipeline, &store, request("S-1"), &ada).unwrap();
        assert_eq!(enrolled.record_id, 2);
        assert!(enrolled.descriptor_count > 0);

        let now = Utc::now();
        let outcome = check_in(&pipeline, &store, &ada, now).unwrap();
        let matched = outcome.result.matched.expect("enrolled frame should be accepted");
        assert_eq!(matched.record_id, enrolled.record_id);
        assert_eq!(matched.identity, "S-1");
        assert_eq!(outcome.event_id, Some(1));
        assert_eq!(*store.events.borrow(), vec![(enrolled.record_id, now)]);
        assert!(outcome.result.preview.is_some());
    }

    #[test]
    fn test_rejected_check_in_writes_no_event() {
        let mut config = EngineConfig::default();
        config.matching.acceptance_threshold = config.features.max_features + 1;
        let pipeline = Pipeline::new(config).unwrap();
        let store = MemoryStore::default();
        let frame = textured_frame(11);
        enroll(&pipeline, &store, request("S-1"), &frame).unwrap();

        let outcome = check_in(&pipeline, &store, &frame, Utc::now()).unwrap();
        assert!(outcome.result.matched.is_none());
        assert!(outcome.result.score > 0);
        assert_eq!(outcome.event_id, None);
        assert!(store.events.borrow().is_empty());
    }

    #[test]
    fn test_check_in_without_features_is_not_a_rejection() {
        let pipeline = Pipeline::new(EngineConfig::default()).unwrap();
        let store = MemoryStore::default();
        let err = check_in(&pipeline, &store, &blank_frame(), Utc::now()).unwrap_err();
        assert!(err.is_no_features());
        assert!(store.events.borrow().is_empty());
    }
}
