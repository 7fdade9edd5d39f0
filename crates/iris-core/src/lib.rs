//! iris-core — eye-region verification engine.
//!
//! Normalises a frame to a canonical grayscale width, extracts oriented
//! binary descriptors and verifies them against an enrolled gallery with
//! cross-checked Hamming matching.

pub mod attendance;
pub mod config;
pub mod detector;
pub mod features;
pub mod matcher;
mod pattern;
pub mod pipeline;
pub mod policy;
pub mod preprocess;
pub mod types;

pub use attendance::{check_in, enroll, AttendanceError, EnrollmentRequest, EnrollmentStore};
pub use config::{ConfigError, EngineConfig};
pub use matcher::{BruteForceMatcher, Comparison, Matcher, SkipReason};
pub use pipeline::{Analysis, Pipeline, PipelineError};
pub use policy::{ScanReport, VerificationPolicy};
pub use types::{BoundingBox, Descriptor, DescriptorSet, EnrollmentRecord, MatchedIdentity, VerificationResult};
