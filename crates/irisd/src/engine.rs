use chrono::{SecondsFormat, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use iris_core::attendance::{check_in, enroll, AttendanceError, EnrollmentRequest};
use iris_core::preprocess::{decode_image, PreprocessError};
use iris_core::{MatchedIdentity, Pipeline};
use iris_store::{AttendanceEntry, EnrollmentSummary, Store, StoreError};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

const PREVIEW_JPEG_QUALITY: u8 = 85;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Decode(#[from] PreprocessError),
    #[error(transparent)]
    Attendance(#[from] AttendanceError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("preview encoding failed: {0}")]
    Preview(#[from] image::ImageError),
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// Result of a registration.
#[derive(Debug)]
pub struct RegisterReply {
    pub record_id: i64,
    pub descriptor_count: usize,
    pub regions: usize,
    pub preview_jpeg: Vec<u8>,
}

/// Result of an attendance check-in. A rejection is not an error.
#[derive(Debug)]
pub struct CheckInReply {
    pub matched: Option<MatchedIdentity>,
    pub score: usize,
    pub event_id: Option<i64>,
    pub timestamp: String,
    pub skipped_records: usize,
    pub preview_jpeg: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct EngineStatus {
    pub enrollments: usize,
    pub acceptance_threshold: usize,
    pub good_match_distance: u32,
    pub max_features: usize,
    pub crop_to_detected_region: bool,
}

/// Messages sent from D-Bus handlers to the engine thread.
enum EngineRequest {
    Register {
        identity: String,
        name: String,
        attribute: String,
        image: Vec<u8>,
        reply: oneshot::Sender<Result<RegisterReply, EngineError>>,
    },
    CheckIn {
        image: Vec<u8>,
        reply: oneshot::Sender<Result<CheckInReply, EngineError>>,
    },
    Log {
        limit: Option<usize>,
        reply: oneshot::Sender<Result<Vec<AttendanceEntry>, EngineError>>,
    },
    List {
        reply: oneshot::Sender<Result<Vec<EnrollmentSummary>, EngineError>>,
    },
    Status {
        reply: oneshot::Sender<Result<EngineStatus, EngineError>>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    async fn call<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T, EngineError>>) -> EngineRequest,
    ) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }

    /// Enroll an identity from an encoded image.
    pub async fn register(
        &self,
        identity: String,
        name: String,
        attribute: String,
        image: Vec<u8>,
    ) -> Result<RegisterReply, EngineError> {
        self.call(|reply| EngineRequest::Register {
            identity,
            name,
            attribute,
            image,
            reply,
        })
        .await
    }

    /// Verify an encoded image against the gallery and log attendance on a match.
    pub async fn check_in(&self, image: Vec<u8>) -> Result<CheckInReply, EngineError> {
        self.call(|reply| EngineRequest::CheckIn { image, reply }).await
    }

    pub async fn attendance_log(&self, limit: Option<usize>) -> Result<Vec<AttendanceEntry>, EngineError> {
        self.call(|reply| EngineRequest::Log { limit, reply }).await
    }

    pub async fn list_enrollments(&self) -> Result<Vec<EnrollmentSummary>, EngineError> {
        self.call(|reply| EngineRequest::List { reply }).await
    }

    pub async fn status(&self) -> Result<EngineStatus, EngineError> {
        self.call(|reply| EngineRequest::Status { reply }).await
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// Opens the database synchronously so startup fails fast, then serves
/// requests one at a time: a registration never interleaves with a scan.
pub fn spawn_engine(pipeline: Pipeline, db_path: &Path) -> Result<EngineHandle, EngineError> {
    let store = Store::open(db_path)?;
    tracing::info!(
        path = %db_path.display(),
        enrollments = store.enrollment_count()?,
        "attendance store ready"
    );

    let (tx, mut rx) = mpsc::channel::<EngineRequest>(8);

    std::thread::Builder::new()
        .name("iris-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                handle_request(&pipeline, &store, req);
            }
            tracing::info!("engine thread exiting");
        })
        .map_err(EngineError::Spawn)?;

    Ok(EngineHandle { tx })
}

fn handle_request(pipeline: &Pipeline, store: &Store, req: EngineRequest) {
    match req {
        EngineRequest::Register {
            identity,
            name,
            attribute,
            image,
            reply,
        } => {
            let request = EnrollmentRequest {
                identity: &identity,
                name: &name,
                attribute: &attribute,
            };
            let _ = reply.send(run_register(pipeline, store, request, &image));
        }
        EngineRequest::CheckIn { image, reply } => {
            let _ = reply.send(run_check_in(pipeline, store, &image));
        }
        EngineRequest::Log { limit, reply } => {
            let _ = reply.send(store.attendance_log(limit).map_err(EngineError::from));
        }
        EngineRequest::List { reply } => {
            let _ = reply.send(store.list_enrollments().map_err(EngineError::from));
        }
        EngineRequest::Status { reply } => {
            let result = store.enrollment_count().map(|enrollments| {
                let config = pipeline.config();
                EngineStatus {
                    enrollments,
                    acceptance_threshold: config.matching.acceptance_threshold,
                    good_match_distance: config.matching.good_match_distance,
                    max_features: config.features.max_features,
                    crop_to_detected_region: config.detector.crop_to_detected_region,
                }
            });
            let _ = reply.send(result.map_err(EngineError::from));
        }
    }
}

fn run_register(
    pipeline: &Pipeline,
    store: &Store,
    request: EnrollmentRequest<'_>,
    image: &[u8],
) -> Result<RegisterReply, EngineError> {
    let image = decode_image(image)?;
    let outcome = enroll(pipeline, store, request, &image)?;
    Ok(RegisterReply {
        record_id: outcome.record_id,
        descriptor_count: outcome.descriptor_count,
        regions: outcome.regions.len(),
        preview_jpeg: encode_jpeg(&outcome.preview)?,
    })
}

fn run_check_in(pipeline: &Pipeline, store: &Store, image: &[u8]) -> Result<CheckInReply, EngineError> {
    let image = decode_image(image)?;
    let now = Utc::now();
    let outcome = check_in(pipeline, store, &image, now)?;
    let preview_jpeg = match &outcome.result.preview {
        Some(preview) => encode_jpeg(preview)?,
        None => Vec::new(),
    };
    Ok(CheckInReply {
        matched: outcome.result.matched,
        score: outcome.result.score,
        event_id: outcome.event_id,
        timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        skipped_records: outcome.skipped.len(),
        preview_jpeg,
    })
}

fn encode_jpeg(preview: &RgbImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, PREVIEW_JPEG_QUALITY).encode_image(preview)?;
    Ok(buf)
}
