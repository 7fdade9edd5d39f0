use crate::engine::{EngineError, EngineHandle};
use base64::prelude::BASE64_STANDARD;
use base64::Engine as _;
use iris_core::attendance::AttendanceError;
use iris_core::preprocess::PreprocessError;
use iris_core::PipelineError;
use zbus::interface;

/// D-Bus interface for the attendance daemon.
///
/// Bus name: org.irisattend.Attendance1
/// Object path: /org/irisattend/Attendance1
pub struct AttendanceService {
    engine: EngineHandle,
}

impl AttendanceService {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }
}

#[interface(name = "org.irisattend.Attendance1")]
impl AttendanceService {
    /// Enroll a user from a base64 image (a `data:` URL prefix is accepted).
    async fn register(
        &self,
        user_id: &str,
        name: &str,
        department: &str,
        image_b64: &str,
    ) -> zbus::fdo::Result<String> {
        tracing::info!(user_id, display_name = name, department, "register requested");
        let image = decode_payload(image_b64)?;
        let reply = self
            .engine
            .register(user_id.to_string(), name.to_string(), department.to_string(), image)
            .await
            .map_err(to_fdo)?;

        Ok(serde_json::json!({
            "status": "registered",
            "record_id": reply.record_id,
            "descriptors": reply.descriptor_count,
            "regions": reply.regions,
            "image": preview_data_url(&reply.preview_jpeg),
        })
        .to_string())
    }

    /// Verify a base64 image against all enrollments; logs attendance on a match.
    async fn mark_attendance(&self, image_b64: &str) -> zbus::fdo::Result<String> {
        tracing::info!("mark_attendance requested");
        let image = decode_payload(image_b64)?;
        let reply = self.engine.check_in(image).await.map_err(to_fdo)?;

        let status = if reply.matched.is_some() { "present" } else { "unknown" };
        Ok(serde_json::json!({
            "status": status,
            "match": reply.matched,
            "score": reply.score,
            "event_id": reply.event_id,
            "timestamp": reply.timestamp,
            "skipped_records": reply.skipped_records,
            "image": preview_data_url(&reply.preview_jpeg),
        })
        .to_string())
    }

    /// Attendance events, newest first.
    async fn attendance_log(&self) -> zbus::fdo::Result<String> {
        let log = self.engine.attendance_log(None).await.map_err(to_fdo)?;
        serde_json::to_string(&log).map_err(|e| zbus::fdo::Error::Failed(e.to_string()))
    }

    async fn list_enrollments(&self) -> zbus::fdo::Result<String> {
        let list = self.engine.list_enrollments().await.map_err(to_fdo)?;
        serde_json::to_string(&list).map_err(|e| zbus::fdo::Error::Failed(e.to_string()))
    }

    /// Return daemon status information.
    async fn status(&self) -> zbus::fdo::Result<String> {
        let status = self.engine.status().await.map_err(to_fdo)?;
        Ok(serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "engine": status,
        })
        .to_string())
    }
}

/// Decode a base64 payload, stripping a `data:<mime>;base64,` prefix if present.
fn decode_payload(payload: &str) -> zbus::fdo::Result<Vec<u8>> {
    let payload = payload.trim();
    let body = match payload.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, body)| body).unwrap_or(""),
        None => payload,
    };
    if body.is_empty() {
        return Err(zbus::fdo::Error::InvalidArgs("no image supplied".into()));
    }
    BASE64_STANDARD
        .decode(body)
        .map_err(|e| zbus::fdo::Error::InvalidArgs(format!("image is not valid base64: {e}")))
}

fn preview_data_url(jpeg: &[u8]) -> Option<String> {
    (!jpeg.is_empty()).then(|| format!("data:image/jpeg;base64,{}", BASE64_STANDARD.encode(jpeg)))
}

/// Map engine failures onto D-Bus errors. Caller mistakes become `InvalidArgs`.
fn to_fdo(err: EngineError) -> zbus::fdo::Error {
    tracing::warn!(error = %err, "request failed");
    match err {
        EngineError::Decode(e) => zbus::fdo::Error::InvalidArgs(e.to_string()),
        EngineError::Attendance(e @ AttendanceError::MissingField(_))
        | EngineError::Attendance(
            e @ AttendanceError::Pipeline(PipelineError::Preprocess(PreprocessError::UnsupportedGeometry { .. })),
        ) => zbus::fdo::Error::InvalidArgs(e.to_string()),
        other => zbus::fdo::Error::Failed(other.to_string()),
    }
}
