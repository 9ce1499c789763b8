//! HTTP request handlers.

use std::path::{Path, PathBuf};

use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::QueryRejection,
        Multipart, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use image::RgbImage;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::types::{
    CategoriesResponse, DetectObjectsResponse, DetectParams, DetectResponse, DetectedObjectInfo,
    ErrorResponse, HealthResponse, ImageDimensions,
};
use super::AppState;
use crate::detect::{class_name, room_category, ROOM_CATEGORIES};
use crate::error::{ErrorKind, RedecorError};
use crate::layout::extract_layout;
use crate::pipeline::{run_pipeline_on_image, PipelineOptions, PipelineOutput, LAYOUT_JSON_NAME};
use crate::rearrange::{num_versions_from_i64, RearrangeOptions};
use crate::render;

/// Multipart field carrying the image.
const UPLOAD_FIELD: &str = "file";

/// A failed request: status plus a message for the `error` field.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<RedecorError> for ApiError {
    fn from(err: RedecorError) -> Self {
        match err.kind() {
            ErrorKind::InvalidArgument => Self::bad_request(err.to_string()),
            ErrorKind::UpstreamFailure => Self::internal(err.to_string()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// Keeps the multipart status, so an oversized body is a 413.
fn multipart_error(context: &str, err: MultipartError) -> ApiError {
    ApiError {
        status: err.status(),
        message: format!("{context}: {}", err.body_text()),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, "request failed: {}", self.message);
        } else {
            warn!(status = %self.status, "request rejected: {}", self.message);
        }
        let body = ErrorResponse {
            success: false,
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

struct Upload {
    file_name: Option<String>,
    bytes: Bytes,
}

impl Upload {
    /// File stem safe to use in output names.
    fn stem(&self) -> String {
        let stem: String = self
            .file_name
            .as_deref()
            .and_then(|name| Path::new(name).file_stem())
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
            .collect();
        if stem.is_empty() {
            "upload".to_string()
        } else {
            stem
        }
    }

    fn extension(&self) -> Option<String> {
        self.file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(str::to_ascii_lowercase)
    }

    fn decode(&self) -> Result<RgbImage, RedecorError> {
        let image = image::load_from_memory(&self.bytes).map_err(|source| {
            RedecorError::ImageDecode {
                path: PathBuf::from(self.file_name.as_deref().unwrap_or(UPLOAD_FIELD)),
                source,
            }
        })?;
        Ok(image.to_rgb8())
    }
}

/// An upload written to `temp_dir`; the file is removed on drop.
struct SavedUpload(PathBuf);

impl Drop for SavedUpload {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.0) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.0.display(), "failed to remove upload: {e}");
            }
        }
    }
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Malformed multipart body", e))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error("Failed to read upload", e))?;
        if bytes.is_empty() {
            return Err(ApiError::bad_request("Uploaded file is empty"));
        }
        return Ok(Upload { file_name, bytes });
    }
    Err(ApiError::bad_request("No file uploaded"))
}

fn resolve_num_versions(params: &DetectParams, state: &AppState) -> Result<usize, ApiError> {
    let num_versions = match params.num_versions {
        Some(requested) => num_versions_from_i64(requested)?,
        None => state.config.rearrange.num_versions,
    };
    let max = state.config.server.max_versions;
    if num_versions > max {
        return Err(ApiError::bad_request(format!(
            "num_versions must be at most {} (got {})",
            max, num_versions
        )));
    }
    Ok(num_versions)
}

/// `GET /health`
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        detector: state.detector_name.to_string(),
        model_loaded: true,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `GET /categories`
pub async fn list_categories() -> impl IntoResponse {
    let categories = ROOM_CATEGORIES
        .iter()
        .map(|(group, names)| {
            (
                group.to_string(),
                names.iter().map(|n| n.to_string()).collect(),
            )
        })
        .collect();
    Json(CategoriesResponse {
        success: true,
        categories,
    })
}

/// `POST /detect`: detect, rearrange and render one uploaded image.
///
/// Each request writes into its own `<output_dir>/<run id>/` so concurrent
/// uploads never share `layout_N.jpg` files.
pub async fn detect_and_rearrange(
    State(state): State<AppState>,
    params: Result<Query<DetectParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DetectResponse>, ApiError> {
    let Query(params) = params?;
    let num_versions = resolve_num_versions(&params, &state)?;
    let upload = read_upload(multipart?).await?;

    let run_id = Uuid::new_v4().to_string();
    info!(
        run = %run_id,
        file = ?upload.file_name,
        bytes = upload.bytes.len(),
        num_versions,
        "detect request"
    );

    let paths = &state.config.paths;
    let saved = paths.temp_dir.join(match upload.extension() {
        Some(ext) => format!("{run_id}.{ext}"),
        None => run_id.clone(),
    });
    tokio::fs::create_dir_all(&paths.temp_dir)
        .await
        .map_err(RedecorError::from)?;
    tokio::fs::write(&saved, &upload.bytes)
        .await
        .map_err(RedecorError::from)?;
    let saved = SavedUpload(saved);

    let output_dir = paths.output_dir.join(&run_id);
    let opts = PipelineOptions {
        rearrange: RearrangeOptions {
            num_versions,
            seed: params.seed.or(state.config.rearrange.seed),
        },
        render: state.config.render.clone(),
        save_detected: true,
        layout_json: Some(paths.intermediate_dir.join(&run_id).join(LAYOUT_JSON_NAME)),
    };

    let stem = upload.stem();
    let detector = state.detector.clone();
    let output: PipelineOutput = tokio::task::spawn_blocking(move || {
        let image = render::load_rgb_image(&saved.0)?;
        drop(saved);
        let mut detector = detector
            .lock()
            .map_err(|_| RedecorError::Inference("detector lock poisoned".to_string()))?;
        run_pipeline_on_image(&mut **detector, &image, &stem, &output_dir, &opts)
    })
    .await
    .map_err(|e| ApiError::internal(format!("pipeline task failed: {e}")))??;

    let output_images = output
        .images()
        .filter_map(|path| path.file_name().and_then(|n| n.to_str()))
        .map(|name| format!("/output/{run_id}/{name}"))
        .collect();

    info!(run = %run_id, objects = output.layout.len(), "detect request done");
    Ok(Json(DetectResponse {
        success: true,
        message: "Image processed successfully".to_string(),
        output_images,
        layout: output.layout,
    }))
}

/// `POST /detect-objects`: detection only, boxes in pixels.
pub async fn detect_objects(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DetectObjectsResponse>, ApiError> {
    let upload = read_upload(multipart?).await?;

    let detector = state.detector.clone();
    let response = tokio::task::spawn_blocking(move || {
        let image = upload.decode()?;
        let (width, height) = image.dimensions();
        let detections = {
            let mut detector = detector
                .lock()
                .map_err(|_| RedecorError::Inference("detector lock poisoned".to_string()))?;
            detector.detect(&image)?
        };

        let layout = extract_layout(&detections, width, height);
        let objects: Vec<DetectedObjectInfo> = layout
            .iter()
            .map(|obj| {
                let name = class_name(obj.class_id);
                DetectedObjectInfo {
                    name: name.to_string(),
                    category: room_category(name).unwrap_or("other").to_string(),
                    class_id: obj.class_id.as_u32(),
                    confidence: obj.confidence,
                    bbox: obj.bbox.to_array(),
                }
            })
            .collect();

        Ok::<_, RedecorError>(DetectObjectsResponse {
            success: true,
            total_objects: objects.len(),
            objects,
            image_dimensions: ImageDimensions { width, height },
            processed_at: chrono::Utc::now().to_rfc3339(),
        })
    })
    .await
    .map_err(|e| ApiError::internal(format!("detection task failed: {e}")))??;

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: Option<&str>) -> Upload {
        Upload {
            file_name: name.map(str::to_string),
            bytes: Bytes::from_static(b"x"),
        }
    }

    #[test]
    fn upload_names_are_sanitized() {
        assert_eq!(upload(Some("living room.JPG")).stem(), "livingroom");
        assert_eq!(upload(Some("../../etc/passwd")).stem(), "passwd");
        assert_eq!(upload(Some("...")).stem(), "upload");
        assert_eq!(upload(None).stem(), "upload");
        assert_eq!(upload(Some("room.JPG")).extension().as_deref(), Some("jpg"));
        assert_eq!(upload(Some("room")).extension(), None);
    }

    #[test]
    fn saved_upload_is_removed_on_drop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run.png");
        std::fs::write(&path, b"x").expect("write");

        drop(SavedUpload(path.clone()));
        assert!(!path.exists());

        // Already gone: dropping again is quiet.
        drop(SavedUpload(path));
    }

    #[test]
    fn error_kinds_map_to_status_codes() {
        let bad: ApiError =
            RedecorError::invalid_argument("num_versions must be greater than 0").into();
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);

        let broken: ApiError = RedecorError::Inference("boom".to_string()).into();
        assert_eq!(broken.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(broken.message, "Inference error: boom");
    }
}
