//! Object detection backends.
//!
//! A [`Detector`] turns an RGB image into [`Detection`]s with boxes in
//! normalized `[0, 1]` image coordinates. Two backends exist:
//!
//! - `YoloDetector` runs a YOLOv8 ONNX export through ONNX Runtime. It is
//!   compiled only with the `onnx` cargo feature.
//! - [`MockDetector`] invents room objects without a model, for demos and
//!   tests.
//!
//! Model files are never loaded blindly: [`verify_model_source`] either
//! checks the file against a pinned SHA-256 or requires the caller to say
//! explicitly that the source is trusted.

mod classes;
mod mock;
#[cfg(feature = "onnx")]
mod yolo;

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use image::RgbImage;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

pub use classes::{
    class_id_for_name, class_name, room_category, COCO_CLASSES, ROOM_CATEGORIES,
};
pub use mock::MockDetector;
#[cfg(feature = "onnx")]
pub use yolo::YoloDetector;

use crate::error::RedecorError;
use crate::layout::{BBoxXYXY, ClassId, Normalized};

/// One object found by a detector.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Detection {
    pub class_id: ClassId,
    pub class_name: String,
    pub confidence: f32,
    /// Corners as fractions of the image width and height.
    pub bbox: BBoxXYXY<Normalized>,
}

/// Something that finds objects in an image.
///
/// `detect` takes `&mut self` because inference sessions keep mutable
/// state between runs.
pub trait Detector: Send {
    /// Short backend name for logs and `/health`.
    fn name(&self) -> &str;

    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>, RedecorError>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorBackend {
    #[default]
    Yolo,
    Mock,
}

/// Detector settings, the `detector:` section of the config file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub backend: DetectorBackend,
    pub model_path: PathBuf,
    /// Square input side the model was exported with.
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
    /// COCO class ids to keep; `None` keeps all.
    pub classes: Option<Vec<u32>>,
    pub trust_source: bool,
    pub sha256: Option<String>,
    pub mock_seed: Option<u64>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            backend: DetectorBackend::Yolo,
            model_path: PathBuf::from("models/yolov8n.onnx"),
            input_size: 640,
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 300,
            classes: None,
            trust_source: false,
            sha256: None,
            mock_seed: None,
        }
    }
}

impl DetectorConfig {
    pub fn load_options(&self) -> ModelLoadOptions {
        ModelLoadOptions {
            trust_source: self.trust_source,
            sha256: self.sha256.clone(),
        }
    }
}

/// How much to trust a model file before handing it to the runtime.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelLoadOptions {
    /// Skip checksum verification. Only set this for files you produced.
    pub trust_source: bool,
    /// Expected lowercase hex SHA-256 of the model file.
    pub sha256: Option<String>,
}

/// Lowercase hex SHA-256 of a file, streamed.
pub fn sha256_file(path: &Path) -> Result<String, RedecorError> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Gate a model file on its checksum unless the source is trusted.
///
/// A pinned checksum is checked even when `trust_source` is set, since
/// there is no reason to ignore one that was given.
pub fn verify_model_source(path: &Path, opts: &ModelLoadOptions) -> Result<(), RedecorError> {
    if !path.is_file() {
        return Err(RedecorError::ModelLoad {
            path: path.to_path_buf(),
            message: "model file not found".to_string(),
        });
    }

    let expected = match (&opts.sha256, opts.trust_source) {
        (Some(expected), _) => expected.trim().to_ascii_lowercase(),
        (None, true) => {
            warn!(model = %path.display(), "loading model without checksum verification");
            return Ok(());
        }
        (None, false) => {
            return Err(RedecorError::ModelLoad {
                path: path.to_path_buf(),
                message: "no sha256 configured for an untrusted model; pin its checksum \
                          or set trust_source"
                    .to_string(),
            });
        }
    };

    let actual = sha256_file(path)?;
    if actual != expected {
        return Err(RedecorError::ModelChecksumMismatch {
            path: path.to_path_buf(),
            expected,
            actual,
        });
    }

    debug!(model = %path.display(), "model checksum verified");
    Ok(())
}

/// Per-class non-maximum suppression.
///
/// Keeps the highest-confidence box of every cluster of same-class boxes
/// overlapping by more than `iou_threshold`. Boxes of different classes
/// never suppress each other. The result is sorted by confidence,
/// highest first.
pub fn non_maximum_suppression(mut detections: Vec<Detection>, iou_threshold: f64) -> Vec<Detection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<Detection> = Vec::with_capacity(detections.len());
    for det in detections {
        let suppressed = keep
            .iter()
            .any(|k| k.class_id == det.class_id && k.bbox.iou(&det.bbox) > iou_threshold);
        if !suppressed {
            keep.push(det);
        }
    }
    keep
}

/// Build the detector a config asks for.
pub fn build_detector(config: &DetectorConfig) -> Result<Box<dyn Detector>, RedecorError> {
    match config.backend {
        DetectorBackend::Mock => {
            info!(seed = ?config.mock_seed, "using mock detector");
            Ok(Box::new(MockDetector::new(config.mock_seed)))
        }
        DetectorBackend::Yolo => load_yolo(config),
    }
}

#[cfg(feature = "onnx")]
fn load_yolo(config: &DetectorConfig) -> Result<Box<dyn Detector>, RedecorError> {
    Ok(Box::new(YoloDetector::load(config)?))
}

#[cfg(not(feature = "onnx"))]
fn load_yolo(_config: &DetectorConfig) -> Result<Box<dyn Detector>, RedecorError> {
    Err(RedecorError::DetectorUnavailable(
        "built without the `onnx` feature; rebuild with `--features onnx` or use the mock backend"
            .to_string(),
    ))
}
