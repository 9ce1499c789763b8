//! Request and response bodies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::layout::Layout;

/// Query string of `POST /detect`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectParams {
    /// Signed so that zero and negative values reach validation and get a 400.
    pub num_versions: Option<i64>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub detector: String,
    pub model_loaded: bool,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub success: bool,
    pub categories: BTreeMap<String, Vec<String>>,
}

/// Success body of `POST /detect`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectResponse {
    pub success: bool,
    pub message: String,
    /// URLs under `/output`, detection image first, then `layout_1.jpg`...
    pub output_images: Vec<String>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedObjectInfo {
    pub name: String,
    /// Room group, or `"other"`.
    pub category: String,
    pub class_id: u32,
    pub confidence: f64,
    /// Pixel corners `[x1, y1, x2, y2]`.
    pub bbox: [f64; 4],
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Success body of `POST /detect-objects`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectObjectsResponse {
    pub success: bool,
    pub objects: Vec<DetectedObjectInfo>,
    pub total_objects: usize,
    pub image_dimensions: ImageDimensions,
    pub processed_at: String,
}

/// Body of every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}
