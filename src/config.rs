//! Configuration file loading.
//!
//! All sections are optional; anything missing takes its default. CLI flags
//! are applied on top by the command handlers.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::detect::DetectorConfig;
use crate::error::RedecorError;
use crate::rearrange::RearrangeOptions;
use crate::render::RenderOptions;

/// Default upload limit: 20 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub detector: DetectorConfig,
    pub rearrange: RearrangeOptions,
    pub render: RenderOptions,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    /// Allowed browser origins. Empty allows any origin.
    pub cors_origins: Vec<String>,
    pub max_upload_bytes: usize,
    /// Upper bound on `num_versions` a request may ask for.
    pub max_versions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8000".to_string(),
            cors_origins: vec!["http://localhost:5173".to_string()],
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_versions: 16,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Rendered images; served under `/output`.
    pub output_dir: PathBuf,
    /// Uploaded originals.
    pub temp_dir: PathBuf,
    /// Per-run `layout.json` files.
    pub intermediate_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data/output_images"),
            temp_dir: PathBuf::from("data/temp"),
            intermediate_dir: PathBuf::from("data/intermediate"),
        }
    }
}

impl Config {
    /// Reads a YAML config file.
    pub fn load(path: &Path) -> Result<Self, RedecorError> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&contents).map_err(|source| RedecorError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Loads `path` if given, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, RedecorError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file is a valid, all-default config.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    /// Rejects settings that would only fail later, mid-request.
    pub fn validate(&self) -> Result<(), RedecorError> {
        let fail = |msg: String| -> Result<(), RedecorError> {
            Err(RedecorError::InvalidConfig(msg))
        };

        if self.rearrange.num_versions == 0 {
            return fail("rearrange.num_versions must be greater than 0".to_string());
        }
        if self.server.max_versions < self.rearrange.num_versions {
            return fail(format!(
                "server.max_versions ({}) is below rearrange.num_versions ({})",
                self.server.max_versions, self.rearrange.num_versions
            ));
        }
        if self.detector.input_size == 0 {
            return fail("detector.input_size must be greater than 0".to_string());
        }
        for (name, value) in [
            ("confidence_threshold", self.detector.confidence_threshold),
            ("iou_threshold", self.detector.iou_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return fail(format!("detector.{} must be within [0, 1], got {}", name, value));
            }
        }
        if self.render.line_width == 0 {
            return fail("render.line_width must be greater than 0".to_string());
        }
        Ok(())
    }
}
