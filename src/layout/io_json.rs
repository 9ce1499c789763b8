//! Reading and writing layouts as JSON.
//!
//! The pipeline drops the extracted layout next to its intermediate files
//! (`layout.json`) so a run can be inspected or re-rendered later. The CLI
//! `rearrange` and `validate` commands read the same format.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::model::{Layout, LayoutVariant};
use crate::error::RedecorError;

/// Reads a layout from a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be opened or is not a layout array.
pub fn read_layout_json(path: &Path) -> Result<Layout, RedecorError> {
    let file = File::open(path).map_err(RedecorError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| RedecorError::LayoutJsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a layout as pretty-printed JSON, creating parent directories.
pub fn write_layout_json(path: &Path, layout: &Layout) -> Result<(), RedecorError> {
    write_pretty(path, layout)
}

/// Writes a list of variants as a JSON array of layouts.
pub fn write_variants_json(path: &Path, variants: &[LayoutVariant]) -> Result<(), RedecorError> {
    write_pretty(path, variants)
}

fn write_pretty<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), RedecorError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(path).map_err(RedecorError::Io)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| {
        RedecorError::LayoutJsonWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Parses a layout from a JSON string.
pub fn from_json_str(json: &str) -> Result<Layout, serde_json::Error> {
    serde_json::from_str(json)
}

/// Parses a layout from raw bytes.
pub fn from_json_slice(bytes: &[u8]) -> Result<Layout, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Serializes a layout to a pretty-printed JSON string.
pub fn to_json_string(layout: &Layout) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(layout)
}

/// Serializes variants to a pretty-printed JSON string (an array of arrays).
pub fn variants_to_json_string(variants: &[LayoutVariant]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(variants)
}
