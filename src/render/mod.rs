//! Drawing layouts onto images.
//!
//! Every variant is drawn on its own copy of the source image and written as
//! `layout_{i+1}.jpg`; the annotated detection image goes to
//! `{stem}_detected.jpg`. Only object boxes are drawn.

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RedecorError;
use crate::layout::{DetectedObject, Layout, LayoutVariant};

/// Stroke settings, the `render:` section of the config file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Stroke width in pixels, drawn inward from the box edge.
    pub line_width: u32,
    pub color: [u8; 3],
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            line_width: 3,
            color: [255, 0, 0],
        }
    }
}

/// Output file name for the variant at `index` (zero-based).
pub fn variant_file_name(index: usize) -> String {
    format!("layout_{}.jpg", index + 1)
}

/// Output file name for the annotated detection image.
pub fn detected_file_name(stem: &str) -> String {
    format!("{}_detected.jpg", stem)
}

/// Decodes any supported image format into 8-bit RGB.
pub fn load_rgb_image(path: &Path) -> Result<RgbImage, RedecorError> {
    let image = image::open(path).map_err(|source| RedecorError::ImageDecode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(image.to_rgb8())
}

/// Draws a hollow rectangle for every object's box.
///
/// Boxes are rounded to whole pixels and clamped to the image. Boxes lying
/// entirely outside the image draw nothing.
pub fn draw_layout(image: &mut RgbImage, objects: &[DetectedObject], opts: &RenderOptions) {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let color = Rgb(opts.color);
    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;

    for object in objects {
        let bbox = &object.bbox;
        if !bbox.is_finite() {
            continue;
        }
        let x1 = bbox.x1().round() as i64;
        let y1 = bbox.y1().round() as i64;
        let x2 = bbox.x2().round() as i64;
        let y2 = bbox.y2().round() as i64;
        if x2 < 0 || y2 < 0 || x1 > max_x || y1 > max_y {
            continue;
        }

        let left = x1.clamp(0, max_x);
        let top = y1.clamp(0, max_y);
        let right = x2.clamp(0, max_x).max(left);
        let bottom = y2.clamp(0, max_y).max(top);
        let rect_w = (right - left + 1) as u32;
        let rect_h = (bottom - top + 1) as u32;

        for t in 0..opts.line_width {
            let inset = 2 * t;
            if inset >= rect_w || inset >= rect_h {
                break;
            }
            let rect = Rect::at((left + i64::from(t)) as i32, (top + i64::from(t)) as i32)
                .of_size(rect_w - inset, rect_h - inset);
            draw_hollow_rect_mut(image, rect, color);
        }
    }
}

fn save_jpeg(image: &RgbImage, path: &Path) -> Result<(), RedecorError> {
    image.save(path).map_err(|source| RedecorError::ImageEncode {
        path: path.to_path_buf(),
        source,
    })
}

/// Renders each variant onto a fresh copy of `image`.
///
/// Returns the written paths in variant order.
pub fn render_variants(
    image: &RgbImage,
    variants: &[LayoutVariant],
    output_dir: &Path,
    opts: &RenderOptions,
) -> Result<Vec<PathBuf>, RedecorError> {
    fs::create_dir_all(output_dir)?;

    let mut written = Vec::with_capacity(variants.len());
    for (index, variant) in variants.iter().enumerate() {
        let mut canvas = image.clone();
        draw_layout(&mut canvas, &variant.objects, opts);

        let path = output_dir.join(variant_file_name(index));
        save_jpeg(&canvas, &path)?;
        debug!(path = %path.display(), objects = variant.len(), "rendered variant");
        written.push(path);
    }
    Ok(written)
}

/// Writes the source image annotated with the extracted layout.
pub fn render_detections(
    image: &RgbImage,
    layout: &Layout,
    stem: &str,
    output_dir: &Path,
    opts: &RenderOptions,
) -> Result<PathBuf, RedecorError> {
    fs::create_dir_all(output_dir)?;

    let mut canvas = image.clone();
    draw_layout(&mut canvas, &layout.objects, opts);

    let path = output_dir.join(detected_file_name(stem));
    save_jpeg(&canvas, &path)?;
    Ok(path)
}
