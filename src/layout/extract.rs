//! Conversion from raw detector output to a pixel-space [`Layout`].

use tracing::debug;

use super::model::{DetectedObject, Layout};
use crate::detect::Detection;

/// Builds a layout from detections made on an image of the given size.
///
/// Boxes are scaled to pixels and clamped to the image. Anything that ends up
/// non-finite or with zero width or height is dropped, so every object in the
/// result satisfies `x1 < x2` and `y1 < y2`. Detector order is kept.
pub fn extract_layout(detections: &[Detection], image_width: u32, image_height: u32) -> Layout {
    let (w, h) = (f64::from(image_width), f64::from(image_height));
    let mut objects = Vec::with_capacity(detections.len());

    for (idx, det) in detections.iter().enumerate() {
        let bbox = det.bbox.to_pixel(w, h).clamp_to_image(w, h);
        if !bbox.is_proper() {
            debug!(index = idx, class = %det.class_name, ?bbox, "dropping degenerate detection");
            continue;
        }

        let confidence = f64::from(det.confidence);
        if !confidence.is_finite() {
            debug!(index = idx, class = %det.class_name, "dropping detection with NaN confidence");
            continue;
        }

        objects.push(DetectedObject::new(bbox, det.class_id, confidence.clamp(0.0, 1.0)));
    }

    debug!(kept = objects.len(), total = detections.len(), "extracted layout");
    Layout::new(objects)
}
