//! A model-free detector that invents plausible room objects.
//!
//! Stands in for the ONNX backend in demos and tests: it returns one to four
//! room-category objects per image, each at least 50 px on a side where the
//! image allows it, with confidence in `[0.7, 0.99)`.

use image::RgbImage;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

use super::classes::{class_id_for_name, ROOM_CATEGORIES};
use super::{Detection, Detector};
use crate::error::RedecorError;
use crate::layout::BBoxXYXY;

const MIN_SIDE_PX: u32 = 50;

pub struct MockDetector {
    rng: StdRng,
}

impl MockDetector {
    /// Seeded detectors return the same sequence of detections on every run.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Self { rng }
    }

    /// Draws `(lo, hi)` with `lo < hi` inside `[0, extent]`.
    fn random_span(&mut self, extent: u32) -> (u32, u32) {
        let extent = extent.max(1);
        let lo = self.rng.random_range(0..(extent / 2).max(1));
        let hi_min = (lo + MIN_SIDE_PX).min(extent);
        let hi = if hi_min < extent {
            self.rng.random_range(hi_min..extent)
        } else {
            extent
        };
        (lo, hi)
    }
}

impl Detector for MockDetector {
    fn name(&self) -> &str {
        "mock"
    }

    fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>, RedecorError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(RedecorError::Inference("image has zero size".to_string()));
        }

        let count = self.rng.random_range(1..=4);
        let mut detections = Vec::with_capacity(count);

        for _ in 0..count {
            let (_, names) = ROOM_CATEGORIES[self.rng.random_range(0..ROOM_CATEGORIES.len())];
            let name = names[self.rng.random_range(0..names.len())];
            let class_id = class_id_for_name(name).ok_or_else(|| {
                RedecorError::Inference(format!("'{}' is not a known class", name))
            })?;

            let (x1, x2) = self.random_span(width);
            let (y1, y2) = self.random_span(height);
            let (w, h) = (f64::from(width), f64::from(height));

            detections.push(Detection {
                class_id,
                class_name: name.to_string(),
                confidence: self.rng.random_range(0.7..0.99),
                bbox: BBoxXYXY::from_xyxy(
                    f64::from(x1) / w,
                    f64::from(y1) / h,
                    f64::from(x2) / w,
                    f64::from(y2) / h,
                ),
            });
        }

        debug!(count = detections.len(), "mock detections");
        Ok(detections)
    }
}
