#![allow(dead_code)]

use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use redecor::detect::{class_name, Detection};
use redecor::layout::{BBoxXYXY, ClassId, DetectedObject, Layout, Normalized, Pixel};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Proper boxes (`x1 < x2`, `y1 < y2`) inside a `width` x `height` image.
pub fn arb_bbox_within(width: u32, height: u32) -> BoxedStrategy<BBoxXYXY<Pixel>> {
    let (w, h) = (f64::from(width), f64::from(height));
    (0.0..w - 1.0, 0.0..h - 1.0, 0.0f64..1.0, 0.0f64..1.0)
        .prop_map(move |(x1, y1, fw, fh)| {
            let x2 = x1 + 1.0 + fw * (w - x1 - 1.0);
            let y2 = y1 + 1.0 + fh * (h - y1 - 1.0);
            BBoxXYXY::from_xyxy(x1, y1, x2, y2)
        })
        .boxed()
}

pub fn arb_object_within(width: u32, height: u32) -> BoxedStrategy<DetectedObject> {
    (arb_bbox_within(width, height), 0u32..80, 0.0f64..=1.0)
        .prop_map(|(bbox, class_id, confidence)| DetectedObject::new(bbox, class_id, confidence))
        .boxed()
}

/// Layouts of up to `max_objects` valid objects, duplicates allowed.
pub fn arb_layout(max_objects: usize) -> BoxedStrategy<Layout> {
    (2u32..=4096, 2u32..=4096)
        .prop_flat_map(move |(w, h)| {
            proptest::collection::vec(arb_object_within(w, h), 0..=max_objects)
        })
        .prop_map(Layout::new)
        .boxed()
}

/// Raw detector output, including boxes that stray outside `[0, 1]` or
/// collapse to nothing.
pub fn arb_detection() -> BoxedStrategy<Detection> {
    (
        -0.2f64..1.2,
        -0.2f64..1.2,
        -0.2f64..1.2,
        -0.2f64..1.2,
        0u32..80,
        0.0f32..=1.0,
    )
        .prop_map(|(x1, y1, x2, y2, class_id, confidence)| Detection {
            class_id: ClassId(class_id),
            class_name: class_name(ClassId(class_id)).to_string(),
            confidence,
            bbox: BBoxXYXY::<Normalized>::from_xyxy(x1, y1, x2, y2),
        })
        .boxed()
}

/// Canonical order for comparing object multisets.
pub fn sorted_by_identity(objects: &[DetectedObject]) -> Vec<DetectedObject> {
    let mut sorted = objects.to_vec();
    sorted.sort_by_key(|obj| {
        let [x1, y1, x2, y2] = obj.bbox.to_array();
        (
            x1.to_bits(),
            y1.to_bits(),
            x2.to_bits(),
            y2.to_bits(),
            obj.class_id.as_u32(),
            obj.confidence.to_bits(),
        )
    });
    sorted
}
