//! Layout validation.
//!
//! Checks that every object satisfies the layout invariants the rest of the
//! pipeline relies on:
//! - finite, properly ordered boxes with positive width and height
//! - confidence in `[0, 1]`
//! - boxes inside the image, when its size is known
//! - class ids the detector can name

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use crate::detect::COCO_CLASSES;
use crate::layout::{DetectedObject, Layout};

/// Options for validation behavior.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    /// Size of the source image, for bounds checks.
    pub image_size: Option<(u32, u32)>,
}

/// Validates a layout and returns every issue found.
pub fn validate_layout(layout: &Layout, opts: &ValidateOptions) -> ValidationReport {
    let mut report = ValidationReport::new();

    for (index, object) in layout.iter().enumerate() {
        validate_object(index, object, opts, &mut report);
    }

    report
}

fn validate_object(
    index: usize,
    object: &DetectedObject,
    opts: &ValidateOptions,
    report: &mut ValidationReport,
) {
    let ctx = || IssueContext::Object { index };
    let bbox = &object.bbox;

    if !bbox.is_finite() {
        report.add(ValidationIssue::error(
            IssueCode::NonFiniteBBox,
            format!("Bounding box has non-finite coordinates {:?}", bbox),
            ctx(),
        ));
    } else if !bbox.is_ordered() {
        report.add(ValidationIssue::error(
            IssueCode::InvalidBBoxOrder,
            format!(
                "Bounding box corners are swapped: x1={}, y1={}, x2={}, y2={}",
                bbox.x1(),
                bbox.y1(),
                bbox.x2(),
                bbox.y2()
            ),
            ctx(),
        ));
    } else if !bbox.is_proper() {
        report.add(ValidationIssue::error(
            IssueCode::DegenerateBBox,
            format!(
                "Bounding box has zero size ({} x {})",
                bbox.width(),
                bbox.height()
            ),
            ctx(),
        ));
    } else if let Some((width, height)) = opts.image_size {
        let (w, h) = (f64::from(width), f64::from(height));
        if bbox.x1() < 0.0 || bbox.y1() < 0.0 || bbox.x2() > w || bbox.y2() > h {
            report.add(ValidationIssue::warning(
                IssueCode::BBoxOutOfBounds,
                format!(
                    "Bounding box {:?} extends outside the {}x{} image",
                    bbox, width, height
                ),
                ctx(),
            ));
        }
    }

    if !(0.0..=1.0).contains(&object.confidence) {
        report.add(ValidationIssue::error(
            IssueCode::ConfidenceOutOfRange,
            format!("Confidence {} is outside [0, 1]", object.confidence),
            ctx(),
        ));
    }

    if object.class_id.as_index() >= COCO_CLASSES.len() {
        report.add(ValidationIssue::warning(
            IssueCode::UnknownClassId,
            format!("Class id {} has no known name", object.class_id),
            ctx(),
        ));
    }
}
