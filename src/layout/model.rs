//! Scene layout records produced from one detection pass.

use serde::{Deserialize, Serialize};

use super::bbox::BBoxXYXY;
use super::ids::ClassId;
use super::space::Pixel;

/// One object found in the photo.
///
/// Once produced by the extractor this value is never modified; variants
/// hold clones of it in a different order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    /// Corner box in source-image pixels.
    pub bbox: BBoxXYXY<Pixel>,

    /// Detector class index.
    pub class_id: ClassId,

    /// Detector confidence in `[0, 1]`.
    pub confidence: f64,
}

impl DetectedObject {
    pub fn new(bbox: BBoxXYXY<Pixel>, class_id: impl Into<ClassId>, confidence: f64) -> Self {
        Self {
            bbox,
            class_id: class_id.into(),
            confidence,
        }
    }
}

/// The objects detected in one image, in detector order.
///
/// Serialized as a bare JSON array so `layout.json` stays a flat list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layout {
    pub objects: Vec<DetectedObject>,
}

impl Layout {
    pub fn new(objects: Vec<DetectedObject>) -> Self {
        Self { objects }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DetectedObject> {
        self.objects.iter()
    }
}

impl From<Vec<DetectedObject>> for Layout {
    fn from(objects: Vec<DetectedObject>) -> Self {
        Self::new(objects)
    }
}

impl<'a> IntoIterator for &'a Layout {
    type Item = &'a DetectedObject;
    type IntoIter = std::slice::Iter<'a, DetectedObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.iter()
    }
}

/// A reordering of a [`Layout`]'s objects.
///
/// Owns its own copies; nothing is shared with the source layout or with
/// sibling variants.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutVariant {
    pub objects: Vec<DetectedObject>,
}

impl LayoutVariant {
    pub fn new(objects: Vec<DetectedObject>) -> Self {
        Self { objects }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DetectedObject> {
        self.objects.iter()
    }
}

impl<'a> IntoIterator for &'a LayoutVariant {
    type Item = &'a DetectedObject;
    type IntoIter = std::slice::Iter<'a, DetectedObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.iter()
    }
}
