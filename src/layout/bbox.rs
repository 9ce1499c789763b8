//! Axis-aligned bounding boxes in `(x1, y1, x2, y2)` corner form.

use serde::{Deserialize, Serialize};

use super::coord::Coord;
use super::{Normalized, Pixel};

/// A bounding box given by its top-left (`min`) and bottom-right (`max`) corners.
///
/// Construction does not check that `min < max`. Detector output can be
/// slightly off, so the extractor clamps boxes and validation reports what is
/// still broken instead of panicking here.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYXY<TSpace> {
    pub min: Coord<TSpace>,
    pub max: Coord<TSpace>,
}

impl<TSpace> BBoxXYXY<TSpace> {
    #[inline]
    pub fn new(min: Coord<TSpace>, max: Coord<TSpace>) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn from_xyxy(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            min: Coord::new(x1, y1),
            max: Coord::new(x2, y2),
        }
    }

    /// Builds a box from a centre point and a size, the layout YOLO heads emit.
    #[inline]
    pub fn from_cxcywh(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self::from_xyxy(
            cx - width / 2.0,
            cy - height / 2.0,
            cx + width / 2.0,
            cy + height / 2.0,
        )
    }

    #[inline]
    pub fn x1(&self) -> f64 {
        self.min.x
    }

    #[inline]
    pub fn y1(&self) -> f64 {
        self.min.y
    }

    #[inline]
    pub fn x2(&self) -> f64 {
        self.max.x
    }

    #[inline]
    pub fn y2(&self) -> f64 {
        self.max.y
    }

    /// Width of the box; negative when the corners are swapped.
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height of the box; negative when the corners are swapped.
    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// True when `x1 <= x2` and `y1 <= y2`.
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    /// True when the box is finite and has strictly positive width and height.
    #[inline]
    pub fn is_proper(&self) -> bool {
        self.is_finite() && self.min.x < self.max.x && self.min.y < self.max.y
    }

    /// Intersection over union with another box in the same space.
    ///
    /// Returns 0.0 when the union is empty.
    pub fn iou(&self, other: &Self) -> f64 {
        let ix1 = self.min.x.max(other.min.x);
        let iy1 = self.min.y.max(other.min.y);
        let ix2 = self.max.x.min(other.max.x);
        let iy2 = self.max.y.min(other.max.y);

        let intersection = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }

    /// Returns the corners as a plain array, in `[x1, y1, x2, y2]` order.
    #[inline]
    pub fn to_array(&self) -> [f64; 4] {
        [self.min.x, self.min.y, self.max.x, self.max.y]
    }
}

impl<TSpace> std::fmt::Debug for BBoxXYXY<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.to_array()).finish()
    }
}

impl<TSpace> Default for BBoxXYXY<TSpace> {
    fn default() -> Self {
        Self::from_xyxy(0.0, 0.0, 0.0, 0.0)
    }
}

// Serialized as `[x1, y1, x2, y2]`; no bounds on TSpace.
impl<TSpace> Serialize for BBoxXYXY<TSpace> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_array().serialize(serializer)
    }
}

impl<'de, TSpace> Deserialize<'de> for BBoxXYXY<TSpace> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let [x1, y1, x2, y2] = <[f64; 4]>::deserialize(deserializer)?;
        Ok(BBoxXYXY::from_xyxy(x1, y1, x2, y2))
    }
}

impl BBoxXYXY<Pixel> {
    /// Divides by the image size to get resolution-independent coordinates.
    pub fn to_normalized(&self, image_width: f64, image_height: f64) -> BBoxXYXY<Normalized> {
        BBoxXYXY::from_xyxy(
            self.min.x / image_width,
            self.min.y / image_height,
            self.max.x / image_width,
            self.max.y / image_height,
        )
    }

    /// Clamps both corners into the `width x height` image rectangle.
    pub fn clamp_to_image(&self, image_width: f64, image_height: f64) -> Self {
        Self::new(
            self.min.clamped(image_width, image_height),
            self.max.clamped(image_width, image_height),
        )
    }
}

impl BBoxXYXY<Normalized> {
    /// Scales normalized coordinates up to the pixel grid of an image.
    pub fn to_pixel(&self, image_width: f64, image_height: f64) -> BBoxXYXY<Pixel> {
        BBoxXYXY::from_xyxy(
            self.min.x * image_width,
            self.min.y * image_height,
            self.max.x * image_width,
            self.max.y * image_height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_dimensions() {
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(10.0, 20.0, 100.0, 80.0);
        assert_eq!(bbox.width(), 90.0);
        assert_eq!(bbox.height(), 60.0);
        assert_eq!(bbox.area(), 5400.0);
    }

    #[test]
    fn test_bbox_from_center() {
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_cxcywh(50.0, 40.0, 20.0, 10.0);
        assert_eq!(bbox.to_array(), [40.0, 35.0, 60.0, 45.0]);
    }

    #[test]
    fn test_bbox_ordering() {
        let ordered: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(10.0, 20.0, 100.0, 80.0);
        assert!(ordered.is_ordered());
        assert!(ordered.is_proper());

        let swapped: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(100.0, 80.0, 10.0, 20.0);
        assert!(!swapped.is_ordered());

        let flat: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(10.0, 20.0, 10.0, 80.0);
        assert!(flat.is_ordered());
        assert!(!flat.is_proper());
    }

    #[test]
    fn test_bbox_iou() {
        let a: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(0.0, 0.0, 10.0, 10.0);
        let b: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(5.0, 0.0, 15.0, 10.0);
        let far: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(20.0, 20.0, 30.0, 30.0);

        assert!((a.iou(&a) - 1.0).abs() < 1e-12);
        assert!((a.iou(&b) - 50.0 / 150.0).abs() < 1e-12);
        assert_eq!(a.iou(&far), 0.0);
    }

    #[test]
    fn test_bbox_serializes_as_array() {
        let bbox: BBoxXYXY<Pixel> = BBoxXYXY::from_xyxy(0.0, 0.5, 10.0, 12.25);
        let json = serde_json::to_string(&bbox).expect("serialize");
        assert_eq!(json, "[0.0,0.5,10.0,12.25]");

        let back: BBoxXYXY<Pixel> = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, bbox);
    }

    #[test]
    fn test_bbox_rejects_short_array() {
        assert!(serde_json::from_str::<BBoxXYXY<Pixel>>("[1.0, 2.0, 3.0]").is_err());
    }

    #[test]
    fn test_normalized_to_pixel_and_clamp() {
        let norm: BBoxXYXY<Normalized> = BBoxXYXY::from_xyxy(-0.1, 0.25, 0.5, 1.2);
        let px = norm.to_pixel(200.0, 100.0);
        assert_eq!(px.to_array(), [-20.0, 25.0, 100.0, 120.0]);

        let clamped = px.clamp_to_image(200.0, 100.0);
        assert_eq!(clamped.to_array(), [0.0, 25.0, 100.0, 100.0]);
        assert_eq!(clamped.to_normalized(200.0, 100.0).to_array(), [0.0, 0.25, 0.5, 1.0]);
    }
}
