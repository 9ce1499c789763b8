//! Coordinate space markers for bounding boxes.
//!
//! Detectors report boxes relative to the model input, while layouts and
//! renderers work in the pixel grid of the source photo. These zero-sized
//! types keep the two apart at compile time.

use std::fmt;

/// Marker for absolute pixel coordinates in the source image.
///
/// (0, 0) is the top-left corner; x grows to the right and y downwards.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Marker for coordinates expressed as fractions of the image size (0.0 to 1.0).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Normalized {}

impl fmt::Debug for Pixel {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl fmt::Debug for Normalized {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}
