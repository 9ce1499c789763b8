//! Layout types: the normalized scene description passed between stages.
//!
//! A [`Layout`] is what the extractor builds from raw detector output and
//! what the rearrangement stage reorders into [`LayoutVariant`]s. Boxes are
//! always in source-image pixel space here; the typed [`BBoxXYXY`] keeps
//! normalized detector boxes from leaking in unconverted.
//!
//! # Example
//!
//! ```
//! use redecor::layout::{BBoxXYXY, DetectedObject, Layout};
//!
//! let layout = Layout::new(vec![
//!     DetectedObject::new(BBoxXYXY::from_xyxy(0.0, 0.0, 10.0, 10.0), 1u32, 0.9),
//!     DetectedObject::new(BBoxXYXY::from_xyxy(5.0, 5.0, 15.0, 15.0), 2u32, 0.8),
//! ]);
//! assert_eq!(layout.len(), 2);
//! ```

mod bbox;
mod coord;
pub mod extract;
mod ids;
pub mod io_json;
mod model;
mod space;

pub use bbox::BBoxXYXY;
pub use coord::Coord;
pub use extract::extract_layout;
pub use ids::ClassId;
pub use model::{DetectedObject, Layout, LayoutVariant};
pub use space::{Normalized, Pixel};
