//! 2D drawing of the analysis buffers.
//!
//! The renderer only speaks the small [`Surface`] vocabulary (filled
//! rectangles and stroked paths). [`DisplayList`] records those commands so
//! the terminal, or a test, can replay them.

pub mod surface;
pub mod visualization;

pub use surface::{DisplayList, DrawCommand, PathSegment, Rgb, Surface};
pub use visualization::VisualizationRenderer;
