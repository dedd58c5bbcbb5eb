//! Drawing boundary for Treeline.
//!
//! Treeline never talks to a GPU or a window system. A view paints by issuing
//! primitive calls against the [`Painter`] trait, which the host implements
//! over its own backend. This crate provides:
//!
//! - Geometry and color value types ([`Point`], [`Size`], [`Rect`], [`Color`])
//! - The [`Painter`] trait
//! - [`ImageBuffer`], a CPU RGBA image used for drag previews
//! - [`RasterPainter`], a software painter that draws into an [`ImageBuffer`]
//! - [`RecordingPainter`], a painter that records commands for replay or tests
//!
//! # Example
//!
//! ```
//! use treeline_render::{Color, Painter, RasterPainter, Rect};
//!
//! let mut painter = RasterPainter::new(64, 20);
//! painter.fill_rect(Rect::new(0.0, 0.0, 64.0, 20.0), Color::LIGHT_GRAY);
//! let image = painter.into_image();
//! assert_eq!(image.height(), 20);
//! ```

pub mod error;
pub mod image_buffer;
pub mod painter;
pub mod raster;
pub mod recording;
pub mod types;

pub use error::{RenderError, RenderResult};
pub use image_buffer::ImageBuffer;
pub use painter::Painter;
pub use raster::RasterPainter;
pub use recording::{PaintCommand, RecordingPainter};
pub use types::{Color, HorizontalAlign, Point, Rect, Size, Stroke, TextStyle};
