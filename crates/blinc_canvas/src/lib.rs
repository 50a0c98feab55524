//! Blinc Canvas Geometry Builder
//!
//! Turns canvas-style drawing calls into GPU-ready triangle batches. Paths are
//! recorded in output space, flattened to polylines on `stroke()`/`fill()` and
//! tessellated with the current render state.
//!
//! # Features
//!
//! - Path recording (lines, cubic and quadratic curves, arcs, rects, ellipses)
//! - Strokes with miter, bevel and round joins and butt, square and round caps
//! - Convex fast path and concave fills resolved by a mask quad
//! - Fringe anti-aliasing
//! - Solid, gradient and image paints with deduplicated style attributes
//! - Glyph quads for pre-rasterized text
//! - Custom renderer tags with per-batch payloads
//!
//! # Example
//!
//! ```
//! use blinc_canvas::{BatchPacking, CanvasConfig, GeometryBuilder};
//! use blinc_core::{Color, LineCap};
//!
//! let mut builder = GeometryBuilder::new(CanvasConfig::default());
//!
//! builder.begin_path();
//! builder.move_to(0.0, 0.0);
//! builder.line_to(100.0, 0.0);
//! builder.line_cap(LineCap::Butt);
//! builder.stroke_color(Color::BLACK, 10.0);
//! builder.stroke();
//!
//! let geometry = builder.extract();
//! assert_eq!(geometry.batches.len(), 1);
//! assert_eq!(geometry.batches[0].packing, BatchPacking::TriangleStrip);
//! assert_eq!(geometry.vertices.len(), 4);
//! ```

pub mod atlas;
pub mod builder;
pub mod commands;
pub mod config;
pub mod error;
pub mod fill;
pub mod flatten;
pub mod geometry;
pub mod glyph;
mod joins;
pub mod paint;
pub mod path;
pub mod path_cache;
pub mod state;
pub mod stroke;
pub mod transform;
pub mod writer;

pub use atlas::{GlyphAtlas, GlyphPlacement, GlyphRef, ImageAtlas, ImageAtlasEntry, ImageRef};
pub use builder::GeometryBuilder;
pub use commands::{Command, CommandBuffer, Opcode};
pub use config::CanvasConfig;
pub use error::{CanvasError, Result};
pub use geometry::{Attributes, Batch, BatchPacking, BatchType, BlendOp, Geometry, Vertex};
pub use glyph::GlyphEntry;
pub use paint::{GradientPaint, ImagePaint, RenderStyle};
pub use state::RenderState;
pub use transform::TransformStack;

// ─────────────────────────────────────────────────────────────────────────────
// Core type re-exports from blinc_core
// ─────────────────────────────────────────────────────────────────────────────

pub use blinc_core::{
    Affine2D, Color, LineCap, LineJoin, Point, Rect, Size, TransformClass, Vec2, Winding,
};
