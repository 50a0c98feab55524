//! Blinc Core Geometry
//!
//! Foundational 2D types shared across the Blinc canvas crates:
//!
//! - **Geometry**: `Vec2`/`Point`, `Size`, `Rect`
//! - **Transforms**: `Affine2D` with classification and inversion
//! - **Color**: float RGBA with RGBA8 packing for vertex streams
//! - **Stroke styles**: `LineCap`, `LineJoin`, `Winding`
//!
//! # Example
//!
//! ```rust
//! use blinc_core::{Affine2D, TransformClass, Vec2};
//!
//! let t = Affine2D::translation(10.0, 5.0);
//! assert_eq!(t.classify(), TransformClass::TranslationOnly);
//! assert_eq!(t.transform_point(Vec2::ZERO), Vec2::new(10.0, 5.0));
//! ```

pub mod affine;
pub mod color;
pub mod draw;
pub mod geometry;

pub use affine::{Affine2D, TransformClass};
pub use color::Color;
pub use draw::{LineCap, LineJoin, Winding};
pub use geometry::{Point, Rect, Size, Vec2};
