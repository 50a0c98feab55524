//! Paint styles and paint-space UV mapping
//!
//! A [`RenderStyle`] describes how a fill or stroke is colored. Solid colors are
//! written inline into vertices; every other style is deduplicated into the
//! geometry's attribute table and needs per-vertex paint coordinates.

use blinc_core::{Affine2D, Color, Rect, Vec2};

use crate::atlas::{ImageAtlasEntry, ImageRef};
use crate::geometry::{Attributes, Vertex};

/// Extent used to make linear gradients behave as infinite bands
const LINEAR_GRADIENT_EXTENT: f32 = 1e5;

/// Gradient parameters shared by the linear, radial and box variants
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientPaint {
    /// Maps local coordinates into gradient space
    pub xform: Affine2D,
    pub base: Vec2,
    pub extent: Vec2,
    pub radius: f32,
    pub feather: f32,
    pub inner_color: Color,
    pub outer_color: Color,
}

/// Image pattern parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImagePaint {
    /// Maps local coordinates into normalized image space (`0..1` over one tile)
    pub xform: Affine2D,
    pub base: Vec2,
    pub extent: Vec2,
    pub image: ImageRef,
    pub tint: Color,
    pub wrap_u: bool,
    pub wrap_v: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RenderStyle {
    SolidColor(Color),
    LinearGradient(GradientPaint),
    RadialGradient(GradientPaint),
    BoxGradient(GradientPaint),
    ImagePattern(ImagePaint),
}

impl Default for RenderStyle {
    fn default() -> Self {
        RenderStyle::SolidColor(Color::WHITE)
    }
}

impl From<Color> for RenderStyle {
    fn from(color: Color) -> Self {
        RenderStyle::SolidColor(color)
    }
}

impl RenderStyle {
    pub fn solid(color: Color) -> Self {
        RenderStyle::SolidColor(color)
    }

    /// Linear gradient between two local-space points
    pub fn linear_gradient(start: Vec2, end: Vec2, inner: Color, outer: Color) -> Self {
        let (dir, len) = (end - start).normalize_with_length();
        let dir = if len > 1e-4 { dir } else { Vec2::new(0.0, 1.0) };

        let paint_to_local = Affine2D::new(
            dir.y,
            -dir.x,
            dir.x,
            dir.y,
            start.x - dir.x * LINEAR_GRADIENT_EXTENT,
            start.y - dir.y * LINEAR_GRADIENT_EXTENT,
        );

        RenderStyle::LinearGradient(GradientPaint {
            xform: paint_to_local.inverse().unwrap_or(Affine2D::IDENTITY),
            base: start,
            extent: Vec2::new(
                LINEAR_GRADIENT_EXTENT,
                LINEAR_GRADIENT_EXTENT + len * 0.5,
            ),
            radius: 0.0,
            feather: len.max(1.0),
            inner_color: inner,
            outer_color: outer,
        })
    }

    /// Radial gradient fading from `inner_radius` to `outer_radius`
    pub fn radial_gradient(
        center: Vec2,
        inner_radius: f32,
        outer_radius: f32,
        inner: Color,
        outer: Color,
    ) -> Self {
        let r = (inner_radius + outer_radius) * 0.5;
        let f = outer_radius - inner_radius;
        RenderStyle::RadialGradient(GradientPaint {
            xform: Affine2D::translation(-center.x, -center.y),
            base: center,
            extent: Vec2::new(r, r),
            radius: r,
            feather: f.max(1.0),
            inner_color: inner,
            outer_color: outer,
        })
    }

    /// Rounded-box shadow style gradient
    pub fn box_gradient(rect: Rect, radius: f32, feather: f32, inner: Color, outer: Color) -> Self {
        let center = rect.center();
        RenderStyle::BoxGradient(GradientPaint {
            xform: Affine2D::translation(-center.x, -center.y),
            base: center,
            extent: Vec2::new(rect.width() * 0.5, rect.height() * 0.5),
            radius,
            feather: feather.max(1.0),
            inner_color: inner,
            outer_color: outer,
        })
    }

    /// Image tile of `size` placed at `origin`, rotated by `angle` around it
    pub fn image_pattern(origin: Vec2, size: Vec2, angle: f32, image: ImageRef, alpha: f32) -> Self {
        let inv = |v: f32| if v.abs() > 1e-6 { 1.0 / v } else { 1.0 };
        let xform = Affine2D::scale(inv(size.x), inv(size.y))
            .then(&Affine2D::rotation(-angle))
            .then(&Affine2D::translation(-origin.x, -origin.y));

        RenderStyle::ImagePattern(ImagePaint {
            xform,
            base: origin,
            extent: size,
            image,
            tint: Color::WHITE.with_alpha(alpha),
            wrap_u: false,
            wrap_v: false,
        })
    }

    /// Enables texture wrapping for image patterns, no-op for other styles
    pub fn with_wrap(mut self, wrap_u: bool, wrap_v: bool) -> Self {
        if let RenderStyle::ImagePattern(paint) = &mut self {
            paint.wrap_u = wrap_u;
            paint.wrap_v = wrap_v;
        }
        self
    }

    /// Style needs an entry in the attribute table
    pub fn attributes_needed(&self) -> bool {
        !matches!(self, RenderStyle::SolidColor(_))
    }

    /// Style needs paint-space UVs
    pub fn xform_needed(&self) -> bool {
        !matches!(self, RenderStyle::SolidColor(_))
    }

    pub fn inner_color(&self) -> Color {
        match self {
            RenderStyle::SolidColor(color) => *color,
            RenderStyle::LinearGradient(g)
            | RenderStyle::RadialGradient(g)
            | RenderStyle::BoxGradient(g) => g.inner_color,
            RenderStyle::ImagePattern(p) => p.tint,
        }
    }

    pub fn image(&self) -> Option<&ImagePaint> {
        match self {
            RenderStyle::ImagePattern(p) => Some(p),
            _ => None,
        }
    }

    pub fn image_ref(&self) -> Option<ImageRef> {
        self.image().map(|p| p.image)
    }

    /// Local-to-paint transform, identity for solid colors
    pub fn xform(&self) -> Affine2D {
        match self {
            RenderStyle::SolidColor(_) => Affine2D::IDENTITY,
            RenderStyle::LinearGradient(g)
            | RenderStyle::RadialGradient(g)
            | RenderStyle::BoxGradient(g) => g.xform,
            RenderStyle::ImagePattern(p) => p.xform,
        }
    }

    /// Attribute record for this style, colors scaled by `alpha`
    pub fn to_attributes(&self, line_width: f32, alpha: f32) -> Attributes {
        let (base, extent, inner, outer, radius, feather) = match self {
            RenderStyle::SolidColor(color) => (Vec2::ZERO, Vec2::ZERO, *color, *color, 0.0, 1.0),
            RenderStyle::LinearGradient(g)
            | RenderStyle::RadialGradient(g)
            | RenderStyle::BoxGradient(g) => (
                g.base,
                g.extent,
                g.inner_color,
                g.outer_color,
                g.radius,
                g.feather,
            ),
            RenderStyle::ImagePattern(p) => (p.base, p.extent, p.tint, p.tint, 0.0, 1.0),
        };

        Attributes {
            base: base.into(),
            extent: extent.into(),
            inner_color: inner.scale_alpha(alpha).to_array(),
            outer_color: outer.scale_alpha(alpha).to_array(),
            radius,
            feather,
            line_width,
            _padding: 0.0,
        }
    }
}

/// Rewrites vertex UVs with paint-space coordinates
///
/// `inverse` maps output positions back to local space; `pivot` is subtracted from
/// positions first. Image paints are additionally mapped into their atlas entry.
pub fn apply_paint_uv(
    vertices: &mut [Vertex],
    style: &RenderStyle,
    inverse: &Affine2D,
    pivot: Vec2,
    image: Option<&ImageAtlasEntry>,
) {
    if !style.xform_needed() {
        return;
    }

    let paint_xform = style.xform().then(inverse);
    let entry_index = style.image_ref().map_or(0, |r| r.entry_index);

    for v in vertices {
        let uv = paint_xform.transform_point(v.position() - pivot);
        match image {
            Some(entry) => {
                v.uv = [
                    uv.x * entry.uv_scale.x + entry.uv_offset.x,
                    uv.y * entry.uv_scale.y + entry.uv_offset.y,
                ];
                v.image_page_index = entry.page_index;
                v.image_entry_index = entry_index;
            }
            None => {
                v.uv = uv.into();
                v.image_page_index = 0;
                v.image_entry_index = 0;
            }
        }
    }
}
