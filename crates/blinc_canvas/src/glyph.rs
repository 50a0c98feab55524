//! Glyph quads
//!
//! Text is shaped and rasterized elsewhere. The builder receives positioned glyph
//! references and turns each rasterized glyph into a textured quad.

use blinc_core::{Color, Vec2};

use crate::atlas::{GlyphAtlas, GlyphRef};
use crate::geometry::{Geometry, Vertex};
use crate::transform::TransformStack;
use crate::writer::{VertexRange, VertexWriter};

/// Glyph count above which a print call is rejected
pub const MAX_GLYPHS_PER_PRINT: usize = 10_000;

/// A positioned glyph
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphEntry {
    pub glyph: GlyphRef,
    /// Top-left corner of the glyph quad in local space
    pub pos: Vec2,
    pub color: Color,
    /// Index of the source character, carried for callers mapping back to text
    pub text_index: u32,
}

/// Quads written by one print call
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphRun {
    pub range: VertexRange,
    pub page_mask: u64,
}

/// Writes one quad per resolved glyph
///
/// Returns `None` when nothing was written.
pub fn write_glyph_quads<A: GlyphAtlas + ?Sized>(
    geometry: &mut Geometry,
    transform: &TransformStack,
    glyphs: &[GlyphEntry],
    atlas: &A,
    alpha: f32,
) -> Option<GlyphRun> {
    if glyphs.len() > MAX_GLYPHS_PER_PRINT {
        tracing::warn!(
            count = glyphs.len(),
            max = MAX_GLYPHS_PER_PRINT,
            "too many glyphs in one print call, ignored"
        );
        return None;
    }

    let mut page_mask = 0u64;
    let mut writer = VertexWriter::new(geometry, glyphs.len() * 4, Vertex::MASK_GLYPH);
    let mut packed = Vec::with_capacity(glyphs.len());

    for entry in glyphs {
        let Some(placement) = atlas.placement(entry.glyph) else {
            tracing::trace!(glyph = entry.glyph.0, "glyph not rasterized, skipped");
            continue;
        };

        let min = entry.pos;
        let max = entry.pos + placement.size;
        let (uv0, uv1) = (placement.uv_min, placement.uv_max);
        let corners = [
            (Vec2::new(min.x, min.y), uv0.x, uv0.y),
            (Vec2::new(max.x, min.y), uv1.x, uv0.y),
            (Vec2::new(max.x, max.y), uv1.x, uv1.y),
            (Vec2::new(min.x, max.y), uv0.x, uv1.y),
        ];
        for (p, u, v) in corners {
            writer.add(transform.apply(p), u, v);
        }

        if placement.page_index < 64 {
            page_mask |= 1 << placement.page_index;
        }
        packed.push((entry.color.scale_alpha(alpha).pack(), placement.page_index));
    }

    let range = writer.finish_batch();
    if range.is_empty() {
        return None;
    }

    let quads = geometry.vertices[range.offset..range.end()].chunks_exact_mut(4);
    for (quad, (color, page)) in quads.zip(packed) {
        for v in quad {
            v.color = color;
            v.image_page_index = page;
        }
    }

    Some(GlyphRun { range, page_mask })
}
