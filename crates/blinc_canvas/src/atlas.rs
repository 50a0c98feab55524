//! Atlas lookups
//!
//! Image and glyph atlases live outside the builder. The builder only needs to
//! resolve a reference into texture coordinates, so both are expressed as small
//! lookup traits.

use blinc_core::Vec2;

/// Reference to an image stored in an atlas
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ImageRef {
    /// Atlas the image lives in (0 = none)
    pub atlas_index: u16,
    pub entry_index: u16,
}

/// Location of an image inside its atlas
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageAtlasEntry {
    pub uv_offset: Vec2,
    pub uv_scale: Vec2,
    pub page_index: u16,
}

/// Resolves image references for image pattern fills
pub trait ImageAtlas: Send + Sync {
    fn resolve(&self, image: ImageRef) -> Option<ImageAtlasEntry>;
}

/// Opaque glyph identifier understood by a [`GlyphAtlas`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GlyphRef(pub u32);

/// Where a rasterized glyph sits in the glyph atlas
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphPlacement {
    pub uv_min: Vec2,
    pub uv_max: Vec2,
    /// Quad size in output units
    pub size: Vec2,
    pub page_index: u16,
}

/// Looks up rasterized glyphs
pub trait GlyphAtlas {
    /// Returns `None` for glyphs that are not rasterized
    fn placement(&self, glyph: GlyphRef) -> Option<GlyphPlacement>;
}

impl<F> GlyphAtlas for F
where
    F: Fn(GlyphRef) -> Option<GlyphPlacement>,
{
    fn placement(&self, glyph: GlyphRef) -> Option<GlyphPlacement> {
        self(glyph)
    }
}
