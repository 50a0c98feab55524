//! Output geometry
//!
//! Defines the vertex, batch and attribute layouts handed to the compositor.
//! Vertices and attributes use `#[repr(C)]` and implement `bytemuck::Pod` so they
//! can be uploaded to GPU buffers without conversion.

use std::hash::{Hash, Hasher};

use blinc_core::{Color, Rect, Vec2};

/// A tessellated vertex
///
/// Memory layout:
/// - pos: `vec2<f32>`                  (8 bytes)
/// - uv: `vec2<f32>`                   (8 bytes)
/// - color: `u32`, RGBA8               (4 bytes)
/// - attribute_index: `u16`            (2 bytes) - 0 means inline color
/// - attribute_flags: `u16`            (2 bytes) - `MASK_*` bits
/// - image_page_index: `u16`           (2 bytes)
/// - image_entry_index: `u16`          (2 bytes)
/// Total: 28 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    pub color: u32,
    pub attribute_index: u16,
    pub attribute_flags: u16,
    pub image_page_index: u16,
    pub image_entry_index: u16,
}

impl Vertex {
    pub const MASK_FILL: u16 = 1 << 0;
    pub const MASK_STROKE: u16 = 1 << 1;
    pub const MASK_IS_CONVEX: u16 = 1 << 2;
    pub const MASK_HAS_IMAGE: u16 = 1 << 3;
    pub const MASK_HAS_FRINGE: u16 = 1 << 4;
    pub const MASK_HAS_WRAP_U: u16 = 1 << 5;
    pub const MASK_HAS_WRAP_V: u16 = 1 << 6;
    pub const MASK_GLYPH: u16 = 1 << 7;

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.pos[0], self.pos[1])
    }

    pub fn has_flag(&self, mask: u16) -> bool {
        self.attribute_flags & mask != 0
    }
}

/// How a batch's vertices form triangles
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BatchPacking {
    #[default]
    TriangleList,
    TriangleStrip,
    TriangleFan,
    /// Independent 4-vertex quads
    Quads,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BatchType {
    /// Drawn directly with the batch paint
    #[default]
    FillConvex,
    /// Concave polygon rings, resolved into coverage by the following mask batch
    FillConcave,
    /// Bounding quad that paints the coverage left by the concave rings
    ConcaveMask,
}

/// Blend operation requested for a batch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendOp {
    /// Overwrite the destination
    Copy,
    #[default]
    AlphaPremultiplied,
    AlphaBlend,
    Additive,
}

/// A contiguous range of vertices drawn with one state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Batch {
    pub vertex_offset: u32,
    pub vertex_count: u32,
    pub packing: BatchPacking,
    pub kind: BatchType,
    pub op: BlendOp,
    /// Style attribute index shared by the batch vertices (0 = inline color)
    pub attribute_index: u16,
    /// Image atlas of the paint (0 = none)
    pub atlas_index: u16,
    pub renderer_index: u8,
    /// Offset of the renderer payload in [`Geometry::custom_data`]
    pub render_data_offset: u32,
    pub render_data_size: u32,
    /// Glyph atlas pages referenced by a glyph batch
    pub glyph_page_mask: u64,
}

/// Deduplicated paint parameters referenced by vertices
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Attributes {
    pub base: [f32; 2],
    pub extent: [f32; 2],
    pub inner_color: [f32; 4],
    pub outer_color: [f32; 4],
    pub radius: f32,
    pub feather: f32,
    pub line_width: f32,
    pub _padding: f32,
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        bytemuck::bytes_of(self) == bytemuck::bytes_of(other)
    }
}

impl Eq for Attributes {}

impl Hash for Attributes {
    fn hash<H: Hasher>(&self, state: &mut H) {
        bytemuck::bytes_of(self).hash(state);
    }
}

/// Tessellation output of one build pass
#[derive(Clone, Debug)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub batches: Vec<Batch>,
    pub attributes: Vec<Attributes>,
    /// Custom renderer payloads, each record aligned to 16 bytes
    pub custom_data: Vec<u8>,
    pub bounds_min: Vec2,
    pub bounds_max: Vec2,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            batches: Vec::new(),
            attributes: Vec::new(),
            custom_data: Vec::new(),
            bounds_min: Vec2::MAX,
            bounds_max: Vec2::MIN,
        }
    }
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Bounding box of every emitted vertex, `None` before anything was drawn
    pub fn bounds(&self) -> Option<Rect> {
        if self.bounds_min.x > self.bounds_max.x || self.bounds_min.y > self.bounds_max.y {
            return None;
        }
        Some(Rect::from_points(self.bounds_min, self.bounds_max))
    }

    pub fn include_bounds(&mut self, min: Vec2, max: Vec2) {
        self.bounds_min = self.bounds_min.min(min);
        self.bounds_max = self.bounds_max.max(max);
    }

    /// Vertices of one batch
    pub fn batch_vertices(&self, batch: &Batch) -> &[Vertex] {
        let start = batch.vertex_offset as usize;
        let end = start + batch.vertex_count as usize;
        self.vertices.get(start..end).unwrap_or(&[])
    }

    /// Payload of a batch's custom renderer
    pub fn batch_data(&self, batch: &Batch) -> &[u8] {
        let start = batch.render_data_offset as usize;
        let end = start + batch.render_data_size as usize;
        self.custom_data.get(start..end).unwrap_or(&[])
    }

    /// Copies a renderer payload into the data blob, returning its offset
    pub(crate) fn push_custom_data(&mut self, data: &[u8]) -> u32 {
        let offset = self.custom_data.len();
        let aligned = (data.len() + 15) & !15;
        self.custom_data.extend_from_slice(data);
        self.custom_data.resize(offset + aligned, 0);
        offset as u32
    }

    pub(crate) fn apply_color(&mut self, first: usize, color: Color) {
        let packed = color.pack();
        for v in &mut self.vertices[first..] {
            v.color = packed;
        }
    }

    pub(crate) fn apply_attribute_index(&mut self, first: usize, index: u16) {
        for v in &mut self.vertices[first..] {
            v.attribute_index = index;
        }
    }
}
