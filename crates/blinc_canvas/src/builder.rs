//! Geometry builder
//!
//! The public drawing surface. Path and transform calls record commands; each
//! `stroke()`/`fill()` flattens the recorded path, tessellates it with the current
//! render state and appends tagged batches to the pending [`Geometry`].
//!
//! # Example
//!
//! ```ignore
//! use blinc_canvas::{CanvasConfig, GeometryBuilder};
//! use blinc_core::Color;
//!
//! let mut builder = GeometryBuilder::new(CanvasConfig::default());
//! builder.begin_path();
//! builder.rounded_rect(10.0, 10.0, 200.0, 80.0, 8.0);
//! builder.fill_color(Color::BLUE);
//! builder.fill();
//!
//! let geometry = builder.extract();
//! ```

use std::mem;
use std::sync::Arc;

use blinc_core::{Affine2D, Color, LineCap, LineJoin, Vec2, Winding};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::atlas::{GlyphAtlas, ImageAtlas, ImageAtlasEntry};
use crate::config::CanvasConfig;
use crate::fill::{expand_fill_fringe, expand_fill_rings, prepare_fill, write_mask_quad};
use crate::flatten::flatten_commands;
use crate::geometry::{Attributes, Batch, BatchPacking, BatchType, BlendOp, Geometry, Vertex};
use crate::glyph::{write_glyph_quads, GlyphEntry};
use crate::paint::{apply_paint_uv, RenderStyle};
use crate::path::PathRecorder;
use crate::path_cache::PathCache;
use crate::state::RenderState;
use crate::stroke::{expand_stroke, prepare_stroke, StrokeParams};
use crate::transform::TransformStack;
use crate::writer::{VertexRange, VertexWriter};

/// Attribute tables up to this size are searched linearly
const LINEAR_SCAN_LIMIT: usize = 4;

/// Custom renderer selection stamped on batches
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct RendererTag {
    index: u8,
    data_offset: u32,
    data_size: u32,
}

/// Paint settings shared by every batch of one draw call
#[derive(Clone, Copy)]
struct BatchParams {
    op: BlendOp,
    attribute_index: u16,
    atlas_index: u16,
    renderer: RendererTag,
}

pub struct GeometryBuilder {
    config: CanvasConfig,
    geometry: Geometry,
    attribute_map: FxHashMap<Attributes, u16>,

    transform: TransformStack,
    path: PathRecorder,
    cache: PathCache,

    state: RenderState,
    state_stack: SmallVec<[RenderState; 4]>,

    style_pivot: Vec2,
    pivot_stack: SmallVec<[Vec2; 4]>,

    renderer: RendererTag,
    renderer_stack: SmallVec<[RendererTag; 4]>,

    image_atlas: Option<Arc<dyn ImageAtlas>>,
}

impl GeometryBuilder {
    pub fn new(config: CanvasConfig) -> Self {
        if let Err(err) = config.validate() {
            tracing::warn!(%err, "invalid canvas config");
        }
        Self {
            geometry: Geometry::new(),
            attribute_map: FxHashMap::default(),
            transform: TransformStack::new(),
            path: PathRecorder::new(config.dist_tolerance),
            cache: PathCache::new(config.dist_tolerance, config.tess_tolerance),
            state: RenderState::new(&config),
            state_stack: SmallVec::new(),
            style_pivot: Vec2::ZERO,
            pivot_stack: SmallVec::new(),
            renderer: RendererTag::default(),
            renderer_stack: SmallVec::new(),
            image_atlas: None,
            config,
        }
    }

    /// Attaches the atlas used to resolve image pattern fills
    pub fn with_image_atlas(mut self, atlas: Arc<dyn ImageAtlas>) -> Self {
        self.set_image_atlas(atlas);
        self
    }

    pub fn set_image_atlas(&mut self, atlas: Arc<dyn ImageAtlas>) {
        self.image_atlas = Some(atlas);
        self.state.cached_fill_image = None;
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Clears pending output and returns every stack and state to its default
    pub fn reset(&mut self) {
        self.geometry.clear();
        self.attribute_map.clear();
        self.transform.reset();
        self.path.reset();
        self.cache.reset();
        self.state = RenderState::new(&self.config);
        self.state_stack.clear();
        self.style_pivot = Vec2::ZERO;
        self.pivot_stack.clear();
        self.renderer = RendererTag::default();
        self.renderer_stack.clear();
    }

    /// Moves the pending output out of the builder
    ///
    /// Renderer payload offsets refer to the extracted geometry, so the renderer
    /// tag returns to its default.
    pub fn extract(&mut self) -> Geometry {
        let geometry = mem::take(&mut self.geometry);
        self.attribute_map.clear();
        self.renderer = RendererTag::default();
        self.renderer_stack.clear();

        tracing::trace!(
            vertices = geometry.vertices.len(),
            batches = geometry.batches.len(),
            attributes = geometry.attributes.len(),
            "extracted canvas geometry"
        );
        geometry
    }

    /// Output written since the last `extract()` or `reset()`
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    // ========================================================================
    // Transforms
    // ========================================================================

    pub fn current_transform(&self) -> &Affine2D {
        self.transform.current()
    }

    pub fn transform(&mut self, transform: &Affine2D) {
        self.transform.transform(transform);
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.transform.translate(x, y);
    }

    pub fn rotate(&mut self, angle: f32) {
        self.transform.rotate(angle);
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.transform.scale(x, y);
    }

    pub fn skew_x(&mut self, angle: f32) {
        self.transform.skew_x(angle);
    }

    pub fn skew_y(&mut self, angle: f32) {
        self.transform.skew_y(angle);
    }

    /// Shifts output positions without composing through the current matrix
    pub fn offset(&mut self, x: f32, y: f32) {
        self.transform.offset(x, y);
    }

    pub fn reset_transform(&mut self) {
        self.transform.reset_current();
    }

    pub fn push_transform(&mut self) {
        self.transform.push();
    }

    pub fn pop_transform(&mut self) {
        self.transform.pop();
    }

    // ========================================================================
    // Paths
    // ========================================================================

    pub fn begin_path(&mut self) {
        self.path.clear();
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.path.move_to(&self.transform, x, y);
    }

    pub fn line_to(&mut self, x: f32, y: f32) {
        self.path.line_to(&self.transform, x, y);
    }

    pub fn bezier_to(&mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) {
        self.path.bezier_to(&self.transform, c1x, c1y, c2x, c2y, x, y);
    }

    pub fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        self.path.quad_to(&self.transform, cx, cy, x, y);
    }

    pub fn arc_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, radius: f32) {
        self.path.arc_to(&self.transform, x1, y1, x2, y2, radius);
    }

    pub fn arc(&mut self, cx: f32, cy: f32, r: f32, a0: f32, a1: f32, dir: Winding) {
        self.path.arc(&self.transform, cx, cy, r, a0, a1, dir);
    }

    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.path.rect(&self.transform, x, y, w, h);
    }

    pub fn rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, r: f32) {
        self.path.rounded_rect(&self.transform, x, y, w, h, r);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn rounded_rect_varying(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        top_left: f32,
        top_right: f32,
        bottom_right: f32,
        bottom_left: f32,
    ) {
        self.path.rounded_rect_varying(
            &self.transform,
            x,
            y,
            w,
            h,
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        );
    }

    pub fn ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32) {
        self.path.ellipse(&self.transform, cx, cy, rx, ry);
    }

    pub fn circle(&mut self, cx: f32, cy: f32, r: f32) {
        self.path.circle(&self.transform, cx, cy, r);
    }

    pub fn close_path(&mut self) {
        self.path.close_path(&self.transform);
    }

    /// Declares the current sub-path solid (`Ccw`) or a hole (`Cw`)
    pub fn path_winding(&mut self, winding: Winding) {
        self.path.path_winding(&self.transform, winding);
    }

    // ========================================================================
    // Render state
    // ========================================================================

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn fill_color(&mut self, color: Color) {
        self.state.set_fill(RenderStyle::SolidColor(color));
    }

    pub fn fill_paint(&mut self, style: RenderStyle) {
        self.state.set_fill(style);
    }

    pub fn stroke_color(&mut self, color: Color, width: f32) {
        self.state.set_stroke(RenderStyle::SolidColor(color), width);
    }

    pub fn stroke_paint(&mut self, style: RenderStyle, width: f32) {
        self.state.set_stroke(style, width);
    }

    pub fn miter_limit(&mut self, limit: f32) {
        self.state.miter_limit = limit;
    }

    pub fn line_cap(&mut self, cap: LineCap) {
        self.state.line_cap = cap;
    }

    pub fn line_join(&mut self, join: LineJoin) {
        self.state.line_join = join;
    }

    pub fn global_alpha(&mut self, alpha: f32) {
        self.state.global_alpha = alpha;
    }

    /// Requests fringe anti-aliasing, subject to the configuration
    pub fn antialiasing(&mut self, enabled: bool) {
        self.state.antialias = self.config.resolve_antialias(enabled);
    }

    pub fn blending(&mut self, op: BlendOp) {
        self.state.blend_op = op;
    }

    pub fn push_state(&mut self) {
        self.state_stack.push(self.state.clone());
    }

    pub fn pop_state(&mut self) {
        if let Some(state) = self.state_stack.pop() {
            self.state = state;
        }
    }

    pub fn reset_state(&mut self) {
        self.state = RenderState::new(&self.config);
    }

    // ========================================================================
    // Style pivot
    // ========================================================================

    /// Output-space origin subtracted before paint coordinates are computed
    pub fn style_pivot(&mut self, x: f32, y: f32) {
        self.style_pivot = Vec2::new(x, y);
    }

    pub fn push_style_pivot(&mut self) {
        self.pivot_stack.push(self.style_pivot);
    }

    pub fn pop_style_pivot(&mut self) {
        self.style_pivot = self.pivot_stack.pop().unwrap_or(Vec2::ZERO);
    }

    pub fn reset_style_pivot(&mut self) {
        self.style_pivot = Vec2::ZERO;
        self.pivot_stack.clear();
    }

    // ========================================================================
    // Custom renderers
    // ========================================================================

    /// Tags following batches with a custom renderer and its payload
    pub fn select_renderer(&mut self, index: u8, data: &[u8]) {
        self.renderer = if data.is_empty() {
            RendererTag {
                index,
                ..RendererTag::default()
            }
        } else {
            RendererTag {
                index,
                data_offset: self.geometry.push_custom_data(data),
                data_size: data.len() as u32,
            }
        };
    }

    pub fn push_renderer(&mut self) {
        self.renderer_stack.push(self.renderer);
    }

    pub fn pop_renderer(&mut self) {
        self.renderer = self.renderer_stack.pop().unwrap_or_default();
    }

    // ========================================================================
    // Drawing
    // ========================================================================

    /// Strokes the current path with the stroke style
    pub fn stroke(&mut self) {
        self.flatten();
        if self.cache.paths.iter().all(|p| p.count < 2) {
            return;
        }

        let state = &self.state;
        let params = StrokeParams::new(
            state.stroke_width,
            self.transform.current().average_scale(),
            state.antialias,
            state.fringe_width,
            state.line_join,
            state.line_cap,
            state.miter_limit,
        );
        let style = state.stroke;
        let image = self.resolve_image(&style);

        let mut flags = Vertex::MASK_STROKE | image_flags(&style, image.as_ref());
        if params.fringe > 0.0 {
            flags |= Vertex::MASK_HAS_FRINGE;
        }

        let (ncap, max) = prepare_stroke(&mut self.cache, &params);
        let first = self.geometry.vertices.len();
        let mut writer = VertexWriter::new(&mut self.geometry, max, flags);
        let ranges = expand_stroke(&self.cache, &mut writer, &params, ncap);

        let attribute_index = self.map_style(&style, self.state.stroke_width);
        let color = if attribute_index == 0 {
            style
                .inner_color()
                .scale_alpha(self.state.global_alpha * params.alpha_scale)
        } else {
            Color::WHITE.scale_alpha(params.alpha_scale)
        };
        self.geometry.apply_color(first, color);
        self.geometry.apply_attribute_index(first, attribute_index);
        self.apply_paint(first, self.geometry.vertices.len(), &style, image.as_ref());

        let batch = BatchParams {
            op: self.state.blend_op,
            attribute_index,
            atlas_index: atlas_index(&style, image.as_ref()),
            renderer: self.renderer,
        };
        for range in &ranges {
            self.push_batch(*range, BatchPacking::TriangleStrip, BatchType::FillConvex, batch);
        }

        tracing::trace!(
            paths = ranges.len(),
            vertices = self.geometry.vertices.len() - first,
            reserved = max,
            "stroke"
        );
    }

    /// Fills the current path with the fill style
    pub fn fill(&mut self) {
        self.flatten();
        if self.cache.paths.iter().all(|p| p.count < 3) {
            return;
        }

        let fringe = self.state.fringe();
        let style = self.state.fill;
        let image = self.resolve_fill_image();
        let image_flags = image_flags(&style, image.as_ref());

        let (convex, max) = prepare_fill(&mut self.cache, fringe);
        let first = self.geometry.vertices.len();

        let core_flags = if convex {
            Vertex::MASK_FILL | Vertex::MASK_IS_CONVEX | image_flags
        } else {
            Vertex::MASK_FILL
        };
        let mut writer = VertexWriter::new(&mut self.geometry, max, core_flags);
        let rings = expand_fill_rings(&self.cache, &mut writer, fringe);

        let mask = (!convex).then(|| {
            writer.set_flags(Vertex::MASK_FILL | Vertex::MASK_IS_CONVEX | image_flags);
            write_mask_quad(&mut writer, self.cache.bounds_min, self.cache.bounds_max)
        });

        // image fills are drawn without a fringe
        let fringes = if fringe > 0.0 && image.is_none() {
            writer.set_flags(Vertex::MASK_STROKE | Vertex::MASK_HAS_FRINGE);
            expand_fill_fringe(&self.cache, &mut writer, fringe, convex)
        } else {
            Vec::new()
        };

        let attribute_index = self.map_style(&style, 1.0);
        let color = if attribute_index == 0 {
            style.inner_color().scale_alpha(self.state.global_alpha)
        } else {
            Color::WHITE
        };
        self.geometry.apply_color(first, color);
        self.geometry.apply_attribute_index(first, attribute_index);

        let batch = BatchParams {
            op: self.state.blend_op,
            attribute_index,
            atlas_index: atlas_index(&style, image.as_ref()),
            renderer: self.renderer,
        };

        match mask {
            None => {
                for range in &rings {
                    self.apply_paint(range.offset, range.end(), &style, image.as_ref());
                    self.push_batch(*range, BatchPacking::TriangleFan, BatchType::FillConvex, batch);
                }
            }
            Some(mask) => {
                let coverage = BatchParams {
                    op: BlendOp::Copy,
                    atlas_index: 0,
                    renderer: RendererTag::default(),
                    ..batch
                };
                for range in &rings {
                    self.push_batch(*range, BatchPacking::TriangleFan, BatchType::FillConcave, coverage);
                }
                self.apply_paint(mask.offset, mask.end(), &style, image.as_ref());
                self.push_batch(mask, BatchPacking::Quads, BatchType::ConcaveMask, batch);
            }
        }

        // fringe strips keep their fade uvs
        for range in &fringes {
            self.push_batch(*range, BatchPacking::TriangleStrip, BatchType::FillConvex, batch);
        }

        tracing::trace!(
            paths = rings.len(),
            convex,
            fringe = !fringes.is_empty(),
            vertices = self.geometry.vertices.len() - first,
            reserved = max,
            "fill"
        );
    }

    /// Emits one textured quad per rasterized glyph
    pub fn print<A: GlyphAtlas + ?Sized>(&mut self, glyphs: &[GlyphEntry], atlas: &A) {
        let Some(run) = write_glyph_quads(
            &mut self.geometry,
            &self.transform,
            glyphs,
            atlas,
            self.state.global_alpha,
        ) else {
            return;
        };

        let batch = BatchParams {
            op: self.state.blend_op,
            attribute_index: 0,
            atlas_index: 0,
            renderer: self.renderer,
        };
        self.push_batch(run.range, BatchPacking::Quads, BatchType::FillConvex, batch);
        if let Some(last) = self.geometry.batches.last_mut() {
            last.glyph_page_mask = run.page_mask;
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Rebuilds the path cache from the recorded commands
    fn flatten(&mut self) {
        self.cache.reset();
        flatten_commands(self.path.commands(), &mut self.cache);
        self.cache.compute_deltas();
    }

    fn resolve_image(&self, style: &RenderStyle) -> Option<ImageAtlasEntry> {
        let image = style.image_ref()?;
        let entry = self.image_atlas.as_ref()?.resolve(image);
        if entry.is_none() {
            tracing::debug!(
                atlas = image.atlas_index,
                entry = image.entry_index,
                "image not found in atlas"
            );
        }
        entry
    }

    fn resolve_fill_image(&mut self) -> Option<ImageAtlasEntry> {
        if self.state.fill.image_ref().is_none() {
            return None;
        }
        if let Some(entry) = self.state.cached_fill_image {
            return Some(entry);
        }
        let style = self.state.fill;
        let entry = self.resolve_image(&style);
        self.state.cached_fill_image = entry;
        entry
    }

    /// Returns the 1-based attribute index of a style, 0 for inline colors
    fn map_style(&mut self, style: &RenderStyle, width: f32) -> u16 {
        if !style.attributes_needed() && width == 1.0 {
            return 0;
        }

        let attributes = style.to_attributes(width, self.state.global_alpha);
        let table = &mut self.geometry.attributes;

        if table.len() <= LINEAR_SCAN_LIMIT {
            if let Some(i) = table.iter().position(|a| *a == attributes) {
                return (i + 1) as u16;
            }
        } else if let Some(&index) = self.attribute_map.get(&attributes) {
            return index;
        }

        if table.len() >= u16::MAX as usize {
            tracing::warn!("attribute table full, falling back to inline color");
            return 0;
        }

        table.push(attributes);
        let index = table.len() as u16;
        self.attribute_map.insert(attributes, index);
        index
    }

    fn apply_paint(
        &mut self,
        start: usize,
        end: usize,
        style: &RenderStyle,
        image: Option<&ImageAtlasEntry>,
    ) {
        if !style.xform_needed() {
            return;
        }
        let inverse = self.transform.inverse();
        apply_paint_uv(
            &mut self.geometry.vertices[start..end],
            style,
            &inverse,
            self.style_pivot,
            image,
        );
    }

    fn push_batch(
        &mut self,
        range: VertexRange,
        packing: BatchPacking,
        kind: BatchType,
        params: BatchParams,
    ) {
        if range.is_empty() {
            return;
        }
        self.geometry.batches.push(Batch {
            vertex_offset: range.offset as u32,
            vertex_count: range.count as u32,
            packing,
            kind,
            op: params.op,
            attribute_index: params.attribute_index,
            atlas_index: params.atlas_index,
            renderer_index: params.renderer.index,
            render_data_offset: params.renderer.data_offset,
            render_data_size: params.renderer.data_size,
            glyph_page_mask: 0,
        });
    }
}

fn image_flags(style: &RenderStyle, image: Option<&ImageAtlasEntry>) -> u16 {
    match (style.image(), image) {
        (Some(paint), Some(_)) => {
            let mut flags = Vertex::MASK_HAS_IMAGE;
            if paint.wrap_u {
                flags |= Vertex::MASK_HAS_WRAP_U;
            }
            if paint.wrap_v {
                flags |= Vertex::MASK_HAS_WRAP_V;
            }
            flags
        }
        _ => 0,
    }
}

fn atlas_index(style: &RenderStyle, image: Option<&ImageAtlasEntry>) -> u16 {
    match (style.image_ref(), image) {
        (Some(image), Some(_)) => image.atlas_index,
        _ => 0,
    }
}
