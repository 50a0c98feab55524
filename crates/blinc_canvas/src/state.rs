//! Render state
//!
//! Style parameters that apply to the next `stroke()`/`fill()`. The builder keeps
//! a stack of these for `push_state`/`pop_state`.

use blinc_core::{Color, LineCap, LineJoin};

use crate::atlas::ImageAtlasEntry;
use crate::config::CanvasConfig;
use crate::geometry::BlendOp;
use crate::paint::RenderStyle;

pub const DEFAULT_MITER_LIMIT: f32 = 1.8;

#[derive(Clone, Debug, PartialEq)]
pub struct RenderState {
    pub fill: RenderStyle,
    pub stroke: RenderStyle,
    pub stroke_width: f32,
    pub miter_limit: f32,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub global_alpha: f32,
    pub blend_op: BlendOp,
    pub antialias: bool,
    pub fringe_width: f32,
    /// Atlas location of the fill image, resolved on first use
    pub(crate) cached_fill_image: Option<ImageAtlasEntry>,
}

impl RenderState {
    pub fn new(config: &CanvasConfig) -> Self {
        Self {
            fill: RenderStyle::SolidColor(Color::WHITE),
            stroke: RenderStyle::SolidColor(Color::BLACK),
            stroke_width: 1.0,
            miter_limit: DEFAULT_MITER_LIMIT,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            global_alpha: 1.0,
            blend_op: BlendOp::default(),
            antialias: config.resolve_antialias(false),
            fringe_width: config.fringe_width,
            cached_fill_image: None,
        }
    }

    pub fn set_fill(&mut self, style: RenderStyle) {
        if self.fill.image_ref() != style.image_ref() {
            self.cached_fill_image = None;
        }
        self.fill = style;
    }

    pub fn set_stroke(&mut self, style: RenderStyle, width: f32) {
        self.stroke = style;
        self.stroke_width = width;
    }

    /// Fringe applied to fills and strokes, 0 without anti-aliasing
    pub fn fringe(&self) -> f32 {
        if self.antialias {
            self.fringe_width
        } else {
            0.0
        }
    }
}
