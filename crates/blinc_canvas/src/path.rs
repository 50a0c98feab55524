//! Path recording
//!
//! [`PathRecorder`] turns canvas-style path calls into commands. Shape helpers
//! (arcs, rectangles, ellipses) decompose into move/line/bezier commands here, in
//! local space, before the command buffer maps them to output space.

use std::f32::consts::{FRAC_PI_2, PI};

use blinc_core::{Vec2, Winding};

use crate::commands::{Command, CommandBuffer};
use crate::transform::TransformStack;

/// Bezier approximation constant for a quarter circle
pub const KAPPA90: f32 = 0.552_284_8;

/// Tangent distances above this make `arc_to` fall back to a straight line
const MAX_ARC_TANGENT_DISTANCE: f32 = 10000.0;

/// Radii under this make rounded rectangles plain rectangles
const MIN_CORNER_RADIUS: f32 = 0.1;

#[derive(Clone, Debug)]
pub struct PathRecorder {
    commands: CommandBuffer,
    /// Pen position in local space
    last_point: Vec2,
    dist_tolerance: f32,
}

impl PathRecorder {
    pub fn new(dist_tolerance: f32) -> Self {
        Self {
            commands: CommandBuffer::new(),
            last_point: Vec2::ZERO,
            dist_tolerance,
        }
    }

    pub fn commands(&self) -> &CommandBuffer {
        &self.commands
    }

    /// Local-space position of the pen
    pub fn last_point(&self) -> Vec2 {
        self.last_point
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn reset(&mut self) {
        self.commands.clear();
        self.last_point = Vec2::ZERO;
    }

    fn append(&mut self, command: Command, transform: &TransformStack) {
        if let Some(p) = command.end_point() {
            self.last_point = p;
        }
        self.commands.append(command, transform);
    }

    pub fn move_to(&mut self, t: &TransformStack, x: f32, y: f32) {
        self.append(Command::MoveTo(Vec2::new(x, y)), t);
    }

    pub fn line_to(&mut self, t: &TransformStack, x: f32, y: f32) {
        self.append(Command::LineTo(Vec2::new(x, y)), t);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn bezier_to(
        &mut self,
        t: &TransformStack,
        c1x: f32,
        c1y: f32,
        c2x: f32,
        c2y: f32,
        x: f32,
        y: f32,
    ) {
        self.append(
            Command::BezierTo(Vec2::new(c1x, c1y), Vec2::new(c2x, c2y), Vec2::new(x, y)),
            t,
        );
    }

    /// Quadratic curve, stored as the equivalent cubic
    pub fn quad_to(&mut self, t: &TransformStack, cx: f32, cy: f32, x: f32, y: f32) {
        let p0 = self.last_point;
        let c = Vec2::new(cx, cy);
        let p1 = Vec2::new(x, y);
        let c1 = p0 + (c - p0) * (2.0 / 3.0);
        let c2 = p1 + (c - p1) * (2.0 / 3.0);
        self.append(Command::BezierTo(c1, c2, p1), t);
    }

    pub fn close_path(&mut self, t: &TransformStack) {
        self.append(Command::Close, t);
    }

    pub fn path_winding(&mut self, t: &TransformStack, winding: Winding) {
        self.append(Command::Winding(winding), t);
    }

    /// Arc tangent to the lines pen→p1 and p1→p2
    ///
    /// Ignored when no path has been started. Degenerate input produces `line_to(p1)`.
    pub fn arc_to(
        &mut self,
        t: &TransformStack,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        radius: f32,
    ) {
        if self.commands.is_empty() {
            return;
        }

        let p0 = self.last_point;
        let p1 = Vec2::new(x1, y1);
        let p2 = Vec2::new(x2, y2);
        let tol = self.dist_tolerance;

        if p0.approx_eq(p1, tol)
            || p1.approx_eq(p2, tol)
            || dist_to_segment_squared(p1, p0, p2) < tol * tol
            || radius < tol
        {
            self.line_to(t, x1, y1);
            return;
        }

        let d0 = (p0 - p1).normalize();
        let d1 = (p2 - p1).normalize();
        let a = d0.dot(d1).clamp(-1.0, 1.0).acos();
        let d = radius / (a / 2.0).tan();

        if d > MAX_ARC_TANGENT_DISTANCE {
            tracing::trace!("arc_to tangent distance {} too large, using a line", d);
            self.line_to(t, x1, y1);
            return;
        }

        let (center, a0, a1, dir) = if d1.x * d0.y - d0.x * d1.y > 0.0 {
            (
                Vec2::new(p1.x + d0.x * d + d0.y * radius, p1.y + d0.y * d - d0.x * radius),
                d0.x.atan2(-d0.y),
                (-d1.x).atan2(d1.y),
                Winding::Cw,
            )
        } else {
            (
                Vec2::new(p1.x + d0.x * d - d0.y * radius, p1.y + d0.y * d + d0.x * radius),
                (-d0.x).atan2(d0.y),
                d1.x.atan2(-d1.y),
                Winding::Ccw,
            )
        };

        self.arc(t, center.x, center.y, radius, a0, a1, dir);
    }

    /// Circular arc from angle `a0` to `a1`, split into at most five cubic segments
    #[allow(clippy::too_many_arguments)]
    pub fn arc(
        &mut self,
        t: &TransformStack,
        cx: f32,
        cy: f32,
        r: f32,
        a0: f32,
        a1: f32,
        dir: Winding,
    ) {
        let two_pi = PI * 2.0;
        let mut da = a1 - a0;
        if dir == Winding::Cw {
            if da.abs() >= two_pi {
                da = two_pi;
            } else {
                while da < 0.0 {
                    da += two_pi;
                }
            }
        } else if da.abs() >= two_pi {
            da = -two_pi;
        } else {
            while da > 0.0 {
                da -= two_pi;
            }
        }

        let start = Vec2::new(cx + a0.cos() * r, cy + a0.sin() * r);
        let first = if self.commands.is_empty() {
            Command::MoveTo(start)
        } else {
            Command::LineTo(start)
        };
        self.append(first, t);

        if da.abs() < 1e-6 {
            return;
        }

        let ndivs = ((da.abs() / FRAC_PI_2 + 0.5) as i32).clamp(1, 5);
        let hda = (da / ndivs as f32) / 2.0;
        let mut kappa = (4.0 / 3.0 * (1.0 - hda.cos()) / hda.sin()).abs();
        if dir == Winding::Ccw {
            kappa = -kappa;
        }

        let mut prev = start;
        let mut prev_tan = Vec2::new(-a0.sin() * r * kappa, a0.cos() * r * kappa);
        for i in 1..=ndivs {
            let a = a0 + da * (i as f32 / ndivs as f32);
            let (dy, dx) = a.sin_cos();
            let p = Vec2::new(cx + dx * r, cy + dy * r);
            let tan = Vec2::new(-dy * r * kappa, dx * r * kappa);
            self.append(Command::BezierTo(prev + prev_tan, p - tan, p), t);
            prev = p;
            prev_tan = tan;
        }
    }

    pub fn rect(&mut self, t: &TransformStack, x: f32, y: f32, w: f32, h: f32) {
        self.append(Command::MoveTo(Vec2::new(x, y)), t);
        self.append(Command::LineTo(Vec2::new(x, y + h)), t);
        self.append(Command::LineTo(Vec2::new(x + w, y + h)), t);
        self.append(Command::LineTo(Vec2::new(x + w, y)), t);
        self.append(Command::Close, t);
    }

    pub fn rounded_rect(&mut self, t: &TransformStack, x: f32, y: f32, w: f32, h: f32, r: f32) {
        self.rounded_rect_varying(t, x, y, w, h, r, r, r, r);
    }

    /// Rounded rectangle with per-corner radii (top-left, top-right, bottom-right,
    /// bottom-left)
    #[allow(clippy::too_many_arguments)]
    pub fn rounded_rect_varying(
        &mut self,
        t: &TransformStack,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        rad_top_left: f32,
        rad_top_right: f32,
        rad_bottom_right: f32,
        rad_bottom_left: f32,
    ) {
        if rad_top_left < MIN_CORNER_RADIUS
            && rad_top_right < MIN_CORNER_RADIUS
            && rad_bottom_right < MIN_CORNER_RADIUS
            && rad_bottom_left < MIN_CORNER_RADIUS
        {
            self.rect(t, x, y, w, h);
            return;
        }

        let half_w = w.abs() * 0.5;
        let half_h = h.abs() * 0.5;
        let sw = sign(w);
        let sh = sign(h);
        let corner = |r: f32| Vec2::new(r.min(half_w) * sw, r.min(half_h) * sh);
        let tl = corner(rad_top_left);
        let tr = corner(rad_top_right);
        let br = corner(rad_bottom_right);
        let bl = corner(rad_bottom_left);
        let k = 1.0 - KAPPA90;

        let commands = [
            Command::MoveTo(Vec2::new(x, y + tl.y)),
            Command::LineTo(Vec2::new(x, y + h - bl.y)),
            Command::BezierTo(
                Vec2::new(x, y + h - bl.y * k),
                Vec2::new(x + bl.x * k, y + h),
                Vec2::new(x + bl.x, y + h),
            ),
            Command::LineTo(Vec2::new(x + w - br.x, y + h)),
            Command::BezierTo(
                Vec2::new(x + w - br.x * k, y + h),
                Vec2::new(x + w, y + h - br.y * k),
                Vec2::new(x + w, y + h - br.y),
            ),
            Command::LineTo(Vec2::new(x + w, y + tr.y)),
            Command::BezierTo(
                Vec2::new(x + w, y + tr.y * k),
                Vec2::new(x + w - tr.x * k, y),
                Vec2::new(x + w - tr.x, y),
            ),
            Command::LineTo(Vec2::new(x + tl.x, y)),
            Command::BezierTo(
                Vec2::new(x + tl.x * k, y),
                Vec2::new(x, y + tl.y * k),
                Vec2::new(x, y + tl.y),
            ),
            Command::Close,
        ];
        for c in commands {
            self.append(c, t);
        }
    }

    pub fn ellipse(&mut self, t: &TransformStack, cx: f32, cy: f32, rx: f32, ry: f32) {
        let kx = rx * KAPPA90;
        let ky = ry * KAPPA90;
        let commands = [
            Command::MoveTo(Vec2::new(cx - rx, cy)),
            Command::BezierTo(
                Vec2::new(cx - rx, cy + ky),
                Vec2::new(cx - kx, cy + ry),
                Vec2::new(cx, cy + ry),
            ),
            Command::BezierTo(
                Vec2::new(cx + kx, cy + ry),
                Vec2::new(cx + rx, cy + ky),
                Vec2::new(cx + rx, cy),
            ),
            Command::BezierTo(
                Vec2::new(cx + rx, cy - ky),
                Vec2::new(cx + kx, cy - ry),
                Vec2::new(cx, cy - ry),
            ),
            Command::BezierTo(
                Vec2::new(cx - kx, cy - ry),
                Vec2::new(cx - rx, cy - ky),
                Vec2::new(cx - rx, cy),
            ),
            Command::Close,
        ];
        for c in commands {
            self.append(c, t);
        }
    }

    pub fn circle(&mut self, t: &TransformStack, cx: f32, cy: f32, r: f32) {
        self.ellipse(t, cx, cy, r, r);
    }
}

fn sign(v: f32) -> f32 {
    if v >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Squared distance from `p` to the segment `a`–`b`
fn dist_to_segment_squared(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let d = ab.length_squared();
    let mut t = ab.dot(p - a);
    if d > 0.0 {
        t /= d;
    }
    let t = t.clamp(0.0, 1.0);
    (a + ab * t - p).length_squared()
}
