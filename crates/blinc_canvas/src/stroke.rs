//! Stroke tessellation
//!
//! Expands every flattened path into a triangle-strip ribbon. Closed paths loop
//! back onto their first vertices; open paths get a start and end cap.

use std::f32::consts::PI;

use blinc_core::{LineCap, LineJoin, Vec2};

use crate::joins::{bevel_join, round_join, JoinEdges};
use crate::path_cache::{curve_divisions, PathCache, PathPoint};
use crate::writer::{VertexRange, VertexWriter};

/// Widths above this are clamped
pub const MAX_STROKE_WIDTH: f32 = 200.0;

/// Stroke parameters after scale and anti-aliasing have been applied
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeParams {
    /// Distance from the center line to the outer ribbon edge, fringe included
    pub half_width: f32,
    /// Anti-alias fringe width, 0 without anti-aliasing
    pub fringe: f32,
    pub join: LineJoin,
    pub cap: LineCap,
    pub miter_limit: f32,
    /// Multiplier for the stroke alpha when the stroke is thinner than the fringe
    pub alpha_scale: f32,
}

impl StrokeParams {
    /// Resolves the ribbon width of a stroke drawn with `width` under a
    /// transform of `scale`
    pub fn new(
        width: f32,
        scale: f32,
        antialias: bool,
        fringe_width: f32,
        join: LineJoin,
        cap: LineCap,
        miter_limit: f32,
    ) -> Self {
        let mut raw = (width * scale).clamp(0.0, MAX_STROKE_WIDTH);
        let mut alpha_scale = 1.0;

        if antialias && raw < fringe_width {
            let ratio = (raw / fringe_width).clamp(0.0, 1.0);
            alpha_scale = ratio * ratio;
            raw = fringe_width;
        } else if raw < 1.0 {
            raw = 1.0;
        }

        let fringe = if antialias { fringe_width } else { 0.0 };
        Self {
            half_width: raw * 0.5 + fringe,
            fringe,
            join,
            cap,
            miter_limit,
            alpha_scale,
        }
    }

    /// u coordinates of the left and right ribbon edges
    fn edge_u(&self) -> (f32, f32) {
        if self.fringe > 0.0 {
            (0.0, 1.0)
        } else {
            (0.5, 0.5)
        }
    }
}

/// Computes joins and returns the cap segment count and the vertex bound
pub fn prepare_stroke(cache: &mut PathCache, params: &StrokeParams) -> (usize, usize) {
    let ncap = curve_divisions(params.half_width, PI, cache.tess_tolerance());
    cache.compute_joins(params.half_width, params.join, params.miter_limit);
    let max = cache.stroke_vertex_count(params.join, params.cap, ncap);
    (ncap, max)
}

/// Writes one triangle strip per path with at least two points
pub fn expand_stroke(
    cache: &PathCache,
    writer: &mut VertexWriter,
    params: &StrokeParams,
    ncap: usize,
) -> Vec<VertexRange> {
    let w = params.half_width;
    let aa = params.fringe;
    let (u0, u1) = params.edge_u();
    let edges = JoinEdges {
        lw: w,
        rw: w,
        lu: u0,
        ru: u1,
    };

    let mut ranges = Vec::with_capacity(cache.paths.len());
    for path in &cache.paths {
        let pts = cache.points_of(path);
        if pts.len() < 2 {
            continue;
        }

        let (mut p0, interior) = if path.closed {
            (pts[pts.len() - 1], &pts[..])
        } else {
            let (d, _) = (pts[1].pos - pts[0].pos).normalize_with_length();
            match params.cap {
                LineCap::Butt => butt_cap_start(writer, pts[0].pos, d, w, -aa, aa, u0, u1),
                LineCap::Square => butt_cap_start(writer, pts[0].pos, d, w, w - aa, aa, u0, u1),
                LineCap::Round => round_cap_start(writer, pts[0].pos, d, w, ncap, u0, u1),
            }
            (pts[0], &pts[1..pts.len() - 1])
        };

        for p1 in interior {
            emit_join(writer, &p0, p1, edges, params.join, ncap);
            p0 = *p1;
        }

        if path.closed {
            if let (Some(a), Some(b)) = (writer.batch_vertex(0), writer.batch_vertex(1)) {
                writer.add(a, u0, 1.0);
                writer.add(b, u1, 1.0);
            }
        } else {
            let p1 = pts[pts.len() - 1];
            let (d, _) = (p1.pos - p0.pos).normalize_with_length();
            match params.cap {
                LineCap::Butt => butt_cap_end(writer, p1.pos, d, w, -aa, aa, u0, u1),
                LineCap::Square => butt_cap_end(writer, p1.pos, d, w, w - aa, aa, u0, u1),
                LineCap::Round => round_cap_end(writer, p1.pos, d, w, ncap, u0, u1),
            }
        }

        ranges.push(writer.finish_batch());
    }
    ranges
}

fn emit_join(
    writer: &mut VertexWriter,
    p0: &PathPoint,
    p1: &PathPoint,
    edges: JoinEdges,
    join: LineJoin,
    ncap: usize,
) {
    if p1.flags.is_beveled() {
        if join == LineJoin::Round {
            round_join(writer, p0, p1, edges, ncap);
        } else {
            bevel_join(writer, p0, p1, edges);
        }
    } else {
        writer.add(p1.pos + p1.dm * edges.lw, edges.lu, 1.0);
        writer.add(p1.pos - p1.dm * edges.rw, edges.ru, 1.0);
    }
}

#[allow(clippy::too_many_arguments)]
fn butt_cap_start(
    writer: &mut VertexWriter,
    pos: Vec2,
    d: Vec2,
    w: f32,
    offset: f32,
    aa: f32,
    u0: f32,
    u1: f32,
) {
    let p = pos - d * offset;
    let dl = d.perp();
    if aa > 0.0 {
        writer.add(p + dl * w - d * aa, u0, 0.0);
        writer.add(p - dl * w - d * aa, u1, 0.0);
    }
    writer.add(p + dl * w, u0, 1.0);
    writer.add(p - dl * w, u1, 1.0);
}

#[allow(clippy::too_many_arguments)]
fn butt_cap_end(
    writer: &mut VertexWriter,
    pos: Vec2,
    d: Vec2,
    w: f32,
    offset: f32,
    aa: f32,
    u0: f32,
    u1: f32,
) {
    let p = pos + d * offset;
    let dl = d.perp();
    writer.add(p + dl * w, u0, 1.0);
    writer.add(p - dl * w, u1, 1.0);
    if aa > 0.0 {
        writer.add(p + dl * w + d * aa, u0, 0.0);
        writer.add(p - dl * w + d * aa, u1, 0.0);
    }
}

fn round_cap_start(
    writer: &mut VertexWriter,
    p: Vec2,
    d: Vec2,
    w: f32,
    ncap: usize,
    u0: f32,
    u1: f32,
) {
    let dl = d.perp();
    for i in 0..ncap {
        let a = i as f32 / (ncap - 1) as f32 * PI;
        let (ax, ay) = (a.cos() * w, a.sin() * w);
        writer.add(p - dl * ax - d * ay, u0, 1.0);
        writer.add(p, 0.5, 1.0);
    }
    writer.add(p + dl * w, u0, 1.0);
    writer.add(p - dl * w, u1, 1.0);
}

fn round_cap_end(
    writer: &mut VertexWriter,
    p: Vec2,
    d: Vec2,
    w: f32,
    ncap: usize,
    u0: f32,
    u1: f32,
) {
    let dl = d.perp();
    writer.add(p + dl * w, u0, 1.0);
    writer.add(p - dl * w, u1, 1.0);
    for i in 0..ncap {
        let a = i as f32 / (ncap - 1) as f32 * PI;
        let (ax, ay) = (a.cos() * w, a.sin() * w);
        writer.add(p, 0.5, 1.0);
        writer.add(p - dl * ax + d * ay, u0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use crate::path_cache::PointFlags;

    fn polyline(points: &[(f32, f32)], closed: bool) -> PathCache {
        let mut cache = PathCache::new(0.01, 0.25);
        cache.add_path();
        for &(x, y) in points {
            cache.add_point(Vec2::new(x, y), PointFlags::CORNER);
        }
        if closed {
            cache.close_path();
        }
        cache.compute_deltas();
        cache
    }

    fn params(width: f32, aa: bool, join: LineJoin, cap: LineCap) -> StrokeParams {
        StrokeParams::new(width, 1.0, aa, 1.0, join, cap, 1.8)
    }

    fn stroke(cache: &mut PathCache, params: &StrokeParams) -> (Geometry, Vec<VertexRange>, usize) {
        let (ncap, max) = prepare_stroke(cache, params);
        let mut geometry = Geometry::new();
        let mut writer = VertexWriter::new(&mut geometry, max, 0);
        let ranges = expand_stroke(cache, &mut writer, params, ncap);
        (geometry, ranges, max)
    }

    #[test]
    fn test_straight_butt_line() {
        let mut cache = polyline(&[(0.0, 0.0), (100.0, 0.0)], false);
        let (geometry, ranges, _) =
            stroke(&mut cache, &params(10.0, false, LineJoin::Miter, LineCap::Butt));

        assert_eq!(ranges, vec![VertexRange { offset: 0, count: 4 }]);
        let mut positions: Vec<_> = geometry.vertices.iter().map(|v| v.pos).collect();
        positions.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(
            positions,
            vec![[0.0, -5.0], [0.0, 5.0], [100.0, -5.0], [100.0, 5.0]]
        );
        assert!(geometry.vertices.iter().all(|v| v.uv == [0.5, 1.0]));
    }

    #[test]
    fn test_square_cap_extends_line() {
        let mut cache = polyline(&[(0.0, 0.0), (100.0, 0.0)], false);
        let (geometry, _, _) =
            stroke(&mut cache, &params(10.0, false, LineJoin::Miter, LineCap::Square));
        assert_eq!(geometry.bounds_min, Vec2::new(-5.0, -5.0));
        assert_eq!(geometry.bounds_max, Vec2::new(105.0, 5.0));
    }

    #[test]
    fn test_antialiased_caps_add_fringe() {
        let mut cache = polyline(&[(0.0, 0.0), (100.0, 0.0)], false);
        let p = params(10.0, true, LineJoin::Miter, LineCap::Butt);
        assert_eq!(p.half_width, 6.0);
        let (geometry, ranges, _) = stroke(&mut cache, &p);

        assert_eq!(ranges[0].count, 8);
        // cap fringe vertices fade out
        assert_eq!(geometry.vertices[0].uv[1], 0.0);
        assert_eq!(geometry.vertices[2].uv, [0.0, 1.0]);
        assert_eq!(geometry.vertices[3].uv, [1.0, 1.0]);
    }

    #[test]
    fn test_thin_stroke_scales_alpha() {
        let p = StrokeParams::new(0.5, 1.0, true, 1.0, LineJoin::Miter, LineCap::Butt, 1.8);
        assert_eq!(p.alpha_scale, 0.25);
        assert_eq!(p.half_width, 1.5);

        let p = StrokeParams::new(0.5, 1.0, false, 1.0, LineJoin::Miter, LineCap::Butt, 1.8);
        assert_eq!(p.alpha_scale, 1.0);
        assert_eq!(p.half_width, 0.5);

        let p = StrokeParams::new(1000.0, 1.0, false, 1.0, LineJoin::Miter, LineCap::Butt, 1.8);
        assert_eq!(p.half_width, MAX_STROKE_WIDTH * 0.5);
    }

    #[test]
    fn test_closed_path_loops() {
        let mut cache = polyline(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)], true);
        let (geometry, ranges, _) =
            stroke(&mut cache, &params(2.0, false, LineJoin::Miter, LineCap::Butt));

        assert_eq!(ranges[0].count, 4 * 2 + 2);
        let n = geometry.vertices.len();
        assert_eq!(geometry.vertices[n - 2].pos, geometry.vertices[0].pos);
        assert_eq!(geometry.vertices[n - 1].pos, geometry.vertices[1].pos);
    }

    #[test]
    fn test_single_point_path_skipped() {
        let mut cache = polyline(&[(5.0, 5.0)], false);
        let (geometry, ranges, _) =
            stroke(&mut cache, &params(2.0, false, LineJoin::Miter, LineCap::Round));
        assert!(ranges.is_empty());
        assert!(geometry.vertices.is_empty());
    }

    #[test]
    fn test_vertex_bound_holds_for_every_style() {
        let shapes: [(&[(f32, f32)], bool); 4] = [
            (&[(0.0, 0.0), (50.0, 0.0)], false),
            (&[(0.0, 0.0), (50.0, 0.0), (50.0, 50.0), (0.0, 50.0)], true),
            (&[(0.0, 0.0), (40.0, 1.0), (0.0, 2.0), (40.0, 3.0)], false),
            (&[(0.0, 0.0), (20.0, 20.0), (40.0, 0.0), (20.0, 10.0)], true),
        ];
        let joins = [LineJoin::Miter, LineJoin::Round, LineJoin::Bevel];
        let caps = [LineCap::Butt, LineCap::Round, LineCap::Square];

        for (points, closed) in shapes {
            for join in joins {
                for cap in caps {
                    for aa in [false, true] {
                        for width in [1.0, 6.0, 30.0] {
                            let mut cache = polyline(points, closed);
                            let p = params(width, aa, join, cap);
                            let (geometry, ranges, max) = stroke(&mut cache, &p);
                            let written: usize = ranges.iter().map(|r| r.count).sum();
                            assert_eq!(written, geometry.vertices.len());
                            assert!(
                                written <= max,
                                "{:?} {:?} aa={} w={}: {} > {}",
                                join,
                                cap,
                                aa,
                                width,
                                written,
                                max
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_round_join_ribbon_stays_within_width() {
        let mut cache = polyline(&[(0.0, 0.0), (50.0, 0.0), (50.0, 50.0)], false);
        let (geometry, _, _) =
            stroke(&mut cache, &params(8.0, false, LineJoin::Round, LineCap::Round));
        let corner = Vec2::new(50.0, 0.0);
        for v in &geometry.vertices {
            let p = v.position();
            let near_corner = (p - corner).length();
            if p.x > 46.0 && p.y < 4.0 {
                assert!(near_corner <= 4.0 * 2f32.sqrt() + 1e-3);
            }
        }
    }
}
