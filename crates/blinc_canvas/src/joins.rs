//! Join geometry shared by the stroke and fill-fringe tessellators
//!
//! A join is emitted as pairs of (left, right) vertices continuing the triangle
//! strip. `lw`/`rw` are the offsets of the left and right ribbon edges, `lu`/`ru`
//! their u coordinates.

use std::f32::consts::PI;

use blinc_core::Vec2;

use crate::path_cache::{PathPoint, PointFlags};
use crate::writer::VertexWriter;

#[derive(Clone, Copy, Debug)]
pub(crate) struct JoinEdges {
    pub lw: f32,
    pub rw: f32,
    pub lu: f32,
    pub ru: f32,
}

/// Outer join corners: both segment normals when the inner side is beveled,
/// otherwise the miter point twice
fn choose_bevel(inner_bevel: bool, p0: &PathPoint, p1: &PathPoint, w: f32) -> (Vec2, Vec2) {
    if inner_bevel {
        (p1.pos + p0.d.perp() * w, p1.pos + p1.d.perp() * w)
    } else {
        let m = p1.pos + p1.dm * w;
        (m, m)
    }
}

pub(crate) fn bevel_join(writer: &mut VertexWriter, p0: &PathPoint, p1: &PathPoint, e: JoinEdges) {
    let JoinEdges { lw, rw, lu, ru } = e;
    let dl0 = p0.d.perp();
    let dl1 = p1.d.perp();
    let inner = p1.flags.contains(PointFlags::INNER_BEVEL);
    let outer = p1.flags.contains(PointFlags::BEVEL);

    if p1.flags.contains(PointFlags::LEFT) {
        let (l0, l1) = choose_bevel(inner, p0, p1, lw);
        let r0 = p1.pos - dl0 * rw;
        let r1 = p1.pos - dl1 * rw;

        writer.add(l0, lu, 1.0);
        writer.add(r0, ru, 1.0);

        if outer {
            writer.add(l0, lu, 1.0);
            writer.add(r0, ru, 1.0);
            writer.add(l1, lu, 1.0);
            writer.add(r1, ru, 1.0);
        } else {
            let rm = p1.pos - p1.dm * rw;
            writer.add(p1.pos, 0.5, 1.0);
            writer.add(r0, ru, 1.0);
            writer.add(rm, ru, 1.0);
            writer.add(rm, ru, 1.0);
            writer.add(p1.pos, 0.5, 1.0);
            writer.add(r1, ru, 1.0);
        }

        writer.add(l1, lu, 1.0);
        writer.add(r1, ru, 1.0);
    } else {
        let (r0, r1) = choose_bevel(inner, p0, p1, -rw);
        let l0 = p1.pos + dl0 * lw;
        let l1 = p1.pos + dl1 * lw;

        writer.add(l0, lu, 1.0);
        writer.add(r0, ru, 1.0);

        if outer {
            writer.add(l0, lu, 1.0);
            writer.add(r0, ru, 1.0);
            writer.add(l1, lu, 1.0);
            writer.add(r1, ru, 1.0);
        } else {
            let lm = p1.pos + p1.dm * lw;
            writer.add(l0, lu, 1.0);
            writer.add(p1.pos, 0.5, 1.0);
            writer.add(lm, lu, 1.0);
            writer.add(lm, lu, 1.0);
            writer.add(l1, lu, 1.0);
            writer.add(p1.pos, 0.5, 1.0);
        }

        writer.add(l1, lu, 1.0);
        writer.add(r1, ru, 1.0);
    }
}

pub(crate) fn round_join(
    writer: &mut VertexWriter,
    p0: &PathPoint,
    p1: &PathPoint,
    e: JoinEdges,
    ncap: usize,
) {
    let JoinEdges { lw, rw, lu, ru } = e;
    let dl0 = p0.d.perp();
    let dl1 = p1.d.perp();
    let inner = p1.flags.contains(PointFlags::INNER_BEVEL);

    if p1.flags.contains(PointFlags::LEFT) {
        let (l0, l1) = choose_bevel(inner, p0, p1, lw);
        let a0 = (-dl0.y).atan2(-dl0.x);
        let mut a1 = (-dl1.y).atan2(-dl1.x);
        if a1 > a0 {
            a1 -= PI * 2.0;
        }

        writer.add(l0, lu, 1.0);
        writer.add(p1.pos - dl0 * rw, ru, 1.0);

        let n = arc_steps(a0 - a1, ncap);
        for i in 0..n {
            let a = a0 + (i as f32 / (n - 1) as f32) * (a1 - a0);
            writer.add(p1.pos, 0.5, 1.0);
            writer.add(p1.pos + Vec2::new(a.cos(), a.sin()) * rw, ru, 1.0);
        }

        writer.add(l1, lu, 1.0);
        writer.add(p1.pos - dl1 * rw, ru, 1.0);
    } else {
        let (r0, r1) = choose_bevel(inner, p0, p1, -rw);
        let a0 = dl0.y.atan2(dl0.x);
        let mut a1 = dl1.y.atan2(dl1.x);
        if a1 < a0 {
            a1 += PI * 2.0;
        }

        writer.add(p1.pos + dl0 * lw, lu, 1.0);
        writer.add(r0, ru, 1.0);

        let n = arc_steps(a1 - a0, ncap);
        for i in 0..n {
            let a = a0 + (i as f32 / (n - 1) as f32) * (a1 - a0);
            writer.add(p1.pos + Vec2::new(a.cos(), a.sin()) * lw, lu, 1.0);
            writer.add(p1.pos, 0.5, 1.0);
        }

        writer.add(p1.pos + dl1 * lw, lu, 1.0);
        writer.add(r1, ru, 1.0);
    }
}

/// Fan steps for a turn of `sweep` radians, at most `ncap`
fn arc_steps(sweep: f32, ncap: usize) -> usize {
    let n = (sweep / PI * ncap as f32).ceil();
    (n.max(2.0) as usize).clamp(2, ncap.max(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use crate::path_cache::PathCache;
    use blinc_core::LineJoin;

    /// Right angle corner at (10, 0)
    fn corner(join: LineJoin, w: f32) -> PathCache {
        let mut cache = PathCache::new(0.01, 0.25);
        cache.add_path();
        for (x, y) in [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)] {
            cache.add_point(Vec2::new(x, y), PointFlags::CORNER);
        }
        cache.compute_deltas();
        cache.compute_joins(w, join, 10.0);
        cache
    }

    fn edges(w: f32) -> JoinEdges {
        JoinEdges {
            lw: w,
            rw: w,
            lu: 0.0,
            ru: 1.0,
        }
    }

    #[test]
    fn test_bevel_join_vertex_count() {
        let cache = corner(LineJoin::Bevel, 2.0);
        let (p0, p1) = (&cache.points[0], &cache.points[1]);
        assert!(p1.flags.contains(PointFlags::BEVEL));

        let mut geometry = Geometry::new();
        let mut writer = VertexWriter::new(&mut geometry, 12, 0);
        bevel_join(&mut writer, p0, p1, edges(2.0));
        assert_eq!(writer.written(), 8);
    }

    #[test]
    fn test_bevel_join_corners_on_offset_lines() {
        let cache = corner(LineJoin::Bevel, 2.0);
        let (p0, p1) = (&cache.points[0], &cache.points[1]);

        let mut geometry = Geometry::new();
        let mut writer = VertexWriter::new(&mut geometry, 12, 0);
        bevel_join(&mut writer, p0, p1, edges(2.0));
        drop(writer);

        // every vertex is within the stroke half-width of the corner
        for v in &geometry.vertices {
            let dist = (v.position() - p1.pos).length();
            assert!(dist <= 2.0 * 2f32.sqrt() + 1e-4, "{:?}", v.pos);
        }
    }

    #[test]
    fn test_round_join_stays_on_circle() {
        let cache = corner(LineJoin::Round, 3.0);
        let (p0, p1) = (&cache.points[0], &cache.points[1]);
        let ncap = 8;

        let mut geometry = Geometry::new();
        let mut writer = VertexWriter::new(&mut geometry, (ncap + 2) * 2, 0);
        round_join(&mut writer, p0, p1, edges(3.0), ncap);
        let written = writer.written();
        drop(writer);

        assert!(written <= (ncap + 2) * 2);
        // left turn: the fan is on the right (u = 1) side, the left side is the miter
        for v in geometry.vertices.iter().filter(|v| v.uv[0] == 1.0) {
            let dist = (v.position() - p1.pos).length();
            assert!((dist - 3.0).abs() < 1e-3, "{:?} at {}", v.pos, dist);
        }
    }

    #[test]
    fn test_arc_steps_clamped() {
        assert_eq!(arc_steps(0.0, 8), 2);
        assert_eq!(arc_steps(PI / 2.0, 8), 4);
        assert_eq!(arc_steps(PI * 2.0, 8), 8);
    }
}
