//! Fill tessellation
//!
//! A single convex path is drawn directly as a triangle fan. Anything else is
//! drawn as coverage rings followed by a bounding quad that resolves them. With
//! anti-aliasing, every path also gets a fringe strip along its outline.

use blinc_core::{LineJoin, Vec2};

use crate::joins::{bevel_join, JoinEdges};
use crate::path_cache::{PathCache, PointFlags};
use crate::writer::{VertexRange, VertexWriter};

/// Miter limit used for the fill outline
const FILL_MITER_LIMIT: f32 = 2.4;

/// Vertices of the concave mask quad
pub const MASK_QUAD_VERTICES: usize = 4;

/// Computes joins for a fill and returns whether it is convex and the vertex bound
pub fn prepare_fill(cache: &mut PathCache, fringe: f32) -> (bool, usize) {
    cache.compute_joins(fringe, LineJoin::Miter, FILL_MITER_LIMIT);
    let convex = cache.is_convex();
    let mut max = cache.fill_vertex_count(fringe > 0.0);
    if !convex {
        max += MASK_QUAD_VERTICES;
    }
    (convex, max)
}

/// Writes one fan per path with at least three points
///
/// With a fringe the ring is inset by half the fringe width so the fringe strip
/// covers the outline.
pub fn expand_fill_rings(
    cache: &PathCache,
    writer: &mut VertexWriter,
    fringe: f32,
) -> Vec<VertexRange> {
    let woff = fringe * 0.5;
    let mut ranges = Vec::with_capacity(cache.paths.len());

    for path in &cache.paths {
        let pts = cache.points_of(path);
        if pts.len() < 3 {
            continue;
        }

        if fringe > 0.0 {
            let mut p0 = pts[pts.len() - 1];
            for p1 in pts {
                if p1.flags.contains(PointFlags::BEVEL) && !p1.flags.contains(PointFlags::LEFT) {
                    writer.add_fill(p1.pos + p0.d.perp() * woff);
                    writer.add_fill(p1.pos + p1.d.perp() * woff);
                } else {
                    writer.add_fill(p1.pos + p1.dm * woff);
                }
                p0 = *p1;
            }
        } else {
            for p in pts {
                writer.add_fill(p.pos);
            }
        }

        ranges.push(writer.finish_batch());
    }
    ranges
}

/// Writes the quad covering `min..max`, uv spanning the unit square
pub fn write_mask_quad(writer: &mut VertexWriter, min: Vec2, max: Vec2) -> VertexRange {
    writer.add(Vec2::new(min.x, min.y), 0.0, 0.0);
    writer.add(Vec2::new(max.x, min.y), 1.0, 0.0);
    writer.add(Vec2::new(max.x, max.y), 1.0, 1.0);
    writer.add(Vec2::new(min.x, max.y), 0.0, 1.0);
    writer.finish_batch()
}

/// Writes the anti-alias strip around every path
pub fn expand_fill_fringe(
    cache: &PathCache,
    writer: &mut VertexWriter,
    fringe: f32,
    convex: bool,
) -> Vec<VertexRange> {
    let woff = fringe * 0.5;
    let edges = if convex {
        JoinEdges {
            lw: woff,
            rw: fringe - woff,
            lu: 0.5,
            ru: 1.0,
        }
    } else {
        JoinEdges {
            lw: fringe + woff,
            rw: fringe - woff,
            lu: 0.0,
            ru: 1.0,
        }
    };

    let mut ranges = Vec::with_capacity(cache.paths.len());
    for path in &cache.paths {
        let pts = cache.points_of(path);
        if pts.len() < 3 {
            continue;
        }

        let mut p0 = pts[pts.len() - 1];
        for p1 in pts {
            if p1.flags.is_beveled() {
                bevel_join(writer, &p0, p1, edges);
            } else {
                writer.add(p1.pos + p1.dm * edges.lw, edges.lu, 1.0);
                writer.add(p1.pos - p1.dm * edges.rw, edges.ru, 1.0);
            }
            p0 = *p1;
        }

        if let (Some(a), Some(b)) = (writer.batch_vertex(0), writer.batch_vertex(1)) {
            writer.add(a, edges.lu, 1.0);
            writer.add(b, edges.ru, 1.0);
        }

        ranges.push(writer.finish_batch());
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use std::f32::consts::PI;

    fn polygon(points: &[(f32, f32)]) -> PathCache {
        let mut cache = PathCache::new(0.01, 0.25);
        cache.add_path();
        for &(x, y) in points {
            cache.add_point(Vec2::new(x, y), PointFlags::CORNER);
        }
        cache.close_path();
        cache.compute_deltas();
        cache
    }

    fn ngon(n: usize, r: f32) -> Vec<(f32, f32)> {
        (0..n)
            .map(|i| {
                let a = i as f32 / n as f32 * PI * 2.0;
                (a.cos() * r, a.sin() * r)
            })
            .collect()
    }

    #[test]
    fn test_convex_polygon_without_fringe() {
        let mut cache = polygon(&ngon(7, 20.0));
        let (convex, max) = prepare_fill(&mut cache, 0.0);
        assert!(convex);

        let mut geometry = Geometry::new();
        let mut writer = VertexWriter::new(&mut geometry, max, 0);
        let rings = expand_fill_rings(&cache, &mut writer, 0.0);
        assert_eq!(rings, vec![VertexRange { offset: 0, count: 7 }]);
        assert!(writer.written() <= max);
    }

    #[test]
    fn test_fringed_ring_is_inset() {
        let mut cache = polygon(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]);
        let (convex, max) = prepare_fill(&mut cache, 1.0);
        assert!(convex);

        let mut geometry = Geometry::new();
        let mut writer = VertexWriter::new(&mut geometry, max, 0);
        let rings = expand_fill_rings(&cache, &mut writer, 1.0);
        let fringes = expand_fill_fringe(&cache, &mut writer, 1.0, convex);
        assert!(writer.written() <= max);
        drop(writer);

        let ring = &geometry.vertices[rings[0].offset..rings[0].end()];
        for v in ring {
            assert!(v.pos[0] > 0.0 && v.pos[0] < 10.0, "{:?}", v.pos);
            assert!(v.pos[1] > 0.0 && v.pos[1] < 10.0, "{:?}", v.pos);
        }

        // convex fringe runs from the inset ring (u = 0.5) out to u = 1
        let strip = &geometry.vertices[fringes[0].offset..fringes[0].end()];
        assert_eq!(strip.len(), 4 * 2 + 2);
        assert_eq!(strip[0].uv[0], 0.5);
        assert_eq!(strip[1].uv[0], 1.0);
        assert_eq!(strip[8].pos, strip[0].pos);
        assert_eq!(strip[1].pos, [-0.5, -0.5]);
    }

    #[test]
    fn test_concave_shape_needs_mask() {
        let mut cache = polygon(&[(0.0, 0.0), (0.0, 10.0), (5.0, 5.0), (10.0, 10.0), (10.0, 0.0)]);
        let (convex, max) = prepare_fill(&mut cache, 0.0);
        assert!(!convex);

        let mut geometry = Geometry::new();
        let mut writer = VertexWriter::new(&mut geometry, max, 0);
        expand_fill_rings(&cache, &mut writer, 0.0);
        let mask = write_mask_quad(&mut writer, cache.bounds_min, cache.bounds_max);
        assert!(writer.written() <= max);
        drop(writer);

        assert_eq!(mask, VertexRange { offset: 5, count: 4 });
        assert_eq!(geometry.vertices[5].pos, [0.0, 0.0]);
        assert_eq!(geometry.vertices[7].pos, [10.0, 10.0]);
        assert_eq!(geometry.vertices[6].uv, [1.0, 0.0]);
        assert_eq!(geometry.vertices[8].uv, [0.0, 1.0]);
    }

    #[test]
    fn test_multiple_paths_are_not_convex() {
        let mut cache = PathCache::new(0.01, 0.25);
        for offset in [0.0, 20.0] {
            cache.add_path();
            for (x, y) in [(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)] {
                cache.add_point(Vec2::new(x + offset, y), PointFlags::CORNER);
            }
        }
        cache.compute_deltas();
        let (convex, _) = prepare_fill(&mut cache, 1.0);
        assert!(!convex);
    }

    #[test]
    fn test_fill_bound_holds_with_sharp_corners() {
        let star: Vec<(f32, f32)> = (0..10)
            .map(|i| {
                let r = if i % 2 == 0 { 50.0 } else { 4.0 };
                let a = i as f32 / 10.0 * PI * 2.0;
                (a.cos() * r, a.sin() * r)
            })
            .collect();

        for fringe in [0.0, 1.0, 3.0] {
            let mut cache = polygon(&star);
            let (convex, max) = prepare_fill(&mut cache, fringe);
            let mut geometry = Geometry::new();
            let mut writer = VertexWriter::new(&mut geometry, max, 0);
            expand_fill_rings(&cache, &mut writer, fringe);
            if !convex {
                write_mask_quad(&mut writer, cache.bounds_min, cache.bounds_max);
            }
            if fringe > 0.0 {
                expand_fill_fringe(&cache, &mut writer, fringe, convex);
            }
            assert!(writer.written() <= max);
        }
    }

    #[test]
    fn test_degenerate_paths_skipped() {
        let mut cache = polygon(&[(0.0, 0.0), (10.0, 0.0)]);
        let (_, max) = prepare_fill(&mut cache, 1.0);
        let mut geometry = Geometry::new();
        let mut writer = VertexWriter::new(&mut geometry, max, 0);
        assert!(expand_fill_rings(&cache, &mut writer, 1.0).is_empty());
        assert!(expand_fill_fringe(&cache, &mut writer, 1.0, false).is_empty());
    }
}
