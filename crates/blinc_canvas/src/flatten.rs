//! Command stream flattening
//!
//! Walks the command buffer once and turns it into polylines inside a
//! [`PathCache`]. Cubic curves are subdivided adaptively until the control points
//! deviate from the chord by less than the tessellation tolerance.

use blinc_core::Vec2;

use crate::commands::{Command, CommandBuffer};
use crate::path_cache::{PathCache, PointFlags};

/// Maximum recursion depth of the cubic subdivision
const MAX_BEZIER_LEVEL: u32 = 10;

pub fn flatten_commands(commands: &CommandBuffer, cache: &mut PathCache) {
    for command in commands {
        match command {
            Command::MoveTo(p) => {
                cache.add_path();
                cache.add_point(p, PointFlags::CORNER);
            }
            Command::LineTo(p) => cache.add_point(p, PointFlags::CORNER),
            Command::BezierTo(c1, c2, p) => match cache.last_point() {
                Some(start) => {
                    let tol = cache.tess_tolerance();
                    tessellate_bezier(cache, [start, c1, c2, p], tol, 0, PointFlags::CORNER);
                }
                None => tracing::trace!("bezier without a current point skipped"),
            },
            Command::Close => cache.close_path(),
            Command::Winding(w) => cache.set_winding(w),
        }
    }
}

fn tessellate_bezier(
    cache: &mut PathCache,
    [p1, p2, p3, p4]: [Vec2; 4],
    tol: f32,
    level: u32,
    flags: PointFlags,
) {
    if level > MAX_BEZIER_LEVEL {
        return;
    }

    let p12 = (p1 + p2) * 0.5;
    let p23 = (p2 + p3) * 0.5;
    let p34 = (p3 + p4) * 0.5;
    let p123 = (p12 + p23) * 0.5;

    let d = p4 - p1;
    let d2 = ((p2.x - p4.x) * d.y - (p2.y - p4.y) * d.x).abs();
    let d3 = ((p3.x - p4.x) * d.y - (p3.y - p4.y) * d.x).abs();

    if (d2 + d3) * (d2 + d3) < tol * d.length_squared() {
        cache.add_point(p4, flags);
        return;
    }

    let p234 = (p23 + p34) * 0.5;
    let p1234 = (p123 + p234) * 0.5;

    tessellate_bezier(cache, [p1, p12, p123, p1234], tol, level + 1, PointFlags::NONE);
    tessellate_bezier(cache, [p1234, p234, p34, p4], tol, level + 1, flags);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::TransformStack;
    use lyon::geom::CubicBezierSegment;
    use lyon::math::point;

    fn flatten(build: impl FnOnce(&mut CommandBuffer, &TransformStack)) -> PathCache {
        let t = TransformStack::new();
        let mut commands = CommandBuffer::new();
        build(&mut commands, &t);
        let mut cache = PathCache::new(0.01, 0.25);
        flatten_commands(&commands, &mut cache);
        cache
    }

    #[test]
    fn test_lines_become_corners() {
        let cache = flatten(|c, t| {
            c.append(Command::MoveTo(Vec2::new(0.0, 0.0)), t);
            c.append(Command::LineTo(Vec2::new(10.0, 0.0)), t);
            c.append(Command::LineTo(Vec2::new(10.0, 0.0)), t);
            c.append(Command::LineTo(Vec2::new(10.0, 10.0)), t);
            c.append(Command::Close, t);
        });
        assert_eq!(cache.paths.len(), 1);
        assert_eq!(cache.paths[0].count, 3);
        assert!(cache.paths[0].closed);
        assert!(cache
            .points
            .iter()
            .all(|p| p.flags.contains(PointFlags::CORNER)));
    }

    #[test]
    fn test_move_to_starts_new_path() {
        let cache = flatten(|c, t| {
            c.append(Command::MoveTo(Vec2::new(0.0, 0.0)), t);
            c.append(Command::LineTo(Vec2::new(10.0, 0.0)), t);
            c.append(Command::MoveTo(Vec2::new(20.0, 0.0)), t);
            c.append(Command::LineTo(Vec2::new(30.0, 0.0)), t);
            c.append(Command::Winding(blinc_core::Winding::Cw), t);
        });
        assert_eq!(cache.paths.len(), 2);
        assert_eq!(cache.paths[1].first, 2);
        assert_eq!(cache.paths[1].winding, blinc_core::Winding::Cw);
        assert_eq!(cache.paths[0].winding, blinc_core::Winding::Ccw);
    }

    #[test]
    fn test_bezier_without_start_is_skipped() {
        let cache = flatten(|c, t| {
            c.append(
                Command::BezierTo(Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0), Vec2::new(3.0, 0.0)),
                t,
            );
        });
        assert!(cache.points.is_empty());
    }

    #[test]
    fn test_bezier_points_lie_on_curve() {
        let (p0, c1, c2, p1) = (
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 100.0),
            Vec2::new(100.0, 100.0),
            Vec2::new(100.0, 0.0),
        );
        let cache = flatten(|c, t| {
            c.append(Command::MoveTo(p0), t);
            c.append(Command::BezierTo(c1, c2, p1), t);
        });

        let reference = CubicBezierSegment {
            from: point(p0.x, p0.y),
            ctrl1: point(c1.x, c1.y),
            ctrl2: point(c2.x, c2.y),
            to: point(p1.x, p1.y),
        };
        let samples: Vec<_> = (0..=2048)
            .map(|i| reference.sample(i as f32 / 2048.0))
            .collect();

        assert!(cache.paths[0].count > 8);
        for p in &cache.points {
            let nearest = samples
                .iter()
                .map(|s| ((s.x - p.pos.x).powi(2) + (s.y - p.pos.y).powi(2)).sqrt())
                .fold(f32::MAX, f32::min);
            assert!(nearest < 0.1, "{:?} is {} away from the curve", p.pos, nearest);
        }

        let last = cache.points.last().unwrap();
        assert_eq!(last.pos, p1);
        assert!(last.flags.contains(PointFlags::CORNER));
        // interior samples are smooth, only the end point is a corner
        assert!(!cache.points[1].flags.contains(PointFlags::CORNER));
    }

    #[test]
    fn test_tolerance_controls_density() {
        let build = |tol: f32| {
            let t = TransformStack::new();
            let mut commands = CommandBuffer::new();
            commands.append(Command::MoveTo(Vec2::ZERO), &t);
            commands.append(
                Command::BezierTo(
                    Vec2::new(0.0, 100.0),
                    Vec2::new(100.0, 100.0),
                    Vec2::new(100.0, 0.0),
                ),
                &t,
            );
            let mut cache = PathCache::new(0.01, tol);
            flatten_commands(&commands, &mut cache);
            cache.paths[0].count
        };
        assert!(build(0.05) > build(1.0));
    }
}
