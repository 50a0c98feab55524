//! Flattened path storage and per-point join analysis
//!
//! The cache is rebuilt on every `stroke()`/`fill()`: the flattener appends points,
//! then [`PathCache::compute_deltas`] and [`PathCache::compute_joins`] annotate them
//! with the tangents, miter directions and join flags the tessellators read.

use std::ops::{BitOr, BitOrAssign};

use blinc_core::{LineCap, LineJoin, Vec2, Winding};

/// Join classification of a path point
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PointFlags(u8);

impl PointFlags {
    pub const NONE: PointFlags = PointFlags(0);
    /// Point is a sharp corner, not an interior curve sample
    pub const CORNER: PointFlags = PointFlags(0x01);
    /// Path turns left at this point
    pub const LEFT: PointFlags = PointFlags(0x02);
    /// Outer side of the join is beveled
    pub const BEVEL: PointFlags = PointFlags(0x04);
    /// Inner side of the join is too short for a miter
    pub const INNER_BEVEL: PointFlags = PointFlags(0x08);

    pub fn contains(self, other: PointFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: PointFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_beveled(self) -> bool {
        self.intersects(PointFlags::BEVEL | PointFlags::INNER_BEVEL)
    }
}

impl BitOr for PointFlags {
    type Output = PointFlags;

    fn bitor(self, rhs: PointFlags) -> PointFlags {
        PointFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for PointFlags {
    fn bitor_assign(&mut self, rhs: PointFlags) {
        self.0 |= rhs.0;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PathPoint {
    pub pos: Vec2,
    /// Unit direction to the next point
    pub d: Vec2,
    /// Distance to the next point
    pub len: f32,
    /// Miter direction, scaled so `pos + dm * w` lies on the offset outline
    pub dm: Vec2,
    pub flags: PointFlags,
}

/// One polyline inside the cache
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PathInfo {
    pub first: usize,
    pub count: usize,
    pub closed: bool,
    pub convex: bool,
    pub winding: Winding,
    pub nbevel: usize,
}

impl PathInfo {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.first..self.first + self.count
    }
}

#[derive(Clone, Debug)]
pub struct PathCache {
    pub points: Vec<PathPoint>,
    pub paths: Vec<PathInfo>,
    pub bounds_min: Vec2,
    pub bounds_max: Vec2,
    dist_tolerance: f32,
    tess_tolerance: f32,
}

impl PathCache {
    pub fn new(dist_tolerance: f32, tess_tolerance: f32) -> Self {
        Self {
            points: Vec::new(),
            paths: Vec::new(),
            bounds_min: Vec2::MAX,
            bounds_max: Vec2::MIN,
            dist_tolerance,
            tess_tolerance,
        }
    }

    pub fn dist_tolerance(&self) -> f32 {
        self.dist_tolerance
    }

    pub fn tess_tolerance(&self) -> f32 {
        self.tess_tolerance
    }

    pub fn reset(&mut self) {
        self.points.clear();
        self.paths.clear();
        self.bounds_min = Vec2::MAX;
        self.bounds_max = Vec2::MIN;
    }

    pub fn points_of(&self, path: &PathInfo) -> &[PathPoint] {
        &self.points[path.range()]
    }

    /// A single convex path can be filled without a mask pass
    pub fn is_convex(&self) -> bool {
        self.paths.len() == 1 && self.paths[0].convex
    }

    pub fn add_path(&mut self) {
        self.paths.push(PathInfo {
            first: self.points.len(),
            ..PathInfo::default()
        });
    }

    pub fn last_point(&self) -> Option<Vec2> {
        let path = self.paths.last()?;
        if path.count == 0 {
            return None;
        }
        self.points.last().map(|p| p.pos)
    }

    /// Appends a point to the current path, merging it into the previous one when
    /// they are closer than the distance tolerance
    pub fn add_point(&mut self, pos: Vec2, flags: PointFlags) {
        let Some(path) = self.paths.last_mut() else {
            return;
        };

        if path.count > 0 {
            if let Some(last) = self.points.last_mut() {
                if last.pos.approx_eq(pos, self.dist_tolerance) {
                    last.flags |= flags;
                    return;
                }
            }
        }

        self.points.push(PathPoint {
            pos,
            flags,
            ..PathPoint::default()
        });
        path.count += 1;
    }

    pub fn close_path(&mut self) {
        if let Some(path) = self.paths.last_mut() {
            path.closed = true;
        }
    }

    pub fn set_winding(&mut self, winding: Winding) {
        if let Some(path) = self.paths.last_mut() {
            path.winding = winding;
        }
    }

    /// Closes paths whose ends meet, enforces winding and computes segment
    /// directions, lengths and bounds
    pub fn compute_deltas(&mut self) {
        let tol = self.dist_tolerance;
        for path in &mut self.paths {
            let pts = &mut self.points[path.first..path.first + path.count];

            if pts.len() >= 2 && pts[pts.len() - 1].pos.approx_eq(pts[0].pos, tol) {
                path.count -= 1;
                path.closed = true;
            }
            let pts = &mut pts[..path.count];

            if pts.len() > 2 {
                let area = poly_area(pts);
                if (path.winding == Winding::Ccw && area < 0.0)
                    || (path.winding == Winding::Cw && area > 0.0)
                {
                    pts.reverse();
                }
            }

            let n = pts.len();
            for i in 0..n {
                let next = pts[(i + 1) % n].pos;
                let p = &mut pts[i];
                let (d, len) = (next - p.pos).normalize_with_length();
                p.d = d;
                p.len = len;
                self.bounds_min = self.bounds_min.min(p.pos);
                self.bounds_max = self.bounds_max.max(p.pos);
            }
        }
    }

    /// Computes miter directions and join flags for an offset of `w`
    pub fn compute_joins(&mut self, w: f32, join: LineJoin, miter_limit: f32) {
        let iw = if w > 0.0 { 1.0 / w } else { 0.0 };

        for path in &mut self.paths {
            let pts = &mut self.points[path.first..path.first + path.count];
            let n = pts.len();
            if n == 0 {
                continue;
            }

            let mut nleft = 0;
            let mut nbevel = 0;
            let mut p0 = pts[n - 1];
            for p1 in pts.iter_mut() {
                let dl0 = p0.d.perp();
                let dl1 = p1.d.perp();

                let mut dm = (dl0 + dl1) * 0.5;
                let dmr2 = dm.length_squared();
                if dmr2 > 1e-6 {
                    dm = dm * (1.0 / dmr2).min(600.0);
                }
                p1.dm = dm;

                let mut flags = if p1.flags.contains(PointFlags::CORNER) {
                    PointFlags::CORNER
                } else {
                    PointFlags::NONE
                };

                let cross = p1.d.x * p0.d.y - p0.d.x * p1.d.y;
                if cross > 0.0 {
                    nleft += 1;
                    flags |= PointFlags::LEFT;
                }

                let limit = (p0.len.min(p1.len) * iw).max(1.01);
                if dmr2 * limit * limit < 1.0 {
                    flags |= PointFlags::INNER_BEVEL;
                }

                if flags.contains(PointFlags::CORNER)
                    && (dmr2 * miter_limit * miter_limit < 1.0
                        || join == LineJoin::Bevel
                        || join == LineJoin::Round)
                {
                    flags |= PointFlags::BEVEL;
                }

                if flags.is_beveled() {
                    nbevel += 1;
                }

                p1.flags = flags;
                p0 = *p1;
            }

            path.convex = nleft == n;
            path.nbevel = nbevel;
        }
    }

    /// Upper bound of vertices written by the stroke tessellator
    pub fn stroke_vertex_count(&self, join: LineJoin, cap: LineCap, ncap: usize) -> usize {
        self.paths
            .iter()
            .map(|path| {
                let mut count = if join == LineJoin::Round {
                    (path.count + path.nbevel * (ncap + 2) + 1) * 2
                } else {
                    (path.count + path.nbevel * 5 + 1) * 2
                };
                if !path.closed {
                    count += if cap == LineCap::Round {
                        (ncap * 2 + 2) * 2
                    } else {
                        (3 + 3) * 2
                    };
                }
                count
            })
            .sum()
    }

    /// Upper bound of vertices written by the fill tessellator, excluding the
    /// concave mask quad
    pub fn fill_vertex_count(&self, with_fringe: bool) -> usize {
        self.paths
            .iter()
            .map(|path| {
                let mut count = path.count + path.nbevel + 1;
                if with_fringe {
                    count += (path.count + path.nbevel * 5 + 1) * 2;
                }
                count
            })
            .sum()
    }
}

/// Upper bound on arc and cap segments
pub const MAX_CURVE_DIVISIONS: usize = 256;

/// Number of segments needed to approximate an arc of radius `r`
pub fn curve_divisions(r: f32, arc: f32, tol: f32) -> usize {
    let da = ((r / (r + tol)).acos() * 2.0).max(f32::EPSILON);
    ((arc / da).ceil() as usize).clamp(2, MAX_CURVE_DIVISIONS)
}

fn triangle_area2(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (c - a).cross(b - a)
}

/// Signed polygon area, positive for solid (counter-clockwise) paths
fn poly_area(pts: &[PathPoint]) -> f32 {
    let a = pts[0].pos;
    let area: f32 = pts
        .windows(2)
        .skip(1)
        .map(|w| triangle_area2(a, w[0].pos, w[1].pos))
        .sum();
    area * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with(points: &[(f32, f32)], closed: bool) -> PathCache {
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

    #[test]
    fn test_add_point_merges_close_points() {
        let mut cache = PathCache::new(0.01, 0.25);
        cache.add_path();
        cache.add_point(Vec2::new(0.0, 0.0), PointFlags::NONE);
        cache.add_point(Vec2::new(0.001, 0.0), PointFlags::CORNER);
        assert_eq!(cache.paths[0].count, 1);
        assert!(cache.points[0].flags.contains(PointFlags::CORNER));
    }

    #[test]
    fn test_add_point_without_path_is_ignored() {
        let mut cache = PathCache::new(0.01, 0.25);
        cache.add_point(Vec2::ZERO, PointFlags::CORNER);
        assert!(cache.points.is_empty());
        assert_eq!(cache.last_point(), None);
    }

    #[test]
    fn test_matching_ends_close_path() {
        let cache = cache_with(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 0.0)], false);
        assert!(cache.paths[0].closed);
        assert_eq!(cache.paths[0].count, 3);
    }

    #[test]
    fn test_deltas_and_bounds() {
        let cache = cache_with(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)], true);
        let p = &cache.points[0];
        assert_eq!(p.d, Vec2::new(0.0, 1.0));
        assert_eq!(p.len, 10.0);
        assert_eq!(cache.bounds_min, Vec2::ZERO);
        assert_eq!(cache.bounds_max, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_winding_enforced() {
        let ccw = cache_with(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)], true);
        let cw = cache_with(&[(10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)], true);
        assert!(poly_area(ccw.points_of(&ccw.paths[0])) > 0.0);
        assert!(poly_area(cw.points_of(&cw.paths[0])) > 0.0);

        let mut hole = PathCache::new(0.01, 0.25);
        hole.add_path();
        hole.set_winding(Winding::Cw);
        for (x, y) in [(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)] {
            hole.add_point(Vec2::new(x, y), PointFlags::CORNER);
        }
        hole.compute_deltas();
        assert!(poly_area(hole.points_of(&hole.paths[0])) < 0.0);
    }

    #[test]
    fn test_square_is_convex() {
        let mut cache = cache_with(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)], true);
        cache.compute_joins(0.5, LineJoin::Miter, 4.0);
        assert!(cache.is_convex());
        assert!(cache
            .points
            .iter()
            .all(|p| p.flags.contains(PointFlags::LEFT)));
        // right angle miter: |dm| = sqrt(2)
        assert!((cache.points[1].dm.length() - 2f32.sqrt()).abs() < 1e-5);
        assert_eq!(cache.paths[0].nbevel, 0);
    }

    #[test]
    fn test_concave_shape() {
        let mut cache = cache_with(
            &[(0.0, 0.0), (0.0, 10.0), (5.0, 5.0), (10.0, 10.0), (10.0, 0.0)],
            true,
        );
        cache.compute_joins(0.5, LineJoin::Miter, 4.0);
        assert!(!cache.is_convex());
    }

    #[test]
    fn test_bevel_and_round_joins_flag_corners() {
        let mut cache = cache_with(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0)], false);
        cache.compute_joins(1.0, LineJoin::Bevel, 10.0);
        assert!(cache.points[1].flags.contains(PointFlags::BEVEL));

        cache.compute_joins(1.0, LineJoin::Miter, 10.0);
        assert!(!cache.points[1].flags.contains(PointFlags::BEVEL));

        // miter limit below sqrt(2) bevels a right angle
        cache.compute_joins(1.0, LineJoin::Miter, 1.2);
        assert!(cache.points[1].flags.contains(PointFlags::BEVEL));
    }

    #[test]
    fn test_short_segments_inner_bevel() {
        let mut cache = cache_with(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)], false);
        cache.compute_joins(10.0, LineJoin::Miter, 10.0);
        assert!(cache.points[1].flags.contains(PointFlags::INNER_BEVEL));
        assert!(cache.paths[0].nbevel >= 1);
    }

    #[test]
    fn test_curve_divisions() {
        assert_eq!(curve_divisions(0.0, std::f32::consts::PI, 0.25), 2);
        let coarse = curve_divisions(5.0, std::f32::consts::PI, 0.25);
        let fine = curve_divisions(50.0, std::f32::consts::PI, 0.25);
        assert!(fine > coarse);
    }

    #[test]
    fn test_curve_divisions_zero_tolerance() {
        let n = curve_divisions(10.0, std::f32::consts::PI, 0.0);
        assert_eq!(n, MAX_CURVE_DIVISIONS);
        // stroke bounds stay finite
        assert!((n * 2 + 2).checked_mul(2).is_some());
    }

    #[test]
    fn test_vertex_count_bounds() {
        let mut cache = cache_with(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0)], false);
        cache.compute_joins(1.0, LineJoin::Miter, 10.0);
        assert_eq!(
            cache.stroke_vertex_count(LineJoin::Miter, LineCap::Butt, 4),
            (3 + 1) * 2 + 12
        );
        assert_eq!(cache.fill_vertex_count(false), 3 + 1);
        assert_eq!(cache.fill_vertex_count(true), 4 + 8);
    }
}
