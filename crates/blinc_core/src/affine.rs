//! 2D affine transforms
//!
//! Matrices use the column layout `[a, b, c, d, tx, ty]`:
//!
//! ```text
//! | a  c  tx |
//! | b  d  ty |
//! | 0  0   1 |
//! ```

use crate::geometry::{Point, Vec2};

/// Coarse classification of an affine transform
///
/// Used by hot paths to skip the full matrix multiply when a transform only moves
/// points around.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransformClass {
    #[default]
    Identity,
    /// Pure translation, the linear part is identity
    TranslationOnly,
    /// Scale, rotation or skew present
    General,
}

impl TransformClass {
    pub fn has_scale_rotation(self) -> bool {
        self == TransformClass::General
    }
}

/// 2D affine transformation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2D {
    /// Matrix elements [a, b, c, d, tx, ty]
    pub elements: [f32; 6],
}

impl Default for Affine2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2D {
    pub const IDENTITY: Affine2D = Affine2D {
        elements: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    pub const fn new(a: f32, b: f32, c: f32, d: f32, tx: f32, ty: f32) -> Self {
        Self {
            elements: [a, b, c, d, tx, ty],
        }
    }

    pub fn translation(x: f32, y: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, x, y)
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub fn rotation(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(c, s, -s, c, 0.0, 0.0)
    }

    pub fn skew_x(angle: f32) -> Self {
        Self::new(1.0, 0.0, angle.tan(), 1.0, 0.0, 0.0)
    }

    pub fn skew_y(angle: f32) -> Self {
        Self::new(1.0, angle.tan(), 0.0, 1.0, 0.0, 0.0)
    }

    pub fn translation_part(&self) -> Vec2 {
        Vec2::new(self.elements[4], self.elements[5])
    }

    pub fn transform_point(&self, point: Point) -> Point {
        let [a, b, c, d, tx, ty] = self.elements;
        Vec2::new(
            a * point.x + c * point.y + tx,
            b * point.x + d * point.y + ty,
        )
    }

    /// Transforms a direction, ignoring translation
    pub fn transform_vector(&self, v: Vec2) -> Vec2 {
        let [a, b, c, d, _, _] = self.elements;
        Vec2::new(a * v.x + c * v.y, b * v.x + d * v.y)
    }

    /// Concatenate this transform with another (self * other)
    /// The resulting transform first applies `other`, then `self`.
    pub fn then(&self, other: &Affine2D) -> Affine2D {
        let [a1, b1, c1, d1, tx1, ty1] = self.elements;
        let [a2, b2, c2, d2, tx2, ty2] = other.elements;

        Affine2D {
            elements: [
                a1 * a2 + c1 * b2,
                b1 * a2 + d1 * b2,
                a1 * c2 + c1 * d2,
                b1 * c2 + d1 * d2,
                a1 * tx2 + c1 * ty2 + tx1,
                b1 * tx2 + d1 * ty2 + ty1,
            ],
        }
    }

    pub fn determinant(&self) -> f32 {
        let [a, b, c, d, _, _] = self.elements;
        a * d - b * c
    }

    /// Inverse transform, `None` when the matrix is singular
    pub fn inverse(&self) -> Option<Affine2D> {
        let det = self.determinant() as f64;
        if det.abs() < 1e-12 {
            return None;
        }

        let [a, b, c, d, tx, ty] = self.elements.map(|e| e as f64);
        let inv_det = 1.0 / det;
        Some(Affine2D {
            elements: [
                (d * inv_det) as f32,
                (-b * inv_det) as f32,
                (-c * inv_det) as f32,
                (a * inv_det) as f32,
                ((c * ty - d * tx) * inv_det) as f32,
                ((b * tx - a * ty) * inv_det) as f32,
            ],
        })
    }

    pub fn classify(&self) -> TransformClass {
        let [a, b, c, d, tx, ty] = self.elements;
        if a != 1.0 || b != 0.0 || c != 0.0 || d != 1.0 {
            TransformClass::General
        } else if tx != 0.0 || ty != 0.0 {
            TransformClass::TranslationOnly
        } else {
            TransformClass::Identity
        }
    }

    /// Average of the lengths of the two basis vectors
    pub fn average_scale(&self) -> f32 {
        let [a, b, c, d, _, _] = self.elements;
        let sx = (a * a + c * c).sqrt();
        let sy = (b * b + d * d).sqrt();
        (sx + sy) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec2, b: Vec2) {
        assert!((a - b).length() < 1e-4, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_then_applies_other_first() {
        let t = Affine2D::translation(10.0, 0.0).then(&Affine2D::scale(2.0, 2.0));
        assert_close(t.transform_point(Vec2::new(1.0, 1.0)), Vec2::new(12.0, 2.0));
    }

    #[test]
    fn test_inverse_roundtrip() {
        let t = Affine2D::translation(5.0, -3.0)
            .then(&Affine2D::rotation(0.7))
            .then(&Affine2D::scale(2.0, 0.5));
        let inv = t.inverse().unwrap();
        let p = Vec2::new(13.0, 7.0);
        assert_close(inv.transform_point(t.transform_point(p)), p);
    }

    #[test]
    fn test_singular_inverse() {
        assert!(Affine2D::scale(0.0, 1.0).inverse().is_none());
    }

    #[test]
    fn test_classify() {
        assert_eq!(Affine2D::IDENTITY.classify(), TransformClass::Identity);
        assert_eq!(
            Affine2D::translation(1.0, 0.0).classify(),
            TransformClass::TranslationOnly
        );
        assert_eq!(Affine2D::rotation(0.3).classify(), TransformClass::General);
        assert!(Affine2D::skew_x(0.2).classify().has_scale_rotation());
    }

    #[test]
    fn test_average_scale() {
        assert_eq!(Affine2D::scale(2.0, 4.0).average_scale(), 3.0);
        assert!((Affine2D::rotation(1.2).average_scale() - 1.0).abs() < 1e-6);
    }
}
