//! Transform stack
//!
//! Holds the current local-to-output transform, its classification and a lazily
//! computed inverse. Every composing operation applies the new transform in local
//! space, before the existing one.

use blinc_core::{Affine2D, TransformClass, Vec2};
use smallvec::SmallVec;

#[derive(Clone, Debug, Default)]
pub struct TransformStack {
    current: Affine2D,
    class: TransformClass,
    inverse: Option<Affine2D>,
    saved: SmallVec<[Affine2D; 4]>,
}

impl TransformStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &Affine2D {
        &self.current
    }

    pub fn class(&self) -> TransformClass {
        self.class
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    /// Inverse of the current transform, cached until the next mutation
    ///
    /// Singular transforms invert to identity.
    pub fn inverse(&mut self) -> Affine2D {
        if let Some(inverse) = self.inverse {
            return inverse;
        }

        let inverse = match self.class {
            TransformClass::Identity => Affine2D::IDENTITY,
            TransformClass::TranslationOnly => {
                let t = self.current.translation_part();
                Affine2D::translation(-t.x, -t.y)
            }
            TransformClass::General => self.current.inverse().unwrap_or_else(|| {
                tracing::debug!("singular canvas transform, paint UVs use identity");
                Affine2D::IDENTITY
            }),
        };
        self.inverse = Some(inverse);
        inverse
    }

    /// Maps a local point to output space using the cheapest path for the class
    pub fn apply(&self, point: Vec2) -> Vec2 {
        match self.class {
            TransformClass::Identity => point,
            TransformClass::TranslationOnly => point + self.current.translation_part(),
            TransformClass::General => self.current.transform_point(point),
        }
    }

    pub fn push(&mut self) {
        self.saved.push(self.current);
    }

    /// Restores the last pushed transform; does nothing on an empty stack
    pub fn pop(&mut self) {
        if let Some(saved) = self.saved.pop() {
            self.set(saved);
        }
    }

    /// Identity transform, saved entries are kept
    pub fn reset_current(&mut self) {
        self.set(Affine2D::IDENTITY);
    }

    /// Identity transform and an empty stack
    pub fn reset(&mut self) {
        self.saved.clear();
        self.reset_current();
    }

    pub fn set(&mut self, transform: Affine2D) {
        self.current = transform;
        self.class = transform.classify();
        self.inverse = None;
    }

    /// Composes `transform` in local space
    pub fn transform(&mut self, transform: &Affine2D) {
        self.set(self.current.then(transform));
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.transform(&Affine2D::translation(x, y));
    }

    pub fn rotate(&mut self, angle: f32) {
        self.transform(&Affine2D::rotation(angle));
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.transform(&Affine2D::scale(x, y));
    }

    pub fn skew_x(&mut self, angle: f32) {
        self.transform(&Affine2D::skew_x(angle));
    }

    pub fn skew_y(&mut self, angle: f32) {
        self.transform(&Affine2D::skew_y(angle));
    }

    /// Moves the output position directly, independent of scale and rotation
    pub fn offset(&mut self, x: f32, y: f32) {
        let mut t = self.current;
        t.elements[4] += x;
        t.elements[5] += y;
        self.set(t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_restores() {
        let mut stack = TransformStack::new();
        stack.translate(5.0, 7.0);
        let before = *stack.current();

        stack.push();
        stack.rotate(0.5);
        stack.scale(2.0, 3.0);
        stack.skew_x(0.1);
        stack.push();
        stack.skew_y(0.2);
        stack.translate(1.0, 1.0);
        stack.pop();
        stack.offset(4.0, 4.0);
        stack.pop();

        assert_eq!(*stack.current(), before);
        assert_eq!(stack.class(), TransformClass::TranslationOnly);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_pop_underflow_is_noop() {
        let mut stack = TransformStack::new();
        stack.scale(2.0, 2.0);
        let before = *stack.current();
        stack.pop();
        stack.pop();
        assert_eq!(*stack.current(), before);
    }

    #[test]
    fn test_translate_applies_in_local_space() {
        let mut stack = TransformStack::new();
        stack.scale(2.0, 2.0);
        stack.translate(10.0, 0.0);
        assert_eq!(stack.apply(Vec2::ZERO), Vec2::new(20.0, 0.0));
    }

    #[test]
    fn test_offset_is_output_space() {
        let mut stack = TransformStack::new();
        stack.scale(2.0, 2.0);
        stack.offset(10.0, 0.0);
        assert_eq!(stack.apply(Vec2::ZERO), Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_inverse_cache_invalidated() {
        let mut stack = TransformStack::new();
        stack.translate(3.0, 4.0);
        let inv = stack.inverse();
        assert_eq!(inv.transform_point(Vec2::new(3.0, 4.0)), Vec2::ZERO);

        stack.scale(2.0, 2.0);
        let inv = stack.inverse();
        let p = stack.apply(Vec2::new(1.0, 1.0));
        let back = inv.transform_point(p);
        assert!((back - Vec2::new(1.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_singular_inverse_is_identity() {
        let mut stack = TransformStack::new();
        stack.scale(0.0, 0.0);
        assert_eq!(stack.inverse(), Affine2D::IDENTITY);
    }
}
