//! Bounded vertex writer
//!
//! Tessellators reserve an upper bound of vertices up front, then append into the
//! geometry without reallocating. Each finished run of vertices becomes a
//! [`VertexRange`] the batch emitter turns into a draw batch.

use blinc_core::Vec2;

use crate::geometry::{Geometry, Vertex};

/// A run of vertices in [`Geometry::vertices`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VertexRange {
    pub offset: usize,
    pub count: usize,
}

impl VertexRange {
    pub fn end(&self) -> usize {
        self.offset + self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

pub struct VertexWriter<'a> {
    geometry: &'a mut Geometry,
    flags: u16,
    /// Index of the first vertex of the write session
    start: usize,
    limit: usize,
    /// Start of the batch currently being written
    batch_start: usize,
}

impl<'a> VertexWriter<'a> {
    /// Reserves room for `max_vertices` and stamps every vertex with `flags`
    pub fn new(geometry: &'a mut Geometry, max_vertices: usize, flags: u16) -> Self {
        geometry.vertices.reserve(max_vertices);
        let start = geometry.vertices.len();
        Self {
            geometry,
            flags,
            start,
            limit: start + max_vertices,
            batch_start: start,
        }
    }

    pub fn set_flags(&mut self, flags: u16) {
        self.flags = flags;
    }

    pub fn flags(&self) -> u16 {
        self.flags
    }

    /// Appends a vertex with explicit uv
    pub fn add(&mut self, pos: Vec2, u: f32, v: f32) {
        debug_assert!(
            self.geometry.vertices.len() < self.limit,
            "vertex writer overflow: reserved {}",
            self.limit - self.start
        );
        self.geometry.include_bounds(pos, pos);
        self.geometry.vertices.push(Vertex {
            pos: pos.into(),
            uv: [u, v],
            attribute_flags: self.flags,
            ..Vertex::default()
        });
    }

    /// Appends a solid interior vertex
    pub fn add_fill(&mut self, pos: Vec2) {
        self.add(pos, 0.5, 1.0);
    }

    /// Position of the `index`th vertex of the current batch
    pub fn batch_vertex(&self, index: usize) -> Option<Vec2> {
        self.geometry
            .vertices
            .get(self.batch_start + index)
            .map(Vertex::position)
    }

    pub fn batch_len(&self) -> usize {
        self.geometry.vertices.len() - self.batch_start
    }

    /// Closes the current batch and starts the next one
    pub fn finish_batch(&mut self) -> VertexRange {
        let end = self.geometry.vertices.len();
        let range = VertexRange {
            offset: self.batch_start,
            count: end - self.batch_start,
        };
        self.batch_start = end;
        range
    }

    /// Vertices written since the writer was created
    pub fn written(&self) -> usize {
        self.geometry.vertices.len() - self.start
    }

    pub fn reserved(&self) -> usize {
        self.limit - self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batches_and_bounds() {
        let mut geometry = Geometry::new();
        let mut writer = VertexWriter::new(&mut geometry, 8, Vertex::MASK_FILL);
        writer.add_fill(Vec2::new(1.0, 2.0));
        writer.add(Vec2::new(-3.0, 4.0), 0.0, 1.0);
        let first = writer.finish_batch();
        writer.add_fill(Vec2::new(5.0, 5.0));
        assert_eq!(writer.batch_vertex(0), Some(Vec2::new(5.0, 5.0)));
        assert_eq!(writer.batch_vertex(1), None);
        let second = writer.finish_batch();

        assert_eq!(first, VertexRange { offset: 0, count: 2 });
        assert_eq!(second, VertexRange { offset: 2, count: 1 });
        assert_eq!(writer.written(), 3);
        assert_eq!(writer.reserved(), 8);

        assert_eq!(geometry.bounds_min, Vec2::new(-3.0, 2.0));
        assert_eq!(geometry.bounds_max, Vec2::new(5.0, 5.0));
        assert_eq!(geometry.vertices[1].uv, [0.0, 1.0]);
        assert!(geometry.vertices[0].has_flag(Vertex::MASK_FILL));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "vertex writer overflow")]
    fn test_overflow_asserts() {
        let mut geometry = Geometry::new();
        let mut writer = VertexWriter::new(&mut geometry, 1, 0);
        writer.add_fill(Vec2::ZERO);
        writer.add_fill(Vec2::ZERO);
    }
}
