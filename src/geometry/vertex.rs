//! Vertex data for the triangle rasterizer.

use cgmath::{Point3, Vector2};
use image::Rgba;

use super::Transform;

/// A corner of a model triangle.
///
/// Vertices are immutable values: every pipeline stage that changes one
/// (transforming into world space, for example) returns a new vertex.
///
/// # Fields
/// - Position: 3x f32 in the coordinate space of the current stage
/// - Texture coordinates: normalized `(u, v)` into the triangle's texture
/// - Color: optional flat color overriding texture sampling
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    position: Point3<f32>,
    tex_coords: Vector2<f32>,
    color: Option<Rgba<u8>>,
}

impl Vertex {
    /// Creates a textured vertex.
    ///
    /// # Arguments
    /// * `position` - Position of the vertex
    /// * `u`, `v` - Texture coordinates (normalized 0.0-1.0)
    pub fn new(position: Point3<f32>, u: f32, v: f32) -> Self {
        Vertex {
            position,
            tex_coords: Vector2::new(u, v),
            color: None,
        }
    }

    /// Returns a copy of this vertex carrying a flat color override.
    pub fn with_color(self, color: Rgba<u8>) -> Self {
        Vertex {
            color: Some(color),
            ..self
        }
    }

    /// Position of the vertex.
    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    /// Flat color override, if any.
    pub fn color(&self) -> Option<Rgba<u8>> {
        self.color
    }

    /// Returns this vertex moved into the space described by `transform`.
    pub fn transformed(&self, transform: &Transform) -> Self {
        Vertex {
            position: transform.apply(self.position),
            ..*self
        }
    }

    /// The five interpolated components: x, y, z, u, v.
    pub(crate) fn components(&self) -> [f32; 5] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.tex_coords.x,
            self.tex_coords.y,
        ]
    }
}
