//! # Geometry
//!
//! Value types shared by the rasterizer and the box compositor: model vertices,
//! the orientation transform that places a drawing in the world, and integer
//! box bounds.

mod bounds;
mod transform;
mod vertex;

pub use bounds::BoxBounds;
pub use transform::{Facing, Transform};
pub use vertex::Vertex;
