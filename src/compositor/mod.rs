//! # Box Compositor
//!
//! Turns an axis-aligned box and up to six textured faces into colored voxels.
//!
//! ## Key Components
//! - `FaceSide`: the six sides of a box and per-voxel plane coordinates
//! - `Face`: a texture mapping with depth, delta, crop and remap settings
//! - `FaceSet`: up to one face per side
//! - `Drawable`: a face set plus a draw strategy (`Planar` or `Diagonal`)
//!
//! Shape variants are composed from these pieces rather than subclassed: a
//! full cube, a slab, a carpet and a crossed plant differ only in their faces'
//! depth/crop and the strategy.

mod drawable;
mod face;
mod face_side;

pub use drawable::{Composite, CompositeVoxel, DrawStrategy, Drawable};
pub use face::{Crop, Face, FaceSet};
pub use face_side::{FaceSide, PlaneCoords};
