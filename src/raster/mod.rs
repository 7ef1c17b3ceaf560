//! # Rasterization
//!
//! Scan conversion of model triangles into voxels. See [`TriangleRaster`].

mod line;
mod triangle;

pub use triangle::{RasterSample, TriangleRaster};
