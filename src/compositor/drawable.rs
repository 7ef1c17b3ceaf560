//! # Drawables
//!
//! A drawable is a face set plus the strategy that decides which faces paint
//! which voxels of a box:
//!
//! - `Planar`: each face paints the layers just inside its own side, as
//!   selected by the face's delta, depth and crop.
//! - `Diagonal`: faces paint diagonal cross-sections of the box instead,
//!   used for crossed plant-like shapes.
//!
//! Either way, a voxel covered by several faces gets the arithmetic mean of
//! their samples, and a voxel covered by none is skipped.

use cgmath::{Matrix3, Point3, Vector3};
use image::Rgba;

use super::{
    face::FaceSet,
    face_side::{FaceSide, PlaneCoords},
};

/// How faces are mapped onto the voxels of a box.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DrawStrategy {
    /// Faces paint layers parallel to their own side.
    Planar,
    /// Faces paint the box's diagonal cross-sections.
    Diagonal,
}

/// A box-shaped thing that can be drawn into voxels.
#[derive(Clone, Debug)]
pub struct Drawable {
    faces: FaceSet,
    strategy: DrawStrategy,
    remap: Option<Matrix3<f32>>,
    use_alpha: bool,
}

/// One painted voxel of a composited box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CompositeVoxel {
    /// Position inside the box
    pub local: Point3<u32>,
    /// Offset relative to the placement origin, after the optional remap
    pub offset: Vector3<f32>,
    /// Blended color of every face covering the voxel
    pub color: Rgba<u8>,
}

impl Drawable {
    /// A drawable whose faces paint their own sides.
    pub fn planar(faces: FaceSet) -> Self {
        Drawable {
            faces,
            strategy: DrawStrategy::Planar,
            remap: None,
            use_alpha: true,
        }
    }

    /// A drawable whose faces paint diagonal cross-sections.
    pub fn diagonal(faces: FaceSet) -> Self {
        Drawable {
            strategy: DrawStrategy::Diagonal,
            ..Self::planar(faces)
        }
    }

    /// Applies a linear remap to every local offset, for leaning or skewed
    /// placements. The matrix maps local `(x, y, z)` to an offset relative to
    /// the placement origin.
    pub fn with_remap(self, remap: Matrix3<f32>) -> Self {
        Drawable {
            remap: Some(remap),
            ..self
        }
    }

    /// Whether sampled alpha is kept. When false, any color with nonzero RGB
    /// is forced opaque, for materials without native transparency.
    pub fn with_use_alpha(self, use_alpha: bool) -> Self {
        Drawable { use_alpha, ..self }
    }

    /// Walks every voxel of a `size` box, yielding the painted ones.
    pub fn composite(&self, size: Vector3<u32>) -> Composite<'_> {
        Composite {
            drawable: self,
            size,
            index: 0,
            total: size.x as u64 * size.y as u64 * size.z as u64,
        }
    }

    /// Blended color of the voxel at `local`, or `None` if no face covers it.
    pub fn color_at(&self, local: Point3<u32>, size: Vector3<u32>) -> Option<Rgba<u8>> {
        let mut sums = [0u32; 4];
        let mut matches = 0u32;

        for (side, face) in self.faces.iter() {
            let coords = side.plane_coords(local, size);
            let covered = match self.strategy {
                DrawStrategy::Planar => face.covers(coords.layer, coords.h, coords.v),
                DrawStrategy::Diagonal => {
                    on_diagonal(side, local, size) && face.in_crop(coords.h, coords.v)
                }
            };
            if covered {
                let PlaneCoords { s, t, .. } = coords;
                let sample = face.sample(s, t);
                for (sum, channel) in sums.iter_mut().zip(sample.0) {
                    *sum += channel as u32;
                }
                matches += 1;
            }
        }

        if matches == 0 {
            return None;
        }

        let mut color = Rgba(sums.map(|sum| ((sum + matches / 2) / matches) as u8));
        if !self.use_alpha && color.0[..3].iter().any(|&c| c != 0) {
            color.0[3] = u8::MAX;
        }
        Some(color)
    }

    fn offset(&self, local: Point3<u32>) -> Vector3<f32> {
        let local = Vector3::new(local.x as f32, local.y as f32, local.z as f32);
        match self.remap {
            Some(remap) => remap * local,
            None => local,
        }
    }
}

/// Tests the mirror condition assigned to `side` after scaling every axis to
/// the box's smallest dimension.
///
/// Up/Down take the x-y diagonals, South/North the x-z diagonals and
/// East/West the y-z diagonals; the first of each pair is the direct diagonal,
/// the second its reflection.
fn on_diagonal(side: FaceSide, local: Point3<u32>, size: Vector3<u32>) -> bool {
    let reference = size.x.min(size.y).min(size.z);
    let scale = |coord: u32, extent: u32| (coord as u64 * reference as u64 / extent as u64) as u32;
    let cx = scale(local.x, size.x);
    let cy = scale(local.y, size.y);
    let cz = scale(local.z, size.z);
    let reflect = |c: u32| reference - 1 - c;

    match side {
        FaceSide::Up => cx == cy,
        FaceSide::Down => cx == reflect(cy),
        FaceSide::South => cx == cz,
        FaceSide::North => cx == reflect(cz),
        FaceSide::East => cy == cz,
        FaceSide::West => cy == reflect(cz),
    }
}

/// Lazy walk over the voxels of a box, yielding the painted ones.
pub struct Composite<'a> {
    drawable: &'a Drawable,
    size: Vector3<u32>,
    index: u64,
    total: u64,
}

impl Iterator for Composite<'_> {
    type Item = CompositeVoxel;

    fn next(&mut self) -> Option<CompositeVoxel> {
        let (h, d) = (self.size.y as u64, self.size.z as u64);
        while self.index < self.total {
            let index = self.index;
            self.index += 1;

            let local = Point3::new(
                (index / (h * d)) as u32,
                ((index / d) % h) as u32,
                (index % d) as u32,
            );
            if let Some(color) = self.drawable.color_at(local, self.size) {
                return Some(CompositeVoxel {
                    local,
                    offset: self.drawable.offset(local),
                    color,
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{compositor::Face, texture::TextureRaster};

    fn solid(color: [u8; 4]) -> Face {
        Face::new(Arc::new(TextureRaster::solid(2, 2, Rgba(color))))
    }

    #[test]
    fn test_up_face_paints_top_layer() {
        let drawable = Drawable::planar(FaceSet::new().with(FaceSide::Up, solid([10, 20, 30, 255])));
        let size = Vector3::new(4, 3, 5);
        let voxels: Vec<_> = drawable.composite(size).collect();
        assert_eq!(voxels.len(), 4 * 5);
        assert!(voxels.iter().all(|v| v.local.y == 2));
        assert!(voxels.iter().all(|v| v.color == Rgba([10, 20, 30, 255])));
    }

    #[test]
    fn test_zero_depth_paints_nothing() {
        let drawable =
            Drawable::planar(FaceSet::new().with(FaceSide::Up, solid([10, 20, 30, 255]).with_depth(0)));
        assert_eq!(drawable.composite(Vector3::new(4, 3, 5)).count(), 0);
    }

    #[test]
    fn test_delta_insets_the_face() {
        let drawable = Drawable::planar(
            FaceSet::new().with(FaceSide::West, solid([1, 1, 1, 255]).with_delta(2).with_depth(1)),
        );
        let voxels: Vec<_> = drawable.composite(Vector3::new(5, 2, 2)).collect();
        assert_eq!(voxels.len(), 4);
        assert!(voxels.iter().all(|v| v.local.x == 2));
    }

    #[test]
    fn test_edges_blend_overlapping_faces() {
        let drawable = Drawable::planar(
            FaceSet::new()
                .with(FaceSide::Up, solid([200, 0, 0, 255]))
                .with(FaceSide::South, solid([0, 0, 100, 255])),
        );
        let size = Vector3::new(3, 3, 3);
        let edge = drawable.color_at(Point3::new(1, 2, 2), size);
        assert_eq!(edge, Some(Rgba([100, 0, 50, 255])));
        assert_eq!(drawable.color_at(Point3::new(1, 1, 1), size), None);
        // Top layer plus south layer, minus the shared edge row.
        assert_eq!(drawable.composite(size).count(), 9 + 9 - 3);
    }

    #[test]
    fn test_opaque_without_alpha() {
        let faces = FaceSet::new().with(FaceSide::Up, solid([50, 60, 70, 10]));
        let size = Vector3::new(1, 1, 1);
        let keep = Drawable::planar(faces.clone()).color_at(Point3::new(0, 0, 0), size);
        let force = Drawable::planar(faces)
            .with_use_alpha(false)
            .color_at(Point3::new(0, 0, 0), size);
        assert_eq!(keep, Some(Rgba([50, 60, 70, 10])));
        assert_eq!(force, Some(Rgba([50, 60, 70, 255])));

        let black = Drawable::planar(FaceSet::new().with(FaceSide::Up, solid([0, 0, 0, 0])))
            .with_use_alpha(false)
            .color_at(Point3::new(0, 0, 0), size);
        assert_eq!(black, Some(Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn test_diagonal_cross() {
        let drawable = Drawable::diagonal(
            FaceSet::new()
                .with(FaceSide::South, solid([0, 255, 0, 255]))
                .with(FaceSide::North, solid([0, 255, 0, 255])),
        );
        let voxels: Vec<_> = drawable.composite(Vector3::new(3, 3, 3)).collect();
        // Per layer: x == z (3) plus x == 2 - z (3), sharing the center.
        assert_eq!(voxels.len(), 5 * 3);
        assert!(voxels
            .iter()
            .all(|v| v.local.x == v.local.z || v.local.x == 2 - v.local.z));
    }

    #[test]
    fn test_diagonal_scales_to_smallest_dimension() {
        let drawable =
            Drawable::diagonal(FaceSet::new().with(FaceSide::South, solid([0, 255, 0, 255])));
        // x spans 4 voxels, z spans 2: x pairs map onto each z.
        let voxels: Vec<_> = drawable.composite(Vector3::new(4, 2, 2)).collect();
        let locals: Vec<_> = voxels
            .iter()
            .filter(|v| v.local.y == 0)
            .map(|v| (v.local.x, v.local.z))
            .collect();
        assert_eq!(locals, vec![(0, 0), (1, 0), (2, 1), (3, 1)]);
    }

    #[test]
    fn test_remap_skews_offsets() {
        let lean = Matrix3::new(1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0);
        let drawable = Drawable::planar(FaceSet::new().with(FaceSide::West, solid([1, 1, 1, 255])))
            .with_remap(lean);
        for voxel in drawable.composite(Vector3::new(1, 3, 1)) {
            // Each layer up shifts one step along x.
            assert_eq!(voxel.offset.x, voxel.local.y as f32);
            assert_eq!(voxel.offset.y, voxel.local.y as f32);
        }
    }
}
