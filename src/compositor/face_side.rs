//! # Face Side Module
//!
//! The six sides of a box and how a voxel inside the box relates to each of
//! them: how many layers in from that side's plane it sits, and where it falls
//! on the side's 2D texture.

use cgmath::{Point3, Vector3};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// Represents the six possible faces of a box.
///
/// The values index a [`FaceSet`](super::FaceSet) and are stable.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, FromPrimitive)]
pub enum FaceSide {
    /// The top face (facing positive Y)
    Up = 0,

    /// The bottom face (facing negative Y)
    Down = 1,

    /// The north face (facing negative Z)
    North = 2,

    /// The south face (facing positive Z)
    South = 3,

    /// The west face (facing negative X)
    West = 4,

    /// The east face (facing positive X)
    East = 5,
}

/// Where a voxel sits relative to one side of its box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlaneCoords {
    /// Layers in from the side's plane (0 = on the surface).
    pub layer: u32,
    /// Horizontal in-plane voxel index, left to right as seen from outside.
    pub h: u32,
    /// Vertical in-plane voxel index, top to bottom as seen from outside.
    pub v: u32,
    /// Fractional horizontal position of the voxel center (0..1).
    pub s: f32,
    /// Fractional vertical position of the voxel center (0..1).
    pub t: f32,
}

impl FaceSide {
    /// Looks a side up by its index.
    pub fn from_index(index: usize) -> Option<FaceSide> {
        FromPrimitive::from_usize(index)
    }

    /// Index of this side within a face set.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Locates `voxel` (inside a box of `size`) relative to this side.
    ///
    /// The in-plane axes are oriented as seen from outside the box with up
    /// pointing to +Y for the vertical sides, and to -Z (north) for the top.
    pub fn plane_coords(self, voxel: Point3<u32>, size: Vector3<u32>) -> PlaneCoords {
        let (x, y, z) = (voxel.x, voxel.y, voxel.z);
        let (w, h, d) = (size.x, size.y, size.z);
        let from_top = h - 1 - y;

        let (layer, h_index, v_index, h_extent, v_extent) = match self {
            FaceSide::Up => (from_top, x, z, w, d),
            FaceSide::Down => (y, x, d - 1 - z, w, d),
            FaceSide::North => (z, w - 1 - x, from_top, w, h),
            FaceSide::South => (d - 1 - z, x, from_top, w, h),
            FaceSide::West => (x, z, from_top, d, h),
            FaceSide::East => (w - 1 - x, d - 1 - z, from_top, d, h),
        };

        PlaneCoords {
            layer,
            h: h_index,
            v: v_index,
            s: (h_index as f32 + 0.5) / h_extent as f32,
            t: (v_index as f32 + 0.5) / v_extent as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trips() {
        for index in 0..6 {
            let side = FaceSide::from_index(index).unwrap();
            assert_eq!(side.index(), index);
        }
        assert_eq!(FaceSide::from_index(6), None);
    }

    #[test]
    fn test_surface_voxels_are_layer_zero() {
        let size = Vector3::new(4, 5, 6);
        let max = Point3::new(3, 4, 5);
        let origin = Point3::new(0, 0, 0);
        assert_eq!(FaceSide::Up.plane_coords(max, size).layer, 0);
        assert_eq!(FaceSide::South.plane_coords(max, size).layer, 0);
        assert_eq!(FaceSide::East.plane_coords(max, size).layer, 0);
        assert_eq!(FaceSide::Down.plane_coords(origin, size).layer, 0);
        assert_eq!(FaceSide::North.plane_coords(origin, size).layer, 0);
        assert_eq!(FaceSide::West.plane_coords(origin, size).layer, 0);
        assert_eq!(FaceSide::Up.plane_coords(origin, size).layer, 4);
    }

    #[test]
    fn test_side_faces_read_top_down() {
        let size = Vector3::new(2, 4, 2);
        let top = FaceSide::South.plane_coords(Point3::new(0, 3, 1), size);
        let bottom = FaceSide::South.plane_coords(Point3::new(0, 0, 1), size);
        assert_eq!(top.v, 0);
        assert_eq!(bottom.v, 3);
        assert!(top.t < bottom.t);
    }
}
