//! Orientation transforms applied upstream of rasterization.
//!
//! A [`Transform`] is what the host hands the pipeline to say "this is where the
//! drawing goes and which way it faces": either derived from a producer's
//! facing or an explicit 3x3 basis.

use cgmath::{Matrix3, Point3, SquareMatrix, Vector3};

/// Horizontal facing of a producer, used to rotate drawings about the
/// vertical axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Facing {
    /// Facing positive Z (no rotation)
    South,
    /// Facing negative X
    West,
    /// Facing negative Z
    North,
    /// Facing positive X
    East,
}

impl Facing {
    /// Exact rotation matrix about the Y axis.
    pub fn rotation(self) -> Matrix3<f32> {
        // Column-major: each Vector3 is the image of a local axis.
        match self {
            Facing::South => Matrix3::identity(),
            Facing::West => Matrix3::from_cols(
                Vector3::new(0.0, 0.0, 1.0),
                Vector3::new(0.0, 1.0, 0.0),
                Vector3::new(-1.0, 0.0, 0.0),
            ),
            Facing::North => Matrix3::from_cols(
                Vector3::new(-1.0, 0.0, 0.0),
                Vector3::new(0.0, 1.0, 0.0),
                Vector3::new(0.0, 0.0, -1.0),
            ),
            Facing::East => Matrix3::from_cols(
                Vector3::new(0.0, 0.0, -1.0),
                Vector3::new(0.0, 1.0, 0.0),
                Vector3::new(1.0, 0.0, 0.0),
            ),
        }
    }
}

/// Maps local drawing coordinates into world coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform {
    basis: Matrix3<f32>,
    origin: Point3<f32>,
}

impl Transform {
    /// A transform that leaves coordinates untouched.
    pub fn identity() -> Self {
        Transform {
            basis: Matrix3::identity(),
            origin: Point3::new(0.0, 0.0, 0.0),
        }
    }

    /// Places local coordinates at `origin`, rotated to `facing`.
    pub fn facing(origin: Point3<i32>, facing: Facing) -> Self {
        Self::from_basis(origin, facing.rotation())
    }

    /// Places local coordinates at `origin` through an explicit basis.
    pub fn from_basis(origin: Point3<i32>, basis: Matrix3<f32>) -> Self {
        Transform {
            basis,
            origin: Point3::new(origin.x as f32, origin.y as f32, origin.z as f32),
        }
    }

    /// Transforms a continuous point.
    pub fn apply(&self, local: Point3<f32>) -> Point3<f32> {
        self.origin + self.basis * Vector3::new(local.x, local.y, local.z)
    }

    /// Transforms a local offset and snaps it to the nearest voxel.
    pub fn apply_voxel(&self, local: Vector3<f32>) -> Point3<i32> {
        let world = self.origin + self.basis * local;
        Point3::new(
            world.x.round() as i32,
            world.y.round() as i32,
            world.z.round() as i32,
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
