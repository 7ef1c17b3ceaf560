use std::sync::Arc;

use cgmath::Vector2;
use image::Rgba;

use super::face_side::FaceSide;
use crate::texture::{ColorRemap, TextureRaster};

/// Inclusive window, in in-plane voxel indices, that a face is limited to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Crop {
    /// First horizontal index covered
    pub min_h: u32,
    /// Last horizontal index covered
    pub max_h: u32,
    /// First vertical index covered
    pub min_v: u32,
    /// Last vertical index covered
    pub max_v: u32,
}

impl Crop {
    /// Whether an in-plane position falls inside the window.
    pub fn contains(&self, h: u32, v: u32) -> bool {
        (self.min_h..=self.max_h).contains(&h) && (self.min_v..=self.max_v).contains(&v)
    }
}

/// A texture mapping applied to one side of a box.
///
/// The mapping is described by the UV coordinates at the face's four corners,
/// ordered top-left, top-right, bottom-right, bottom-left as seen from outside
/// the box. A plain UV rectangle is the common case; arbitrary corners express
/// rotation and mirroring.
///
/// `delta` and `depth` select which voxel layers the face paints: layers
/// `delta..delta + depth` counted inward from the side's plane.
#[derive(Clone, Debug)]
pub struct Face {
    texture: Arc<TextureRaster>,
    corners: [Vector2<f32>; 4],
    depth: u32,
    delta: u32,
    crop: Option<Crop>,
    remap: ColorRemap,
}

impl Face {
    /// A face showing the whole texture, one layer deep, on the surface.
    pub fn new(texture: Arc<TextureRaster>) -> Self {
        Face {
            texture,
            corners: rect_corners(0.0, 0.0, 1.0, 1.0),
            depth: 1,
            delta: 0,
            crop: None,
            remap: ColorRemap::None,
        }
    }

    /// Maps the normalized UV rectangle `(u0, v0)`-`(u1, v1)` onto the face.
    pub fn with_uv_rect(self, u0: f32, v0: f32, u1: f32, v1: f32) -> Self {
        Face {
            corners: rect_corners(u0, v0, u1, v1),
            ..self
        }
    }

    /// Sets the four corner UVs directly (top-left, top-right, bottom-right,
    /// bottom-left).
    pub fn with_corners(self, corners: [Vector2<f32>; 4]) -> Self {
        Face { corners, ..self }
    }

    /// Rotates the texture clockwise by `quarter_turns` quarter turns.
    pub fn rotated(mut self, quarter_turns: u8) -> Self {
        self.corners.rotate_right((quarter_turns % 4) as usize);
        self
    }

    /// Mirrors the texture left to right.
    pub fn mirrored(mut self) -> Self {
        self.corners.swap(0, 1);
        self.corners.swap(2, 3);
        self
    }

    /// Number of voxel layers the face paints.
    pub fn with_depth(self, depth: u32) -> Self {
        Face { depth, ..self }
    }

    /// Number of layers skipped before the face starts painting.
    pub fn with_delta(self, delta: u32) -> Self {
        Face { delta, ..self }
    }

    /// Limits the face to an in-plane window.
    pub fn with_crop(self, crop: Crop) -> Self {
        Face {
            crop: Some(crop),
            ..self
        }
    }

    /// Applies a gray or tint remap to every sample.
    pub fn with_remap(self, remap: ColorRemap) -> Self {
        Face { remap, ..self }
    }

    /// Whether the in-plane position passes the crop window (if any).
    pub fn in_crop(&self, h: u32, v: u32) -> bool {
        self.crop.map_or(true, |crop| crop.contains(h, v))
    }

    /// Whether the face paints a voxel `layer` layers in, at `(h, v)`.
    pub fn covers(&self, layer: u32, h: u32, v: u32) -> bool {
        layer >= self.delta && layer - self.delta < self.depth && self.in_crop(h, v)
    }

    /// Texture coordinates at fractional face position `(s, t)`.
    pub fn uv_at(&self, s: f32, t: f32) -> Vector2<f32> {
        let [top_left, top_right, bottom_right, bottom_left] = self.corners;
        let top = top_left + (top_right - top_left) * s;
        let bottom = bottom_left + (bottom_right - bottom_left) * s;
        top + (bottom - top) * t
    }

    /// Samples the texture at fractional face position `(s, t)`.
    pub fn sample(&self, s: f32, t: f32) -> Rgba<u8> {
        let uv = self.uv_at(s, t);
        self.remap.apply(self.texture.sample(uv.x, uv.y))
    }
}

fn rect_corners(u0: f32, v0: f32, u1: f32, v1: f32) -> [Vector2<f32>; 4] {
    [
        Vector2::new(u0, v0),
        Vector2::new(u1, v0),
        Vector2::new(u1, v1),
        Vector2::new(u0, v1),
    ]
}

/// Up to six faces of a box, one per side; any may be absent.
#[derive(Clone, Debug, Default)]
pub struct FaceSet {
    faces: [Option<Face>; 6],
}

impl FaceSet {
    /// An empty face set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The same face on every side.
    pub fn uniform(face: Face) -> Self {
        FaceSet {
            faces: std::array::from_fn(|_| Some(face.clone())),
        }
    }

    /// Sets the face for `side`.
    pub fn with(mut self, side: FaceSide, face: Face) -> Self {
        self.faces[side.index()] = Some(face);
        self
    }

    /// Clears the face for `side`.
    pub fn without(mut self, side: FaceSide) -> Self {
        self.faces[side.index()] = None;
        self
    }

    /// The face on `side`, if present.
    pub fn get(&self, side: FaceSide) -> Option<&Face> {
        self.faces[side.index()].as_ref()
    }

    /// Present faces with their sides, in side index order.
    pub fn iter(&self) -> impl Iterator<Item = (FaceSide, &Face)> + '_ {
        self.faces.iter().enumerate().filter_map(|(index, face)| {
            let side = FaceSide::from_index(index)?;
            face.as_ref().map(|face| (side, face))
        })
    }
}
