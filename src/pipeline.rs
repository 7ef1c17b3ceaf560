//! # Drawing Pipeline
//!
//! Glue between the geometry stages and the placement queue:
//!
//! ```text
//! triangles --transform--> TriangleRaster --sample--> ColorQuantizer --> ProducerSession
//! Drawable  --composite--> CompositeVoxel --transform--> ColorQuantizer --> ProducerSession
//! ```
//!
//! Voxels whose color quantizes to `Material::EMPTY` are skipped, never
//! enqueued. The draw jobs at the bottom of this module wrap each entry point
//! for the worker pool.

use std::sync::Arc;

use cgmath::{Point3, Vector3};
use image::Rgba;
use log::debug;

use crate::{
    compositor::{Drawable, Face, FaceSet, FaceSide},
    geometry::{BoxBounds, Facing, Transform, Vertex},
    palette::{ColorQuantizer, OperationTag},
    placement::{ProducerId, ProducerSession},
    raster::TriangleRaster,
    texture::TextureRaster,
    workers::{DrawJob, DrawReport, DrawServices},
};

/// Three vertices of a model triangle, in local coordinates.
pub type Triangle = [Vertex; 3];

/// Counters for one drawing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrawStats {
    /// Voxels the drawing produced, before quantization
    pub sampled: usize,
    /// Voxels skipped because their color quantized to `EMPTY`
    pub empty: usize,
}

fn place_color(
    session: &mut ProducerSession,
    quantizer: &ColorQuantizer,
    stats: &mut DrawStats,
    voxel: Point3<i32>,
    color: Rgba<u8>,
    tag: OperationTag,
) {
    stats.sampled += 1;
    let material = quantizer.quantize(color, tag);
    if material.is_empty() {
        stats.empty += 1;
        return;
    }
    session.place(voxel, material);
}

/// Rasterizes model triangles into `session` under the `Statue` tag.
///
/// Each triangle is colored flat by the first of its vertices carrying a
/// color; otherwise its voxels sample `texture` at the interpolated texture
/// coordinates. Triangles with neither are skipped.
///
/// # Arguments
/// * `session` - Receives the placements
/// * `quantizer` - Maps sampled colors to materials
/// * `triangles` - Triangles in local coordinates
/// * `texture` - Texture for uncolored triangles
/// * `transform` - Orientation and origin applied before rasterizing
pub fn draw_triangles(
    session: &mut ProducerSession,
    quantizer: &ColorQuantizer,
    triangles: &[Triangle],
    texture: Option<&TextureRaster>,
    transform: &Transform,
) -> DrawStats {
    let mut stats = DrawStats::default();

    for triangle in triangles {
        let flat = triangle.iter().find_map(Vertex::color);
        if flat.is_none() && texture.is_none() {
            debug!("Skipping triangle without color or texture");
            continue;
        }

        let [a, b, c] = *triangle;
        let raster = TriangleRaster::new(
            &a.transformed(transform),
            &b.transformed(transform),
            &c.transformed(transform),
        );
        for sample in raster {
            let color = match (flat, texture) {
                (Some(color), _) => color,
                (None, Some(texture)) => texture.sample(sample.u, sample.v),
                (None, None) => continue,
            };
            place_color(
                session,
                quantizer,
                &mut stats,
                sample.voxel,
                color,
                OperationTag::Statue,
            );
        }
    }

    stats
}

/// Composites `drawable` over a `size` box into `session`.
///
/// Each painted voxel's offset (already remapped by the drawable) goes
/// through `transform` and snaps to the nearest voxel.
pub fn draw_box(
    session: &mut ProducerSession,
    quantizer: &ColorQuantizer,
    drawable: &Drawable,
    size: Vector3<u32>,
    transform: &Transform,
    tag: OperationTag,
) -> DrawStats {
    let mut stats = DrawStats::default();
    for voxel in drawable.composite(size) {
        let world = transform.apply_voxel(voxel.offset);
        place_color(session, quantizer, &mut stats, world, voxel.color, tag);
    }
    stats
}

/// A one-voxel-thick drawable showing `texture` upright on its south face,
/// one voxel per logical texel.
///
/// # Returns
/// The drawable and the box size to composite it over.
pub fn image_drawable(texture: Arc<TextureRaster>) -> (Drawable, Vector3<u32>) {
    let width = texture.resolution();
    let height = (texture.height() as u64 * width as u64 / texture.width().max(1) as u64).max(1) as u32;
    let faces = FaceSet::new().with(FaceSide::South, Face::new(texture));
    (Drawable::planar(faces), Vector3::new(width, height, 1))
}

/// Draws a triangle model on a worker thread.
pub struct StatueJob {
    producer: ProducerId,
    triangles: Vec<Triangle>,
    texture: Option<Arc<TextureRaster>>,
    transform: Transform,
}

impl StatueJob {
    /// Creates a job drawing `triangles` for `producer`.
    pub fn new(
        producer: ProducerId,
        triangles: Vec<Triangle>,
        texture: Option<Arc<TextureRaster>>,
        transform: Transform,
    ) -> Self {
        StatueJob {
            producer,
            triangles,
            texture,
            transform,
        }
    }
}

impl DrawJob for StatueJob {
    fn run(self: Box<Self>, services: &DrawServices) -> DrawReport {
        let mut session = services.open_session(self.producer);
        let stats = draw_triangles(
            &mut session,
            &services.quantizer,
            &self.triangles,
            self.texture.as_deref(),
            &self.transform,
        );
        DrawReport {
            producer: self.producer,
            label: format!("statue of {} triangles", self.triangles.len()),
            sampled: stats.sampled,
            empty: stats.empty,
            session: session.finish(),
        }
    }
}

/// Draws a composited box (a block, a plant, an image) on a worker thread.
pub struct BoxJob {
    producer: ProducerId,
    drawable: Drawable,
    size: Vector3<u32>,
    transform: Transform,
    tag: OperationTag,
}

impl BoxJob {
    /// Creates a job drawing `drawable` over a `size` box for `producer`.
    pub fn new(
        producer: ProducerId,
        drawable: Drawable,
        size: Vector3<u32>,
        transform: Transform,
        tag: OperationTag,
    ) -> Self {
        BoxJob {
            producer,
            drawable,
            size,
            transform,
            tag,
        }
    }

    /// Creates a job filling the box spanned by two corners, drawn
    /// unrotated from its minimum corner.
    pub fn spanning(producer: ProducerId, drawable: Drawable, bounds: BoxBounds, tag: OperationTag) -> Self {
        Self::new(
            producer,
            drawable,
            bounds.size(),
            Transform::facing(bounds.min, Facing::South),
            tag,
        )
    }

    /// Creates a job drawing `texture` as an upright image.
    pub fn image(producer: ProducerId, texture: Arc<TextureRaster>, transform: Transform) -> Self {
        let (drawable, size) = image_drawable(texture);
        Self::new(producer, drawable, size, transform, OperationTag::Image)
    }
}

impl DrawJob for BoxJob {
    fn run(self: Box<Self>, services: &DrawServices) -> DrawReport {
        let mut session = services.open_session(self.producer);
        let stats = draw_box(
            &mut session,
            &services.quantizer,
            &self.drawable,
            self.size,
            &self.transform,
            self.tag,
        );
        DrawReport {
            producer: self.producer,
            label: format!(
                "{:?} box {}x{}x{}",
                self.tag, self.size.x, self.size.y, self.size.z
            ),
            sampled: stats.sampled,
            empty: stats.empty,
            session: session.finish(),
        }
    }
}
