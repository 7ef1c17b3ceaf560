#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Placer
//!
//! Turns textured geometry into voxel placements and feeds them to a host
//! world at a controlled rate.
//!
//! Drawing runs on producer threads: triangles are rasterized, boxes are
//! composited from textured faces, and every resulting color is quantized to
//! the nearest allowed material. Placements travel through per-producer
//! queues with backpressure to a single periodic scheduler that applies them
//! round-robin through host collaborators.
//!
//! ## Key Modules
//!
//! * `raster` - Triangle-to-voxel rasterizer
//! * `compositor` - Box and diagonal-cross face compositor
//! * `palette` - Materials, palettes and the color quantizer
//! * `placement` - Producer queues, backpressure and the scheduler
//! * `workers` - Producer thread pool running draw jobs
//! * `pipeline` - Glue from geometry to queued placements
//! * `geometry`, `texture`, `config`, `core` - Supporting types and services
//!
//! ## Usage
//!
//! ```rust,no_run
//! fn main() {
//!     voxel_placer::init_logger();
//!     if let Err(err) = voxel_placer::run(None) {
//!         eprintln!("{err}");
//!     }
//! }
//! ```
//!
//! ## Threading
//!
//! * Producers block only inside the queue's backpressure wait
//! * The scheduler tick never blocks
//! * The placement queue and the quantizer's cache use independent locks

use std::{path::Path, sync::Arc, thread};

use cgmath::{Point3, Vector3};
use image::{Rgba, RgbaImage};
use log::{info, warn};

pub mod compositor;
pub mod config;
pub mod core;
pub mod geometry;
pub mod palette;
pub mod pipeline;
pub mod placement;
pub mod raster;
pub mod texture;
pub mod workers;

use compositor::{Drawable, Face, FaceSet};
use config::{ConfigError, PaletteSource, PlacementConfig};
use geometry::{BoxBounds, Facing, Transform, Vertex};
use palette::{ColorQuantizer, Material, OperationTag, Palette};
use pipeline::{BoxJob, StatueJob};
use placement::{
    MemoryAudit, MemoryNotifier, MemoryWorld, PlacementQueue, PlacementScheduler, ProducerId,
};
use texture::{ColorRemap, TextureRaster, TextureRegistry};
use workers::{DrawServices, DrawWorkerPool};

/// Initializes the global logger from `RUST_LOG`, writing to stdout.
///
/// Calling it again is harmless.
pub fn init_logger() {
    let mut log_builder = env_logger::Builder::new();
    if log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .try_init()
        .is_ok()
    {
        info!("Logger initialized");
    }
}

const GRASS_TINT: ColorRemap = ColorRemap::Tint([145, 189, 89]);

fn demo_textures() -> TextureRegistry {
    let mut registry = TextureRegistry::new();
    registry.insert("stone", TextureRaster::solid(16, 16, Rgba([125, 125, 125, 255])));
    registry.insert("grass", TextureRaster::solid(16, 16, Rgba([150, 150, 150, 255])));
    registry.insert("snow", TextureRaster::solid(16, 16, Rgba([245, 250, 250, 255])));
    registry.insert("coal", TextureRaster::solid(16, 16, Rgba([24, 24, 28, 255])));
    registry.insert("poppy", TextureRaster::solid(16, 16, Rgba([190, 30, 30, 255])));
    registry.insert(
        "checker",
        TextureRaster::new(RgbaImage::from_fn(8, 8, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([240, 240, 240, 255])
            } else {
                Rgba([20, 20, 20, 255])
            }
        })),
    );
    registry
}

fn demo_palette_sources() -> Vec<PaletteSource> {
    use OperationTag::{Block, Image, Statue};

    [
        ("stone", ColorRemap::None, Material(1)),
        ("grass", GRASS_TINT, Material(2)),
        ("poppy", ColorRemap::None, Material(3)),
        ("snow", ColorRemap::None, Material(4)),
        ("coal", ColorRemap::None, Material(5)),
    ]
    .into_iter()
    .map(|(texture, remap, material)| PaletteSource {
        texture: texture.to_string(),
        material,
        remap,
        tags: vec![Image, Block, Statue],
    })
    .collect()
}

/// Builds a palette from configured sources, skipping unknown textures.
fn build_palette(registry: &TextureRegistry, sources: &[PaletteSource]) -> Palette {
    let textures: Vec<_> = sources
        .iter()
        .filter_map(|source| match registry.get(&source.texture) {
            Some(texture) => Some((source, texture)),
            None => {
                warn!("Palette texture {} is not registered", source.texture);
                None
            }
        })
        .collect();

    Palette::from_textures(textures.iter().map(|(source, texture)| {
        (
            source.material,
            texture.as_ref(),
            source.remap,
            source.tags.iter().copied(),
        )
    }))
}

fn demo_pyramid() -> Vec<pipeline::Triangle> {
    let apex = Point3::new(4.0, 6.0, 4.0);
    let base = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(8.0, 0.0, 0.0),
        Point3::new(8.0, 0.0, 8.0),
        Point3::new(0.0, 0.0, 8.0),
    ];
    let color = Rgba([130, 130, 130, 255]);
    (0..4)
        .map(|i| {
            [
                Vertex::new(base[i], 0.0, 1.0).with_color(color),
                Vertex::new(base[(i + 1) % 4], 1.0, 1.0),
                Vertex::new(apex, 0.5, 0.0),
            ]
        })
        .collect()
}

/// Runs the demo host: draws a statue, a block, a crossed plant and an image
/// on worker threads into an in-memory world, ticking the scheduler until
/// every job has been applied.
///
/// # Arguments
/// * `config_path` - JSON configuration file; built-in settings if `None`
pub fn run(config_path: Option<&Path>) -> Result<(), ConfigError> {
    let config = match config_path {
        Some(path) => PlacementConfig::load(path)?,
        None => PlacementConfig::new(5, 256, 2048, 4096),
    };
    info!("Placement config: {:?}", config);

    let registry = demo_textures();
    let quantizer = Arc::new(ColorQuantizer::from_config(&config));
    let sources = if config.palette.is_empty() {
        demo_palette_sources()
    } else {
        config.palette.clone()
    };
    quantizer.install_palette(build_palette(&registry, &sources));

    let queue = Arc::new(PlacementQueue::from_config(&config));
    let world = MemoryWorld::new(None);
    let audit = MemoryAudit::default();
    let notifier = MemoryNotifier::default();
    let mut scheduler = PlacementScheduler::new(
        queue.clone(),
        &config,
        Box::new(world.clone()),
        Box::new(audit.clone()),
        Box::new(notifier.clone()),
    );

    let services = DrawServices::new(quantizer, queue.clone(), Arc::new(config.clone()));
    let workers = thread::available_parallelism().map_or(2, |n| n.get().min(4));
    let mut pool = DrawWorkerPool::new(workers, services);

    pool.publish_job(Box::new(StatueJob::new(
        ProducerId(1),
        demo_pyramid(),
        None,
        Transform::facing(Point3::new(0, 64, 0), Facing::South),
    )));
    if let Some(grass) = registry.get("grass") {
        pool.publish_job(Box::new(BoxJob::spanning(
            ProducerId(2),
            Drawable::planar(FaceSet::uniform(Face::new(grass).with_remap(GRASS_TINT))),
            BoxBounds::from_corners(Point3::new(22, 66, 2), Point3::new(20, 64, 0)),
            OperationTag::Block,
        )));
    }
    if let Some(poppy) = registry.get("poppy") {
        pool.publish_job(Box::new(BoxJob::new(
            ProducerId(3),
            Drawable::diagonal(FaceSet::uniform(Face::new(poppy))).with_use_alpha(false),
            Vector3::new(5, 5, 5),
            Transform::facing(Point3::new(30, 64, 0), Facing::South),
            OperationTag::Block,
        )));
    }
    if let Some(checker) = registry.get("checker") {
        pool.publish_job(Box::new(BoxJob::image(
            ProducerId(4),
            checker,
            Transform::facing(Point3::new(40, 64, 0), Facing::North),
        )));
    }

    while !scheduler.is_cancelled() {
        scheduler.tick();
        pool.collect_reports();
        pool.process_queued_jobs();
        if pool.is_idle() && !queue.is_shutdown() {
            queue.shutdown();
        }
        thread::sleep(config.tick_interval());
    }
    pool.shutdown();

    info!(
        "World holds {} blocks after {} committed sessions and {} audited changes",
        world.block_count(),
        world.committed_sessions().len(),
        audit.changes().len()
    );
    for (producer, text) in notifier.messages() {
        info!("{}: {}", producer, text);
    }
    Ok(())
}
