use std::{
    collections::HashSet,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use cgmath::{Point3, Vector3};
use image::Rgba;
use voxel_placer::{
    compositor::{Drawable, Face, FaceSet, FaceSide},
    config::PlacementConfig,
    geometry::{Facing, Transform, Vertex},
    palette::{ColorQuantizer, Material, MaterialEntry, OperationTag, Palette},
    pipeline::{BoxJob, StatueJob},
    placement::{MemoryAudit, MemoryNotifier, MemoryWorld, PlacementQueue, PlacementScheduler, ProducerId},
    texture::TextureRaster,
    workers::{DrawServices, DrawWorkerPool},
};

const WHITE: Rgba<u8> = Rgba([250, 250, 250, 255]);
const GREEN: Rgba<u8> = Rgba([60, 160, 50, 255]);

struct Host {
    world: MemoryWorld,
    audit: MemoryAudit,
    queue: Arc<PlacementQueue>,
    scheduler: PlacementScheduler,
    pool: DrawWorkerPool,
}

fn host(config: PlacementConfig, workers: usize) -> Host {
    let quantizer = Arc::new(ColorQuantizer::from_config(&config));
    let tags = [OperationTag::Image, OperationTag::Block, OperationTag::Statue];
    quantizer.install_palette(Palette::new(vec![
        MaterialEntry::new(Material(1), WHITE, tags),
        MaterialEntry::new(Material(2), GREEN, tags),
    ]));

    let queue = Arc::new(PlacementQueue::from_config(&config));
    let world = MemoryWorld::new(None);
    let audit = MemoryAudit::default();
    let scheduler = PlacementScheduler::new(
        queue.clone(),
        &config,
        Box::new(world.clone()),
        Box::new(audit.clone()),
        Box::new(MemoryNotifier::default()),
    );
    let pool = DrawWorkerPool::new(
        workers,
        DrawServices::new(quantizer, queue.clone(), Arc::new(config)),
    );
    Host {
        world,
        audit,
        queue,
        scheduler,
        pool,
    }
}

/// Ticks until every job has reported and the queue has drained.
fn run_to_completion(host: &mut Host) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !host.scheduler.is_cancelled() {
        assert!(Instant::now() < deadline, "host loop did not finish");
        host.scheduler.tick();
        host.pool.collect_reports();
        host.pool.process_queued_jobs();
        if host.pool.is_idle() && !host.queue.is_shutdown() {
            host.queue.shutdown();
        }
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_jobs_end_up_in_world_and_undo_history() {
    let mut host = host(PlacementConfig::new(1, 16, 32, 64), 2);
    let green = Arc::new(TextureRaster::solid(4, 4, GREEN));

    host.pool.publish_job(Box::new(BoxJob::new(
        ProducerId(1),
        Drawable::planar(FaceSet::new().with(FaceSide::Up, Face::new(green))),
        Vector3::new(4, 2, 5),
        Transform::facing(Point3::new(0, 10, 0), Facing::South),
        OperationTag::Block,
    )));
    host.pool.publish_job(Box::new(StatueJob::new(
        ProducerId(2),
        vec![[
            Vertex::new(Point3::new(0.0, 0.0, 0.0), 0.0, 0.0).with_color(WHITE),
            Vertex::new(Point3::new(10.0, 0.0, 0.0), 0.0, 0.0),
            Vertex::new(Point3::new(0.0, 10.0, 0.0), 0.0, 0.0),
        ]],
        None,
        Transform::facing(Point3::new(100, 0, 0), Facing::South),
    )));
    run_to_completion(&mut host);
    host.pool.shutdown();

    let blocks = host.world.blocks();
    let top: HashSet<_> = blocks
        .iter()
        .filter(|(_, m)| **m == Material(2))
        .map(|(v, _)| *v)
        .collect();
    assert_eq!(top.len(), 20);
    assert!(top.iter().all(|v| v.y == 11));

    let statue = blocks.iter().filter(|(_, m)| **m == Material(1)).count();
    assert!(statue > 0);
    assert!(blocks
        .keys()
        .filter(|v| v.x >= 100)
        .all(|v| v.x <= 110 && (0..=10).contains(&v.y) && v.z == 0));

    let sessions = host.world.committed_sessions();
    assert_eq!(sessions.len(), 2);
    assert_eq!(host.audit.changes().len(), blocks.len());
}

#[test]
fn test_producers_survive_backpressure_with_small_limits() {
    let mut host = host(PlacementConfig::new(1, 8, 4, 8), 3);
    let white = Arc::new(TextureRaster::solid(2, 2, WHITE));

    for n in 0..3u64 {
        host.pool.publish_job(Box::new(BoxJob::new(
            ProducerId(n),
            Drawable::planar(FaceSet::uniform(Face::new(white.clone()).with_depth(4))),
            Vector3::new(4, 4, 4),
            Transform::facing(Point3::new(n as i32 * 10, 0, 0), Facing::South),
            OperationTag::Block,
        )));
    }
    run_to_completion(&mut host);
    host.pool.shutdown();

    assert_eq!(host.world.block_count(), 3 * 64);
    assert_eq!(host.world.committed_sessions().len(), 3);
}
