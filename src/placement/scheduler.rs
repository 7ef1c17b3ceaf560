//! # Placement Scheduler
//!
//! The single consumer of the placement queue. Each tick pops one batch in
//! round-robin order and applies it through the host collaborators.
//!
//! ## Key Components
//!
//! * `PlacementScheduler` - Owns the collaborators and runs ticks
//! * `TickReport` - What one tick did
//!
//! ## Entry Handling
//!
//! * `Place` - Reads the old material, writes the new one, then audits the change.
//!   A change-limit failure is reported to the producer and the tick moves on.
//! * `Finalize` - Commits the producer's edit session
//! * `Command` - Runs on the scheduler with the originating queue context
//! * `Message` - Forwarded to the notifier
//!
//! A tick never blocks. When a tick finds the queue empty after shutdown was
//! requested, the scheduler cancels itself.

use std::{sync::Arc, thread, time::Duration};

use log::{debug, info, warn};

use super::{
    collaborators::{AuditLog, Notifier, WorldMutator},
    command::CommandContext,
    entry::{ProducerId, QueueEntry},
    queue::PlacementQueue,
};
use crate::config::PlacementConfig;

/// Counters for one scheduler tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Entries popped from the queue
    pub processed: usize,
    /// Placements written to the world
    pub placed: usize,
    /// Placements rejected by the world
    pub failed: usize,
    /// Sessions committed
    pub committed: usize,
    /// Commands executed
    pub commands: usize,
    /// Messages delivered
    pub messages: usize,
}

/// Drains the placement queue into the world.
pub struct PlacementScheduler {
    queue: Arc<PlacementQueue>,
    world: Box<dyn WorldMutator>,
    audit: Box<dyn AuditLog>,
    notifier: Box<dyn Notifier>,
    batch_size: usize,
    tick_interval: Duration,
    cancelled: bool,
}

impl PlacementScheduler {
    /// Creates a scheduler draining `queue`.
    ///
    /// # Arguments
    /// * `queue` - The queue shared with producer threads
    /// * `config` - Supplies the batch size and tick interval
    /// * `world` - Applies placements and commits sessions
    /// * `audit` - Receives every applied change
    /// * `notifier` - Delivers messages and failures to producers
    pub fn new(
        queue: Arc<PlacementQueue>,
        config: &PlacementConfig,
        world: Box<dyn WorldMutator>,
        audit: Box<dyn AuditLog>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        PlacementScheduler {
            queue,
            world,
            audit,
            notifier,
            batch_size: config.batch_size,
            tick_interval: config.tick_interval(),
            cancelled: false,
        }
    }

    /// Runs one tick.
    ///
    /// # Returns
    /// Counters for the entries handled in this tick. A cancelled scheduler
    /// does nothing and returns an empty report.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if self.cancelled {
            return report;
        }

        let batch = self.queue.pop_batch(self.batch_size);
        if batch.is_empty() {
            if self.queue.is_shutdown() {
                info!("Placement queue drained after shutdown, cancelling scheduler");
                self.cancelled = true;
            }
            return report;
        }

        report.processed = batch.len();
        for (producer, entry) in batch {
            match entry {
                QueueEntry::Place { voxel, material } => {
                    let old = self.world.material_at(voxel);
                    match self.world.set_material(producer, voxel, material) {
                        Ok(()) => {
                            self.audit.record_change(producer, voxel, old, material);
                            report.placed += 1;
                        }
                        Err(err) => {
                            warn!("Placement at {:?} for {} failed: {}", voxel, producer, err);
                            self.notifier.notify(producer, &err.to_string());
                            report.failed += 1;
                        }
                    }
                }
                QueueEntry::Finalize => {
                    self.world.commit_session(producer);
                    report.committed += 1;
                }
                QueueEntry::Command(command) => {
                    let context = CommandContext::new(producer, self.queue.clone());
                    command.execute(self, &context);
                    report.commands += 1;
                }
                QueueEntry::Message(text) => {
                    self.notifier.notify(producer, &text);
                    report.messages += 1;
                }
            }
        }

        debug!("Tick processed {} entries", report.processed);
        report
    }

    /// Ticks at the configured interval until the scheduler cancels itself.
    ///
    /// This is the host loop for hosts without their own periodic scheduler.
    pub fn run(&mut self) -> TickReport {
        let mut total = TickReport::default();
        while !self.cancelled {
            thread::sleep(self.tick_interval);
            let report = self.tick();
            total.processed += report.processed;
            total.placed += report.placed;
            total.failed += report.failed;
            total.committed += report.committed;
            total.commands += report.commands;
            total.messages += report.messages;
        }
        total
    }

    /// Whether the scheduler has cancelled itself.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// The queue this scheduler drains.
    pub fn queue(&self) -> &Arc<PlacementQueue> {
        &self.queue
    }

    /// The world collaborator, for commands that inspect the world.
    pub fn world(&self) -> &dyn WorldMutator {
        self.world.as_ref()
    }

    /// Sends `text` to `producer` through the notifier.
    pub fn notify(&mut self, producer: ProducerId, text: &str) {
        self.notifier.notify(producer, text);
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;
    use crate::{
        palette::Material,
        placement::{MemoryAudit, MemoryNotifier, MemoryWorld},
    };

    const A: ProducerId = ProducerId(1);

    struct Harness {
        queue: Arc<PlacementQueue>,
        world: MemoryWorld,
        audit: MemoryAudit,
        notifier: MemoryNotifier,
        scheduler: PlacementScheduler,
    }

    fn harness(batch_size: usize, change_limit: Option<usize>) -> Harness {
        let config = PlacementConfig::new(1, batch_size, 100, 1000);
        let queue = Arc::new(PlacementQueue::from_config(&config));
        let world = MemoryWorld::new(change_limit);
        let audit = MemoryAudit::default();
        let notifier = MemoryNotifier::default();
        let scheduler = PlacementScheduler::new(
            queue.clone(),
            &config,
            Box::new(world.clone()),
            Box::new(audit.clone()),
            Box::new(notifier.clone()),
        );
        Harness {
            queue,
            world,
            audit,
            notifier,
            scheduler,
        }
    }

    fn place(x: i32, material: u32) -> QueueEntry {
        QueueEntry::Place {
            voxel: Point3::new(x, 0, 0),
            material: Material(material),
        }
    }

    #[test]
    fn test_place_reads_old_material_and_audits() {
        let mut h = harness(10, None);
        h.queue.push(A, place(0, 1));
        h.queue.push(A, place(0, 2));
        let report = h.scheduler.tick();
        assert_eq!(report.placed, 2);
        assert_eq!(h.world.material_at(Point3::new(0, 0, 0)), Material(2));

        let changes = h.audit.changes();
        assert_eq!(changes.len(), 2);
        assert_eq!((changes[0].old, changes[0].new), (Material::EMPTY, Material(1)));
        assert_eq!((changes[1].old, changes[1].new), (Material(1), Material(2)));
    }

    #[test]
    fn test_change_limit_failure_is_not_fatal() {
        let mut h = harness(10, Some(1));
        h.queue.push(A, place(0, 1));
        h.queue.push(A, place(1, 1));
        h.queue.push(A, QueueEntry::Message("after".into()));
        let report = h.scheduler.tick();

        assert_eq!(report.processed, 3);
        assert_eq!(report.placed, 1);
        assert_eq!(report.failed, 1);
        let messages = h.notifier.messages_for(A);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("too many changes"));
        assert_eq!(messages[1], "after");
        assert!(!h.scheduler.is_cancelled());
    }

    #[test]
    fn test_finalize_commits_session() {
        let mut h = harness(10, None);
        h.queue.push(A, place(0, 1));
        h.queue.push(A, QueueEntry::Finalize);
        let report = h.scheduler.tick();
        assert_eq!(report.committed, 1);
        assert_eq!(h.world.committed_sessions().len(), 1);
        assert_eq!(h.world.committed_sessions()[0].changes.len(), 1);
    }

    #[test]
    fn test_command_runs_in_order_with_context() {
        let mut h = harness(10, None);
        h.queue.push(A, place(3, 5));
        h.queue.push(
            A,
            QueueEntry::Command(Box::new(
                |scheduler: &mut PlacementScheduler, context: &CommandContext| {
                    let seen = scheduler.world().material_at(Point3::new(3, 0, 0));
                    scheduler.notify(context.producer(), &format!("saw {}", seen.0));
                    context.queue().push_nowait(
                        context.producer(),
                        QueueEntry::Message("follow-up".into()),
                    );
                },
            )),
        );

        let report = h.scheduler.tick();
        assert_eq!(report.commands, 1);
        assert_eq!(h.notifier.messages_for(A), vec!["saw 5".to_string()]);

        h.scheduler.tick();
        assert_eq!(
            h.notifier.messages_for(A),
            vec!["saw 5".to_string(), "follow-up".to_string()]
        );
    }

    #[test]
    fn test_batch_size_bounds_each_tick() {
        let mut h = harness(3, None);
        for x in 0..7 {
            h.queue.push(A, place(x, 1));
        }
        assert_eq!(h.scheduler.tick().processed, 3);
        assert_eq!(h.scheduler.tick().processed, 3);
        assert_eq!(h.scheduler.tick().processed, 1);
        assert_eq!(h.scheduler.tick().processed, 0);
    }

    #[test]
    fn test_cancels_only_when_empty_after_shutdown() {
        let mut h = harness(1, None);
        h.queue.push(A, place(0, 1));
        h.queue.shutdown();

        h.scheduler.tick();
        assert!(!h.scheduler.is_cancelled());
        h.scheduler.tick();
        assert!(h.scheduler.is_cancelled());

        h.queue.push(A, place(1, 1));
        assert_eq!(h.scheduler.tick(), TickReport::default());
    }

    #[test]
    fn test_run_returns_after_shutdown() {
        let mut h = harness(4, None);
        for x in 0..10 {
            h.queue.push(A, place(x, 1));
        }
        h.queue.shutdown();
        let total = h.scheduler.run();
        assert_eq!(total.placed, 10);
        assert!(h.scheduler.is_cancelled());
    }
}
