//! Producer-side handle for one logical placement session.

use std::{ops::RangeInclusive, sync::Arc};

use cgmath::Point3;
use log::trace;

use super::{
    command::PlacementCommand,
    entry::{ProducerId, QueueEntry},
    queue::PlacementQueue,
};
use crate::{config::PlacementConfig, palette::Material};

/// Counters reported when a session finishes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Placements enqueued
    pub placed: usize,
    /// Placements dropped for lying outside the build range
    pub dropped: usize,
}

/// Appends a producer's entries to the placement queue.
///
/// Every call may block the calling thread under backpressure, so a session
/// belongs on a producer thread, never on the scheduler. Dropping a session
/// without calling `finish()` leaves its changes uncommitted.
pub struct ProducerSession {
    producer: ProducerId,
    queue: Arc<PlacementQueue>,
    build_range: RangeInclusive<i32>,
    summary: SessionSummary,
}

impl ProducerSession {
    /// Opens a session for `producer`.
    pub fn new(producer: ProducerId, queue: Arc<PlacementQueue>, config: &PlacementConfig) -> Self {
        ProducerSession {
            producer,
            queue,
            build_range: config.build_range(),
            summary: SessionSummary::default(),
        }
    }

    /// Producer owning this session.
    pub fn producer(&self) -> ProducerId {
        self.producer
    }

    /// Placements enqueued so far.
    pub fn placed(&self) -> usize {
        self.summary.placed
    }

    /// Placements dropped so far.
    pub fn dropped(&self) -> usize {
        self.summary.dropped
    }

    /// Enqueues a placement, returning whether it was accepted.
    ///
    /// Voxels outside the vertical build range are dropped.
    pub fn place(&mut self, voxel: Point3<i32>, material: Material) -> bool {
        if !self.build_range.contains(&voxel.y) {
            trace!("{} dropped out-of-range voxel {:?}", self.producer, voxel);
            self.summary.dropped += 1;
            return false;
        }
        self.queue.push(self.producer, QueueEntry::Place { voxel, material });
        self.summary.placed += 1;
        true
    }

    /// Enqueues a notification, delivered once every earlier entry is applied.
    pub fn message(&mut self, text: impl Into<String>) {
        self.queue.push(self.producer, QueueEntry::Message(text.into()));
    }

    /// Enqueues a command to run on the scheduler after every earlier entry.
    pub fn command(&mut self, command: impl PlacementCommand + 'static) {
        self.queue.push(self.producer, QueueEntry::Command(Box::new(command)));
    }

    /// Closes the session; the scheduler commits it once every earlier entry
    /// has been applied.
    pub fn finish(self) -> SessionSummary {
        self.queue.push(self.producer, QueueEntry::Finalize);
        self.summary
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn session() -> (ProducerSession, Arc<PlacementQueue>) {
        let mut config = PlacementConfig::new(50, 10, 100, 1000);
        config.min_build_height = 0;
        config.max_build_height = 10;
        let queue = Arc::new(PlacementQueue::new(100, 1000, Duration::from_millis(1)));
        (ProducerSession::new(ProducerId(7), queue.clone(), &config), queue)
    }

    #[test]
    fn test_out_of_range_voxels_are_dropped() {
        let (mut session, queue) = session();
        assert!(session.place(Point3::new(0, 0, 0), Material(1)));
        assert!(session.place(Point3::new(0, 10, 0), Material(1)));
        assert!(!session.place(Point3::new(0, -1, 0), Material(1)));
        assert!(!session.place(Point3::new(0, 11, 0), Material(1)));
        assert_eq!(queue.pending(ProducerId(7)), 2);

        let summary = session.finish();
        assert_eq!(summary, SessionSummary { placed: 2, dropped: 2 });
        assert_eq!(queue.pending(ProducerId(7)), 3);
    }

    #[test]
    fn test_entries_keep_session_order() {
        let (mut session, queue) = session();
        session.place(Point3::new(1, 1, 1), Material(2));
        session.message("done");
        session.finish();

        let popped: Vec<_> = queue.pop_batch(10).into_iter().map(|(_, entry)| entry).collect();
        assert!(matches!(popped[0], QueueEntry::Place { material: Material(2), .. }));
        assert!(matches!(&popped[1], QueueEntry::Message(text) if text == "done"));
        assert!(popped[2].is_finalize());
    }

    #[test]
    fn test_command_is_enqueued_in_order() {
        use crate::placement::{CommandContext, PlacementScheduler};

        let (mut session, queue) = session();
        session.message("before");
        session.command(|_: &mut PlacementScheduler, _: &CommandContext| {});
        assert_eq!(session.placed(), 0);
        assert_eq!(session.dropped(), 0);

        let popped: Vec<_> = queue.pop_batch(10).into_iter().map(|(_, entry)| entry).collect();
        assert!(matches!(popped[1], QueueEntry::Command(_)));
    }
}
