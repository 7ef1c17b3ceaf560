//! # Placement Queue
//!
//! Per-producer FIFO queues behind one coarse lock, drained round-robin.
//!
//! ## Producer Side
//! Producers append from their own threads. When a producer's queue grows past
//! the hard limit, the producer sleeps in a poll loop until the scheduler has
//! drained it to the soft limit, or until shutdown is requested. Shutdown
//! always releases a waiting producer.
//!
//! ## Consumer Side
//! The scheduler pops a batch per tick, one entry per active producer in
//! rotation, so no producer can starve another. A producer's queue is removed
//! as soon as it drains.
//!
//! ## Locking
//! Every append, pop and purge serializes through the same mutex; the lock is
//! never held while a producer sleeps.

use std::{
    collections::{hash_map::Entry, HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
    thread,
    time::Duration,
};

use log::{debug, info};

use super::entry::{ProducerId, QueueEntry};
use crate::config::PlacementConfig;

#[derive(Default)]
struct QueueState {
    queues: HashMap<ProducerId, VecDeque<QueueEntry>>,
    /// Producers with pending entries, in service order. Each producer with a
    /// queue appears exactly once.
    rotation: VecDeque<ProducerId>,
}

impl QueueState {
    fn remove_producer(&mut self, producer: ProducerId) {
        self.queues.remove(&producer);
        self.rotation.retain(|p| *p != producer);
    }

    /// Drops every non-finalize entry of one producer, returning how many.
    fn purge(&mut self, producer: ProducerId) -> usize {
        let Some(queue) = self.queues.get_mut(&producer) else {
            return 0;
        };
        let before = queue.len();
        queue.retain(QueueEntry::is_finalize);
        let dropped = before - queue.len();
        if queue.is_empty() {
            self.remove_producer(producer);
        }
        dropped
    }
}

/// Buffers placement entries per producer between producer threads and the
/// scheduler.
pub struct PlacementQueue {
    state: Mutex<QueueState>,
    shutdown: AtomicBool,
    soft_limit: usize,
    hard_limit: usize,
    poll_interval: Duration,
}

impl PlacementQueue {
    /// Creates an empty queue.
    ///
    /// # Arguments
    /// * `soft_limit` - Length a blocked producer waits for
    /// * `hard_limit` - Length above which a producer blocks
    /// * `poll_interval` - Sleep between backpressure polls
    pub fn new(soft_limit: usize, hard_limit: usize, poll_interval: Duration) -> Self {
        PlacementQueue {
            state: Mutex::new(QueueState::default()),
            shutdown: AtomicBool::new(false),
            soft_limit,
            hard_limit,
            poll_interval,
        }
    }

    /// Creates an empty queue using the configured limits.
    pub fn from_config(config: &PlacementConfig) -> Self {
        Self::new(config.soft_limit, config.hard_limit, config.backpressure_poll())
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an entry without applying backpressure, returning the
    /// producer's new queue length.
    ///
    /// This is the variant for code already running on the scheduler
    /// (commands), which must never block.
    pub fn push_nowait(&self, producer: ProducerId, entry: QueueEntry) -> usize {
        let mut guard = self.lock();
        let state = &mut *guard;
        let queue = match state.queues.entry(producer) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => {
                state.rotation.push_back(producer);
                vacant.insert(VecDeque::new())
            }
        };
        queue.push_back(entry);
        queue.len()
    }

    /// Appends an entry to the producer's queue.
    ///
    /// Blocks the calling thread while the queue is over the hard limit, until
    /// it drains to the soft limit or shutdown is requested. Must not be
    /// called from the scheduler thread.
    pub fn push(&self, producer: ProducerId, entry: QueueEntry) {
        let length = self.push_nowait(producer, entry);
        if length > self.hard_limit {
            self.wait_for_drain(producer, length);
        }
    }

    fn wait_for_drain(&self, producer: ProducerId, length: usize) {
        debug!(
            "{} blocked with {} queued entries (hard limit {})",
            producer, length, self.hard_limit
        );
        loop {
            if self.is_shutdown() {
                debug!("{} released by shutdown", producer);
                return;
            }
            if self.pending(producer) <= self.soft_limit {
                debug!("{} resumed", producer);
                return;
            }
            thread::sleep(self.poll_interval);
        }
    }

    /// Pops up to `max` entries, one per producer per round, continuing the
    /// rotation from where the previous call stopped.
    pub fn pop_batch(&self, max: usize) -> Vec<(ProducerId, QueueEntry)> {
        let mut state = self.lock();
        let mut popped = Vec::new();

        while popped.len() < max {
            let Some(producer) = state.rotation.pop_front() else {
                break;
            };
            let Some(queue) = state.queues.get_mut(&producer) else {
                continue;
            };
            let entry = queue.pop_front();
            let drained = queue.is_empty();

            if drained {
                state.queues.remove(&producer);
            } else {
                state.rotation.push_back(producer);
            }
            if let Some(entry) = entry {
                popped.push((producer, entry));
            }
        }

        popped
    }

    /// Drops every pending entry of `producer` except finalize markers, so an
    /// in-flight session still closes. Returns the number of entries dropped.
    pub fn purge(&self, producer: ProducerId) -> usize {
        let dropped = self.lock().purge(producer);
        if dropped > 0 {
            info!("Purged {} entries queued by {}", dropped, producer);
        }
        dropped
    }

    /// Purges every producer. Returns the total number of entries dropped.
    pub fn purge_all(&self) -> usize {
        let mut state = self.lock();
        let producers: Vec<ProducerId> = state.rotation.iter().copied().collect();
        let dropped: usize = producers
            .into_iter()
            .map(|producer| state.purge(producer))
            .sum();
        if dropped > 0 {
            info!("Purged {} queued entries", dropped);
        }
        dropped
    }

    /// Number of entries pending for `producer`.
    pub fn pending(&self, producer: ProducerId) -> usize {
        self.lock().queues.get(&producer).map_or(0, VecDeque::len)
    }

    /// Number of entries pending across all producers.
    pub fn total_pending(&self) -> usize {
        self.lock().queues.values().map(VecDeque::len).sum()
    }

    /// Number of producers with pending entries.
    pub fn active_producers(&self) -> usize {
        self.lock().queues.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.lock().queues.is_empty()
    }

    /// Requests shutdown: releases blocked producers and lets the scheduler
    /// cancel itself once the queue runs dry.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;
    use crate::palette::Material;

    const A: ProducerId = ProducerId(1);
    const B: ProducerId = ProducerId(2);

    fn place(n: i32) -> QueueEntry {
        QueueEntry::Place {
            voxel: Point3::new(n, 0, 0),
            material: Material(1),
        }
    }

    fn x_of(entry: &QueueEntry) -> i32 {
        match entry {
            QueueEntry::Place { voxel, .. } => voxel.x,
            other => panic!("unexpected entry {other:?}"),
        }
    }

    fn queue() -> PlacementQueue {
        PlacementQueue::new(100, 1000, Duration::from_millis(1))
    }

    #[test]
    fn test_queue_created_on_first_push_and_removed_when_drained() {
        let queue = queue();
        assert!(queue.is_empty());
        queue.push(A, place(0));
        assert_eq!(queue.active_producers(), 1);
        assert_eq!(queue.pop_batch(10).len(), 1);
        assert!(queue.is_empty());
        assert_eq!(queue.active_producers(), 0);
    }

    #[test]
    fn test_round_robin_alternates_producers() {
        let queue = queue();
        for n in 0..3 {
            queue.push(A, place(n));
        }
        for n in 10..13 {
            queue.push(B, place(n));
        }
        let order: Vec<_> = queue
            .pop_batch(6)
            .into_iter()
            .map(|(producer, entry)| (producer, x_of(&entry)))
            .collect();
        assert_eq!(
            order,
            vec![(A, 0), (B, 10), (A, 1), (B, 11), (A, 2), (B, 12)]
        );
    }

    #[test]
    fn test_rotation_continues_across_batches() {
        let queue = queue();
        for n in 0..4 {
            queue.push(A, place(n));
            queue.push(B, place(10 + n));
        }
        let first: Vec<_> = queue.pop_batch(3).into_iter().map(|(p, _)| p).collect();
        let second: Vec<_> = queue.pop_batch(3).into_iter().map(|(p, _)| p).collect();
        assert_eq!(first, vec![A, B, A]);
        assert_eq!(second, vec![B, A, B]);
    }

    #[test]
    fn test_purge_keeps_finalize() {
        let queue = queue();
        queue.push(A, place(0));
        queue.push(A, QueueEntry::Message("hello".into()));
        queue.push(A, QueueEntry::Finalize);
        queue.push(B, place(1));

        assert_eq!(queue.purge(A), 2);
        assert_eq!(queue.pending(A), 1);
        let popped = queue.pop_batch(10);
        assert_eq!(popped.len(), 2);
        assert!(popped.iter().any(|(p, e)| *p == A && e.is_finalize()));
    }

    #[test]
    fn test_purge_without_finalize_removes_queue() {
        let queue = queue();
        queue.push(A, place(0));
        queue.push(B, place(1));
        assert_eq!(queue.purge(A), 1);
        assert_eq!(queue.active_producers(), 1);
        assert_eq!(queue.purge_all(), 1);
        assert!(queue.is_empty());
        assert!(queue.pop_batch(10).is_empty());
    }

    #[test]
    fn test_shutdown_releases_blocked_producer() {
        let queue = std::sync::Arc::new(PlacementQueue::new(0, 1, Duration::from_millis(1)));
        queue.push(A, place(0));

        let producer_queue = queue.clone();
        let producer = thread::spawn(move || {
            producer_queue.push(A, place(1));
        });

        thread::sleep(Duration::from_millis(20));
        assert!(!producer.is_finished());
        queue.shutdown();
        producer.join().unwrap();
        assert_eq!(queue.pending(A), 2);
    }
}
