//! # Placement Commands
//!
//! Caller-supplied units of work that ride a producer's queue and run on the
//! scheduler when their turn comes, in order with the producer's placements.
//!
//! ## Lifecycle
//! 1. A producer enqueues a command via `ProducerSession::command()`
//! 2. The scheduler pops it during a tick, after every entry enqueued before it
//! 3. `execute()` runs on the scheduler's thread with access to the scheduler
//!    and the originating queue context
//!
//! ## Thread Safety
//! - Commands must be `Send` to travel from producer threads to the scheduler
//! - `execute()` must not block: it runs inside a scheduler tick

use std::sync::Arc;

use super::{entry::ProducerId, queue::PlacementQueue, scheduler::PlacementScheduler};

/// The queue a command came from.
pub struct CommandContext {
    producer: ProducerId,
    queue: Arc<PlacementQueue>,
}

impl CommandContext {
    pub(crate) fn new(producer: ProducerId, queue: Arc<PlacementQueue>) -> Self {
        CommandContext { producer, queue }
    }

    /// Producer whose queue held the command.
    pub fn producer(&self) -> ProducerId {
        self.producer
    }

    /// The placement queue the command was popped from.
    ///
    /// Commands run on the scheduler thread, so follow-up entries must be
    /// added with `PlacementQueue::push_nowait`.
    pub fn queue(&self) -> &Arc<PlacementQueue> {
        &self.queue
    }
}

/// A unit of work executed by the scheduler.
///
/// Closures taking `(&mut PlacementScheduler, &CommandContext)` implement this
/// trait directly.
pub trait PlacementCommand: Send {
    /// Runs the command on the scheduler thread.
    fn execute(self: Box<Self>, scheduler: &mut PlacementScheduler, context: &CommandContext);
}

impl<F> PlacementCommand for F
where
    F: FnOnce(&mut PlacementScheduler, &CommandContext) + Send,
{
    fn execute(self: Box<Self>, scheduler: &mut PlacementScheduler, context: &CommandContext) {
        (*self)(scheduler, context)
    }
}
