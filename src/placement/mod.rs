//! # Placement Queue and Scheduler
//!
//! Moves voxel placements from concurrent producer threads into the world
//! without letting any producer flood or starve the host.
//!
//! ## Key Components
//! - `ProducerSession`: producer-side handle that appends entries
//! - `PlacementQueue`: per-producer FIFO queues with backpressure
//! - `PlacementScheduler`: periodic single consumer applying batches
//! - `WorldMutator`, `AuditLog`, `Notifier`: host collaborators
//! - `MemoryWorld`, `MemoryAudit`, `MemoryNotifier`: in-memory collaborators
//!
//! ## Ordering
//! Entries of one producer are applied in the order they were enqueued.
//! Across producers the scheduler takes one entry per producer in turn; there
//! is no global order.

mod collaborators;
mod command;
mod entry;
mod memory;
mod queue;
mod scheduler;
mod session;

pub use collaborators::{AuditLog, Notifier, WorldError, WorldMutator};
pub use command::{CommandContext, PlacementCommand};
pub use entry::{ProducerId, QueueEntry};
pub use memory::{CommittedSession, MemoryAudit, MemoryNotifier, MemoryWorld, RecordedChange};
pub use queue::PlacementQueue;
pub use scheduler::{PlacementScheduler, TickReport};
pub use session::{ProducerSession, SessionSummary};
