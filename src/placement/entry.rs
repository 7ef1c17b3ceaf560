use std::fmt;

use cgmath::Point3;

use super::command::PlacementCommand;
use crate::palette::Material;

/// Identifies the producer (typically one player) that owns a queue.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProducerId(pub u64);

impl fmt::Display for ProducerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "producer#{}", self.0)
    }
}

/// One unit of work in a producer's queue.
///
/// Entries of one producer are applied strictly in the order they were
/// enqueued.
pub enum QueueEntry {
    /// Write `material` at `voxel`.
    Place {
        /// Target voxel in world coordinates
        voxel: Point3<i32>,
        /// Material to write
        material: Material,
    },
    /// Deliver a text notification to the producer.
    Message(String),
    /// Run a unit of work on the scheduler.
    Command(Box<dyn PlacementCommand>),
    /// Close the producer's edit session and commit it to undo history.
    Finalize,
}

impl QueueEntry {
    /// Whether this entry closes a session.
    pub fn is_finalize(&self) -> bool {
        matches!(self, QueueEntry::Finalize)
    }
}

impl fmt::Debug for QueueEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueEntry::Place { voxel, material } => f
                .debug_struct("Place")
                .field("voxel", voxel)
                .field("material", material)
                .finish(),
            QueueEntry::Message(text) => f.debug_tuple("Message").field(text).finish(),
            QueueEntry::Command(_) => f.write_str("Command(..)"),
            QueueEntry::Finalize => f.write_str("Finalize"),
        }
    }
}
