//! Interfaces the scheduler drives on the host side.

use cgmath::Point3;
use thiserror::Error;

use super::entry::ProducerId;
use crate::palette::Material;

/// Failures reported by the world-mutation collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// The producer's open edit session hit its change limit.
    #[error("too many changes in this session (limit {limit})")]
    TooManyChanges {
        /// Changes allowed per session
        limit: usize,
    },
}

/// Reads and writes voxels in the host world.
pub trait WorldMutator: Send {
    /// Material currently occupying `voxel`.
    fn material_at(&self, voxel: Point3<i32>) -> Material;

    /// Writes `material` at `voxel` as part of `producer`'s open edit session.
    fn set_material(
        &mut self,
        producer: ProducerId,
        voxel: Point3<i32>,
        material: Material,
    ) -> Result<(), WorldError>;

    /// Commits `producer`'s open edit session to the host's undo history.
    fn commit_session(&mut self, producer: ProducerId);
}

/// Receives every applied change, for audit and rollback.
pub trait AuditLog: Send {
    /// Records that `producer` changed `voxel` from `old` to `new`.
    fn record_change(&mut self, producer: ProducerId, voxel: Point3<i32>, old: Material, new: Material);
}

/// Delivers text notifications to producers.
pub trait Notifier: Send {
    /// Sends `text` to `producer`.
    fn notify(&mut self, producer: ProducerId, text: &str);
}
