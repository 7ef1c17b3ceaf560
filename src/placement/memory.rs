//! In-memory collaborators for hosts without a world of their own, and for
//! tests.
//!
//! Every collaborator here is a cheap handle over shared state: clone it, hand
//! one clone to the scheduler and keep the other to inspect what happened.

use std::collections::HashMap;

use cgmath::Point3;
use log::debug;

use super::{
    collaborators::{AuditLog, Notifier, WorldError, WorldMutator},
    entry::ProducerId,
};
use crate::{core::MtResource, palette::Material};

/// One applied voxel change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedChange {
    /// Producer that made the change
    pub producer: ProducerId,
    /// Changed voxel
    pub voxel: Point3<i32>,
    /// Material before the change
    pub old: Material,
    /// Material after the change
    pub new: Material,
}

/// A closed edit session in the undo history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedSession {
    /// Producer owning the session
    pub producer: ProducerId,
    /// Changes in the order they were applied
    pub changes: Vec<RecordedChange>,
}

#[derive(Default)]
struct WorldState {
    blocks: HashMap<Point3<i32>, Material>,
    open_sessions: HashMap<ProducerId, Vec<RecordedChange>>,
    history: Vec<CommittedSession>,
}

/// Sparse voxel world with per-producer edit sessions and an undo history.
///
/// Unset voxels read as `Material::EMPTY`; writing `EMPTY` clears a voxel.
#[derive(Clone, Default)]
pub struct MemoryWorld {
    state: MtResource<WorldState>,
    change_limit: Option<usize>,
}

impl MemoryWorld {
    /// Creates an empty world.
    ///
    /// # Arguments
    /// * `change_limit` - Maximum changes per open session, unlimited if `None`
    pub fn new(change_limit: Option<usize>) -> Self {
        MemoryWorld {
            state: MtResource::default(),
            change_limit,
        }
    }

    /// Number of non-empty voxels.
    pub fn block_count(&self) -> usize {
        self.state.get().blocks.len()
    }

    /// Snapshot of every non-empty voxel.
    pub fn blocks(&self) -> HashMap<Point3<i32>, Material> {
        self.state.get().blocks.clone()
    }

    /// Changes made by `producer` since its last commit.
    pub fn open_changes(&self, producer: ProducerId) -> usize {
        self.state
            .get()
            .open_sessions
            .get(&producer)
            .map_or(0, Vec::len)
    }

    /// Committed sessions, oldest first.
    pub fn committed_sessions(&self) -> Vec<CommittedSession> {
        self.state.get().history.clone()
    }

    /// Reverts the most recently committed session of `producer`.
    ///
    /// # Returns
    /// The reverted session, or `None` if the producer has nothing to undo.
    pub fn undo(&self, producer: ProducerId) -> Option<CommittedSession> {
        let mut state = self.state.get_mut();
        let index = state.history.iter().rposition(|s| s.producer == producer)?;
        let session = state.history.remove(index);
        for change in session.changes.iter().rev() {
            write_block(&mut state.blocks, change.voxel, change.old);
        }
        debug!("Undid {} changes for {}", session.changes.len(), producer);
        Some(session)
    }
}

fn write_block(blocks: &mut HashMap<Point3<i32>, Material>, voxel: Point3<i32>, material: Material) {
    if material.is_empty() {
        blocks.remove(&voxel);
    } else {
        blocks.insert(voxel, material);
    }
}

impl WorldMutator for MemoryWorld {
    fn material_at(&self, voxel: Point3<i32>) -> Material {
        self.state
            .get()
            .blocks
            .get(&voxel)
            .copied()
            .unwrap_or(Material::EMPTY)
    }

    fn set_material(
        &mut self,
        producer: ProducerId,
        voxel: Point3<i32>,
        material: Material,
    ) -> Result<(), WorldError> {
        let mut guard = self.state.get_mut();
        let state = &mut *guard;
        let session = state.open_sessions.entry(producer).or_default();
        if let Some(limit) = self.change_limit {
            if session.len() >= limit {
                return Err(WorldError::TooManyChanges { limit });
            }
        }

        let old = state.blocks.get(&voxel).copied().unwrap_or(Material::EMPTY);
        write_block(&mut state.blocks, voxel, material);
        session.push(RecordedChange {
            producer,
            voxel,
            old,
            new: material,
        });
        Ok(())
    }

    fn commit_session(&mut self, producer: ProducerId) {
        let mut state = self.state.get_mut();
        let changes = state.open_sessions.remove(&producer).unwrap_or_default();
        debug!("Committing {} changes for {}", changes.len(), producer);
        state.history.push(CommittedSession { producer, changes });
    }
}

/// Audit log that keeps every change in memory.
#[derive(Clone, Default)]
pub struct MemoryAudit {
    changes: MtResource<Vec<RecordedChange>>,
}

impl MemoryAudit {
    /// Recorded changes, oldest first.
    pub fn changes(&self) -> Vec<RecordedChange> {
        self.changes.get().clone()
    }
}

impl AuditLog for MemoryAudit {
    fn record_change(&mut self, producer: ProducerId, voxel: Point3<i32>, old: Material, new: Material) {
        self.changes.get_mut().push(RecordedChange {
            producer,
            voxel,
            old,
            new,
        });
    }
}

/// Notifier that keeps every message in memory.
#[derive(Clone, Default)]
pub struct MemoryNotifier {
    messages: MtResource<Vec<(ProducerId, String)>>,
}

impl MemoryNotifier {
    /// Every delivered message, oldest first.
    pub fn messages(&self) -> Vec<(ProducerId, String)> {
        self.messages.get().clone()
    }

    /// Messages delivered to `producer`, oldest first.
    pub fn messages_for(&self, producer: ProducerId) -> Vec<String> {
        self.messages
            .get()
            .iter()
            .filter(|(to, _)| *to == producer)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&mut self, producer: ProducerId, text: &str) {
        self.messages.get_mut().push((producer, text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: ProducerId = ProducerId(1);
    const B: ProducerId = ProducerId(2);

    #[test]
    fn test_change_limit_is_per_session() {
        let mut world = MemoryWorld::new(Some(2));
        assert!(world.set_material(A, Point3::new(0, 0, 0), Material(1)).is_ok());
        assert!(world.set_material(A, Point3::new(1, 0, 0), Material(1)).is_ok());
        assert_eq!(
            world.set_material(A, Point3::new(2, 0, 0), Material(1)),
            Err(WorldError::TooManyChanges { limit: 2 })
        );
        assert!(world.set_material(B, Point3::new(3, 0, 0), Material(1)).is_ok());

        world.commit_session(A);
        assert_eq!(world.open_changes(A), 0);
        assert!(world.set_material(A, Point3::new(2, 0, 0), Material(1)).is_ok());
    }

    #[test]
    fn test_undo_restores_previous_materials() {
        let mut world = MemoryWorld::new(None);
        let voxel = Point3::new(5, 5, 5);
        world.set_material(A, voxel, Material(1)).unwrap();
        world.commit_session(A);
        world.set_material(A, voxel, Material(2)).unwrap();
        world.set_material(A, Point3::new(6, 5, 5), Material(2)).unwrap();
        world.commit_session(A);
        assert_eq!(world.block_count(), 2);

        let undone = world.undo(A).unwrap();
        assert_eq!(undone.changes.len(), 2);
        assert_eq!(world.material_at(voxel), Material(1));
        assert_eq!(world.block_count(), 1);

        world.undo(A).unwrap();
        assert_eq!(world.material_at(voxel), Material::EMPTY);
        assert!(world.undo(A).is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let world = MemoryWorld::new(None);
        let mut handle = world.clone();
        handle.set_material(A, Point3::new(0, 1, 0), Material(4)).unwrap();
        assert_eq!(world.material_at(Point3::new(0, 1, 0)), Material(4));

        let notifier = MemoryNotifier::default();
        notifier.clone().notify(B, "hi");
        assert_eq!(notifier.messages(), vec![(B, "hi".to_string())]);
        assert!(notifier.messages_for(A).is_empty());
    }
}
