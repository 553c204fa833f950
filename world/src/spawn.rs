//! Spawn points that keep a quota of agents in play.

use glam::Vec2;
use skirmish_core::{SpawnPointId, SpawnPointSnapshot};

#[derive(Clone, Debug)]
pub(crate) struct SpawnPoint {
    id: SpawnPointId,
    position: Vec2,
    quota: u32,
    spawned: u32,
    refill_in: f32,
}

impl SpawnPoint {
    /// New spawn points refill on the very next tick.
    pub(crate) fn new(id: SpawnPointId, position: Vec2, quota: u32) -> Self {
        Self {
            id,
            position,
            quota,
            spawned: 0,
            refill_in: 0.0,
        }
    }

    pub(crate) fn id(&self) -> SpawnPointId {
        self.id
    }

    pub(crate) fn count_down(&mut self, seconds: f32) {
        self.refill_in -= seconds;
    }

    pub(crate) fn record_spawn(&mut self) {
        self.spawned = self.spawned.saturating_add(1);
    }

    pub(crate) fn restart_timer(&mut self, delay: f32) {
        self.refill_in = delay;
    }

    pub(crate) fn snapshot(&self) -> SpawnPointSnapshot {
        SpawnPointSnapshot {
            id: self.id,
            position: self.position,
            quota: self.quota,
            spawned: self.spawned,
            refill_in: self.refill_in,
        }
    }
}
