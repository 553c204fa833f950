#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawning system that refills spawn point quotas and respawns killed agents.

use glam::Vec2;
use rand::Rng;
use skirmish_core::{angle, Command, Event, SpawnPointSnapshot, SpawnTuning, Tuning};
use skirmish_world::Grid;

/// Pure system that turns spawn point state and respawn events into spawn
/// commands.
#[derive(Clone, Debug)]
pub struct Spawning {
    placement: SpawnTuning,
    keep_away: f32,
}

impl Spawning {
    /// Creates a spawning system from the simulation tuning.
    ///
    /// Agents are never placed closer to the target than the pathfinding
    /// range.
    #[must_use]
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            placement: tuning.spawning.clone(),
            keep_away: tuning.perception.pathfinding_range,
        }
    }

    /// Consumes world events and spawn point snapshots to emit spawn commands.
    ///
    /// Nothing is emitted while spawning is paused.
    #[allow(clippy::too_many_arguments)]
    pub fn handle<R>(
        &mut self,
        events: &[Event],
        spawning_enabled: bool,
        spawn_points: &[SpawnPointSnapshot],
        grid: &Grid,
        target: Vec2,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) where
        R: Rng + ?Sized,
    {
        if !spawning_enabled {
            return;
        }

        for point in spawn_points.iter().filter(|point| point.ready_to_refill()) {
            let missing = point.quota - point.spawned;
            tracing::trace!(spawn_point = point.id.get(), missing, "refilling spawn point");
            for _ in 0..missing {
                let position = self.place(grid, point.position, target, rng);
                out.push(Command::SpawnAgent {
                    spawn_point: point.id,
                    position,
                    facing: random_facing(rng),
                });
            }
            out.push(Command::ResetSpawnTimer {
                spawn_point: point.id,
            });
        }

        for event in events {
            let Event::RespawnDue { agent, spawn_point } = event else {
                continue;
            };
            let Some(point) = spawn_points.iter().find(|point| point.id == *spawn_point) else {
                tracing::warn!(
                    agent = agent.get(),
                    spawn_point = spawn_point.get(),
                    "respawn due for unknown spawn point"
                );
                continue;
            };
            let position = self.place(grid, point.position, target, rng);
            out.push(Command::RespawnAgent {
                agent: *agent,
                position,
                facing: random_facing(rng),
            });
        }
    }

    /// Samples a ring around `center` for a passable spot far enough from
    /// the target, falling back to `center` itself.
    fn place<R>(&self, grid: &Grid, center: Vec2, target: Vec2, rng: &mut R) -> Vec2
    where
        R: Rng + ?Sized,
    {
        for _ in 0..self.placement.placement_attempts {
            let heading = angle::heading_vector(f32::from(rng.gen_range(0_u16..360)));
            let radius = if self.placement.ring_max > self.placement.ring_min {
                rng.gen_range(self.placement.ring_min..self.placement.ring_max)
            } else {
                self.placement.ring_min
            };
            let candidate = center + heading * radius;

            if !grid.is_passable(grid.tile_of(candidate)) {
                continue;
            }
            if candidate.distance(target) < self.keep_away {
                continue;
            }
            return candidate;
        }

        tracing::debug!(x = center.x, y = center.y, "spawn placement fell back to center");
        center
    }
}

fn random_facing<R>(rng: &mut R) -> f32
where
    R: Rng + ?Sized,
{
    f32::from(rng.gen_range(0_u16..360))
}
