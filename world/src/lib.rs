#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Skirmish simulation.
//!
//! The world owns the static [`Grid`], the fixed [`AgentPool`] and the spawn
//! points. Lifecycle changes flow through [`apply`]; read-only access lives in
//! [`query`]. The per-tick AI systems mutate agent records in place through
//! [`control`] so that paths and timers never need to be reallocated.

mod agents;
mod collision;
mod grid;
mod spawn;

use std::time::Duration;

use skirmish_core::{angle, Command, Event, SpawnPointId, Tuning};

pub use agents::{Agent, AgentPool, AgentTimers, PathBuffer, TargetHistory};
pub use collision::{CollisionResolver, TileCollision};
pub use grid::{Grid, MapError};

use spawn::SpawnPoint;

/// Represents the authoritative Skirmish world state.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    tuning: Tuning,
    agents: AgentPool,
    spawn_points: Vec<SpawnPoint>,
    spawning_enabled: bool,
    tick_index: u64,
    elapsed: Duration,
}

impl World {
    /// Creates a world over the provided grid with every agent slot dormant.
    #[must_use]
    pub fn new(grid: Grid, tuning: Tuning) -> Self {
        let agents = AgentPool::new(tuning.agent.pool_capacity, grid.len(), tuning.agent.size);
        Self {
            grid,
            tuning,
            agents,
            spawn_points: Vec::new(),
            spawning_enabled: true,
            tick_index: 0,
            elapsed: Duration::ZERO,
        }
    }

    fn spawn_point_mut(&mut self, id: SpawnPointId) -> Option<&mut SpawnPoint> {
        self.spawn_points.iter_mut().find(|point| point.id() == id)
    }

    fn advance_countdowns(&mut self, seconds: f32, out_events: &mut Vec<Event>) {
        for point in &mut self.spawn_points {
            point.count_down(seconds);
        }

        for agent in self.agents.iter_mut() {
            if agent.active || agent.timers.respawn <= 0.0 {
                continue;
            }
            agent.timers.respawn -= seconds;
            if agent.timers.respawn > 0.0 {
                continue;
            }
            if let Some(spawn_point) = agent.spawn_point {
                out_events.push(Event::RespawnDue {
                    agent: agent.id,
                    spawn_point,
                });
            }
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            world.elapsed = world.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });

            if world.spawning_enabled {
                world.advance_countdowns(dt.as_secs_f32(), out_events);
            }
        }
        Command::ConfigureSpawnPoint { position, quota } => {
            let id = SpawnPointId::new(world.spawn_points.len() as u32);
            world.spawn_points.push(SpawnPoint::new(id, position, quota));
            out_events.push(Event::SpawnPointConfigured { spawn_point: id });
        }
        Command::SetSpawningEnabled { enabled } => {
            if world.spawning_enabled != enabled {
                world.spawning_enabled = enabled;
                out_events.push(Event::SpawningToggled { enabled });
            }
        }
        Command::SpawnAgent {
            spawn_point,
            position,
            facing,
        } => {
            let health = world.tuning.agent.health;
            let Some(point) = world
                .spawn_points
                .iter_mut()
                .find(|point| point.id() == spawn_point)
            else {
                tracing::warn!(
                    spawn_point = spawn_point.get(),
                    "spawn requested for unknown spawn point"
                );
                return;
            };

            match world.agents.first_inactive_mut() {
                Some(agent) => {
                    agent.activate(spawn_point, position, angle::normalize_degrees(facing), health);
                    point.record_spawn();
                    out_events.push(Event::AgentSpawned {
                        agent: agent.id,
                        spawn_point,
                        position,
                    });
                }
                None => {
                    tracing::warn!(
                        spawn_point = spawn_point.get(),
                        "agent pool exhausted; spawn dropped"
                    );
                    out_events.push(Event::SpawnRejected { spawn_point });
                }
            }
        }
        Command::RespawnAgent {
            agent,
            position,
            facing,
        } => {
            let health = world.tuning.agent.health;
            let Some(record) = world.agents.get_mut(agent) else {
                return;
            };
            if record.active {
                tracing::trace!(agent = agent.get(), "respawn ignored for active agent");
                return;
            }
            let Some(spawn_point) = record.spawn_point else {
                return;
            };
            record.activate(spawn_point, position, angle::normalize_degrees(facing), health);
            out_events.push(Event::AgentSpawned {
                agent,
                spawn_point,
                position,
            });
        }
        Command::ResetSpawnTimer { spawn_point } => {
            let delay = world.tuning.agent.respawn_delay;
            if let Some(point) = world.spawn_point_mut(spawn_point) {
                point.restart_timer(delay);
            }
        }
        Command::DamageAgent { agent, amount } => {
            let delay = world.tuning.agent.respawn_delay;
            let Some(record) = world.agents.get_mut(agent) else {
                return;
            };
            if !record.active {
                return;
            }
            record.health -= amount;
            if record.health > 0.0 {
                out_events.push(Event::AgentDamaged {
                    agent,
                    health: record.health,
                });
                return;
            }

            record.deactivate(delay);
            tracing::debug!(agent = agent.get(), "agent killed");
            if let Some(spawn_point) = record.spawn_point {
                out_events.push(Event::AgentKilled { agent, spawn_point });
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use skirmish_core::{AgentView, SpawnPointSnapshot, Tuning};

    use super::{AgentPool, Grid, World};

    /// Provides read-only access to the static tile grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Provides the tuning the world was built with.
    #[must_use]
    pub fn tuning(world: &World) -> &Tuning {
        &world.tuning
    }

    /// Provides read-only access to every agent record.
    #[must_use]
    pub fn agents(world: &World) -> &AgentPool {
        &world.agents
    }

    /// Captures a read-only view of every agent slot.
    #[must_use]
    pub fn agent_view(world: &World) -> AgentView {
        AgentView::from_snapshots(world.agents.iter().map(|agent| agent.snapshot()).collect())
    }

    /// Captures every configured spawn point in registration order.
    #[must_use]
    pub fn spawn_points(world: &World) -> Vec<SpawnPointSnapshot> {
        world
            .spawn_points
            .iter()
            .map(|point| point.snapshot())
            .collect()
    }

    /// Reports whether spawn refills and respawns are running.
    #[must_use]
    pub fn spawning_enabled(world: &World) -> bool {
        world.spawning_enabled
    }

    /// Number of ticks applied so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Simulated time accumulated across all ticks.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }
}

/// In-place access used by the per-tick AI systems.
pub mod control {
    use super::{AgentPool, Grid, World};

    /// Splits the world into the shared grid and the mutable agent pool.
    pub fn grid_and_agents(world: &mut World) -> (&Grid, &mut AgentPool) {
        (&world.grid, &mut world.agents)
    }
}
