#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-step driver that wires the world and every system together.
//!
//! A step advances the clock, refills and respawns agents, runs behavior and
//! locomotion for each active agent in slot order, resolves collisions and
//! finally moves projectiles. All randomness flows from one seeded generator,
//! so identical seeds and inputs replay identically.

use std::time::Duration;

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use skirmish_core::{Command, Event, SpawnPointId, TargetObservation, Tuning, TuningError};
use skirmish_system_behavior::Behavior;
use skirmish_system_locomotion::Locomotion;
use skirmish_system_projectiles::{Owner, Projectiles};
use skirmish_system_spawning::Spawning;
use skirmish_system_visibility::{FovMask, FovSample, VisibilityEngine};
use skirmish_world::{self as world, control, query, CollisionResolver, Grid, TileCollision, World};

/// Target state supplied by the caller for one step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetInput {
    /// Where the target stands and which way it faces.
    pub observation: TargetObservation,
    /// Whether the target fires this step.
    pub firing: bool,
}

impl TargetInput {
    /// Target that holds its fire.
    #[must_use]
    pub const fn idle(observation: TargetObservation) -> Self {
        Self {
            observation,
            firing: false,
        }
    }
}

/// Owns the world, the systems and the deterministic generator.
#[derive(Debug)]
pub struct Simulation<C = TileCollision> {
    world: World,
    behavior: Behavior,
    locomotion: Locomotion,
    spawning: Spawning,
    projectiles: Projectiles,
    visibility: VisibilityEngine,
    collision: C,
    rng: ChaCha8Rng,
    fixed_dt: f32,
    target_size: f32,
}

impl Simulation<TileCollision> {
    /// Builds a simulation over `grid` with the default tile collision.
    pub fn new(grid: Grid, tuning: Tuning, seed: u64) -> Result<Self, TuningError> {
        Self::with_collision(grid, tuning, seed, TileCollision)
    }
}

impl<C: CollisionResolver> Simulation<C> {
    /// Builds a simulation that resolves agent movement with `collision`.
    pub fn with_collision(
        grid: Grid,
        tuning: Tuning,
        seed: u64,
        collision: C,
    ) -> Result<Self, TuningError> {
        tuning.validate()?;

        let behavior = Behavior::new(&grid, &tuning);
        let locomotion = Locomotion::new(&tuning);
        let spawning = Spawning::new(&tuning);
        let projectiles = Projectiles::new(&tuning);
        let visibility = VisibilityEngine::new(tuning.fov.clone());
        let fixed_dt = tuning.fixed_dt;
        let target_size = tuning.combat.target_size;

        Ok(Self {
            world: World::new(grid, tuning),
            behavior,
            locomotion,
            spawning,
            projectiles,
            visibility,
            collision,
            rng: ChaCha8Rng::seed_from_u64(seed),
            fixed_dt,
            target_size,
        })
    }

    /// Registers a spawn point that keeps `quota` agents in play.
    pub fn add_spawn_point(&mut self, position: Vec2, quota: u32) -> SpawnPointId {
        let id = SpawnPointId::new(query::spawn_points(&self.world).len() as u32);
        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::ConfigureSpawnPoint { position, quota },
            &mut events,
        );
        tracing::debug!(spawn_point = id.get(), quota, "spawn point configured");
        id
    }

    /// Pauses or resumes refills and respawns.
    pub fn set_spawning_enabled(&mut self, enabled: bool) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::SetSpawningEnabled { enabled },
            &mut events,
        );
        events
    }

    /// Advances the simulation by one fixed step and returns its events.
    pub fn step(&mut self, target: &TargetInput) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(
            &mut self.world,
            Command::Tick {
                dt: Duration::from_secs_f32(self.fixed_dt),
            },
            &mut events,
        );

        self.run_spawning(target.observation.position, &mut events);

        {
            let (grid, agents) = control::grid_and_agents(&mut self.world);
            self.behavior
                .handle(grid, agents, &target.observation, &mut self.rng, &mut events);
            self.locomotion.handle(grid, agents, &mut events);
            for agent in agents.iter_mut().filter(|agent| agent.active) {
                agent.position =
                    self.collision
                        .resolve(grid, agent.position, agent.size * 0.5, agent.velocity);
            }
        }

        self.run_projectiles(target, &mut events);

        tracing::trace!(
            tick = query::tick_index(&self.world),
            events = events.len(),
            active = query::agents(&self.world).active_count(),
            "step complete"
        );
        events
    }

    fn run_spawning(&mut self, target: Vec2, events: &mut Vec<Event>) {
        let spawn_points = query::spawn_points(&self.world);
        let mut commands = Vec::new();
        self.spawning.handle(
            events,
            query::spawning_enabled(&self.world),
            &spawn_points,
            query::grid(&self.world),
            target,
            &mut self.rng,
            &mut commands,
        );
        for command in commands {
            world::apply(&mut self.world, command, events);
        }
    }

    fn run_projectiles(&mut self, target: &TargetInput, events: &mut Vec<Event>) {
        let agents = query::agents(&self.world);
        for event in events.iter() {
            let Event::ProjectileRequested {
                agent,
                origin,
                facing,
            } = event
            else {
                continue;
            };
            let size = agents.get(*agent).map_or(0.0, |record| record.size);
            let _ = self
                .projectiles
                .fire(Owner::Agent(*agent), *origin, size, *facing);
        }
        if target.firing {
            let _ = self.projectiles.fire(
                Owner::Target,
                target.observation.position,
                self.target_size,
                target.observation.facing,
            );
        }

        let mut commands = Vec::new();
        self.projectiles.handle(
            query::grid(&self.world),
            self.fixed_dt,
            agents,
            &target.observation,
            &mut commands,
            events,
        );
        for command in commands {
            world::apply(&mut self.world, command, events);
        }
    }

    /// Field-of-view membership of `point` for the target.
    #[must_use]
    pub fn fov_membership(&self, point: Vec2, observer: &TargetObservation) -> FovSample {
        self.visibility
            .fov_membership(query::grid(&self.world), point, observer)
    }

    /// Occlusion polygons around the target.
    #[must_use]
    pub fn fov_mask(&self, observer: &TargetObservation) -> FovMask {
        self.visibility.mask(query::grid(&self.world), observer)
    }

    /// Read-only access to the world state.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Projectiles currently tracked by the pool.
    #[must_use]
    pub fn projectiles(&self) -> &Projectiles {
        &self.projectiles
    }
}
