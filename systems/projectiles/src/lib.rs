#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed pool of straight-flying projectiles fired by agents and the target.
//!
//! Projectiles stop on bulletproof and opaque tiles, expire after their
//! lifetime and vanish once they leave the world. Target projectiles damage
//! agents through [`Command::DamageAgent`]; agent projectiles striking the
//! target are reported as [`Event::TargetHit`].

use glam::Vec2;
use skirmish_core::{
    angle, AgentId, Command, Event, ProjectileTuning, TargetObservation, TileCoord, Tuning,
};
use skirmish_world::{AgentPool, Grid};

/// Who fired a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Owner {
    /// Fired by the agent in this slot.
    Agent(AgentId),
    /// Fired by the target.
    Target,
}

/// Single pooled projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projectile {
    /// Whether the slot is in flight.
    pub active: bool,
    /// Shooter that owns the projectile.
    pub owner: Owner,
    /// Current position in world units.
    pub position: Vec2,
    /// Velocity in world units per second.
    pub velocity: Vec2,
    /// Seconds left before the projectile expires.
    pub lifetime: f32,
}

impl Projectile {
    const IDLE: Self = Self {
        active: false,
        owner: Owner::Target,
        position: Vec2::ZERO,
        velocity: Vec2::ZERO,
        lifetime: 0.0,
    };
}

/// Projectile pool allocated once at its final capacity.
#[derive(Clone, Debug)]
pub struct Projectiles {
    slots: Vec<Projectile>,
    tuning: ProjectileTuning,
    target_size: f32,
}

impl Projectiles {
    /// Creates an idle pool sized by the projectile tuning.
    #[must_use]
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            slots: vec![Projectile::IDLE; tuning.projectiles.capacity],
            tuning: tuning.projectiles.clone(),
            target_size: tuning.combat.target_size,
        }
    }

    /// Fires a projectile from the rim of a shooter's body along `facing`.
    ///
    /// Returns `false` when every slot is in flight; the shot is dropped.
    pub fn fire(&mut self, owner: Owner, center: Vec2, body_size: f32, facing: f32) -> bool {
        let Some(slot) = self.slots.iter_mut().find(|slot| !slot.active) else {
            tracing::trace!(?owner, "projectile pool exhausted; shot dropped");
            return false;
        };
        let heading = angle::heading_vector(facing);
        *slot = Projectile {
            active: true,
            owner,
            position: center + heading * (body_size * 0.5),
            velocity: heading * self.tuning.speed,
            lifetime: self.tuning.lifetime,
        };
        true
    }

    /// Projectiles currently in flight, in slot order.
    pub fn in_flight(&self) -> impl Iterator<Item = &Projectile> {
        self.slots.iter().filter(|slot| slot.active)
    }

    /// Number of slots in the pool.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Advances every projectile by `dt` seconds and resolves hits.
    pub fn handle(
        &mut self,
        grid: &Grid,
        dt: f32,
        agents: &AgentPool,
        target: &TargetObservation,
        out_commands: &mut Vec<Command>,
        out_events: &mut Vec<Event>,
    ) {
        let hit_box = self.tuning.hit_box;
        for projectile in self.slots.iter_mut().filter(|slot| slot.active) {
            let next = projectile.position + projectile.velocity * dt;
            if box_blocked(grid, next, hit_box) {
                projectile.active = false;
                continue;
            }

            projectile.position = next;
            projectile.lifetime -= dt;
            if projectile.lifetime <= 0.0 || !inside_world(grid, next) {
                projectile.active = false;
            }
        }

        for projectile in self.slots.iter_mut().filter(|slot| slot.active) {
            match projectile.owner {
                Owner::Target => {
                    let struck = agents.iter().find(|agent| {
                        agent.active
                            && projectile.position.distance(agent.position) < agent.size * 0.5
                    });
                    if let Some(agent) = struck {
                        projectile.active = false;
                        let amount = if agent.in_cover {
                            self.tuning.cover_damage
                        } else {
                            self.tuning.damage
                        };
                        out_commands.push(Command::DamageAgent {
                            agent: agent.id,
                            amount,
                        });
                    }
                }
                Owner::Agent(agent) => {
                    if projectile.position.distance(target.position) < self.target_size * 0.5 {
                        projectile.active = false;
                        out_events.push(Event::TargetHit { agent });
                    }
                }
            }
        }
    }
}

fn inside_world(grid: &Grid, point: Vec2) -> bool {
    let extent = grid.world_extent();
    (0.0..=extent).contains(&point.x) && (0.0..=extent).contains(&point.y)
}

/// Tests the square hit box whose top-left corner sits at `corner`.
fn box_blocked(grid: &Grid, corner: Vec2, size: f32) -> bool {
    let first = grid.tile_of(corner);
    let last = grid.tile_of(corner + Vec2::splat(size));
    (first.row()..=last.row()).any(|row| {
        (first.column()..=last.column()).any(|column| {
            grid.tile_at(TileCoord::new(column, row))
                .map_or(false, |kind| kind.stops_projectiles())
        })
    })
}
