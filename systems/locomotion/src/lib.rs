#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Path following, capped rotation and stall detection for pooled agents.
//!
//! Locomotion only proposes a velocity; collision resolution decides how much
//! of it the agent actually travels.

use glam::Vec2;
use skirmish_core::{angle, BehaviorState, Event, LocomotionTuning, Tuning};
use skirmish_world::{Agent, AgentPool, Grid};

/// Rotates `facing` toward `desired` by at most `max_step` degrees.
///
/// Differences below `snap` land exactly on `desired`.
#[must_use]
pub fn rotate_toward(facing: f32, desired: f32, max_step: f32, snap: f32) -> f32 {
    let turn = angle::shortest_turn(facing, desired);
    if turn.abs() < snap {
        return angle::normalize_degrees(desired);
    }
    angle::normalize_degrees(facing + turn.clamp(-max_step, max_step))
}

/// Locomotion controller applied to every active agent once per tick.
#[derive(Clone, Debug)]
pub struct Locomotion {
    speed: f32,
    rotation_speed: f32,
    fixed_dt: f32,
    limits: LocomotionTuning,
}

impl Locomotion {
    /// Creates the controller from the simulation tuning.
    #[must_use]
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            speed: tuning.agent.speed,
            rotation_speed: tuning.agent.rotation_speed,
            fixed_dt: tuning.fixed_dt,
            limits: tuning.locomotion.clone(),
        }
    }

    /// Steers every active agent and flags the ones that stopped making
    /// progress.
    pub fn handle(&self, grid: &Grid, agents: &mut AgentPool, out_events: &mut Vec<Event>) {
        for agent in agents.iter_mut().filter(|agent| agent.active) {
            self.steer(grid, agent, out_events);
            agent.previous_position = agent.position;
        }
    }

    fn steer(&self, grid: &Grid, agent: &mut Agent, out_events: &mut Vec<Event>) {
        let Some(waypoint) = agent.path.next_waypoint() else {
            agent.velocity = Vec2::ZERO;
            agent.timers.stall = 0.0;
            self.face_last_known(grid, agent);
            return;
        };

        let destination = grid.tile_center(waypoint);
        let offset = destination - agent.position;
        let distance = offset.length();
        if distance < grid.tile_size() * 0.5 {
            agent.velocity = Vec2::ZERO;
            let _ = agent.path.pop();
            if agent.path.is_empty() {
                self.face_last_known(grid, agent);
            }
            return;
        }

        self.face(agent, destination);
        agent.velocity = offset / distance * self.speed * self.fixed_dt;
        self.detect_stall(grid, agent, out_events);
    }

    fn detect_stall(&self, grid: &Grid, agent: &mut Agent, out_events: &mut Vec<Event>) {
        let moved = agent.position.distance(agent.previous_position);
        if moved >= self.limits.stuck_displacement {
            agent.timers.stall = 0.0;
            return;
        }

        agent.timers.stall += self.fixed_dt;
        if agent.timers.stall < self.limits.stuck_threshold {
            return;
        }
        agent.timers.stall = 0.0;
        if agent.force_replan {
            return;
        }

        agent.force_replan = true;
        let tile = grid.tile_of(agent.position);
        tracing::warn!(
            agent = agent.id.get(),
            column = tile.column(),
            row = tile.row(),
            path_len = agent.path.len(),
            "agent stuck; forcing replan"
        );
        out_events.push(Event::AgentStuck {
            agent: agent.id,
            tile,
        });
    }

    /// Stationary shooters keep turning toward the last known target tile.
    fn face_last_known(&self, grid: &Grid, agent: &mut Agent) {
        if !matches!(agent.state, BehaviorState::Shoot | BehaviorState::TakeCover) {
            return;
        }
        if let Some(tile) = agent.last_known {
            self.face(agent, grid.tile_center(tile));
        }
    }

    fn face(&self, agent: &mut Agent, point: Vec2) {
        let desired = angle::bearing_degrees(agent.position, point);
        agent.facing = rotate_toward(
            agent.facing,
            desired,
            self.rotation_speed * self.fixed_dt,
            self.limits.snap_angle,
        );
    }
}
