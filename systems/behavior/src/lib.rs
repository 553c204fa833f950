#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-agent perception and the five-state behavior machine.
//!
//! Every tick each active agent perceives the target, smooths its tile
//! position and counts its timers down. Behavior only changes at decision
//! gates, which open when the decision timer expires or when locomotion has
//! flagged the agent as stuck. Gates invoke the path planner and the cover
//! selector; between gates the machine only sweeps the view of searching
//! agents and fires when a shot is due.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use skirmish_core::{
    angle, BehaviorState, CombatTuning, Event, PerceptionTuning, TargetObservation, TileCoord,
    Tuning,
};
use skirmish_system_cover::CoverSelector;
use skirmish_system_pathfinding::{PathPlanner, SearchOutcome};
use skirmish_system_visibility::{line_of_sight, Blockers};
use skirmish_world::{Agent, AgentPool, Grid};

/// What an agent knows about the target during the current tick.
#[derive(Clone, Copy, Debug)]
struct Perception {
    distance: f32,
    in_view: bool,
    smoothed: TileCoord,
}

/// Behavior system that owns the planner and cover scratch state shared by
/// every agent.
#[derive(Debug)]
pub struct Behavior {
    perception: PerceptionTuning,
    combat: CombatTuning,
    half_fov: f32,
    fixed_dt: f32,
    planner: PathPlanner,
    cover: CoverSelector,
}

impl Behavior {
    /// Creates the behavior system for the provided grid and tuning.
    #[must_use]
    pub fn new(grid: &Grid, tuning: &Tuning) -> Self {
        Self {
            perception: tuning.perception.clone(),
            combat: tuning.combat.clone(),
            half_fov: tuning.agent.half_fov,
            fixed_dt: tuning.fixed_dt,
            planner: PathPlanner::new(grid, tuning.search.max_iterations),
            cover: CoverSelector::new(tuning.combat.clone()),
        }
    }

    /// Runs one fixed tick of behavior for every active agent in slot order.
    ///
    /// Transitions, truncated searches and fire requests are appended to
    /// `out_events`.
    pub fn handle<R>(
        &mut self,
        grid: &Grid,
        agents: &mut AgentPool,
        target: &TargetObservation,
        rng: &mut R,
        out_events: &mut Vec<Event>,
    ) where
        R: Rng + ?Sized,
    {
        let target_tile = grid.tile_of(target.position);
        for agent in agents.iter_mut().filter(|agent| agent.active) {
            self.update_agent(grid, agent, target, target_tile, rng, out_events);
        }
    }

    fn update_agent<R>(
        &mut self,
        grid: &Grid,
        agent: &mut Agent,
        target: &TargetObservation,
        target_tile: TileCoord,
        rng: &mut R,
        out_events: &mut Vec<Event>,
    ) where
        R: Rng + ?Sized,
    {
        let perception = self.perceive(agent, target.position, target_tile);
        self.count_down(agent);

        if agent.timers.decision <= 0.0 || agent.force_replan {
            self.decide(grid, agent, target.position, &perception, rng, out_events);
        }

        self.look_around(agent);
        self.fire(agent, &perception, out_events);
    }

    fn perceive(&self, agent: &mut Agent, target: Vec2, target_tile: TileCoord) -> Perception {
        let bearing = angle::bearing_degrees(agent.position, target);
        let in_view = angle::shortest_turn(agent.facing, bearing).abs() <= self.half_fov;

        agent.history.record(target_tile);
        Perception {
            distance: agent.position.distance(target),
            in_view,
            smoothed: agent.history.smoothed().unwrap_or(target_tile),
        }
    }

    fn count_down(&self, agent: &mut Agent) {
        let dt = self.fixed_dt;
        agent.timers.decision -= dt;
        agent.timers.shoot_cooldown -= dt;
        if agent.state == BehaviorState::Searching {
            agent.timers.search -= dt;
        }
    }

    fn decide<R>(
        &mut self,
        grid: &Grid,
        agent: &mut Agent,
        target: Vec2,
        perception: &Perception,
        rng: &mut R,
        out_events: &mut Vec<Event>,
    ) where
        R: Rng + ?Sized,
    {
        agent.timers.decision = self.perception.decision_interval;
        let previous = agent.state;

        let detected = perception.distance <= self.perception.pathfinding_range
            && perception.in_view
            && line_of_sight(grid, agent.position, target, Blockers::SIGHT);

        if detected {
            self.engage(grid, agent, perception, out_events);
        } else {
            self.lose_track(grid, agent, rng, out_events);
        }

        agent.force_replan = false;

        if agent.state != previous {
            tracing::debug!(
                agent = agent.id.get(),
                from = ?previous,
                to = ?agent.state,
                path_len = agent.path.len(),
                "behavior transition"
            );
            out_events.push(Event::AgentStateChanged {
                agent: agent.id,
                from: previous,
                to: agent.state,
            });
        }
    }

    fn engage(
        &mut self,
        grid: &Grid,
        agent: &mut Agent,
        perception: &Perception,
        out_events: &mut Vec<Event>,
    ) {
        if matches!(agent.state, BehaviorState::Free | BehaviorState::Searching) {
            agent.path.clear();
        }

        if perception.distance < self.combat.shooting_range {
            match self.cover.find_cover(grid, agent.position, perception.smoothed) {
                Some(candidate) => {
                    agent.state = BehaviorState::TakeCover;
                    self.plan(grid, agent, candidate.tile, out_events);
                    agent.in_cover = true;
                }
                None => {
                    agent.state = BehaviorState::Shoot;
                    agent.path.clear();
                    agent.in_cover = false;
                }
            }
        } else {
            agent.state = BehaviorState::Chase;
            self.plan(grid, agent, perception.smoothed, out_events);
            agent.in_cover = false;
        }

        agent.last_known = Some(perception.smoothed);
    }

    fn lose_track<R>(
        &mut self,
        grid: &Grid,
        agent: &mut Agent,
        rng: &mut R,
        out_events: &mut Vec<Event>,
    ) where
        R: Rng + ?Sized,
    {
        match agent.state {
            BehaviorState::Chase | BehaviorState::Shoot | BehaviorState::TakeCover => {
                agent.state = BehaviorState::Searching;
                agent.timers.search = self.perception.search_duration;
                agent.timers.look_around = 0.0;
                agent.in_cover = false;
                match agent.last_known {
                    Some(tile) => {
                        agent.look_around_base =
                            angle::bearing_degrees(agent.position, grid.tile_center(tile));
                        self.plan(grid, agent, tile, out_events);
                    }
                    None => agent.path.clear(),
                }
            }
            BehaviorState::Searching if agent.timers.search <= 0.0 => {
                agent.state = BehaviorState::Free;
                agent.path.clear();
                agent.velocity = Vec2::ZERO;
                agent.in_cover = false;
                agent.last_known = None;
            }
            BehaviorState::Free if agent.path.is_empty() => {
                self.wander(grid, agent, rng, out_events);
            }
            _ => {}
        }
    }

    fn wander<R>(
        &mut self,
        grid: &Grid,
        agent: &mut Agent,
        rng: &mut R,
        out_events: &mut Vec<Event>,
    ) where
        R: Rng + ?Sized,
    {
        let chance = f64::from(self.perception.wander_chance.clamp(0.0, 1.0));
        if !rng.gen_bool(chance) {
            return;
        }

        let origin = grid.tile_of(agent.position);
        let nearest = self.perception.wander_min;
        let farthest = self.perception.wander_max.max(nearest);
        for _ in 0..self.perception.wander_attempts {
            let reach = rng.gen_range(nearest..=farthest) as f32;
            let heading = angle::heading_vector(f32::from(rng.gen_range(0_u16..360)));
            let goal = origin.offset((heading.x * reach) as i32, (heading.y * reach) as i32);
            if grid.is_passable(goal) {
                self.plan(grid, agent, goal, out_events);
                agent.last_known = Some(goal);
                return;
            }
        }
        tracing::trace!(agent = agent.id.get(), "no wander destination found");
    }

    fn plan(
        &mut self,
        grid: &Grid,
        agent: &mut Agent,
        goal: TileCoord,
        out_events: &mut Vec<Event>,
    ) {
        let outcome = self
            .planner
            .find_path(grid, agent.position, goal, &mut agent.path);
        match outcome {
            SearchOutcome::Found => {}
            SearchOutcome::Truncated => out_events.push(Event::SearchTruncated {
                agent: agent.id,
                goal,
            }),
            SearchOutcome::Blocked | SearchOutcome::Unreachable => {
                tracing::trace!(
                    agent = agent.id.get(),
                    column = goal.column(),
                    row = goal.row(),
                    ?outcome,
                    "no path"
                );
            }
        }
    }

    /// Sweeps the facing of a searching agent that has run out of path.
    fn look_around(&self, agent: &mut Agent) {
        if agent.state != BehaviorState::Searching || !agent.path.is_empty() {
            return;
        }
        agent.timers.look_around += self.fixed_dt;
        let phase = TAU * agent.timers.look_around / self.perception.look_around_period;
        agent.facing = angle::normalize_degrees(
            agent.look_around_base + self.perception.look_around_amplitude * phase.sin(),
        );
    }

    fn fire(&self, agent: &mut Agent, perception: &Perception, out_events: &mut Vec<Event>) {
        let holding = match agent.state {
            BehaviorState::Shoot => true,
            BehaviorState::TakeCover => agent.path.is_empty(),
            _ => false,
        };
        if !holding
            || agent.timers.shoot_cooldown > 0.0
            || perception.distance >= self.combat.shooting_range
        {
            return;
        }

        out_events.push(Event::ProjectileRequested {
            agent: agent.id,
            origin: agent.position,
            facing: agent.facing,
        });
        agent.timers.shoot_cooldown = self.combat.shoot_cooldown;
        if agent.state == BehaviorState::Shoot {
            agent.timers.decision = 0.0;
        }
    }
}
