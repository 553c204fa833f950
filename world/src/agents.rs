//! Fixed agent pool and the per-agent records the AI systems operate on.

use glam::Vec2;
use skirmish_core::{AgentId, AgentSnapshot, BehaviorState, SpawnPointId, TileCoord};

const HISTORY_LEN: usize = 3;

/// Waypoint buffer stored start-to-goal with a read cursor.
///
/// The backing storage is allocated once with room for every tile of the
/// grid and is never grown afterwards.
#[derive(Clone, Debug)]
pub struct PathBuffer {
    tiles: Vec<TileCoord>,
    cursor: usize,
}

impl PathBuffer {
    /// Creates an empty buffer able to hold `capacity` waypoints.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tiles: Vec::with_capacity(capacity),
            cursor: 0,
        }
    }

    /// Maximum number of waypoints the buffer holds.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.tiles.capacity()
    }

    /// Number of waypoints left to visit.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len() - self.cursor
    }

    /// Reports whether the agent has nowhere left to go.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Waypoint the agent is currently heading for.
    #[must_use]
    pub fn next_waypoint(&self) -> Option<TileCoord> {
        self.tiles.get(self.cursor).copied()
    }

    /// Final waypoint of the path.
    #[must_use]
    pub fn goal(&self) -> Option<TileCoord> {
        if self.is_empty() {
            None
        } else {
            self.tiles.last().copied()
        }
    }

    /// Removes and returns the current waypoint.
    pub fn pop(&mut self) -> Option<TileCoord> {
        let waypoint = self.next_waypoint()?;
        self.cursor += 1;
        if self.cursor == self.tiles.len() {
            self.clear();
        }
        Some(waypoint)
    }

    /// Drops every remaining waypoint.
    pub fn clear(&mut self) {
        self.tiles.clear();
        self.cursor = 0;
    }

    /// Remaining waypoints in travel order.
    pub fn iter(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.tiles[self.cursor..].iter().copied()
    }

    /// Replaces the contents with waypoints supplied goal-first.
    ///
    /// Waypoints beyond the buffer capacity are discarded.
    pub fn load_reversed<I>(&mut self, goal_to_start: I)
    where
        I: IntoIterator<Item = TileCoord>,
    {
        self.clear();
        let capacity = self.tiles.capacity();
        for tile in goal_to_start.into_iter().take(capacity) {
            self.tiles.push(tile);
        }
        self.tiles.reverse();
    }
}

/// Rolling window of the last observed target tiles.
#[derive(Clone, Copy, Debug, Default)]
pub struct TargetHistory {
    samples: [TileCoord; HISTORY_LEN],
    filled: usize,
    next: usize,
}

impl TargetHistory {
    /// Records the latest target tile, evicting the oldest sample.
    pub fn record(&mut self, tile: TileCoord) {
        self.samples[self.next] = tile;
        self.next = (self.next + 1) % HISTORY_LEN;
        self.filled = (self.filled + 1).min(HISTORY_LEN);
    }

    /// Average of the recorded samples truncated to a tile.
    #[must_use]
    pub fn smoothed(&self) -> Option<TileCoord> {
        if self.filled == 0 {
            return None;
        }
        let (columns, rows) = self.samples[..self.filled]
            .iter()
            .fold((0, 0), |(columns, rows), tile| {
                (columns + tile.column(), rows + tile.row())
            });
        let count = self.filled as i32;
        Some(TileCoord::new(columns / count, rows / count))
    }

    /// Forgets every sample.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Countdown timers carried by each agent, in seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AgentTimers {
    /// Time until the next decision gate.
    pub decision: f32,
    /// Time until the agent may fire again.
    pub shoot_cooldown: f32,
    /// Time left in the current search.
    pub search: f32,
    /// Time left before a killed agent respawns.
    pub respawn: f32,
    /// Time accumulated without meaningful displacement.
    pub stall: f32,
    /// Phase of the look-around sweep.
    pub look_around: f32,
}

/// Mutable record of a single pooled agent.
#[derive(Clone, Debug)]
pub struct Agent {
    /// Pool slot of the agent.
    pub id: AgentId,
    /// Whether the slot is in play.
    pub active: bool,
    /// Center of the agent in world units.
    pub position: Vec2,
    /// Center at the end of the previous tick.
    pub previous_position: Vec2,
    /// Displacement proposed for the current tick.
    pub velocity: Vec2,
    /// Facing in degrees, within `(-180, 180]`.
    pub facing: f32,
    /// Remaining health.
    pub health: f32,
    /// Edge length of the square body.
    pub size: f32,
    /// Current behavior.
    pub state: BehaviorState,
    /// Whether the agent is holding a cover position.
    pub in_cover: bool,
    /// Spawn point that owns the agent.
    pub spawn_point: Option<SpawnPointId>,
    /// Remaining route.
    pub path: PathBuffer,
    /// Countdown timers.
    pub timers: AgentTimers,
    /// Recent target tiles used for smoothing.
    pub history: TargetHistory,
    /// Tile where the target was last detected.
    pub last_known: Option<TileCoord>,
    /// Heading the look-around sweep oscillates about.
    pub look_around_base: f32,
    /// Set when a stall demands a decision gate on the next tick.
    pub force_replan: bool,
}

impl Agent {
    fn dormant(id: AgentId, path_capacity: usize, size: f32) -> Self {
        Self {
            id,
            active: false,
            position: Vec2::ZERO,
            previous_position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            facing: 0.0,
            health: 0.0,
            size,
            state: BehaviorState::Free,
            in_cover: false,
            spawn_point: None,
            path: PathBuffer::with_capacity(path_capacity),
            timers: AgentTimers::default(),
            history: TargetHistory::default(),
            last_known: None,
            look_around_base: 0.0,
            force_replan: false,
        }
    }

    /// Puts the agent into play with a fresh set of timers.
    pub(crate) fn activate(
        &mut self,
        spawn_point: SpawnPointId,
        position: Vec2,
        facing: f32,
        health: f32,
    ) {
        self.active = true;
        self.position = position;
        self.previous_position = position;
        self.velocity = Vec2::ZERO;
        self.facing = facing;
        self.health = health;
        self.state = BehaviorState::Free;
        self.in_cover = false;
        self.spawn_point = Some(spawn_point);
        self.path.clear();
        self.timers = AgentTimers::default();
        self.history.reset();
        self.last_known = None;
        self.look_around_base = 0.0;
        self.force_replan = false;
    }

    /// Takes the agent out of play and starts its respawn countdown.
    pub(crate) fn deactivate(&mut self, respawn_delay: f32) {
        self.active = false;
        self.velocity = Vec2::ZERO;
        self.state = BehaviorState::Free;
        self.in_cover = false;
        self.path.clear();
        self.timers.respawn = respawn_delay;
        self.force_replan = false;
    }

    /// Captures an immutable snapshot of the agent.
    #[must_use]
    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            active: self.active,
            position: self.position,
            facing: self.facing,
            health: self.health,
            state: self.state,
            in_cover: self.in_cover,
            path_len: self.path.len(),
            next_waypoint: self.path.next_waypoint(),
        }
    }
}

/// Fixed-size pool of agents reused by slot index.
#[derive(Clone, Debug)]
pub struct AgentPool {
    agents: Vec<Agent>,
}

impl AgentPool {
    /// Allocates every slot up front.
    #[must_use]
    pub fn new(capacity: usize, path_capacity: usize, agent_size: f32) -> Self {
        let agents = (0..capacity)
            .map(|slot| Agent::dormant(AgentId::new(slot as u32), path_capacity, agent_size))
            .collect();
        Self { agents }
    }

    /// Number of slots in the pool.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.agents.len()
    }

    /// Number of agents currently in play.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.agents.iter().filter(|agent| agent.active).count()
    }

    /// Agent in the requested slot.
    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.slot())
    }

    /// Mutable agent in the requested slot.
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id.slot())
    }

    /// Iterates over every slot in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    /// Iterates mutably over every slot in index order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.iter_mut()
    }

    pub(crate) fn first_inactive_mut(&mut self) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|agent| !agent.active)
    }
}
