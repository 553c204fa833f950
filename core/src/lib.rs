#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Skirmish simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and the AI systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems and presentation layers to react to deterministically.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub mod angle;
mod tuning;

pub use tuning::{
    AgentTuning, CombatTuning, FovTuning, GridTuning, LocomotionTuning, PerceptionTuning,
    ProjectileTuning, SearchTuning, SpawnTuning, Tuning, TuningError, MAX_MASK_RAYS,
    MIN_MASK_RAYS,
};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Registers a new spawn point that keeps a quota of agents alive.
    ConfigureSpawnPoint {
        /// Center of the spawn point in world units.
        position: Vec2,
        /// Number of agents the spawn point attempts to field.
        quota: u32,
    },
    /// Globally enables or pauses spawn refills and respawns.
    SetSpawningEnabled {
        /// Whether spawning should run.
        enabled: bool,
    },
    /// Activates the first inactive pool slot at the provided position.
    SpawnAgent {
        /// Spawn point the agent belongs to.
        spawn_point: SpawnPointId,
        /// Center of the agent in world units.
        position: Vec2,
        /// Initial facing in degrees.
        facing: f32,
    },
    /// Reactivates a specific pool slot whose respawn countdown elapsed.
    RespawnAgent {
        /// Pool slot to reactivate.
        agent: AgentId,
        /// Center of the agent in world units.
        position: Vec2,
        /// Initial facing in degrees.
        facing: f32,
    },
    /// Restarts the refill countdown of a spawn point after a refill burst.
    ResetSpawnTimer {
        /// Spawn point whose countdown restarts.
        spawn_point: SpawnPointId,
    },
    /// Subtracts health from an active agent.
    DamageAgent {
        /// Agent receiving the damage.
        agent: AgentId,
        /// Amount of health removed.
        amount: f32,
    },
}

/// Events broadcast by the world and the AI systems.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a spawn point was registered.
    SpawnPointConfigured {
        /// Identifier allocated to the spawn point.
        spawn_point: SpawnPointId,
    },
    /// Announces that spawning was enabled or paused.
    SpawningToggled {
        /// Whether spawning is now running.
        enabled: bool,
    },
    /// Confirms that a pool slot became active.
    AgentSpawned {
        /// Slot that was activated.
        agent: AgentId,
        /// Spawn point that owns the agent.
        spawn_point: SpawnPointId,
        /// Center of the agent after spawning.
        position: Vec2,
    },
    /// Reports that a spawn request found no free pool slot.
    SpawnRejected {
        /// Spawn point that requested the agent.
        spawn_point: SpawnPointId,
    },
    /// Reports that an inactive agent finished its respawn countdown.
    RespawnDue {
        /// Slot awaiting reactivation.
        agent: AgentId,
        /// Spawn point the slot returns to.
        spawn_point: SpawnPointId,
    },
    /// Reports that an agent lost health but survived.
    AgentDamaged {
        /// Agent that was hit.
        agent: AgentId,
        /// Health remaining after the hit.
        health: f32,
    },
    /// Reports that an agent's health reached zero.
    AgentKilled {
        /// Agent that was deactivated.
        agent: AgentId,
        /// Spawn point that will respawn the agent.
        spawn_point: SpawnPointId,
    },
    /// Reports a behavior transition taken at a decision gate.
    AgentStateChanged {
        /// Agent that transitioned.
        agent: AgentId,
        /// Behavior before the gate.
        from: BehaviorState,
        /// Behavior after the gate.
        to: BehaviorState,
    },
    /// Reports that an agent stalled long enough to force a replan.
    AgentStuck {
        /// Agent that stalled.
        agent: AgentId,
        /// Tile the agent occupies.
        tile: TileCoord,
    },
    /// Reports that a path search hit its iteration cap before reaching the goal.
    SearchTruncated {
        /// Agent whose search was cut short.
        agent: AgentId,
        /// Goal tile of the abandoned search.
        goal: TileCoord,
    },
    /// Requests a projectile fired by an agent.
    ProjectileRequested {
        /// Agent that fired.
        agent: AgentId,
        /// Center of the shooter in world units.
        origin: Vec2,
        /// Facing of the shooter in degrees.
        facing: f32,
    },
    /// Reports that an agent projectile struck the target.
    TargetHit {
        /// Agent whose projectile connected.
        agent: AgentId,
    },
}

/// Unique identifier of an agent slot inside the fixed-size pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided slot index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Slot index of the agent inside the pool.
    #[must_use]
    pub const fn slot(&self) -> usize {
        self.0 as usize
    }
}

/// Unique identifier assigned to a spawn point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpawnPointId(u32);

impl SpawnPointId {
    /// Creates a new spawn point identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid tile expressed as column and row coordinates.
///
/// Coordinates are signed so that offsets computed near the border can be
/// represented and then rejected by bounds checks instead of wrapping.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TileCoord {
    column: i32,
    row: i32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Returns the tile displaced by the provided column and row deltas.
    #[must_use]
    pub const fn offset(self, columns: i32, rows: i32) -> Self {
        Self::new(self.column + columns, self.row + rows)
    }
}

/// Row-major index of a tile (`column + row * side`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileIndex(u32);

impl TileIndex {
    /// Wraps a raw row-major index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the raw index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Static classification of a grid tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Walkable floor.
    #[default]
    Open,
    /// Low wall that provides cover but lets sight and projectiles through.
    SoftCover,
    /// Bulletproof wall that stops projectiles.
    HardCover,
    /// Wall that blocks sight and projectiles.
    Opaque,
    /// Floor hugging an obstacle; walkable for collision, excluded from pathing.
    PathExclusion,
}

impl TileKind {
    /// Decodes the numeric map code used by source maps (`0..=4`).
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Open),
            1 => Some(Self::SoftCover),
            2 => Some(Self::HardCover),
            3 => Some(Self::Opaque),
            4 => Some(Self::PathExclusion),
            _ => None,
        }
    }

    /// Reports whether the tile is a wall of any kind.
    #[must_use]
    pub const fn is_obstacle(self) -> bool {
        matches!(self, Self::SoftCover | Self::HardCover | Self::Opaque)
    }

    /// Reports whether projectiles stop on this tile.
    #[must_use]
    pub const fn stops_projectiles(self) -> bool {
        matches!(self, Self::HardCover | Self::Opaque)
    }
}

/// Behavior states available to enemy agents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorState {
    /// Idle; may wander.
    #[default]
    Free,
    /// Standing still and firing at the target.
    Shoot,
    /// Moving to, or holding, a cover position.
    TakeCover,
    /// Closing the distance toward the target.
    Chase,
    /// Investigating the last known target position.
    Searching,
}

/// Position and facing of the target (player) observed each tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetObservation {
    /// Center of the target in world units.
    pub position: Vec2,
    /// Facing of the target in degrees.
    pub facing: f32,
}

impl TargetObservation {
    /// Creates a new observation.
    #[must_use]
    pub const fn new(position: Vec2, facing: f32) -> Self {
        Self { position, facing }
    }
}

/// Immutable representation of a single agent's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentSnapshot {
    /// Pool slot of the agent.
    pub id: AgentId,
    /// Whether the slot is currently in play.
    pub active: bool,
    /// Center of the agent in world units.
    pub position: Vec2,
    /// Facing in degrees.
    pub facing: f32,
    /// Remaining health.
    pub health: f32,
    /// Current behavior.
    pub state: BehaviorState,
    /// Whether the agent counts as being in cover.
    pub in_cover: bool,
    /// Number of waypoints left on the current path.
    pub path_len: usize,
    /// Next waypoint, if the agent is navigating.
    pub next_waypoint: Option<TileCoord>,
}

/// Read-only snapshot describing every agent slot.
#[derive(Clone, Debug, Default)]
pub struct AgentView {
    snapshots: Vec<AgentSnapshot>,
}

impl AgentView {
    /// Creates a new agent view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<AgentSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over the active agents only.
    pub fn active(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.snapshots.iter().filter(|snapshot| snapshot.active)
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<AgentSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a spawn point used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnPointSnapshot {
    /// Identifier of the spawn point.
    pub id: SpawnPointId,
    /// Center of the spawn point in world units.
    pub position: Vec2,
    /// Number of agents the spawn point fields.
    pub quota: u32,
    /// Number of agents spawned so far.
    pub spawned: u32,
    /// Seconds left until the next refill.
    pub refill_in: f32,
}

impl SpawnPointSnapshot {
    /// Reports whether the spawn point should refill this tick.
    #[must_use]
    pub fn ready_to_refill(&self) -> bool {
        self.refill_in <= 0.0 && self.spawned < self.quota
    }
}
