//! Tunable constants that drive every system in the simulation.

use serde::{Deserialize, Serialize};

/// Fewest rays a field-of-view mask polygon can be built from.
pub const MIN_MASK_RAYS: usize = 2;
/// Most rays a field-of-view mask polygon can be built from.
pub const MAX_MASK_RAYS: usize = 256;

/// Aggregated tuning knobs controlling every adjustable aspect of the simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Grid dimensions.
    pub grid: GridTuning,
    /// Agent body, pool and movement limits.
    pub agent: AgentTuning,
    /// Perception cadence, search and wander behaviour.
    pub perception: PerceptionTuning,
    /// Shooting and cover parameters.
    pub combat: CombatTuning,
    /// Path search limits.
    pub search: SearchTuning,
    /// Waypoint following and stall detection.
    pub locomotion: LocomotionTuning,
    /// Observer field-of-view geometry.
    pub fov: FovTuning,
    /// Projectile pool and ballistics.
    pub projectiles: ProjectileTuning,
    /// Spawn placement sampling.
    pub spawning: SpawnTuning,
    /// Length of one fixed simulation step in seconds.
    pub fixed_dt: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            grid: GridTuning::default(),
            agent: AgentTuning::default(),
            perception: PerceptionTuning::default(),
            combat: CombatTuning::default(),
            search: SearchTuning::default(),
            locomotion: LocomotionTuning::default(),
            fov: FovTuning::default(),
            projectiles: ProjectileTuning::default(),
            spawning: SpawnTuning::default(),
            fixed_dt: 1.0 / 60.0,
        }
    }
}

impl Tuning {
    /// Checks that every knob lies in a range the systems can operate with.
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.grid.side == 0 {
            return Err(TuningError::EmptyGrid);
        }
        if self.agent.pool_capacity == 0 {
            return Err(TuningError::EmptyPool { pool: "agent" });
        }
        if self.projectiles.capacity == 0 {
            return Err(TuningError::EmptyPool { pool: "projectile" });
        }
        if self.search.max_iterations == 0 {
            return Err(TuningError::NonPositive {
                field: "search.max_iterations",
                value: 0.0,
            });
        }

        let positives = [
            ("grid.tile_size", self.grid.tile_size),
            ("agent.health", self.agent.health),
            ("agent.size", self.agent.size),
            ("agent.speed", self.agent.speed),
            ("agent.rotation_speed", self.agent.rotation_speed),
            ("agent.half_fov", self.agent.half_fov),
            ("perception.decision_interval", self.perception.decision_interval),
            ("perception.look_around_period", self.perception.look_around_period),
            ("combat.shooting_range", self.combat.shooting_range),
            ("combat.target_size", self.combat.target_size),
            ("fov.near_radius", self.fov.near_radius),
            ("fov.range", self.fov.range),
            ("projectiles.speed", self.projectiles.speed),
            ("projectiles.lifetime", self.projectiles.lifetime),
            ("fixed_dt", self.fixed_dt),
        ];
        for (field, value) in positives {
            // NaN fails this comparison as well.
            if !(value > 0.0) {
                return Err(TuningError::NonPositive { field, value });
            }
        }

        let ranges = [
            (
                "combat.cover_band",
                self.combat.cover_band_min,
                self.combat.cover_band_max,
            ),
            (
                "perception.wander_distance",
                self.perception.wander_min as f32,
                self.perception.wander_max as f32,
            ),
            (
                "spawning.ring",
                self.spawning.ring_min,
                self.spawning.ring_max,
            ),
            ("fov.near_band", self.fov.near_band, self.fov.near_radius),
            ("fov.range_band", self.fov.range_band, self.fov.range),
        ];
        for (field, min, max) in ranges {
            if min > max {
                return Err(TuningError::InvertedRange { field, min, max });
            }
        }

        if !(MIN_MASK_RAYS..=MAX_MASK_RAYS).contains(&self.fov.mask_rays) {
            return Err(TuningError::OutOfRange {
                field: "fov.mask_rays",
                value: self.fov.mask_rays as f32,
            });
        }

        if !(0.0..=1.0).contains(&self.perception.wander_chance) {
            return Err(TuningError::OutOfRange {
                field: "perception.wander_chance",
                value: self.perception.wander_chance,
            });
        }

        Ok(())
    }
}

/// Errors reported when a [`Tuning`] value cannot drive the simulation.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum TuningError {
    /// The grid has no tiles.
    #[error("grid side must be at least one tile")]
    EmptyGrid,
    /// A fixed pool would hold no entries.
    #[error("{pool} pool capacity must be non-zero")]
    EmptyPool {
        /// Name of the pool.
        pool: &'static str,
    },
    /// A quantity that must be strictly positive was not.
    #[error("{field} must be positive, got {value}")]
    NonPositive {
        /// Dotted path of the offending knob.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// A `[min, max]` pair was supplied in the wrong order.
    #[error("{field} range is inverted ({min} > {max})")]
    InvertedRange {
        /// Dotted path of the offending range.
        field: &'static str,
        /// Lower bound as supplied.
        min: f32,
        /// Upper bound as supplied.
        max: f32,
    },
    /// A value fell outside its permitted range.
    #[error("{field} is out of range, got {value}")]
    OutOfRange {
        /// Dotted path of the offending knob.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
}

/// Grid dimensions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridTuning {
    /// Number of tiles along each side of the square grid.
    pub side: u32,
    /// Edge length of a tile in world units.
    pub tile_size: f32,
}

impl GridTuning {
    /// Edge length of the whole world in world units.
    #[must_use]
    pub fn world_extent(&self) -> f32 {
        self.side as f32 * self.tile_size
    }
}

impl Default for GridTuning {
    fn default() -> Self {
        Self {
            side: 64,
            tile_size: 32.0,
        }
    }
}

/// Agent body, pool and movement limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentTuning {
    /// Number of agent slots allocated up front.
    pub pool_capacity: usize,
    /// Health assigned on spawn.
    pub health: f32,
    /// Edge length of the agent's square body in world units.
    pub size: f32,
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Maximum turn rate in degrees per second.
    pub rotation_speed: f32,
    /// Half-angle of the agent's view cone in degrees.
    pub half_fov: f32,
    /// Seconds a killed agent waits before respawning.
    pub respawn_delay: f32,
}

impl Default for AgentTuning {
    fn default() -> Self {
        Self {
            pool_capacity: 400,
            health: 50.0,
            size: 48.0,
            speed: 200.0,
            rotation_speed: 240.0,
            half_fov: 64.0,
            respawn_delay: 10.0,
        }
    }
}

/// Perception cadence, search and wander behaviour.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionTuning {
    /// Maximum distance at which the target can be detected and pathed to.
    pub pathfinding_range: f32,
    /// Seconds between decision gates.
    pub decision_interval: f32,
    /// Seconds an agent keeps searching after losing the target.
    pub search_duration: f32,
    /// Swing amplitude of the look-around sweep in degrees.
    pub look_around_amplitude: f32,
    /// Period of the look-around sweep in seconds.
    pub look_around_period: f32,
    /// Probability that an idle agent picks a wander goal at a gate.
    pub wander_chance: f32,
    /// Minimum wander distance in tiles.
    pub wander_min: u32,
    /// Maximum wander distance in tiles.
    pub wander_max: u32,
    /// Number of wander goals sampled before giving up.
    pub wander_attempts: u32,
}

impl Default for PerceptionTuning {
    fn default() -> Self {
        Self {
            pathfinding_range: 600.0,
            decision_interval: 1.0,
            search_duration: 5.0,
            look_around_amplitude: 45.0,
            look_around_period: 2.0,
            wander_chance: 0.2,
            wander_min: 3,
            wander_max: 10,
            wander_attempts: 10,
        }
    }
}

/// Shooting and cover parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Distance within which agents fire at the target.
    pub shooting_range: f32,
    /// Seconds between consecutive shots.
    pub shoot_cooldown: f32,
    /// Radius around the agent scanned for cover sources.
    pub max_cover_distance: f32,
    /// Lower bound of the acceptable cover distance, as a fraction of shooting range.
    pub cover_band_min: f32,
    /// Upper bound of the acceptable cover distance, as a fraction of shooting range.
    pub cover_band_max: f32,
    /// Edge length of the target's body in world units.
    pub target_size: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            shooting_range: 384.0,
            shoot_cooldown: 0.5,
            max_cover_distance: 544.0,
            cover_band_min: 0.8,
            cover_band_max: 1.2,
            target_size: 48.0,
        }
    }
}

/// Path search limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchTuning {
    /// Expansions allowed before a search gives up.
    pub max_iterations: u32,
}

impl Default for SearchTuning {
    fn default() -> Self {
        Self {
            max_iterations: 1_000,
        }
    }
}

/// Waypoint following and stall detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionTuning {
    /// Seconds of near-zero displacement before a replan is forced.
    pub stuck_threshold: f32,
    /// Per-tick displacement below which the agent counts as stalled.
    pub stuck_displacement: f32,
    /// Heading error in degrees below which rotation snaps to the goal.
    pub snap_angle: f32,
}

impl Default for LocomotionTuning {
    fn default() -> Self {
        Self {
            stuck_threshold: 1.0,
            stuck_displacement: 1.0,
            snap_angle: 2.0,
        }
    }
}

/// Observer field-of-view geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FovTuning {
    /// Radius of the all-round near circle.
    pub near_radius: f32,
    /// Width of the fade band at the rim of the near circle.
    pub near_band: f32,
    /// Reach of the forward view cone.
    pub range: f32,
    /// Width of the fade band at the end of the view cone.
    pub range_band: f32,
    /// Half-angle of the forward view cone in degrees.
    pub half_angle: f32,
    /// Number of rays cast when building mask polygons, within
    /// [`MIN_MASK_RAYS`]`..=`[`MAX_MASK_RAYS`].
    pub mask_rays: usize,
}

impl Default for FovTuning {
    fn default() -> Self {
        Self {
            near_radius: 64.0,
            near_band: 10.0,
            range: 700.0,
            range_band: 50.0,
            half_angle: 45.0,
            mask_rays: 64,
        }
    }
}

/// Projectile pool and ballistics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Number of projectile slots allocated up front.
    pub capacity: usize,
    /// Travel speed in world units per second.
    pub speed: f32,
    /// Seconds a projectile lives before expiring.
    pub lifetime: f32,
    /// Edge length of the projectile's collision box.
    pub hit_box: f32,
    /// Damage dealt to an exposed agent.
    pub damage: f32,
    /// Damage dealt to an agent in cover.
    pub cover_damage: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            capacity: 200,
            speed: 1_024.0,
            lifetime: 0.5,
            hit_box: 5.0,
            damage: 10.0,
            cover_damage: 5.0,
        }
    }
}

/// Spawn placement sampling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Inner radius of the placement ring around a spawn point.
    pub ring_min: f32,
    /// Outer radius of the placement ring around a spawn point.
    pub ring_max: f32,
    /// Placement samples drawn before falling back to the spawn point center.
    pub placement_attempts: u32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            ring_min: 100.0,
            ring_max: 200.0,
            placement_attempts: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Tuning, TuningError};

    #[test]
    fn defaults_are_valid() {
        assert_eq!(Tuning::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_tile_size() {
        let mut tuning = Tuning::default();
        tuning.grid.tile_size = 0.0;
        assert_eq!(
            tuning.validate(),
            Err(TuningError::NonPositive {
                field: "grid.tile_size",
                value: 0.0,
            })
        );
    }

    #[test]
    fn rejects_inverted_cover_band() {
        let mut tuning = Tuning::default();
        tuning.combat.cover_band_min = 1.5;
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::InvertedRange {
                field: "combat.cover_band",
                ..
            })
        ));
    }

    #[test]
    fn rejects_empty_agent_pool() {
        let mut tuning = Tuning::default();
        tuning.agent.pool_capacity = 0;
        assert_eq!(
            tuning.validate(),
            Err(TuningError::EmptyPool { pool: "agent" })
        );
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let tuning: Tuning = toml::from_str(
            r#"
            fixed_dt = 0.02

            [combat]
            shooting_range = 300.0
            "#,
        )
        .expect("parse tuning");

        assert_eq!(tuning.fixed_dt, 0.02);
        assert_eq!(tuning.combat.shooting_range, 300.0);
        assert_eq!(tuning.combat.shoot_cooldown, 0.5);
        assert_eq!(tuning.grid.side, 64);
    }

    #[test]
    fn world_extent_spans_every_tile() {
        assert_eq!(Tuning::default().grid.world_extent(), 2_048.0);
    }
}
