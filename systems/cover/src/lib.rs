#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Cover-point selection around soft cover tiles.
//!
//! Every soft cover tile near the agent is a cover source. Standing tiles
//! beside a source become candidates when they keep the target inside a band
//! around shooting range and retain a clear firing line; the lowest score
//! wins.

use glam::Vec2;
use skirmish_core::{CombatTuning, TileCoord, TileKind};
use skirmish_system_visibility::{line_of_sight, Blockers};
use skirmish_world::Grid;

/// Orthogonal directions scanned around each source, in priority order.
const DIRECTIONS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// Tiles stepped outward from a source looking for a standing tile. The ring
/// directly around a wall is excluded from pathing, so the second step is
/// usually the first reachable one.
const REACH: i32 = 2;

/// Standing position chosen next to a cover source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoverCandidate {
    /// Tile the agent should move to.
    pub tile: TileCoord,
    /// Soft cover tile the candidate hides behind.
    pub source: TileCoord,
    /// Lower is better.
    pub score: f32,
}

/// Scores candidate firing positions against a target tile.
#[derive(Clone, Debug)]
pub struct CoverSelector {
    combat: CombatTuning,
}

impl CoverSelector {
    /// Creates a selector using the provided combat tuning.
    #[must_use]
    pub fn new(combat: CombatTuning) -> Self {
        Self { combat }
    }

    /// Finds the best cover position for an agent at `agent_position`
    /// engaging a target standing on `target`.
    #[must_use]
    pub fn find_cover(
        &self,
        grid: &Grid,
        agent_position: Vec2,
        target: TileCoord,
    ) -> Option<CoverCandidate> {
        let target_center = grid.tile_center(target);
        let min_range = self.combat.shooting_range * self.combat.cover_band_min;
        let max_range = self.combat.shooting_range * self.combat.cover_band_max;
        let mut best: Option<CoverCandidate> = None;

        for source in grid.tiles_of_kind(TileKind::SoftCover) {
            let source_center = grid.tile_center(source);
            let source_distance = source_center.distance(agent_position);
            if source_distance > self.combat.max_cover_distance {
                continue;
            }

            for (dc, dr) in DIRECTIONS {
                let Some(tile) = standing_tile(grid, source, dc, dr) else {
                    continue;
                };
                let candidate_center = grid.tile_center(tile);
                let target_distance = candidate_center.distance(target_center);
                if target_distance < min_range || target_distance > max_range {
                    continue;
                }
                if !line_of_sight(grid, candidate_center, target_center, Blockers::FIRE) {
                    continue;
                }

                let between = source_between(source_center, candidate_center, target_center);
                let score = score(source_distance, target_distance, between);
                if best.map_or(true, |current| score < current.score) {
                    best = Some(CoverCandidate {
                        tile,
                        source,
                        score,
                    });
                }
            }
        }

        best
    }
}

fn standing_tile(grid: &Grid, source: TileCoord, dc: i32, dr: i32) -> Option<TileCoord> {
    for step in 1..=REACH {
        let tile = source.offset(dc * step, dr * step);
        match grid.tile_at(tile)? {
            TileKind::Open => return Some(tile),
            TileKind::PathExclusion => continue,
            _ => return None,
        }
    }
    None
}

/// The source shields the candidate when it lies on the target's side and
/// nearer than the target.
fn source_between(source: Vec2, candidate: Vec2, target: Vec2) -> bool {
    let to_source = source - candidate;
    let to_target = target - candidate;
    to_source.dot(to_target) > 0.0 && to_source.length() < to_target.length()
}

fn score(source_distance: f32, target_distance: f32, between: bool) -> f32 {
    let score = source_distance + 0.5 * target_distance;
    if between {
        score * 0.5
    } else {
        score
    }
}
