//! Tile collision applied after locomotion proposes a displacement.

use glam::Vec2;
use skirmish_core::{TileCoord, TileKind};

use crate::Grid;

/// Resolves a proposed displacement against static geometry.
pub trait CollisionResolver {
    /// Returns the center reached by a square body of `half_extent` that
    /// starts at `position` and tries to move by `displacement`.
    fn resolve(&self, grid: &Grid, position: Vec2, half_extent: f32, displacement: Vec2) -> Vec2;
}

/// Axis-separated resolver that refuses to overlap any wall tile.
///
/// The horizontal component is applied first and dropped if the body would
/// overlap a soft, hard or opaque tile; the vertical component follows the
/// same rule. The result is clamped to the world bounds.
#[derive(Clone, Copy, Debug, Default)]
pub struct TileCollision;

impl CollisionResolver for TileCollision {
    fn resolve(&self, grid: &Grid, position: Vec2, half_extent: f32, displacement: Vec2) -> Vec2 {
        let mut resolved = position;

        let horizontal = Vec2::new(resolved.x + displacement.x, resolved.y);
        if !overlaps_wall(grid, horizontal, half_extent) {
            resolved = horizontal;
        }

        let vertical = Vec2::new(resolved.x, resolved.y + displacement.y);
        if !overlaps_wall(grid, vertical, half_extent) {
            resolved = vertical;
        }

        let extent = grid.world_extent();
        let low = half_extent.min(extent / 2.0);
        let high = (extent - half_extent).max(low);
        resolved.clamp(Vec2::splat(low), Vec2::splat(high))
    }
}

fn overlaps_wall(grid: &Grid, center: Vec2, half_extent: f32) -> bool {
    let tile_size = grid.tile_size();
    let min = center - Vec2::splat(half_extent);
    let max = center + Vec2::splat(half_extent);

    let first_column = (min.x / tile_size).floor() as i32;
    let first_row = (min.y / tile_size).floor() as i32;
    let last_column = (max.x / tile_size).ceil() as i32 - 1;
    let last_row = (max.y / tile_size).ceil() as i32 - 1;

    for row in first_row..=last_row {
        for column in first_column..=last_column {
            let blocked = grid
                .tile_at(TileCoord::new(column, row))
                .is_some_and(TileKind::is_obstacle);
            if blocked {
                return true;
            }
        }
    }
    false
}
