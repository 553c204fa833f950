#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic A* planner producing tile paths for a single agent.
//!
//! The planner owns dense per-tile scratch tables sized to the grid and reuses
//! them for every search, so planning never allocates once constructed.

use glam::Vec2;
use skirmish_core::{TileCoord, TileIndex};
use skirmish_world::{Grid, PathBuffer};

const STRAIGHT_COST: i32 = 10;
const DIAGONAL_COST: i32 = 14;
const NO_PARENT: u32 = u32::MAX;

/// Neighbor order: orthogonal moves first, then diagonals.
const STEPS: [(i32, i32, i32); 8] = [
    (0, 1, STRAIGHT_COST),
    (1, 0, STRAIGHT_COST),
    (0, -1, STRAIGHT_COST),
    (-1, 0, STRAIGHT_COST),
    (1, 1, DIAGONAL_COST),
    (1, -1, DIAGONAL_COST),
    (-1, 1, DIAGONAL_COST),
    (-1, -1, DIAGONAL_COST),
];

/// Result of a single path search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The goal was expanded and the path buffer holds the route.
    Found,
    /// The start or goal tile is not passable.
    Blocked,
    /// Every reachable tile was expanded without meeting the goal.
    Unreachable,
    /// The iteration cap was reached before the goal was expanded.
    Truncated,
}

impl SearchOutcome {
    /// Reports whether the search produced a route.
    #[must_use]
    pub const fn is_found(self) -> bool {
        matches!(self, Self::Found)
    }
}

/// Octile-style distance estimate with weights (10, 6).
#[must_use]
pub fn heuristic(from: TileCoord, to: TileCoord) -> i32 {
    let dx = (from.column() - to.column()).abs();
    let dy = (from.row() - to.row()).abs();
    STRAIGHT_COST * (dx + dy) + (DIAGONAL_COST - 2 * STRAIGHT_COST) * dx.min(dy)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TileState {
    Unseen,
    Open,
    Closed,
}

#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    tile: u32,
    f: i32,
}

/// Reusable A* workspace bound to a grid size.
#[derive(Debug)]
pub struct PathPlanner {
    side: u32,
    max_iterations: u32,
    open: Vec<OpenEntry>,
    open_slot: Vec<u32>,
    state: Vec<TileState>,
    cost: Vec<i32>,
    parent: Vec<u32>,
}

impl PathPlanner {
    /// Allocates scratch tables for the provided grid.
    #[must_use]
    pub fn new(grid: &Grid, max_iterations: u32) -> Self {
        let tiles = grid.len();
        Self {
            side: grid.side(),
            max_iterations,
            open: Vec::with_capacity(tiles),
            open_slot: vec![0; tiles],
            state: vec![TileState::Unseen; tiles],
            cost: vec![0; tiles],
            parent: vec![NO_PARENT; tiles],
        }
    }

    /// Plans from the tile under `start` to `target`, writing into `path`.
    ///
    /// The agent's current tile is not part of the route; the final waypoint
    /// is `target`. Any failure leaves `path` empty.
    pub fn find_path(
        &mut self,
        grid: &Grid,
        start: Vec2,
        target: TileCoord,
        path: &mut PathBuffer,
    ) -> SearchOutcome {
        self.find_path_from(grid, grid.tile_of(start), target, path)
    }

    /// Plans between two tiles, writing into `path`.
    pub fn find_path_from(
        &mut self,
        grid: &Grid,
        start: TileCoord,
        target: TileCoord,
        path: &mut PathBuffer,
    ) -> SearchOutcome {
        path.clear();
        if grid.side() != self.side {
            *self = Self::new(grid, self.max_iterations);
        }

        let (Some(start_index), Some(goal_index)) = (grid.index(start), grid.index(target)) else {
            return SearchOutcome::Blocked;
        };
        if !grid.is_passable(start) || !grid.is_passable(target) {
            return SearchOutcome::Blocked;
        }

        self.reset();
        self.push_open(start_index.get(), 0, heuristic(start, target), NO_PARENT);

        let mut iterations = 0;
        while !self.open.is_empty() && iterations < self.max_iterations {
            iterations += 1;

            let current = self.pop_best();
            if current == goal_index.get() {
                path.load_reversed(ParentWalk {
                    parents: &self.parent,
                    current,
                    side: self.side,
                });
                return SearchOutcome::Found;
            }

            self.expand(grid, current, target);
        }

        if self.open.is_empty() {
            SearchOutcome::Unreachable
        } else {
            tracing::debug!(
                iterations,
                column = target.column(),
                row = target.row(),
                "path search truncated"
            );
            SearchOutcome::Truncated
        }
    }

    fn reset(&mut self) {
        self.open.clear();
        self.state.fill(TileState::Unseen);
        self.parent.fill(NO_PARENT);
    }

    fn push_open(&mut self, tile: u32, cost: i32, estimate: i32, parent: u32) {
        let index = tile as usize;
        self.state[index] = TileState::Open;
        self.cost[index] = cost;
        self.parent[index] = parent;
        self.open_slot[index] = self.open.len() as u32;
        self.open.push(OpenEntry {
            tile,
            f: cost + estimate,
        });
    }

    /// Removes the lowest-f entry; the first one wins ties and the last entry
    /// fills the hole.
    fn pop_best(&mut self) -> u32 {
        let mut best = 0;
        for (slot, entry) in self.open.iter().enumerate().skip(1) {
            if entry.f < self.open[best].f {
                best = slot;
            }
        }

        let entry = self.open.swap_remove(best);
        if let Some(moved) = self.open.get(best) {
            self.open_slot[moved.tile as usize] = best as u32;
        }
        self.state[entry.tile as usize] = TileState::Closed;
        entry.tile
    }

    fn expand(&mut self, grid: &Grid, current: u32, target: TileCoord) {
        let tile = grid.coord(TileIndex::new(current));
        let base_cost = self.cost[current as usize];

        for &(dc, dr, step_cost) in &STEPS {
            let neighbor = tile.offset(dc, dr);
            if !grid.is_passable(neighbor) {
                continue;
            }
            let diagonal = dc != 0 && dr != 0;
            if diagonal
                && (!grid.is_passable(tile.offset(dc, 0)) || !grid.is_passable(tile.offset(0, dr)))
            {
                continue;
            }
            let Some(neighbor_index) = grid.index(neighbor) else {
                continue;
            };
            let index = neighbor_index.get() as usize;
            let cost = base_cost + step_cost;

            match self.state[index] {
                TileState::Closed => {}
                TileState::Open => {
                    if cost < self.cost[index] {
                        let slot = self.open_slot[index] as usize;
                        self.cost[index] = cost;
                        self.parent[index] = current;
                        self.open[slot].f = cost + heuristic(neighbor, target);
                    }
                }
                TileState::Unseen => {
                    // The open set never outgrows the grid; further nodes are dropped.
                    if self.open.len() < self.state.len() {
                        self.push_open(
                            neighbor_index.get(),
                            cost,
                            heuristic(neighbor, target),
                            current,
                        );
                    }
                }
            }
        }
    }
}

/// Walks parent links from the goal back to, but excluding, the start.
struct ParentWalk<'a> {
    parents: &'a [u32],
    current: u32,
    side: u32,
}

impl Iterator for ParentWalk<'_> {
    type Item = TileCoord;

    fn next(&mut self) -> Option<TileCoord> {
        let parent = *self.parents.get(self.current as usize)?;
        if parent == NO_PARENT {
            return None;
        }
        let tile = TileCoord::new(
            (self.current % self.side) as i32,
            (self.current / self.side) as i32,
        );
        self.current = parent;
        Some(tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::TileKind;

    fn buffer(grid: &Grid) -> PathBuffer {
        PathBuffer::with_capacity(grid.len())
    }

    #[test]
    fn heuristic_prefers_diagonals() {
        let origin = TileCoord::new(0, 0);
        assert_eq!(heuristic(origin, TileCoord::new(3, 0)), 30);
        assert_eq!(heuristic(origin, TileCoord::new(3, 3)), 42);
        assert_eq!(heuristic(origin, TileCoord::new(-2, 5)), 58);
    }

    #[test]
    fn straight_corridor_excludes_start_and_ends_at_goal() {
        let grid = Grid::open(8, 32.0).expect("grid");
        let mut planner = PathPlanner::new(&grid, 1_000);
        let mut path = buffer(&grid);

        let outcome =
            planner.find_path_from(&grid, TileCoord::new(1, 1), TileCoord::new(4, 1), &mut path);

        assert_eq!(outcome, SearchOutcome::Found);
        let tiles: Vec<_> = path.iter().collect();
        assert_eq!(
            tiles,
            vec![
                TileCoord::new(2, 1),
                TileCoord::new(3, 1),
                TileCoord::new(4, 1)
            ]
        );
    }

    #[test]
    fn start_on_goal_yields_empty_path() {
        let grid = Grid::open(8, 32.0).expect("grid");
        let mut planner = PathPlanner::new(&grid, 1_000);
        let mut path = buffer(&grid);

        let outcome =
            planner.find_path_from(&grid, TileCoord::new(3, 3), TileCoord::new(3, 3), &mut path);

        assert_eq!(outcome, SearchOutcome::Found);
        assert!(path.is_empty());
    }

    #[test]
    fn impassable_goal_is_rejected() {
        let grid = Grid::with_obstacles(8, 32.0, [(TileCoord::new(5, 5), TileKind::Opaque)])
            .expect("grid");
        let mut planner = PathPlanner::new(&grid, 1_000);
        let mut path = buffer(&grid);
        path.load_reversed([TileCoord::new(0, 0)]);

        for goal in [
            TileCoord::new(5, 5),
            TileCoord::new(4, 4),
            TileCoord::new(-1, 0),
        ] {
            let outcome = planner.find_path_from(&grid, TileCoord::new(0, 0), goal, &mut path);
            assert_eq!(outcome, SearchOutcome::Blocked);
            assert!(path.is_empty());
        }
    }

    #[test]
    fn diagonals_never_cut_corners() {
        // The exclusion ring around (3,3) blocks tiles 2..=4 in both axes.
        let grid = Grid::with_obstacles(9, 32.0, [(TileCoord::new(3, 3), TileKind::SoftCover)])
            .expect("grid");
        let mut planner = PathPlanner::new(&grid, 1_000);
        let mut path = buffer(&grid);

        let outcome =
            planner.find_path_from(&grid, TileCoord::new(1, 1), TileCoord::new(5, 5), &mut path);

        assert_eq!(outcome, SearchOutcome::Found);
        let mut previous = TileCoord::new(1, 1);
        for tile in path.iter() {
            assert!(grid.is_passable(tile));
            let dc = tile.column() - previous.column();
            let dr = tile.row() - previous.row();
            assert!(dc.abs() <= 1 && dr.abs() <= 1);
            if dc != 0 && dr != 0 {
                assert!(grid.is_passable(previous.offset(dc, 0)));
                assert!(grid.is_passable(previous.offset(0, dr)));
            }
            previous = tile;
        }
        assert_eq!(previous, TileCoord::new(5, 5));
    }

    #[test]
    fn walled_off_goal_is_unreachable() {
        let wall: Vec<_> = (0..8)
            .map(|row| (TileCoord::new(4, row), TileKind::Opaque))
            .collect();
        let grid = Grid::with_obstacles(8, 32.0, wall).expect("grid");
        let mut planner = PathPlanner::new(&grid, 1_000);
        let mut path = buffer(&grid);

        let outcome =
            planner.find_path_from(&grid, TileCoord::new(1, 1), TileCoord::new(7, 1), &mut path);

        assert_eq!(outcome, SearchOutcome::Unreachable);
        assert!(path.is_empty());
    }

    #[test]
    fn iteration_cap_truncates_long_searches() {
        let grid = Grid::open(64, 32.0).expect("grid");
        let mut planner = PathPlanner::new(&grid, 5);
        let mut path = buffer(&grid);

        let outcome =
            planner.find_path_from(&grid, TileCoord::new(0, 0), TileCoord::new(60, 60), &mut path);

        assert_eq!(outcome, SearchOutcome::Truncated);
        assert!(path.is_empty());
    }

    #[test]
    fn world_start_maps_to_its_tile() {
        let grid = Grid::open(8, 32.0).expect("grid");
        let mut planner = PathPlanner::new(&grid, 1_000);
        let mut path = buffer(&grid);

        let outcome = planner.find_path(
            &grid,
            Vec2::new(40.0, 40.0),
            TileCoord::new(1, 3),
            &mut path,
        );

        assert!(outcome.is_found());
        assert_eq!(path.next_waypoint(), Some(TileCoord::new(1, 2)));
        assert_eq!(path.goal(), Some(TileCoord::new(1, 3)));
    }
}
