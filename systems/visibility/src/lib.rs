#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Line-of-sight, field-of-view and occlusion queries over the tile grid.

use arrayvec::ArrayVec;
use glam::Vec2;
use skirmish_core::{
    angle, FovTuning, TargetObservation, TileCoord, TileKind, MAX_MASK_RAYS, MIN_MASK_RAYS,
};
use skirmish_world::Grid;

/// Stand-in for the inverse of a zero direction component.
const HUGE_INVERSE: f32 = 1e30;

/// Polygon capacity: observer, one point per ray, closing point.
pub const MASK_CAPACITY: usize = MAX_MASK_RAYS + 2;

/// Tile kinds that interrupt a line-of-sight trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Blockers {
    /// Bulletproof cover blocks the line.
    pub hard_cover: bool,
    /// Opaque walls block the line.
    pub opaque: bool,
}

impl Blockers {
    /// Sight lines: only opaque walls interrupt them.
    pub const SIGHT: Self = Self {
        hard_cover: false,
        opaque: true,
    };

    /// Firing lines: bulletproof cover and opaque walls interrupt them.
    pub const FIRE: Self = Self {
        hard_cover: true,
        opaque: true,
    };

    fn blocks(self, kind: TileKind) -> bool {
        match kind {
            TileKind::HardCover => self.hard_cover,
            TileKind::Opaque => self.opaque,
            _ => false,
        }
    }
}

/// Traces a Bresenham line across the tiles between two world points.
///
/// Both endpoint tiles are tested. Points outside the world never see each
/// other, while two points inside the same tile always do.
#[must_use]
pub fn line_of_sight(grid: &Grid, from: Vec2, to: Vec2, blockers: Blockers) -> bool {
    if !grid.contains_point(from) || !grid.contains_point(to) {
        return false;
    }

    let start = grid.tile_of(from);
    let end = grid.tile_of(to);
    if start == end {
        return true;
    }

    let dx = (end.column() - start.column()).abs();
    let dy = (end.row() - start.row()).abs();
    let step_x = if start.column() < end.column() { 1 } else { -1 };
    let step_y = if start.row() < end.row() { 1 } else { -1 };
    let mut error = dx - dy;
    let mut column = start.column();
    let mut row = start.row();

    loop {
        match grid.tile_at(TileCoord::new(column, row)) {
            None => return false,
            Some(kind) if blockers.blocks(kind) => return false,
            Some(_) => {}
        }

        if column == end.column() && row == end.row() {
            return true;
        }

        let doubled = 2 * error;
        if doubled > -dy {
            error -= dy;
            column += step_x;
        }
        if doubled < dx {
            error += dx;
            row += step_y;
        }
    }
}

/// Slab-method ray/box test returning the entry distance along `direction`.
///
/// Misses, and boxes that start behind the origin, yield `None`.
#[must_use]
pub fn ray_aabb_distance(origin: Vec2, direction: Vec2, min: Vec2, max: Vec2) -> Option<f32> {
    let inverse = Vec2::new(inverse_or_huge(direction.x), inverse_or_huge(direction.y));

    let tx1 = (min.x - origin.x) * inverse.x;
    let tx2 = (max.x - origin.x) * inverse.x;
    let ty1 = (min.y - origin.y) * inverse.y;
    let ty2 = (max.y - origin.y) * inverse.y;

    let entry = tx1.min(tx2).max(ty1.min(ty2));
    let exit = tx1.max(tx2).min(ty1.max(ty2));

    if exit < entry || entry < 0.0 {
        None
    } else {
        Some(entry)
    }
}

fn inverse_or_huge(component: f32) -> f32 {
    if component != 0.0 {
        1.0 / component
    } else if component > 0.0 {
        HUGE_INVERSE
    } else {
        -HUGE_INVERSE
    }
}

/// Distance a ray travels before meeting an opaque wall, capped at `max_range`.
#[must_use]
pub fn visibility_ray_distance(grid: &Grid, origin: Vec2, direction: Vec2, max_range: f32) -> f32 {
    grid.tiles_of_kind(TileKind::Opaque)
        .filter_map(|tile| {
            let (min, max) = grid.tile_bounds(tile);
            ray_aabb_distance(origin, direction, min, max)
        })
        .filter(|distance| *distance > 0.0)
        .fold(max_range, f32::min)
}

/// Outcome of a field-of-view membership query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FovSample {
    /// Whether the point can be seen.
    pub visible: bool,
    /// Opacity to render the point with, `0` when hidden.
    pub alpha: u8,
}

impl FovSample {
    const HIDDEN: Self = Self {
        visible: false,
        alpha: 0,
    };
}

/// Occlusion polygons for the observer's view cone and near circle.
///
/// Each polygon starts at the observer, lists one point per ray and closes
/// back on the observer.
#[derive(Clone, Debug, Default)]
pub struct FovMask {
    /// Forward view cone.
    pub cone: ArrayVec<Vec2, MASK_CAPACITY>,
    /// All-round near circle.
    pub circle: ArrayVec<Vec2, MASK_CAPACITY>,
}

/// Field-of-view queries for a single observer configuration.
#[derive(Clone, Debug)]
pub struct VisibilityEngine {
    fov: FovTuning,
}

impl VisibilityEngine {
    /// Creates an engine using the provided field-of-view tuning.
    #[must_use]
    pub fn new(fov: FovTuning) -> Self {
        Self { fov }
    }

    /// Decides whether `point` is visible to `observer` and how opaque it is.
    ///
    /// The near circle takes precedence over the view cone when both apply.
    #[must_use]
    pub fn fov_membership(
        &self,
        grid: &Grid,
        point: Vec2,
        observer: &TargetObservation,
    ) -> FovSample {
        let distance = point.distance(observer.position);
        let in_circle = distance <= self.fov.near_radius;
        let in_cone = distance <= self.fov.range
            && angle::shortest_turn(
                observer.facing,
                angle::bearing_degrees(observer.position, point),
            )
            .abs()
                <= self.fov.half_angle;

        if !in_circle && !in_cone {
            return FovSample::HIDDEN;
        }
        if !line_of_sight(grid, observer.position, point, Blockers::SIGHT) {
            return FovSample::HIDDEN;
        }

        let alpha = if in_circle {
            fade(distance, self.fov.near_radius, self.fov.near_band)
        } else {
            fade(distance, self.fov.range, self.fov.range_band)
        };
        FovSample {
            visible: true,
            alpha,
        }
    }

    /// Builds the occlusion polygons around `observer`.
    #[must_use]
    pub fn mask(&self, grid: &Grid, observer: &TargetObservation) -> FovMask {
        let rays = self.fov.mask_rays.clamp(MIN_MASK_RAYS, MAX_MASK_RAYS);
        let last = (rays - 1) as f32;
        let mut mask = FovMask::default();

        let cone_start = observer.facing - self.fov.half_angle;
        let cone_step = 2.0 * self.fov.half_angle / last;
        fill_polygon(
            &mut mask.cone,
            grid,
            observer.position,
            (0..rays).map(|ray| cone_start + cone_step * ray as f32),
            self.fov.range,
        );

        let circle_step = 360.0 / last;
        fill_polygon(
            &mut mask.circle,
            grid,
            observer.position,
            (0..rays).map(|ray| circle_step * ray as f32),
            self.fov.near_radius,
        );

        mask
    }
}

fn fill_polygon<I>(
    polygon: &mut ArrayVec<Vec2, MASK_CAPACITY>,
    grid: &Grid,
    origin: Vec2,
    headings: I,
    max_range: f32,
) where
    I: Iterator<Item = f32>,
{
    polygon.push(origin);
    for heading in headings {
        let direction = angle::heading_vector(heading);
        let reach = visibility_ray_distance(grid, origin, direction, max_range);
        polygon.push(origin + direction * reach);
    }
    polygon.push(origin);
}

/// Linear fade from 255 to 0 across the last `band` units before `radius`.
fn fade(distance: f32, radius: f32, band: f32) -> u8 {
    let fade_start = radius - band;
    if distance <= fade_start || band <= 0.0 {
        return u8::MAX;
    }
    let alpha = 255.0 * (radius - distance) / band;
    alpha.clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(obstacles: &[(i32, i32, TileKind)]) -> Grid {
        Grid::with_obstacles(
            64,
            32.0,
            obstacles
                .iter()
                .map(|&(column, row, kind)| (TileCoord::new(column, row), kind)),
        )
        .expect("grid")
    }

    #[test]
    fn identical_points_see_each_other() {
        let grid = grid_with(&[]);
        let point = Vec2::new(100.0, 100.0);
        assert!(line_of_sight(&grid, point, point, Blockers::FIRE));
    }

    #[test]
    fn points_outside_the_world_fail_closed() {
        let grid = grid_with(&[]);
        assert!(!line_of_sight(
            &grid,
            Vec2::new(-1.0, 10.0),
            Vec2::new(100.0, 10.0),
            Blockers::SIGHT
        ));
        assert!(!line_of_sight(
            &grid,
            Vec2::new(10.0, 10.0),
            Vec2::new(10.0, 2_048.0),
            Blockers::SIGHT
        ));
    }

    #[test]
    fn blockers_select_which_walls_interrupt() {
        let from = Vec2::new(16.0, 16.0);
        let to = Vec2::new(336.0, 16.0);

        let opaque = grid_with(&[(5, 0, TileKind::Opaque)]);
        assert!(!line_of_sight(&opaque, from, to, Blockers::SIGHT));

        let hard = grid_with(&[(5, 0, TileKind::HardCover)]);
        assert!(line_of_sight(&hard, from, to, Blockers::SIGHT));
        assert!(!line_of_sight(&hard, from, to, Blockers::FIRE));

        let soft = grid_with(&[(5, 0, TileKind::SoftCover)]);
        assert!(line_of_sight(&soft, from, to, Blockers::FIRE));
    }

    #[test]
    fn endpoints_are_part_of_the_trace() {
        let grid = grid_with(&[(10, 0, TileKind::Opaque)]);
        assert!(!line_of_sight(
            &grid,
            Vec2::new(16.0, 16.0),
            Vec2::new(330.0, 16.0),
            Blockers::SIGHT
        ));
    }

    #[test]
    fn ray_distance_stops_at_first_opaque_wall() {
        let grid = grid_with(&[(5, 0, TileKind::Opaque), (8, 0, TileKind::Opaque)]);
        let origin = Vec2::new(16.0, 16.0);
        assert_eq!(
            visibility_ray_distance(&grid, origin, Vec2::X, 700.0),
            144.0
        );
        assert_eq!(
            visibility_ray_distance(&grid, origin, Vec2::Y, 700.0),
            700.0
        );
        assert_eq!(
            visibility_ray_distance(&grid, origin, Vec2::ZERO, 700.0),
            700.0
        );
    }

    #[test]
    fn ray_ignores_boxes_behind_the_origin() {
        let hit = ray_aabb_distance(
            Vec2::new(50.0, 5.0),
            Vec2::X,
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 10.0),
        );
        assert_eq!(hit, None);
    }

    #[test]
    fn cone_alpha_fades_over_the_outer_band() {
        let grid = grid_with(&[]);
        let engine = VisibilityEngine::new(FovTuning::default());
        let observer = TargetObservation::new(Vec2::new(100.0, 1_000.0), 0.0);

        let near = engine.fov_membership(&grid, Vec2::new(400.0, 1_000.0), &observer);
        assert_eq!(
            near,
            FovSample {
                visible: true,
                alpha: 255,
            }
        );

        let banded = engine.fov_membership(&grid, Vec2::new(775.0, 1_000.0), &observer);
        assert!(banded.visible);
        assert_eq!(banded.alpha, 127);

        let mut previous = u8::MAX;
        for step in 0..=60 {
            let x = 100.0 + 640.0 + step as f32;
            let sample = engine.fov_membership(&grid, Vec2::new(x, 1_000.0), &observer);
            assert!(sample.alpha <= previous);
            previous = sample.alpha;
        }
        assert_eq!(previous, 0);

        let behind = engine.fov_membership(&grid, Vec2::new(50.0, 900.0), &observer);
        assert_eq!(behind, FovSample::HIDDEN);
    }

    #[test]
    fn near_circle_sees_behind_the_observer() {
        let grid = grid_with(&[]);
        let engine = VisibilityEngine::new(FovTuning::default());
        let observer = TargetObservation::new(Vec2::new(500.0, 500.0), 0.0);

        let close = engine.fov_membership(&grid, Vec2::new(460.0, 500.0), &observer);
        assert_eq!(close.alpha, 255);
        let rim = engine.fov_membership(&grid, Vec2::new(441.0, 500.0), &observer);
        assert!(rim.visible);
        assert_eq!(rim.alpha, 127);
    }

    #[test]
    fn opaque_walls_hide_points_in_view() {
        let grid = grid_with(&[(10, 10, TileKind::Opaque)]);
        let engine = VisibilityEngine::new(FovTuning::default());
        let observer = TargetObservation::new(Vec2::new(240.0, 336.0), 0.0);

        let hidden = engine.fov_membership(&grid, Vec2::new(500.0, 336.0), &observer);
        assert_eq!(hidden, FovSample::HIDDEN);
    }

    #[test]
    fn mask_polygons_close_on_the_observer() {
        let grid = grid_with(&[(10, 10, TileKind::Opaque)]);
        let engine = VisibilityEngine::new(FovTuning::default());
        let observer = TargetObservation::new(Vec2::new(240.0, 336.0), 0.0);

        let mask = engine.mask(&grid, &observer);

        assert_eq!(mask.cone.len(), 66);
        assert_eq!(mask.circle.len(), 66);
        assert_eq!(mask.cone.first(), Some(&observer.position));
        assert_eq!(mask.cone.last(), Some(&observer.position));
        for point in mask.circle.iter() {
            assert!(point.distance(observer.position) <= 64.0 + 1e-3);
        }
        let blocked = mask
            .cone
            .iter()
            .skip(1)
            .take(64)
            .map(|point| point.distance(observer.position))
            .fold(f32::MAX, f32::min);
        assert!((blocked - 80.0).abs() < 0.5);
    }
}
