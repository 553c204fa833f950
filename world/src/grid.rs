//! Static tile classification shared by every system.

use glam::Vec2;
use skirmish_core::{TileCoord, TileIndex, TileKind};

/// Offsets of the eight tiles surrounding a tile.
const RING: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Errors reported while decoding a map into a [`Grid`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    /// The requested grid has no tiles.
    #[error("grid side must be at least one tile")]
    EmptyGrid,
    /// A code list does not cover the grid exactly.
    #[error("expected {expected} tile codes, found {found}")]
    WrongCodeCount {
        /// Number of tiles in the grid.
        expected: usize,
        /// Number of codes supplied.
        found: usize,
    },
    /// A numeric tile code is not recognised.
    #[error("unknown tile code {code} at index {index}")]
    UnknownCode {
        /// Row-major index of the offending code.
        index: usize,
        /// Rejected code.
        code: u8,
    },
    /// A text map has the wrong number of rows.
    #[error("expected {expected} map rows, found {found}")]
    WrongRowCount {
        /// Number of rows in the grid.
        expected: usize,
        /// Number of rows supplied.
        found: usize,
    },
    /// A text map row has the wrong number of tiles.
    #[error("map row {row} has {found} tiles, expected {expected}")]
    WrongRowLength {
        /// Zero-based row index.
        row: usize,
        /// Number of columns in the grid.
        expected: usize,
        /// Number of tiles supplied.
        found: usize,
    },
    /// A text map contains a symbol that is not a tile.
    #[error("unknown map symbol {symbol:?} at row {row}, column {column}")]
    UnknownSymbol {
        /// Zero-based row index.
        row: usize,
        /// Zero-based column index.
        column: usize,
        /// Rejected character.
        symbol: char,
    },
}

/// Square tile grid that classifies every tile once at load time.
///
/// Open tiles that touch an obstacle on any of their eight sides are
/// reclassified as [`TileKind::PathExclusion`] so planned paths keep a one
/// tile clearance around walls. The grid never changes afterwards.
#[derive(Clone, Debug)]
pub struct Grid {
    side: u32,
    tile_size: f32,
    tiles: Vec<TileKind>,
}

impl Grid {
    /// Creates a grid in which every tile is open.
    pub fn open(side: u32, tile_size: f32) -> Result<Self, MapError> {
        Self::from_kinds(side, tile_size, vec![TileKind::Open; tile_count(side)?])
    }

    /// Decodes a row-major list of numeric tile codes (`0..=4`).
    pub fn from_codes(side: u32, tile_size: f32, codes: &[u8]) -> Result<Self, MapError> {
        let expected = tile_count(side)?;
        if codes.len() != expected {
            return Err(MapError::WrongCodeCount {
                expected,
                found: codes.len(),
            });
        }

        let mut tiles = Vec::with_capacity(expected);
        for (index, &code) in codes.iter().enumerate() {
            let kind = TileKind::from_code(code).ok_or(MapError::UnknownCode { index, code })?;
            tiles.push(kind);
        }
        Self::from_kinds(side, tile_size, tiles)
    }

    /// Parses a text map with one line per row.
    ///
    /// `.` is open floor, `s` soft cover, `b` bulletproof cover and `#` an
    /// opaque wall; the digits `0`-`4` are accepted as numeric codes. Trailing
    /// whitespace and blank lines are ignored.
    pub fn parse(text: &str, side: u32, tile_size: f32) -> Result<Self, MapError> {
        let expected = tile_count(side)?;
        let width = side as usize;
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect();
        if rows.len() != width {
            return Err(MapError::WrongRowCount {
                expected: width,
                found: rows.len(),
            });
        }

        let mut tiles = Vec::with_capacity(expected);
        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(MapError::WrongRowLength {
                    row,
                    expected: width,
                    found,
                });
            }
            for (column, symbol) in line.chars().enumerate() {
                let kind = decode_symbol(symbol).ok_or(MapError::UnknownSymbol {
                    row,
                    column,
                    symbol,
                })?;
                tiles.push(kind);
            }
        }
        Self::from_kinds(side, tile_size, tiles)
    }

    /// Builds a grid from an open floor plus the listed obstacles.
    ///
    /// Obstacles outside the grid are ignored.
    pub fn with_obstacles<I>(side: u32, tile_size: f32, obstacles: I) -> Result<Self, MapError>
    where
        I: IntoIterator<Item = (TileCoord, TileKind)>,
    {
        let mut tiles = vec![TileKind::Open; tile_count(side)?];
        for (tile, kind) in obstacles {
            if let Some(index) = raw_index(side, tile) {
                tiles[index] = kind;
            }
        }
        Self::from_kinds(side, tile_size, tiles)
    }

    fn from_kinds(side: u32, tile_size: f32, tiles: Vec<TileKind>) -> Result<Self, MapError> {
        let mut grid = Self {
            side,
            tile_size,
            tiles,
        };
        grid.mark_path_exclusion();
        Ok(grid)
    }

    fn mark_path_exclusion(&mut self) {
        let side = self.side as i32;
        for row in 0..side {
            for column in 0..side {
                let tile = TileCoord::new(column, row);
                let Some(index) = raw_index(self.side, tile) else {
                    continue;
                };
                if self.tiles[index] != TileKind::Open {
                    continue;
                }
                let hugs_obstacle = RING.iter().any(|&(dc, dr)| {
                    self.tile_at(tile.offset(dc, dr))
                        .is_some_and(TileKind::is_obstacle)
                });
                if hugs_obstacle {
                    self.tiles[index] = TileKind::PathExclusion;
                }
            }
        }
    }

    /// Number of tiles along each side.
    #[must_use]
    pub const fn side(&self) -> u32 {
        self.side
    }

    /// Edge length of a tile in world units.
    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Edge length of the grid in world units.
    #[must_use]
    pub fn world_extent(&self) -> f32 {
        self.side as f32 * self.tile_size
    }

    /// Total number of tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Reports whether the grid holds no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Reports whether the tile lies inside the grid.
    #[must_use]
    pub fn contains(&self, tile: TileCoord) -> bool {
        raw_index(self.side, tile).is_some()
    }

    /// Row-major index of the tile, if it lies inside the grid.
    #[must_use]
    pub fn index(&self, tile: TileCoord) -> Option<TileIndex> {
        raw_index(self.side, tile).map(|index| TileIndex::new(index as u32))
    }

    /// Tile addressed by a row-major index.
    #[must_use]
    pub fn coord(&self, index: TileIndex) -> TileCoord {
        let side = self.side.max(1);
        TileCoord::new((index.get() % side) as i32, (index.get() / side) as i32)
    }

    /// Classification of the tile, or `None` outside the grid.
    #[must_use]
    pub fn tile_at(&self, tile: TileCoord) -> Option<TileKind> {
        raw_index(self.side, tile).map(|index| self.tiles[index])
    }

    /// Reports whether planned paths may cross the tile.
    #[must_use]
    pub fn is_passable(&self, tile: TileCoord) -> bool {
        self.tile_at(tile) == Some(TileKind::Open)
    }

    /// Reports whether the world point lies inside the grid.
    #[must_use]
    pub fn contains_point(&self, point: Vec2) -> bool {
        let extent = self.world_extent();
        point.x >= 0.0 && point.y >= 0.0 && point.x < extent && point.y < extent
    }

    /// Tile containing the world point. The result may lie outside the grid.
    #[must_use]
    pub fn tile_of(&self, point: Vec2) -> TileCoord {
        TileCoord::new(
            (point.x / self.tile_size).floor() as i32,
            (point.y / self.tile_size).floor() as i32,
        )
    }

    /// Center of the tile in world units.
    #[must_use]
    pub fn tile_center(&self, tile: TileCoord) -> Vec2 {
        let half = self.tile_size / 2.0;
        Vec2::new(
            tile.column() as f32 * self.tile_size + half,
            tile.row() as f32 * self.tile_size + half,
        )
    }

    /// Minimum and maximum corners of the tile in world units.
    #[must_use]
    pub fn tile_bounds(&self, tile: TileCoord) -> (Vec2, Vec2) {
        let min = Vec2::new(
            tile.column() as f32 * self.tile_size,
            tile.row() as f32 * self.tile_size,
        );
        (min, min + Vec2::splat(self.tile_size))
    }

    /// Iterates over every tile of the requested kind in row-major order.
    pub fn tiles_of_kind(&self, kind: TileKind) -> impl Iterator<Item = TileCoord> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter(move |(_, tile)| **tile == kind)
            .map(|(index, _)| self.coord(TileIndex::new(index as u32)))
    }

    /// Iterates over every wall tile in row-major order.
    pub fn obstacles(&self) -> impl Iterator<Item = (TileCoord, TileKind)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, tile)| tile.is_obstacle())
            .map(|(index, tile)| (self.coord(TileIndex::new(index as u32)), *tile))
    }
}

fn tile_count(side: u32) -> Result<usize, MapError> {
    if side == 0 {
        return Err(MapError::EmptyGrid);
    }
    let side = side as usize;
    Ok(side * side)
}

fn raw_index(side: u32, tile: TileCoord) -> Option<usize> {
    let column = u32::try_from(tile.column()).ok()?;
    let row = u32::try_from(tile.row()).ok()?;
    if column >= side || row >= side {
        return None;
    }
    Some(row as usize * side as usize + column as usize)
}

fn decode_symbol(symbol: char) -> Option<TileKind> {
    match symbol {
        '.' => Some(TileKind::Open),
        's' => Some(TileKind::SoftCover),
        'b' => Some(TileKind::HardCover),
        '#' => Some(TileKind::Opaque),
        digit => digit
            .to_digit(10)
            .and_then(|code| u8::try_from(code).ok())
            .and_then(TileKind::from_code),
    }
}
