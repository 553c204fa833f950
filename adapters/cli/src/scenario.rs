//! Scenario files: tuning overrides, spawn point placement and map loading.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use glam::Vec2;
use serde::Deserialize;
use skirmish_core::{TileCoord, Tuning};
use skirmish_world::Grid;

const SUPPORTED_SCENARIO_VERSION: u32 = 1;

/// Tile columns of the spawn points placed when a scenario lists none.
const DEFAULT_SPAWN_COLUMNS: [i32; 2] = [16, 48];
const DEFAULT_SPAWN_ROW: i32 = 16;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    version: u32,
    #[serde(default)]
    pub(crate) tuning: Tuning,
    #[serde(default)]
    spawn_points: Vec<SpawnPointEntry>,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpawnPointEntry {
    x: f32,
    y: f32,
    quota: Option<u32>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            version: SUPPORTED_SCENARIO_VERSION,
            tuning: Tuning::default(),
            spawn_points: Vec::new(),
        }
    }
}

impl Scenario {
    /// Loads the scenario at `path`, or the built-in defaults when absent.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid scenario {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let scenario: Self =
            toml::from_str(contents).context("failed to parse scenario toml contents")?;
        if scenario.version != SUPPORTED_SCENARIO_VERSION {
            bail!(
                "unsupported scenario version {}; expected {}",
                scenario.version,
                SUPPORTED_SCENARIO_VERSION
            );
        }
        scenario
            .tuning
            .validate()
            .context("scenario tuning is out of range")?;
        Ok(scenario)
    }

    /// Spawn point centers with their quotas.
    ///
    /// Entries without a quota use `default_quota`. A scenario that lists no
    /// spawn points gets one near each upper corner of the map.
    pub(crate) fn spawn_points(&self, grid: &Grid, default_quota: u32) -> Vec<(Vec2, u32)> {
        if self.spawn_points.is_empty() {
            return DEFAULT_SPAWN_COLUMNS
                .iter()
                .map(|&column| TileCoord::new(column, DEFAULT_SPAWN_ROW))
                .filter(|&tile| grid.contains(tile))
                .map(|tile| (grid.tile_center(tile), default_quota))
                .collect();
        }

        self.spawn_points
            .iter()
            .map(|entry| {
                (
                    Vec2::new(entry.x, entry.y),
                    entry.quota.unwrap_or(default_quota),
                )
            })
            .collect()
    }
}

/// Reads the text map at `path`, or builds an open arena when absent.
pub(crate) fn load_grid(path: Option<&Path>, tuning: &Tuning) -> Result<Grid> {
    let side = tuning.grid.side;
    let tile_size = tuning.grid.tile_size;
    let Some(path) = path else {
        return Grid::open(side, tile_size).context("failed to build open arena");
    };

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read map at {}", path.display()))?;
    Grid::parse(&contents, side, tile_size)
        .with_context(|| format!("failed to parse map {}", path.display()))
}
