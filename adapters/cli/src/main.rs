#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless runner that drives the Skirmish AI against a scripted target.

mod scenario;
mod summary;
mod target;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use scenario::Scenario;
use skirmish_system_simulation::Simulation;
use skirmish_world::query;
use summary::Summary;
use target::ScriptedTarget;
use tracing_subscriber::EnvFilter;

/// Command-line options for a headless run.
#[derive(Debug, Parser)]
#[command(name = "skirmish", version, about = "Runs the Skirmish AI headlessly")]
struct Cli {
    /// Scenario TOML with tuning overrides and spawn points.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Text map with one row per line; an open arena is used when omitted.
    #[arg(long)]
    map: Option<PathBuf>,
    /// Number of fixed steps to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u32,
    /// Seed for wander goals and spawn placement.
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,
    /// Agents fielded by spawn points that do not set their own quota.
    #[arg(long, default_value_t = 5)]
    quota: u32,
    /// Steps between target shots; zero holds fire.
    #[arg(long, default_value_t = 15)]
    fire_every: u32,
    /// Start with refills and respawns paused.
    #[arg(long)]
    no_spawning: bool,
}

/// Entry point for the Skirmish command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let scenario = Scenario::load(cli.config.as_deref())?;
    let grid = scenario::load_grid(cli.map.as_deref(), &scenario.tuning)?;
    let spawn_points = scenario.spawn_points(&grid, cli.quota);
    let extent = grid.world_extent();

    let mut simulation = Simulation::new(grid, scenario.tuning, cli.seed)
        .context("failed to start simulation")?;
    for (position, quota) in spawn_points {
        let _ = simulation.add_spawn_point(position, quota);
    }
    if cli.no_spawning {
        let _ = simulation.set_spawning_enabled(false);
    }

    let script = ScriptedTarget::new(extent, cli.fire_every);
    let summary = run(&mut simulation, &script, cli.ticks);
    println!("{summary}");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(simulation: &mut Simulation, script: &ScriptedTarget, ticks: u32) -> Summary {
    let mut summary = Summary::default();
    let mut observation = None;

    for tick in 0..ticks {
        let world = simulation.world();
        let elapsed = query::elapsed(world).as_secs_f32();
        let input = script.input(tick, elapsed, &query::agent_view(world));
        observation = Some(input.observation);

        let events = simulation.step(&input);
        summary.record_tick(&events);
    }

    let view = query::agent_view(simulation.world());
    let visible = observation.map_or(0, |observer| {
        view.active()
            .filter(|agent| simulation.fov_membership(agent.position, &observer).visible)
            .count() as u32
    });
    summary.record_final(&view, visible);
    tracing::info!(ticks, visible, "headless run finished");
    summary
}
