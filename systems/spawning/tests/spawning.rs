use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use skirmish_core::{AgentId, Command, Event, SpawnPointId, Tuning};
use skirmish_system_spawning::Spawning;
use skirmish_world::{self as world, query, Grid, World};

const TARGET: Vec2 = Vec2::new(1_800.0, 1_800.0);

fn new_world(pool_capacity: usize) -> World {
    let mut tuning = Tuning::default();
    tuning.agent.pool_capacity = pool_capacity;
    World::new(Grid::open(64, 32.0).expect("grid"), tuning)
}

fn configure(world: &mut World, quota: u32) {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::ConfigureSpawnPoint {
            position: Vec2::new(512.0, 512.0),
            quota,
        },
        &mut events,
    );
}

/// Applies one tick and runs the spawning system against the resulting
/// events, returning the commands it produced.
fn step(
    world: &mut World,
    spawning: &mut Spawning,
    rng: &mut ChaCha8Rng,
    dt: Duration,
) -> Vec<Command> {
    let mut events = Vec::new();
    world::apply(world, Command::Tick { dt }, &mut events);

    let spawn_points = query::spawn_points(world);
    let mut commands = Vec::new();
    spawning.handle(
        &events,
        query::spawning_enabled(world),
        &spawn_points,
        query::grid(world),
        TARGET,
        rng,
        &mut commands,
    );

    for command in commands.clone() {
        let mut generated = Vec::new();
        world::apply(world, command, &mut generated);
    }
    commands
}

fn spawn_count(commands: &[Command]) -> usize {
    commands
        .iter()
        .filter(|command| matches!(command, Command::SpawnAgent { .. }))
        .count()
}

#[test]
fn first_tick_fills_the_quota_and_restarts_the_timer() {
    let mut world = new_world(8);
    configure(&mut world, 5);
    let mut spawning = Spawning::new(query::tuning(&world));
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let commands = step(&mut world, &mut spawning, &mut rng, Duration::from_millis(16));

    assert_eq!(spawn_count(&commands), 5);
    assert_eq!(
        commands.last(),
        Some(&Command::ResetSpawnTimer {
            spawn_point: SpawnPointId::new(0),
        })
    );
    let point = query::spawn_points(&world)[0];
    assert_eq!(point.spawned, 5);
    assert_eq!(point.refill_in, 10.0);
    assert_eq!(query::agents(&world).active_count(), 5);

    for command in &commands {
        if let Command::SpawnAgent { facing, .. } = command {
            assert!((0.0..360.0).contains(facing));
            assert_eq!(facing.fract(), 0.0);
        }
    }

    let later = step(&mut world, &mut spawning, &mut rng, Duration::from_secs(11));
    assert!(later.is_empty(), "a full spawn point never refills");
}

#[test]
fn paused_spawning_emits_nothing() {
    let mut world = new_world(8);
    configure(&mut world, 3);
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::SetSpawningEnabled { enabled: false },
        &mut events,
    );
    let mut spawning = Spawning::new(query::tuning(&world));
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let commands = step(&mut world, &mut spawning, &mut rng, Duration::from_secs(1));

    assert!(commands.is_empty());
    assert_eq!(query::agents(&world).active_count(), 0);
}

#[test]
fn killed_agents_respawn_after_the_delay() {
    let mut world = new_world(2);
    configure(&mut world, 1);
    let mut spawning = Spawning::new(query::tuning(&world));
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let _ = step(&mut world, &mut spawning, &mut rng, Duration::from_millis(16));

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::DamageAgent {
            agent: AgentId::new(0),
            amount: 100.0,
        },
        &mut events,
    );
    assert_eq!(query::agents(&world).active_count(), 0);

    let early = step(&mut world, &mut spawning, &mut rng, Duration::from_secs(9));
    assert!(early.is_empty());

    let due = step(&mut world, &mut spawning, &mut rng, Duration::from_secs(2));
    assert_eq!(due.len(), 1);
    assert!(matches!(
        due[0],
        Command::RespawnAgent {
            agent,
            ..
        } if agent == AgentId::new(0)
    ));
    let agent = query::agents(&world).get(AgentId::new(0)).expect("slot");
    assert!(agent.active);
    assert_eq!(agent.health, 50.0);
    assert!(agent.position.distance(Vec2::new(512.0, 512.0)) <= 200.0);
}

#[test]
fn deterministic_replay_produces_identical_sequence() {
    let first = replay(0x4d59_5df4_d0f3_3173);
    let second = replay(0x4d59_5df4_d0f3_3173);

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert_eq!(first.spawns.len(), 4);
}

fn replay(seed: u64) -> ReplayOutcome {
    let mut world = new_world(4);
    configure(&mut world, 4);
    let mut spawning = Spawning::new(query::tuning(&world));
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut spawns = Vec::new();

    for _ in 0..30 {
        for command in step(&mut world, &mut spawning, &mut rng, Duration::from_millis(16)) {
            if let Command::SpawnAgent {
                position, facing, ..
            } = command
            {
                spawns.push(SpawnRecord {
                    x_bits: position.x.to_bits(),
                    y_bits: position.y.to_bits(),
                    facing_bits: facing.to_bits(),
                });
            }
        }
    }

    ReplayOutcome { spawns }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    spawns: Vec<SpawnRecord>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct SpawnRecord {
    x_bits: u32,
    y_bits: u32,
    facing_bits: u32,
}

#[test]
fn respawn_events_for_unknown_points_are_ignored() {
    let grid = Grid::open(64, 32.0).expect("grid");
    let mut spawning = Spawning::new(&Tuning::default());
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut commands = Vec::new();

    spawning.handle(
        &[Event::RespawnDue {
            agent: AgentId::new(3),
            spawn_point: SpawnPointId::new(7),
        }],
        true,
        &[],
        &grid,
        TARGET,
        &mut rng,
        &mut commands,
    );

    assert!(commands.is_empty());
}
