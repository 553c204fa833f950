use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use skirmish_core::{
    AgentId, BehaviorState, Command, Event, SpawnPointId, TargetObservation, TileCoord, TileKind,
    Tuning,
};
use skirmish_system_behavior::Behavior;
use skirmish_world::{self as world, control, query, Grid, World};

fn world_with_agent(grid: Grid, tuning: Tuning, tile: TileCoord, facing: f32) -> World {
    let position = grid.tile_center(tile);
    let mut world = World::new(grid, tuning);
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureSpawnPoint { position, quota: 1 },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::SpawnAgent {
            spawn_point: SpawnPointId::new(0),
            position,
            facing,
        },
        &mut events,
    );
    world
}

fn small_pool() -> Tuning {
    let mut tuning = Tuning::default();
    tuning.agent.pool_capacity = 4;
    tuning
}

fn tick(world: &mut World, behavior: &mut Behavior, target: &TargetObservation) -> Vec<Event> {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
    let mut events = Vec::new();
    let (grid, agents) = control::grid_and_agents(world);
    behavior.handle(grid, agents, target, &mut rng, &mut events);
    events
}

fn agent(world: &World) -> &skirmish_world::Agent {
    query::agents(world).get(AgentId::new(0)).expect("slot")
}

#[test]
fn detected_target_in_range_without_cover_is_shot_at() {
    let grid = Grid::open(64, 32.0).expect("grid");
    let mut world = world_with_agent(grid, small_pool(), TileCoord::new(10, 10), 0.0);
    let mut behavior = Behavior::new(query::grid(&world), query::tuning(&world));
    let origin = agent(&world).position;
    let target = TargetObservation::new(origin + Vec2::new(200.0, 0.0), 180.0);

    let events = tick(&mut world, &mut behavior, &target);

    let agent = agent(&world);
    assert_eq!(agent.state, BehaviorState::Shoot);
    assert_eq!(agent.path.len(), 0);
    assert!(!agent.in_cover);
    assert_eq!(agent.timers.decision, 0.0);
    assert_eq!(
        events,
        vec![
            Event::AgentStateChanged {
                agent: AgentId::new(0),
                from: BehaviorState::Free,
                to: BehaviorState::Shoot,
            },
            Event::ProjectileRequested {
                agent: AgentId::new(0),
                origin,
                facing: 0.0,
            },
        ]
    );
}

#[test]
fn losing_the_target_while_chasing_starts_a_search() {
    let grid = Grid::open(64, 32.0).expect("grid");
    let mut world = world_with_agent(grid, small_pool(), TileCoord::new(20, 20), 0.0);
    let mut behavior = Behavior::new(query::grid(&world), query::tuning(&world));
    {
        let (_, agents) = control::grid_and_agents(&mut world);
        let agent = agents.get_mut(AgentId::new(0)).expect("slot");
        agent.state = BehaviorState::Chase;
        agent.last_known = Some(TileCoord::new(5, 5));
    }
    let far = query::grid(&world).tile_center(TileCoord::new(60, 60));

    let events = tick(&mut world, &mut behavior, &TargetObservation::new(far, 0.0));

    let agent = agent(&world);
    assert_eq!(agent.state, BehaviorState::Searching);
    assert_eq!(agent.timers.search, 5.0);
    assert_eq!(agent.path.goal(), Some(TileCoord::new(5, 5)));
    assert!((agent.look_around_base + 135.0).abs() < 1e-3);
    assert!(events.contains(&Event::AgentStateChanged {
        agent: AgentId::new(0),
        from: BehaviorState::Chase,
        to: BehaviorState::Searching,
    }));
}

#[test]
fn opaque_wall_breaks_detection() {
    let walls: Vec<_> = (15..26)
        .map(|row| (TileCoord::new(14, row), TileKind::Opaque))
        .collect();
    let grid = Grid::with_obstacles(64, 32.0, walls).expect("grid");
    let mut tuning = small_pool();
    tuning.perception.wander_chance = 0.0;
    let mut world = world_with_agent(grid, tuning, TileCoord::new(10, 20), 0.0);
    let mut behavior = Behavior::new(query::grid(&world), query::tuning(&world));
    let target = query::grid(&world).tile_center(TileCoord::new(18, 20));

    let _ = tick(&mut world, &mut behavior, &TargetObservation::new(target, 180.0));

    let agent = agent(&world);
    assert_eq!(agent.state, BehaviorState::Free);
    assert_eq!(agent.last_known, None);
}

#[test]
fn nearby_soft_cover_is_preferred_over_open_ground() {
    let grid = Grid::with_obstacles(64, 32.0, [(TileCoord::new(20, 20), TileKind::SoftCover)])
        .expect("grid");
    let mut world = world_with_agent(grid, small_pool(), TileCoord::new(20, 24), 90.0);
    let mut behavior = Behavior::new(query::grid(&world), query::tuning(&world));
    let target = query::grid(&world).tile_center(TileCoord::new(20, 32));

    let events = tick(&mut world, &mut behavior, &TargetObservation::new(target, -90.0));

    let agent = agent(&world);
    assert_eq!(agent.state, BehaviorState::TakeCover);
    assert!(agent.in_cover);
    assert_eq!(agent.path.goal(), Some(TileCoord::new(22, 20)));
    assert_eq!(agent.last_known, Some(TileCoord::new(20, 32)));
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::ProjectileRequested { .. })));
}

#[test]
fn distant_target_in_view_is_chased() {
    let grid = Grid::open(64, 32.0).expect("grid");
    let mut world = world_with_agent(grid, small_pool(), TileCoord::new(10, 10), 0.0);
    let mut behavior = Behavior::new(query::grid(&world), query::tuning(&world));
    let target = query::grid(&world).tile_center(TileCoord::new(25, 10));

    let _ = tick(&mut world, &mut behavior, &TargetObservation::new(target, 180.0));

    let agent = agent(&world);
    assert_eq!(agent.state, BehaviorState::Chase);
    assert_eq!(agent.path.goal(), Some(TileCoord::new(25, 10)));
    assert_eq!(agent.path.next_waypoint(), Some(TileCoord::new(11, 10)));
}

#[test]
fn expired_search_returns_to_free() {
    let grid = Grid::open(64, 32.0).expect("grid");
    let mut world = world_with_agent(grid, small_pool(), TileCoord::new(20, 20), 0.0);
    let mut behavior = Behavior::new(query::grid(&world), query::tuning(&world));
    {
        let (_, agents) = control::grid_and_agents(&mut world);
        let agent = agents.get_mut(AgentId::new(0)).expect("slot");
        agent.state = BehaviorState::Searching;
        agent.timers.search = 0.01;
        agent.last_known = Some(TileCoord::new(5, 5));
        agent.velocity = Vec2::new(3.0, 0.0);
    }
    let far = query::grid(&world).tile_center(TileCoord::new(60, 60));

    let events = tick(&mut world, &mut behavior, &TargetObservation::new(far, 0.0));

    let agent = agent(&world);
    assert_eq!(agent.state, BehaviorState::Free);
    assert_eq!(agent.last_known, None);
    assert_eq!(agent.velocity, Vec2::ZERO);
    assert!(agent.path.is_empty());
    assert_eq!(
        events,
        vec![Event::AgentStateChanged {
            agent: AgentId::new(0),
            from: BehaviorState::Searching,
            to: BehaviorState::Free,
        }]
    );
}

#[test]
fn idle_agents_wander_to_a_nearby_tile() {
    let mut tuning = small_pool();
    tuning.perception.wander_chance = 1.0;
    let grid = Grid::open(64, 32.0).expect("grid");
    let mut world = world_with_agent(grid, tuning, TileCoord::new(32, 32), 0.0);
    let mut behavior = Behavior::new(query::grid(&world), query::tuning(&world));
    let far = query::grid(&world).tile_center(TileCoord::new(2, 2));

    let _ = tick(&mut world, &mut behavior, &TargetObservation::new(far, 0.0));

    let agent = agent(&world);
    assert_eq!(agent.state, BehaviorState::Free);
    let goal = agent.path.goal().expect("wander path");
    assert_eq!(agent.last_known, Some(goal));
    let reach = (goal.column() - 32).abs().max((goal.row() - 32).abs());
    assert!((2..=10).contains(&reach), "unexpected wander reach {reach}");
}

#[test]
fn stuck_flag_opens_a_gate_and_is_consumed() {
    let grid = Grid::open(64, 32.0).expect("grid");
    let mut world = world_with_agent(grid, small_pool(), TileCoord::new(10, 10), 0.0);
    let mut behavior = Behavior::new(query::grid(&world), query::tuning(&world));
    {
        let (_, agents) = control::grid_and_agents(&mut world);
        let agent = agents.get_mut(AgentId::new(0)).expect("slot");
        agent.timers.decision = 0.7;
        agent.force_replan = true;
    }
    let target = query::grid(&world).tile_center(TileCoord::new(25, 10));

    let _ = tick(&mut world, &mut behavior, &TargetObservation::new(target, 180.0));

    let agent = agent(&world);
    assert!(!agent.force_replan);
    assert_eq!(agent.timers.decision, 1.0);
    assert_eq!(agent.state, BehaviorState::Chase);
}

#[test]
fn decisions_wait_for_the_gate() {
    let grid = Grid::open(64, 32.0).expect("grid");
    let mut world = world_with_agent(grid, small_pool(), TileCoord::new(10, 10), 0.0);
    let mut behavior = Behavior::new(query::grid(&world), query::tuning(&world));
    {
        let (_, agents) = control::grid_and_agents(&mut world);
        agents.get_mut(AgentId::new(0)).expect("slot").timers.decision = 0.5;
    }
    let target = query::grid(&world).tile_center(TileCoord::new(25, 10));

    let events = tick(&mut world, &mut behavior, &TargetObservation::new(target, 180.0));

    assert!(events.is_empty());
    assert_eq!(agent(&world).state, BehaviorState::Free);
}

#[test]
fn chasing_agent_keeps_its_plan_between_gates() {
    let grid = Grid::open(64, 32.0).expect("grid");
    let mut world = world_with_agent(grid, small_pool(), TileCoord::new(10, 10), 0.0);
    let mut behavior = Behavior::new(query::grid(&world), query::tuning(&world));
    {
        let (_, agents) = control::grid_and_agents(&mut world);
        let agent = agents.get_mut(AgentId::new(0)).expect("slot");
        agent.state = BehaviorState::Chase;
        agent.last_known = Some(TileCoord::new(3, 3));
        agent.timers.decision = 0.5;
    }
    let target = query::grid(&world).tile_center(TileCoord::new(25, 10));

    for _ in 0..10 {
        let events = tick(&mut world, &mut behavior, &TargetObservation::new(target, 180.0));
        assert!(events.is_empty());
    }

    let agent = agent(&world);
    assert_eq!(agent.state, BehaviorState::Chase);
    assert!(agent.path.is_empty());
    assert_eq!(agent.last_known, Some(TileCoord::new(3, 3)));
}
