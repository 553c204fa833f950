//! Tallies of the events produced by a headless run.

use std::fmt;

use skirmish_core::{AgentView, BehaviorState, Event};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Summary {
    ticks: u32,
    spawned: u32,
    rejected: u32,
    killed: u32,
    hits_taken: u32,
    shots: u32,
    target_hits: u32,
    transitions: u32,
    stuck: u32,
    truncated: u32,
    active: u32,
    visible: u32,
    states: [u32; 5],
}

impl Summary {
    pub(crate) fn record_tick(&mut self, events: &[Event]) {
        self.ticks += 1;
        for event in events {
            match event {
                Event::AgentSpawned { .. } => self.spawned += 1,
                Event::SpawnRejected { .. } => self.rejected += 1,
                Event::AgentKilled { .. } => self.killed += 1,
                Event::AgentDamaged { .. } => self.hits_taken += 1,
                Event::ProjectileRequested { .. } => self.shots += 1,
                Event::TargetHit { .. } => self.target_hits += 1,
                Event::AgentStateChanged { .. } => self.transitions += 1,
                Event::AgentStuck { .. } => self.stuck += 1,
                Event::SearchTruncated { .. } => self.truncated += 1,
                Event::TimeAdvanced { .. }
                | Event::SpawnPointConfigured { .. }
                | Event::SpawningToggled { .. }
                | Event::RespawnDue { .. } => {}
            }
        }
    }

    /// Captures the final population; `visible` counts agents the target sees.
    pub(crate) fn record_final(&mut self, agents: &AgentView, visible: u32) {
        self.active = 0;
        self.states = [0; 5];
        for agent in agents.active() {
            self.active += 1;
            self.states[state_slot(agent.state)] += 1;
        }
        self.visible = visible;
    }
}

fn state_slot(state: BehaviorState) -> usize {
    match state {
        BehaviorState::Free => 0,
        BehaviorState::Shoot => 1,
        BehaviorState::TakeCover => 2,
        BehaviorState::Chase => 3,
        BehaviorState::Searching => 4,
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ticks: {}", self.ticks)?;
        writeln!(
            f,
            "agents: {} spawned, {} rejected, {} killed, {} active, {} visible",
            self.spawned, self.rejected, self.killed, self.active, self.visible
        )?;
        writeln!(
            f,
            "combat: {} agent shots, {} target hits, {} hits taken",
            self.shots, self.target_hits, self.hits_taken
        )?;
        writeln!(
            f,
            "behavior: {} transitions, {} stuck, {} truncated searches",
            self.transitions, self.stuck, self.truncated
        )?;
        let [free, shoot, cover, chase, searching] = self.states;
        write!(
            f,
            "states: free {free}, shoot {shoot}, take-cover {cover}, chase {chase}, searching {searching}"
        )
    }
}
