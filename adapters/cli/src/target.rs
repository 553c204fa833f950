//! Scripted stand-in for the player.

use std::f32::consts::TAU;

use glam::Vec2;
use skirmish_core::{angle, AgentView, TargetObservation};
use skirmish_system_simulation::TargetInput;

/// Seconds for one lap of the patrol ellipse.
const LAP_SECONDS: f32 = 40.0;

/// Walks an ellipse around the arena center and aims at the closest agent.
#[derive(Clone, Debug)]
pub(crate) struct ScriptedTarget {
    center: Vec2,
    radii: Vec2,
    fire_every: u32,
}

impl ScriptedTarget {
    pub(crate) fn new(world_extent: f32, fire_every: u32) -> Self {
        Self {
            center: Vec2::splat(world_extent * 0.5),
            radii: Vec2::new(world_extent * 0.3, world_extent * 0.2),
            fire_every,
        }
    }

    fn position(&self, elapsed: f32) -> Vec2 {
        let phase = TAU * elapsed / LAP_SECONDS;
        self.center + Vec2::new(self.radii.x * phase.cos(), self.radii.y * phase.sin())
    }

    /// Target input for the step that starts at `tick`.
    pub(crate) fn input(&self, tick: u32, elapsed: f32, agents: &AgentView) -> TargetInput {
        let position = self.position(elapsed);
        let closest = agents
            .active()
            .map(|agent| agent.position)
            .min_by(|a, b| a.distance(position).total_cmp(&b.distance(position)));

        let facing = match closest {
            Some(agent) => angle::bearing_degrees(position, agent),
            None => {
                // Face along the direction of travel.
                let ahead = self.position(elapsed + 0.1);
                angle::bearing_degrees(position, ahead)
            }
        };

        TargetInput {
            observation: TargetObservation::new(position, facing),
            firing: closest.is_some() && self.fire_every > 0 && tick % self.fire_every == 0,
        }
    }
}
