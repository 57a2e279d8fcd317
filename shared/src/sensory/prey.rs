use bevy::math::Vec3;

use crate::constants::MAX_HUNGER;
use crate::registry::{AgentId, Role, Snapshot};

/// The prey a predator has locked onto this tick. Re-resolved every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreyTarget {
    pub id: AgentId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub distance: f32,
    pub role: Role,
}

/// Nearest living, edible agent strictly within `range`.
pub fn nearest_prey(snapshot: &Snapshot, origin: Vec3, range: f32) -> Option<PreyTarget> {
    snapshot
        .iter()
        .filter(|agent| agent.role().is_edible() && agent.is_alive())
        .map(|agent| PreyTarget {
            id: agent.id,
            position: agent.position,
            velocity: agent.velocity,
            distance: origin.distance(agent.position),
            role: agent.role(),
        })
        .filter(|target| target.distance < range)
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Hunger after `dt` seconds without feeding.
#[inline]
pub fn accumulate_hunger(hunger: f32, rate: f32, dt: f32) -> f32 {
    (hunger + rate * dt).clamp(0.0, MAX_HUNGER)
}
