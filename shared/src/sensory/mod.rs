//! Per-predator perception.

pub mod prey;
pub mod smell;
pub mod vision;

use bevy::math::Vec3;

use crate::config::SensesConfig;
use crate::registry::{Role, Snapshot};
pub use prey::{accumulate_hunger, nearest_prey, PreyTarget};
pub use smell::{smell, ScentSource, SmellReading};
pub use vision::{sweep, ObstacleField, ObstacleId, ObstacleQuery, RayHit, RaySlot, VisionReading};

/// Everything a predator perceives on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensoryInput {
    pub vision: VisionReading,
    pub smell: SmellReading,
    pub prey: Option<PreyTarget>,
    pub hunger: f32,
}

/// Scent sources visible in a snapshot, with faded intensity.
pub fn scent_sources(snapshot: &Snapshot, time: f32, lifetime: f32) -> Vec<ScentSource> {
    snapshot
        .with_role(Role::Scent)
        .filter_map(|agent| {
            agent.scent().map(|scent| ScentSource {
                id: agent.id,
                position: agent.position,
                intensity: scent.intensity_at(time, lifetime),
            })
        })
        .collect()
}

/// Run all three sensors for an agent at `origin` facing `forward`.
pub fn perceive(
    config: &SensesConfig,
    obstacles: &impl ObstacleQuery,
    snapshot: &Snapshot,
    scents: &[ScentSource],
    origin: Vec3,
    forward: Vec3,
    hunger: f32,
) -> SensoryInput {
    SensoryInput {
        vision: sweep(
            obstacles,
            origin,
            forward,
            config.ray_spread(),
            config.vision_range,
        ),
        smell: smell(origin, scents, config.smell_range),
        prey: nearest_prey(snapshot, origin, config.prey_range),
        hunger,
    }
}
