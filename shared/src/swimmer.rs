//! Human and diver reactions.
//!
//! Swimmers tread water until a predator comes within the panic radius,
//! thrash erratically while panicking, and settle into a steady swim once
//! every predator is beyond the calm radius, heading away from the last
//! threat. Wounded swimmers leave blood.

use bevy::math::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{flat_heading, SwimmerConfig};
use crate::constants::MAX_HEALTH;
use crate::registry::{AgentKind, AgentSpawn, Role, ScentData, Snapshot};

/// Horizontal scatter of a blood drop around the swimmer.
const BLOOD_JITTER: f32 = 0.25;
const BLOOD_SINK_SPEED: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SwimmerState {
    #[default]
    Treading,
    Swimming,
    Panic,
    Dead,
}

impl SwimmerState {
    pub fn name(self) -> &'static str {
        match self {
            SwimmerState::Treading => "TREADING",
            SwimmerState::Swimming => "SWIMMING",
            SwimmerState::Panic => "PANIC",
            SwimmerState::Dead => "DEAD",
        }
    }
}

/// Position of the closest predator in the snapshot.
pub fn nearest_predator(snapshot: &Snapshot, origin: Vec3) -> Option<Vec3> {
    snapshot
        .with_role(Role::Predator)
        .map(|p| p.position)
        .min_by(|a, b| origin.distance_squared(*a).total_cmp(&origin.distance_squared(*b)))
}

/// Moving swimmers face away from the nearest predator; treading and dead
/// ones keep their heading.
pub fn next_heading(state: SwimmerState, heading: Vec3, origin: Vec3, predator: Option<Vec3>) -> Vec3 {
    match (state, predator) {
        (SwimmerState::Swimming | SwimmerState::Panic, Some(predator)) => {
            let away = origin - predator;
            if away.x == 0.0 && away.z == 0.0 {
                heading
            } else {
                flat_heading(away)
            }
        }
        _ => heading,
    }
}

pub fn next_state(
    config: &SwimmerConfig,
    state: SwimmerState,
    health: f32,
    predator_distance: Option<f32>,
) -> SwimmerState {
    if health <= 0.0 || state == SwimmerState::Dead {
        return SwimmerState::Dead;
    }
    let distance = predator_distance.unwrap_or(f32::INFINITY);
    if distance < config.panic_radius {
        SwimmerState::Panic
    } else if state == SwimmerState::Panic && distance > config.calm_radius {
        SwimmerState::Swimming
    } else {
        state
    }
}

/// Impulse for this tick. Panic ignores the heading and flails.
pub fn impulse(config: &SwimmerConfig, state: SwimmerState, heading: Vec3, time: f32, dt: f32) -> Vec3 {
    match state {
        SwimmerState::Swimming => heading * config.swim_impulse * dt,
        SwimmerState::Panic => {
            Vec3::new((time * 5.0).sin(), 0.0, (time * 3.0).cos()) * config.panic_impulse * dt
        }
        SwimmerState::Treading | SwimmerState::Dead => Vec3::ZERO,
    }
}

/// Blood drop from a wounded swimmer, rolled once per tick.
pub fn bleed(
    config: &SwimmerConfig,
    position: Vec3,
    health: f32,
    time: f32,
    dt: f32,
    rng: &mut impl Rng,
) -> Option<AgentSpawn> {
    if health <= 0.0 || health >= MAX_HEALTH {
        return None;
    }
    let chance = (config.bleed_rate * dt).clamp(0.0, 1.0);
    if !rng.gen_bool(chance as f64) {
        return None;
    }
    let jitter = Vec3::new(
        rng.gen_range(-BLOOD_JITTER..BLOOD_JITTER),
        0.0,
        rng.gen_range(-BLOOD_JITTER..BLOOD_JITTER),
    );
    Some(
        AgentSpawn::new(
            position + jitter,
            AgentKind::Scent(ScentData {
                intensity: (MAX_HEALTH - health) / MAX_HEALTH,
                created_at: time,
            }),
        )
        .with_velocity(Vec3::new(0.0, -BLOOD_SINK_SPEED, 0.0)),
    )
}
