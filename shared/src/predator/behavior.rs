//! Continuous behavior per predator state.
//!
//! [`describe`] is a pure lookup from (state, perception, kinematics) to a
//! [`BehaviorDescriptor`]; it never changes state.

use bevy::math::{Quat, Vec3};
use std::f32::consts::{FRAC_PI_3, FRAC_PI_4, FRAC_PI_6};

use crate::sensory::{RayHit, SensoryInput};

use super::state::PredatorState;
use super::transitions::DESPERATE_HUNGER;

/// Stalkers approach from this far below their prey.
pub const STALK_DEPTH_OFFSET: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BehaviorDescriptor {
    /// Unit direction, or zero when the state wants to hold still
    pub direction: Vec3,
    /// Speed of the desired velocity along `direction`
    pub target_speed: f32,
    pub speed_multiplier: f32,
    pub aggressiveness: f32,
    pub attack_intent: bool,
    /// Hunger is past desperation; obstacle avoidance is down-weighted
    pub desperate: bool,
}

impl BehaviorDescriptor {
    pub fn target_velocity(&self) -> Vec3 {
        self.direction * self.target_speed
    }
}

/// Kinematic context for a behavior lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Unit facing on the horizontal plane
    pub heading: Vec3,
    /// Simulation time, drives the patrol wander
    pub time: f32,
}

#[inline]
fn yaw(v: Vec3, angle: f32) -> Vec3 {
    Quat::from_rotation_y(angle) * v
}

fn clearance(hit: RayHit, range: f32) -> f32 {
    hit.distance().unwrap_or(range)
}

fn toward(from: Vec3, to: Vec3, fallback: Vec3) -> Vec3 {
    (to - from).try_normalize().unwrap_or(fallback)
}

pub fn describe(state: PredatorState, input: &SensoryInput, kin: &Kinematics) -> BehaviorDescriptor {
    let desperate = input.hunger > DESPERATE_HUNGER;
    let glide = kin.velocity.try_normalize().unwrap_or(kin.heading);
    let vision = &input.vision;

    let (direction, target_speed, speed_multiplier, aggressiveness, attack_intent) = match state {
        PredatorState::Idle => (Vec3::ZERO, 0.0, 0.2, 0.0, false),
        PredatorState::Patrol => {
            let mut dir = yaw(kin.heading, (kin.time * 0.3).sin() * 0.5);
            let (left, right) = (vision.left.is_hit(), vision.right.is_hit());
            if left && !right {
                dir = yaw(dir, -FRAC_PI_6);
            } else if right && !left {
                dir = yaw(dir, FRAC_PI_6);
            } else if vision.center.is_hit() {
                let turn = if clearance(vision.left, vision.range) > clearance(vision.right, vision.range) {
                    FRAC_PI_4
                } else {
                    -FRAC_PI_4
                };
                dir = yaw(dir, turn);
            }
            (dir, 2.0, 1.0, 0.1, false)
        }
        PredatorState::Investigate => {
            let dir = match (input.prey, input.smell.direction()) {
                (Some(prey), _) => toward(kin.position, prey.position, kin.heading),
                (None, Some(scent)) => scent,
                (None, None) => kin.heading,
            };
            (dir, 1.5, 0.5, 0.3, false)
        }
        PredatorState::Stalk => {
            let dir = match input.prey {
                Some(prey) => toward(
                    kin.position,
                    prey.position - Vec3::Y * STALK_DEPTH_OFFSET,
                    kin.heading,
                ),
                None => kin.heading,
            };
            (dir, 2.5, 0.8, 0.6, false)
        }
        PredatorState::Hunt => {
            let mut multiplier = 2.0;
            let mut dir = match (input.prey, input.smell.direction()) {
                (Some(prey), _) => {
                    if prey.distance < 10.0 {
                        multiplier = 2.5;
                    }
                    toward(kin.position, prey.position, kin.heading)
                }
                (None, Some(scent)) => scent,
                (None, None) => kin.heading,
            };
            if !desperate && vision.center.distance().is_some_and(|d| d < 8.0) {
                let turn = if clearance(vision.left, vision.range) > clearance(vision.right, vision.range) {
                    FRAC_PI_3
                } else {
                    -FRAC_PI_3
                };
                dir = yaw(dir, turn);
            }
            (dir, 2.0 * multiplier, multiplier, 0.7, false)
        }
        PredatorState::Attack => {
            let dir = input
                .prey
                .map_or(kin.heading, |prey| toward(kin.position, prey.position, kin.heading));
            (dir, 3.0, 3.0, 1.0, true)
        }
        PredatorState::Rest => (glide, 1.0, 0.3, 0.0, false),
        PredatorState::Flee => (glide, 4.0, 4.0, 0.0, false),
    };

    BehaviorDescriptor {
        direction: direction.normalize_or_zero(),
        target_speed,
        speed_multiplier,
        aggressiveness,
        attack_intent,
        desperate,
    }
}
