//! Steering composition and swim propulsion for predators.
//!
//! Avoidance, seek, behavior and depth-holding terms are reduced by weighted
//! summation into one impulse. Propulsion is separate: a tail-beat
//! oscillator produces a forward force whose frequency follows speed and
//! whose amplitude follows the behavior's speed multiplier.

use bevy::math::{Quat, Vec3};
use std::f32::consts::{FRAC_PI_2, TAU};

use crate::config::SteeringConfig;
use crate::predator::{BehaviorDescriptor, Kinematics};
use crate::sensory::{RaySlot, SensoryInput, VisionReading};

const RAY_WEIGHT_SIDE: f32 = 0.7;
const RAY_WEIGHT_CENTER: f32 = 1.0;
/// Peak tail swing in radians
const TAIL_AMPLITUDE: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringTerm {
    pub direction: Vec3,
    pub weight: f32,
}

impl SteeringTerm {
    pub fn new(direction: Vec3, weight: f32) -> Self {
        Self { direction, weight }
    }
}

pub fn combine(terms: &[SteeringTerm]) -> Vec3 {
    terms.iter().map(|t| t.direction * t.weight).sum()
}

/// Lateral push away from whatever the vision rays hit. Each ray contributes
/// `strength · (1 − distance/range)` scaled by its ray weight.
pub fn avoidance(vision: &VisionReading, heading: Vec3, strength: f32) -> Vec3 {
    let left_side = Quat::from_rotation_y(FRAC_PI_2) * heading;
    let falloff = |slot: RaySlot| 1.0 - vision.distance_or_range(slot) / vision.range;

    let mut push = 0.0;
    if vision.left.is_hit() {
        push -= strength * falloff(RaySlot::Left) * RAY_WEIGHT_SIDE;
    }
    if vision.right.is_hit() {
        push += strength * falloff(RaySlot::Right) * RAY_WEIGHT_SIDE;
    }
    if vision.center.is_hit() {
        let toward_left =
            vision.distance_or_range(RaySlot::Left) > vision.distance_or_range(RaySlot::Right);
        let sign = if toward_left { 1.0 } else { -1.0 };
        push += sign * strength * falloff(RaySlot::Center) * RAY_WEIGHT_CENTER;
    }

    left_side * push
}

/// Desired velocity toward `direction` at `max_speed`, minus current velocity.
pub fn seek(velocity: Vec3, direction: Vec3, max_speed: f32) -> Vec3 {
    direction.normalize_or_zero() * max_speed - velocity
}

/// Tail-beat oscillator state after one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SwimStroke {
    pub phase: f32,
    pub frequency: f32,
    pub tail_angle: f32,
    /// Forward force for this tick
    pub thrust: Vec3,
}

pub fn tail_frequency(config: &SteeringConfig, speed: f32) -> f32 {
    config.swim_base_frequency + speed.abs() * config.swim_frequency_per_speed
}

/// Tail swing in radians for an oscillator phase.
#[inline]
pub fn tail_angle(phase: f32) -> f32 {
    phase.sin() * TAIL_AMPLITUDE
}

pub fn swim_stroke(
    config: &SteeringConfig,
    phase: f32,
    speed: f32,
    speed_multiplier: f32,
    heading: Vec3,
    dt: f32,
) -> SwimStroke {
    let frequency = tail_frequency(config, speed);
    let phase = (phase + TAU * frequency * dt).rem_euclid(TAU);
    let pulse = (1.0 + phase.sin()) * 0.5;
    SwimStroke {
        phase,
        frequency,
        tail_angle: tail_angle(phase),
        thrust: heading * (config.swim_thrust * speed_multiplier * pulse),
    }
}

/// Everything the controller submits for one predator on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SteeringOutput {
    pub impulse: Vec3,
    pub stroke: SwimStroke,
    /// Unweighted terms, kept for debugging overlays
    pub avoidance: Vec3,
    pub seek: Vec3,
    pub behavior: Vec3,
}

pub fn steer(
    config: &SteeringConfig,
    input: &SensoryInput,
    behavior: &BehaviorDescriptor,
    kin: &Kinematics,
    hold_depth: bool,
    swim_phase: f32,
    dt: f32,
) -> SteeringOutput {
    let avoid = avoidance(&input.vision, kin.heading, config.avoidance_strength);
    let target = input
        .prey
        .map(|prey| prey.position - kin.position)
        .or_else(|| input.smell.direction());
    let seek_force = target.map_or(Vec3::ZERO, |dir| seek(kin.velocity, dir, config.seek_max_speed));
    let behavior_force = behavior.target_velocity();

    let avoidance_weight = if behavior.desperate {
        config.desperate_avoidance_weight
    } else {
        config.avoidance_weight
    };

    let mut terms = vec![
        SteeringTerm::new(avoid, avoidance_weight),
        SteeringTerm::new(seek_force, config.seek_weight),
        SteeringTerm::new(behavior_force, config.behavior_weight),
    ];
    if let (true, Some(depth)) = (hold_depth, config.cruise_depth) {
        terms.push(SteeringTerm::new(
            Vec3::Y * (depth - kin.position.y),
            config.depth_gain,
        ));
    }

    let stroke = swim_stroke(
        config,
        swim_phase,
        kin.velocity.length(),
        behavior.speed_multiplier,
        kin.heading,
        dt,
    );

    SteeringOutput {
        impulse: combine(&terms) * config.impulse_scale * dt,
        stroke,
        avoidance: avoid,
        seek: seek_force,
        behavior: behavior_force,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensory::{ObstacleId, RayHit};

    fn hit(distance: f32) -> RayHit {
        RayHit::Hit {
            distance,
            point: Vec3::ZERO,
            normal: Vec3::NEG_Z,
            obstacle: ObstacleId(0),
        }
    }

    fn kin() -> Kinematics {
        Kinematics {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            heading: Vec3::Z,
            time: 0.0,
        }
    }

    #[test]
    fn test_combine_is_weighted_sum() {
        let total = combine(&[
            SteeringTerm::new(Vec3::X, 1.0),
            SteeringTerm::new(Vec3::Y * 2.0, 0.5),
            SteeringTerm::new(Vec3::Z, 0.0),
        ]);
        assert_eq!(total, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_no_hits_no_avoidance() {
        let vision = VisionReading {
            range: 20.0,
            ..Default::default()
        };
        assert_eq!(avoidance(&vision, Vec3::Z, 5.0), Vec3::ZERO);
    }

    #[test]
    fn test_left_hit_pushes_right() {
        let vision = VisionReading {
            left: hit(10.0),
            range: 20.0,
            ..Default::default()
        };
        let push = avoidance(&vision, Vec3::Z, 5.0);
        // 5 · (1 − 10/20) · 0.7 toward −X (right of +Z)
        assert!((push - Vec3::new(-1.75, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_center_hit_turns_to_clearer_side() {
        let vision = VisionReading {
            center: hit(5.0),
            right: hit(8.0),
            range: 20.0,
            ..Default::default()
        };
        let push = avoidance(&vision, Vec3::Z, 5.0);
        // Right is blocked so the net push goes left (+X)
        assert!(push.x > 0.0);
    }

    #[test]
    fn test_seek_is_desired_minus_current() {
        let force = seek(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 10.0), 5.0);
        assert_eq!(force, Vec3::new(-1.0, 0.0, 5.0));
    }

    #[test]
    fn test_tail_frequency_scales_with_speed() {
        let config = SteeringConfig::default();
        assert_eq!(tail_frequency(&config, 0.0), 2.0);
        assert!((tail_frequency(&config, -10.0) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_stroke_thrust_follows_multiplier() {
        let config = SteeringConfig::default();
        // Start a quarter cycle short of the peak so the stroke lands on sin = 1
        let dt = 0.125;
        let start = std::f32::consts::FRAC_PI_2 - TAU * 2.0 * dt;
        let slow = swim_stroke(&config, start, 0.0, 1.0, Vec3::Z, dt);
        let fast = swim_stroke(&config, start, 0.0, 2.0, Vec3::Z, dt);
        assert!((slow.thrust.z - config.swim_thrust).abs() < 1e-2);
        assert!((fast.thrust.z - 2.0 * slow.thrust.z).abs() < 1e-2);
    }

    #[test]
    fn test_desperation_reduces_avoidance_weight() {
        let config = SteeringConfig {
            cruise_depth: None,
            ..Default::default()
        };
        let input = SensoryInput {
            vision: VisionReading {
                left: hit(2.0),
                range: 20.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let calm = BehaviorDescriptor::default();
        let desperate = BehaviorDescriptor {
            desperate: true,
            ..calm
        };
        let a = steer(&config, &input, &calm, &kin(), false, 0.0, 1.0);
        let b = steer(&config, &input, &desperate, &kin(), false, 0.0, 1.0);
        assert!((b.impulse.length() / a.impulse.length() - 0.3).abs() < 1e-4);
    }

    #[test]
    fn test_depth_hold_pulls_toward_cruise_depth() {
        let config = SteeringConfig::default();
        let shallow = Kinematics {
            position: Vec3::new(0.0, -1.0, 0.0),
            ..kin()
        };
        let out = steer(
            &config,
            &SensoryInput::default(),
            &BehaviorDescriptor::default(),
            &shallow,
            true,
            0.0,
            0.1,
        );
        assert!(out.impulse.y < 0.0);
    }
}
