//! Per-body buoyancy, quadratic drag and rotational damping.

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use super::body::{BodyHandle, BodyState, ForceCommand, RigidBodyIntegrator};
use crate::config::WaterConfig;
use crate::water::field::WaveField;

/// Hydrodynamic description of a floating body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuoyantBody {
    /// Displaced volume at full submersion (m³)
    pub volume: f32,
    /// Reference mass (kg)
    pub mass: f32,
    pub drag_coefficient: f32,
    pub cross_sectional_area: f32,
    /// Offset of the buoyant force from the body origin. Placing it above
    /// the center of mass gives a righting torque.
    pub center_of_buoyancy: Vec3,
    /// Sample the wave field instead of the static level
    pub dynamic_waves: bool,
}

impl Default for BuoyantBody {
    fn default() -> Self {
        Self {
            volume: 1.0,
            mass: 1.0,
            drag_coefficient: 0.47,
            cross_sectional_area: 1.0,
            center_of_buoyancy: Vec3::ZERO,
            dynamic_waves: true,
        }
    }
}

impl BuoyantBody {
    /// Streamlined predator, slightly negatively buoyant.
    pub fn predator() -> Self {
        Self {
            volume: 0.3,
            mass: 200.0,
            drag_coefficient: 0.3,
            cross_sectional_area: 0.5,
            center_of_buoyancy: Vec3::new(0.0, 0.1, 0.0),
            dynamic_waves: true,
        }
    }

    /// Buoyancy sits high in the torso to keep the head up.
    pub fn swimmer() -> Self {
        Self {
            volume: 0.07,
            mass: 70.0,
            drag_coefficient: 0.8,
            cross_sectional_area: 0.5,
            center_of_buoyancy: Vec3::new(0.0, 0.5, 0.0),
            dynamic_waves: true,
        }
    }
}

/// Forces computed for one body on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BuoyancyForces {
    pub depth: f32,
    pub submersion_ratio: f32,
    /// Upward force and the world point it acts at
    pub buoyancy: Vec3,
    pub buoyancy_point: Vec3,
    pub drag: Vec3,
    pub damping_torque: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuoyancyModel {
    pub density: f32,
    pub gravity: f32,
    pub static_level: f32,
    /// World-wide switch; a body samples the waves only when both this and
    /// its own `dynamic_waves` are set
    pub dynamic_waves: bool,
    pub full_submersion_depth: f32,
    pub angular_damping: f32,
}

impl Default for BuoyancyModel {
    fn default() -> Self {
        Self::from_config(&WaterConfig::default())
    }
}

impl BuoyancyModel {
    pub fn from_config(config: &WaterConfig) -> Self {
        Self {
            density: config.density,
            gravity: config.gravity,
            static_level: config.static_level,
            dynamic_waves: config.dynamic_waves,
            full_submersion_depth: config.full_submersion_depth,
            angular_damping: config.angular_damping,
        }
    }

    /// Local surface height under a body.
    pub fn surface_height(&self, field: &WaveField, body: &BuoyantBody, position: Vec3, time: f32) -> f32 {
        if self.dynamic_waves && body.dynamic_waves {
            field.height(position.x, position.z, time)
        } else {
            self.static_level
        }
    }

    /// Fraction of the reference volume treated as displacing water.
    #[inline]
    pub fn submersion_ratio(&self, depth: f32) -> f32 {
        (depth / self.full_submersion_depth).clamp(0.0, 1.0)
    }

    /// Compute this tick's forces, or `None` when the body is at or above
    /// the surface.
    pub fn compute(
        &self,
        field: &WaveField,
        body: &BuoyantBody,
        state: &BodyState,
        time: f32,
    ) -> Option<BuoyancyForces> {
        let height = self.surface_height(field, body, state.position, time);
        let depth = height - state.position.y;
        if depth <= 0.0 {
            return None;
        }

        let submersion_ratio = self.submersion_ratio(depth);
        let displaced_volume = body.volume * submersion_ratio;
        let lift = self.density * displaced_volume * self.gravity.abs();

        let speed_sq = state.linear_velocity.length_squared();
        let drag = if speed_sq > 0.0 {
            let magnitude =
                0.5 * self.density * speed_sq * body.drag_coefficient * body.cross_sectional_area;
            -state.linear_velocity.normalize_or_zero() * magnitude
        } else {
            Vec3::ZERO
        };

        Some(BuoyancyForces {
            depth,
            submersion_ratio,
            buoyancy: Vec3::new(0.0, lift, 0.0),
            buoyancy_point: state.position + body.center_of_buoyancy,
            drag,
            damping_torque: -state.angular_velocity * self.angular_damping,
        })
    }

    /// Compute and submit forces for one body. Returns what was applied.
    pub fn apply(
        &self,
        field: &WaveField,
        handle: BodyHandle,
        body: &BuoyantBody,
        integrator: &mut impl RigidBodyIntegrator,
        time: f32,
    ) -> Option<BuoyancyForces> {
        let state = integrator.body_state(handle)?;
        let forces = self.compute(field, body, &state, time)?;

        integrator.submit(
            handle,
            ForceCommand::ForceAtPoint {
                force: forces.buoyancy,
                point: forces.buoyancy_point,
            },
        );
        if forces.drag != Vec3::ZERO {
            integrator.submit(handle, ForceCommand::Force(forces.drag));
        }
        if forces.damping_torque != Vec3::ZERO {
            integrator.submit(handle, ForceCommand::Torque(forces.damping_torque));
        }
        Some(forces)
    }
}
