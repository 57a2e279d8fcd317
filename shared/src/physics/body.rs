//! Contract with the external rigid-body integrator.
//!
//! The simulation core never integrates position or orientation itself. It
//! reads body state through [`RigidBodyIntegrator::body_state`] and submits
//! [`ForceCommand`]s; the integrator applies them on its next step.

use bevy::math::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque handle for a body owned by the integrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub position: Vec3,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub rotation: Quat,
}

impl Default for BodyState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl BodyState {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.linear_velocity.is_finite()
            && self.angular_velocity.is_finite()
            && self.rotation.is_finite()
    }
}

/// A single submission for one integrator step. Forces persist for the
/// step they are submitted in; impulses are an instantaneous momentum change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForceCommand {
    /// World-space force applied at a world-space point
    ForceAtPoint { force: Vec3, point: Vec3 },
    /// Force through the center of mass
    Force(Vec3),
    Torque(Vec3),
    Impulse(Vec3),
}

pub trait RigidBodyIntegrator {
    /// Current state of a body, or `None` once it no longer exists.
    fn body_state(&self, handle: BodyHandle) -> Option<BodyState>;

    fn submit(&mut self, handle: BodyHandle, command: ForceCommand);
}

/// In-memory integrator boundary: a state table the host refreshes before
/// each step and a command queue it drains afterwards.
#[derive(Debug, Default, Clone)]
pub struct ForceBuffer {
    states: HashMap<BodyHandle, BodyState>,
    commands: Vec<(BodyHandle, ForceCommand)>,
}

impl ForceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_state(&mut self, handle: BodyHandle, state: BodyState) {
        self.states.insert(handle, state);
    }

    pub fn clear_states(&mut self) {
        self.states.clear();
    }

    pub fn commands(&self) -> &[(BodyHandle, ForceCommand)] {
        &self.commands
    }

    pub fn drain_commands(&mut self) -> std::vec::Drain<'_, (BodyHandle, ForceCommand)> {
        self.commands.drain(..)
    }
}

impl RigidBodyIntegrator for ForceBuffer {
    fn body_state(&self, handle: BodyHandle) -> Option<BodyState> {
        self.states.get(&handle).copied()
    }

    fn submit(&mut self, handle: BodyHandle, command: ForceCommand) {
        self.commands.push((handle, command));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_body_has_no_state() {
        let buffer = ForceBuffer::new();
        assert!(buffer.body_state(BodyHandle(3)).is_none());
    }

    #[test]
    fn test_commands_queue_until_drained() {
        let mut buffer = ForceBuffer::new();
        let a = BodyHandle(1);
        buffer.set_state(a, BodyState::at(Vec3::ONE));
        buffer.submit(a, ForceCommand::Force(Vec3::X));
        buffer.submit(a, ForceCommand::Impulse(Vec3::Z));

        assert_eq!(buffer.body_state(a).unwrap().position, Vec3::ONE);
        let drained: Vec<_> = buffer.drain_commands().collect();
        assert_eq!(
            drained,
            vec![(a, ForceCommand::Force(Vec3::X)), (a, ForceCommand::Impulse(Vec3::Z))]
        );
        assert!(buffer.commands().is_empty());

        buffer.clear_states();
        assert!(buffer.body_state(a).is_none());
    }
}
