//! Bridges the simulation core and Rapier once per fixed step.
//!
//! Body state is copied out of the ECS into a [`ForceBuffer`], the core
//! ticks against it, and the buffered commands are written back as
//! `ExternalForce`/`ExternalImpulse` before Rapier steps.

use bevy::prelude::*;
use bevy_ecs::system::{Local, Res, ResMut};
use bevy_log::debug;
use bevy_rapier3d::prelude::*;
use shared::physics::{BodyState, ForceBuffer, ForceCommand};
use shared::{SimEvent, Simulation};

use super::{AgentBody, BodyIndex};

/// Keeps Rapier's gravity in line with the water config and freezes the
/// physics pipeline while the simulation is paused.
pub fn configure_rapier_system(sim: Res<Simulation>, mut contexts: Query<&mut RapierConfiguration>) {
    for mut config in contexts.iter_mut() {
        config.gravity = Vec3::new(0.0, sim.config().water.gravity, 0.0);
        config.physics_pipeline_active = !sim.is_paused();
    }
}

pub fn step_simulation_system(
    mut commands: Commands,
    time: Res<Time>,
    mut sim: ResMut<Simulation>,
    mut index: ResMut<BodyIndex>,
    mut buffer: Local<ForceBuffer>,
    mut bodies: Query<(
        &AgentBody,
        &Transform,
        &Velocity,
        &mut ExternalForce,
        &mut ExternalImpulse,
    )>,
) {
    buffer.clear_states();
    for (agent, transform, velocity, _, _) in bodies.iter() {
        buffer.set_state(
            agent.handle,
            BodyState {
                position: transform.translation,
                linear_velocity: velocity.linvel,
                angular_velocity: velocity.angvel,
                rotation: transform.rotation,
            },
        );
    }

    let events = sim.tick(time.delta_secs(), &mut *buffer);

    // Forces only last for the step they were computed for
    for (_, _, _, mut force, _) in bodies.iter_mut() {
        *force = ExternalForce::default();
    }

    for (handle, command) in buffer.drain_commands() {
        let Some(&entity) = index.0.get(&handle) else {
            continue;
        };
        let Ok((_, transform, _, mut force, mut impulse)) = bodies.get_mut(entity) else {
            continue;
        };
        match command {
            ForceCommand::ForceAtPoint { force: f, point } => {
                let at_point = ExternalForce::at_point(f, point, transform.translation);
                force.force += at_point.force;
                force.torque += at_point.torque;
            }
            ForceCommand::Force(f) => force.force += f,
            ForceCommand::Torque(t) => force.torque += t,
            ForceCommand::Impulse(i) => impulse.impulse += i,
        }
    }

    for event in events {
        if let SimEvent::Despawned {
            agent,
            body: Some(handle),
            ..
        } = event
        {
            if let Some(entity) = index.0.remove(&handle) {
                debug!("Despawning body of agent {agent}");
                commands.entity(entity).despawn();
            }
        }
    }
}
