//! Rapier bodies for simulated agents and static obstacles.

pub mod step;

use bevy::prelude::*;
use bevy_log::debug;
use bevy_rapier3d::prelude::*;
use shared::config::ObstacleShape;
use shared::physics::{BodyHandle, BuoyantBody};
use shared::registry::Role;
use shared::Simulation;
use std::collections::HashMap;

/// Links an entity to the simulation's body handle.
#[derive(Component, Debug, Clone, Copy)]
pub struct AgentBody {
    pub handle: BodyHandle,
    pub role: Role,
}

#[derive(Resource, Debug, Default)]
pub struct BodyIndex(pub HashMap<BodyHandle, Entity>);

/// Collision groups used by the server.
pub mod collision_groups {
    use bevy_rapier3d::prelude::Group;

    /// Predators and swimmers
    pub const AGENT: Group = Group::GROUP_1;
    /// Rocks and seabed
    pub const OBSTACLE: Group = Group::GROUP_2;
}

#[derive(Bundle)]
pub struct AgentPhysicsBundle {
    pub body: RigidBody,
    pub collider: Collider,
    pub mass: ColliderMassProperties,
    pub velocity: Velocity,
    pub force: ExternalForce,
    pub impulse: ExternalImpulse,
    pub damping: Damping,
    pub collision_groups: CollisionGroups,
    pub transform: Transform,
}

impl AgentPhysicsBundle {
    pub fn new(role: Role, position: Vec3) -> Self {
        let (collider, body) = match role {
            // Long axis along +Z, the predator's forward
            Role::Predator => (Collider::capsule_z(1.2, 0.5), BuoyantBody::predator()),
            _ => (Collider::capsule_y(0.6, 0.25), BuoyantBody::swimmer()),
        };
        Self {
            body: RigidBody::Dynamic,
            collider,
            mass: ColliderMassProperties::Mass(body.mass),
            velocity: Velocity::zero(),
            force: ExternalForce::default(),
            impulse: ExternalImpulse::default(),
            damping: Damping {
                linear_damping: 0.5,
                angular_damping: 0.5,
            },
            collision_groups: CollisionGroups::new(
                collision_groups::AGENT,
                collision_groups::AGENT | collision_groups::OBSTACLE,
            ),
            transform: Transform::from_translation(position),
        }
    }
}

pub fn spawn_scenario_system(
    mut commands: Commands,
    mut sim: ResMut<Simulation>,
    mut index: ResMut<BodyIndex>,
) {
    sim.populate(|role, position| {
        let entity = commands.spawn(AgentPhysicsBundle::new(role, position)).id();
        let handle = BodyHandle(entity.to_bits());
        commands.entity(entity).insert(AgentBody { handle, role });
        index.0.insert(handle, entity);
        handle
    });
}

pub fn spawn_obstacles_system(mut commands: Commands, sim: Res<Simulation>) {
    for shape in sim.obstacles().shapes() {
        let (collider, center) = match *shape {
            ObstacleShape::Sphere { center, radius } => (Collider::ball(radius), center),
            ObstacleShape::Cuboid {
                center,
                half_extents,
            } => (
                Collider::cuboid(half_extents.x, half_extents.y, half_extents.z),
                center,
            ),
        };
        debug!("Spawning obstacle {:?}", shape);
        commands.spawn((
            RigidBody::Fixed,
            collider,
            CollisionGroups::new(collision_groups::OBSTACLE, collision_groups::AGENT),
            Transform::from_translation(center),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_mass_follows_role() {
        let shark = AgentPhysicsBundle::new(Role::Predator, Vec3::ZERO);
        let human = AgentPhysicsBundle::new(Role::Human, Vec3::Y);
        assert!(matches!(shark.mass, ColliderMassProperties::Mass(m) if m == 200.0));
        assert!(matches!(human.mass, ColliderMassProperties::Mass(m) if m == 70.0));
        assert_eq!(human.transform.translation, Vec3::Y);
    }
}
