pub mod body;
pub mod buoyancy;

pub use body::{BodyHandle, BodyState, ForceBuffer, ForceCommand, RigidBodyIntegrator};
pub use buoyancy::{BuoyancyForces, BuoyancyModel, BuoyantBody};
