//! Open-water simulation core.
//!
//! An analytic Gerstner wave field drives buoyancy for every floating body,
//! predators sense, decide and steer through a table-driven state machine,
//! prey school as boids and swimmers react to nearby predators. The core
//! computes forces and events each tick; integrating bodies and rendering
//! belong to the host.

pub mod attack;
pub mod config;
pub mod constants;
pub mod flocking;
pub mod physics;
pub mod predator;
pub mod registry;
pub mod sensory;
pub mod simulation;
pub mod steering;
pub mod swimmer;
pub mod telemetry;
pub mod water;

pub use config::{ConfigError, SimulationConfig};
pub use constants::*;
pub use simulation::{SimEvent, Simulation};
pub use telemetry::Telemetry;
