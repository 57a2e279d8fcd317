//! Predator controller: discrete state, a declarative transition table and
//! a pure state-to-behavior lookup.

pub mod behavior;
pub mod state;
pub mod transitions;

pub use behavior::{describe, BehaviorDescriptor, Kinematics};
pub use state::{PredatorMind, PredatorState};
pub use transitions::{next_state, step, GuardInput, Transition, TRANSITIONS};
