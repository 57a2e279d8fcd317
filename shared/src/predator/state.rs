use serde::{Deserialize, Serialize};
use std::fmt;

/// Behavioral state of a predator. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum PredatorState {
    #[default]
    Idle,
    Patrol,
    Investigate,
    Stalk,
    Hunt,
    Attack,
    Rest,
    Flee,
}

impl PredatorState {
    pub const ALL: [PredatorState; 8] = [
        PredatorState::Idle,
        PredatorState::Patrol,
        PredatorState::Investigate,
        PredatorState::Stalk,
        PredatorState::Hunt,
        PredatorState::Attack,
        PredatorState::Rest,
        PredatorState::Flee,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PredatorState::Idle => "IDLE",
            PredatorState::Patrol => "PATROL",
            PredatorState::Investigate => "INVESTIGATE",
            PredatorState::Stalk => "STALK",
            PredatorState::Hunt => "HUNT",
            PredatorState::Attack => "ATTACK",
            PredatorState::Rest => "REST",
            PredatorState::Flee => "FLEE",
        }
    }

    /// Display color for HUD overlays, as 0xRRGGBB.
    pub fn color(self) -> u32 {
        match self {
            PredatorState::Idle => 0x4a90e2,
            PredatorState::Patrol => 0x7ed321,
            PredatorState::Investigate => 0x50e3c2,
            PredatorState::Stalk => 0x8b572a,
            PredatorState::Hunt => 0xf5a623,
            PredatorState::Attack => 0xd0021b,
            PredatorState::Rest => 0x9b9b9b,
            PredatorState::Flee => 0xbd10e0,
        }
    }
}

impl fmt::Display for PredatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Discrete controller state carried by each predator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredatorMind {
    pub state: PredatorState,
    pub previous: Option<PredatorState>,
    pub time_in_state: f32,
    pub hunger: f32,
}

impl PredatorMind {
    pub fn new(state: PredatorState, hunger: f32) -> Self {
        Self {
            state,
            previous: None,
            time_in_state: 0.0,
            hunger: hunger.clamp(0.0, crate::constants::MAX_HUNGER),
        }
    }

    /// Move to `next`, resetting the state timer. Returns whether the state
    /// actually changed.
    pub fn enter(&mut self, next: PredatorState) -> bool {
        if next == self.state {
            return false;
        }
        self.previous = Some(self.state);
        self.state = next;
        self.time_in_state = 0.0;
        true
    }

    /// HUD label such as `"HUNT (3.2s)"`.
    pub fn label(&self) -> String {
        format!("{} ({:.1}s)", self.state, self.time_in_state)
    }
}
