//! Declarative predator transition table.
//!
//! Rows are checked top to bottom for the current state and the first
//! matching guard wins. No row matching means the state is kept.

use crate::sensory::SensoryInput;

use super::state::{PredatorMind, PredatorState};

/// Hunger above which the predator ignores caution.
pub const DESPERATE_HUNGER: f32 = 80.0;
/// Hunger above which a distant prey is hunted instead of stalked.
pub const STARVING_HUNGER: f32 = 90.0;

/// Distances and scalars the guards look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuardInput {
    pub smell: Option<f32>,
    pub prey: Option<f32>,
    /// Closest vision hit
    pub obstacle: Option<f32>,
    pub hunger: f32,
    pub time_in_state: f32,
    /// Scent closer than this is acted on directly
    pub murky_vision: f32,
}

impl GuardInput {
    pub fn new(input: &SensoryInput, time_in_state: f32, murky_vision: f32) -> Self {
        Self {
            smell: input.smell.distance(),
            prey: input.prey.map(|p| p.distance),
            obstacle: input.vision.nearest_distance(),
            hunger: input.hunger,
            time_in_state,
            murky_vision,
        }
    }

    fn stimulus(&self) -> bool {
        self.smell.is_some() || self.prey.is_some()
    }

    fn prey_within(&self, range: f32) -> bool {
        self.prey.is_some_and(|d| d < range)
    }

    fn prey_beyond(&self, range: f32) -> bool {
        self.prey.is_some_and(|d| d > range)
    }
}

pub type Guard = fn(&GuardInput) -> bool;

#[derive(Clone, Copy)]
pub struct Transition {
    pub from: PredatorState,
    pub to: PredatorState,
    pub guard: Guard,
    /// Human-readable condition, for logs and debugging overlays
    pub reason: &'static str,
}

fn idle_desperate(i: &GuardInput) -> bool {
    (i.hunger > DESPERATE_HUNGER && i.stimulus()) || i.smell.is_some()
}
fn idle_prey_near(i: &GuardInput) -> bool {
    i.prey_within(30.0) && i.hunger > 40.0
}
fn idle_bored(i: &GuardInput) -> bool {
    i.time_in_state > 3.0
}

fn patrol_desperate(i: &GuardInput) -> bool {
    (i.hunger > DESPERATE_HUNGER && i.stimulus()) || i.smell.is_some_and(|d| d <= i.murky_vision)
}
fn patrol_far_scent(i: &GuardInput) -> bool {
    i.smell.is_some_and(|d| d > i.murky_vision)
}
fn patrol_stalk(i: &GuardInput) -> bool {
    i.prey_beyond(15.0) && i.hunger <= STARVING_HUNGER
}
fn patrol_hunt(i: &GuardInput) -> bool {
    (i.prey_beyond(15.0) && i.hunger > STARVING_HUNGER)
        || (i.prey.is_some_and(|d| d <= 15.0) && i.hunger > 40.0)
}
fn patrol_cautious(i: &GuardInput) -> bool {
    i.prey.is_some_and(|d| d <= 15.0) && i.hunger <= 40.0
}

fn investigate_hunt(i: &GuardInput) -> bool {
    (i.prey.is_some() && i.hunger > STARVING_HUNGER)
        || i.prey_within(10.0)
        || i.smell.is_some_and(|d| d < 10.0)
}
fn investigate_stalk(i: &GuardInput) -> bool {
    i.prey.is_some() && i.hunger <= STARVING_HUNGER && i.time_in_state <= 20.0
}
fn investigate_give_up(i: &GuardInput) -> bool {
    (i.prey.is_some() && i.time_in_state > 20.0) || (i.time_in_state > 15.0 && i.smell.is_none())
}

fn stalk_close(i: &GuardInput) -> bool {
    i.prey_within(10.0)
}
fn stalk_lost(i: &GuardInput) -> bool {
    i.prey.is_none()
}

fn hunt_contact(i: &GuardInput) -> bool {
    i.prey_within(3.0)
}
fn hunt_lost(i: &GuardInput) -> bool {
    !i.stimulus() && (i.hunger < 60.0 || i.time_in_state > 10.0)
}
fn hunt_abort(i: &GuardInput) -> bool {
    i.obstacle.is_some_and(|d| d < 5.0) && i.hunger < DESPERATE_HUNGER
}

fn attack_done(i: &GuardInput) -> bool {
    i.prey.is_none() && i.time_in_state > 2.0
}
fn attack_chase(i: &GuardInput) -> bool {
    (i.prey_beyond(5.0) && i.hunger > 50.0) || (i.time_in_state > 5.0 && i.hunger > 50.0)
}
fn attack_give_up(i: &GuardInput) -> bool {
    i.prey_beyond(5.0) || i.time_in_state > 5.0
}

fn rest_over(i: &GuardInput) -> bool {
    i.time_in_state > 10.0
}
fn rest_startled(i: &GuardInput) -> bool {
    i.prey_within(5.0)
}

fn flee_over(i: &GuardInput) -> bool {
    i.time_in_state > 5.0
}

use PredatorState::*;

pub static TRANSITIONS: [Transition; 22] = [
    Transition { from: Idle, to: Hunt, guard: idle_desperate, reason: "stimulus while hungry or scent detected" },
    Transition { from: Idle, to: Hunt, guard: idle_prey_near, reason: "prey within 30 and hunger > 40" },
    Transition { from: Idle, to: Patrol, guard: idle_bored, reason: "idle for 3s" },
    Transition { from: Patrol, to: Hunt, guard: patrol_desperate, reason: "desperate or scent inside murky range" },
    Transition { from: Patrol, to: Investigate, guard: patrol_far_scent, reason: "distant scent" },
    Transition { from: Patrol, to: Stalk, guard: patrol_stalk, reason: "distant prey" },
    Transition { from: Patrol, to: Hunt, guard: patrol_hunt, reason: "prey close or starving" },
    Transition { from: Patrol, to: Investigate, guard: patrol_cautious, reason: "close prey while sated" },
    Transition { from: Investigate, to: Hunt, guard: investigate_hunt, reason: "target resolved" },
    Transition { from: Investigate, to: Stalk, guard: investigate_stalk, reason: "prey found at distance" },
    Transition { from: Investigate, to: Patrol, guard: investigate_give_up, reason: "investigation timed out" },
    Transition { from: Stalk, to: Hunt, guard: stalk_close, reason: "prey within 10" },
    Transition { from: Stalk, to: Investigate, guard: stalk_lost, reason: "prey lost" },
    Transition { from: Hunt, to: Attack, guard: hunt_contact, reason: "prey within 3" },
    Transition { from: Hunt, to: Patrol, guard: hunt_lost, reason: "target lost" },
    Transition { from: Hunt, to: Patrol, guard: hunt_abort, reason: "obstacle ahead" },
    Transition { from: Attack, to: Idle, guard: attack_done, reason: "prey gone" },
    // A timed-out attack only resumes the hunt above 50 hunger; a sated
    // predator falls through to the patrol row below.
    Transition { from: Attack, to: Hunt, guard: attack_chase, reason: "prey escaped while hungry" },
    Transition { from: Attack, to: Patrol, guard: attack_give_up, reason: "prey escaped" },
    Transition { from: Rest, to: Patrol, guard: rest_over, reason: "rested for 10s" },
    Transition { from: Rest, to: Idle, guard: rest_startled, reason: "prey within 5" },
    Transition { from: Flee, to: Patrol, guard: flee_over, reason: "fled for 5s" },
];

/// First matching row for `state`, if any.
pub fn find_transition(state: PredatorState, input: &GuardInput) -> Option<&'static Transition> {
    TRANSITIONS
        .iter()
        .filter(|t| t.from == state)
        .find(|t| (t.guard)(input))
}

/// Pure transition function.
pub fn next_state(state: PredatorState, input: &GuardInput) -> PredatorState {
    find_transition(state, input).map_or(state, |t| t.to)
}

/// Advance the state timer by `dt`, then apply the table. Returns the row
/// that fired when the state changed.
pub fn step(
    mind: &mut PredatorMind,
    input: &SensoryInput,
    murky_vision: f32,
    dt: f32,
) -> Option<&'static Transition> {
    mind.time_in_state += dt;
    let guard_input = GuardInput::new(input, mind.time_in_state, murky_vision);
    let transition = find_transition(mind.state, &guard_input)?;
    mind.enter(transition.to).then_some(transition)
}
