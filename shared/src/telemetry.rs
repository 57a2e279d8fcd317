//! Read-only HUD projection of the simulation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::registry::{AgentId, Role};
use crate::simulation::Simulation;
use crate::steering::tail_angle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredatorTelemetry {
    pub id: AgentId,
    pub state: String,
    pub time_in_state: f32,
    pub hunger: f32,
    /// `0xRRGGBB` tag for the current state
    pub color: u32,
    pub label: String,
    pub tail_frequency: f32,
    pub tail_angle: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub time: f32,
    pub paused: bool,
    pub counts: BTreeMap<Role, usize>,
    pub predators: Vec<PredatorTelemetry>,
}

impl Telemetry {
    pub fn count(&self, role: Role) -> usize {
        self.counts.get(&role).copied().unwrap_or(0)
    }
}

impl fmt::Display for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={:.1}s", self.time)?;
        if self.paused {
            f.write_str(" [paused]")?;
        }
        for (role, count) in &self.counts {
            write!(f, " {role:?}={count}")?;
        }
        for predator in &self.predators {
            write!(f, " | {} {} hunger={:.0}", predator.id, predator.label, predator.hunger)?;
        }
        Ok(())
    }
}

impl Simulation {
    pub fn telemetry(&self) -> Telemetry {
        let registry = self.registry();
        let counts = Role::ALL
            .iter()
            .map(|&role| (role, registry.count(role)))
            .collect();
        let predators = registry
            .iter()
            .filter_map(|agent| {
                agent.predator().map(|data| PredatorTelemetry {
                    id: agent.id,
                    state: data.mind.state.name().to_owned(),
                    time_in_state: data.mind.time_in_state,
                    hunger: data.mind.hunger,
                    color: data.mind.state.color(),
                    label: data.mind.label(),
                    tail_frequency: data.tail_frequency,
                    tail_angle: tail_angle(data.swim_phase),
                })
            })
            .collect();

        Telemetry {
            time: self.time(),
            paused: self.is_paused(),
            counts,
            predators,
        }
    }
}
