//! Process-wide agent registry.
//!
//! Agents live in an arena keyed by a stable, never-reused [`AgentId`].
//! During a tick every system reads from a [`Snapshot`] taken at tick start
//! and records its changes in [`PendingWrites`]; [`Registry::commit`]
//! applies them once the tick is over. Cross-references between agents are
//! ids, looked up again every tick.

use bevy::math::Vec3;
use bevy_log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::constants::{MAX_HEALTH, MAX_HUNGER};
use crate::physics::{BodyHandle, BuoyantBody};
use crate::predator::state::PredatorMind;
use crate::swimmer::SwimmerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Predator,
    /// Schooling fish
    Prey,
    Human,
    Diver,
    Scent,
}

impl Role {
    pub const ALL: [Role; 5] = [Role::Predator, Role::Prey, Role::Human, Role::Diver, Role::Scent];

    /// Whether a predator can target this role.
    pub fn is_edible(self) -> bool {
        matches!(self, Role::Prey | Role::Human | Role::Diver)
    }

    pub fn is_swimmer(self) -> bool {
        matches!(self, Role::Human | Role::Diver)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredatorData {
    pub mind: PredatorMind,
    /// Unit facing on the horizontal plane
    pub heading: Vec3,
    /// Simulation time of the last attack event
    pub last_attack: Option<f32>,
    pub swim_phase: f32,
    /// Tail-beat frequency used on the last tick (Hz)
    pub tail_frequency: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwimmerData {
    pub state: SwimmerState,
    pub heading: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScentData {
    /// Intensity at creation
    pub intensity: f32,
    pub created_at: f32,
}

impl ScentData {
    /// Intensity after linear fading over `lifetime`.
    pub fn intensity_at(&self, time: f32, lifetime: f32) -> f32 {
        let age = (time - self.created_at).max(0.0);
        self.intensity * (1.0 - age / lifetime).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgentKind {
    Predator(PredatorData),
    /// Schooling fish; `school` indexes the home range it belongs to
    Prey { school: usize },
    Swimmer { data: SwimmerData, diver: bool },
    Scent(ScentData),
}

/// Link between an agent and its body in the external integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsLink {
    pub handle: BodyHandle,
    pub body: BuoyantBody,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub id: AgentId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub health: f32,
    pub kind: AgentKind,
    pub physics: Option<PhysicsLink>,
    /// Simulation time at which health reached zero
    pub died_at: Option<f32>,
}

impl Agent {
    pub fn role(&self) -> Role {
        match self.kind {
            AgentKind::Predator(_) => Role::Predator,
            AgentKind::Prey { .. } => Role::Prey,
            AgentKind::Swimmer { diver: false, .. } => Role::Human,
            AgentKind::Swimmer { diver: true, .. } => Role::Diver,
            AgentKind::Scent(_) => Role::Scent,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn predator(&self) -> Option<&PredatorData> {
        match &self.kind {
            AgentKind::Predator(data) => Some(data),
            _ => None,
        }
    }

    pub fn scent(&self) -> Option<&ScentData> {
        match &self.kind {
            AgentKind::Scent(data) => Some(data),
            _ => None,
        }
    }
}

/// Everything needed to add an agent at commit time.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSpawn {
    pub position: Vec3,
    pub velocity: Vec3,
    pub kind: AgentKind,
    pub physics: Option<PhysicsLink>,
}

impl AgentSpawn {
    pub fn new(position: Vec3, kind: AgentKind) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            kind,
            physics: None,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_body(mut self, handle: BodyHandle, body: BuoyantBody) -> Self {
        self.physics = Some(PhysicsLink { handle, body });
        self
    }
}

/// An agent's write to its own state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SelfUpdate {
    pub position: Option<Vec3>,
    pub velocity: Option<Vec3>,
    pub kind: Option<AgentKind>,
}

/// Buffered writes for the current tick.
#[derive(Debug, Default)]
pub struct PendingWrites {
    updates: BTreeMap<AgentId, SelfUpdate>,
    damage: BTreeMap<AgentId, f32>,
    spawns: Vec<AgentSpawn>,
    despawns: BTreeSet<AgentId>,
}

impl PendingWrites {
    pub fn set_position(&mut self, id: AgentId, position: Vec3) {
        self.updates.entry(id).or_default().position = Some(position);
    }

    pub fn set_velocity(&mut self, id: AgentId, velocity: Vec3) {
        self.updates.entry(id).or_default().velocity = Some(velocity);
    }

    pub fn set_kind(&mut self, id: AgentId, kind: AgentKind) {
        self.updates.entry(id).or_default().kind = Some(kind);
    }

    /// Damage from several sources in one tick accumulates.
    pub fn damage(&mut self, id: AgentId, amount: f32) {
        *self.damage.entry(id).or_insert(0.0) += amount;
    }

    pub fn spawn(&mut self, spawn: AgentSpawn) {
        self.spawns.push(spawn);
    }

    pub fn despawn(&mut self, id: AgentId) {
        self.despawns.insert(id);
    }
}

/// What a commit changed.
#[derive(Debug, Default, PartialEq)]
pub struct CommitReport {
    pub spawned: Vec<AgentId>,
    pub removed: Vec<Agent>,
    /// Agents whose health reached zero during this commit
    pub died: Vec<AgentId>,
}

/// Read-only copy of the registry taken at the start of a tick.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    agents: BTreeMap<AgentId, Agent>,
}

impl Snapshot {
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn with_role(&self, role: Role) -> impl Iterator<Item = &Agent> {
        self.agents.values().filter(move |a| a.role() == role)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    agents: BTreeMap<AgentId, Agent>,
    next_id: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert immediately. Used outside a tick; inside a tick spawns go
    /// through [`PendingWrites::spawn`].
    pub fn insert(&mut self, spawn: AgentSpawn) -> AgentId {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        let health = match spawn.kind {
            AgentKind::Scent(_) => 1.0,
            _ => MAX_HEALTH,
        };
        self.agents.insert(
            id,
            Agent {
                id,
                position: spawn.position,
                velocity: spawn.velocity,
                health,
                kind: spawn.kind,
                physics: spawn.physics,
                died_at: None,
            },
        );
        id
    }

    pub fn remove(&mut self, id: AgentId) -> Option<Agent> {
        let removed = self.agents.remove(&id);
        if removed.is_some() {
            debug!("Removed agent {id}");
        }
        removed
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.values_mut()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn count(&self, role: Role) -> usize {
        self.agents.values().filter(|a| a.role() == role).count()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            agents: self.agents.clone(),
        }
    }

    /// Apply a tick's buffered writes: self updates, then damage, then
    /// removals, then spawns. Writes aimed at agents removed earlier are
    /// dropped.
    pub fn commit(&mut self, writes: PendingWrites, time: f32) -> CommitReport {
        let mut report = CommitReport::default();

        for (id, update) in writes.updates {
            let Some(agent) = self.agents.get_mut(&id) else {
                continue;
            };
            if let Some(position) = update.position {
                agent.position = position;
            }
            if let Some(velocity) = update.velocity {
                agent.velocity = velocity;
            }
            if let Some(kind) = update.kind {
                agent.kind = clamp_kind(kind);
            }
        }

        for (id, amount) in writes.damage {
            let Some(agent) = self.agents.get_mut(&id) else {
                continue;
            };
            let was_alive = agent.is_alive();
            agent.health = (agent.health - amount).clamp(0.0, MAX_HEALTH);
            if was_alive && !agent.is_alive() {
                agent.died_at = Some(time);
                report.died.push(id);
            }
        }

        for id in writes.despawns {
            if let Some(agent) = self.remove(id) {
                report.removed.push(agent);
            }
        }

        for spawn in writes.spawns {
            report.spawned.push(self.insert(spawn));
        }

        report
    }
}

fn clamp_kind(kind: AgentKind) -> AgentKind {
    match kind {
        AgentKind::Predator(mut data) => {
            data.mind.hunger = data.mind.hunger.clamp(0.0, MAX_HUNGER);
            AgentKind::Predator(data)
        }
        other => other,
    }
}
