//! The per-tick pipeline.
//!
//! ```text
//!   sync bodies ─► snapshot ─► buoyancy ─► predators ─► swimmers ─► schools ─► scents/corpses ─► commit
//!                                          (sense, FSM, steer, attack)
//! ```
//!
//! Every stage reads the snapshot taken at tick start and writes into one
//! [`PendingWrites`]; nothing becomes visible until the commit. Forces go
//! straight to the [`RigidBodyIntegrator`], which applies them on its next
//! step.

use bevy::math::{Vec2, Vec3};
use bevy_ecs::resource::Resource;
use bevy_log::{debug, info, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::BTreeSet;

use crate::attack::{self, AttackKind, Attacker};
use crate::config::{flat_heading, ConfigError, SimulationConfig};
use crate::flocking::{self, Boid, HomeRange};
use crate::physics::{BodyHandle, BuoyancyModel, BuoyantBody, ForceCommand, RigidBodyIntegrator};
use crate::predator::{describe, step, Kinematics, PredatorMind, PredatorState};
use crate::registry::{
    Agent, AgentId, AgentKind, AgentSpawn, PendingWrites, PredatorData, Registry, Role, ScentData,
    Snapshot, SwimmerData,
};
use crate::sensory::{accumulate_hunger, perceive, scent_sources, ObstacleField, ScentSource};
use crate::steering::steer;
use crate::swimmer::{self, SwimmerState};
use crate::water::WaveField;

/// Below this horizontal speed a predator keeps its previous heading.
const HEADING_MIN_SPEED: f32 = 0.5;

/// Discrete things that happened during a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    StateChanged {
        agent: AgentId,
        from: PredatorState,
        to: PredatorState,
        reason: &'static str,
    },
    SwimmerStateChanged {
        agent: AgentId,
        from: SwimmerState,
        to: SwimmerState,
    },
    Attack {
        attacker: AgentId,
        target: AgentId,
        kind: AttackKind,
        damage: f32,
        severed_limb: bool,
    },
    Bleeding {
        target: AgentId,
        particles: usize,
    },
    Death {
        agent: AgentId,
        role: Role,
    },
    /// Removed from the registry; hosts drop the body if there is one
    Despawned {
        agent: AgentId,
        role: Role,
        body: Option<BodyHandle>,
    },
}

#[derive(Resource)]
pub struct Simulation {
    config: SimulationConfig,
    field: WaveField,
    buoyancy: BuoyancyModel,
    obstacles: ObstacleField,
    registry: Registry,
    homes: Vec<HomeRange>,
    rng: StdRng,
    time: f32,
    ticks: u64,
    accumulator: f32,
    paused: bool,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let field = WaveField::new(config.wave_set()?);
        let homes = config
            .scenario
            .schools
            .iter()
            .map(|school| HomeRange {
                origin: school.center,
                range: school.range,
            })
            .collect();

        Ok(Self {
            field,
            buoyancy: BuoyancyModel::from_config(&config.water),
            obstacles: ObstacleField::new(config.scenario.obstacles.iter().copied()),
            registry: Registry::new(),
            homes,
            rng: StdRng::seed_from_u64(config.seed),
            time: 0.0,
            ticks: 0,
            accumulator: 0.0,
            paused: false,
            config,
        })
    }

    /// Spawn everything the scenario describes. `allocate` creates a body in
    /// the host's integrator for each predator and swimmer.
    pub fn populate(&mut self, mut allocate: impl FnMut(Role, Vec3) -> BodyHandle) -> Vec<AgentId> {
        let scenario = self.config.scenario.clone();
        let mut spawned = Vec::new();

        for predator in &scenario.predators {
            let handle = allocate(Role::Predator, predator.position);
            let data = PredatorData {
                mind: PredatorMind::new(predator.state, predator.hunger),
                heading: flat_heading(predator.heading),
                last_attack: None,
                swim_phase: 0.0,
                tail_frequency: self.config.steering.swim_base_frequency,
            };
            spawned.push(self.registry.insert(
                AgentSpawn::new(predator.position, AgentKind::Predator(data))
                    .with_body(handle, BuoyantBody::predator()),
            ));
        }

        for swimmer in &scenario.swimmers {
            let role = if swimmer.diver { Role::Diver } else { Role::Human };
            let handle = allocate(role, swimmer.position);
            let kind = AgentKind::Swimmer {
                data: SwimmerData {
                    state: SwimmerState::Treading,
                    heading: Vec3::Z,
                },
                diver: swimmer.diver,
            };
            spawned.push(self.registry.insert(
                AgentSpawn::new(swimmer.position, kind).with_body(handle, BuoyantBody::swimmer()),
            ));
        }

        for (school, spawn) in scenario.schools.iter().enumerate() {
            for _ in 0..spawn.count {
                let offset = Vec3::new(
                    self.rng.gen_range(-0.5..0.5) * spawn.range,
                    self.rng.gen_range(-0.5..0.5) * spawn.range * 0.5,
                    self.rng.gen_range(-0.5..0.5) * spawn.range,
                );
                let velocity = Vec3::new(
                    self.rng.gen_range(-1.0..1.0),
                    self.rng.gen_range(-0.25..0.25),
                    self.rng.gen_range(-1.0..1.0),
                );
                spawned.push(self.registry.insert(
                    AgentSpawn::new(spawn.center + offset, AgentKind::Prey { school })
                        .with_velocity(velocity),
                ));
            }
        }

        for cloud in &scenario.scent_clouds {
            for _ in 0..cloud.count {
                let offset = Vec3::new(
                    self.rng.gen_range(-1.0..1.0),
                    self.rng.gen_range(-1.0..1.0),
                    self.rng.gen_range(-1.0..1.0),
                ) * cloud.spread;
                spawned.push(self.registry.insert(AgentSpawn::new(
                    cloud.center + offset,
                    AgentKind::Scent(ScentData {
                        intensity: cloud.intensity,
                        created_at: self.time,
                    }),
                )));
            }
        }

        info!(
            "Spawned scenario: {} predators, {} swimmers, {} fish, {} scent particles, {} obstacles",
            self.registry.count(Role::Predator),
            self.registry.count(Role::Human) + self.registry.count(Role::Diver),
            self.registry.count(Role::Prey),
            self.registry.count(Role::Scent),
            self.obstacles.len()
        );
        spawned
    }

    /// Add an agent immediately. Allowed while paused.
    pub fn spawn(&mut self, spawn: AgentSpawn) -> AgentId {
        self.registry.insert(spawn)
    }

    /// Remove an agent immediately. Allowed while paused.
    pub fn despawn(&mut self, id: AgentId) -> Option<Agent> {
        self.registry.remove(id)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn field(&self) -> &WaveField {
        &self.field
    }

    pub fn obstacles(&self) -> &ObstacleField {
        &self.obstacles
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Direct access for hosts and tests that need to place agents by hand.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        if paused != self.paused {
            info!("Simulation {}", if paused { "paused" } else { "resumed" });
        }
        self.paused = paused;
    }

    /// Run as many fixed ticks as `frame_dt` covers, capped at the
    /// configured substep limit. `step_integrator` runs after each tick so
    /// the host can advance its bodies.
    pub fn advance<I: RigidBodyIntegrator>(
        &mut self,
        frame_dt: f32,
        integrator: &mut I,
        mut step_integrator: impl FnMut(&mut I, f32),
    ) -> Vec<SimEvent> {
        let mut events = Vec::new();
        if self.paused {
            return events;
        }

        let fixed_dt = self.config.timing.fixed_dt;
        self.accumulator += frame_dt.max(0.0);
        let mut steps = 0;
        while self.accumulator >= fixed_dt && steps < self.config.timing.max_substeps {
            events.extend(self.tick(fixed_dt, integrator));
            step_integrator(integrator, fixed_dt);
            self.accumulator -= fixed_dt;
            steps += 1;
        }
        if self.accumulator >= fixed_dt {
            warn!(
                "Dropping {:.3}s of simulation backlog after {steps} substeps",
                self.accumulator
            );
            self.accumulator = 0.0;
        }
        events
    }

    /// One fixed step. Does nothing while paused.
    pub fn tick(&mut self, dt: f32, integrator: &mut impl RigidBodyIntegrator) -> Vec<SimEvent> {
        let mut events = Vec::new();
        if self.paused {
            return events;
        }
        self.time += dt;
        self.ticks += 1;

        let skipped = self.sync_bodies(integrator);
        let snapshot = self.registry.snapshot();
        let mut writes = PendingWrites::default();

        self.apply_buoyancy(&snapshot, &skipped, integrator);

        let scents = scent_sources(&snapshot, self.time, self.config.scent.lifetime);
        for agent in snapshot.with_role(Role::Predator) {
            if !skipped.contains(&agent.id) {
                self.update_predator(agent, &snapshot, &scents, integrator, &mut writes, &mut events, dt);
            }
        }
        for agent in snapshot.iter().filter(|a| a.role().is_swimmer()) {
            if !skipped.contains(&agent.id) {
                self.update_swimmer(agent, &snapshot, integrator, &mut writes, &mut events, dt);
            }
        }
        self.update_schools(&snapshot, &mut writes, dt);
        self.update_scents(&snapshot, &mut writes, dt);
        self.expire_corpses(&snapshot, &mut writes);

        let report = self.registry.commit(writes, self.time);
        for id in report.died {
            let role = self.registry.get(id).map_or(Role::Prey, Agent::role);
            info!("Agent {id} ({role:?}) died at {:.2}s", self.time);
            events.push(SimEvent::Death { agent: id, role });
        }
        for agent in report.removed {
            events.push(SimEvent::Despawned {
                agent: agent.id,
                role: agent.role(),
                body: agent.physics.map(|link| link.handle),
            });
        }
        if !report.spawned.is_empty() {
            debug!("Spawned {} agents this tick", report.spawned.len());
        }

        events
    }

    /// Pull positions and velocities of linked agents from the integrator.
    /// Returns agents whose body state is unusable this tick.
    fn sync_bodies(&mut self, integrator: &impl RigidBodyIntegrator) -> BTreeSet<AgentId> {
        let mut skipped = BTreeSet::new();
        for agent in self.registry.iter_mut() {
            let Some(link) = agent.physics else {
                continue;
            };
            match integrator.body_state(link.handle) {
                Some(state) if state.is_finite() => {
                    agent.position = state.position;
                    agent.velocity = state.linear_velocity;
                }
                Some(_) => {
                    warn!("Agent {} has a non-finite body state, skipping", agent.id);
                    skipped.insert(agent.id);
                }
                None => {
                    warn!("Agent {} has no body {:?} in the integrator", agent.id, link.handle);
                    skipped.insert(agent.id);
                }
            }
        }
        skipped
    }

    fn apply_buoyancy(
        &self,
        snapshot: &Snapshot,
        skipped: &BTreeSet<AgentId>,
        integrator: &mut impl RigidBodyIntegrator,
    ) {
        for agent in snapshot.iter().filter(|a| !skipped.contains(&a.id)) {
            if let Some(link) = agent.physics {
                self.buoyancy
                    .apply(&self.field, link.handle, &link.body, integrator, self.time);
            }
        }
    }

    fn update_predator(
        &mut self,
        agent: &Agent,
        snapshot: &Snapshot,
        scents: &[ScentSource],
        integrator: &mut impl RigidBodyIntegrator,
        writes: &mut PendingWrites,
        events: &mut Vec<SimEvent>,
        dt: f32,
    ) {
        let Some(mut data) = agent.predator().copied() else {
            return;
        };
        let config = &self.config;
        let forward = flat_heading(data.heading);
        data.mind.hunger = accumulate_hunger(data.mind.hunger, config.senses.hunger_rate, dt);

        let input = perceive(
            &config.senses,
            &self.obstacles,
            snapshot,
            scents,
            agent.position,
            forward,
            data.mind.hunger,
        );

        let from = data.mind.state;
        if let Some(transition) = step(&mut data.mind, &input, config.senses.murky_vision, dt) {
            debug!(
                "Predator {} {} -> {} ({})",
                agent.id, from, transition.to, transition.reason
            );
            events.push(SimEvent::StateChanged {
                agent: agent.id,
                from,
                to: transition.to,
                reason: transition.reason,
            });
        }

        let kin = Kinematics {
            position: agent.position,
            velocity: agent.velocity,
            heading: forward,
            time: self.time,
        };
        let behavior = describe(data.mind.state, &input, &kin);
        let hold_depth = !matches!(
            data.mind.state,
            PredatorState::Stalk | PredatorState::Hunt | PredatorState::Attack
        );
        let output = steer(
            &config.steering,
            &input,
            &behavior,
            &kin,
            hold_depth,
            data.swim_phase,
            dt,
        );
        data.swim_phase = output.stroke.phase;
        data.tail_frequency = output.stroke.frequency;

        if let Some(link) = agent.physics {
            if output.impulse != Vec3::ZERO {
                integrator.submit(link.handle, ForceCommand::Impulse(output.impulse));
            }
            if output.stroke.thrust != Vec3::ZERO {
                integrator.submit(link.handle, ForceCommand::Force(output.stroke.thrust));
            }
        }

        if Vec2::new(agent.velocity.x, agent.velocity.z).length() > HEADING_MIN_SPEED {
            data.heading = flat_heading(agent.velocity);
        }

        if behavior.attack_intent {
            let target = input.prey.and_then(|prey| snapshot.get(prey.id));
            let attacker = Attacker {
                position: agent.position,
                velocity: agent.velocity,
                hunger: data.mind.hunger,
                last_attack: data.last_attack,
            };
            if let Some(outcome) = attack::resolve(
                &config.attack,
                &attacker,
                true,
                target,
                self.time,
                &mut self.rng,
            ) {
                data.last_attack = Some(self.time);
                data.mind.hunger = outcome.hunger;
                writes.damage(outcome.target, outcome.damage);
                info!(
                    "Predator {} {} on {} for {} damage{}",
                    agent.id,
                    outcome.kind.name(),
                    outcome.target,
                    outcome.damage,
                    if outcome.severed_limb { ", limb severed" } else { "" }
                );

                if let Some(link) = target.and_then(|t| t.physics) {
                    integrator.submit(link.handle, ForceCommand::Impulse(outcome.force));
                }
                events.push(SimEvent::Attack {
                    attacker: agent.id,
                    target: outcome.target,
                    kind: outcome.kind,
                    damage: outcome.damage,
                    severed_limb: outcome.severed_limb,
                });

                let position = target.map_or(agent.position, |t| t.position);
                let drops = attack::bleed(
                    &config.attack,
                    position,
                    outcome.bleed_intensity,
                    self.time,
                    &mut self.rng,
                );
                if !drops.is_empty() {
                    debug!("{} bleeds {} scent particles", outcome.target, drops.len());
                    events.push(SimEvent::Bleeding {
                        target: outcome.target,
                        particles: drops.len(),
                    });
                }
                for drop in drops {
                    writes.spawn(drop);
                }
            }
        }

        writes.set_kind(agent.id, AgentKind::Predator(data));
    }

    fn update_swimmer(
        &mut self,
        agent: &Agent,
        snapshot: &Snapshot,
        integrator: &mut impl RigidBodyIntegrator,
        writes: &mut PendingWrites,
        events: &mut Vec<SimEvent>,
        dt: f32,
    ) {
        let AgentKind::Swimmer { mut data, diver } = agent.kind else {
            return;
        };
        let config = &self.config.swimmer;

        let predator = swimmer::nearest_predator(snapshot, agent.position);
        let next = swimmer::next_state(
            config,
            data.state,
            agent.health,
            predator.map(|p| agent.position.distance(p)),
        );
        let heading = swimmer::next_heading(next, data.heading, agent.position, predator);
        if next != data.state {
            debug!("Swimmer {} {} -> {}", agent.id, data.state.name(), next.name());
            events.push(SimEvent::SwimmerStateChanged {
                agent: agent.id,
                from: data.state,
                to: next,
            });
        }
        if next != data.state || heading != data.heading {
            data.state = next;
            data.heading = heading;
            writes.set_kind(agent.id, AgentKind::Swimmer { data, diver });
        }

        let impulse = swimmer::impulse(config, data.state, data.heading, self.time, dt);
        if let (Some(link), true) = (agent.physics, impulse != Vec3::ZERO) {
            integrator.submit(link.handle, ForceCommand::Impulse(impulse));
        }

        if let Some(drop) = swimmer::bleed(
            config,
            agent.position,
            agent.health,
            self.time,
            dt,
            &mut self.rng,
        ) {
            writes.spawn(drop);
        }
    }

    fn update_schools(&mut self, snapshot: &Snapshot, writes: &mut PendingWrites, dt: f32) {
        let predators: Vec<Vec3> = snapshot
            .with_role(Role::Predator)
            .map(|p| p.position)
            .collect();

        let mut schools: Vec<Vec<Boid>> = Vec::new();
        for agent in snapshot.with_role(Role::Prey).filter(|a| a.is_alive()) {
            let AgentKind::Prey { school } = agent.kind else {
                continue;
            };
            if schools.len() <= school {
                schools.resize_with(school + 1, Vec::new);
            }
            schools[school].push(Boid {
                id: agent.id,
                position: agent.position,
                velocity: agent.velocity,
            });
        }

        for (index, school) in schools.iter().enumerate().filter(|(_, s)| !s.is_empty()) {
            let home = self.homes.get(index).copied();
            for boid in flocking::step_school(
                &self.config.flocking,
                school,
                &predators,
                home,
                &mut self.rng,
                dt,
            ) {
                writes.set_position(boid.id, boid.position);
                writes.set_velocity(boid.id, boid.velocity);
            }
        }
    }

    /// Drift scent particles and drop the ones past their lifetime.
    fn update_scents(&self, snapshot: &Snapshot, writes: &mut PendingWrites, dt: f32) {
        let lifetime = self.config.scent.lifetime;
        for agent in snapshot.with_role(Role::Scent) {
            let Some(scent) = agent.scent() else {
                continue;
            };
            if self.time - scent.created_at >= lifetime {
                debug!("Scent {} expired", agent.id);
                writes.despawn(agent.id);
            } else if agent.velocity != Vec3::ZERO {
                writes.set_position(agent.id, agent.position + agent.velocity * dt);
            }
        }
    }

    fn expire_corpses(&self, snapshot: &Snapshot, writes: &mut PendingWrites) {
        let lifetime = self.config.timing.corpse_lifetime;
        for agent in snapshot.iter().filter(|a| a.role() != Role::Scent) {
            if let Some(died_at) = agent.died_at {
                if self.time - died_at >= lifetime {
                    writes.despawn(agent.id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PredatorSpawn, ScenarioConfig, SchoolSpawn, SwimmerSpawn};
    use crate::physics::{BodyState, ForceBuffer};

    fn empty_config() -> SimulationConfig {
        SimulationConfig {
            scenario: ScenarioConfig::empty(),
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = empty_config();
        config.waves[0].wavelength = 0.0;
        assert!(matches!(
            Simulation::new(config),
            Err(ConfigError::InvalidWavelength { index: 0, .. })
        ));
    }

    #[test]
    fn test_populate_spawns_default_scenario() {
        let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
        let mut next = 0;
        let ids = sim.populate(|_, _| {
            next += 1;
            BodyHandle(next)
        });
        assert_eq!(ids.len(), 1 + 1 + 150 + 20);
        assert_eq!(sim.registry().count(Role::Predator), 1);
        assert_eq!(sim.registry().count(Role::Human), 1);
        assert_eq!(sim.registry().count(Role::Prey), 150);
        assert_eq!(sim.registry().count(Role::Scent), 20);
        assert_eq!(next, 2, "only predators and swimmers get bodies");
    }

    #[test]
    fn test_paused_tick_changes_nothing() {
        let mut sim = Simulation::new(empty_config()).unwrap();
        let fish = sim.spawn(
            AgentSpawn::new(Vec3::ZERO, AgentKind::Prey { school: 0 }).with_velocity(Vec3::X),
        );
        sim.set_paused(true);
        let mut buffer = ForceBuffer::new();
        assert!(sim.tick(0.1, &mut buffer).is_empty());
        assert_eq!(sim.time(), 0.0);
        assert_eq!(sim.registry().get(fish).unwrap().position, Vec3::ZERO);

        // Registration still works while paused
        let other = sim.spawn(AgentSpawn::new(Vec3::Y, AgentKind::Prey { school: 0 }));
        assert!(sim.despawn(other).is_some());
    }

    #[test]
    fn test_fish_move_and_scents_expire() {
        let mut config = empty_config();
        config.scent.lifetime = 1.0;
        config.scenario.schools.push(SchoolSpawn {
            center: Vec3::ZERO,
            count: 0,
            range: 20.0,
        });
        let mut sim = Simulation::new(config).unwrap();
        let fish = sim.spawn(
            AgentSpawn::new(Vec3::ZERO, AgentKind::Prey { school: 0 }).with_velocity(Vec3::X),
        );
        let scent = sim.spawn(AgentSpawn::new(
            Vec3::new(5.0, 0.0, 0.0),
            AgentKind::Scent(ScentData {
                intensity: 1.0,
                created_at: 0.0,
            }),
        ));
        let mut buffer = ForceBuffer::new();

        sim.tick(0.5, &mut buffer);
        assert!(sim.registry().get(fish).unwrap().position.x > 0.0);
        assert!(sim.registry().get(scent).is_some());

        let events = sim.tick(0.5, &mut buffer);
        assert!(sim.registry().get(scent).is_none());
        assert!(events.contains(&SimEvent::Despawned {
            agent: scent,
            role: Role::Scent,
            body: None,
        }));
    }

    #[test]
    fn test_predator_hunger_grows_and_buoyancy_is_submitted() {
        let mut config = empty_config();
        config.scenario.predators.push(Default::default());
        let mut sim = Simulation::new(config).unwrap();
        let mut buffer = ForceBuffer::new();
        sim.populate(|_, position| {
            buffer.set_state(BodyHandle(7), BodyState::at(position));
            BodyHandle(7)
        });
        let id = sim.registry().iter().next().unwrap().id;

        sim.tick(1.0, &mut buffer);

        let data = *sim.registry().get(id).unwrap().predator().unwrap();
        assert!((data.mind.hunger - 50.5).abs() < 1e-4);
        assert!(buffer
            .commands()
            .iter()
            .any(|(h, c)| *h == BodyHandle(7) && matches!(c, ForceCommand::ForceAtPoint { .. })));
    }

    #[test]
    fn test_static_water_level_drives_buoyancy() {
        let mut config = empty_config();
        config.water.dynamic_waves = false;
        config.water.static_level = 3.0;
        config.scenario.swimmers.push(SwimmerSpawn {
            position: Vec3::new(0.0, 2.0, 0.0),
            diver: false,
        });
        let mut sim = Simulation::new(config).unwrap();
        let mut buffer = ForceBuffer::new();
        sim.populate(|_, position| {
            buffer.set_state(BodyHandle(4), BodyState::at(position));
            BodyHandle(4)
        });

        sim.tick(1.0 / 60.0, &mut buffer);

        // One meter under the static level, half of the 2m submersion depth
        let body = BuoyantBody::swimmer();
        let expected = 1025.0 * body.volume * 0.5 * 9.81;
        let lift = buffer
            .commands()
            .iter()
            .find_map(|(h, c)| match c {
                ForceCommand::ForceAtPoint { force, .. } if *h == BodyHandle(4) => Some(force.y),
                _ => None,
            })
            .expect("swimmer below the static level gets lift");
        assert!((lift - expected).abs() < 1e-2, "lift {lift}, expected {expected}");
    }

    #[test]
    fn test_panicking_swimmer_heads_away_from_predator() {
        let mut config = empty_config();
        config.scenario.predators.push(PredatorSpawn {
            position: Vec3::new(10.0, -5.0, 0.0),
            ..Default::default()
        });
        config.scenario.swimmers.push(SwimmerSpawn {
            position: Vec3::new(0.0, -1.0, 0.0),
            diver: false,
        });
        let mut sim = Simulation::new(config).unwrap();
        let mut buffer = ForceBuffer::new();
        let mut next = 0;
        let ids = sim.populate(|_, position| {
            next += 1;
            buffer.set_state(BodyHandle(next), BodyState::at(position));
            BodyHandle(next)
        });

        let events = sim.tick(1.0 / 60.0, &mut buffer);

        assert!(events.contains(&SimEvent::SwimmerStateChanged {
            agent: ids[1],
            from: SwimmerState::Treading,
            to: SwimmerState::Panic,
        }));
        let AgentKind::Swimmer { data, .. } = sim.registry().get(ids[1]).unwrap().kind else {
            panic!("expected a swimmer");
        };
        assert_eq!(data.state, SwimmerState::Panic);
        assert!((data.heading - Vec3::NEG_X).length() < 1e-6, "heading {:?}", data.heading);
    }

    #[test]
    fn test_missing_body_skips_agent() {
        let mut config = empty_config();
        config.scenario.predators.push(Default::default());
        let mut sim = Simulation::new(config).unwrap();
        sim.populate(|_, _| BodyHandle(1));
        let id = sim.registry().iter().next().unwrap().id;
        let mut buffer = ForceBuffer::new();

        sim.tick(1.0, &mut buffer);

        let data = sim.registry().get(id).unwrap().predator().unwrap();
        assert_eq!(data.mind.hunger, 50.0);
        assert!(buffer.commands().is_empty());
    }

    #[test]
    fn test_corpses_expire() {
        let mut config = empty_config();
        config.timing.corpse_lifetime = 1.0;
        let mut sim = Simulation::new(config).unwrap();
        let fish = sim.spawn(AgentSpawn::new(Vec3::ZERO, AgentKind::Prey { school: 0 }));
        {
            let agent = sim.registry_mut().get_mut(fish).unwrap();
            agent.health = 0.0;
            agent.died_at = Some(0.0);
        }
        let mut buffer = ForceBuffer::new();
        sim.tick(0.5, &mut buffer);
        assert!(sim.registry().get(fish).is_some());
        sim.tick(0.5, &mut buffer);
        assert!(sim.registry().get(fish).is_none());
    }

    #[test]
    fn test_advance_runs_fixed_substeps() {
        let mut sim = Simulation::new(empty_config()).unwrap();
        let mut buffer = ForceBuffer::new();
        let mut steps = 0;
        let dt = sim.config().timing.fixed_dt;

        sim.advance(dt * 2.5, &mut buffer, |_, _| steps += 1);
        assert_eq!(sim.ticks(), 2);
        assert_eq!(steps, 2);

        // A long stall is capped and the backlog dropped
        sim.advance(10.0, &mut buffer, |_, _| {});
        assert_eq!(sim.ticks(), 2 + sim.config().timing.max_substeps as u64);
        sim.advance(0.0, &mut buffer, |_, _| {});
        assert_eq!(sim.ticks(), 2 + sim.config().timing.max_substeps as u64);
    }
}
