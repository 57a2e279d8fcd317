//! Contact-range attack resolution.

use bevy::math::Vec3;
use rand::Rng;

use crate::config::AttackConfig;
use crate::registry::{Agent, AgentId, AgentKind, AgentSpawn, Role, ScentData};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttackKind {
    Bump,
    BiteAndRelease,
    Thrash,
    Breach,
}

impl AttackKind {
    pub fn name(self) -> &'static str {
        match self {
            AttackKind::Bump => "bump",
            AttackKind::BiteAndRelease => "bite-and-release",
            AttackKind::Thrash => "thrash",
            AttackKind::Breach => "breach",
        }
    }
}

/// Fixed damage table entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackProfile {
    pub damage: f32,
    pub bleed_intensity: f32,
    /// Probability in [0, 1] that a limb is severed
    pub severance_chance: f32,
    pub force_multiplier: f32,
}

impl AttackKind {
    pub fn profile(self) -> AttackProfile {
        let (damage, bleed_intensity, severance_chance, force_multiplier) = match self {
            AttackKind::Bump => (5.0, 0.0, 0.0, 0.5),
            AttackKind::BiteAndRelease => (40.0, 0.5, 0.0, 1.0),
            AttackKind::Thrash => (100.0, 1.0, 1.0, 1.5),
            AttackKind::Breach => (150.0, 0.8, 0.5, 3.0),
        };
        AttackProfile {
            damage,
            bleed_intensity,
            severance_chance,
            force_multiplier,
        }
    }
}

pub fn classify(config: &AttackConfig, velocity: Vec3, target: Role) -> AttackKind {
    let speed = velocity.length();
    if velocity.y > config.breach_vertical_speed && speed > config.breach_speed {
        AttackKind::Breach
    } else if target.is_swimmer() {
        if speed < config.bump_speed {
            AttackKind::Bump
        } else {
            AttackKind::BiteAndRelease
        }
    } else {
        AttackKind::Thrash
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attacker {
    pub position: Vec3,
    pub velocity: Vec3,
    pub hunger: f32,
    pub last_attack: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackOutcome {
    pub kind: AttackKind,
    pub target: AgentId,
    pub damage: f32,
    pub bleed_intensity: f32,
    pub severed_limb: bool,
    /// Impulse for the target's body
    pub force: Vec3,
    pub killed: bool,
    /// Attacker hunger after feeding
    pub hunger: f32,
}

pub fn cooldown_elapsed(config: &AttackConfig, last_attack: Option<f32>, time: f32) -> bool {
    last_attack.is_none_or(|t| time - t >= config.cooldown)
}

/// Resolve one attack attempt. Silently returns `None` when there is no
/// intent, the cooldown is still running, or the target is gone, dead or
/// out of reach.
pub fn resolve(
    config: &AttackConfig,
    attacker: &Attacker,
    attack_intent: bool,
    target: Option<&Agent>,
    time: f32,
    rng: &mut impl Rng,
) -> Option<AttackOutcome> {
    if !attack_intent || !cooldown_elapsed(config, attacker.last_attack, time) {
        return None;
    }
    let target = target.filter(|t| t.is_alive() && t.role().is_edible())?;
    if attacker.position.distance(target.position) > config.contact_range {
        return None;
    }

    let kind = classify(config, attacker.velocity, target.role());
    let profile = kind.profile();
    let killed = target.health - profile.damage <= 0.0;
    let direction = attacker
        .velocity
        .try_normalize()
        .or_else(|| (target.position - attacker.position).try_normalize())
        .unwrap_or(Vec3::ZERO);
    let hunger = if killed {
        0.0
    } else {
        (attacker.hunger - config.hunger_relief).max(0.0)
    };

    Some(AttackOutcome {
        kind,
        target: target.id,
        damage: profile.damage,
        bleed_intensity: profile.bleed_intensity,
        severed_limb: rng.gen::<f32>() < profile.severance_chance,
        force: direction * config.bite_force * profile.force_multiplier,
        killed,
        hunger,
    })
}

/// Scent particles left by a wound of the given intensity.
pub fn bleed(
    config: &AttackConfig,
    position: Vec3,
    intensity: f32,
    time: f32,
    rng: &mut impl Rng,
) -> Vec<AgentSpawn> {
    let count = (intensity * config.scent_per_bleed).ceil().max(0.0) as usize;
    (0..count)
        .map(|_| {
            let jitter = Vec3::new(rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5));
            AgentSpawn::new(
                position + jitter,
                AgentKind::Scent(ScentData {
                    intensity,
                    created_at: time,
                }),
            )
            .with_velocity(Vec3::new(0.0, -0.1, 0.0))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Registry, SwimmerData};
    use crate::swimmer::SwimmerState;
    use rand::{rngs::StdRng, SeedableRng};

    fn attacker(velocity: Vec3) -> Attacker {
        Attacker {
            position: Vec3::ZERO,
            velocity,
            hunger: 60.0,
            last_attack: None,
        }
    }

    fn swimmer_at(registry: &mut Registry, position: Vec3) -> Agent {
        let id = registry.insert(AgentSpawn::new(
            position,
            AgentKind::Swimmer {
                data: SwimmerData {
                    state: SwimmerState::Treading,
                    heading: Vec3::Z,
                },
                diver: false,
            },
        ));
        registry.get(id).cloned().unwrap()
    }

    #[test]
    fn test_classification() {
        let config = AttackConfig::default();
        assert_eq!(classify(&config, Vec3::new(0.0, 8.0, 9.0), Role::Prey), AttackKind::Breach);
        assert_eq!(classify(&config, Vec3::new(1.0, 0.0, 0.0), Role::Human), AttackKind::Bump);
        assert_eq!(classify(&config, Vec3::new(4.0, 0.0, 0.0), Role::Diver), AttackKind::BiteAndRelease);
        assert_eq!(classify(&config, Vec3::new(1.0, 0.0, 0.0), Role::Prey), AttackKind::Thrash);
        // Fast but level is not a breach
        assert_eq!(classify(&config, Vec3::new(12.0, 0.0, 0.0), Role::Prey), AttackKind::Thrash);
    }

    #[test]
    fn test_profiles() {
        assert_eq!(AttackKind::Bump.profile().damage, 5.0);
        assert_eq!(AttackKind::BiteAndRelease.profile().bleed_intensity, 0.5);
        assert_eq!(AttackKind::Thrash.profile().severance_chance, 1.0);
        assert_eq!(AttackKind::Breach.profile().force_multiplier, 3.0);
    }

    #[test]
    fn test_bite_reduces_hunger_and_pushes_target() {
        let config = AttackConfig::default();
        let mut registry = Registry::new();
        let target = swimmer_at(&mut registry, Vec3::new(2.0, 0.0, 0.0));
        let mut rng = StdRng::seed_from_u64(0);

        let outcome = resolve(
            &config,
            &attacker(Vec3::new(4.0, 0.0, 0.0)),
            true,
            Some(&target),
            10.0,
            &mut rng,
        )
        .unwrap();

        assert_eq!(outcome.kind, AttackKind::BiteAndRelease);
        assert!(!outcome.killed);
        assert_eq!(outcome.hunger, 40.0);
        assert_eq!(outcome.force, Vec3::new(18_000.0, 0.0, 0.0));
    }

    #[test]
    fn test_kill_resets_hunger() {
        let config = AttackConfig::default();
        let mut registry = Registry::new();
        let id = registry.insert(AgentSpawn::new(Vec3::X, AgentKind::Prey { school: 0 }));
        let fish = registry.get(id).cloned().unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let outcome = resolve(&config, &attacker(Vec3::X), true, Some(&fish), 0.0, &mut rng).unwrap();
        assert_eq!(outcome.kind, AttackKind::Thrash);
        assert!(outcome.killed);
        assert!(outcome.severed_limb);
        assert_eq!(outcome.hunger, 0.0);
    }

    #[test]
    fn test_no_op_cases() {
        let config = AttackConfig::default();
        let mut registry = Registry::new();
        let near = swimmer_at(&mut registry, Vec3::new(1.0, 0.0, 0.0));
        let far = swimmer_at(&mut registry, Vec3::new(3.0, 0.0, 0.0));
        let mut rng = StdRng::seed_from_u64(0);
        let ready = attacker(Vec3::X);

        assert!(resolve(&config, &ready, false, Some(&near), 0.0, &mut rng).is_none());
        assert!(resolve(&config, &ready, true, None, 0.0, &mut rng).is_none());
        assert!(resolve(&config, &ready, true, Some(&far), 0.0, &mut rng).is_none());

        let cooling = Attacker {
            last_attack: Some(9.0),
            ..ready
        };
        assert!(resolve(&config, &cooling, true, Some(&near), 10.5, &mut rng).is_none());
        assert!(resolve(&config, &cooling, true, Some(&near), 11.0, &mut rng).is_some());
    }

    #[test]
    fn test_bleed_spawns_scaled_scent() {
        let config = AttackConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        assert!(bleed(&config, Vec3::ZERO, 0.0, 0.0, &mut rng).is_empty());
        assert_eq!(bleed(&config, Vec3::ZERO, 0.5, 0.0, &mut rng).len(), 3);
        let spawns = bleed(&config, Vec3::ZERO, 1.0, 2.0, &mut rng);
        assert_eq!(spawns.len(), 5);
        assert!(spawns
            .iter()
            .all(|s| matches!(s.kind, AgentKind::Scent(ScentData { created_at, .. }) if created_at == 2.0)));
    }
}
