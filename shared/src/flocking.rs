//! Boids for schooling prey.
//!
//! Each fish sums separation, alignment and cohesion over its neighbors,
//! adds a flee term for nearby predators and a restoring term once it
//! strays from its school's home range, then integrates its own velocity
//! and position. Fish are not rigid bodies.
//!
//! Schools larger than `exhaustive_limit` look at a small random sample of
//! neighbors instead of every other member.

use bevy::math::Vec3;
use rand::{seq::index, Rng};

use crate::config::FlockingConfig;
use crate::registry::AgentId;

/// Separation distances are clamped to this to keep the repulsion finite.
const MIN_SEPARATION: f32 = 0.05;
/// Predator avoidance above this magnitude switches to the flee speed cap.
const FLEE_THRESHOLD: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boid {
    pub id: AgentId,
    pub position: Vec3,
    pub velocity: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomeRange {
    pub origin: Vec3,
    pub range: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlockForces {
    pub separation: Vec3,
    pub alignment: Vec3,
    pub cohesion: Vec3,
    pub predator_avoidance: Vec3,
    pub home: Vec3,
}

impl FlockForces {
    pub fn acceleration(&self, config: &FlockingConfig) -> Vec3 {
        (self.separation * config.separation_weight
            + self.alignment * config.alignment_weight
            + self.cohesion * config.cohesion_weight)
            * config.flock_gain
            + self.predator_avoidance * config.flee_gain
            + self.home
    }

    pub fn is_fleeing(&self) -> bool {
        self.predator_avoidance.length() > FLEE_THRESHOLD
    }
}

pub fn forces(
    config: &FlockingConfig,
    boid: &Boid,
    neighbors: &[Boid],
    predators: &[Vec3],
    home: Option<HomeRange>,
) -> FlockForces {
    let mut out = FlockForces::default();

    let mut heading_sum = Vec3::ZERO;
    let mut heading_count = 0;
    let mut centroid = Vec3::ZERO;
    let mut centroid_count = 0;

    for other in neighbors {
        let offset = boid.position - other.position;
        let distance = offset.length();

        if distance < config.separation_distance {
            let away = offset.try_normalize().unwrap_or(Vec3::Y);
            let d = distance.max(MIN_SEPARATION);
            out.separation += away * (config.separation_distance / d - 1.0);
        } else if distance < config.cohesion_distance {
            centroid += other.position;
            centroid_count += 1;
        }

        if distance < config.alignment_distance {
            heading_sum += other.velocity;
            heading_count += 1;
        }
    }

    if heading_count > 0 {
        out.alignment = heading_sum / heading_count as f32 - boid.velocity;
    }
    if centroid_count > 0 {
        out.cohesion = (centroid / centroid_count as f32 - boid.position).clamp_length_max(1.0);
    }

    for predator in predators {
        let offset = boid.position - *predator;
        let distance = offset.length();
        if distance < config.predator_radius {
            let d = distance.max(MIN_SEPARATION);
            out.predator_avoidance += offset.try_normalize().unwrap_or(Vec3::Y) * config.flee_strength / d;
        }
    }

    if let Some(home) = home {
        if boid.position.distance(home.origin) > home.range {
            out.home = (home.origin - boid.position) * config.home_gain;
        }
    }

    out
}

fn sample_neighbors(
    config: &FlockingConfig,
    school: &[Boid],
    index_of_self: usize,
    rng: &mut impl Rng,
    scratch: &mut Vec<Boid>,
) {
    scratch.clear();
    if school.len() <= config.exhaustive_limit {
        scratch.extend(
            school
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index_of_self)
                .map(|(_, b)| *b),
        );
        return;
    }

    let amount = (config.neighbor_samples + 1).min(school.len());
    scratch.extend(
        index::sample(rng, school.len(), amount)
            .into_iter()
            .filter(|i| *i != index_of_self)
            .take(config.neighbor_samples)
            .map(|i| school[i]),
    );
}

/// Step every boid of one school. All reads come from `school` as given,
/// so the update order inside the school does not matter.
pub fn step_school(
    config: &FlockingConfig,
    school: &[Boid],
    predators: &[Vec3],
    home: Option<HomeRange>,
    rng: &mut impl Rng,
    dt: f32,
) -> Vec<Boid> {
    let mut neighbors = Vec::with_capacity(config.neighbor_samples.max(school.len().min(config.exhaustive_limit)));

    school
        .iter()
        .enumerate()
        .map(|(i, boid)| {
            sample_neighbors(config, school, i, rng, &mut neighbors);
            let f = forces(config, boid, &neighbors, predators, home);
            let max_speed = if f.is_fleeing() {
                config.flee_speed
            } else {
                config.cruise_speed
            };
            let velocity = (boid.velocity + f.acceleration(config) * dt).clamp_length_max(max_speed);
            Boid {
                id: boid.id,
                position: boid.position + velocity * dt,
                velocity,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn boid(id: u64, position: Vec3) -> Boid {
        Boid {
            id: AgentId(id),
            position,
            velocity: Vec3::ZERO,
        }
    }

    #[test]
    fn test_separation_pushes_apart() {
        let config = FlockingConfig::default();
        let f = forces(
            &config,
            &boid(0, Vec3::ZERO),
            &[boid(1, Vec3::new(1.0, 0.0, 0.0))],
            &[],
            None,
        );
        // sep/d − 1 = 2/1 − 1
        assert_eq!(f.separation, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(f.cohesion, Vec3::ZERO);
    }

    #[test]
    fn test_cohesion_only_beyond_separation() {
        let config = FlockingConfig::default();
        let f = forces(
            &config,
            &boid(0, Vec3::ZERO),
            &[boid(1, Vec3::new(4.0, 0.0, 0.0))],
            &[],
            None,
        );
        assert_eq!(f.separation, Vec3::ZERO);
        assert_eq!(f.cohesion, Vec3::X);
    }

    #[test]
    fn test_alignment_matches_neighbor_velocity() {
        let config = FlockingConfig::default();
        let mut other = boid(1, Vec3::new(3.0, 0.0, 0.0));
        other.velocity = Vec3::new(0.0, 0.0, 2.0);
        let f = forces(&config, &boid(0, Vec3::ZERO), &[other], &[], None);
        assert_eq!(f.alignment, Vec3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn test_predator_triggers_flee_speed() {
        let config = FlockingConfig::default();
        let fish = [boid(0, Vec3::ZERO)];
        let mut rng = StdRng::seed_from_u64(1);
        let next = step_school(&config, &fish, &[Vec3::new(2.0, 0.0, 0.0)], None, &mut rng, 1.0);
        assert!(next[0].velocity.x < 0.0, "fish should flee away from the predator");
        assert!(next[0].velocity.length() > config.cruise_speed);
        assert!(next[0].velocity.length() <= config.flee_speed + 1e-4);
    }

    #[test]
    fn test_home_range_pulls_back() {
        let config = FlockingConfig::default();
        let home = HomeRange {
            origin: Vec3::ZERO,
            range: 10.0,
        };
        let inside = forces(&config, &boid(0, Vec3::new(5.0, 0.0, 0.0)), &[], &[], Some(home));
        assert_eq!(inside.home, Vec3::ZERO);
        let outside = forces(&config, &boid(0, Vec3::new(20.0, 0.0, 0.0)), &[], &[], Some(home));
        assert!((outside.home - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_large_school_samples_neighbors() {
        let config = FlockingConfig::default();
        let school: Vec<Boid> = (0..100).map(|i| boid(i, Vec3::new(i as f32, 0.0, 0.0))).collect();
        let mut rng = StdRng::seed_from_u64(9);
        let mut scratch = Vec::new();
        sample_neighbors(&config, &school, 3, &mut rng, &mut scratch);
        assert_eq!(scratch.len(), config.neighbor_samples);
        assert!(scratch.iter().all(|b| b.id != AgentId(3)));
    }

    #[test]
    fn test_flock_keeps_bounded_separation() {
        let config = FlockingConfig {
            separation_weight: 6.0,
            cohesion_weight: 0.5,
            ..Default::default()
        };
        let mut school: Vec<Boid> = (0..8)
            .map(|i| boid(i, Vec3::new((i % 4) as f32 * 3.0, 0.0, (i / 4) as f32 * 3.0)))
            .collect();
        let mut rng = StdRng::seed_from_u64(42);
        let dt = 1.0 / 60.0;

        for _ in 0..(40 * 60) {
            school = step_school(&config, &school, &[], None, &mut rng, dt);
        }

        let mut min_pair = f32::INFINITY;
        for (i, a) in school.iter().enumerate() {
            assert!(a.position.is_finite() && a.velocity.is_finite());
            assert!(a.position.length() < 50.0, "school drifted to {:?}", a.position);
            for b in &school[i + 1..] {
                min_pair = min_pair.min(a.position.distance(b.position));
            }
        }
        assert!(
            min_pair >= 0.75 * config.separation_distance,
            "closest pair {min_pair} collapsed inside separation"
        );
    }
}
