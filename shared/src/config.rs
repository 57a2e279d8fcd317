//! Simulation configuration.
//!
//! Every section carries serde defaults, so a RON file only needs to name
//! the values it overrides. [`SimulationConfig::validate`] runs before the
//! first tick; nothing in the per-tick pipeline re-checks these values.

use bevy::math::{Vec2, Vec3};
use bevy_log::info;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error;

use crate::constants::{FIXED_DT, GRAVITY, MAX_SUBSTEPS, SEAWATER_DENSITY};
use crate::predator::state::PredatorState;
use crate::water::config::{WaveParams, WaveSet, DEFAULT_WAVES};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("wave {index}: wavelength must be positive, got {value}")]
    InvalidWavelength { index: usize, value: f32 },
    #[error("wave {index}: amplitude must be non-negative, got {value}")]
    InvalidAmplitude { index: usize, value: f32 },
    #[error("wave {index}: steepness must lie in [0, 1], got {value}")]
    InvalidSteepness { index: usize, value: f32 },
    #[error("wave {index}: phase speed must be positive, got {value}")]
    InvalidSpeed { index: usize, value: f32 },
    #[error("wave {index}: direction must be non-zero")]
    InvalidDirection { index: usize },
    #[error("invalid value for {name}: {value}")]
    InvalidParameter { name: &'static str, value: f32 },
    #[error("could not read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse configuration: {0}")]
    Parse(#[from] ron::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterConfig {
    pub density: f32,
    /// Signed gravity acceleration, negative for downward
    pub gravity: f32,
    /// Surface height used when dynamic wave sampling is disabled
    pub static_level: f32,
    pub dynamic_waves: bool,
    /// Depth of the body center at which it counts as fully submerged
    pub full_submersion_depth: f32,
    pub angular_damping: f32,
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            density: SEAWATER_DENSITY,
            gravity: GRAVITY,
            static_level: 0.0,
            dynamic_waves: true,
            full_submersion_depth: 2.0,
            angular_damping: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensesConfig {
    /// Angle between the center ray and each side ray, in degrees
    pub ray_spread_degrees: f32,
    pub vision_range: f32,
    pub smell_range: f32,
    pub prey_range: f32,
    /// Scent closer than this is treated as "already in sight"
    pub murky_vision: f32,
    /// Hunger gained per second
    pub hunger_rate: f32,
}

impl Default for SensesConfig {
    fn default() -> Self {
        Self {
            ray_spread_degrees: 30.0,
            vision_range: 20.0,
            smell_range: 50.0,
            prey_range: 30.0,
            murky_vision: 5.0,
            hunger_rate: 0.5,
        }
    }
}

impl SensesConfig {
    /// Side-ray rotation in radians.
    pub fn ray_spread(&self) -> f32 {
        self.ray_spread_degrees.to_radians()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    pub avoidance_strength: f32,
    pub avoidance_weight: f32,
    /// Avoidance weight once hunger passes the desperation threshold
    pub desperate_avoidance_weight: f32,
    pub seek_weight: f32,
    pub behavior_weight: f32,
    pub seek_max_speed: f32,
    /// Multiplier from the summed steering vector to the impulse per second
    pub impulse_scale: f32,
    pub swim_base_frequency: f32,
    pub swim_frequency_per_speed: f32,
    pub swim_thrust: f32,
    /// Depth the predator drifts back toward, if any
    pub cruise_depth: Option<f32>,
    pub depth_gain: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            avoidance_strength: 5.0,
            avoidance_weight: 1.0,
            desperate_avoidance_weight: 0.3,
            seek_weight: 0.8,
            behavior_weight: 0.5,
            seek_max_speed: 5.0,
            impulse_scale: 20.0,
            swim_base_frequency: 2.0,
            swim_frequency_per_speed: 0.3,
            swim_thrust: 400.0,
            cruise_depth: Some(-5.0),
            depth_gain: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockingConfig {
    pub separation_distance: f32,
    pub alignment_distance: f32,
    pub cohesion_distance: f32,
    pub separation_weight: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    /// Gain applied to the summed flocking vector
    pub flock_gain: f32,
    pub predator_radius: f32,
    pub flee_strength: f32,
    pub flee_gain: f32,
    pub home_gain: f32,
    pub cruise_speed: f32,
    pub flee_speed: f32,
    /// Neighbors drawn per fish once a school outgrows `exhaustive_limit`
    pub neighbor_samples: usize,
    pub exhaustive_limit: usize,
}

impl Default for FlockingConfig {
    fn default() -> Self {
        Self {
            separation_distance: 2.0,
            alignment_distance: 5.0,
            cohesion_distance: 5.0,
            separation_weight: 1.5,
            alignment_weight: 1.0,
            cohesion_weight: 1.0,
            flock_gain: 2.0,
            predator_radius: 10.0,
            flee_strength: 2.0,
            flee_gain: 5.0,
            home_gain: 0.05,
            cruise_speed: 3.0,
            flee_speed: 8.0,
            neighbor_samples: 5,
            exhaustive_limit: 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackConfig {
    pub contact_range: f32,
    pub cooldown: f32,
    pub breach_vertical_speed: f32,
    pub breach_speed: f32,
    pub bump_speed: f32,
    pub bite_force: f32,
    pub hunger_relief: f32,
    /// Scent particles spawned per unit of bleed intensity
    pub scent_per_bleed: f32,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            contact_range: 2.5,
            cooldown: 2.0,
            breach_vertical_speed: 5.0,
            breach_speed: 10.0,
            bump_speed: 2.0,
            bite_force: 18_000.0,
            hunger_relief: 20.0,
            scent_per_bleed: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScentConfig {
    pub lifetime: f32,
}

impl Default for ScentConfig {
    fn default() -> Self {
        Self { lifetime: 30.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwimmerConfig {
    pub panic_radius: f32,
    pub calm_radius: f32,
    pub swim_impulse: f32,
    pub panic_impulse: f32,
    /// Chance per second that a wounded swimmer leaves a scent particle
    pub bleed_rate: f32,
}

impl Default for SwimmerConfig {
    fn default() -> Self {
        Self {
            panic_radius: 15.0,
            calm_radius: 20.0,
            swim_impulse: 50.0,
            panic_impulse: 100.0,
            bleed_rate: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub fixed_dt: f32,
    pub max_substeps: u32,
    /// Seconds a dead agent stays in the registry before removal
    pub corpse_lifetime: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            fixed_dt: FIXED_DT,
            max_substeps: MAX_SUBSTEPS,
            corpse_lifetime: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredatorSpawn {
    pub position: Vec3,
    pub heading: Vec3,
    pub hunger: f32,
    pub state: PredatorState,
}

impl Default for PredatorSpawn {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, -5.0, 0.0),
            heading: Vec3::Z,
            hunger: 50.0,
            state: PredatorState::Idle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwimmerSpawn {
    pub position: Vec3,
    #[serde(default)]
    pub diver: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolSpawn {
    pub center: Vec3,
    pub count: usize,
    /// Radius the school spawns in and is pulled back into
    pub range: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScentCloud {
    pub center: Vec3,
    pub count: usize,
    pub spread: f32,
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ObstacleShape {
    Sphere { center: Vec3, radius: f32 },
    Cuboid { center: Vec3, half_extents: Vec3 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub predators: Vec<PredatorSpawn>,
    pub swimmers: Vec<SwimmerSpawn>,
    pub schools: Vec<SchoolSpawn>,
    pub scent_clouds: Vec<ScentCloud>,
    pub obstacles: Vec<ObstacleShape>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            predators: vec![PredatorSpawn::default()],
            swimmers: vec![SwimmerSpawn {
                position: Vec3::new(5.0, -1.0, 5.0),
                diver: false,
            }],
            schools: vec![SchoolSpawn {
                center: Vec3::new(0.0, -5.0, 0.0),
                count: 150,
                range: 20.0,
            }],
            scent_clouds: vec![ScentCloud {
                center: Vec3::new(20.0, -5.0, 0.0),
                count: 20,
                spread: 2.0,
                intensity: 1.0,
            }],
            obstacles: vec![
                ObstacleShape::Sphere {
                    center: Vec3::new(-12.0, -8.0, 6.0),
                    radius: 3.0,
                },
                ObstacleShape::Sphere {
                    center: Vec3::new(10.0, -9.0, -14.0),
                    radius: 2.5,
                },
                ObstacleShape::Sphere {
                    center: Vec3::new(-4.0, -9.5, -20.0),
                    radius: 2.0,
                },
                ObstacleShape::Cuboid {
                    center: Vec3::new(0.0, -12.0, 0.0),
                    half_extents: Vec3::new(60.0, 0.5, 60.0),
                },
            ],
        }
    }
}

impl ScenarioConfig {
    /// A scenario with nothing in it, for tests and custom setups.
    pub fn empty() -> Self {
        Self {
            predators: Vec::new(),
            swimmers: Vec::new(),
            schools: Vec::new(),
            scent_clouds: Vec::new(),
            obstacles: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub waves: Vec<WaveParams>,
    pub water: WaterConfig,
    pub senses: SensesConfig,
    pub steering: SteeringConfig,
    pub flocking: FlockingConfig,
    pub attack: AttackConfig,
    pub scent: ScentConfig,
    pub swimmer: SwimmerConfig,
    pub timing: TimingConfig,
    /// Seed for every random draw in the simulation
    pub seed: u64,
    pub scenario: ScenarioConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            waves: DEFAULT_WAVES.to_vec(),
            water: WaterConfig::default(),
            senses: SensesConfig::default(),
            steering: SteeringConfig::default(),
            flocking: FlockingConfig::default(),
            attack: AttackConfig::default(),
            scent: ScentConfig::default(),
            swimmer: SwimmerConfig::default(),
            timing: TimingConfig::default(),
            seed: 0x5EA_F00D,
            scenario: ScenarioConfig::default(),
        }
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter { name, value })
    }
}

fn finite(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter { name, value })
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter { name, value })
    }
}

impl SimulationConfig {
    pub fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::de::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_ron_str(&contents)?;
        info!("Loaded simulation config from {}", path.display());
        Ok(config)
    }

    /// Validated wave set for the configured waves.
    pub fn wave_set(&self) -> Result<WaveSet, ConfigError> {
        WaveSet::new(self.waves.iter().copied())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.wave_set()?;

        positive("water.density", self.water.density)?;
        finite("water.gravity", self.water.gravity)?;
        finite("water.static_level", self.water.static_level)?;
        positive("water.full_submersion_depth", self.water.full_submersion_depth)?;
        non_negative("water.angular_damping", self.water.angular_damping)?;

        let spread = self.senses.ray_spread_degrees;
        if !(spread.is_finite() && (0.0..=90.0).contains(&spread)) {
            return Err(ConfigError::InvalidParameter {
                name: "senses.ray_spread_degrees",
                value: spread,
            });
        }
        positive("senses.vision_range", self.senses.vision_range)?;
        positive("senses.smell_range", self.senses.smell_range)?;
        positive("senses.prey_range", self.senses.prey_range)?;
        non_negative("senses.murky_vision", self.senses.murky_vision)?;
        non_negative("senses.hunger_rate", self.senses.hunger_rate)?;

        positive("steering.seek_max_speed", self.steering.seek_max_speed)?;
        non_negative("steering.swim_base_frequency", self.steering.swim_base_frequency)?;

        let flocking = &self.flocking;
        positive("flocking.separation_distance", flocking.separation_distance)?;
        if flocking.cohesion_distance < flocking.separation_distance {
            return Err(ConfigError::InvalidParameter {
                name: "flocking.cohesion_distance",
                value: flocking.cohesion_distance,
            });
        }
        positive("flocking.alignment_distance", flocking.alignment_distance)?;
        positive("flocking.cruise_speed", flocking.cruise_speed)?;
        positive("flocking.flee_speed", flocking.flee_speed)?;
        if flocking.neighbor_samples == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "flocking.neighbor_samples",
                value: 0.0,
            });
        }

        positive("attack.contact_range", self.attack.contact_range)?;
        non_negative("attack.cooldown", self.attack.cooldown)?;
        positive("scent.lifetime", self.scent.lifetime)?;

        positive("swimmer.panic_radius", self.swimmer.panic_radius)?;
        finite("swimmer.calm_radius", self.swimmer.calm_radius)?;
        non_negative("swimmer.swim_impulse", self.swimmer.swim_impulse)?;
        non_negative("swimmer.panic_impulse", self.swimmer.panic_impulse)?;
        non_negative("swimmer.bleed_rate", self.swimmer.bleed_rate)?;
        if self.swimmer.calm_radius < self.swimmer.panic_radius {
            return Err(ConfigError::InvalidParameter {
                name: "swimmer.calm_radius",
                value: self.swimmer.calm_radius,
            });
        }

        positive("timing.fixed_dt", self.timing.fixed_dt)?;
        if self.timing.max_substeps == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "timing.max_substeps",
                value: 0.0,
            });
        }
        non_negative("timing.corpse_lifetime", self.timing.corpse_lifetime)?;

        for school in &self.scenario.schools {
            positive("scenario.schools.range", school.range)?;
        }
        for obstacle in &self.scenario.obstacles {
            match *obstacle {
                ObstacleShape::Sphere { radius, .. } => positive("obstacle.radius", radius)?,
                ObstacleShape::Cuboid { half_extents, .. } => {
                    positive("obstacle.half_extents", half_extents.min_element())?
                }
            }
        }

        Ok(())
    }
}

/// Unit heading on the horizontal plane, or +Z when degenerate.
pub fn flat_heading(heading: Vec3) -> Vec3 {
    Vec2::new(heading.x, heading.z)
        .try_normalize()
        .map(|h| Vec3::new(h.x, 0.0, h.y))
        .unwrap_or(Vec3::Z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        SimulationConfig::default()
            .validate()
            .expect("default config should validate");
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = SimulationConfig::from_ron_str(
            "(seed: 7, senses: (smell_range: 80.0), scenario: (predators: []))",
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.senses.smell_range, 80.0);
        assert_eq!(config.senses.vision_range, 20.0);
        assert!(config.scenario.predators.is_empty());
        assert_eq!(config.waves.len(), 4);
    }

    #[test]
    fn test_ron_rejects_bad_wave() {
        let err = SimulationConfig::from_ron_str(
            "(waves: [(wavelength: -1.0, amplitude: 0.1, steepness: 0.5, speed: 1.0, direction: (1.0, 0.0))])",
        );
        assert!(matches!(err, Err(ConfigError::InvalidWavelength { index: 0, .. })));
    }

    #[test]
    fn test_ron_syntax_error_is_parse_error() {
        assert!(matches!(
            SimulationConfig::from_ron_str("(seed: "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            SimulationConfig::load(Path::new("/nonexistent/openwater.ron")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_rejects_zero_submersion_depth() {
        let mut config = SimulationConfig::default();
        config.water.full_submersion_depth = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter {
                name: "water.full_submersion_depth",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_inverted_swimmer_radii() {
        let mut config = SimulationConfig::default();
        config.swimmer.calm_radius = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_finite_swimmer_parameters() {
        let mut config = SimulationConfig::default();
        config.swimmer.bleed_rate = f32::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter {
                name: "swimmer.bleed_rate",
                ..
            })
        ));

        let mut config = SimulationConfig::default();
        config.swimmer.bleed_rate = f32::INFINITY;
        assert!(config.validate().is_err(), "infinite bleed rate accepted");

        let mut config = SimulationConfig::default();
        config.swimmer.panic_impulse = f32::NAN;
        assert!(config.validate().is_err(), "NaN panic impulse accepted");

        let mut config = SimulationConfig::default();
        config.water.static_level = f32::NEG_INFINITY;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter {
                name: "water.static_level",
                ..
            })
        ));
    }

    #[test]
    fn test_default_round_trips_through_ron() {
        let config = SimulationConfig::default();
        let text = ron::ser::to_string(&config).unwrap();
        let parsed = SimulationConfig::from_ron_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_ray_spread_is_in_radians() {
        let senses = SensesConfig {
            ray_spread_degrees: 90.0,
            ..Default::default()
        };
        assert!((senses.ray_spread() - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_flat_heading() {
        assert_eq!(flat_heading(Vec3::new(0.0, 5.0, 0.0)), Vec3::Z);
        let h = flat_heading(Vec3::new(3.0, 1.0, 4.0));
        assert!((h - Vec3::new(0.6, 0.0, 0.8)).length() < 1e-6);
    }
}
