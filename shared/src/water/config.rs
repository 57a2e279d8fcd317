//! Wave parameter set shared between CPU physics and GPU rendering.
//!
//! A [`WaveSet`] can only be built through validation, so every wave the
//! field or the shader exporter sees has a positive wavelength and speed,
//! a non-negative amplitude, a steepness in `[0, 1]` and a unit direction.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use crate::config::ConfigError;

/// Configuration for a single Gerstner wave.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveParams {
    /// Distance between crests (λ), world units
    pub wavelength: f32,
    /// Crest height (A), world units
    pub amplitude: f32,
    /// Crest sharpness (Q), 0.0 = sine wave, 1.0 = sharpest before looping
    pub steepness: f32,
    /// Phase speed (c), world units per second
    pub speed: f32,
    /// Travel direction on the (x, z) plane; normalized on validation
    pub direction: Vec2,
}

impl WaveParams {
    pub const fn new(
        dir_x: f32,
        dir_z: f32,
        wavelength: f32,
        amplitude: f32,
        steepness: f32,
        speed: f32,
    ) -> Self {
        Self {
            wavelength,
            amplitude,
            steepness,
            speed,
            direction: Vec2::new(dir_x, dir_z),
        }
    }

    /// Wave number k = 2π / λ
    #[inline(always)]
    pub fn wave_number(&self) -> f32 {
        2.0 * PI / self.wavelength
    }

    fn validated(self, index: usize) -> Result<Self, ConfigError> {
        if !(self.wavelength.is_finite() && self.wavelength > 0.0) {
            return Err(ConfigError::InvalidWavelength {
                index,
                value: self.wavelength,
            });
        }
        if !(self.amplitude.is_finite() && self.amplitude >= 0.0) {
            return Err(ConfigError::InvalidAmplitude {
                index,
                value: self.amplitude,
            });
        }
        if !(0.0..=1.0).contains(&self.steepness) {
            return Err(ConfigError::InvalidSteepness {
                index,
                value: self.steepness,
            });
        }
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(ConfigError::InvalidSpeed {
                index,
                value: self.speed,
            });
        }
        let direction = self
            .direction
            .try_normalize()
            .ok_or(ConfigError::InvalidDirection { index })?;

        Ok(Self { direction, ..self })
    }
}

/// Default ocean wave set: one long swell plus three shorter chop layers.
pub const DEFAULT_WAVES: [WaveParams; 4] = [
    WaveParams::new(1.0, 0.0, 8.0, 0.4, 0.6, 2.0),
    WaveParams::new(0.7, 0.7, 6.0, 0.3, 0.5, 1.8),
    WaveParams::new(-0.5, 0.866, 4.0, 0.2, 0.4, 1.5),
    WaveParams::new(0.866, -0.5, 2.0, 0.1, 0.3, 1.0),
];

/// Validated, ordered collection of waves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaveSet {
    waves: Vec<WaveParams>,
}

impl WaveSet {
    /// Validate and normalize a list of waves. Rejects the whole set on the
    /// first invalid descriptor.
    pub fn new(waves: impl IntoIterator<Item = WaveParams>) -> Result<Self, ConfigError> {
        let waves = waves
            .into_iter()
            .enumerate()
            .map(|(index, wave)| wave.validated(index))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { waves })
    }

    /// A set with no waves; the surface is flat at height 0.
    pub fn still() -> Self {
        Self { waves: Vec::new() }
    }

    pub fn waves(&self) -> &[WaveParams] {
        &self.waves
    }

    pub fn len(&self) -> usize {
        self.waves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }
}

impl Default for WaveSet {
    fn default() -> Self {
        WavePreset::Ocean.to_wave_set()
    }
}

/// Preset wave configurations for different sea states.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum WavePreset {
    /// Completely still water (no waves)
    Still,
    /// Light swell
    Calm,
    /// Standard open-ocean waves
    #[default]
    Ocean,
    /// Long, tall storm waves
    Storm,
}

impl WavePreset {
    pub fn waves(self) -> Vec<WaveParams> {
        match self {
            WavePreset::Still => Vec::new(),
            WavePreset::Calm => vec![
                WaveParams::new(1.0, 0.2, 10.0, 0.15, 0.3, 1.2),
                WaveParams::new(-0.4, 1.0, 5.0, 0.05, 0.2, 0.9),
            ],
            WavePreset::Ocean => DEFAULT_WAVES.to_vec(),
            WavePreset::Storm => vec![
                WaveParams::new(1.0, 0.2, 24.0, 1.6, 0.8, 4.0),
                WaveParams::new(-0.5, 1.0, 14.0, 0.9, 0.7, 3.2),
                WaveParams::new(0.7, -0.7, 8.0, 0.5, 0.6, 2.5),
                WaveParams::new(-1.0, -0.3, 4.0, 0.2, 0.5, 1.8),
            ],
        }
    }

    pub fn to_wave_set(self) -> WaveSet {
        // Every preset is validated in `test_preset_wave_counts`.
        WaveSet::new(self.waves()).unwrap_or_else(|_| WaveSet::still())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_wave_counts() {
        assert!(WaveSet::new(WavePreset::Still.waves()).unwrap().is_empty());
        assert_eq!(WaveSet::new(WavePreset::Calm.waves()).unwrap().len(), 2);
        assert_eq!(WaveSet::new(WavePreset::Ocean.waves()).unwrap().len(), 4);
        assert_eq!(WaveSet::new(WavePreset::Storm.waves()).unwrap().len(), 4);
    }

    #[test]
    fn test_directions_are_normalized() {
        let set = WaveSet::new([WaveParams::new(3.0, 4.0, 5.0, 0.1, 0.2, 1.0)]).unwrap();
        let dir = set.waves()[0].direction;
        assert!((dir.length() - 1.0).abs() < 1e-6);
        assert!((dir.x - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_non_positive_wavelength() {
        for wavelength in [0.0, -2.0, f32::NAN] {
            let err = WaveSet::new([WaveParams::new(1.0, 0.0, wavelength, 0.1, 0.2, 1.0)]);
            assert!(
                matches!(err, Err(ConfigError::InvalidWavelength { index: 0, .. })),
                "wavelength {wavelength} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_steepness_out_of_range() {
        let err = WaveSet::new([
            WaveParams::new(1.0, 0.0, 4.0, 0.1, 0.2, 1.0),
            WaveParams::new(1.0, 0.0, 4.0, 0.1, 1.2, 1.0),
        ]);
        assert!(matches!(
            err,
            Err(ConfigError::InvalidSteepness { index: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_zero_direction() {
        let err = WaveSet::new([WaveParams::new(0.0, 0.0, 4.0, 0.1, 0.2, 1.0)]);
        assert!(matches!(err, Err(ConfigError::InvalidDirection { index: 0 })));
    }
}
