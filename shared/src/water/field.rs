//! Analytic Gerstner wave field.
//!
//! For every wave `i` with phase `f = k·(d·(x, z) − c·t)` the surface point
//! above `(x, z)` is displaced by
//!
//! ```text
//! Δx = −Q·A·d.x·sin f
//! Δy =  A·cos f
//! Δz = −Q·A·d.z·sin f
//! ```
//!
//! Normals come from the closed-form partial derivatives of that
//! displacement, never from finite differences, so they stay stable from
//! tick to tick. The shader exporter in [`super::shader`] emits the same
//! expressions.

use bevy::math::{Vec2, Vec3};

use super::config::WaveSet;

/// Result of a water surface query at a single point.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WaterSample {
    /// World-space position of the displaced surface point
    pub position: Vec3,
    /// Unit surface normal
    pub normal: Vec3,
    /// Surface height above the query point
    pub height: f32,
    /// Horizontal orbital velocity of the surface (for drifting objects)
    pub flow_velocity: Vec2,
}

/// Precomputed constants for a single wave.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WaveConstants {
    /// Wave number k = 2π / wavelength
    pub k: f32,
    /// Phase speed c
    pub speed: f32,
    pub amplitude: f32,
    pub steepness: f32,
    pub direction: Vec2,
}

impl WaveConstants {
    #[inline(always)]
    pub fn phase(&self, x: f32, z: f32, time: f32) -> f32 {
        self.k * (self.direction.x * x + self.direction.y * z - self.speed * time)
    }
}

/// CPU evaluator for a validated wave set. A pure function of
/// (position, time, wave set).
#[derive(Debug, Clone, PartialEq)]
pub struct WaveField {
    waves: WaveSet,
    constants: Vec<WaveConstants>,
}

impl Default for WaveField {
    fn default() -> Self {
        Self::new(WaveSet::default())
    }
}

impl WaveField {
    pub fn new(waves: WaveSet) -> Self {
        let constants = waves
            .waves()
            .iter()
            .map(|wave| WaveConstants {
                k: wave.wave_number(),
                speed: wave.speed,
                amplitude: wave.amplitude,
                steepness: wave.steepness,
                direction: wave.direction,
            })
            .collect();

        Self { waves, constants }
    }

    pub fn waves(&self) -> &WaveSet {
        &self.waves
    }

    pub fn constants(&self) -> &[WaveConstants] {
        &self.constants
    }

    /// Signed vertical displacement of the surface above `(x, z)`.
    #[inline]
    pub fn height(&self, x: f32, z: f32, time: f32) -> f32 {
        self.constants
            .iter()
            .map(|wc| wc.amplitude * wc.phase(x, z, time).cos())
            .sum()
    }

    /// Full 3D Gerstner displacement for the surface point based at `(x, z)`.
    pub fn displacement(&self, x: f32, z: f32, time: f32) -> Vec3 {
        let mut displacement = Vec3::ZERO;
        for wc in &self.constants {
            let (sin_f, cos_f) = wc.phase(x, z, time).sin_cos();
            let qa = wc.steepness * wc.amplitude;
            displacement.x -= qa * wc.direction.x * sin_f;
            displacement.y += wc.amplitude * cos_f;
            displacement.z -= qa * wc.direction.y * sin_f;
        }
        displacement
    }

    /// Where the flat-water point `(x, z)` ends up after displacement.
    pub fn displaced_position(&self, x: f32, z: f32, time: f32) -> Vec3 {
        Vec3::new(x, 0.0, z) + self.displacement(x, z, time)
    }

    /// Unit surface normal from the analytic tangent and binormal.
    pub fn normal(&self, x: f32, z: f32, time: f32) -> Vec3 {
        let (tangent, binormal) = self.tangent_frame(x, z, time);
        binormal.cross(tangent).normalize_or(Vec3::Y)
    }

    /// ∂P/∂x and ∂P/∂z of the displaced surface point P(x, z).
    fn tangent_frame(&self, x: f32, z: f32, time: f32) -> (Vec3, Vec3) {
        let mut tangent = Vec3::X;
        let mut binormal = Vec3::Z;

        for wc in &self.constants {
            let (sin_f, cos_f) = wc.phase(x, z, time).sin_cos();
            let ka = wc.k * wc.amplitude;
            let qka = wc.steepness * ka;
            let (dx, dz) = (wc.direction.x, wc.direction.y);

            tangent.x -= qka * dx * dx * cos_f;
            tangent.y -= ka * dx * sin_f;
            tangent.z -= qka * dx * dz * cos_f;

            binormal.x -= qka * dx * dz * cos_f;
            binormal.y -= ka * dz * sin_f;
            binormal.z -= qka * dz * dz * cos_f;
        }

        (tangent, binormal)
    }

    /// Horizontal orbital velocity (time derivative of the horizontal displacement).
    pub fn flow_velocity(&self, x: f32, z: f32, time: f32) -> Vec2 {
        self.constants
            .iter()
            .map(|wc| {
                let cos_f = wc.phase(x, z, time).cos();
                wc.direction * (wc.steepness * wc.amplitude * wc.k * wc.speed * cos_f)
            })
            .sum()
    }

    /// Sample everything at once.
    pub fn sample(&self, x: f32, z: f32, time: f32) -> WaterSample {
        let displacement = self.displacement(x, z, time);
        WaterSample {
            position: Vec3::new(x, 0.0, z) + displacement,
            normal: self.normal(x, z, time),
            height: displacement.y,
            flow_velocity: self.flow_velocity(x, z, time),
        }
    }

    /// How deep below the surface a point is. Positive underwater.
    #[inline]
    pub fn depth_at(&self, position: Vec3, time: f32) -> f32 {
        self.height(position.x, position.z, time) - position.y
    }

    #[inline]
    pub fn is_underwater(&self, position: Vec3, time: f32) -> bool {
        self.depth_at(position, time) > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::water::config::{WaveParams, WavePreset};
    use proptest::prelude::*;
    use std::f32::consts::PI;

    fn single_wave(amplitude: f32, steepness: f32) -> WaveField {
        WaveField::new(
            WaveSet::new([WaveParams::new(1.0, 0.0, 8.0, amplitude, steepness, 2.0)]).unwrap(),
        )
    }

    #[test]
    fn test_still_water_is_flat() {
        let field = WaveField::new(WavePreset::Still.to_wave_set());
        assert_eq!(field.height(12.0, -3.0, 7.5), 0.0);
        assert_eq!(field.normal(12.0, -3.0, 7.5), Vec3::Y);
        assert_eq!(field.displacement(1.0, 2.0, 3.0), Vec3::ZERO);
    }

    #[test]
    fn test_single_wave_peaks_at_zero_phase() {
        let field = single_wave(0.4, 0.6);
        // Phase is zero at the origin at t = 0
        assert!((field.height(0.0, 0.0, 0.0) - 0.4).abs() < 1e-6);
        // Half a wavelength further along the direction it is a trough
        assert!((field.height(4.0, 0.0, 0.0) + 0.4).abs() < 1e-5);
    }

    #[test]
    fn test_crest_travels_with_phase_speed() {
        let field = single_wave(0.4, 0.6);
        // After 1s the crest has moved c = 2 units along +x
        assert!((field.height(2.0, 0.0, 1.0) - 0.4).abs() < 1e-5);
    }

    #[test]
    fn test_horizontal_displacement_peaks_crests() {
        let field = single_wave(0.4, 0.6);
        // A quarter wavelength either side of the crest, points are pulled toward it
        let before = field.displacement(-2.0, 0.0, 0.0);
        assert!(before.x > 0.0, "points behind the crest should move toward it");
        let after = field.displacement(2.0, 0.0, 0.0);
        assert!(after.x < 0.0);
    }

    #[test]
    fn test_normal_points_up_at_crest() {
        let field = single_wave(0.4, 0.6);
        let normal = field.normal(0.0, 0.0, 0.0);
        assert!((normal - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_normal_leans_away_from_slope() {
        let field = single_wave(0.4, 0.0);
        // Quarter wavelength past the crest the surface falls toward +x
        let normal = field.normal(2.0, 0.0, 0.0);
        assert!(normal.x > 0.0, "normal should tilt downhill, got {normal:?}");
        // Slope there is −A·k, so the normal tilt matches atan(A·k)
        let expected_tilt = (0.4 * 2.0 * PI / 8.0).atan();
        let tilt = normal.x.atan2(normal.y);
        assert!((tilt - expected_tilt).abs() < 1e-4);
    }

    #[test]
    fn test_normal_is_normalized() {
        let field = WaveField::default();
        let normal = field.normal(5.0, 5.0, 1.0);
        assert!((normal.length() - 1.0).abs() < 0.001, "Normal should be unit length");
    }

    #[test]
    fn test_depth_and_underwater() {
        let field = WaveField::new(WaveSet::still());
        assert!(field.is_underwater(Vec3::new(0.0, -1.0, 0.0), 0.0));
        assert!(!field.is_underwater(Vec3::new(0.0, 1.0, 0.0), 0.0));
        assert_eq!(field.depth_at(Vec3::new(0.0, -3.0, 0.0), 2.0), 3.0);
    }

    #[test]
    fn test_sample_matches_individual_queries() {
        let field = WaveField::default();
        let sample = field.sample(3.0, -1.5, 2.25);
        assert_eq!(sample.height, field.height(3.0, -1.5, 2.25));
        assert_eq!(sample.normal, field.normal(3.0, -1.5, 2.25));
        assert_eq!(sample.position, field.displaced_position(3.0, -1.5, 2.25));
    }

    proptest! {
        #[test]
        fn prop_single_wave_height_is_bounded(
            amplitude in 0.0f32..3.0,
            x in -200.0f32..200.0,
            z in -200.0f32..200.0,
            t in 0.0f32..600.0,
        ) {
            let field = single_wave(amplitude, 0.5);
            let h = field.height(x, z, t);
            prop_assert!(h <= amplitude + 1e-5 && h >= -amplitude - 1e-5);
        }

        #[test]
        fn prop_height_is_sum_of_waves(
            x in -100.0f32..100.0,
            z in -100.0f32..100.0,
            t in 0.0f32..100.0,
        ) {
            let field = WaveField::default();
            let total: f32 = field
                .waves()
                .waves()
                .iter()
                .map(|w| {
                    let single = WaveField::new(WaveSet::new([*w]).unwrap());
                    single.height(x, z, t)
                })
                .sum();
            prop_assert!((field.height(x, z, t) - total).abs() < 1e-4);
        }
    }
}
