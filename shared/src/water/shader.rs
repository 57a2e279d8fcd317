//! WGSL export of the wave field.
//!
//! The generated module bakes the per-wave constants of a [`WaveField`] into
//! a `GerstnerWave` table and exposes `gerstner_height`,
//! `gerstner_displacement` and `gerstner_normal`, which evaluate the same
//! closed-form expressions as the CPU path. Any change to the wave set must
//! regenerate the shader.
//!
//! Constants are written with Rust's shortest round-trip float formatting,
//! so [`parse_wave_table`] recovers bit-identical values from the source.

use bevy::math::{Vec2, Vec3};
use thiserror::Error;

use super::field::{WaveConstants, WaveField};

const TABLE_BEGIN: &str = "// wave-table: begin";
const TABLE_END: &str = "// wave-table: end";
const ENTRY_PREFIX: &str = "GerstnerWave(";

#[derive(Debug, Error, PartialEq)]
pub enum ShaderParseError {
    #[error("generated shader has no wave table")]
    MissingTable,
    #[error("malformed wave table entry on line {line}: {text}")]
    MalformedEntry { line: usize, text: String },
}

/// Generate the WGSL wave module for a field.
pub fn generate_wgsl(field: &WaveField) -> String {
    let constants = field.constants();
    let count = constants.len();
    let mut src = String::new();

    src.push_str(
        "// Generated from the simulation wave set. Do not edit by hand;\n\
         // regenerate whenever the wave parameters change.\n\n",
    );
    src.push_str(
        "struct GerstnerWave {\n    direction: vec2<f32>,\n    k: f32,\n    speed: f32,\n    amplitude: f32,\n    steepness: f32,\n}\n\n",
    );
    src.push_str(&format!("const WAVE_COUNT: u32 = {count}u;\n\n"));

    src.push_str(TABLE_BEGIN);
    src.push('\n');
    if count > 0 {
        src.push_str(&format!(
            "var<private> WAVES: array<GerstnerWave, {count}> = array<GerstnerWave, {count}>(\n"
        ));
        for wc in constants {
            src.push_str(&format!(
                "    {ENTRY_PREFIX}vec2<f32>({:?}, {:?}), {:?}, {:?}, {:?}, {:?}),\n",
                wc.direction.x, wc.direction.y, wc.k, wc.speed, wc.amplitude, wc.steepness
            ));
        }
        src.push_str(");\n");
    }
    src.push_str(TABLE_END);
    src.push_str("\n\n");

    if count == 0 {
        src.push_str(STILL_FUNCTIONS);
    } else {
        src.push_str(WAVE_FUNCTIONS);
    }
    src
}

const WAVE_FUNCTIONS: &str = r#"fn gerstner_phase(w: GerstnerWave, p: vec2<f32>, t: f32) -> f32 {
    return w.k * (dot(w.direction, p) - w.speed * t);
}

fn gerstner_height(p: vec2<f32>, t: f32) -> f32 {
    var h = 0.0;
    for (var i = 0u; i < WAVE_COUNT; i = i + 1u) {
        let w = WAVES[i];
        h = h + w.amplitude * cos(gerstner_phase(w, p, t));
    }
    return h;
}

fn gerstner_displacement(p: vec2<f32>, t: f32) -> vec3<f32> {
    var d = vec3<f32>(0.0, 0.0, 0.0);
    for (var i = 0u; i < WAVE_COUNT; i = i + 1u) {
        let w = WAVES[i];
        let f = gerstner_phase(w, p, t);
        let qa = w.steepness * w.amplitude;
        d.x = d.x - qa * w.direction.x * sin(f);
        d.y = d.y + w.amplitude * cos(f);
        d.z = d.z - qa * w.direction.y * sin(f);
    }
    return d;
}

fn gerstner_normal(p: vec2<f32>, t: f32) -> vec3<f32> {
    var tangent = vec3<f32>(1.0, 0.0, 0.0);
    var binormal = vec3<f32>(0.0, 0.0, 1.0);
    for (var i = 0u; i < WAVE_COUNT; i = i + 1u) {
        let w = WAVES[i];
        let f = gerstner_phase(w, p, t);
        let ka = w.k * w.amplitude;
        let qka = w.steepness * ka;
        let dx = w.direction.x;
        let dz = w.direction.y;
        tangent = tangent - vec3<f32>(qka * dx * dx * cos(f), ka * dx * sin(f), qka * dx * dz * cos(f));
        binormal = binormal - vec3<f32>(qka * dx * dz * cos(f), ka * dz * sin(f), qka * dz * dz * cos(f));
    }
    return normalize(cross(binormal, tangent));
}
"#;

const STILL_FUNCTIONS: &str = r#"fn gerstner_height(p: vec2<f32>, t: f32) -> f32 {
    return 0.0;
}

fn gerstner_displacement(p: vec2<f32>, t: f32) -> vec3<f32> {
    return vec3<f32>(0.0, 0.0, 0.0);
}

fn gerstner_normal(p: vec2<f32>, t: f32) -> vec3<f32> {
    return vec3<f32>(0.0, 1.0, 0.0);
}
"#;

/// Recover the baked wave constants from generated WGSL.
pub fn parse_wave_table(source: &str) -> Result<Vec<WaveConstants>, ShaderParseError> {
    let mut lines = source.lines().enumerate();
    lines
        .by_ref()
        .find(|(_, line)| line.trim() == TABLE_BEGIN)
        .ok_or(ShaderParseError::MissingTable)?;

    let mut waves = Vec::new();
    for (index, line) in lines {
        let trimmed = line.trim();
        if trimmed == TABLE_END {
            return Ok(waves);
        }
        let Some(entry) = trimmed.strip_prefix(ENTRY_PREFIX) else {
            continue;
        };
        let malformed = || ShaderParseError::MalformedEntry {
            line: index + 1,
            text: trimmed.to_string(),
        };
        let numbers = entry
            .replace("vec2<f32>(", "")
            .replace(')', "")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<f32>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| malformed())?;
        let [dir_x, dir_z, k, speed, amplitude, steepness] = numbers[..] else {
            return Err(malformed());
        };
        waves.push(WaveConstants {
            k,
            speed,
            amplitude,
            steepness,
            direction: Vec2::new(dir_x, dir_z),
        });
    }

    Err(ShaderParseError::MissingTable)
}

/// Evaluate `gerstner_height` exactly as the generated WGSL spells it.
pub fn shader_height(waves: &[WaveConstants], p: Vec2, t: f32) -> f32 {
    let mut h = 0.0;
    for w in waves {
        h += w.amplitude * (w.k * (w.direction.dot(p) - w.speed * t)).cos();
    }
    h
}

/// Evaluate `gerstner_displacement` exactly as the generated WGSL spells it.
pub fn shader_displacement(waves: &[WaveConstants], p: Vec2, t: f32) -> Vec3 {
    let mut d = Vec3::ZERO;
    for w in waves {
        let f = w.k * (w.direction.dot(p) - w.speed * t);
        let qa = w.steepness * w.amplitude;
        d.x -= qa * w.direction.x * f.sin();
        d.y += w.amplitude * f.cos();
        d.z -= qa * w.direction.y * f.sin();
    }
    d
}

/// Largest height difference between the CPU field and the exported shader
/// over a set of probe points and times.
pub fn max_height_mismatch(field: &WaveField, source: &str, probes: &[(Vec2, f32)]) -> Result<f32, ShaderParseError> {
    let table = parse_wave_table(source)?;
    Ok(probes
        .iter()
        .map(|&(p, t)| (field.height(p.x, p.y, t) - shader_height(&table, p, t)).abs())
        .fold(0.0, f32::max))
}
