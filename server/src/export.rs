//! WGSL export of the configured wave field.

use bevy::math::Vec2;
use bevy_log::info;
use shared::water::{generate_wgsl, shader::max_height_mismatch, ShaderParseError, WaveField};
use shared::{ConfigError, SimulationConfig};
use std::{fs, io, path::Path};
use thiserror::Error;

/// Height difference above which the exported shader is reported as out of
/// sync with the CPU field.
pub const MISMATCH_TOLERANCE: f32 = 1e-3;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Shader(#[from] ShaderParseError),
    #[error("could not write {path}: {source}")]
    Write { path: String, source: io::Error },
}

fn probes() -> Vec<(Vec2, f32)> {
    (0..16)
        .map(|i| {
            let f = i as f32;
            (Vec2::new(f * 3.7 - 30.0, 25.0 - f * 2.9), f * 0.75)
        })
        .collect()
}

/// Write the wave module to `path` and return the largest height mismatch
/// between the written table and the CPU field.
pub fn export_shader(config: &SimulationConfig, path: &Path) -> Result<f32, ExportError> {
    let field = WaveField::new(config.wave_set()?);
    let source = generate_wgsl(&field);
    let mismatch = max_height_mismatch(&field, &source, &probes())?;
    if mismatch > MISMATCH_TOLERANCE {
        log::warn!("Exported wave table differs from the CPU field by {mismatch}");
    }

    fs::write(path, &source).map_err(|source| ExportError::Write {
        path: path.display().to_string(),
        source,
    })?;
    info!("Wrote {} waves to {}", field.constants().len(), path.display());
    Ok(mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_writes_matching_shader() {
        let path = std::env::temp_dir().join(format!("openwater-export-{}.wgsl", std::process::id()));
        let mismatch = export_shader(&SimulationConfig::default(), &path).unwrap();
        assert!(mismatch < MISMATCH_TOLERANCE, "mismatch {mismatch}");

        let source = fs::read_to_string(&path).unwrap();
        assert!(source.contains("gerstner_height"));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_export_reports_unwritable_path() {
        let path = std::env::temp_dir().join("openwater-missing-dir").join("waves.wgsl");
        assert!(matches!(
            export_shader(&SimulationConfig::default(), &path),
            Err(ExportError::Write { .. })
        ));
    }
}
