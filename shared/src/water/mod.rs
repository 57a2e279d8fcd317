//! Ocean surface shared by CPU physics and the rendered water.
//!
//! ```text
//!            WaveSet (validated config)
//!                      │
//!                      ▼
//!                  WaveField ──────────────┐
//!                      │                   │
//!          ┌───────────┴─────────┐         ▼
//!          ▼                     ▼     shader::generate_wgsl
//!   BuoyancyModel          depth queries   (visual surface)
//! ```
//!
//! The CPU field and the generated shader use the same per-wave constants,
//! so buoyancy and the rendered crests agree at every point and time.

pub mod config;
pub mod field;
pub mod shader;

pub use config::{WaveParams, WavePreset, WaveSet};
pub use field::{WaterSample, WaveConstants, WaveField};
pub use shader::{generate_wgsl, parse_wave_table, ShaderParseError};
