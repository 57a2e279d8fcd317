pub const TICKS_PER_SECOND: u64 = 60;
/// Fixed simulation step in seconds.
pub const FIXED_DT: f32 = 1.0 / TICKS_PER_SECOND as f32;
/// Upper bound on fixed steps run for a single frame.
pub const MAX_SUBSTEPS: u32 = 5;

/// Seawater density (kg/m³).
pub const SEAWATER_DENSITY: f32 = 1025.0;
/// Gravity acceleration (m/s²), negative for downward.
pub const GRAVITY: f32 = -9.81;

pub const MAX_HEALTH: f32 = 100.0;
pub const MAX_HUNGER: f32 = 100.0;
