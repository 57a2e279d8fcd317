use crate::agents::{
    spawn_obstacles_system, spawn_scenario_system,
    step::{configure_rapier_system, step_simulation_system},
    BodyIndex,
};
use bevy::prelude::*;
use bevy::transform::TransformPlugin;
use bevy_app::ScheduleRunnerPlugin;
use bevy_rapier3d::prelude::*;
use shared::{ConfigError, Simulation, SimulationConfig, TICKS_PER_SECOND};
use std::time::Duration;

/// Host settings that are not part of the simulation itself.
#[derive(Resource, Debug, Clone)]
pub struct ServerOptions {
    /// Stop after this many seconds of wall time
    pub run_for: Option<f32>,
    pub telemetry_interval: f32,
    pub start_paused: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            run_for: None,
            telemetry_interval: 5.0,
            start_paused: false,
        }
    }
}

#[derive(Resource)]
struct TelemetryTimer(Timer);

fn log_telemetry_system(time: Res<Time>, mut timer: ResMut<TelemetryTimer>, sim: Res<Simulation>) {
    if timer.0.tick(time.delta()).just_finished() {
        info!("{}", sim.telemetry());
    }
}

fn run_limit_system(time: Res<Time>, options: Res<ServerOptions>, sim: Res<Simulation>, mut exit: EventWriter<AppExit>) {
    if let Some(limit) = options.run_for {
        if time.elapsed_secs() >= limit {
            info!("Run limit of {limit}s reached, final state: {}", sim.telemetry());
            exit.write(AppExit::Success);
        }
    }
}

/// Build the simulation and the headless app around it. Blocks until the
/// app exits.
pub fn init(config: SimulationConfig, options: ServerOptions) -> Result<(), ConfigError> {
    let fixed_dt = config.timing.fixed_dt;
    let mut sim = Simulation::new(config)?;
    sim.set_paused(options.start_paused);

    let mut app = App::new();
    app.add_plugins(
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            1.0 / TICKS_PER_SECOND as f64,
        ))),
    );
    app.add_plugins(bevy::log::LogPlugin::default());
    app.add_plugins(TransformPlugin);
    app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule());
    app.insert_resource(Time::<Fixed>::from_seconds(fixed_dt as f64));

    app.insert_resource(TelemetryTimer(Timer::from_seconds(
        options.telemetry_interval,
        TimerMode::Repeating,
    )));
    app.insert_resource(options);
    app.insert_resource(BodyIndex::default());
    app.insert_resource(sim);

    app.add_systems(Startup, (spawn_obstacles_system, spawn_scenario_system));
    app.add_systems(
        FixedUpdate,
        (configure_rapier_system, step_simulation_system)
            .chain()
            .before(PhysicsSet::SyncBackend),
    );
    app.add_systems(Update, (log_telemetry_system, run_limit_system));

    info!("Starting open-water server at {TICKS_PER_SECOND} ticks per second");
    app.run();
    Ok(())
}
