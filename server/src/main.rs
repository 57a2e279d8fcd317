use clap::Parser;
use server::export::export_shader;
use server::init::{self, ServerOptions};
use shared::SimulationConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// RON simulation config; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured RNG seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Exit after this many seconds
    #[arg(short, long)]
    run_for: Option<f32>,

    #[arg(short, long, default_value_t = 5.0)]
    telemetry_interval: f32,

    /// Write the WGSL wave module to this path and exit
    #[arg(long)]
    export_shader: Option<PathBuf>,

    #[arg(long)]
    paused: bool,
}

fn main() {
    let args = Args::parse();

    if args.telemetry_interval.is_nan() || args.telemetry_interval <= 0.0 {
        eprintln!("Error: telemetry_interval must be positive.");
        eprintln!("Got: {}", args.telemetry_interval);
        std::process::exit(1);
    }

    let mut config = match &args.config {
        Some(path) => match SimulationConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Error loading {}: {err}", path.display());
                std::process::exit(1);
            }
        },
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    if let Some(path) = &args.export_shader {
        match export_shader(&config, path) {
            Ok(mismatch) => println!("Wrote {} (max height mismatch {mismatch:e})", path.display()),
            Err(err) => {
                eprintln!("Error: {err}");
                std::process::exit(1);
            }
        }
        return;
    }

    let options = ServerOptions {
        run_for: args.run_for,
        telemetry_interval: args.telemetry_interval,
        start_paused: args.paused,
    };
    if let Err(err) = init::init(config, options) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
