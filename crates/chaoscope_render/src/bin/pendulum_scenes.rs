//! Solves the pendulum models and writes their animation/energy scenes:
//! a plain and a damped single pendulum, plus the three-run double-pendulum
//! comparison whose nearby initial conditions diverge chaotically.

use anyhow::{Context, Result};
use chaoscope_core::models::{
    AngleUnit, DoublePendulum, DoublePendulumSim, Pendulum, PendulumSim,
};
use chaoscope_render::{export_frames, FrameSeries, JsonSceneExporter};
use clap::Parser;
use std::f64::consts::FRAC_PI_2;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(about = "Produce pendulum animation and energy scenes")]
struct Args {
    /// Directory the scene files are written to.
    #[arg(long, default_value = "scenes")]
    out_dir: PathBuf,

    /// Simulated duration in seconds.
    #[arg(long, default_value_t = 10.0)]
    duration: f64,

    /// Sample spacing in seconds.
    #[arg(long, default_value_t = 0.01)]
    dt: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args = Args::parse();
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;
    let mut exporter = JsonSceneExporter::new(&args.out_dir);

    let mut plain = PendulumSim::new(Pendulum::default());
    plain.solve([FRAC_PI_2, 0.0], args.duration, args.dt, AngleUnit::Radians)?;
    export_frames(
        &mut exporter,
        &FrameSeries::from_pendulum(&plain, "pendulum")?,
        "pendulum.png",
    )?;

    let mut damped = PendulumSim::new(Pendulum::default().with_damping(0.2));
    damped.solve([FRAC_PI_2, 0.0], args.duration, args.dt, AngleUnit::Radians)?;
    export_frames(
        &mut exporter,
        &FrameSeries::from_pendulum(&damped, "damped pendulum")?,
        "damped_pendulum.png",
    )?;

    // Nearby starts, wildly different paths.
    let starts: [[f64; 4]; 3] = [
        [1.0, 1.0, 1.0, 1.0],
        [1.0, 1.2, 1.0, 1.2],
        [1.0, 1.4, 1.0, 1.4],
    ];
    for (index, y0) in starts.iter().enumerate() {
        let mut sim = DoublePendulumSim::new(DoublePendulum::default());
        sim.solve(*y0, args.duration, args.dt, AngleUnit::Radians)?;
        let title = format!("double pendulum, omega0 = {}", y0[1]);
        export_frames(
            &mut exporter,
            &FrameSeries::from_double_pendulum(&sim, &title)?,
            &format!("double_pendulum_{}.png", index + 1),
        )?;
    }

    info!(out_dir = %args.out_dir.display(), "all pendulum scenes written");
    Ok(())
}
