//! Samples the fractal generators and writes their scatter scenes: chaos
//! games over a range of n-gons, the Barnsley fern, the full variation
//! catalog over one game, and a blend-weight sweep.

use anyhow::{Context, Result};
use chaoscope_core::fractal::{barnsley_fern, Blend, ChaosGame, Variation};
use chaoscope_render::{export_scatter, JsonSceneExporter, ScatterScene};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(about = "Produce chaos-game, fern and variation scatter scenes")]
struct Args {
    /// Directory the scene files are written to.
    #[arg(long, default_value = "scenes")]
    out_dir: PathBuf,

    /// Base seed; every sampler below derives its own stream from it.
    #[arg(long, default_value_t = 2023)]
    seed: u64,

    /// Recorded steps per chaos game.
    #[arg(long, default_value_t = 10_000)]
    steps: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args = Args::parse();
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;
    let mut exporter = JsonSceneExporter::new(&args.out_dir);

    // Each run gets an independently seeded generator.
    let mut next_seed = {
        let mut counter = 0u64;
        move || {
            counter += 1;
            args.seed.wrapping_add(counter)
        }
    };

    let configurations = [(3, 0.5), (4, 1.0 / 3.0), (5, 1.0 / 3.0), (5, 3.0 / 8.0), (6, 1.0 / 3.0)];
    for (index, &(n, r)) in configurations.iter().enumerate() {
        let mut game = ChaosGame::new(n, r)?;
        game.iterate(args.steps, &mut StdRng::seed_from_u64(next_seed()));
        let title = format!("{n}-gon chaos game, r = {r:.3}");
        export_scatter(
            &mut exporter,
            &ScatterScene::from_chaos_game(&game, &title, true)?,
            &format!("chaos{}.png", index + 1),
        )?;
    }

    let mut fern = barnsley_fern();
    fern.iterate(50_000, &mut StdRng::seed_from_u64(next_seed()));
    export_scatter(
        &mut exporter,
        &ScatterScene::from_ifs(&fern, "barnsley fern")?,
        "barnsley_fern.png",
    )?;

    let mut square_game = ChaosGame::new(4, 1.0 / 3.0)?;
    square_game.iterate(args.steps, &mut StdRng::seed_from_u64(next_seed()));
    for variation in Variation::ALL {
        export_scatter(
            &mut exporter,
            &ScatterScene::from_mapped_game(&square_game, &variation, variation.name(), true)?,
            &format!("variation_{variation}.png"),
        )?;
    }

    let mut triangle_game = ChaosGame::new(3, 0.5)?;
    triangle_game.iterate(args.steps, &mut StdRng::seed_from_u64(next_seed()));
    for (index, weight) in [0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0].into_iter().enumerate() {
        let blend = Blend::new(Variation::Blob, Variation::Linear, weight)?;
        let title = format!("blob/linear blend, w = {weight:.2}");
        export_scatter(
            &mut exporter,
            &ScatterScene::from_mapped_game(&triangle_game, &blend, &title, true)?,
            &format!("blend_{}.png", index + 1),
        )?;
    }

    info!(out_dir = %args.out_dir.display(), "all fractal scenes written");
    Ok(())
}
