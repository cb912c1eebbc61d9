use crate::error::RenderResult;
use chaoscope_core::fractal::{cloud_coordinates, ChaosGame, IteratedFunctionSystem, PointMap};
use chaoscope_core::models::{DoublePendulumSim, PendulumSim};
use serde::Serialize;

/// A 2D point scatter ready for an external rasterizer: attractor corners
/// (possibly none), the sampled points and an optional per-point color value.
#[derive(Debug, Clone, Serialize)]
pub struct ScatterScene {
    pub title: String,
    pub corners: Vec<[f64; 2]>,
    pub points: Vec<[f64; 2]>,
    pub color: Option<Vec<f64>>,
}

impl ScatterScene {
    /// Scene from an iterated chaos game. Fails with the core's
    /// `NotYetComputed` when `iterate` has not run.
    pub fn from_chaos_game(game: &ChaosGame, title: &str, colored: bool) -> RenderResult<Self> {
        let cloud = game.cloud()?;
        let color = if colored {
            Some(game.gradient_color()?)
        } else {
            None
        };
        Ok(Self {
            title: title.to_string(),
            corners: game.corners().to_vec(),
            points: cloud.points.clone(),
            color,
        })
    }

    /// Scene from an iterated function system.
    pub fn from_ifs(ifs: &IteratedFunctionSystem, title: &str) -> RenderResult<Self> {
        let cloud = ifs.cloud()?;
        Ok(Self {
            title: title.to_string(),
            corners: Vec::new(),
            points: cloud.points.clone(),
            color: None,
        })
    }

    /// Scene from a chaos game pushed through a variation (or blend).
    /// The remapped points leave the n-gon frame, so no corners are kept.
    pub fn from_mapped_game(
        game: &ChaosGame,
        mapper: &impl PointMap,
        title: &str,
        colored: bool,
    ) -> RenderResult<Self> {
        let cloud = game.cloud()?;
        let (xs, ys) = cloud_coordinates(cloud);
        let (us, vs) = mapper.map(&xs, &ys)?;
        let color = if colored {
            Some(game.gradient_color()?)
        } else {
            None
        };
        Ok(Self {
            title: title.to_string(),
            corners: Vec::new(),
            points: us.into_iter().zip(vs).map(|(u, v)| [u, v]).collect(),
            color,
        })
    }
}

/// Animation frames plus energy series from a solved pendulum simulation.
/// Each frame holds the rod polyline from the pivot through every bob.
#[derive(Debug, Clone, Serialize)]
pub struct FrameSeries {
    pub title: String,
    pub times: Vec<f64>,
    pub frames: Vec<Vec<[f64; 2]>>,
    pub kinetic: Vec<f64>,
    pub potential: Vec<f64>,
}

impl FrameSeries {
    pub fn from_pendulum(sim: &PendulumSim, title: &str) -> RenderResult<Self> {
        let times = sim.times()?.to_vec();
        let x = sim.x()?;
        let y = sim.y()?;
        let frames = x
            .iter()
            .zip(&y)
            .map(|(&x, &y)| vec![[0.0, 0.0], [x, y]])
            .collect();
        Ok(Self {
            title: title.to_string(),
            times,
            frames,
            kinetic: sim.kinetic()?,
            potential: sim.potential()?,
        })
    }

    pub fn from_double_pendulum(sim: &DoublePendulumSim, title: &str) -> RenderResult<Self> {
        let times = sim.times()?.to_vec();
        let (x1, y1) = (sim.x1()?, sim.y1()?);
        let (x2, y2) = (sim.x2()?, sim.y2()?);
        let frames = (0..times.len())
            .map(|i| vec![[0.0, 0.0], [x1[i], y1[i]], [x2[i], y2[i]]])
            .collect();
        Ok(Self {
            title: title.to_string(),
            times,
            frames,
            kinetic: sim.kinetic()?,
            potential: sim.potential()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameSeries, ScatterScene};
    use crate::error::RenderError;
    use chaoscope_core::fractal::{ChaosGame, Variation};
    use chaoscope_core::models::{AngleUnit, Pendulum, PendulumSim};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn scene_from_un_iterated_game_surfaces_the_core_error() {
        let game = ChaosGame::new(3, 0.5).expect("valid parameters");
        let result = ScatterScene::from_chaos_game(&game, "triangle", false);
        assert!(matches!(result, Err(RenderError::Core(_))));
    }

    #[test]
    fn colored_scene_carries_one_color_per_point() {
        let mut game = ChaosGame::new(3, 0.5).expect("valid parameters");
        game.iterate(200, &mut StdRng::seed_from_u64(1));
        let scene =
            ScatterScene::from_chaos_game(&game, "triangle", true).expect("scene should build");
        assert_eq!(scene.points.len(), 200);
        assert_eq!(scene.corners.len(), 3);
        assert_eq!(scene.color.as_ref().map(Vec::len), Some(200));
    }

    #[test]
    fn mapped_scene_applies_the_variation() {
        let mut game = ChaosGame::new(4, 1.0 / 3.0).expect("valid parameters");
        game.iterate(100, &mut StdRng::seed_from_u64(2));
        let scene = ScatterScene::from_mapped_game(&game, &Variation::Linear, "linear", false)
            .expect("scene should build");
        let cloud = game.cloud().expect("iterated");
        // Linear keeps x and flips y (screen orientation).
        assert_eq!(scene.points[0][0], cloud.points[0][0]);
        assert_eq!(scene.points[0][1], -cloud.points[0][1]);
    }

    #[test]
    fn frame_series_has_one_rod_polyline_per_sample() {
        let mut sim = PendulumSim::new(Pendulum::default());
        sim.solve([1.0, 0.0], 2.0, 0.1, AngleUnit::Radians)
            .expect("solve should succeed");
        let series = FrameSeries::from_pendulum(&sim, "pendulum").expect("series should build");
        assert_eq!(series.frames.len(), series.times.len());
        assert_eq!(series.kinetic.len(), series.times.len());
        for frame in &series.frames {
            assert_eq!(frame[0], [0.0, 0.0]);
            assert_eq!(frame.len(), 2);
        }
    }
}
