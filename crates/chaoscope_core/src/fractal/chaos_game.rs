use crate::error::{CoreError, CoreResult};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Points produced by a stochastic sampler, each tagged with the index of
/// the attractor (corner or map) chosen at that step.
///
/// Produced once by an `iterate` call and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    pub points: Vec<[f64; 2]>,
    pub labels: Vec<u32>,
}

impl PointCloud {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Warm-up steps discarded before recording begins.
pub const DEFAULT_WARMUP: usize = 5;

/// The chaos game on a regular n-gon inscribed in the unit circle.
///
/// Corner `i` sits at `(sin(2 pi i / n), cos(2 pi i / n))`; each step moves
/// the current point the fraction `1 - r` of the way to a uniformly chosen
/// corner. Randomness comes from the injected `Rng`, so a seeded generator
/// reproduces the cloud exactly.
#[derive(Debug, Clone, Serialize)]
pub struct ChaosGame {
    n: usize,
    ratio: f64,
    corners: Vec<[f64; 2]>,
    cloud: Option<PointCloud>,
}

impl ChaosGame {
    /// Fails with `InvalidParameter` unless `n > 2` and `r` lies in the open
    /// interval `(0, 1)`.
    pub fn new(n: usize, ratio: f64) -> CoreResult<Self> {
        if n <= 2 {
            return Err(CoreError::InvalidParameter(format!(
                "an n-gon needs at least 3 corners, got {n}"
            )));
        }
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(CoreError::InvalidParameter(format!(
                "contraction ratio must lie in (0, 1), got {ratio}"
            )));
        }

        let corners = (0..n)
            .map(|i| {
                let angle = std::f64::consts::TAU * i as f64 / n as f64;
                [angle.sin(), angle.cos()]
            })
            .collect();

        Ok(Self {
            n,
            ratio,
            corners,
            cloud: None,
        })
    }

    pub fn corner_count(&self) -> usize {
        self.n
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn corners(&self) -> &[[f64; 2]] {
        &self.corners
    }

    /// A random convex combination of all corners: uniform weights,
    /// normalized to sum 1.
    pub fn starting_point<R: Rng>(&self, rng: &mut R) -> [f64; 2] {
        let mut weights: Vec<f64> = (0..self.n).map(|_| rng.random::<f64>()).collect();
        let sum: f64 = weights.iter().sum();
        for w in &mut weights {
            *w /= sum;
        }
        let mut point = [0.0, 0.0];
        for (w, corner) in weights.iter().zip(&self.corners) {
            point[0] += w * corner[0];
            point[1] += w * corner[1];
        }
        point
    }

    /// Runs the game with the default warm-up of [`DEFAULT_WARMUP`] steps.
    pub fn iterate<R: Rng>(&mut self, steps: usize, rng: &mut R) {
        self.iterate_with_warmup(steps, DEFAULT_WARMUP, rng);
    }

    /// Runs `warmup` unrecorded steps from a random starting point, then
    /// `steps` recorded steps, storing each point and chosen corner index in
    /// order.
    pub fn iterate_with_warmup<R: Rng>(&mut self, steps: usize, warmup: usize, rng: &mut R) {
        let mut point = self.starting_point(rng);
        for _ in 0..warmup {
            let corner = rng.random_range(0..self.n);
            point = self.step_toward(point, corner);
        }

        let mut points = Vec::with_capacity(steps);
        let mut labels = Vec::with_capacity(steps);
        for _ in 0..steps {
            let corner = rng.random_range(0..self.n);
            point = self.step_toward(point, corner);
            points.push(point);
            labels.push(corner as u32);
        }

        debug!(n = self.n, steps, warmup, "chaos game sampled");
        self.cloud = Some(PointCloud { points, labels });
    }

    fn step_toward(&self, point: [f64; 2], corner: usize) -> [f64; 2] {
        let c = self.corners[corner];
        [
            self.ratio * point[0] + (1.0 - self.ratio) * c[0],
            self.ratio * point[1] + (1.0 - self.ratio) * c[1],
        ]
    }

    /// The recorded cloud; `NotYetComputed` before `iterate` has run.
    pub fn cloud(&self) -> CoreResult<&PointCloud> {
        self.cloud.as_ref().ok_or(CoreError::NotYetComputed {
            what: "the point cloud",
            run_first: "iterate",
        })
    }

    /// Running-average coloring over the corner labels:
    /// `c[0] = label[0]`, `c[i+1] = (c[i] + label[i+1]) / 2`.
    /// Recomputed on demand; `NotYetComputed` before `iterate` has run.
    pub fn gradient_color(&self) -> CoreResult<Vec<f64>> {
        let labels = &self.cloud()?.labels;
        let mut colors = Vec::with_capacity(labels.len());
        let mut previous = match labels.first() {
            Some(&first) => f64::from(first),
            None => return Ok(colors),
        };
        colors.push(previous);
        for &label in &labels[1..] {
            previous = (previous + f64::from(label)) / 2.0;
            colors.push(previous);
        }
        Ok(colors)
    }
}

#[cfg(test)]
mod tests {
    use super::{ChaosGame, DEFAULT_WARMUP};
    use crate::error::CoreError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn rejects_degenerate_polygons_and_ratios() {
        for (n, r) in [(3, 1.0), (3, 0.0), (1, 0.5), (2, 0.5), (4, f64::NAN)] {
            assert!(
                matches!(ChaosGame::new(n, r), Err(CoreError::InvalidParameter(_))),
                "expected ({n}, {r}) to be rejected"
            );
        }
        assert!(ChaosGame::new(3, 0.5).is_ok());
        assert!(ChaosGame::new(6, 1.0 / 3.0).is_ok());
    }

    #[test]
    fn triangle_corners_match_the_unit_circle_layout() {
        let game = ChaosGame::new(3, 0.5).expect("valid parameters");
        let expected = [
            [0.0, 1.0],
            [3.0_f64.sqrt() / 2.0, -0.5],
            [-(3.0_f64.sqrt()) / 2.0, -0.5],
        ];
        for (corner, expected) in game.corners().iter().zip(&expected) {
            assert!((corner[0] - expected[0]).abs() < 1e-9);
            assert!((corner[1] - expected[1]).abs() < 1e-9);
        }
    }

    #[test]
    fn cloud_before_iterate_is_not_yet_computed() {
        let game = ChaosGame::new(3, 0.5).expect("valid parameters");
        assert!(matches!(
            game.cloud(),
            Err(CoreError::NotYetComputed { .. })
        ));
        assert!(matches!(
            game.gradient_color(),
            Err(CoreError::NotYetComputed { .. })
        ));
    }

    #[test]
    fn identical_seeds_reproduce_identical_clouds() {
        let mut first = ChaosGame::new(5, 1.0 / 3.0).expect("valid parameters");
        let mut second = ChaosGame::new(5, 1.0 / 3.0).expect("valid parameters");
        first.iterate(500, &mut StdRng::seed_from_u64(42));
        second.iterate(500, &mut StdRng::seed_from_u64(42));
        assert_eq!(first.cloud().expect("iterated"), second.cloud().expect("iterated"));

        let mut third = ChaosGame::new(5, 1.0 / 3.0).expect("valid parameters");
        third.iterate(500, &mut StdRng::seed_from_u64(43));
        assert_ne!(first.cloud().expect("iterated"), third.cloud().expect("iterated"));
    }

    #[test]
    fn cloud_has_requested_length_and_stays_in_the_unit_disc() {
        let mut game = ChaosGame::new(4, 0.5).expect("valid parameters");
        game.iterate_with_warmup(1000, DEFAULT_WARMUP, &mut StdRng::seed_from_u64(7));
        let cloud = game.cloud().expect("iterated");
        assert_eq!(cloud.len(), 1000);
        assert_eq!(cloud.labels.len(), 1000);
        for point in &cloud.points {
            // Convex combinations of unit-circle corners stay inside the disc.
            assert!(point[0] * point[0] + point[1] * point[1] <= 1.0 + 1e-9);
        }
        for &label in &cloud.labels {
            assert!((label as usize) < 4);
        }
    }

    #[test]
    fn gradient_color_follows_the_running_average() {
        let mut game = ChaosGame::new(3, 0.5).expect("valid parameters");
        game.iterate(100, &mut StdRng::seed_from_u64(11));
        let labels = &game.cloud().expect("iterated").labels;
        let colors = game.gradient_color().expect("iterated");
        assert_eq!(colors.len(), labels.len());
        assert_eq!(colors[0], f64::from(labels[0]));
        for i in 1..colors.len() {
            assert!((colors[i] - (colors[i - 1] + f64::from(labels[i])) / 2.0).abs() < 1e-12);
        }
    }
}
