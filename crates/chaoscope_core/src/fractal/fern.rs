use crate::error::{CoreError, CoreResult};
use crate::fractal::chaos_game::PointCloud;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Planar affine map `(x, y) -> (a x + b y + e, c x + d y + f)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineMap {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl AffineMap {
    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.b * y + self.e,
            self.c * x + self.d * y + self.f,
        )
    }
}

/// An iterated function system: affine maps sampled by weight, iterated from
/// the origin. The recorded cloud tags each point with the index of the map
/// that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct IteratedFunctionSystem {
    maps: Vec<AffineMap>,
    cumulative: Vec<f64>,
    cloud: Option<PointCloud>,
}

impl IteratedFunctionSystem {
    /// Fails with `InvalidParameter` unless there is at least one map, one
    /// positive weight per map, and the weights sum to 1.
    pub fn new(maps: Vec<AffineMap>, weights: &[f64]) -> CoreResult<Self> {
        if maps.is_empty() {
            return Err(CoreError::InvalidParameter(
                "an IFS needs at least one affine map".into(),
            ));
        }
        if weights.len() != maps.len() {
            return Err(CoreError::InvalidParameter(format!(
                "{} maps but {} weights",
                maps.len(),
                weights.len()
            )));
        }
        if weights.iter().any(|&w| !(w > 0.0)) {
            return Err(CoreError::InvalidParameter(
                "map weights must be positive".into(),
            ));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(CoreError::InvalidParameter(format!(
                "map weights must sum to 1, got {sum}"
            )));
        }

        let mut cumulative = Vec::with_capacity(weights.len());
        let mut acc = 0.0;
        for &w in weights {
            acc += w;
            cumulative.push(acc);
        }
        // Guard the final bucket against rounding in the running sum.
        if let Some(last) = cumulative.last_mut() {
            *last = 1.0;
        }

        Ok(Self {
            maps,
            cumulative,
            cloud: None,
        })
    }

    pub fn maps(&self) -> &[AffineMap] {
        &self.maps
    }

    /// Iterates from the origin, recording `steps` points and map indices.
    pub fn iterate<R: Rng>(&mut self, steps: usize, rng: &mut R) {
        let mut points = Vec::with_capacity(steps);
        let mut labels = Vec::with_capacity(steps);
        let (mut x, mut y) = (0.0, 0.0);
        for _ in 0..steps {
            let draw = rng.random::<f64>();
            let index = self
                .cumulative
                .iter()
                .position(|&edge| draw < edge)
                .unwrap_or(self.maps.len() - 1);
            (x, y) = self.maps[index].apply(x, y);
            points.push([x, y]);
            labels.push(index as u32);
        }

        debug!(maps = self.maps.len(), steps, "ifs sampled");
        self.cloud = Some(PointCloud { points, labels });
    }

    /// The recorded cloud; `NotYetComputed` before `iterate` has run.
    pub fn cloud(&self) -> CoreResult<&PointCloud> {
        self.cloud.as_ref().ok_or(CoreError::NotYetComputed {
            what: "the point cloud",
            run_first: "iterate",
        })
    }
}

/// The classic four-map Barnsley fern.
pub fn barnsley_fern() -> IteratedFunctionSystem {
    IteratedFunctionSystem {
        maps: vec![
            AffineMap::new(0.0, 0.0, 0.0, 0.16, 0.0, 0.0),
            AffineMap::new(0.85, 0.04, -0.04, 0.85, 0.0, 1.60),
            AffineMap::new(0.20, -0.26, 0.23, 0.22, 0.0, 1.60),
            AffineMap::new(-0.15, 0.28, 0.26, 0.24, 0.0, 0.44),
        ],
        cumulative: vec![0.01, 0.86, 0.93, 1.0],
        cloud: None,
    }
}

#[cfg(test)]
mod tests {
    use super::{barnsley_fern, AffineMap, IteratedFunctionSystem};
    use crate::error::CoreError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn stem_only() -> Vec<AffineMap> {
        vec![AffineMap::new(0.0, 0.0, 0.0, 0.16, 0.0, 0.0)]
    }

    #[test]
    fn affine_map_applies_its_coefficients() {
        let map = AffineMap::new(0.85, 0.04, -0.04, 0.85, 0.0, 1.60);
        let (x, y) = map.apply(1.0, 2.0);
        assert!((x - (0.85 + 0.08)).abs() < 1e-12);
        assert!((y - (-0.04 + 1.70 + 1.60)).abs() < 1e-12);
    }

    #[test]
    fn construction_validates_weights() {
        assert!(matches!(
            IteratedFunctionSystem::new(vec![], &[]),
            Err(CoreError::InvalidParameter(_))
        ));
        assert!(matches!(
            IteratedFunctionSystem::new(stem_only(), &[0.5, 0.5]),
            Err(CoreError::InvalidParameter(_))
        ));
        assert!(matches!(
            IteratedFunctionSystem::new(stem_only(), &[-1.0]),
            Err(CoreError::InvalidParameter(_))
        ));
        assert!(matches!(
            IteratedFunctionSystem::new(stem_only(), &[0.9]),
            Err(CoreError::InvalidParameter(_))
        ));
        assert!(IteratedFunctionSystem::new(stem_only(), &[1.0]).is_ok());
    }

    #[test]
    fn cloud_before_iterate_is_not_yet_computed() {
        let fern = barnsley_fern();
        assert!(matches!(
            fern.cloud(),
            Err(CoreError::NotYetComputed { .. })
        ));
    }

    #[test]
    fn identical_seeds_reproduce_identical_ferns() {
        let mut first = barnsley_fern();
        let mut second = barnsley_fern();
        first.iterate(2000, &mut StdRng::seed_from_u64(123));
        second.iterate(2000, &mut StdRng::seed_from_u64(123));
        assert_eq!(first.cloud().expect("iterated"), second.cloud().expect("iterated"));
    }

    #[test]
    fn fern_points_stay_in_the_known_bounding_box() {
        let mut fern = barnsley_fern();
        fern.iterate(5000, &mut StdRng::seed_from_u64(5));
        for point in &fern.cloud().expect("iterated").points {
            assert!(point[0].abs() < 4.0, "x escaped: {}", point[0]);
            assert!(point[1] > -1.0 && point[1] < 11.0, "y escaped: {}", point[1]);
        }
    }
}
