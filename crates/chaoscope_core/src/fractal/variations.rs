use crate::error::{CoreError, CoreResult};
use crate::fractal::chaos_game::PointCloud;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// A nonlinear coordinate remapping applied pointwise to a cloud.
///
/// Implemented by the fixed [`Variation`] catalog and by [`Blend`]; the
/// default `map` walks equal-length coordinate slices.
pub trait PointMap {
    fn apply(&self, x: f64, y: f64) -> (f64, f64);

    fn map(&self, xs: &[f64], ys: &[f64]) -> CoreResult<(Vec<f64>, Vec<f64>)> {
        if xs.len() != ys.len() {
            return Err(CoreError::InvalidParameter(format!(
                "coordinate arrays differ in length: {} vs {}",
                xs.len(),
                ys.len()
            )));
        }
        let mut out_x = Vec::with_capacity(xs.len());
        let mut out_y = Vec::with_capacity(ys.len());
        for (&x, &y) in xs.iter().zip(ys) {
            let (u, v) = self.apply(x, y);
            out_x.push(u);
            out_y.push(v);
        }
        Ok((out_x, out_y))
    }
}

// Fixed shape parameters of the blob and curl formulas.
const BLOB_HIGH: f64 = 3.0;
const BLOB_LOW: f64 = 1.0;
const BLOB_WAVES: f64 = -5.0;
const CURL_C1: f64 = 0.9;
const CURL_C2: f64 = 0.4;

/// The closed catalog of variations. Unknown names are rejected at parse
/// time; there is no open-ended dispatch.
///
/// Each formula sees the point both as `(x, y)` and in polar form
/// `r = sqrt(x^2 + y^2)`, `theta = atan2(y, x)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variation {
    Linear,
    Handkerchief,
    Swirl,
    Disc,
    Exponential,
    Ex,
    Blob,
    Curl,
}

impl Variation {
    pub const ALL: [Variation; 8] = [
        Variation::Linear,
        Variation::Handkerchief,
        Variation::Swirl,
        Variation::Disc,
        Variation::Exponential,
        Variation::Ex,
        Variation::Blob,
        Variation::Curl,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Variation::Linear => "linear",
            Variation::Handkerchief => "handkerchief",
            Variation::Swirl => "swirl",
            Variation::Disc => "disc",
            Variation::Exponential => "exponential",
            Variation::Ex => "ex",
            Variation::Blob => "blob",
            Variation::Curl => "curl",
        }
    }

    /// Looks a variation up by name; fails with `UnknownVariation` for
    /// anything outside the catalog.
    pub fn parse(name: &str) -> CoreResult<Self> {
        match name {
            "linear" => Ok(Variation::Linear),
            "handkerchief" => Ok(Variation::Handkerchief),
            "swirl" => Ok(Variation::Swirl),
            "disc" => Ok(Variation::Disc),
            "exponential" => Ok(Variation::Exponential),
            "ex" => Ok(Variation::Ex),
            "blob" => Ok(Variation::Blob),
            "curl" => Ok(Variation::Curl),
            other => Err(CoreError::UnknownVariation(other.to_string())),
        }
    }
}

impl PointMap for Variation {
    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let r = x.hypot(y);
        let theta = y.atan2(x);
        match self {
            Variation::Linear => (x, y),
            Variation::Handkerchief => ((theta + r).sin() * r, (theta - r).cos() * r),
            Variation::Swirl => {
                let r_sq = r * r;
                (
                    x * r_sq.sin() - y * r_sq.cos(),
                    x * r_sq.cos() + y * r_sq.sin(),
                )
            }
            Variation::Disc => {
                let lead = theta / PI;
                (lead * (PI * r).sin(), lead * (PI * r).cos())
            }
            Variation::Exponential => {
                let scale = (x - 1.0).exp();
                (scale * (PI * y).cos(), scale * (PI * y).sin())
            }
            Variation::Ex => {
                let p0 = (theta + r).sin();
                let p1 = (theta - r).cos();
                let (p0_cubed, p1_cubed) = (p0 * p0 * p0, p1 * p1 * p1);
                (r * (p0_cubed + p1_cubed), r * (p0_cubed - p1_cubed))
            }
            Variation::Blob => {
                let wave = (BLOB_WAVES * theta).sin();
                let c = r * (BLOB_LOW + (BLOB_HIGH - BLOB_LOW) / 2.0 * (wave + 1.0));
                (c * theta.cos(), c * theta.sin())
            }
            Variation::Curl => {
                let t1 = 1.0 + CURL_C1 * x + CURL_C2 * (x * x - y * y);
                let t2 = CURL_C1 * y + 2.0 * CURL_C2 * x * y;
                let inv = 1.0 / (t1 * t1 + t2 * t2);
                (inv * (x * t1 + y * t2), inv * (y * t1 - x * t2))
            }
        }
    }
}

impl FromStr for Variation {
    type Err = CoreError;

    fn from_str(name: &str) -> CoreResult<Self> {
        Variation::parse(name)
    }
}

impl fmt::Display for Variation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pointwise weighted combination `w * first + (1 - w) * second` of two
/// configured variations, evaluated lazily on every call.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Blend {
    first: Variation,
    second: Variation,
    weight: f64,
}

impl Blend {
    /// Fails with `InvalidParameter` unless `weight` lies in `[0, 1]`.
    pub fn new(first: Variation, second: Variation, weight: f64) -> CoreResult<Self> {
        if !(0.0..=1.0).contains(&weight) {
            return Err(CoreError::InvalidParameter(format!(
                "blend weight must lie in [0, 1], got {weight}"
            )));
        }
        Ok(Self {
            first,
            second,
            weight,
        })
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

impl PointMap for Blend {
    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let (u1, v1) = self.first.apply(x, y);
        let (u2, v2) = self.second.apply(x, y);
        let w = self.weight;
        (w * u1 + (1.0 - w) * u2, w * v1 + (1.0 - w) * v2)
    }
}

/// Splits a cloud into coordinate arrays in the screen-oriented frame the
/// variations expect (y axis flipped).
pub fn cloud_coordinates(cloud: &PointCloud) -> (Vec<f64>, Vec<f64>) {
    let xs = cloud.points.iter().map(|p| p[0]).collect();
    let ys = cloud.points.iter().map(|p| -p[1]).collect();
    (xs, ys)
}
