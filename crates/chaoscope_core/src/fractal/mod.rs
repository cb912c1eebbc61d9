pub mod chaos_game;
pub mod fern;
pub mod variations;

pub use chaos_game::{ChaosGame, PointCloud};
pub use fern::{barnsley_fern, AffineMap, IteratedFunctionSystem};
pub use variations::{cloud_coordinates, Blend, PointMap, Variation};
