// Public API
pub use curve::{clamp_points, LevelCurve, LevelProgress};

// Internal modules
mod curve;
