//! Kinetic Layer - decorative 2D kinetic simulations for a web page
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entity store, spawners, steppers, collisions)
//! - `renderer`: Render sink abstraction and handle registry
//! - `platform`: Browser host (DOM surface, input adapters, frame loop)
//! - `config`: Data-driven tunables

pub mod config;
pub mod error;
pub mod platform;
pub mod renderer;
pub mod sim;

pub use config::{DensityPreset, FreeConfig, LaneConfig, SimConfig};
pub use error::ConfigError;

/// Frame timing constants
pub mod consts {
    /// Fixed simulation timestep (one tick per 60 Hz display frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Same step in milliseconds, the unit spawn clocks count in
    pub const SIM_DT_MS: f32 = SIM_DT * 1000.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;
    /// Frame deltas above this (seconds) are clamped, e.g. after a background tab resumes
    pub const MAX_FRAME_DT: f32 = 0.1;
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Position of `v` within `[a, b]` as a fraction, clamped to [0, 1]
///
/// A degenerate range maps everything to 0.
#[inline]
pub fn inverse_lerp(a: f32, b: f32, v: f32) -> f32 {
    let span = b - a;
    if span.abs() <= f32::EPSILON {
        return 0.0;
    }
    ((v - a) / span).clamp(0.0, 1.0)
}

/// Map a size to a speed: the smallest size gets the fastest speed and vice versa
#[inline]
pub fn speed_for_size(size: f32, min_size: f32, max_size: f32, min_speed: f32, max_speed: f32) -> f32 {
    let t = inverse_lerp(min_size, max_size, size);
    lerp(max_speed, min_speed, t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_lerp_degenerate_range() {
        assert_eq!(inverse_lerp(5.0, 5.0, 7.0), 0.0);
        assert!((inverse_lerp(0.0, 10.0, 2.5) - 0.25).abs() < 1e-6);
        assert_eq!(inverse_lerp(0.0, 10.0, 20.0), 1.0);
    }

    #[test]
    fn test_speed_for_size_endpoints() {
        let fast = speed_for_size(80.0, 80.0, 140.0, 0.6, 1.6);
        let slow = speed_for_size(140.0, 80.0, 140.0, 0.6, 1.6);
        assert!((fast - 1.6).abs() < 1e-6);
        assert!((slow - 0.6).abs() < 1e-6);
    }
}
