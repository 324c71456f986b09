//! Simulation tunables
//!
//! Every force, radius and timing constant lives here so the feel can be tuned
//! without touching the steppers. Persisted overrides are read from LocalStorage.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How busy the decoration layer is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DensityPreset {
    Sparse,
    #[default]
    Normal,
    Dense,
}

impl DensityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            DensityPreset::Sparse => "Sparse",
            DensityPreset::Normal => "Normal",
            DensityPreset::Dense => "Dense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sparse" | "low" => Some(DensityPreset::Sparse),
            "normal" | "medium" => Some(DensityPreset::Normal),
            "dense" | "high" => Some(DensityPreset::Dense),
            _ => None,
        }
    }

    /// Multiplier on the free-roam population cap
    pub fn cap_scale(&self) -> f32 {
        match self {
            DensityPreset::Sparse => 0.5,
            DensityPreset::Normal => 1.0,
            DensityPreset::Dense => 1.5,
        }
    }

    /// Multiplier on spawn intervals (smaller = more frequent)
    pub fn interval_scale(&self) -> f32 {
        match self {
            DensityPreset::Sparse => 1.5,
            DensityPreset::Normal => 1.0,
            DensityPreset::Dense => 0.7,
        }
    }
}

/// Lane simulation tunables. Distances in px, speeds in px per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneConfig {
    pub min_size: f32,
    pub max_size: f32,
    /// Cruise speed of the largest entity
    pub min_speed: f32,
    /// Cruise speed of the smallest entity
    pub max_speed: f32,
    /// Vertical offset of each lane row
    pub lane_rows: [f32; 2],
    /// Fraction of cruise speed shed while hovered, at full strength
    pub hover_slow: f32,
    pub pointer_radius: f32,
    pub pointer_force: f32,
    pub repel_radius: f32,
    pub repel_force: f32,
    /// Fraction of the way toward target velocity covered each tick
    pub damping: f32,
    /// Minimum gap between neighbours in a lane
    pub min_gap: f32,
    /// Fraction of closing velocity redistributed on contact
    pub collision_share: f32,
    /// Distance past the far edge before an entity is despawned
    pub despawn_buffer: f32,
    pub spawn_interval_ms: f32,
    pub initial_delay_ms: f32,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            min_size: 80.0,
            max_size: 140.0,
            min_speed: 0.6,
            max_speed: 1.6,
            lane_rows: [24.0, 184.0],
            hover_slow: 0.85,
            pointer_radius: 160.0,
            pointer_force: 1.2,
            repel_radius: 180.0,
            repel_force: 0.35,
            damping: 0.08,
            min_gap: 24.0,
            collision_share: 1.0,
            despawn_buffer: 60.0,
            spawn_interval_ms: 2400.0,
            initial_delay_ms: 150.0,
        }
    }
}

/// Free-roam simulation tunables. Distances in px, speeds in px per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreeConfig {
    pub min_size: f32,
    pub max_size: f32,
    /// Entry speed magnitude for a mid-sized entity, before jitter
    pub speed: f32,
    /// Smallest entities enter at `speed * (1 + spread)`, largest at `speed * (1 - spread)`
    pub size_speed_spread: f32,
    /// Entry speed is multiplied by a value in [1 - jitter, 1 + jitter]
    pub speed_jitter: f32,
    /// Maximum sideways component of the entry heading, relative to the inward axis
    pub lateral_jitter: f32,
    /// Maximum spin in degrees per tick (either direction)
    pub max_spin: f32,
    /// Inflation of bounding extents during collision checks
    pub collision_buffer: f32,
    pub restitution: f32,
    /// Distance past an edge before an entity wraps to the opposite side
    pub wrap_buffer: f32,
    pub max_entities: usize,
    pub spawn_interval_ms: f32,
    pub initial_delay_ms: f32,
}

impl Default for FreeConfig {
    fn default() -> Self {
        Self {
            min_size: 40.0,
            max_size: 90.0,
            speed: 0.6,
            size_speed_spread: 0.3,
            speed_jitter: 0.25,
            lateral_jitter: 0.6,
            max_spin: 0.4,
            collision_buffer: 6.0,
            restitution: 0.85,
            wrap_buffer: 100.0,
            max_entities: 14,
            spawn_interval_ms: 1600.0,
            initial_delay_ms: 100.0,
        }
    }
}

/// Complete configuration for both simulations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SimConfig {
    pub density: DensityPreset,
    /// Skip the decoration entirely
    pub reduced_motion: bool,
    /// Fixed RNG seed; hosts pick one from the clock when absent
    pub seed: Option<u64>,
    pub lane: LaneConfig,
    pub free: FreeConfig,
}

impl SimConfig {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "kinetic_layer_config";

    /// Parse a (possibly partial) JSON override and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Lane tunables with the density preset applied
    pub fn effective_lane(&self) -> LaneConfig {
        let mut lane = self.lane.clone();
        lane.spawn_interval_ms *= self.density.interval_scale();
        lane
    }

    /// Free-roam tunables with the density preset applied
    pub fn effective_free(&self) -> FreeConfig {
        let mut free = self.free.clone();
        free.spawn_interval_ms *= self.density.interval_scale();
        free.max_entities = (free.max_entities as f32 * self.density.cap_scale()).round() as usize;
        free
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let l = &self.lane;
        check_size_range("lane.min_size", l.min_size, l.max_size)?;
        check_positive("lane.min_speed", l.min_speed)?;
        if !l.max_speed.is_finite() || l.max_speed < l.min_speed {
            return Err(ConfigError::invalid("lane.max_speed", "must be finite and >= min_speed"));
        }
        if !l.lane_rows.iter().all(|y| y.is_finite()) {
            return Err(ConfigError::invalid("lane.lane_rows", "must be finite"));
        }
        check_unit("lane.hover_slow", l.hover_slow)?;
        check_positive("lane.pointer_radius", l.pointer_radius)?;
        check_non_negative("lane.pointer_force", l.pointer_force)?;
        check_positive("lane.repel_radius", l.repel_radius)?;
        check_non_negative("lane.repel_force", l.repel_force)?;
        if !(l.damping > 0.0 && l.damping <= 1.0) {
            return Err(ConfigError::invalid("lane.damping", "must be in (0, 1]"));
        }
        check_non_negative("lane.min_gap", l.min_gap)?;
        check_unit("lane.collision_share", l.collision_share)?;
        check_non_negative("lane.despawn_buffer", l.despawn_buffer)?;
        check_positive("lane.spawn_interval_ms", l.spawn_interval_ms)?;
        check_non_negative("lane.initial_delay_ms", l.initial_delay_ms)?;

        let f = &self.free;
        check_size_range("free.min_size", f.min_size, f.max_size)?;
        check_positive("free.speed", f.speed)?;
        check_unit("free.size_speed_spread", f.size_speed_spread)?;
        check_unit("free.speed_jitter", f.speed_jitter)?;
        check_non_negative("free.lateral_jitter", f.lateral_jitter)?;
        check_non_negative("free.max_spin", f.max_spin)?;
        check_non_negative("free.collision_buffer", f.collision_buffer)?;
        check_unit("free.restitution", f.restitution)?;
        check_non_negative("free.wrap_buffer", f.wrap_buffer)?;
        check_positive("free.spawn_interval_ms", f.spawn_interval_ms)?;
        check_non_negative("free.initial_delay_ms", f.initial_delay_ms)?;
        Ok(())
    }

    /// Load config overrides from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(config) => {
                        log::info!("Loaded config overrides from LocalStorage");
                        return config;
                    }
                    Err(e) => log::warn!("Ignoring stored config: {e}"),
                }
            }
        }

        log::info!("Using default config");
        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        log::debug!("No {} store on native, using defaults", Self::STORAGE_KEY);
        Self::default()
    }
}

fn check_positive(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be finite and > 0"))
    }
}

fn check_non_negative(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be finite and >= 0"))
    }
}

fn check_unit(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be in [0, 1]"))
    }
}

fn check_size_range(field: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    check_positive(field, min)?;
    if max.is_finite() && max >= min {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "size range must satisfy 0 < min <= max"))
    }
}
