//! Deterministic simulation module
//!
//! Both decoration layers live here. This module must stay pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod content;
pub mod free;
pub mod lane;
pub mod spawn;
pub mod store;
pub mod tick;

pub use collision::{CollisionResult, box_overlap, lane_gap, resolve_free_pair, resolve_lane_pair};
pub use content::{ContentItem, ContentQueue, parse_content};
pub use free::{Edge, FreeEntity, FreeSimulation};
pub use lane::{LANE_COUNT, LaneEntity, LaneSimulation, lane_direction};
pub use spawn::SpawnClock;
pub use store::{Entity, EntityId, EntityStore, SnapshotEntry};
pub use tick::{FixedStep, RenderCommands, Simulation, SnapshotPublisher, TickInput, Transform, Viewport};
