//! Per-tick scheduling surface shared by both simulations
//!
//! Hosts call `Simulation::advance` once per fixed step and forward the returned
//! commands to a render surface. Nothing here depends on a particular frame source.

use serde::{Deserialize, Serialize};

use super::content::ContentItem;
use super::store::{Entity, EntityId, EntityStore, SnapshotEntry};
use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};

/// Visible region the simulation lives in (px)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }
}

/// Input state for a single tick, written by input adapters between ticks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Pointer x within the viewport (None when the pointer left the page)
    pub pointer_x: Option<f32>,
    /// Entity currently under the pointer
    pub hovered: Option<EntityId>,
    /// How faded-out the lane layer is: 0 fully visible, 1 gone
    pub fade: f32,
}

impl TickInput {
    /// Scale for interactive forces: full while visible, zero when faded out
    pub fn strength(&self) -> f32 {
        if self.fade.is_finite() {
            (1.0 - self.fade).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

/// Per-entity transform write
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub id: EntityId,
    pub x: f32,
    pub y: f32,
    /// Degrees; free-roam only
    pub rotation: Option<f32>,
}

/// Everything a render surface must do after one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderCommands {
    pub mounts: Vec<SnapshotEntry>,
    pub unmounts: Vec<EntityId>,
    pub transforms: Vec<Transform>,
}

impl RenderCommands {
    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty() && self.unmounts.is_empty() && self.transforms.is_empty()
    }
}

/// Scheduler-facing interface of a simulation
pub trait Simulation {
    /// Install the content set. An empty set is degraded input and is ignored.
    fn set_content(&mut self, items: Vec<ContentItem>);

    fn set_viewport(&mut self, viewport: Viewport);

    /// Advance one tick; `dt_ms` drives the spawn clock
    fn advance(&mut self, input: &TickInput, dt_ms: f32) -> RenderCommands;

    /// Live entity count
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Turns store snapshots into mount/unmount commands
#[derive(Debug, Clone, Default)]
pub struct SnapshotPublisher {
    published: Vec<SnapshotEntry>,
    revision: u64,
}

impl SnapshotPublisher {
    /// Diff the store against the last published snapshot, if it changed
    pub fn publish<E: Entity>(&mut self, store: &mut EntityStore<E>, out: &mut RenderCommands) {
        if store.revision() == self.revision {
            return;
        }
        let next = store.snapshot();

        out.mounts.extend(
            next.iter()
                .filter(|n| !self.published.iter().any(|p| p.id == n.id))
                .cloned(),
        );
        out.unmounts.extend(
            self.published
                .iter()
                .filter(|p| !next.iter().any(|n| n.id == p.id))
                .map(|p| p.id),
        );

        self.published = next.to_vec();
        self.revision = store.revision();
    }

    /// Ids the render surface should currently have mounted
    pub fn published(&self) -> &[SnapshotEntry] {
        &self.published
    }
}

/// Fixed-timestep accumulator for hosts driven by a variable frame callback
#[derive(Debug, Clone, Default)]
pub struct FixedStep {
    accumulator: f32,
}

impl FixedStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a frame delta (seconds); returns how many ticks to run now
    pub fn frames(&mut self, dt: f32) -> u32 {
        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        substeps
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Tile {
        id: EntityId,
        content: ContentItem,
    }

    impl Entity for Tile {
        fn id(&self) -> EntityId {
            self.id
        }
        fn content(&self) -> &ContentItem {
            &self.content
        }
        fn size(&self) -> f32 {
            32.0
        }
    }

    fn add_tile(store: &mut EntityStore<Tile>, name: &str) -> EntityId {
        let id = store.next_entity_id();
        store.add(Tile {
            id,
            content: ContentItem::new(name, name),
        });
        id
    }

    #[test]
    fn test_strength_inverts_fade() {
        let mut input = TickInput::default();
        assert_eq!(input.strength(), 1.0);
        input.fade = 0.25;
        assert!((input.strength() - 0.75).abs() < 1e-6);
        input.fade = 3.0;
        assert_eq!(input.strength(), 0.0);
        input.fade = f32::NAN;
        assert_eq!(input.strength(), 1.0);
    }

    #[test]
    fn test_publisher_emits_mounts_and_unmounts_once() {
        let mut store = EntityStore::new();
        let mut publisher = SnapshotPublisher::default();

        let a = add_tile(&mut store, "a");
        let b = add_tile(&mut store, "b");
        let mut out = RenderCommands::default();
        publisher.publish(&mut store, &mut out);
        assert_eq!(out.mounts.iter().map(|m| m.id).collect::<Vec<_>>(), vec![a, b]);
        assert!(out.unmounts.is_empty());

        // No change, no commands
        let mut out = RenderCommands::default();
        publisher.publish(&mut store, &mut out);
        assert!(out.is_empty());

        store.remove_where(|t| t.id == a);
        let c = add_tile(&mut store, "c");
        let mut out = RenderCommands::default();
        publisher.publish(&mut store, &mut out);
        assert_eq!(out.unmounts, vec![a]);
        assert_eq!(out.mounts.len(), 1);
        assert_eq!(out.mounts[0].id, c);
        assert_eq!(publisher.published().len(), 2);
    }

    #[test]
    fn test_fixed_step_accumulates() {
        let mut step = FixedStep::new();
        assert_eq!(step.frames(SIM_DT * 0.5), 0);
        assert_eq!(step.frames(SIM_DT * 0.6), 1);
        assert_eq!(step.frames(SIM_DT * 2.0), 2);
    }

    #[test]
    fn test_fixed_step_clamps_stalls() {
        let mut step = FixedStep::new();
        assert_eq!(step.frames(30.0), MAX_SUBSTEPS);
        assert!(step.frames(0.0) <= 1);
        assert_eq!(step.frames(f32::NAN), 0);
    }
}
