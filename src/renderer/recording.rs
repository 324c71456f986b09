//! In-memory render surface for tests and the native harness

use super::registry::HandleRegistry;
use super::RenderSurface;
use crate::sim::{EntityId, SnapshotEntry, Transform};

/// Last known visual state of a mounted entity
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedHandle {
    pub content_id: String,
    pub size: f32,
    pub x: f32,
    pub y: f32,
    pub rotation: Option<f32>,
    pub writes: u32,
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    handles: HandleRegistry<RecordedHandle>,
    pub mounted_total: u64,
    pub unmounted_total: u64,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self, id: EntityId) -> Option<&RecordedHandle> {
        self.handles.get(id)
    }

    pub fn mounted(&self) -> usize {
        self.handles.len()
    }

    pub fn missed_writes(&self) -> u64 {
        self.handles.missed_writes()
    }
}

impl RenderSurface for RecordingSurface {
    fn mount(&mut self, entry: &SnapshotEntry) {
        self.mounted_total += 1;
        self.handles.insert(
            entry.id,
            RecordedHandle {
                content_id: entry.content.id.clone(),
                size: entry.size,
                x: 0.0,
                y: 0.0,
                rotation: None,
                writes: 0,
            },
        );
    }

    fn unmount(&mut self, id: EntityId) {
        if self.handles.remove(id).is_some() {
            self.unmounted_total += 1;
        }
    }

    fn write_transform(&mut self, transform: &Transform) {
        self.handles.write(transform.id, |h| {
            h.x = transform.x;
            h.y = transform.y;
            h.rotation = transform.rotation;
            h.writes += 1;
        });
    }
}
