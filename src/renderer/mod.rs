//! Render sink
//!
//! A surface owns the visual handles (DOM nodes in the browser). The simulation
//! only emits `RenderCommands`; surfaces apply them and must tolerate commands
//! for handles that no longer exist.

pub mod recording;
pub mod registry;

pub use recording::{RecordedHandle, RecordingSurface};
pub use registry::HandleRegistry;

use crate::sim::{EntityId, RenderCommands, SnapshotEntry, Transform};

pub trait RenderSurface {
    fn mount(&mut self, entry: &SnapshotEntry);

    fn unmount(&mut self, id: EntityId);

    fn write_transform(&mut self, transform: &Transform);

    /// Apply one tick's commands: mounts, then transforms, then unmounts
    fn apply(&mut self, commands: &RenderCommands) {
        for entry in &commands.mounts {
            self.mount(entry);
        }
        for transform in &commands.transforms {
            self.write_transform(transform);
        }
        for &id in &commands.unmounts {
            self.unmount(id);
        }
    }
}
