//! Handle registry: entity ids to surface-owned visual handles
//!
//! The simulation never holds a handle directly. Lookups for ids that were never
//! mounted, or already torn down, are tolerated as no-ops.

use std::collections::HashMap;

use crate::sim::EntityId;

#[derive(Debug)]
pub struct HandleRegistry<H> {
    handles: HashMap<EntityId, H>,
    /// Writes that found no handle
    missed: u64,
}

impl<H> Default for HandleRegistry<H> {
    fn default() -> Self {
        Self {
            handles: HashMap::new(),
            missed: 0,
        }
    }
}

impl<H> HandleRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle; a previous handle for the same id is returned
    pub fn insert(&mut self, id: EntityId, handle: H) -> Option<H> {
        self.handles.insert(id, handle)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<H> {
        let handle = self.handles.remove(&id);
        if handle.is_none() {
            log::trace!("Unmount for unknown handle #{id}");
        }
        handle
    }

    pub fn get(&self, id: EntityId) -> Option<&H> {
        self.handles.get(&id)
    }

    /// Run `write` against the handle if it still exists
    pub fn write<F>(&mut self, id: EntityId, write: F) -> bool
    where
        F: FnOnce(&mut H),
    {
        match self.handles.get_mut(&id) {
            Some(handle) => {
                write(handle);
                true
            }
            None => {
                self.missed += 1;
                log::trace!("Dropped write for missing handle #{id}");
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn missed_writes(&self) -> u64 {
        self.missed
    }

    /// Remove every handle, e.g. on teardown
    pub fn drain(&mut self) -> impl Iterator<Item = (EntityId, H)> + '_ {
        self.handles.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_to_missing_handle_is_noop() {
        let mut reg: HandleRegistry<f32> = HandleRegistry::new();
        assert!(!reg.write(7, |h| *h = 1.0));
        assert_eq!(reg.missed_writes(), 1);
        assert!(reg.remove(7).is_none());
    }

    #[test]
    fn test_write_reaches_live_handle() {
        let mut reg = HandleRegistry::new();
        reg.insert(3, 0.0f32);
        assert!(reg.write(3, |h| *h += 2.5));
        assert_eq!(reg.get(3), Some(&2.5));
        assert_eq!(reg.remove(3), Some(2.5));
        assert!(reg.is_empty());
    }
}
