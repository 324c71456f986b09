//! Entity store: the authoritative live set for one simulation
//!
//! Only the owning spawner/stepper pair mutates it. Every add or removal bumps a
//! revision so the mount/unmount snapshot is rebuilt lazily, at most once per change.

use super::content::ContentItem;

/// Monotonic entity identifier (never reused within a store)
pub type EntityId = u32;

/// Common view over both entity variants
pub trait Entity {
    fn id(&self) -> EntityId;
    fn content(&self) -> &ContentItem;
    /// Edge length of the (square) visual
    fn size(&self) -> f32;
}

/// What the rendering surface needs to mount a visual handle
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntry {
    pub id: EntityId,
    pub content: ContentItem,
    pub size: f32,
}

#[derive(Debug, Clone)]
pub struct EntityStore<E> {
    /// Live entities in spawn order (ascending id)
    entities: Vec<E>,
    next_id: EntityId,
    revision: u64,
    snapshot: Vec<SnapshotEntry>,
    snapshot_revision: u64,
}

impl<E> Default for EntityStore<E> {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            next_id: 1,
            revision: 0,
            snapshot: Vec::new(),
            snapshot_revision: 0,
        }
    }
}

impl<E: Entity> EntityStore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn add(&mut self, entity: E) {
        self.entities.push(entity);
        self.revision += 1;
    }

    /// Remove every entity matching `pred`, returning them in spawn order
    pub fn remove_where<F>(&mut self, mut pred: F) -> Vec<E>
    where
        F: FnMut(&E) -> bool,
    {
        let (removed, kept): (Vec<E>, Vec<E>) =
            std::mem::take(&mut self.entities).into_iter().partition(|e| pred(e));
        self.entities = kept;
        if !removed.is_empty() {
            self.revision += 1;
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, E> {
        self.entities.iter_mut()
    }

    pub fn as_slice(&self) -> &[E] {
        &self.entities
    }

    /// Two distinct entities by index, for pairwise resolution
    pub fn pair_mut(&mut self, a: usize, b: usize) -> Option<(&mut E, &mut E)> {
        if a == b || a >= self.entities.len() || b >= self.entities.len() {
            return None;
        }
        if a < b {
            let (head, tail) = self.entities.split_at_mut(b);
            Some((&mut head[a], &mut tail[0]))
        } else {
            let (head, tail) = self.entities.split_at_mut(a);
            Some((&mut tail[0], &mut head[b]))
        }
    }

    /// Whether any live entity carries this content
    pub fn contains_content(&self, content_id: &str) -> bool {
        self.entities.iter().any(|e| e.content().id == content_id)
    }

    /// Bumped on every spawn or despawn
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Mount view of the live set, rebuilt only when the revision moved
    pub fn snapshot(&mut self) -> &[SnapshotEntry] {
        if self.snapshot_revision != self.revision {
            self.snapshot = self
                .entities
                .iter()
                .map(|e| SnapshotEntry {
                    id: e.id(),
                    content: e.content().clone(),
                    size: e.size(),
                })
                .collect();
            self.snapshot_revision = self.revision;
        }
        &self.snapshot
    }
}
