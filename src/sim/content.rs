//! Spawnable content and the duplicate-avoiding content queue

use std::collections::VecDeque;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// One identity/image pair delivered by the content source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    #[serde(alias = "src", alias = "image_url")]
    pub image: String,
}

impl ContentItem {
    pub fn new(id: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            image: image.into(),
        }
    }
}

/// Parse a content-source payload (a JSON array of `{id, image}`)
///
/// Malformed payloads degrade to an empty list; entries without an id are dropped.
pub fn parse_content(json: &str) -> Vec<ContentItem> {
    match serde_json::from_str::<Vec<ContentItem>>(json) {
        Ok(items) => items.into_iter().filter(|c| !c.id.is_empty()).collect(),
        Err(e) => {
            log::warn!("Content payload rejected: {e}");
            Vec::new()
        }
    }
}

/// Shuffled backlog of content, consumed front to back
#[derive(Debug, Clone, Default)]
pub struct ContentQueue {
    /// The full content set
    items: Vec<ContentItem>,
    /// Working order
    queue: VecDeque<ContentItem>,
}

impl ContentQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the content set; the working queue restarts on the next pull
    pub fn set_items(&mut self, items: Vec<ContentItem>) {
        self.items = items;
        self.queue.clear();
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Pending items in pull order
    pub fn queued(&self) -> impl Iterator<Item = &ContentItem> {
        self.queue.iter()
    }

    /// Replace the working queue with a fresh uniform permutation of the full set
    pub fn refill<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut fresh = self.items.clone();
        fresh.shuffle(rng);
        self.queue = fresh.into();
    }

    /// Pull the next item, skipping content that is currently live
    ///
    /// When every item in the set is live the front of the queue is taken anyway.
    /// Returns `None` only when there is no content at all.
    pub fn next<R, F>(&mut self, rng: &mut R, is_live: F) -> Option<ContentItem>
    where
        R: Rng + ?Sized,
        F: Fn(&str) -> bool,
    {
        if self.items.is_empty() {
            return None;
        }
        if self.queue.is_empty() {
            self.refill(rng);
        }

        if let Some(i) = self.queue.iter().position(|c| !is_live(&c.id)) {
            return self.queue.remove(i);
        }

        // Everything queued is live; a fresh round may still hold something that isn't
        if self.items.iter().any(|c| !is_live(&c.id)) {
            self.refill(rng);
            if let Some(i) = self.queue.iter().position(|c| !is_live(&c.id)) {
                return self.queue.remove(i);
            }
        }

        self.queue.pop_front()
    }
}
