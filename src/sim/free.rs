//! Free-roam simulation
//!
//! Entities drift across the whole viewport, spin at a fixed rate, wrap around
//! the edges and bounce off each other like billiard bodies. The population is
//! capped at spawn time; nothing is ever evicted.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::collision::resolve_free_pair;
use super::content::{ContentItem, ContentQueue};
use super::spawn::{SpawnClock, edge_offset, uniform};
use super::store::{Entity, EntityId, EntityStore};
use super::tick::{RenderCommands, Simulation, SnapshotPublisher, TickInput, Transform, Viewport};
use crate::config::FreeConfig;
use crate::speed_for_size;

/// A freely drifting entity
#[derive(Debug, Clone, PartialEq)]
pub struct FreeEntity {
    pub id: EntityId,
    /// Top-left corner
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    /// Degrees
    pub rotation: f32,
    /// Degrees per tick
    pub spin: f32,
    pub inv_mass: f32,
    pub content: ContentItem,
}

impl FreeEntity {
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + Vec2::splat(self.size * 0.5)
    }
}

impl Entity for FreeEntity {
    fn id(&self) -> EntityId {
        self.id
    }

    fn content(&self) -> &ContentItem {
        &self.content
    }

    fn size(&self) -> f32 {
        self.size
    }
}

/// Mass grows with area, so larger entities get a smaller inverse mass
#[inline]
pub fn inverse_mass_for(size: f32) -> f32 {
    let size = size.max(1.0);
    1.0 / (size * size)
}

/// Viewport edge an entity enters through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Top, Edge::Right, Edge::Bottom, Edge::Left];

    /// Unit heading pointing into the viewport from this edge
    pub fn inward(&self) -> Vec2 {
        match self {
            Edge::Top => Vec2::Y,
            Edge::Right => Vec2::NEG_X,
            Edge::Bottom => Vec2::NEG_Y,
            Edge::Left => Vec2::X,
        }
    }
}

/// Scale a heading to `speed`, substituting `fallback` for a degenerate heading
pub fn entry_velocity(heading: Vec2, fallback: Vec2, speed: f32) -> Vec2 {
    heading.try_normalize().unwrap_or(fallback) * speed
}

/// Entry speed before jitter: smaller entities enter faster
pub fn entry_speed(config: &FreeConfig, size: f32) -> f32 {
    let spread = config.size_speed_spread;
    speed_for_size(
        size,
        config.min_size,
        config.max_size,
        config.speed * (1.0 - spread),
        config.speed * (1.0 + spread),
    )
}

/// Teleport an entity that drifted past `buffer` to the opposite side
///
/// The coordinate along the crossed axis lands just outside the opposite edge;
/// the other coordinate is re-randomized. Velocity and identity are untouched.
/// Returns true if the entity wrapped.
pub fn wrap_entity<R: Rng + ?Sized>(entity: &mut FreeEntity, viewport: Viewport, buffer: f32, rng: &mut R) -> bool {
    let mut wrapped = false;

    if entity.pos.x > viewport.width + buffer {
        entity.pos.x = -buffer;
        entity.pos.y = edge_offset(rng, viewport.height - entity.size);
        wrapped = true;
    } else if entity.pos.x + entity.size < -buffer {
        entity.pos.x = viewport.width + buffer - entity.size;
        entity.pos.y = edge_offset(rng, viewport.height - entity.size);
        wrapped = true;
    }

    if entity.pos.y > viewport.height + buffer {
        entity.pos.y = -buffer;
        entity.pos.x = edge_offset(rng, viewport.width - entity.size);
        wrapped = true;
    } else if entity.pos.y + entity.size < -buffer {
        entity.pos.y = viewport.height + buffer - entity.size;
        entity.pos.x = edge_offset(rng, viewport.width - entity.size);
        wrapped = true;
    }

    wrapped
}

/// Wraparound billiard field
#[derive(Debug, Clone)]
pub struct FreeSimulation {
    config: FreeConfig,
    viewport: Viewport,
    store: EntityStore<FreeEntity>,
    content: ContentQueue,
    clock: SpawnClock,
    rng: Pcg32,
    publisher: SnapshotPublisher,
}

impl FreeSimulation {
    pub fn new(config: FreeConfig, viewport: Viewport, seed: u64) -> Self {
        let clock = SpawnClock::new(config.initial_delay_ms, config.spawn_interval_ms);
        Self {
            config,
            viewport,
            store: EntityStore::new(),
            content: ContentQueue::new(),
            clock,
            rng: Pcg32::seed_from_u64(seed),
            publisher: SnapshotPublisher::default(),
        }
    }

    pub fn config(&self) -> &FreeConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn entities(&self) -> &[FreeEntity] {
        self.store.as_slice()
    }

    pub fn is_full(&self) -> bool {
        self.store.len() >= self.config.max_entities
    }

    /// Create one entity just outside a random edge, unless at capacity or without content
    pub fn spawn(&mut self) -> Option<EntityId> {
        if self.is_full() {
            log::trace!("Free-roam at capacity ({}), skipping spawn", self.config.max_entities);
            return None;
        }
        let store = &self.store;
        let content = self.content.next(&mut self.rng, |id| store.contains_content(id))?;

        let cfg = &self.config;
        let vp = self.viewport;
        let size = uniform(&mut self.rng, cfg.min_size, cfg.max_size);
        let edge = Edge::ALL[self.rng.random_range(0..Edge::ALL.len())];
        let lateral = uniform(&mut self.rng, -cfg.lateral_jitter, cfg.lateral_jitter);

        let pos = match edge {
            Edge::Top => Vec2::new(edge_offset(&mut self.rng, vp.width - size), -size),
            Edge::Right => Vec2::new(vp.width, edge_offset(&mut self.rng, vp.height - size)),
            Edge::Bottom => Vec2::new(edge_offset(&mut self.rng, vp.width - size), vp.height),
            Edge::Left => Vec2::new(-size, edge_offset(&mut self.rng, vp.height - size)),
        };
        let inward = edge.inward();
        let heading = inward + inward.perp() * lateral;
        let multiplier = uniform(&mut self.rng, 1.0 - cfg.speed_jitter, 1.0 + cfg.speed_jitter);
        let vel = entry_velocity(heading, inward, entry_speed(cfg, size) * multiplier);

        let rotation = uniform(&mut self.rng, 0.0, 360.0);
        let spin = uniform(&mut self.rng, -cfg.max_spin, cfg.max_spin);

        let id = self.store.next_entity_id();
        log::debug!("Free spawn #{id} '{}' from {edge:?} size={size:.0}", content.id);
        self.store.add(FreeEntity {
            id,
            pos,
            vel,
            size,
            rotation,
            spin,
            inv_mass: inverse_mass_for(size),
            content,
        });
        Some(id)
    }

    fn integrate(&mut self) {
        for entity in self.store.iter_mut() {
            entity.pos += entity.vel;
            entity.rotation += entity.spin;
        }
    }

    fn wrap(&mut self) {
        let viewport = self.viewport;
        let buffer = self.config.wrap_buffer;
        for entity in self.store.iter_mut() {
            if wrap_entity(entity, viewport, buffer, &mut self.rng) {
                log::trace!("Free #{} wrapped", entity.id);
            }
        }
    }

    /// Every unordered pair once
    fn collide(&mut self) {
        let n = self.store.len();
        for i in 0..n {
            for j in (i + 1)..n {
                if let Some((a, b)) = self.store.pair_mut(i, j) {
                    resolve_free_pair(a, b, self.config.collision_buffer, self.config.restitution);
                }
            }
        }
    }
}

impl Simulation for FreeSimulation {
    fn set_content(&mut self, items: Vec<ContentItem>) {
        if items.is_empty() {
            log::warn!("Free-roam content source returned nothing; keeping current set");
            return;
        }
        log::info!("Free-roam content: {} items", items.len());
        self.content.set_items(items);
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn advance(&mut self, _input: &TickInput, dt_ms: f32) -> RenderCommands {
        if self.clock.poll(dt_ms) {
            self.spawn();
        }

        self.integrate();
        self.wrap();
        self.collide();

        let mut out = RenderCommands::default();
        self.publisher.publish(&mut self.store, &mut out);
        out.transforms = self
            .store
            .iter()
            .map(|e| Transform {
                id: e.id,
                x: e.pos.x,
                y: e.pos.y,
                rotation: Some(e.rotation),
            })
            .collect();
        out
    }

    fn len(&self) -> usize {
        self.store.len()
    }
}
