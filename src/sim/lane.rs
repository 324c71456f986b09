//! Lane simulation
//!
//! Two horizontal lanes flowing in opposite directions. Entities cruise at a
//! size-derived speed, get nudged by the pointer and by lane neighbours, slow
//! down while hovered, and never pass or overlap the entity ahead of them.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::collision::resolve_lane_pair;
use super::content::{ContentItem, ContentQueue};
use super::spawn::{SpawnClock, uniform};
use super::store::{Entity, EntityId, EntityStore};
use super::tick::{RenderCommands, Simulation, SnapshotPublisher, TickInput, Transform, Viewport};
use crate::config::LaneConfig;
use crate::speed_for_size;

/// Number of lanes
pub const LANE_COUNT: usize = 2;

/// Travel direction of a lane: lane 0 flows right, lane 1 flows left
#[inline]
pub fn lane_direction(lane: usize) -> f32 {
    if lane == 0 { 1.0 } else { -1.0 }
}

/// An entity travelling along one lane
#[derive(Debug, Clone, PartialEq)]
pub struct LaneEntity {
    pub id: EntityId,
    /// 0 or 1, fixed at spawn
    pub lane: usize,
    /// +1 or -1, fixed at spawn
    pub dir: f32,
    /// Top-left corner; y never changes after spawn
    pub pos: Vec2,
    pub size: f32,
    /// Cruise velocity along x (signed)
    pub base_vx: f32,
    /// Current velocity along x (signed)
    pub vx: f32,
    pub content: ContentItem,
}

impl LaneEntity {
    #[inline]
    pub fn center_x(&self) -> f32 {
        self.pos.x + self.size * 0.5
    }

    /// Distance covered along the direction of travel; larger is further ahead
    #[inline]
    pub fn progress(&self) -> f32 {
        self.pos.x * self.dir
    }

    /// Past the far edge (in its own direction) by more than `buffer`
    pub fn has_exited(&self, viewport_width: f32, buffer: f32) -> bool {
        if self.dir > 0.0 {
            self.pos.x > viewport_width + buffer
        } else {
            self.pos.x + self.size < -buffer
        }
    }
}

impl Entity for LaneEntity {
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

/// Where a neighbour sits, captured before any velocity is touched this tick
#[derive(Debug, Clone, Copy)]
struct Neighbour {
    id: EntityId,
    lane: usize,
    center_x: f32,
}

/// Velocity the entity is steering toward this tick
fn target_velocity(
    entity: &LaneEntity,
    input: &TickInput,
    strength: f32,
    config: &LaneConfig,
    neighbours: &[Neighbour],
) -> f32 {
    let mut target = entity.base_vx;
    let cx = entity.center_x();

    if input.hovered == Some(entity.id) {
        target *= 1.0 - config.hover_slow * strength;
    } else if let Some(px) = input.pointer_x {
        let dist = (cx - px).abs();
        if dist < config.pointer_radius {
            let away = if cx != px { (cx - px).signum() } else { entity.dir };
            target += away * config.pointer_force * (1.0 - dist / config.pointer_radius) * strength;
        }
    }

    for other in neighbours {
        if other.id == entity.id || other.lane != entity.lane {
            continue;
        }
        let dist = (cx - other.center_x).abs();
        if dist < config.repel_radius {
            // Coincident centers split by id so the pair still separates
            let away = if cx != other.center_x {
                (cx - other.center_x).signum()
            } else if entity.id > other.id {
                1.0
            } else {
                -1.0
            };
            target += away * config.repel_force * (1.0 - dist / config.repel_radius) * strength;
        }
    }

    target
}

/// Two-lane traffic simulation
#[derive(Debug, Clone)]
pub struct LaneSimulation {
    config: LaneConfig,
    viewport: Viewport,
    store: EntityStore<LaneEntity>,
    content: ContentQueue,
    clock: SpawnClock,
    /// Lane the next spawn goes into
    next_lane: usize,
    rng: Pcg32,
    publisher: SnapshotPublisher,
}

impl LaneSimulation {
    pub fn new(config: LaneConfig, viewport: Viewport, seed: u64) -> Self {
        let clock = SpawnClock::new(config.initial_delay_ms, config.spawn_interval_ms);
        Self {
            config,
            viewport,
            store: EntityStore::new(),
            content: ContentQueue::new(),
            clock,
            next_lane: 0,
            rng: Pcg32::seed_from_u64(seed),
            publisher: SnapshotPublisher::default(),
        }
    }

    pub fn config(&self) -> &LaneConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn entities(&self) -> &[LaneEntity] {
        self.store.as_slice()
    }

    /// Create one entity now, alternating lanes. None when there is no content yet.
    pub fn spawn(&mut self) -> Option<EntityId> {
        let store = &self.store;
        let content = self.content.next(&mut self.rng, |id| store.contains_content(id))?;

        let cfg = &self.config;
        let size = uniform(&mut self.rng, cfg.min_size, cfg.max_size);
        let speed = speed_for_size(size, cfg.min_size, cfg.max_size, cfg.min_speed, cfg.max_speed);

        let lane = self.next_lane;
        self.next_lane = (lane + 1) % LANE_COUNT;
        let dir = lane_direction(lane);

        // Just outside the edge the entity enters from
        let x = if dir > 0.0 { -size } else { self.viewport.width };
        let y = cfg.lane_rows[lane];

        let id = self.store.next_entity_id();
        log::debug!("Lane spawn #{id} '{}' lane={lane} size={size:.0} speed={speed:.2}", content.id);
        self.store.add(LaneEntity {
            id,
            lane,
            dir,
            pos: Vec2::new(x, y),
            size,
            base_vx: speed * dir,
            vx: speed * dir,
            content,
        });
        Some(id)
    }

    /// Steering plus damping for every entity
    fn steer(&mut self, input: &TickInput) {
        let strength = input.strength();
        let neighbours: Vec<Neighbour> = self
            .store
            .iter()
            .map(|e| Neighbour {
                id: e.id,
                lane: e.lane,
                center_x: e.center_x(),
            })
            .collect();

        let cfg = &self.config;
        for entity in self.store.iter_mut() {
            let target = target_velocity(entity, input, strength, cfg, &neighbours);
            entity.vx += (target - entity.vx) * cfg.damping;
        }
    }

    /// In-lane ordering pass: leader first, each trailer kept `min_gap` behind
    pub fn resolve_collisions(&mut self) {
        for lane in 0..LANE_COUNT {
            let entities = self.store.as_slice();
            let mut order: Vec<usize> = (0..entities.len())
                .filter(|&i| entities[i].lane == lane)
                .collect();
            order.sort_by(|&a, &b| entities[b].progress().total_cmp(&entities[a].progress()));

            for pair in order.windows(2) {
                if let Some((front, back)) = self.store.pair_mut(pair[0], pair[1]) {
                    resolve_lane_pair(front, back, self.config.min_gap, self.config.collision_share);
                }
            }
        }
    }

    fn integrate(&mut self) {
        for entity in self.store.iter_mut() {
            entity.pos.x += entity.vx;
        }
    }

    fn despawn_exited(&mut self) -> usize {
        let width = self.viewport.width;
        let buffer = self.config.despawn_buffer;
        let removed = self.store.remove_where(|e| e.has_exited(width, buffer));
        for e in &removed {
            log::debug!("Lane despawn #{} '{}'", e.id, e.content.id);
        }
        removed.len()
    }
}

impl Simulation for LaneSimulation {
    fn set_content(&mut self, items: Vec<ContentItem>) {
        if items.is_empty() {
            log::warn!("Lane content source returned nothing; keeping current set");
            return;
        }
        log::info!("Lane content: {} items", items.len());
        self.content.set_items(items);
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn advance(&mut self, input: &TickInput, dt_ms: f32) -> RenderCommands {
        if self.clock.poll(dt_ms) {
            self.spawn();
        }

        self.steer(input);
        self.resolve_collisions();
        self.integrate();
        self.despawn_exited();

        let mut out = RenderCommands::default();
        self.publisher.publish(&mut self.store, &mut out);
        out.transforms = self
            .store
            .iter()
            .map(|e| Transform {
                id: e.id,
                x: e.pos.x,
                y: e.pos.y,
                rotation: None,
            })
            .collect();
        out
    }

    fn len(&self) -> usize {
        self.store.len()
    }
}
