use crate::collision::{CollisionResolver, StepUp};
use crate::grid::WorldGrid;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tileworld_common::{Aabb, Facing, MobId};

/// A patrolling mob.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mob {
    pub aabb: Aabb,
    pub heading: Facing,
}

/// Patrol tuning shared by every mob in a controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatrolConfig {
    pub tile_size: f32,
    /// Horizontal speed in world units per second.
    pub speed: f32,
    /// Downward shift per tick standing in for gravity.
    pub fall_nudge: f32,
}

/// Drives every live mob: land on terrain, walk, turn around at obstacles.
///
/// Mobs never climb; any blocked horizontal move reverses the heading.
#[derive(Debug, Clone)]
pub struct MobController {
    mobs: BTreeMap<MobId, Mob>,
    config: PatrolConfig,
}

impl MobController {
    pub fn new(config: PatrolConfig) -> Self {
        Self {
            mobs: BTreeMap::new(),
            config,
        }
    }

    pub fn len(&self) -> usize {
        self.mobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mobs.is_empty()
    }

    pub fn get(&self, id: MobId) -> Option<&Mob> {
        self.mobs.get(&id)
    }

    /// Live mobs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (MobId, &Mob)> {
        self.mobs.iter().map(|(id, mob)| (*id, mob))
    }

    pub fn spawn(&mut self, mob: Mob) -> MobId {
        let id = MobId::new();
        self.mobs.insert(id, mob);
        id
    }

    /// Seed one mob of `size` at the top of each listed column. Columns
    /// outside the grid are skipped.
    pub fn spawn_at_columns(&mut self, grid: &WorldGrid, columns: &[i32], size: f32) -> Vec<MobId> {
        columns
            .iter()
            .filter(|&&col| col >= 0 && (col as usize) < grid.cols())
            .map(|&col| {
                let left = col as f32 * self.config.tile_size;
                self.spawn(Mob {
                    aabb: Aabb::new(left, 0.0, size, size),
                    heading: Facing::Right,
                })
            })
            .collect()
    }

    /// Advance every mob by one tick. A tick with no elapsed time moves nothing.
    pub fn step(&mut self, grid: &WorldGrid, dt: f32) {
        if dt <= 0.0 || !dt.is_finite() {
            return;
        }
        let resolver = CollisionResolver::new(grid, self.config.tile_size);
        let cfg = self.config;
        for mob in self.mobs.values_mut() {
            let fall = resolver.resolve(
                mob.aabb,
                Vec2::ZERO,
                Vec2::new(0.0, cfg.fall_nudge),
                StepUp::NONE,
            );
            let dx = mob.heading.sign() * cfg.speed * dt;
            let walk = resolver.resolve(fall.aabb, Vec2::ZERO, Vec2::new(dx, 0.0), StepUp::NONE);
            mob.aabb = walk.aabb;
            if walk.blocked_x {
                mob.heading = mob.heading.reversed();
            }
        }
    }

    /// Every mob whose box overlaps the attack volume, if one is active.
    pub fn hit_test(&self, attack: Option<&Aabb>) -> BTreeSet<MobId> {
        let Some(volume) = attack else {
            return BTreeSet::new();
        };
        self.mobs
            .iter()
            .filter(|(_, mob)| mob.aabb.intersects(volume))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Remove the given mobs. Returns how many were actually live.
    pub fn remove_all(&mut self, ids: &BTreeSet<MobId>) -> usize {
        ids.iter().filter(|id| self.mobs.remove(id).is_some()).count()
    }

    /// Keep only mobs matching `keep`. Returns how many were dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(&Mob) -> bool) -> usize {
        let before = self.mobs.len();
        self.mobs.retain(|_, mob| keep(mob));
        before - self.mobs.len()
    }

    /// Whether any mob overlaps `aabb`.
    pub fn touches(&self, aabb: &Aabb) -> bool {
        self.mobs.values().any(|mob| mob.aabb.intersects(aabb))
    }
}
