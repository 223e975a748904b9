use crate::collision::{CollisionResolver, StepUp};
use crate::config::PhysicsConfig;
use crate::grid::WorldGrid;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tileworld_common::{Aabb, Facing};

/// Continuous state of one actor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub aabb: Aabb,
    pub velocity: Vec2,
    pub grounded: bool,
    pub facing: Facing,
}

impl Actor {
    pub fn at(aabb: Aabb) -> Self {
        Self {
            aabb,
            velocity: Vec2::ZERO,
            grounded: false,
            facing: Facing::Right,
        }
    }
}

/// Movement input consumed by one physics step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MoveIntent {
    /// -1, 0 or +1.
    pub horizontal: i8,
    pub jump: bool,
}

/// What happened to the actor during one step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepReport {
    /// Vertical speed at the moment of a downward contact.
    pub landing_speed: Option<f32>,
    /// Damage owed for that landing; zero at or below the threshold.
    pub fall_damage: u32,
    pub jumped: bool,
    pub stepped: bool,
}

/// Damage for landing at `speed`: nothing at or below the threshold, otherwise
/// one point plus one per full `fall_damage_step` of excess.
pub fn fall_damage(physics: &PhysicsConfig, speed: f32) -> u32 {
    if speed <= physics.fall_damage_threshold {
        return 0;
    }
    let excess = speed - physics.fall_damage_threshold;
    (excess / physics.fall_damage_step).floor() as u32 + 1
}

/// Gravity, smoothed horizontal control and grid collision for one actor.
#[derive(Debug, Clone)]
pub struct ActorPhysics {
    actor: Actor,
    config: PhysicsConfig,
}

impl ActorPhysics {
    pub fn new(actor: Actor, config: PhysicsConfig) -> Self {
        Self { actor, config }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Put the actor back at `top_left`, at rest. Size and facing are kept.
    pub fn reset_to(&mut self, top_left: Vec2) {
        self.actor.aabb.pos = top_left;
        self.actor.velocity = Vec2::ZERO;
        self.actor.grounded = false;
    }

    /// Overwrite the actor's velocity. Used by scripted scenarios and tests.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.actor.velocity = velocity;
    }

    /// Advance the actor by `dt` seconds.
    ///
    /// A jump is honoured only if the actor was grounded at the end of the
    /// previous step. Horizontal velocity approaches the input target
    /// exponentially, so reversing direction takes a few ticks.
    pub fn step(&mut self, grid: &WorldGrid, dt: f32, intent: MoveIntent) -> StepReport {
        let mut report = StepReport::default();
        if dt <= 0.0 {
            return report;
        }
        let cfg = &self.config;
        let actor = &mut self.actor;

        let direction = intent.horizontal.signum();
        match direction {
            -1 => actor.facing = Facing::Left,
            1 => actor.facing = Facing::Right,
            _ => {}
        }
        let target = f32::from(direction) * cfg.move_speed;
        let blend = 1.0 - (-cfg.horizontal_smoothing * dt).exp();
        actor.velocity.x += (target - actor.velocity.x) * blend;

        if intent.jump && actor.grounded {
            actor.velocity.y = cfg.jump_velocity;
            report.jumped = true;
        }
        actor.velocity.y = (actor.velocity.y + cfg.gravity * dt).min(cfg.max_fall_speed);

        let impact_speed = actor.velocity.y;
        let resolver = CollisionResolver::new(grid, cfg.tile_size);
        let out = resolver.resolve(
            actor.aabb,
            actor.velocity,
            actor.velocity * dt,
            StepUp::from_config(cfg),
        );
        actor.aabb = out.aabb;
        actor.velocity = out.velocity;
        actor.grounded = out.grounded;
        report.stepped = out.stepped;

        if out.grounded {
            report.landing_speed = Some(impact_speed);
            report.fall_damage = fall_damage(cfg, impact_speed);
        }
        report
    }
}
