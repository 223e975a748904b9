//! Tile World Kernel: grid storage, collision, actor physics, interaction rules,
//! mob patrols and the session that sequences them.
//!
//! # Invariants
//! - Grid cells hold only known block ids and out-of-bounds reads are air.
//! - After every tick, no actor or mob box strictly overlaps a solid tile.
//! - A session tick runs physics, interactions, mobs, combat and clock in that
//!   order and to completion; a paused session does not change.
//! - All state mutations flow through explicit operations and are recorded in
//!   the session event log.

pub mod collision;
pub mod config;
pub mod grid;
pub mod interaction;
pub mod mobs;
pub mod physics;
pub mod session;
pub mod worldgen;

pub use collision::{CollisionResolver, Resolution, StepUp};
pub use config::{ConfigError, PhysicsConfig, SessionConfig};
pub use grid::{GridError, WorldGrid};
pub use interaction::{BreakOutcome, BreakState, InteractionRules};
pub use mobs::{Mob, MobController, PatrolConfig};
pub use physics::{fall_damage, Actor, ActorPhysics, MoveIntent, StepReport};
pub use session::{
    AttackState, DamageCause, Invincibility, SessionEvent, SessionView, TickReport, WorldSession,
};
pub use worldgen::flat_terrain;
