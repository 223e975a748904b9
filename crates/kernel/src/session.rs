use crate::collision::CollisionResolver;
use crate::config::{ConfigError, SessionConfig};
use crate::grid::{GridError, WorldGrid};
use crate::interaction::{BreakOutcome, InteractionRules};
use crate::mobs::{Mob, MobController, PatrolConfig};
use crate::physics::{Actor, ActorPhysics, MoveIntent};
use crate::worldgen::flat_terrain;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use tileworld_common::{Aabb, BlockId, Facing, MobId, TickIntent, TileCoord};
use tracing::{debug, info, warn};

/// Why the player lost health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageCause {
    Fall,
    MobContact,
}

/// An event record produced by every mutation the session performs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    BlockPlaced { tick: u64, cell: TileCoord, block: BlockId },
    BlockBroken { tick: u64, cell: TileCoord, block: BlockId },
    MobSlain { tick: u64, id: MobId },
    PlayerDamaged {
        tick: u64,
        amount: u32,
        cause: DamageCause,
        health: u32,
    },
    Respawned { tick: u64 },
    GridImported { tick: u64, cols: usize, rows: usize },
}

/// Attack window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AttackState {
    #[default]
    Idle,
    Active { remaining: f32 },
}

/// Contact-damage immunity window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Invincibility {
    #[default]
    Vulnerable,
    Invincible { remaining: f32 },
}

impl AttackState {
    fn advance(self, dt: f32) -> Self {
        match self {
            AttackState::Active { remaining } if remaining - dt > 0.0 => AttackState::Active {
                remaining: remaining - dt,
            },
            _ => AttackState::Idle,
        }
    }
}

impl Invincibility {
    fn advance(self, dt: f32) -> Self {
        match self {
            Invincibility::Invincible { remaining } if remaining - dt > 0.0 => {
                Invincibility::Invincible {
                    remaining: remaining - dt,
                }
            }
            _ => Invincibility::Vulnerable,
        }
    }
}

/// Summary of one tick, for callers that do not want to scan the event log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// False when the session was paused and nothing ran.
    pub simulated: bool,
    pub placed: bool,
    pub break_outcome: BreakOutcome,
    pub mobs_slain: usize,
    pub damage_taken: u32,
    pub respawned: bool,
}

impl Default for TickReport {
    fn default() -> Self {
        Self {
            simulated: false,
            placed: false,
            break_outcome: BreakOutcome::Idle,
            mobs_slain: 0,
            damage_taken: 0,
            respawned: false,
        }
    }
}

/// Read-only picture of the session for presentation.
#[derive(Debug, Clone)]
pub struct SessionView<'a> {
    pub grid: &'a WorldGrid,
    pub player: Actor,
    pub mobs: Vec<(MobId, Aabb)>,
    pub health: u32,
    pub max_health: u32,
    pub break_progress: Option<(TileCoord, f32)>,
    pub attack_volume: Option<Aabb>,
    pub time_of_day: f32,
    pub daylight: f32,
    pub paused: bool,
    pub tick: u64,
}

/// One running world: grid, player, mobs, clocks.
///
/// Each [`tick`](Self::tick) runs physics, interactions, mobs, combat and the
/// clock in that order and to completion. While paused, ticks change nothing.
#[derive(Debug, Clone)]
pub struct WorldSession {
    config: SessionConfig,
    grid: WorldGrid,
    player: ActorPhysics,
    rules: InteractionRules,
    mobs: MobController,
    health: u32,
    attack: AttackState,
    invincibility: Invincibility,
    time_of_day: f32,
    tick: u64,
    paused: bool,
    events: Vec<SessionEvent>,
}

impl WorldSession {
    /// A session on generated flat terrain with mobs at their seed columns.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let grid = flat_terrain(config.cols, config.rows, config.ground_level);
        Self::with_grid(config, grid)
    }

    /// A session on a caller-supplied grid. The grid's dimensions win over
    /// the configured ones.
    pub fn with_grid(config: SessionConfig, grid: WorldGrid) -> Result<Self, ConfigError> {
        config.validate()?;
        let physics = config.physics.clone();
        let spawn = Aabb::new(
            config.spawn[0],
            config.spawn[1],
            config.player_size[0],
            config.player_size[1],
        );
        let mut mobs = MobController::new(PatrolConfig {
            tile_size: physics.tile_size,
            speed: config.mob_speed,
            fall_nudge: config.mob_fall_nudge,
        });
        mobs.spawn_at_columns(&grid, &config.mob_columns, config.mob_size);
        info!(
            cols = grid.cols(),
            rows = grid.rows(),
            mobs = mobs.len(),
            "session created"
        );
        Ok(Self {
            rules: InteractionRules::new(config.break_duration, config.place_reach, physics.tile_size),
            player: ActorPhysics::new(Actor::at(spawn), physics),
            health: config.max_health,
            time_of_day: wrap_phase(config.initial_time_of_day),
            grid,
            mobs,
            attack: AttackState::Idle,
            invincibility: Invincibility::Vulnerable,
            tick: 0,
            paused: false,
            events: Vec::new(),
            config,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn grid(&self) -> &WorldGrid {
        &self.grid
    }

    pub fn player(&self) -> &Actor {
        self.player.actor()
    }

    pub fn mobs(&self) -> &MobController {
        &self.mobs
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn time_of_day(&self) -> f32 {
        self.time_of_day
    }

    /// Lighting blend in `[0, 1]`: 0 at midnight (phase 0), 1 at noon (phase 0.5).
    pub fn daylight(&self) -> f32 {
        ((self.time_of_day * 2.0 * PI - PI / 2.0).sin() + 1.0) / 2.0
    }

    pub fn attack_state(&self) -> AttackState {
        self.attack
    }

    pub fn invincibility(&self) -> Invincibility {
        self.invincibility
    }

    pub fn break_progress(&self) -> Option<(TileCoord, f32)> {
        self.rules.break_progress()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            debug!(paused, "pause toggled");
        }
        self.paused = paused;
    }

    pub fn toggle_pause(&mut self) {
        self.set_paused(!self.paused);
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    /// Add a mob outside the seed list.
    pub fn spawn_mob(&mut self, aabb: Aabb, heading: Facing) -> MobId {
        self.mobs.spawn(Mob { aabb, heading })
    }

    /// The attack hit box while an attack is active.
    pub fn attack_volume(&self) -> Option<Aabb> {
        let AttackState::Active { .. } = self.attack else {
            return None;
        };
        let body = self.player.actor().aabb;
        let range = self.config.attack_range;
        let height = self.config.attack_height;
        let left = match self.player.actor().facing {
            Facing::Right => body.right(),
            Facing::Left => body.left() - range,
        };
        Some(Aabb::new(left, body.center().y - height / 2.0, range, height))
    }

    pub fn view(&self) -> SessionView<'_> {
        SessionView {
            grid: &self.grid,
            player: *self.player.actor(),
            mobs: self.mobs.iter().map(|(id, mob)| (id, mob.aabb)).collect(),
            health: self.health,
            max_health: self.config.max_health,
            break_progress: self.rules.break_progress(),
            attack_volume: self.attack_volume(),
            time_of_day: self.time_of_day,
            daylight: self.daylight(),
            paused: self.paused,
            tick: self.tick,
        }
    }

    /// Resume the tick counter and day phase from a saved session.
    pub fn restore_clock(&mut self, tick: u64, time_of_day: f32) {
        self.tick = tick;
        self.time_of_day = wrap_phase(time_of_day);
    }

    /// Export the grid as rows of block ids.
    pub fn export_grid(&self) -> Vec<Vec<u8>> {
        self.grid.to_rows()
    }

    /// Replace the grid wholesale. A malformed shape is rejected and the
    /// current grid kept. A player buried by the new terrain is moved back
    /// to the first clear position at spawn, and buried mobs are dropped.
    pub fn import_grid(&mut self, rows: &[Vec<u8>]) -> Result<(), GridError> {
        if let Err(err) = self.grid.replace_from_rows(rows) {
            warn!(%err, "grid import rejected");
            return Err(err);
        }
        self.rules.release_break();
        let resolver = CollisionResolver::new(&self.grid, self.config.physics.tile_size);
        if resolver.collides(&self.player.actor().aabb) {
            let spawn = self.spawn_point();
            self.player.reset_to(spawn);
        }
        let buried = self.mobs.retain(|mob| !resolver.collides(&mob.aabb));
        info!(
            cols = self.grid.cols(),
            rows = self.grid.rows(),
            buried,
            "grid imported"
        );
        self.events.push(SessionEvent::GridImported {
            tick: self.tick,
            cols: self.grid.cols(),
            rows: self.grid.rows(),
        });
        Ok(())
    }

    /// The configured spawn, lifted a tile at a time until the player box is
    /// clear of terrain. Above the grid everything is air, so this ends.
    fn spawn_point(&self) -> Vec2 {
        let ts = self.config.physics.tile_size;
        let resolver = CollisionResolver::new(&self.grid, ts);
        let mut body = Aabb::new(
            self.config.spawn[0],
            self.config.spawn[1],
            self.config.player_size[0],
            self.config.player_size[1],
        );
        while resolver.collides(&body) && body.bottom() > 0.0 {
            body = body.translated(Vec2::new(0.0, -ts));
        }
        body.pos
    }

    /// Back to spawn at full health. The grid is untouched; a spawn that has
    /// been built over is raised to the first clear position.
    pub fn respawn(&mut self) {
        let spawn = self.spawn_point();
        self.player.reset_to(spawn);
        self.health = self.config.max_health;
        info!(tick = self.tick, "player respawned");
        self.events.push(SessionEvent::Respawned { tick: self.tick });
    }

    /// Deduct health, capped at the maximum, and respawn at zero.
    fn apply_damage(&mut self, amount: u32, cause: DamageCause, report: &mut TickReport) {
        let amount = amount.min(self.config.max_health);
        if amount == 0 {
            return;
        }
        self.health = self.health.saturating_sub(amount);
        report.damage_taken += amount;
        debug!(amount, ?cause, health = self.health, "player damaged");
        self.events.push(SessionEvent::PlayerDamaged {
            tick: self.tick,
            amount,
            cause,
            health: self.health,
        });
        if self.health == 0 {
            self.respawn();
            report.respawned = true;
        }
    }

    /// Run one simulation tick of `dt` seconds.
    pub fn tick(&mut self, dt: f32, intent: &TickIntent) -> TickReport {
        let mut report = TickReport::default();
        if self.paused {
            return report;
        }
        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.config.max_tick_dt)
        } else {
            0.0
        };
        self.tick += 1;
        report.simulated = true;

        self.resolve_physics(dt, intent, &mut report);
        self.resolve_interactions(dt, intent, &mut report);
        self.resolve_mobs(dt);
        self.resolve_combat(intent, &mut report);
        self.advance_clock(dt);
        report
    }

    fn resolve_physics(&mut self, dt: f32, intent: &TickIntent, report: &mut TickReport) {
        let step = self.player.step(
            &self.grid,
            dt,
            MoveIntent {
                horizontal: intent.horizontal,
                jump: intent.jump,
            },
        );
        self.apply_damage(step.fall_damage, DamageCause::Fall, report);

        let floor = self.grid.rows() as f32 * self.config.physics.tile_size;
        if self.player.actor().aabb.top() > floor {
            debug!("player fell out of the world");
            self.respawn();
            report.respawned = true;
        }
    }

    fn resolve_interactions(&mut self, dt: f32, intent: &TickIntent, report: &mut TickReport) {
        if let Some(request) = intent.place {
            let tile = Aabb::tile(request.cell, self.config.physics.tile_size);
            let body = self.player.actor().aabb;
            if !self.mobs.touches(&tile)
                && self
                    .rules
                    .try_place(&mut self.grid, request.cell, request.block, &body)
            {
                debug!(cell = ?request.cell, block = request.block.name(), "block placed");
                self.events.push(SessionEvent::BlockPlaced {
                    tick: self.tick,
                    cell: request.cell,
                    block: request.block,
                });
                report.placed = true;
            }
        }

        report.break_outcome = match (intent.break_held, intent.target) {
            (true, Some(cell)) => self.rules.begin_or_continue_break(&mut self.grid, cell, dt),
            _ => {
                self.rules.release_break();
                BreakOutcome::Idle
            }
        };
        if let BreakOutcome::Completed { cell, block } = report.break_outcome {
            debug!(?cell, block = block.name(), "block broken");
            self.events.push(SessionEvent::BlockBroken {
                tick: self.tick,
                cell,
                block,
            });
        }
    }

    fn resolve_mobs(&mut self, dt: f32) {
        self.mobs.step(&self.grid, dt);
        let floor = self.grid.rows() as f32 * self.config.physics.tile_size;
        let lost = self.mobs.retain(|mob| mob.aabb.top() <= floor);
        if lost > 0 {
            debug!(lost, "mobs fell out of the world");
        }
    }

    fn resolve_combat(&mut self, intent: &TickIntent, report: &mut TickReport) {
        if intent.attack && self.attack == AttackState::Idle {
            self.attack = AttackState::Active {
                remaining: self.config.attack_duration,
            };
        }

        let volume = self.attack_volume();
        let hits = self.mobs.hit_test(volume.as_ref());
        report.mobs_slain = self.mobs.remove_all(&hits);
        for id in hits {
            debug!(?id, "mob slain");
            self.events.push(SessionEvent::MobSlain {
                tick: self.tick,
                id,
            });
        }

        if self.invincibility == Invincibility::Vulnerable
            && self.mobs.touches(&self.player.actor().aabb)
        {
            self.invincibility = Invincibility::Invincible {
                remaining: self.config.invincibility,
            };
            self.apply_damage(1, DamageCause::MobContact, report);
        }
    }

    fn advance_clock(&mut self, dt: f32) {
        self.attack = self.attack.advance(dt);
        self.invincibility = self.invincibility.advance(dt);
        self.time_of_day = wrap_phase(self.time_of_day + self.config.day_speed * dt);
    }
}

/// Day phase folded into `[0, 1)`. Non-finite input restarts at midnight.
fn wrap_phase(t: f32) -> f32 {
    if !t.is_finite() {
        return 0.0;
    }
    let phase = t.rem_euclid(1.0);
    if phase >= 1.0 { 0.0 } else { phase }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tileworld_common::PlaceRequest;

    const DT: f32 = 1.0 / 60.0;

    /// 20 x 14 world, ground row 10 (surface y = 320), player standing at x = 100.
    fn small_config() -> SessionConfig {
        SessionConfig {
            cols: 20,
            rows: 14,
            ground_level: 10,
            spawn: [100.0, 280.0],
            mob_columns: Vec::new(),
            ..SessionConfig::default()
        }
    }

    fn small_session() -> WorldSession {
        WorldSession::new(small_config()).unwrap()
    }

    fn assert_contained(s: &WorldSession) {
        let resolver = CollisionResolver::new(s.grid(), s.config().physics.tile_size);
        assert!(
            !resolver.collides(&s.player().aabb),
            "player overlaps terrain at tick {}: {:?}",
            s.tick_count(),
            s.player().aabb
        );
        for (id, mob) in s.mobs().iter() {
            assert!(!resolver.collides(&mob.aabb), "mob {id:?} overlaps terrain");
        }
    }

    #[test]
    fn default_session_seeds_world_and_mobs() {
        let s = WorldSession::new(SessionConfig::default()).unwrap();
        assert_eq!(s.grid().cols(), 200);
        assert_eq!(s.grid().rows(), 30);
        assert_eq!(s.mobs().len(), 4);
        assert_eq!(s.health(), 10);
        assert_eq!(s.time_of_day(), 0.25);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SessionConfig {
            max_health: 0,
            ..small_config()
        };
        assert!(WorldSession::new(config).is_err());
    }

    #[test]
    fn containment_holds_through_a_scripted_run() {
        let mut s = WorldSession::new(SessionConfig::default()).unwrap();
        for i in 0..1200u32 {
            let player_col = TileCoord::containing(s.player().aabb.center(), 32.0).col;
            let mut intent = TickIntent::walk(if (i / 240) % 2 == 0 { 1 } else { -1 });
            intent.jump = i % 45 == 0;
            intent.attack = i % 30 == 0;
            if i % 90 == 0 {
                intent.place = Some(PlaceRequest {
                    cell: TileCoord::new(player_col + 1, 19),
                    block: BlockId::Stone,
                });
            }
            if (600..700).contains(&i) {
                intent.break_held = true;
                intent.target = Some(TileCoord::new(player_col, 20));
            }
            s.tick(DT, &intent);
            assert_contained(&s);
        }
        assert_eq!(s.tick_count(), 1200);
    }

    #[test]
    fn paused_session_does_not_change() {
        let mut s = small_session();
        s.set_paused(true);
        let before = s.player().aabb;
        let report = s.tick(DT, &TickIntent::walk(1));
        assert!(!report.simulated);
        assert_eq!(s.tick_count(), 0);
        assert_eq!(s.player().aabb, before);
        assert_eq!(s.time_of_day(), 0.25);

        s.toggle_pause();
        assert!(s.tick(DT, &TickIntent::walk(1)).simulated);
        assert_eq!(s.tick_count(), 1);
    }

    #[test]
    fn hard_landing_costs_health() {
        let config = SessionConfig {
            rows: 30,
            ground_level: 20,
            spawn: [100.0, 0.0],
            ..small_config()
        };
        let mut s = WorldSession::new(config).unwrap();
        let mut damage = 0;
        for _ in 0..120 {
            damage += s.tick(DT, &TickIntent::idle()).damage_taken;
        }
        // Terminal speed 1080 is threshold 840 plus two steps of 120.
        assert_eq!(damage, 3);
        assert_eq!(s.health(), 7);
        assert!(s.player().grounded);
        assert!(matches!(
            s.events()[0],
            SessionEvent::PlayerDamaged {
                amount: 3,
                cause: DamageCause::Fall,
                health: 7,
                ..
            }
        ));
    }

    #[test]
    fn lethal_fall_respawns_with_full_health() {
        let config = SessionConfig {
            rows: 30,
            ground_level: 20,
            spawn: [100.0, 0.0],
            max_health: 3,
            ..small_config()
        };
        let mut s = WorldSession::new(config).unwrap();
        let mut respawned = false;
        for _ in 0..120 {
            let report = s.tick(DT, &TickIntent::idle());
            if report.respawned {
                respawned = true;
                break;
            }
        }
        assert!(respawned);
        assert_eq!(s.health(), 3);
        assert_eq!(s.player().aabb.pos, Vec2::new(100.0, 0.0));
        assert_eq!(s.player().velocity, Vec2::ZERO);
        assert!(s
            .events()
            .iter()
            .any(|e| matches!(e, SessionEvent::Respawned { .. })));
    }

    #[test]
    fn gentle_steps_cost_nothing() {
        let mut s = small_session();
        for _ in 0..300 {
            s.tick(DT, &TickIntent::walk(1));
        }
        assert_eq!(s.health(), 10);
    }

    #[test]
    fn invincibility_expires_and_contact_hurts_again() {
        let mut s = small_session();
        // Mob walled in on both sides so it stays on top of the player.
        s.grid.set(TileCoord::new(2, 9), BlockId::Stone);
        s.grid.set(TileCoord::new(4, 9), BlockId::Stone);
        s.spawn_mob(Aabb::new(98.0, 294.0, 26.0, 26.0), Facing::Right);

        let mut hits = 0;
        for _ in 0..90 {
            if s.tick(DT, &TickIntent::idle()).damage_taken > 0 {
                hits += 1;
            }
        }
        // Hit on the first tick, then again once the one second window lapses.
        assert_eq!(hits, 2);
        assert_eq!(s.health(), 8);
    }

    #[test]
    fn attack_slays_mob_in_front() {
        let mut s = small_session();
        let id = s.spawn_mob(Aabb::new(130.0, 294.0, 26.0, 26.0), Facing::Right);
        let report = s.tick(
            DT,
            &TickIntent {
                attack: true,
                ..TickIntent::default()
            },
        );
        assert_eq!(report.mobs_slain, 1);
        assert!(s.mobs().get(id).is_none());
        assert!(s
            .events()
            .iter()
            .any(|e| matches!(e, SessionEvent::MobSlain { id: slain, .. } if *slain == id)));
        assert_eq!(s.health(), 10);
    }

    #[test]
    fn attack_volume_follows_facing_and_expires() {
        let mut s = small_session();
        assert!(s.attack_volume().is_none());
        s.tick(
            DT,
            &TickIntent {
                horizontal: -1,
                attack: true,
                ..TickIntent::default()
            },
        );
        let volume = s.attack_volume().unwrap();
        let body = s.player().aabb;
        assert!((volume.right() - body.left()).abs() < 1e-3);
        assert_eq!(volume.size, Vec2::new(32.0, 20.0));
        assert_eq!(volume.center().y, body.center().y);

        for _ in 0..20 {
            s.tick(DT, &TickIntent::idle());
        }
        assert_eq!(s.attack_state(), AttackState::Idle);
        assert!(s.attack_volume().is_none());
    }

    #[test]
    fn break_then_place_scenario() {
        let config = SessionConfig {
            max_tick_dt: 0.125,
            ..small_config()
        };
        let mut s = WorldSession::new(config).unwrap();
        let stone = TileCoord::new(4, 9);
        s.grid.set(stone, BlockId::Stone);
        s.tick(0.125, &TickIntent::idle());
        assert!(s.player().grounded);

        // Registering the target, then four ticks of 0.125 s = 0.5 s held.
        let mut outcome = BreakOutcome::Idle;
        for _ in 0..5 {
            outcome = s.tick(0.125, &TickIntent::breaking(stone)).break_outcome;
        }
        assert_eq!(
            outcome,
            BreakOutcome::Completed {
                cell: stone,
                block: BlockId::Stone
            }
        );
        assert_eq!(s.grid().get(stone), BlockId::Air);

        let report = s.tick(
            0.125,
            &TickIntent {
                place: Some(PlaceRequest {
                    cell: stone,
                    block: BlockId::Wood,
                }),
                ..TickIntent::default()
            },
        );
        assert!(report.placed);
        assert_eq!(s.grid().get(stone), BlockId::Wood);
    }

    #[test]
    fn placement_onto_a_mob_is_rejected() {
        let mut s = small_session();
        s.spawn_mob(Aabb::new(130.0, 294.0, 26.0, 26.0), Facing::Left);
        let report = s.tick(
            DT,
            &TickIntent {
                place: Some(PlaceRequest {
                    cell: TileCoord::new(4, 9),
                    block: BlockId::Dirt,
                }),
                ..TickIntent::default()
            },
        );
        assert!(!report.placed);
        assert_eq!(s.grid().get(TileCoord::new(4, 9)), BlockId::Air);
    }

    #[test]
    fn releasing_break_keeps_block() {
        let mut s = small_session();
        let cell = TileCoord::new(4, 10);
        for _ in 0..20 {
            s.tick(DT, &TickIntent::breaking(cell));
        }
        assert!(s.break_progress().is_some());
        s.tick(DT, &TickIntent::idle());
        assert!(s.break_progress().is_none());
        assert_eq!(s.grid().get(cell), BlockId::Grass);
    }

    #[test]
    fn snapshot_roundtrip_and_malformed_import() {
        let mut s = small_session();
        s.grid.set(TileCoord::new(7, 3), BlockId::Leaves);
        let exported = s.export_grid();
        let before = s.grid().clone();

        s.import_grid(&exported).unwrap();
        assert_eq!(*s.grid(), before);

        let err = s.import_grid(&[vec![1, 2], vec![3]]).unwrap_err();
        assert!(matches!(err, GridError::Ragged { .. }));
        assert_eq!(*s.grid(), before);
        assert_eq!(
            s.events()
                .iter()
                .filter(|e| matches!(e, SessionEvent::GridImported { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn import_that_buries_player_moves_them_to_spawn() {
        let mut s = small_session();
        for _ in 0..30 {
            s.tick(DT, &TickIntent::walk(1));
        }
        let mut rows = s.export_grid();
        let col = (s.player().aabb.center().x / 32.0) as usize;
        rows[9][col] = 3;
        s.import_grid(&rows).unwrap();
        assert_eq!(s.player().aabb.pos, Vec2::new(100.0, 280.0));
    }

    #[test]
    fn falling_out_of_the_world_respawns() {
        let mut s = small_session();
        let under = TileCoord::containing(s.player().aabb.center(), 32.0).col;
        let rows: Vec<Vec<u8>> = s
            .export_grid()
            .into_iter()
            .map(|mut row| {
                for c in (under - 1).max(0)..=(under + 1) {
                    row[c as usize] = 0;
                }
                row
            })
            .collect();
        s.import_grid(&rows).unwrap();
        let mut respawned = false;
        for _ in 0..240 {
            if s.tick(DT, &TickIntent::idle()).respawned {
                respawned = true;
                break;
            }
        }
        assert!(respawned);
        assert_eq!(s.health(), 10);
    }

    #[test]
    fn day_cycle_wraps_and_daylight_is_bounded() {
        let config = SessionConfig {
            day_speed: 1.0,
            initial_time_of_day: 0.9,
            max_tick_dt: 0.25,
            ..small_config()
        };
        let mut s = WorldSession::new(config).unwrap();
        s.tick(0.25, &TickIntent::idle());
        assert!((s.time_of_day() - 0.15).abs() < 1e-5);
        for _ in 0..10 {
            s.tick(0.125, &TickIntent::idle());
            assert!((0.0..1.0).contains(&s.time_of_day()));
            assert!((0.0..=1.0).contains(&s.daylight()));
        }
    }

    #[test]
    fn negative_phase_settings_stay_in_range() {
        let config = SessionConfig {
            initial_time_of_day: -0.25,
            day_speed: -0.5,
            ..small_config()
        };
        let mut s = WorldSession::new(config).unwrap();
        assert!((s.time_of_day() - 0.75).abs() < 1e-6);
        for _ in 0..200 {
            s.tick(DT, &TickIntent::idle());
            assert!((0.0..1.0).contains(&s.time_of_day()));
        }
        s.restore_clock(3, -1e-9);
        assert!((0.0..1.0).contains(&s.time_of_day()));
        assert_eq!(wrap_phase(f32::NAN), 0.0);
    }

    #[test]
    fn respawn_onto_built_over_spawn_lifts_player_clear() {
        let config = SessionConfig {
            max_health: 1,
            ..small_config()
        };
        let mut s = WorldSession::new(config).unwrap();
        for _ in 0..12 {
            s.tick(DT, &TickIntent::walk(1));
        }
        let spawn_cell = TileCoord::new(3, 9);
        let report = s.tick(
            DT,
            &TickIntent {
                place: Some(PlaceRequest {
                    cell: spawn_cell,
                    block: BlockId::Stone,
                }),
                ..TickIntent::default()
            },
        );
        assert!(report.placed);
        assert_eq!(s.grid().get(spawn_cell), BlockId::Stone);

        let body = s.player().aabb;
        s.spawn_mob(Aabb::new(body.left(), 294.0, 26.0, 26.0), Facing::Right);
        let report = s.tick(DT, &TickIntent::idle());
        assert!(report.respawned);
        assert_contained(&s);
        assert_eq!(s.player().aabb.pos, Vec2::new(100.0, 248.0));

        for _ in 0..30 {
            s.tick(DT, &TickIntent::idle());
            assert_contained(&s);
        }
        assert_eq!(s.player().aabb.bottom(), 288.0);
    }

    #[test]
    fn import_covering_spawn_lifts_player_clear() {
        let mut s = small_session();
        let mut rows = s.export_grid();
        for row in rows.iter_mut().take(11).skip(7) {
            for cell in row.iter_mut().take(6).skip(2) {
                *cell = u8::from(BlockId::Stone);
            }
        }
        s.import_grid(&rows).unwrap();
        assert_contained(&s);
        assert_eq!(s.player().aabb.pos, Vec2::new(100.0, 184.0));

        s.tick(DT, &TickIntent::idle());
        assert_contained(&s);
        assert_eq!(s.player().aabb.bottom(), 224.0);
    }

    #[test]
    fn daylight_peaks_at_noon() {
        let mut s = small_session();
        s.time_of_day = 0.5;
        assert!((s.daylight() - 1.0).abs() < 1e-6);
        s.time_of_day = 0.0;
        assert!(s.daylight().abs() < 1e-6);
    }

    #[test]
    fn dt_is_clamped() {
        let mut s = small_session();
        s.tick(10.0, &TickIntent::idle());
        let expected = 0.25 + s.config().day_speed * s.config().max_tick_dt;
        assert!((s.time_of_day() - expected).abs() < 1e-6);
        s.tick(f32::NAN, &TickIntent::idle());
        assert!((s.time_of_day() - expected).abs() < 1e-6);
    }

    #[test]
    fn view_exposes_presentation_state() {
        let mut s = small_session();
        s.spawn_mob(Aabb::new(300.0, 294.0, 26.0, 26.0), Facing::Left);
        s.tick(DT, &TickIntent::breaking(TileCoord::new(3, 10)));
        let view = s.view();
        assert_eq!(view.mobs.len(), 1);
        assert_eq!(view.health, 10);
        assert_eq!(view.max_health, 10);
        assert_eq!(view.break_progress, Some((TileCoord::new(3, 10), 0.0)));
        assert_eq!(view.tick, 1);
        assert!(!view.paused);
    }
}
