use glam::Vec2;
use tileworld_common::{BlockId, MobId, TileCoord};
use tileworld_kernel::WorldSession;

/// Read-only queries against a session for debugging and the CLI.
pub struct SessionInspector;

impl SessionInspector {
    pub fn summary(session: &WorldSession) -> SessionSummary {
        let player = session.player();
        SessionSummary {
            tick: session.tick_count(),
            cols: session.grid().cols(),
            rows: session.grid().rows(),
            solid_cells: session.grid().solid_count(),
            player_pos: player.aabb.pos,
            grounded: player.grounded,
            health: session.health(),
            max_health: session.config().max_health,
            mob_count: session.mobs().len(),
            time_of_day: session.time_of_day(),
            paused: session.is_paused(),
            pending_events: session.events().len(),
        }
    }

    pub fn inspect_mob(session: &WorldSession, id: MobId) -> Option<MobInfo> {
        session.mobs().get(id).map(|mob| MobInfo {
            id,
            position: mob.aabb.pos,
            size: mob.aabb.size,
            heading: mob.heading.sign(),
        })
    }

    pub fn list_mobs(session: &WorldSession) -> Vec<MobId> {
        session.mobs().iter().map(|(id, _)| id).collect()
    }

    /// Text picture of `width` x `height` tiles centred on the player.
    /// `P` marks the player's centre tile and `M` each mob's.
    pub fn render_window(session: &WorldSession, width: usize, height: usize) -> String {
        let ts = session.config().physics.tile_size;
        let centre = TileCoord::containing(session.player().aabb.center(), ts);
        let left = centre.col - (width / 2) as i32;
        let top = centre.row - (height / 2) as i32;
        let mobs: Vec<TileCoord> = session
            .mobs()
            .iter()
            .map(|(_, mob)| TileCoord::containing(mob.aabb.center(), ts))
            .collect();

        let mut out = String::with_capacity((width + 1) * height);
        for row in top..top + height as i32 {
            for col in left..left + width as i32 {
                let coord = TileCoord::new(col, row);
                let glyph = if coord == centre {
                    'P'
                } else if mobs.contains(&coord) {
                    'M'
                } else {
                    glyph(session.grid().get(coord))
                };
                out.push(glyph);
            }
            out.push('\n');
        }
        out
    }
}

fn glyph(block: BlockId) -> char {
    match block {
        BlockId::Air => '.',
        BlockId::Dirt => 'd',
        BlockId::Grass => 'g',
        BlockId::Stone => 's',
        BlockId::Wood => 'w',
        BlockId::Leaves => 'l',
    }
}

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub tick: u64,
    pub cols: usize,
    pub rows: usize,
    pub solid_cells: usize,
    pub player_pos: Vec2,
    pub grounded: bool,
    pub health: u32,
    pub max_health: u32,
    pub mob_count: usize,
    pub time_of_day: f32,
    pub paused: bool,
    pub pending_events: usize,
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Session: tick={} grid={}x{} solid={} player=({:.1}, {:.1}){} health={}/{} mobs={} time={:.3}{} pending_events={}",
            self.tick,
            self.cols,
            self.rows,
            self.solid_cells,
            self.player_pos.x,
            self.player_pos.y,
            if self.grounded { " grounded" } else { "" },
            self.health,
            self.max_health,
            self.mob_count,
            self.time_of_day,
            if self.paused { " paused" } else { "" },
            self.pending_events,
        )
    }
}

#[derive(Debug, Clone)]
pub struct MobInfo {
    pub id: MobId,
    pub position: Vec2,
    pub size: Vec2,
    /// -1 walking left, +1 walking right.
    pub heading: f32,
}

impl std::fmt::Display for MobInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Mob [{:.8}] pos=({:.2}, {:.2}) size=({:.0}, {:.0}) heading={:+}",
            &self.id.0.to_string()[..8],
            self.position.x,
            self.position.y,
            self.size.x,
            self.size.y,
            self.heading,
        )
    }
}
