use serde::{Deserialize, Serialize};
use tileworld_kernel::{GridError, SessionEvent, WorldGrid, WorldSession};
use tracing::debug;

/// Errors from verifying or restoring a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot hash mismatch: stored {stored:#018x}, computed {computed:#018x}")]
    HashMismatch { stored: u64, computed: u64 },
    #[error("snapshot grid is malformed: {0}")]
    Grid(#[from] GridError),
}

/// The persistent part of a session at one tick: terrain plus clocks.
///
/// `hash` is the grid's FNV-1a state hash, so a snapshot whose rows were
/// edited or truncated fails verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub time_of_day: f32,
    pub blocks: Vec<Vec<u8>>,
    pub hash: u64,
}

impl WorldSnapshot {
    pub fn capture(session: &WorldSession) -> Self {
        Self {
            tick: session.tick_count(),
            time_of_day: session.time_of_day(),
            blocks: session.export_grid(),
            hash: session.grid().state_hash(),
        }
    }

    /// Rebuild the grid and check it against the stored hash.
    pub fn verify(&self) -> Result<WorldGrid, SnapshotError> {
        let grid = WorldGrid::from_rows(&self.blocks)?;
        let computed = grid.state_hash();
        if computed != self.hash {
            return Err(SnapshotError::HashMismatch {
                stored: self.hash,
                computed,
            });
        }
        Ok(grid)
    }

    /// Load this snapshot into `session`. Nothing changes unless it verifies.
    pub fn restore_into(&self, session: &mut WorldSession) -> Result<(), SnapshotError> {
        self.verify()?;
        session.import_grid(&self.blocks)?;
        session.restore_clock(self.tick, self.time_of_day);
        debug!(tick = self.tick, "snapshot restored");
        Ok(())
    }
}

/// Append-only record of session events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<SessionEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events are never modified after writing.
    pub fn append(&mut self, events: &[SessionEvent]) {
        self.events.extend_from_slice(events);
    }

    /// Move the session's pending events into the log.
    pub fn flush_from(&mut self, session: &mut WorldSession) -> usize {
        let drained = session.drain_events();
        let n = drained.len();
        self.events.extend(drained);
        n
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    /// Events recorded after `tick`.
    pub fn since(&self, tick: u64) -> impl Iterator<Item = &SessionEvent> {
        self.events.iter().filter(move |e| event_tick(e) > tick)
    }
}

pub(crate) fn event_tick(event: &SessionEvent) -> u64 {
    match *event {
        SessionEvent::BlockPlaced { tick, .. }
        | SessionEvent::BlockBroken { tick, .. }
        | SessionEvent::MobSlain { tick, .. }
        | SessionEvent::PlayerDamaged { tick, .. }
        | SessionEvent::Respawned { tick }
        | SessionEvent::GridImported { tick, .. } => tick,
    }
}
