use crate::action::Action;
use crate::hotbar::Hotbar;
use tileworld_common::{PlaceRequest, TickIntent};
use tracing::debug;

/// Everything one frame of input asks of the session.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    pub intent: TickIntent,
    /// Flip the pause flag before ticking.
    pub toggle_pause: bool,
}

/// Folds a frame's actions into a [`Frame`], tracking hotbar selection
/// across frames.
#[derive(Debug, Clone, Default)]
pub struct FrameBuilder {
    hotbar: Hotbar,
}

impl FrameBuilder {
    pub fn new(hotbar: Hotbar) -> Self {
        Self { hotbar }
    }

    pub fn hotbar(&self) -> &Hotbar {
        &self.hotbar
    }

    /// Build one frame. When both directions are held, right wins. Slot
    /// selection applies in order, so a place after a select uses the new
    /// block. Only the last place and break target of a frame count.
    pub fn build(&mut self, actions: &[Action]) -> Frame {
        let mut frame = Frame::default();
        let (mut left, mut right) = (false, false);
        for action in actions {
            match *action {
                Action::MoveLeft => left = true,
                Action::MoveRight => right = true,
                Action::Jump => frame.intent.jump = true,
                Action::Attack => frame.intent.attack = true,
                Action::SelectSlot(slot) => {
                    if let Err(err) = self.hotbar.select(slot) {
                        debug!(%err, "slot selection ignored");
                    }
                }
                Action::Place(cell) => {
                    frame.intent.place = Some(PlaceRequest {
                        cell,
                        block: self.hotbar.selected(),
                    });
                }
                Action::BreakHold(cell) => {
                    frame.intent.break_held = true;
                    frame.intent.target = Some(cell);
                }
                Action::TogglePause => frame.toggle_pause = !frame.toggle_pause,
                Action::Noop => {}
            }
        }
        frame.intent.horizontal = match (left, right) {
            (_, true) => 1,
            (true, false) => -1,
            (false, false) => 0,
        };
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tileworld_common::{BlockId, TileCoord};

    #[test]
    fn empty_frame_is_idle() {
        let mut b = FrameBuilder::default();
        let frame = b.build(&[]);
        assert_eq!(frame.intent, TickIntent::idle());
        assert!(!frame.toggle_pause);
    }

    #[test]
    fn right_wins_over_left() {
        let mut b = FrameBuilder::default();
        assert_eq!(b.build(&[Action::MoveLeft]).intent.horizontal, -1);
        assert_eq!(
            b.build(&[Action::MoveRight, Action::MoveLeft]).intent.horizontal,
            1
        );
    }

    #[test]
    fn place_uses_selection_made_earlier_in_frame() {
        let mut b = FrameBuilder::default();
        let cell = TileCoord::new(3, 9);
        let frame = b.build(&[Action::SelectSlot(2), Action::Place(cell)]);
        assert_eq!(
            frame.intent.place,
            Some(PlaceRequest {
                cell,
                block: BlockId::Stone
            })
        );
        // Selection persists into later frames.
        let frame = b.build(&[Action::Place(cell)]);
        assert_eq!(frame.intent.place.map(|p| p.block), Some(BlockId::Stone));
    }

    #[test]
    fn bad_slot_is_ignored() {
        let mut b = FrameBuilder::default();
        b.build(&[Action::SelectSlot(9)]);
        assert_eq!(b.hotbar().selected(), BlockId::Dirt);
    }

    #[test]
    fn break_hold_and_flags() {
        let mut b = FrameBuilder::default();
        let cell = TileCoord::new(1, 2);
        let frame = b.build(&[
            Action::BreakHold(cell),
            Action::Jump,
            Action::Attack,
            Action::TogglePause,
            Action::Noop,
        ]);
        assert!(frame.intent.break_held);
        assert_eq!(frame.intent.target, Some(cell));
        assert!(frame.intent.jump && frame.intent.attack);
        assert!(frame.toggle_pause);
    }
}
