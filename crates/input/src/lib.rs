//! Player input mapped to high-level actions and folded into tick intents.
//!
//! # Invariants
//! - The session consumes `TickIntent`s, never raw device events.
//! - One frame of actions produces exactly one intent.
//! - The hotbar always has a valid selection.

pub mod action;
pub mod frame;
pub mod hotbar;

pub use action::Action;
pub use frame::{Frame, FrameBuilder};
pub use hotbar::{Hotbar, HotbarError};
