//! Developer tooling: session inspector and text views of the world.
//!
//! # Invariants
//! - Tools only read session state; nothing here mutates a session.

pub mod inspector;

pub use inspector::{MobInfo, SessionInspector, SessionSummary};
