//! Room game-engine for factparty sessions.
//!
//! This crate implements the per-room state machine for a social-deduction
//! party game: players submit a private fact about themselves, introduce
//! each other over rotating turns, keep private suspect lists, and receive
//! a scored reveal at the end.
//!
//! ## Architecture
//!
//! - [`Room`] — Stage state machine orchestrating one game session
//! - [`Participant`] — Per-room player record with a live transport handle
//! - [`Rotation`] — Strategy trait selecting the next turn subject
//! - [`Protocol`] — Dispatch layer between wire frames and Room operations
//!
//! ## Wire surface
//!
//! - [`Action`] — Closed enum of player-initiated operations
//! - [`GameEvent`] — Server-initiated broadcast events
//! - [`Snapshot`] — Personalized, information-hiding room state views
//!
//! The engine never blocks on I/O: all outbound delivery is fire-and-forget
//! over unbounded channels, and a disconnected recipient is silently skipped.
mod action;
mod answer;
mod error;
mod event;
mod fact;
mod participant;
mod protocol;
mod room;
mod rotation;
mod router;
mod timer;
mod view;

pub use action::*;
pub use answer::*;
pub use error::*;
pub use event::*;
pub use fact::*;
pub use participant::*;
pub use protocol::*;
pub use room::*;
pub use rotation::*;
pub use router::*;
pub use timer::*;
pub use view::*;
