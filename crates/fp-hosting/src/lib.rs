//! WebSocket room hosting for factparty.
//!
//! This crate owns everything between the HTTP surface and the room
//! engine: the lobby registry of open rooms, room-code generation, the
//! per-connection WebSocket bridge, and the periodic sweep that closes
//! rooms nobody is using anymore.
//!
//! ## Submodules
//!
//! - [`Lobby`] — Registry of active rooms keyed by their join code
//! - `session` — Bridge between one WebSocket and one seated player
//! - `handlers` — actix-web route handlers for room creation and entry

mod code;
mod handlers;
mod lobby;
mod session;

pub use handlers::*;
pub use lobby::*;
