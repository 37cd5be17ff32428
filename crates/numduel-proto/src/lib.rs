//! Number Duel wire protocol.
//!
//! Every WebSocket text frame carries exactly one JSON object tagged with a
//! `type` field. Clients send [`ClientMessage`]s, the server answers with
//! [`ServerMessage`]s.
//!
//! ```text
//! host                     server                    joiner
//!  │ create_room ─────────▶ │                           │
//!  │ ◀──────── room_created │                           │
//!  │                        │ ◀────────────── join_room │
//!  │ ◀────────────── status │ room_joined ────────────▶ │
//!  │ set_secret ──────────▶ │                           │
//!  │                        │ ◀────────────────── guess │
//!  │                        │ guess_result ───────────▶ │
//! ```
//!
//! Decoding is deliberately lenient about payload fields: a malformed
//! `secret` or `guess` still yields a message so the room logic can answer
//! with the range error instead of a generic parse failure.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod message;

pub use error::ProtocolError;
pub use message::{ClientMessage, GuessOutcome, Role, ServerMessage};

/// Smallest secret or guess accepted by the game.
pub const MIN_NUMBER: i64 = 1;

/// Largest secret or guess accepted by the game.
pub const MAX_NUMBER: i64 = 1_000_000;

/// Returns `true` if `value` is inside `[MIN_NUMBER, MAX_NUMBER]`.
pub fn in_range(value: i64) -> bool {
    (MIN_NUMBER..=MAX_NUMBER).contains(&value)
}
