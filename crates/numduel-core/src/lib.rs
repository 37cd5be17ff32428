//! Number Duel room logic.
//!
//! Pure state machine with no I/O: the server feeds [`RoomEvent`]s into a
//! [`RoomRegistry`] and executes the [`RoomAction`]s it returns.
//!
//! ## Architecture
//!
//! ```text
//! numduel-core
//!   ├─ Environment   (time + randomness, swapped out in tests)
//!   ├─ RoomRegistry  (rooms, sessions, role enforcement)
//!   ├─ Room          (two slots, secret, guess count)
//!   └─ GameError     (player-facing rejection reasons)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod env;
mod error;
mod registry;
mod room;

pub use error::GameError;
pub use registry::{DEFAULT_MAX_ROOMS, RegistryConfig, RoomAction, RoomEvent, RoomRegistry};
pub use room::{ConnId, Room, RoomId};
