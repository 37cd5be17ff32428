//! Deterministic simulation harness for Number Duel testing.
//!
//! Seeded implementations of the [`Environment`](numduel_core::env::Environment)
//! trait and an in-memory stand-in for the WebSocket server, so whole games
//! can be replayed from a seed.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod sim_env;
pub mod sim_world;

pub use sim_env::SimEnv;
pub use sim_world::{ClosedRoom, Delivery, SimWorld};
