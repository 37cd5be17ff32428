//! A single game room.

use std::{borrow::Borrow, fmt, time::Instant};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use numduel_proto::{GuessOutcome, Role};

use crate::{GameError, env::Environment};

/// Identifier of a live WebSocket connection.
pub type ConnId = u64;

/// Shareable room identifier.
///
/// URL-safe base64 without padding, so it can be pasted into a link or read
/// aloud without escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(String);

impl RoomId {
    /// Entropy drawn per identifier.
    pub const RANDOM_BYTES: usize = 4;

    /// Draw a fresh identifier from the environment's RNG.
    pub fn generate<E: Environment>(env: &E) -> Self {
        let mut bytes = [0u8; Self::RANDOM_BYTES];
        env.random_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Borrow as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl Borrow<str> for RoomId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// In-memory game state shared by at most two connections.
#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    host: Option<ConnId>,
    joiner: Option<ConnId>,
    /// Always within `[MIN_NUMBER, MAX_NUMBER]` once set.
    secret: Option<i64>,
    /// Guesses against the current secret.
    guesses: u32,
    created_at: Instant,
}

impl Room {
    /// Open a room with `host` in the host slot.
    pub fn new(id: RoomId, host: ConnId, created_at: Instant) -> Self {
        Self { id, host: Some(host), joiner: None, secret: None, guesses: 0, created_at }
    }

    /// Room identifier.
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Connection in the host slot, if still connected.
    pub fn host(&self) -> Option<ConnId> {
        self.host
    }

    /// Connection in the joiner slot, if any.
    pub fn joiner(&self) -> Option<ConnId> {
        self.joiner
    }

    /// Connection occupying the slot for `role`.
    pub fn participant(&self, role: Role) -> Option<ConnId> {
        match role {
            Role::Host => self.host,
            Role::Joiner => self.joiner,
        }
    }

    /// Number of occupied slots (0..=2).
    pub fn participant_count(&self) -> usize {
        usize::from(self.host.is_some()) + usize::from(self.joiner.is_some())
    }

    /// True when both slots are empty and the room can be dropped.
    pub fn is_empty(&self) -> bool {
        self.participant_count() == 0
    }

    /// Current secret, if the host has picked one.
    pub fn secret(&self) -> Option<i64> {
        self.secret
    }

    /// Guesses made against the current secret.
    pub fn guesses(&self) -> u32 {
        self.guesses
    }

    /// When the room was opened.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Put `conn_id` in the joiner slot.
    ///
    /// # Errors
    ///
    /// Returns `GameError::RoomFull` if the slot is taken.
    pub fn seat_joiner(&mut self, conn_id: ConnId) -> Result<(), GameError> {
        if self.joiner.is_some() {
            return Err(GameError::RoomFull);
        }
        self.joiner = Some(conn_id);
        Ok(())
    }

    /// Replace the secret and restart the guess count.
    pub fn set_secret(&mut self, secret: i64) {
        self.secret = Some(secret);
        self.guesses = 0;
    }

    /// Count a guess and compare it with the secret.
    ///
    /// Returns the outcome and the updated guess count.
    ///
    /// # Errors
    ///
    /// Returns `GameError::SecretNotSet` if no secret has been picked.
    pub fn record_guess(&mut self, guess: i64) -> Result<(GuessOutcome, u32), GameError> {
        let secret = self.secret.ok_or(GameError::SecretNotSet)?;
        self.guesses = self.guesses.saturating_add(1);
        Ok((GuessOutcome::compare(guess, secret), self.guesses))
    }

    /// Empty the slot `role` if `conn_id` holds it, returning the other
    /// participant.
    pub fn vacate(&mut self, role: Role, conn_id: ConnId) -> Option<ConnId> {
        let (slot, other) = match role {
            Role::Host => (&mut self.host, self.joiner),
            Role::Joiner => (&mut self.joiner, self.host),
        };
        if *slot == Some(conn_id) {
            *slot = None;
        }
        other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> Room {
        Room::new(RoomId::from("abcdef"), 1, Instant::now())
    }

    #[test]
    fn new_room_has_only_host() {
        let room = room();
        assert_eq!(room.host(), Some(1));
        assert_eq!(room.joiner(), None);
        assert_eq!(room.participant_count(), 1);
        assert_eq!(room.secret(), None);
    }

    #[test]
    fn second_joiner_is_rejected() {
        let mut room = room();
        room.seat_joiner(2).unwrap();
        assert_eq!(room.seat_joiner(3), Err(GameError::RoomFull));
        assert_eq!(room.joiner(), Some(2));
    }

    #[test]
    fn guess_without_secret_fails() {
        let mut room = room();
        assert_eq!(room.record_guess(5), Err(GameError::SecretNotSet));
        assert_eq!(room.guesses(), 0);
    }

    #[test]
    fn new_secret_resets_guess_count() {
        let mut room = room();
        room.set_secret(10);
        room.record_guess(3).unwrap();
        room.record_guess(12).unwrap();
        assert_eq!(room.guesses(), 2);

        room.set_secret(20);
        assert_eq!(room.guesses(), 0);
        assert_eq!(room.record_guess(20).unwrap(), (GuessOutcome::Correct, 1));
    }

    #[test]
    fn vacate_returns_peer_and_ignores_strangers() {
        let mut room = room();
        room.seat_joiner(2).unwrap();

        assert_eq!(room.vacate(Role::Host, 99), Some(2));
        assert_eq!(room.host(), Some(1));

        assert_eq!(room.vacate(Role::Host, 1), Some(2));
        assert_eq!(room.vacate(Role::Joiner, 2), None);
        assert!(room.is_empty());
    }

    #[test]
    fn room_id_is_url_safe() {
        #[derive(Clone)]
        struct FixedEnv;

        impl Environment for FixedEnv {
            fn now(&self) -> Instant {
                Instant::now()
            }

            fn random_bytes(&self, buffer: &mut [u8]) {
                buffer.fill(0xfb);
            }
        }

        let id = RoomId::generate(&FixedEnv);
        assert_eq!(id.as_str(), "-_v7-w");
    }
}
