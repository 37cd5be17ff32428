//! Room Registry
//!
//! Owns every live room and the binding from connections to rooms.
//!
//! ## Responsibilities
//!
//! - Room Lifecycle: create, join, tear down when both players are gone
//! - Role Enforcement: unbound connections may only create or join, hosts
//!   may only set the secret, joiners may only guess
//! - Action Generation: return actions for the server to execute
//!
//! ## Design
//!
//! - Action-based: no method performs I/O. The server routes each
//!   [`RoomAction::Send`] to the matching socket.
//! - Errors are replies: a rejected message becomes an `error` message for
//!   the sender and leaves all state untouched.

use std::{collections::HashMap, time::Duration};

use numduel_proto::{ClientMessage, ProtocolError, Role, ServerMessage, in_range};

use crate::{
    GameError,
    env::Environment,
    room::{ConnId, Room, RoomId},
};

/// Default cap on concurrently open rooms.
pub const DEFAULT_MAX_ROOMS: usize = 1000;

/// Fresh IDs drawn before giving up on a collision streak.
const ROOM_ID_ATTEMPTS: usize = 16;

/// Registry limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Maximum number of rooms open at once.
    pub max_rooms: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { max_rooms: DEFAULT_MAX_ROOMS }
    }
}

/// Inputs fed to the registry by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// A text frame arrived.
    TextReceived {
        /// Sending connection
        conn_id: ConnId,
        /// Raw frame contents
        text: String,
    },
    /// A binary frame arrived.
    BinaryReceived {
        /// Sending connection
        conn_id: ConnId,
    },
    /// The connection closed or errored.
    Disconnected {
        /// Closed connection
        conn_id: ConnId,
    },
}

/// Actions returned by the registry for the server to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomAction {
    /// Deliver `message` to `conn_id`. Best effort: the connection may
    /// already be gone.
    Send {
        /// Recipient
        conn_id: ConnId,
        /// Message to deliver
        message: ServerMessage,
    },
    /// A room lost its last participant and was dropped.
    RoomClosed {
        /// Dropped room
        room_id: RoomId,
        /// How long the room was open
        lifetime: Duration,
    },
}

impl RoomAction {
    fn send(conn_id: ConnId, message: ServerMessage) -> Self {
        Self::Send { conn_id, message }
    }
}

/// Which room a connection belongs to, and as what.
#[derive(Debug, Clone)]
struct Session {
    role: Role,
    room_id: RoomId,
}

/// Error a bound connection earns for sending outside its role.
fn role_error(role: Role) -> GameError {
    match role {
        Role::Host => GameError::HostOnlySetsSecret,
        Role::Joiner => GameError::JoinerOnlyGuesses,
    }
}

/// In-memory registry of rooms and the sessions bound to them.
pub struct RoomRegistry<E>
where
    E: Environment,
{
    env: E,
    config: RegistryConfig,
    rooms: HashMap<RoomId, Room>,
    sessions: HashMap<ConnId, Session>,
}

impl<E> RoomRegistry<E>
where
    E: Environment,
{
    /// Create an empty registry.
    pub fn new(env: E, config: RegistryConfig) -> Self {
        Self { env, config, rooms: HashMap::new(), sessions: HashMap::new() }
    }

    /// Number of open rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Number of connections bound to a room.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Check if a room exists.
    pub fn has_room(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Look up a room.
    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    /// Iterate over all open rooms.
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// Role of a bound connection.
    pub fn role_of(&self, conn_id: ConnId) -> Option<Role> {
        self.sessions.get(&conn_id).map(|s| s.role)
    }

    /// Room a bound connection belongs to.
    pub fn room_of(&self, conn_id: ConnId) -> Option<&RoomId> {
        self.sessions.get(&conn_id).map(|s| &s.room_id)
    }

    /// Process a transport event. Never fails: errors are turned into
    /// `error` replies.
    pub fn process_event(&mut self, event: RoomEvent) -> Vec<RoomAction> {
        match event {
            RoomEvent::TextReceived { conn_id, text } => match ClientMessage::decode(&text) {
                Ok(message) => self.handle_message(conn_id, message),
                Err(err) => Self::reject(conn_id, &GameError::from(err)),
            },
            RoomEvent::BinaryReceived { conn_id } => {
                Self::reject(conn_id, &GameError::from(ProtocolError::BinaryFrame))
            },
            RoomEvent::Disconnected { conn_id } => self.disconnect(conn_id),
        }
    }

    /// Process a decoded client message, replying with an `error` on
    /// rejection.
    pub fn handle_message(&mut self, conn_id: ConnId, message: ClientMessage) -> Vec<RoomAction> {
        let result = match message {
            ClientMessage::CreateRoom => self.create_room(conn_id),
            ClientMessage::JoinRoom { room_id } => self.join_room(conn_id, room_id.as_deref()),
            ClientMessage::SetSecret { secret } => self.set_secret(conn_id, secret),
            ClientMessage::Guess { guess } => self.guess(conn_id, guess),
            ClientMessage::Unknown { kind } => {
                tracing::debug!(conn_id, kind = %kind, "unknown message type");
                Err(self.role_of(conn_id).map_or(GameError::NotInRoom, role_error))
            },
        };

        result.unwrap_or_else(|err| Self::reject(conn_id, &err))
    }

    fn reject(conn_id: ConnId, err: &GameError) -> Vec<RoomAction> {
        tracing::debug!(conn_id, %err, "message rejected");
        vec![RoomAction::send(conn_id, ServerMessage::error(err.to_string()))]
    }

    /// Open a room with `conn_id` as host.
    ///
    /// # Errors
    ///
    /// - `GameError::HostOnlySetsSecret` / `JoinerOnlyGuesses` if the
    ///   connection is already in a room
    /// - `GameError::RoomLimitReached` at capacity
    /// - `GameError::RoomIdExhausted` if no unused ID could be drawn
    pub fn create_room(&mut self, conn_id: ConnId) -> Result<Vec<RoomAction>, GameError> {
        if let Some(role) = self.role_of(conn_id) {
            return Err(role_error(role));
        }
        if self.rooms.len() >= self.config.max_rooms {
            tracing::warn!(max_rooms = self.config.max_rooms, "room limit reached");
            return Err(GameError::RoomLimitReached);
        }

        let room_id = self.allocate_room_id()?;
        let room = Room::new(room_id.clone(), conn_id, self.env.now());
        self.rooms.insert(room_id.clone(), room);
        self.sessions.insert(conn_id, Session { role: Role::Host, room_id: room_id.clone() });

        tracing::info!(room = %room_id, conn_id, rooms = self.rooms.len(), "room created");

        Ok(vec![RoomAction::send(conn_id, ServerMessage::RoomCreated {
            room_id: room_id.to_string(),
        })])
    }

    fn allocate_room_id(&self) -> Result<RoomId, GameError> {
        for _ in 0..ROOM_ID_ATTEMPTS {
            let id = RoomId::generate(&self.env);
            if !self.rooms.contains_key(&id) {
                return Ok(id);
            }
        }
        tracing::error!(attempts = ROOM_ID_ATTEMPTS, "room id space exhausted");
        Err(GameError::RoomIdExhausted)
    }

    /// Seat `conn_id` as the joiner of `room_id`.
    ///
    /// # Errors
    ///
    /// - role errors if the connection is already in a room
    /// - `GameError::InvalidRoomId` for a missing or empty ID
    /// - `GameError::RoomNotFound`
    /// - `GameError::RoomFull` if someone already joined
    pub fn join_room(
        &mut self,
        conn_id: ConnId,
        room_id: Option<&str>,
    ) -> Result<Vec<RoomAction>, GameError> {
        if let Some(role) = self.role_of(conn_id) {
            return Err(role_error(role));
        }
        let room_id = room_id.filter(|id| !id.is_empty()).ok_or(GameError::InvalidRoomId)?;
        let room = self.rooms.get_mut(room_id).ok_or(GameError::RoomNotFound)?;
        room.seat_joiner(conn_id)?;

        let room_id = room.id().clone();
        let host = room.host();
        self.sessions.insert(conn_id, Session { role: Role::Joiner, room_id: room_id.clone() });

        tracing::info!(room = %room_id, conn_id, "joiner seated");

        let mut actions = vec![RoomAction::send(conn_id, ServerMessage::RoomJoined {
            room_id: room_id.to_string(),
            role: Role::Joiner,
        })];
        if let Some(host) = host {
            actions.push(RoomAction::send(host, ServerMessage::status("Joiner connected.")));
        }
        Ok(actions)
    }

    /// Host picks the secret. Resets the guess count.
    ///
    /// # Errors
    ///
    /// - `GameError::NotInRoom` / `JoinerOnlyGuesses` if the caller is not
    ///   a host
    /// - `GameError::InvalidSecret` if missing or out of range
    /// - `GameError::RoomGone` if the room was removed
    pub fn set_secret(
        &mut self,
        conn_id: ConnId,
        secret: Option<i64>,
    ) -> Result<Vec<RoomAction>, GameError> {
        let session = self.sessions.get(&conn_id).ok_or(GameError::NotInRoom)?;
        if session.role != Role::Host {
            return Err(role_error(session.role));
        }
        let secret = secret.filter(|s| in_range(*s)).ok_or(GameError::InvalidSecret)?;
        let room = self.rooms.get_mut(&session.room_id).ok_or(GameError::RoomGone)?;
        room.set_secret(secret);

        tracing::debug!(room = %room.id(), "secret set");

        Ok(vec![RoomAction::send(
            conn_id,
            ServerMessage::status("Secret set. Waiting for guesses."),
        )])
    }

    /// Joiner guesses the secret.
    ///
    /// # Errors
    ///
    /// - `GameError::NotInRoom` / `HostOnlySetsSecret` if the caller is not
    ///   a joiner
    /// - `GameError::InvalidGuess` if missing or out of range
    /// - `GameError::RoomGone` if the room was removed
    /// - `GameError::SecretNotSet` before the host picked a secret
    pub fn guess(
        &mut self,
        conn_id: ConnId,
        guess: Option<i64>,
    ) -> Result<Vec<RoomAction>, GameError> {
        let session = self.sessions.get(&conn_id).ok_or(GameError::NotInRoom)?;
        if session.role != Role::Joiner {
            return Err(role_error(session.role));
        }
        let guess = guess.filter(|g| in_range(*g)).ok_or(GameError::InvalidGuess)?;
        let room = self.rooms.get_mut(&session.room_id).ok_or(GameError::RoomGone)?;
        let (result, guesses) = room.record_guess(guess)?;

        tracing::debug!(room = %room.id(), ?result, guesses, "guess scored");

        let mut actions =
            vec![RoomAction::send(conn_id, ServerMessage::GuessResult { result, guesses })];
        if let (true, Some(host)) = (result.is_correct(), room.host()) {
            actions.push(RoomAction::send(
                host,
                ServerMessage::status(format!("Joiner guessed correctly in {guesses} tries.")),
            ));
        }
        Ok(actions)
    }

    /// Drop `conn_id`'s session, tell the peer, and remove the room once
    /// both slots are empty. Unbound connections produce no actions.
    pub fn disconnect(&mut self, conn_id: ConnId) -> Vec<RoomAction> {
        let Some(session) = self.sessions.remove(&conn_id) else {
            return Vec::new();
        };
        let Some(room) = self.rooms.get_mut(&session.room_id) else {
            return Vec::new();
        };

        let mut actions = Vec::new();
        if let Some(peer) = room.vacate(session.role, conn_id) {
            actions.push(RoomAction::send(peer, ServerMessage::status("Other player disconnected.")));
        }

        tracing::info!(room = %session.room_id, conn_id, role = %session.role, "player left");

        if room.is_empty() {
            let lifetime = self.env.now().saturating_duration_since(room.created_at());
            self.rooms.remove(&session.room_id);
            actions.push(RoomAction::RoomClosed { room_id: session.room_id, lifetime });
        }

        actions
    }
}

impl<E> std::fmt::Debug for RoomRegistry<E>
where
    E: Environment,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomRegistry")
            .field("room_count", &self.rooms.len())
            .field("session_count", &self.sessions.len())
            .field("config", &self.config)
            .finish()
    }
}
