//! In-memory server stand-in.
//!
//! `SimWorld` plays the role of the WebSocket layer: it hands out connection
//! IDs, feeds frames to a [`RoomRegistry`] and executes the returned actions
//! by appending to per-connection inboxes.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use numduel_core::{ConnId, RegistryConfig, RoomAction, RoomEvent, RoomId, RoomRegistry};
use numduel_proto::ServerMessage;

use crate::SimEnv;

/// Record of one routed `Send` action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Connection that triggered the action.
    pub from: ConnId,
    /// Recipient.
    pub to: ConnId,
    /// Whether the recipient was still open.
    pub delivered: bool,
    /// Payload.
    pub message: ServerMessage,
}

/// Record of one torn-down room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedRoom {
    /// Room that was removed.
    pub room_id: RoomId,
    /// Simulated time between creation and removal.
    pub lifetime: Duration,
}

/// Registry plus fake sockets.
#[derive(Debug)]
pub struct SimWorld {
    env: SimEnv,
    registry: RoomRegistry<SimEnv>,
    next_conn: ConnId,
    open: BTreeSet<ConnId>,
    inboxes: BTreeMap<ConnId, Vec<ServerMessage>>,
    transcript: Vec<Delivery>,
    closed: Vec<ClosedRoom>,
}

impl SimWorld {
    /// World with default registry limits.
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, RegistryConfig::default())
    }

    /// World with explicit registry limits.
    pub fn with_config(seed: u64, config: RegistryConfig) -> Self {
        let env = SimEnv::with_seed(seed);
        let registry = RoomRegistry::new(env.clone(), config);
        Self {
            env,
            registry,
            next_conn: 1,
            open: BTreeSet::new(),
            inboxes: BTreeMap::new(),
            transcript: Vec::new(),
            closed: Vec::new(),
        }
    }

    /// Simulation environment (clock and RNG).
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// The registry under test.
    pub fn registry(&self) -> &RoomRegistry<SimEnv> {
        &self.registry
    }

    /// Open a new connection.
    pub fn connect(&mut self) -> ConnId {
        let conn_id = self.next_conn;
        self.next_conn += 1;
        self.open.insert(conn_id);
        self.inboxes.insert(conn_id, Vec::new());
        conn_id
    }

    /// Currently open connections.
    pub fn open_connections(&self) -> impl Iterator<Item = ConnId> + '_ {
        self.open.iter().copied()
    }

    /// Send a text frame from `conn_id`. Ignored if the connection is closed.
    pub fn send_text(&mut self, conn_id: ConnId, text: &str) {
        if self.open.contains(&conn_id) {
            let event = RoomEvent::TextReceived { conn_id, text: text.to_owned() };
            self.dispatch(conn_id, event);
        }
    }

    /// Send a binary frame from `conn_id`.
    pub fn send_binary(&mut self, conn_id: ConnId) {
        if self.open.contains(&conn_id) {
            self.dispatch(conn_id, RoomEvent::BinaryReceived { conn_id });
        }
    }

    /// Close `conn_id`.
    pub fn disconnect(&mut self, conn_id: ConnId) {
        if self.open.remove(&conn_id) {
            self.dispatch(conn_id, RoomEvent::Disconnected { conn_id });
        }
    }

    /// Close every open connection.
    pub fn disconnect_all(&mut self) {
        let open: Vec<_> = self.open.iter().copied().collect();
        for conn_id in open {
            self.disconnect(conn_id);
        }
    }

    /// Messages delivered to `conn_id` so far.
    pub fn inbox(&self, conn_id: ConnId) -> &[ServerMessage] {
        self.inboxes.get(&conn_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Most recent message delivered to `conn_id`.
    pub fn last(&self, conn_id: ConnId) -> Option<&ServerMessage> {
        self.inbox(conn_id).last()
    }

    /// Every routed `Send` action, in order.
    pub fn transcript(&self) -> &[Delivery] {
        &self.transcript
    }

    /// Rooms dropped so far.
    pub fn rooms_closed(&self) -> usize {
        self.closed.len()
    }

    /// Every torn-down room, in order.
    pub fn closed_rooms(&self) -> &[ClosedRoom] {
        &self.closed
    }

    fn dispatch(&mut self, from: ConnId, event: RoomEvent) {
        for action in self.registry.process_event(event) {
            match action {
                RoomAction::Send { conn_id, message } => {
                    let delivered = self.open.contains(&conn_id);
                    if delivered {
                        self.inboxes.entry(conn_id).or_default().push(message.clone());
                    }
                    self.transcript.push(Delivery { from, to: conn_id, delivered, message });
                },
                RoomAction::RoomClosed { room_id, lifetime } => {
                    self.closed.push(ClosedRoom { room_id, lifetime });
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use numduel_proto::{GuessOutcome, Role};

    use super::*;

    fn room_id_of(message: Option<&ServerMessage>) -> String {
        match message {
            Some(ServerMessage::RoomCreated { room_id }) => room_id.clone(),
            other => panic!("expected RoomCreated, got {other:?}"),
        }
    }

    #[test]
    fn two_player_game() {
        let mut world = SimWorld::new(3);
        let host = world.connect();
        let joiner = world.connect();

        world.send_text(host, r#"{"type":"create_room"}"#);
        let room_id = room_id_of(world.last(host));

        world.send_text(joiner, &format!(r#"{{"type":"join_room","room_id":"{room_id}"}}"#));
        assert_eq!(
            world.last(joiner),
            Some(&ServerMessage::RoomJoined { room_id: room_id.clone(), role: Role::Joiner })
        );
        assert_eq!(world.last(host), Some(&ServerMessage::status("Joiner connected.")));

        world.send_text(host, r#"{"type":"set_secret","secret":"64"}"#);
        world.send_text(joiner, r#"{"type":"guess","guess":64}"#);

        assert_eq!(
            world.last(joiner),
            Some(&ServerMessage::GuessResult { result: GuessOutcome::Correct, guesses: 1 })
        );
        assert_eq!(
            world.last(host),
            Some(&ServerMessage::status("Joiner guessed correctly in 1 tries."))
        );
    }

    #[test]
    fn room_closes_with_its_host() {
        let mut world = SimWorld::new(3);
        let host = world.connect();
        let joiner = world.connect();

        world.send_text(host, r#"{"type":"create_room"}"#);
        let room_id = room_id_of(world.last(host));
        world.disconnect(host);

        world.send_text(joiner, &format!(r#"{{"type":"join_room","room_id":"{room_id}"}}"#));
        assert_eq!(world.last(joiner), Some(&ServerMessage::error("Room not found.")));
        assert_eq!(world.rooms_closed(), 1);
        assert!(world.transcript().iter().all(|d| d.delivered));
    }

    #[test]
    fn closed_room_reports_simulated_lifetime() {
        let mut world = SimWorld::new(5);
        let host = world.connect();
        let joiner = world.connect();

        world.send_text(host, r#"{"type":"create_room"}"#);
        let room_id = room_id_of(world.last(host));
        world.send_text(joiner, &format!(r#"{{"type":"join_room","room_id":"{room_id}"}}"#));

        world.env().advance(Duration::from_secs(30));
        world.disconnect(host);
        assert!(world.closed_rooms().is_empty(), "joiner still seated");

        world.env().advance(Duration::from_secs(12));
        world.disconnect(joiner);

        assert_eq!(world.closed_rooms(), &[ClosedRoom {
            room_id: RoomId::from(room_id.as_str()),
            lifetime: Duration::from_secs(42),
        }]);
    }

    #[test]
    fn binary_frames_are_rejected() {
        let mut world = SimWorld::new(3);
        let conn = world.connect();
        world.send_binary(conn);
        assert_eq!(world.last(conn), Some(&ServerMessage::error("Expected a text message.")));
    }
}
