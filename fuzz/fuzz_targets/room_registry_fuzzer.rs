//! Fuzz target for [`RoomRegistry`] event handling
//!
//! Arbitrary clients must never corrupt room bookkeeping.
//!
//! # Strategy
//!
//! - Raw frames: arbitrary text, including malformed JSON and wrong types
//! - Shaped messages: well-formed messages with fuzzed fields so the
//!   role and range checks are reached
//! - Churn: connects, binary frames and disconnects interleaved
//!
//! # Invariants
//!
//! - Every text or binary frame gets at least one reply to its sender
//! - Every seated player has a session pointing at their room
//! - No empty room survives an event
//! - Open rooms never exceed `max_rooms`
//! - NEVER panic on client input
//!
//! [`RoomRegistry`]: numduel_core::RoomRegistry

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use numduel_core::{ConnId, RegistryConfig};
use numduel_harness::SimWorld;
use numduel_proto::{Role, ServerMessage};

#[derive(Debug, Clone, Arbitrary)]
enum FuzzEvent {
    Connect,
    Raw { client: u8, text: String },
    Create { client: u8 },
    Join { client: u8, target: u8, garbage: Option<String> },
    SetSecret { client: u8, value: i64 },
    Guess { client: u8, value: i64, as_string: bool },
    Binary { client: u8 },
    Disconnect { client: u8 },
}

#[derive(Debug, Clone, Arbitrary)]
struct FuzzInput {
    seed: u64,
    max_rooms: u8,
    events: Vec<FuzzEvent>,
}

fuzz_target!(|input: FuzzInput| {
    let config = RegistryConfig { max_rooms: usize::from(input.max_rooms % 8) + 1 };
    let mut world = SimWorld::with_config(input.seed, config);
    let mut clients: Vec<ConnId> = Vec::new();
    let mut announced: Vec<String> = Vec::new();

    for event in input.events {
        match event {
            FuzzEvent::Connect => clients.push(world.connect()),
            FuzzEvent::Disconnect { client } => {
                if let Some(conn_id) = pick(&clients, client) {
                    world.disconnect(conn_id);
                    clients.retain(|c| *c != conn_id);
                }
            },
            FuzzEvent::Binary { client } => {
                if let Some(conn_id) = pick(&clients, client) {
                    let before = world.inbox(conn_id).len();
                    world.send_binary(conn_id);
                    assert!(world.inbox(conn_id).len() > before, "binary frame got no reply");
                }
            },
            other => {
                let Some(conn_id) = client_of(&other).and_then(|c| pick(&clients, c)) else {
                    continue;
                };
                let text = render(&other, &announced);
                let before = world.inbox(conn_id).len();
                world.send_text(conn_id, &text);
                assert!(world.inbox(conn_id).len() > before, "text frame got no reply: {text}");

                if let Some(ServerMessage::RoomCreated { room_id }) = world.last(conn_id) {
                    announced.push(room_id.clone());
                }
            },
        }

        check_invariants(&world, config);
    }

    world.disconnect_all();
    assert_eq!(world.registry().room_count(), 0);
    assert_eq!(world.registry().session_count(), 0);
});

fn pick(clients: &[ConnId], index: u8) -> Option<ConnId> {
    if clients.is_empty() {
        None
    } else {
        Some(clients[usize::from(index) % clients.len()])
    }
}

fn client_of(event: &FuzzEvent) -> Option<u8> {
    match event {
        FuzzEvent::Raw { client, .. }
        | FuzzEvent::Create { client }
        | FuzzEvent::Join { client, .. }
        | FuzzEvent::SetSecret { client, .. }
        | FuzzEvent::Guess { client, .. } => Some(*client),
        _ => None,
    }
}

fn render(event: &FuzzEvent, announced: &[String]) -> String {
    match event {
        FuzzEvent::Raw { text, .. } => text.clone(),
        FuzzEvent::Create { .. } => r#"{"type":"create_room"}"#.to_string(),
        FuzzEvent::Join { target, garbage, .. } => {
            let room_id = match garbage {
                Some(text) => text.clone(),
                None if announced.is_empty() => String::new(),
                None => announced[usize::from(*target) % announced.len()].clone(),
            };
            format!(r#"{{"type":"join_room","room_id":{}}}"#, quote(&room_id))
        },
        FuzzEvent::SetSecret { value, .. } => {
            format!(r#"{{"type":"set_secret","secret":{value}}}"#)
        },
        FuzzEvent::Guess { value, as_string: true, .. } => {
            format!(r#"{{"type":"guess","guess":"{value}"}}"#)
        },
        FuzzEvent::Guess { value, .. } => format!(r#"{{"type":"guess","guess":{value}}}"#),
        _ => String::new(),
    }
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn check_invariants(world: &SimWorld, config: RegistryConfig) {
    let registry = world.registry();
    assert!(registry.room_count() <= config.max_rooms);

    let mut seated = 0;
    for room in registry.rooms() {
        assert!(!room.is_empty(), "empty room {} survived", room.id());

        for role in [Role::Host, Role::Joiner] {
            if let Some(conn_id) = room.participant(role) {
                seated += 1;
                assert_eq!(registry.role_of(conn_id), Some(role));
                assert_eq!(registry.room_of(conn_id), Some(room.id()));
            }
        }
    }
    assert_eq!(registry.session_count(), seated);
}
