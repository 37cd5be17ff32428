//! Client and server message types.

use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ProtocolError;

/// Role a connection plays inside a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Created the room and picks the secret.
    Host,
    /// Joined by room ID and makes the guesses.
    Joiner,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => f.write_str("host"),
            Self::Joiner => f.write_str("joiner"),
        }
    }
}

/// Result of comparing a guess with the secret, from the guesser's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuessOutcome {
    /// The secret is higher than the guess.
    Higher,
    /// The secret is lower than the guess.
    Lower,
    /// The guess hit the secret.
    Correct,
}

impl GuessOutcome {
    /// Compare `guess` against `secret`.
    pub fn compare(guess: i64, secret: i64) -> Self {
        match guess.cmp(&secret) {
            Ordering::Less => Self::Higher,
            Ordering::Greater => Self::Lower,
            Ordering::Equal => Self::Correct,
        }
    }

    /// Whether this outcome ends the round.
    pub fn is_correct(self) -> bool {
        self == Self::Correct
    }
}

/// Message sent by a browser to the server.
///
/// Payload fields are optional because the room logic, not the decoder,
/// decides which error a bad value earns. `None` means the field was missing
/// or had an unusable type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Open a new room and become its host.
    CreateRoom,
    /// Join an existing room as the guesser.
    JoinRoom {
        /// Room identifier; `None` if absent or not a string.
        room_id: Option<String>,
    },
    /// Host picks (or re-picks) the secret number.
    SetSecret {
        /// Coerced secret; `None` if not an integer.
        secret: Option<i64>,
    },
    /// Joiner guesses the secret number.
    Guess {
        /// Coerced guess; `None` if not an integer.
        guess: Option<i64>,
    },
    /// Any other `type` value.
    Unknown {
        /// The `type` value as received.
        kind: String,
    },
}

impl ClientMessage {
    /// Decode a text frame.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::InvalidJson`] if `raw` is not JSON
    /// - [`ProtocolError::MissingType`] if it is not an object with `type`
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(raw).map_err(|_| ProtocolError::InvalidJson)?;
        let Value::Object(fields) = value else {
            return Err(ProtocolError::MissingType);
        };
        let kind = fields.get("type").ok_or(ProtocolError::MissingType)?;

        let message = match kind.as_str() {
            Some("create_room") => Self::CreateRoom,
            Some("join_room") => Self::JoinRoom {
                room_id: fields.get("room_id").and_then(Value::as_str).map(str::to_owned),
            },
            Some("set_secret") => {
                Self::SetSecret { secret: fields.get("secret").and_then(coerce_int) }
            },
            Some("guess") => Self::Guess { guess: fields.get("guess").and_then(coerce_int) },
            Some(other) => Self::Unknown { kind: other.to_owned() },
            None => Self::Unknown { kind: kind.to_string() },
        };

        Ok(message)
    }
}

/// Accept JSON integers and strings of ASCII digits. Booleans, floats and
/// anything else are rejected.
fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            s.parse().ok()
        },
        _ => None,
    }
}

/// Message sent by the server to a browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A room was created for the sender, who is now its host.
    RoomCreated {
        /// Identifier to share with the other player.
        room_id: String,
    },
    /// The sender joined a room.
    RoomJoined {
        /// Room that was joined.
        room_id: String,
        /// Always [`Role::Joiner`].
        role: Role,
    },
    /// Free-form progress notice.
    Status {
        /// Human readable text.
        message: String,
    },
    /// Answer to a guess.
    GuessResult {
        /// Direction hint or success.
        result: GuessOutcome,
        /// Guesses made against the current secret, including this one.
        guesses: u32,
    },
    /// The sender's last message was rejected.
    Error {
        /// Human readable reason.
        message: String,
    },
}

impl ServerMessage {
    /// Build a `status` message.
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status { message: message.into() }
    }

    /// Build an `error` message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { message: message.into() }
    }

    /// Encode as a JSON text frame.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<ProtocolError> for ServerMessage {
    fn from(err: ProtocolError) -> Self {
        Self::error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn decode_create_room() {
        assert_eq!(ClientMessage::decode(r#"{"type":"create_room"}"#), Ok(ClientMessage::CreateRoom));
    }

    #[test]
    fn decode_join_room_keeps_string_id() {
        let msg = ClientMessage::decode(r#"{"type":"join_room","room_id":"abc123"}"#).unwrap();
        assert_eq!(msg, ClientMessage::JoinRoom { room_id: Some("abc123".to_string()) });
    }

    #[test]
    fn decode_join_room_non_string_id_is_none() {
        let msg = ClientMessage::decode(r#"{"type":"join_room","room_id":42}"#).unwrap();
        assert_eq!(msg, ClientMessage::JoinRoom { room_id: None });

        let msg = ClientMessage::decode(r#"{"type":"join_room"}"#).unwrap();
        assert_eq!(msg, ClientMessage::JoinRoom { room_id: None });
    }

    #[test]
    fn decode_rejects_bad_json() {
        assert_eq!(ClientMessage::decode("not json"), Err(ProtocolError::InvalidJson));
        assert_eq!(ClientMessage::decode(""), Err(ProtocolError::InvalidJson));
    }

    #[test]
    fn decode_requires_object_with_type() {
        assert_eq!(ClientMessage::decode("[1,2]"), Err(ProtocolError::MissingType));
        assert_eq!(ClientMessage::decode("7"), Err(ProtocolError::MissingType));
        assert_eq!(ClientMessage::decode(r#"{"guess":5}"#), Err(ProtocolError::MissingType));
    }

    #[test]
    fn decode_unknown_type() {
        let msg = ClientMessage::decode(r#"{"type":"chat"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Unknown { kind: "chat".to_string() });

        let msg = ClientMessage::decode(r#"{"type":null}"#).unwrap();
        assert_eq!(msg, ClientMessage::Unknown { kind: "null".to_string() });
    }

    #[test]
    fn integers_and_digit_strings_coerce() {
        let msg = ClientMessage::decode(r#"{"type":"guess","guess":42}"#).unwrap();
        assert_eq!(msg, ClientMessage::Guess { guess: Some(42) });

        let msg = ClientMessage::decode(r#"{"type":"guess","guess":"42"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Guess { guess: Some(42) });

        let msg = ClientMessage::decode(r#"{"type":"set_secret","secret":-3}"#).unwrap();
        assert_eq!(msg, ClientMessage::SetSecret { secret: Some(-3) });
    }

    #[test]
    fn non_integers_do_not_coerce() {
        for raw in [
            r#"{"type":"guess","guess":true}"#,
            r#"{"type":"guess","guess":4.5}"#,
            r#"{"type":"guess","guess":5.0}"#,
            r#"{"type":"guess","guess":"-5"}"#,
            r#"{"type":"guess","guess":""}"#,
            r#"{"type":"guess","guess":" 5"}"#,
            r#"{"type":"guess","guess":null}"#,
            r#"{"type":"guess"}"#,
            r#"{"type":"guess","guess":"99999999999999999999999"}"#,
        ] {
            assert_eq!(ClientMessage::decode(raw), Ok(ClientMessage::Guess { guess: None }), "{raw}");
        }
    }

    #[test]
    fn only_ascii_digits_coerce() {
        // Arabic-Indic five and fullwidth five
        for raw in [r#"{"type":"guess","guess":"٥"}"#, r#"{"type":"guess","guess":"５"}"#] {
            assert_eq!(ClientMessage::decode(raw), Ok(ClientMessage::Guess { guess: None }), "{raw}");
        }
    }

    #[test]
    fn compare_points_toward_secret() {
        assert_eq!(GuessOutcome::compare(10, 50), GuessOutcome::Higher);
        assert_eq!(GuessOutcome::compare(90, 50), GuessOutcome::Lower);
        assert_eq!(GuessOutcome::compare(50, 50), GuessOutcome::Correct);
    }

    #[test]
    fn server_messages_wire_format() {
        let created = ServerMessage::RoomCreated { room_id: "AbC-_9".to_string() };
        assert_snapshot!(created.to_json().unwrap(), @r#"{"type":"room_created","room_id":"AbC-_9"}"#);

        let joined = ServerMessage::RoomJoined { room_id: "AbC-_9".to_string(), role: Role::Joiner };
        assert_snapshot!(joined.to_json().unwrap(), @r#"{"type":"room_joined","room_id":"AbC-_9","role":"joiner"}"#);

        let result = ServerMessage::GuessResult { result: GuessOutcome::Higher, guesses: 3 };
        assert_snapshot!(result.to_json().unwrap(), @r#"{"type":"guess_result","result":"higher","guesses":3}"#);

        let status = ServerMessage::status("Joiner connected.");
        assert_snapshot!(status.to_json().unwrap(), @r#"{"type":"status","message":"Joiner connected."}"#);

        let error = ServerMessage::from(ProtocolError::InvalidJson);
        assert_snapshot!(error.to_json().unwrap(), @r#"{"type":"error","message":"Invalid JSON."}"#);
    }

    proptest! {
        #[test]
        fn decode_never_panics(raw in ".*") {
            let _ = ClientMessage::decode(&raw);
        }

        #[test]
        fn digit_strings_match_numbers(n in 0i64..=10_000_000) {
            let from_number = ClientMessage::decode(&format!(r#"{{"type":"guess","guess":{n}}}"#));
            let from_string = ClientMessage::decode(&format!(r#"{{"type":"guess","guess":"{n}"}}"#));
            prop_assert_eq!(from_number.clone(), from_string);
            prop_assert_eq!(from_number, Ok(ClientMessage::Guess { guess: Some(n) }));
        }
    }
}
