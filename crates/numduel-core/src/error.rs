//! Game error types.

use numduel_proto::{MAX_NUMBER, MIN_NUMBER, ProtocolError};
use thiserror::Error;

/// Errors from room registry operations.
///
/// Every variant is reported to the offending connection as an `error`
/// message; none of them closes the socket. The `Display` text is what the
/// player sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Client frame could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Registry already holds `max_rooms` rooms.
    #[error("Room limit reached.")]
    RoomLimitReached,

    /// No unused room ID could be drawn from the environment.
    #[error("Could not allocate a room ID.")]
    RoomIdExhausted,

    /// `join_room` without a usable room ID.
    #[error("Invalid room ID.")]
    InvalidRoomId,

    /// `join_room` for an ID that is not registered.
    #[error("Room not found.")]
    RoomNotFound,

    /// `join_room` for a room whose joiner slot is taken.
    #[error("Room already has a joiner.")]
    RoomFull,

    /// Unbound connection sent something other than create or join.
    #[error("First message must be create_room or join_room.")]
    NotInRoom,

    /// Bound session refers to a room that was removed.
    #[error("Room no longer exists.")]
    RoomGone,

    /// Secret missing, not an integer, or out of range.
    #[error("Secret must be an integer between {min} and {max}.", min = MIN_NUMBER, max = MAX_NUMBER)]
    InvalidSecret,

    /// Guess missing, not an integer, or out of range.
    #[error("Guess must be an integer between {min} and {max}.", min = MIN_NUMBER, max = MAX_NUMBER)]
    InvalidGuess,

    /// Joiner guessed before the host picked a secret.
    #[error("Host has not set a secret yet.")]
    SecretNotSet,

    /// Host sent something other than `set_secret`.
    #[error("Host can only set_secret.")]
    HostOnlySetsSecret,

    /// Joiner sent something other than `guess`.
    #[error("Joiner can only guess.")]
    JoinerOnlyGuesses,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_errors_name_the_bounds() {
        assert_eq!(
            GameError::InvalidSecret.to_string(),
            "Secret must be an integer between 1 and 1000000."
        );
        assert_eq!(
            GameError::InvalidGuess.to_string(),
            "Guess must be an integer between 1 and 1000000."
        );
    }

    #[test]
    fn protocol_errors_pass_through() {
        let err = GameError::from(ProtocolError::MissingType);
        assert_eq!(err.to_string(), "Missing message type.");
    }
}
