//! Executes room actions against live connections.

use numduel_core::RoomAction;

use crate::registry::ConnectionRegistry;

/// Counts from one batch of actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    /// Messages queued on an open connection.
    pub delivered: usize,
    /// Messages whose recipient was already gone.
    pub dropped: usize,
    /// Rooms torn down.
    pub rooms_closed: usize,
}

/// Route every action. Delivery is best effort: a recipient that went away
/// between the registry decision and now is skipped.
pub fn execute_actions(
    actions: Vec<RoomAction>,
    connections: &ConnectionRegistry,
) -> ExecutionSummary {
    let mut summary = ExecutionSummary::default();

    for action in actions {
        match action {
            RoomAction::Send { conn_id, message } => {
                if connections.send(conn_id, message) {
                    summary.delivered += 1;
                } else {
                    tracing::debug!(conn_id, "recipient gone, message dropped");
                    summary.dropped += 1;
                }
            },

            RoomAction::RoomClosed { room_id, lifetime } => {
                tracing::info!(room = %room_id, ?lifetime, "room closed");
                summary.rooms_closed += 1;
            },
        }
    }

    summary
}
