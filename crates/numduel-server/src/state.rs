//! Shared server state.

use std::sync::Arc;

use numduel_core::{ConnId, RegistryConfig, RoomEvent, RoomRegistry, env::Environment};
use tokio::sync::Mutex;

use crate::{
    SystemEnv,
    executor::{ExecutionSummary, execute_actions},
    registry::{ConnectionRegistry, Outbox},
};

/// Fresh IDs drawn before refusing a connection.
const CONN_ID_ATTEMPTS: usize = 16;

/// Room registry and connection registry behind one lock, so actions are
/// routed in the order the registry produced them.
#[derive(Debug)]
struct Hub {
    rooms: RoomRegistry<SystemEnv>,
    connections: ConnectionRegistry,
}

/// Cloneable handle given to every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    hub: Arc<Mutex<Hub>>,
    env: SystemEnv,
}

impl AppState {
    /// Fresh state with no rooms and no connections.
    pub fn new(config: RegistryConfig) -> Self {
        let env = SystemEnv::new();
        let hub = Hub {
            rooms: RoomRegistry::new(env.clone(), config),
            connections: ConnectionRegistry::new(),
        };
        Self { hub: Arc::new(Mutex::new(hub)), env }
    }

    /// Register a new connection under a random unused ID.
    ///
    /// Returns `None` if the RNG keeps producing IDs that are in use.
    pub async fn connect(&self) -> Option<(ConnId, Outbox)> {
        let mut hub = self.hub.lock().await;
        for _ in 0..CONN_ID_ATTEMPTS {
            let conn_id = self.env.random_u64();
            if let Some(outbox) = hub.connections.register(conn_id) {
                tracing::debug!(conn_id, connections = hub.connections.len(), "connection opened");
                return Some((conn_id, outbox));
            }
        }
        tracing::error!(attempts = CONN_ID_ATTEMPTS, "no free connection id");
        None
    }

    /// Feed one event to the room registry and route the resulting actions.
    pub async fn process(&self, event: RoomEvent) -> ExecutionSummary {
        let mut hub = self.hub.lock().await;
        let actions = hub.rooms.process_event(event);
        execute_actions(actions, &hub.connections)
    }

    /// Leave any room and forget the connection.
    pub async fn disconnect(&self, conn_id: ConnId) -> ExecutionSummary {
        let mut hub = self.hub.lock().await;
        let actions = hub.rooms.process_event(RoomEvent::Disconnected { conn_id });
        hub.connections.unregister(conn_id);
        let summary = execute_actions(actions, &hub.connections);
        tracing::debug!(conn_id, connections = hub.connections.len(), "connection closed");
        summary
    }

    /// Number of open rooms.
    pub async fn room_count(&self) -> usize {
        self.hub.lock().await.rooms.room_count()
    }

    /// Number of open connections.
    pub async fn connection_count(&self) -> usize {
        self.hub.lock().await.connections.len()
    }
}
