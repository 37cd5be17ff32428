//! Per-connection WebSocket loop.
//!
//! Generic over the stream and sink halves so the loop can be driven by
//! in-memory channels in tests as well as by an axum `WebSocket`.

use std::fmt::Display;

use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream, StreamExt};
use numduel_core::{ConnId, RoomEvent};

use crate::{AppState, registry::Outbox};

/// Serve one connection until the peer closes it or the read side errors.
///
/// Incoming frames are fed to the room registry in order. Outgoing messages
/// are written by a separate task so a slow peer never blocks the registry.
pub async fn serve_connection<St, Si, E>(state: AppState, mut stream: St, sink: Si)
where
    St: Stream<Item = Result<Message, E>> + Unpin,
    Si: Sink<Message> + Send + Unpin + 'static,
    E: Display,
{
    let Some((conn_id, outbox)) = state.connect().await else {
        return;
    };
    let writer = tokio::spawn(write_outbox(conn_id, outbox, sink));

    while let Some(frame) = stream.next().await {
        let event = match frame {
            Ok(Message::Text(text)) => RoomEvent::TextReceived { conn_id, text },
            Ok(Message::Binary(_)) => RoomEvent::BinaryReceived { conn_id },
            Ok(Message::Ping(_) | Message::Pong(_)) => continue,
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::debug!(conn_id, "read error: {}", e);
                break;
            },
        };
        let summary = state.process(event).await;
        if summary.dropped > 0 {
            tracing::debug!(conn_id, dropped = summary.dropped, "replies not delivered");
        }
    }

    let summary = state.disconnect(conn_id).await;
    tracing::debug!(
        conn_id,
        notified = summary.delivered,
        rooms_closed = summary.rooms_closed,
        "connection cleaned up"
    );

    if let Err(e) = writer.await {
        tracing::warn!(conn_id, "writer task failed: {}", e);
    }
}

/// Drain the outbox into the socket. Ends when the connection is
/// unregistered or the socket stops accepting writes.
async fn write_outbox<Si>(conn_id: ConnId, mut outbox: Outbox, mut sink: Si)
where
    Si: Sink<Message> + Unpin,
{
    while let Some(message) = outbox.recv().await {
        let text = match message.to_json() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(conn_id, "encode error: {}", e);
                continue;
            },
        };
        if sink.send(Message::Text(text)).await.is_err() {
            tracing::debug!(conn_id, "write failed, peer gone");
            break;
        }
    }

    let _ = sink.close().await;
}
