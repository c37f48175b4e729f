//! WebSocket endpoint binding a socket to a joined participant.

use std::sync::Arc;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use taleroom_core::connection::Connection;
use taleroom_core::ids::{ParticipantId, RoomId};
use taleroom_rooms::application::session::{ConnectionSession, Inbound};
use taleroom_rooms::domain::room::ParticipantView;
use taleroom_rooms::outbound::{ChannelConnection, OutboundFrame, OutboundQueue};
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /{room_id}/players/{player_id}/ws
///
/// The participant is looked up before the upgrade, so an unknown room or
/// participant is answered with a 404 instead of a socket.
#[instrument(skip(state, upgrade))]
pub async fn connect(
    State(state): State<AppState>,
    Path((room_id, player_id)): Path<(String, String)>,
    upgrade: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let room_id = RoomId::from(room_id);
    let participant = state
        .registry
        .find_participant(&room_id, &ParticipantId::from(player_id))
        .await?;
    info!(participant_id = %participant.id, "upgrading connection");
    Ok(upgrade.on_upgrade(move |socket| serve_socket(state, room_id, participant, socket)))
}

/// Attaches the socket, then pumps frames until either side stops.
async fn serve_socket(
    state: AppState,
    room_id: RoomId,
    participant: ParticipantView,
    socket: WebSocket,
) {
    let (sink, stream) = socket.split();
    let (connection, outbound) = ChannelConnection::new();
    let connection = Arc::new(connection);
    let connection_id = connection.id();

    if let Err(error) = state
        .registry
        .attach_connection(&room_id, &participant.id, connection.clone())
        .await
    {
        warn!(%error, %room_id, participant_id = %participant.id, "participant left before the upgrade completed");
        return;
    }

    let (writer_done, writer_stopped) = oneshot::channel::<()>();
    let writer = tokio::spawn(write_frames(sink, outbound, writer_done));

    // Ends when the writer stops, so a dead or superseded socket does not
    // keep its reader alive.
    let inbound = Box::pin(
        stream
            .filter_map(|frame| async move {
                match frame {
                    Ok(WsMessage::Text(text)) => Some(Ok(Inbound::Text(text.as_str().to_owned()))),
                    Ok(WsMessage::Close(_)) => Some(Ok(Inbound::Close)),
                    Ok(_) => None,
                    Err(error) => Some(Err(error)),
                }
            })
            .take_until(writer_stopped),
    );

    ConnectionSession::new(
        state.registry.clone(),
        state.narrator.clone(),
        room_id,
        participant,
        connection_id,
    )
    .with_narrator_timeout(state.narrator_timeout)
    .run(inbound)
    .await;

    connection.close();
    if let Err(error) = writer.await {
        warn!(%error, %connection_id, "socket writer task failed");
    }
}

/// Drains queued frames onto the socket as JSON text.
async fn write_frames(
    mut sink: SplitSink<WebSocket, WsMessage>,
    mut outbound: OutboundQueue,
    _done: oneshot::Sender<()>,
) {
    while let Some(frame) = outbound.recv().await {
        match frame {
            OutboundFrame::Message(message) => {
                let payload = match serde_json::to_string(&message) {
                    Ok(payload) => payload,
                    Err(error) => {
                        warn!(%error, "could not encode message");
                        continue;
                    }
                };
                if let Err(error) = sink.send(WsMessage::Text(payload.into())).await {
                    debug!(%error, "socket write failed, stopping writer");
                    break;
                }
            }
            OutboundFrame::Close => {
                if let Err(error) = sink.send(WsMessage::Close(None)).await {
                    debug!(%error, "close frame not sent");
                }
                break;
            }
        }
    }
}
