//! Routes for rooms, their transcripts, and joining.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use taleroom_core::ids::RoomId;
use taleroom_core::message::Message;
use taleroom_rooms::domain::room::{ParticipantView, RoomView};
use tracing::instrument;

use crate::error::ApiError;
use crate::routes::ws;
use crate::state::AppState;

/// Response body for POST /create.
#[derive(Debug, Serialize)]
pub struct CreateRoomResponse {
    /// Identifier of the new room.
    pub room_id: RoomId,
}

/// Request body for POST /{room_id}/join.
#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    /// Display name shown before each of the participant's lines.
    pub name: String,
}

/// POST /create
#[instrument(skip(state))]
async fn create_room(State(state): State<AppState>) -> Json<CreateRoomResponse> {
    let room_id = state.registry.create_room().await;
    Json(CreateRoomResponse { room_id })
}

/// GET /{room_id}
#[instrument(skip(state))]
async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomView>, ApiError> {
    let room = state.registry.find_room(&RoomId::from(room_id)).await?;
    Ok(Json(room))
}

/// GET /{room_id}/messages
#[instrument(skip(state))]
async fn list_messages(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = state.registry.messages(&RoomId::from(room_id)).await?;
    Ok(Json(messages))
}

/// POST /{room_id}/join
#[instrument(skip(state, request))]
async fn join_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<JoinRequest>,
) -> Result<Json<ParticipantView>, ApiError> {
    let participant = state
        .registry
        .join(&RoomId::from(room_id), &request.name)
        .await?;
    Ok(Json(participant))
}

/// Returns the rooms router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_room))
        .route("/{room_id}", get(get_room))
        .route("/{room_id}/messages", get(list_messages))
        .route("/{room_id}/join", post(join_room))
        .route("/{room_id}/players/{player_id}/ws", get(ws::connect))
}
