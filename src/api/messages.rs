//! Room messages and the public contact form

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        contact::{Contact, CreateContact},
        message::{CreateMessage, Message},
    },
    AppState,
};

use super::AuthenticatedUser;

/// Messages of a room, oldest first
#[utoipa::path(
    get,
    path = "/rooms/{room}/messages",
    tag = "messages",
    security(("bearer_auth" = [])),
    params(
        ("room" = String, Path, description = "Room name")
    ),
    responses(
        (status = 200, description = "Messages", body = Vec<Message>)
    )
)]
pub async fn list_messages(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(room): Path<String>,
) -> AppResult<Json<Vec<Message>>> {
    let messages = state.services.messages.list_room(&room).await?;
    Ok(Json(messages))
}

/// Post a message to a room
#[utoipa::path(
    post,
    path = "/rooms/{room}/messages",
    tag = "messages",
    security(("bearer_auth" = [])),
    params(
        ("room" = String, Path, description = "Room name")
    ),
    request_body = CreateMessage,
    responses(
        (status = 201, description = "Message posted", body = Message)
    )
)]
pub async fn post_message(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(room): Path<String>,
    Json(request): Json<CreateMessage>,
) -> AppResult<(StatusCode, Json<Message>)> {
    request.validate()?;
    let message = state
        .services
        .messages
        .post(claims.user_id, &room, &request.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Most recent message of a room
#[utoipa::path(
    get,
    path = "/rooms/{room}/messages/last",
    tag = "messages",
    security(("bearer_auth" = [])),
    params(
        ("room" = String, Path, description = "Room name")
    ),
    responses(
        (status = 200, description = "Last message", body = Message),
        (status = 404, description = "Room has no messages")
    )
)]
pub async fn last_message(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(room): Path<String>,
) -> AppResult<Json<Message>> {
    let message = state.services.messages.last_message(&room).await?;
    Ok(Json(message))
}

/// Send an inquiry through the contact form (no account needed)
#[utoipa::path(
    post,
    path = "/contact",
    tag = "messages",
    request_body = CreateContact,
    responses(
        (status = 201, description = "Inquiry received", body = Contact),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(request): Json<CreateContact>,
) -> AppResult<(StatusCode, Json<Contact>)> {
    request.validate()?;
    let contact = state.services.messages.submit_contact(&request).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}
