//! Chat messages exchanged in named rooms

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Message record (append-only)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Message {
    pub id: i32,
    pub author_id: i32,
    pub author_username: String,
    pub content: String,
    pub room_name: String,
    pub timestamp: DateTime<Utc>,
}

/// Post a message to a room
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMessage {
    #[validate(length(min = 1, max = 10000, message = "Message must be 1 to 10000 characters"))]
    pub content: String,
}
