//! Inbound contact inquiries

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Contact record (write-once)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Contact {
    pub id: i32,
    pub email: String,
    pub journal: String,
    pub subject: String,
    pub message: String,
}

/// Contact form submission
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateContact {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub journal: String,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub subject: String,
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}
