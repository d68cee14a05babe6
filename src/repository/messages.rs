//! Messages repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::message::Message,
};

const SELECT_MESSAGE: &str = r#"
    SELECT m.id, m.author_id, u.username as author_username, m.content, m.room_name, m.timestamp
    FROM messages m
    JOIN users u ON u.id = m.author_id
"#;

#[derive(Clone)]
pub struct MessagesRepository {
    pool: Pool<Postgres>,
}

impl MessagesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append a message to a room
    pub async fn create(&self, author_id: i32, room_name: &str, content: &str) -> AppResult<Message> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO messages (author_id, content, room_name, timestamp)
            VALUES ($1, $2, $3, NOW())
            RETURNING id
            "#,
        )
        .bind(author_id)
        .bind(content)
        .bind(room_name)
        .fetch_one(&self.pool)
        .await?;

        let query = format!("{} WHERE m.id = $1", SELECT_MESSAGE);
        let message = sqlx::query_as::<_, Message>(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(message)
    }

    /// Messages of a room, oldest first
    pub async fn list_for_room(&self, room_name: &str) -> AppResult<Vec<Message>> {
        let query = format!("{} WHERE m.room_name = $1 ORDER BY m.timestamp, m.id", SELECT_MESSAGE);
        let messages = sqlx::query_as::<_, Message>(&query)
            .bind(room_name)
            .fetch_all(&self.pool)
            .await?;
        Ok(messages)
    }

    /// Most recent message of a room
    pub async fn last_for_room(&self, room_name: &str) -> AppResult<Message> {
        let query = format!(
            "{} WHERE m.room_name = $1 ORDER BY m.timestamp DESC, m.id DESC LIMIT 1",
            SELECT_MESSAGE
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(room_name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No messages in room {}", room_name)))
    }
}
