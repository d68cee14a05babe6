//! Room messaging and contact inquiries

use crate::{
    error::{AppError, AppResult},
    models::{
        contact::{Contact, CreateContact},
        message::Message,
    },
    repository::Repository,
};

/// Room names are used verbatim as keys
fn check_room(room_name: &str) -> AppResult<&str> {
    let room = room_name.trim();
    if room.is_empty() || room.len() > 255 {
        return Err(AppError::Validation("Room name must be 1 to 255 characters".to_string()));
    }
    Ok(room)
}

#[derive(Clone)]
pub struct MessagesService {
    repository: Repository,
}

impl MessagesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn post(&self, author_id: i32, room_name: &str, content: &str) -> AppResult<Message> {
        let room = check_room(room_name)?;
        self.repository.messages.create(author_id, room, content).await
    }

    pub async fn list_room(&self, room_name: &str) -> AppResult<Vec<Message>> {
        self.repository.messages.list_for_room(check_room(room_name)?).await
    }

    pub async fn last_message(&self, room_name: &str) -> AppResult<Message> {
        self.repository.messages.last_for_room(check_room(room_name)?).await
    }

    /// Store an inquiry sent through the public contact form
    pub async fn submit_contact(&self, data: &CreateContact) -> AppResult<Contact> {
        let contact = self.repository.contacts.create(data).await?;
        tracing::info!("Contact inquiry {} received", contact.id);
        Ok(contact)
    }
}
