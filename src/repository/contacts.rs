//! Contact inquiries repository

use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::contact::{Contact, CreateContact},
};

#[derive(Clone)]
pub struct ContactsRepository {
    pool: Pool<Postgres>,
}

impl ContactsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Store an inquiry
    pub async fn create(&self, data: &CreateContact) -> AppResult<Contact> {
        let contact = sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts (email, journal, subject, message)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&data.email)
        .bind(&data.journal)
        .bind(&data.subject)
        .bind(&data.message)
        .fetch_one(&self.pool)
        .await?;
        Ok(contact)
    }
}
