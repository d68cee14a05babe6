//! Papers repository

use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::paper::{CreatePaper, DocumentSlot, Paper, UpdatePaper},
    models::PaperType,
};

#[derive(Clone)]
pub struct PapersRepository {
    pool: Pool<Postgres>,
}

impl PapersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get paper by its public identifier
    pub async fn get_by_uuid(&self, uuid: Uuid) -> AppResult<Paper> {
        sqlx::query_as::<_, Paper>("SELECT * FROM papers WHERE uuid = $1")
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Paper {} not found", uuid)))
    }

    /// Get paper by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Paper> {
        sqlx::query_as::<_, Paper>("SELECT * FROM papers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Paper with id {} not found", id)))
    }

    /// Papers submitted by a researcher, newest first
    pub async fn list_for_researcher(&self, researcher_id: i32) -> AppResult<Vec<Paper>> {
        let papers = sqlx::query_as::<_, Paper>(
            "SELECT * FROM papers WHERE researcher_id = $1 ORDER BY submission_date DESC",
        )
        .bind(researcher_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(papers)
    }

    /// Insert a paper; the submission date is set by the database
    pub async fn create(
        &self,
        conn: &mut PgConnection,
        researcher_id: i32,
        uuid: Uuid,
        data: &CreatePaper,
    ) -> AppResult<Paper> {
        let paper = sqlx::query_as::<_, Paper>(
            r#"
            INSERT INTO papers (
                uuid, researcher_id, title, field_of_law, authors, significance,
                submission_date, best_offer, paper_type, submission_criteria_satisfied
            ) VALUES ($1, $2, $3, $4, $5, $6, NOW(), $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(uuid)
        .bind(researcher_id)
        .bind(&data.title)
        .bind(data.field_of_law)
        .bind(&data.authors)
        .bind(&data.significance)
        .bind(data.best_offer)
        .bind(data.paper_type.unwrap_or(PaperType::Article))
        .bind(data.submission_criteria_satisfied)
        .fetch_one(&mut *conn)
        .await?;

        Ok(paper)
    }

    /// Link a paper to a journal. Returns false if it already was.
    pub async fn associate_journal(
        &self,
        conn: &mut PgConnection,
        paper_id: i32,
        journal_id: i32,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO paper_journals (paper_id, journal_id)
            VALUES ($1, $2)
            ON CONFLICT (paper_id, journal_id) DO NOTHING
            "#,
        )
        .bind(paper_id)
        .bind(journal_id)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Update descriptive fields; the submission date is never touched
    pub async fn update(&self, id: i32, data: &UpdatePaper) -> AppResult<Paper> {
        sqlx::query_as::<_, Paper>(
            r#"
            UPDATE papers SET
                title = COALESCE($2, title),
                field_of_law = COALESCE($3, field_of_law),
                authors = COALESCE($4, authors),
                significance = COALESCE($5, significance),
                best_offer = COALESCE($6, best_offer),
                paper_type = COALESCE($7, paper_type)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.title)
        .bind(data.field_of_law)
        .bind(&data.authors)
        .bind(&data.significance)
        .bind(data.best_offer)
        .bind(data.paper_type)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Paper with id {} not found", id)))
    }

    /// Record the storage key of an uploaded document
    pub async fn set_document_key(&self, id: i32, slot: DocumentSlot, key: &str) -> AppResult<Paper> {
        let query = format!(
            "UPDATE papers SET {} = $2 WHERE id = $1 RETURNING *",
            slot.key_column()
        );
        sqlx::query_as::<_, Paper>(&query)
            .bind(id)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Paper with id {} not found", id)))
    }

    /// Delete a paper; its evaluations and journal links go with it
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM papers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Paper with id {} not found", id)));
        }
        Ok(())
    }
}
