//! Editor roster repository
//!
//! `journal_editors.editor_id` is UNIQUE: an editor holds at most one
//! assignment, whatever the journal.

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::journal::EditorAssignment,
};

const SELECT_ASSIGNMENT: &str = r#"
    SELECT je.id, je.journal_id, je.editor_id, u.username as editor_username, je.assigned_at
    FROM journal_editors je
    JOIN users u ON u.id = je.editor_id
"#;

#[derive(Clone)]
pub struct EditorsRepository {
    pool: Pool<Postgres>,
}

impl EditorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Editors of a journal
    pub async fn list_for_journal(&self, journal_id: i32) -> AppResult<Vec<EditorAssignment>> {
        let query = format!("{} WHERE je.journal_id = $1 ORDER BY u.username", SELECT_ASSIGNMENT);
        let editors = sqlx::query_as::<_, EditorAssignment>(&query)
            .bind(journal_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(editors)
    }

    /// The assignment held by an editor, if any
    pub async fn get_by_editor(&self, editor_id: i32) -> AppResult<Option<EditorAssignment>> {
        let query = format!("{} WHERE je.editor_id = $1", SELECT_ASSIGNMENT);
        let assignment = sqlx::query_as::<_, EditorAssignment>(&query)
            .bind(editor_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(assignment)
    }

    /// Assign an editor to a journal
    pub async fn create(&self, journal_id: i32, editor_id: i32) -> AppResult<EditorAssignment> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO journal_editors (journal_id, editor_id, assigned_at)
            VALUES ($1, $2, NOW())
            RETURNING id
            "#,
        )
        .bind(journal_id)
        .bind(editor_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::duplicate_assignment_on_unique(e, "This editor is already assigned to a journal")
        })?;

        let query = format!("{} WHERE je.id = $1", SELECT_ASSIGNMENT);
        let assignment = sqlx::query_as::<_, EditorAssignment>(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(assignment)
    }

    /// Delete an assignment
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM journal_editors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Editor assignment {} not found", id)));
        }
        Ok(())
    }
}
