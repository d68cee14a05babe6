//! Evaluations repository

use sqlx::{postgres::PgRow, FromRow, PgConnection, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        evaluation::{Evaluation, JournalSubmission},
        paper::PaperSummary,
        EvaluationStatus,
    },
};

fn submission_from_row(row: &PgRow) -> Result<JournalSubmission, sqlx::Error> {
    Ok(JournalSubmission {
        evaluation: Evaluation::from_row(row)?,
        paper: PaperSummary {
            uuid: row.try_get("paper_uuid")?,
            title: row.try_get("paper_title")?,
            authors: row.try_get("paper_authors")?,
            field_of_law: row.try_get("field_of_law")?,
            paper_type: row.try_get("paper_type")?,
            best_offer: row.try_get("best_offer")?,
            submission_date: row.try_get("submission_date")?,
        },
    })
}

#[derive(Clone)]
pub struct EvaluationsRepository {
    pool: Pool<Postgres>,
}

impl EvaluationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Create the evaluation of a newly associated (paper, journal) pair.
    ///
    /// The journal's current rubric is copied onto the evaluation. Returns
    /// false when the pair already had one.
    pub async fn create_for_association(
        &self,
        conn: &mut PgConnection,
        paper_id: i32,
        journal_id: i32,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO evaluations (paper_id, journal_id, comments, status, decision_date, rubric)
            SELECT $1, j.id, '', $3, NOW(), jp.rubric
            FROM journals j
            LEFT JOIN journal_profiles jp ON jp.user_id = j.user_id
            WHERE j.id = $2
            ON CONFLICT (paper_id, journal_id) DO NOTHING
            "#,
        )
        .bind(paper_id)
        .bind(journal_id)
        .bind(EvaluationStatus::NotStarted)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Get evaluation by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Evaluation> {
        sqlx::query_as::<_, Evaluation>("SELECT * FROM evaluations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Evaluation {} not found", id)))
    }

    /// All evaluations of a paper
    pub async fn list_for_paper(&self, paper_id: i32) -> AppResult<Vec<Evaluation>> {
        let evaluations = sqlx::query_as::<_, Evaluation>(
            "SELECT * FROM evaluations WHERE paper_id = $1 ORDER BY decision_date",
        )
        .bind(paper_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(evaluations)
    }

    /// Evaluation queue of a journal, oldest submissions first
    pub async fn list_for_journal(
        &self,
        journal_id: i32,
        status: Option<EvaluationStatus>,
    ) -> AppResult<Vec<JournalSubmission>> {
        let rows = sqlx::query(
            r#"
            SELECT e.*,
                   p.uuid as paper_uuid, p.title as paper_title, p.authors as paper_authors,
                   p.field_of_law, p.paper_type, p.best_offer, p.submission_date
            FROM evaluations e
            JOIN papers p ON p.id = e.paper_id
            WHERE e.journal_id = $1 AND ($2::text IS NULL OR e.status = $2)
            ORDER BY p.submission_date, e.id
            "#,
        )
        .bind(journal_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        let submissions = rows
            .iter()
            .map(submission_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(submissions)
    }

    /// Persist a state transition computed from `before`.
    ///
    /// The update only applies if the stored row still matches `before`'s
    /// workflow fields, so two concurrent transitions cannot both win.
    pub async fn save_transition(&self, before: &Evaluation, after: &Evaluation) -> AppResult<Evaluation> {
        sqlx::query_as::<_, Evaluation>(
            r#"
            UPDATE evaluations SET
                comments = $2,
                rating = $3,
                offered = $4,
                offer_accepted = $5,
                status = $6,
                start_decision = $7,
                review_start_time = $8,
                rubric = $9
            WHERE id = $1
              AND status = $10
              AND start_decision IS NOT DISTINCT FROM $11
              AND offer_accepted IS NOT DISTINCT FROM $12
            RETURNING *
            "#,
        )
        .bind(before.id)
        .bind(&after.comments)
        .bind(after.rating)
        .bind(after.offered)
        .bind(after.offer_accepted)
        .bind(after.status)
        .bind(after.start_decision)
        .bind(after.review_start_time)
        .bind(&after.rubric)
        .bind(before.status)
        .bind(before.start_decision)
        .bind(before.offer_accepted)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::Conflict(format!(
                "Evaluation {} was modified concurrently, please reload",
                before.id
            ))
        })
    }
}
