//! Journals repository

use sqlx::{postgres::PgRow, PgConnection, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::journal::{Journal, JournalDetails, JournalProfile, UpdateJournal},
    models::JournalStatus,
};

const SELECT_DETAILS: &str = r#"
    SELECT j.id, j.user_id, j.name, j.ranking,
           jp.user_id as profile_user_id, jp.status, jp.email,
           jp.description, jp.submission_criteria, jp.rubric
    FROM journals j
    LEFT JOIN journal_profiles jp ON jp.user_id = j.user_id
"#;

fn details_from_row(row: &PgRow) -> JournalDetails {
    let journal = Journal {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        ranking: row.get("ranking"),
    };

    let profile = row
        .get::<Option<i32>, _>("profile_user_id")
        .map(|user_id| JournalProfile {
            user_id,
            status: row
                .get::<Option<JournalStatus>, _>("status")
                .unwrap_or(JournalStatus::Closed),
            email: row.get("email"),
            description: row.get("description"),
            submission_criteria: row.get("submission_criteria"),
            rubric: row.get("rubric"),
        });

    JournalDetails { journal, profile }
}

#[derive(Clone)]
pub struct JournalsRepository {
    pool: Pool<Postgres>,
}

impl JournalsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List journals, optionally only those open for submissions
    pub async fn list(&self, open_only: bool) -> AppResult<Vec<JournalDetails>> {
        let query = if open_only {
            format!("{} WHERE jp.status = 'O' ORDER BY j.ranking NULLS LAST, j.name", SELECT_DETAILS)
        } else {
            format!("{} ORDER BY j.ranking NULLS LAST, j.name", SELECT_DETAILS)
        };

        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(details_from_row).collect())
    }

    /// Get journal with its profile
    pub async fn get_details(&self, id: i32) -> AppResult<JournalDetails> {
        let query = format!("{} WHERE j.id = $1", SELECT_DETAILS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Journal {} not found", id)))?;
        Ok(details_from_row(&row))
    }

    /// Get several journals at once; missing ids are simply absent
    pub async fn get_many_details(&self, ids: &[i32]) -> AppResult<Vec<JournalDetails>> {
        let query = format!("{} WHERE j.id = ANY($1) ORDER BY j.id", SELECT_DETAILS);
        let rows = sqlx::query(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(details_from_row).collect())
    }

    /// Get journal by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Journal> {
        sqlx::query_as::<_, Journal>("SELECT * FROM journals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Journal {} not found", id)))
    }

    /// Get the journal owned by a publisher account
    pub async fn get_by_publisher(&self, user_id: i32) -> AppResult<Option<Journal>> {
        let journal = sqlx::query_as::<_, Journal>("SELECT * FROM journals WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(journal)
    }

    /// Journals a paper was submitted to
    pub async fn list_for_paper(&self, paper_id: i32) -> AppResult<Vec<Journal>> {
        let journals = sqlx::query_as::<_, Journal>(
            r#"
            SELECT j.* FROM journals j
            JOIN paper_journals pj ON pj.journal_id = j.id
            WHERE pj.paper_id = $1
            ORDER BY j.name
            "#,
        )
        .bind(paper_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(journals)
    }

    /// Provision the journal of a new publisher account (closed to submissions)
    pub async fn create(
        &self,
        conn: &mut PgConnection,
        publisher_id: i32,
        name: &str,
    ) -> AppResult<JournalDetails> {
        let journal = sqlx::query_as::<_, Journal>(
            "INSERT INTO journals (user_id, name) VALUES ($1, $2) RETURNING *",
        )
        .bind(publisher_id)
        .bind(name)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Publisher already owns a journal"))?;

        let profile = sqlx::query_as::<_, JournalProfile>(
            "INSERT INTO journal_profiles (user_id, status) VALUES ($1, $2) RETURNING *",
        )
        .bind(publisher_id)
        .bind(JournalStatus::Closed)
        .fetch_one(&mut *conn)
        .await?;

        Ok(JournalDetails {
            journal,
            profile: Some(profile),
        })
    }

    /// Update the publisher's journal and profile; absent fields keep their value
    pub async fn update(&self, publisher_id: i32, data: &UpdateJournal) -> AppResult<JournalDetails> {
        let mut tx = self.pool.begin().await?;

        let journal_id: i32 = sqlx::query_scalar(
            "UPDATE journals SET name = COALESCE($2, name) WHERE user_id = $1 RETURNING id",
        )
        .bind(publisher_id)
        .bind(&data.name)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Publisher has no journal".to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO journal_profiles (user_id, status, email, description, submission_criteria, rubric)
            VALUES ($1, COALESCE($2, 'C'), $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE SET
                status = COALESCE($2, journal_profiles.status),
                email = COALESCE($3, journal_profiles.email),
                description = COALESCE($4, journal_profiles.description),
                submission_criteria = COALESCE($5, journal_profiles.submission_criteria),
                rubric = COALESCE($6, journal_profiles.rubric)
            "#,
        )
        .bind(publisher_id)
        .bind(data.status)
        .bind(&data.email)
        .bind(&data.description)
        .bind(&data.submission_criteria)
        .bind(&data.rubric)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_details(journal_id).await
    }
}
