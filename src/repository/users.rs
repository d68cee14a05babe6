//! Users repository for database operations

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        user::{CreateUser, PersonalProfile, ProfileDocument, UpdatePersonalProfile, User, UserProfile},
        UserType,
    },
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by username (case-insensitive)
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(username) = LOWER($1)")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Check if a username is taken
    pub async fn username_exists(&self, username: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(username) = LOWER($1))")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Insert the user row. Must be followed by [`Self::create_default_profile`]
    /// on the same connection.
    pub async fn create_user(
        &self,
        conn: &mut PgConnection,
        data: &CreateUser,
        password_hash: &str,
    ) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING *
            "#,
        )
        .bind(&data.username)
        .bind(&data.email)
        .bind(password_hash)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Username already exists"))
    }

    /// Insert the account profile of a freshly created user
    pub async fn create_default_profile(
        &self,
        conn: &mut PgConnection,
        user_id: i32,
        user_type: UserType,
    ) -> AppResult<UserProfile> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO user_profiles (user_id, user_type, billing_confirmed, is_email_verified)
            VALUES ($1, $2, FALSE, FALSE)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(user_type)
        .fetch_one(&mut *conn)
        .await?;

        Ok(profile)
    }

    /// Get the account profile of a user
    pub async fn get_profile(&self, user_id: i32) -> AppResult<UserProfile> {
        sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile for user {} not found", user_id)))
    }

    /// Replace the password hash
    pub async fn update_password(&self, user_id: i32, password_hash: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET password = $2 WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", user_id)));
        }
        Ok(())
    }

    /// Store the payment-provider customer id unless one is already set.
    ///
    /// Returns the id now on record, which is the existing one when another
    /// request won the race.
    pub async fn set_billing_id_if_absent(&self, user_id: i32, billing_id: &str) -> AppResult<String> {
        let updated: Option<String> = sqlx::query_scalar(
            r#"
            UPDATE user_profiles SET billing_id = $2
            WHERE user_id = $1 AND billing_id IS NULL
            RETURNING billing_id
            "#,
        )
        .bind(user_id)
        .bind(billing_id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(id) => Ok(id),
            None => self
                .get_profile(user_id)
                .await?
                .billing_id
                .ok_or_else(|| AppError::Internal("Billing id could not be stored".to_string())),
        }
    }

    /// Mark the saved payment method as confirmed
    pub async fn set_billing_confirmed(&self, user_id: i32) -> AppResult<UserProfile> {
        sqlx::query_as::<_, UserProfile>(
            "UPDATE user_profiles SET billing_confirmed = TRUE WHERE user_id = $1 RETURNING *",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile for user {} not found", user_id)))
    }

    /// Get personal profile, if the user filled one in
    pub async fn get_personal_profile(&self, user_id: i32) -> AppResult<Option<PersonalProfile>> {
        let profile =
            sqlx::query_as::<_, PersonalProfile>("SELECT * FROM personal_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(profile)
    }

    /// Create or update the personal profile; absent fields keep their value
    pub async fn upsert_personal_profile(
        &self,
        user_id: i32,
        data: &UpdatePersonalProfile,
    ) -> AppResult<PersonalProfile> {
        let profile = sqlx::query_as::<_, PersonalProfile>(
            r#"
            INSERT INTO personal_profiles (user_id, first_name, last_name, institution, email, current_position)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE SET
                first_name = COALESCE(EXCLUDED.first_name, personal_profiles.first_name),
                last_name = COALESCE(EXCLUDED.last_name, personal_profiles.last_name),
                institution = COALESCE(EXCLUDED.institution, personal_profiles.institution),
                email = COALESCE(EXCLUDED.email, personal_profiles.email),
                current_position = COALESCE(EXCLUDED.current_position, personal_profiles.current_position)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.institution)
        .bind(&data.email)
        .bind(data.current_position)
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Record the storage key of a CV or bio upload
    pub async fn set_profile_document_key(
        &self,
        user_id: i32,
        document: ProfileDocument,
        key: &str,
    ) -> AppResult<PersonalProfile> {
        let column = match document {
            ProfileDocument::Cv => "cv_key",
            ProfileDocument::Bio => "bio_key",
        };
        let query = format!(
            r#"
            INSERT INTO personal_profiles (user_id, {column})
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET {column} = EXCLUDED.{column}
            RETURNING *
            "#,
            column = column
        );

        let profile = sqlx::query_as::<_, PersonalProfile>(&query)
            .bind(user_id)
            .bind(key)
            .fetch_one(&self.pool)
            .await?;
        Ok(profile)
    }
}
