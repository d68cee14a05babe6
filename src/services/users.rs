//! Registration, authentication and profile service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    config::{AuthConfig, StorageConfig},
    error::{AppError, AppResult},
    models::{
        journal::{EditorAssignment, JournalDetails},
        user::{
            ChangePassword, CreateUser, PersonalProfile, ProfileDocument, UpdatePersonalProfile, User,
            UserClaims, UserProfile,
        },
        UserType,
    },
    repository::Repository,
    services::storage::{self, ObjectStore},
};

/// A freshly registered account
#[derive(Debug, Serialize, ToSchema)]
pub struct Registration {
    pub user: User,
    pub profile: UserProfile,
    /// Provisioned for publisher accounts
    pub journal: Option<JournalDetails>,
}

/// Everything shown on the account settings page
#[derive(Debug, Serialize, ToSchema)]
pub struct AccountSettings {
    pub user: User,
    pub profile: UserProfile,
    pub personal_profile: Option<PersonalProfile>,
    /// Publisher's own journal
    pub journal: Option<JournalDetails>,
    /// Editor roster of the publisher's journal
    pub editors: Vec<EditorAssignment>,
    /// Assignment held by an editor account
    pub assignment: Option<EditorAssignment>,
}

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
    storage_prefix: String,
    store: Arc<dyn ObjectStore>,
}

impl UsersService {
    pub fn new(
        repository: Repository,
        config: AuthConfig,
        storage: &StorageConfig,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            repository,
            config,
            storage_prefix: storage.prefix.clone(),
            store,
        }
    }

    /// Create a user, its account profile and, for publishers, its journal.
    /// All rows are written in one transaction.
    pub async fn register(&self, data: CreateUser) -> AppResult<Registration> {
        let journal_name = match data.user_type {
            UserType::Publisher => Some(
                data.journal_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| {
                        AppError::Validation("A journal name is required for publisher accounts".to_string())
                    })?
                    .to_string(),
            ),
            _ => None,
        };

        if self.repository.users.username_exists(&data.username).await? {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }

        let password_hash = self.hash_password(&data.password)?;

        let mut tx = self.repository.pool.begin().await?;
        let user = self.repository.users.create_user(&mut tx, &data, &password_hash).await?;
        let profile = self
            .repository
            .users
            .create_default_profile(&mut tx, user.id, data.user_type)
            .await?;
        let journal = match journal_name {
            Some(name) => Some(self.repository.journals.create(&mut tx, user.id, &name).await?),
            None => None,
        };
        tx.commit().await?;

        tracing::info!("Registered {:?} account '{}'", profile.user_type, user.username);
        Ok(Registration { user, profile, journal })
    }

    /// Authenticate by username and return a JWT
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        let profile = self.repository.users.get_profile(user.id).await?;
        let token = self.create_token(&user, profile.user_type)?;
        Ok((token, user))
    }

    fn create_token(&self, user: &User, user_type: UserType) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            user_type,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        match user.password {
            Some(ref hash) => {
                let parsed_hash = PasswordHash::new(hash)
                    .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
                Ok(Argon2::default()
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok())
            }
            None => Ok(false),
        }
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Current user with its account profile
    pub async fn me(&self, user_id: i32) -> AppResult<(User, UserProfile)> {
        let user = self.repository.users.get_by_id(user_id).await?;
        let profile = self.repository.users.get_profile(user_id).await?;
        Ok((user, profile))
    }

    pub async fn change_password(&self, user_id: i32, data: &ChangePassword) -> AppResult<()> {
        let user = self.repository.users.get_by_id(user_id).await?;
        if !self.verify_password(&user, &data.current_password)? {
            return Err(AppError::Authentication("Current password is incorrect".to_string()));
        }

        let hash = self.hash_password(&data.new_password)?;
        self.repository.users.update_password(user_id, &hash).await
    }

    pub async fn get_personal_profile(&self, user_id: i32) -> AppResult<PersonalProfile> {
        self.repository
            .users
            .get_personal_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} has no personal profile", user_id)))
    }

    pub async fn update_personal_profile(
        &self,
        user_id: i32,
        data: &UpdatePersonalProfile,
    ) -> AppResult<PersonalProfile> {
        self.repository.users.upsert_personal_profile(user_id, data).await
    }

    /// Store a CV or bio and record its key on the personal profile
    pub async fn upload_profile_document(
        &self,
        claims: &UserClaims,
        document: ProfileDocument,
        filename: &str,
        bytes: &[u8],
    ) -> AppResult<PersonalProfile> {
        if bytes.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }

        let key = storage::profile_document_key(
            &self.storage_prefix,
            claims.user_id,
            &claims.sub,
            document,
            filename,
        )?;
        let key = self.store.put(&key, bytes).await?;

        // The blob is already written; leave a trail if the row update fails
        self.repository
            .users
            .set_profile_document_key(claims.user_id, document, &key)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Stored {} but could not record it for user {}: {}",
                    key,
                    claims.user_id,
                    e
                );
                e
            })
    }

    /// Profile, personal details and journal roster of the current user
    pub async fn account_settings(&self, user_id: i32) -> AppResult<AccountSettings> {
        let (user, profile) = self.me(user_id).await?;
        let personal_profile = self.repository.users.get_personal_profile(user_id).await?;

        let mut settings = AccountSettings {
            user,
            profile,
            personal_profile,
            journal: None,
            editors: Vec::new(),
            assignment: None,
        };

        match settings.profile.user_type {
            UserType::Publisher => {
                if let Some(journal) = self.repository.journals.get_by_publisher(user_id).await? {
                    settings.editors = self.repository.editors.list_for_journal(journal.id).await?;
                    settings.journal = Some(self.repository.journals.get_details(journal.id).await?);
                }
            }
            UserType::Editor => {
                settings.assignment = self.repository.editors.get_by_editor(user_id).await?;
            }
            UserType::Researcher => {}
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, services::storage::MockObjectStore};
    use sqlx::postgres::PgPoolOptions;
    use std::time::Duration;

    fn service(store: MockObjectStore) -> UsersService {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(100))
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .unwrap();
        let config = AppConfig::default();
        UsersService::new(Repository::new(pool), config.auth, &config.storage, Arc::new(store))
    }

    fn rhoda() -> UserClaims {
        let now = Utc::now().timestamp();
        UserClaims {
            sub: "rhoda".to_string(),
            user_id: 3,
            user_type: UserType::Researcher,
            exp: now + 3600,
            iat: now,
        }
    }

    #[tokio::test]
    async fn test_empty_upload_is_not_stored() {
        let mut store = MockObjectStore::new();
        store.expect_put().times(0);

        let err = service(store)
            .upload_profile_document(&rhoda(), ProfileDocument::Cv, "cv.pdf", b"")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_failed_key_record_surfaces_after_store() {
        let mut store = MockObjectStore::new();
        store
            .expect_put()
            .withf(|key, bytes| key.ends_with("3_rhoda/cv/cv.pdf") && bytes == b"%PDF".as_slice())
            .times(1)
            .returning(|key, _| Ok(key.to_string()));

        let err = service(store)
            .upload_profile_document(&rhoda(), ProfileDocument::Cv, "cv.pdf", b"%PDF")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
