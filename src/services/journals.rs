//! Journal registry and editor roster service

use serde_json::{json, Map};

use crate::{
    error::{AppError, AppResult},
    models::{
        journal::{EditorAssignment, Journal, JournalDetails, UpdateJournal},
        user::{User, UserClaims},
        UserType,
    },
    repository::Repository,
    services::analytics::AnalyticsService,
};

pub const EVENT_EDITOR_ADDED: &str = "Added an Editor";
pub const EVENT_EDITOR_REMOVED: &str = "Removed an Editor";

#[derive(Clone)]
pub struct JournalsService {
    repository: Repository,
    analytics: AnalyticsService,
}

impl JournalsService {
    pub fn new(repository: Repository, analytics: AnalyticsService) -> Self {
        Self { repository, analytics }
    }

    /// Public journal list; rubrics are never exposed here
    pub async fn list(&self, open_only: bool) -> AppResult<Vec<JournalDetails>> {
        let journals = self.repository.journals.list(open_only).await?;
        Ok(journals.into_iter().map(JournalDetails::public).collect())
    }

    /// Journal with its profile; the rubric is only shown to members
    pub async fn get(&self, id: i32, viewer: &UserClaims) -> AppResult<JournalDetails> {
        let details = self.repository.journals.get_details(id).await?;
        let is_member = self.is_member(viewer, &details.journal).await?;
        Ok(if is_member { details } else { details.public() })
    }

    /// The journal owned by the acting publisher
    pub async fn my_journal(&self, claims: &UserClaims) -> AppResult<Journal> {
        claims.require_publisher()?;
        self.repository
            .journals
            .get_by_publisher(claims.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Publisher has no journal".to_string()))
    }

    pub async fn update_my_journal(&self, claims: &UserClaims, data: &UpdateJournal) -> AppResult<JournalDetails> {
        claims.require_publisher()?;
        let details = self.repository.journals.update(claims.user_id, data).await?;
        tracing::info!(
            "Journal {} updated by publisher {}",
            details.journal.id,
            claims.user_id
        );
        Ok(details)
    }

    pub async fn list_editors(&self, claims: &UserClaims) -> AppResult<Vec<EditorAssignment>> {
        let journal = self.my_journal(claims).await?;
        self.repository.editors.list_for_journal(journal.id).await
    }

    /// Resolve a username to a user whose profile is Editor
    async fn find_editor(&self, username: &str) -> AppResult<User> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", username)))?;

        let profile = self.repository.users.get_profile(user.id).await?;
        if profile.user_type != UserType::Editor {
            return Err(AppError::InvalidRole(format!(
                "User '{}' is not an editor",
                user.username
            )));
        }
        Ok(user)
    }

    /// Assign an editor to the acting publisher's journal
    pub async fn assign_editor(&self, claims: &UserClaims, editor_username: &str) -> AppResult<EditorAssignment> {
        let journal = self.my_journal(claims).await?;
        let editor = self.find_editor(editor_username).await?;

        let assignment = self.repository.editors.create(journal.id, editor.id).await?;
        tracing::info!("Editor '{}' assigned to journal {}", editor.username, journal.id);

        self.analytics
            .track(claims.user_id, EVENT_EDITOR_ADDED, editor_properties(&editor.username));
        Ok(assignment)
    }

    /// Remove an editor from the acting publisher's journal
    pub async fn remove_editor(&self, claims: &UserClaims, editor_username: &str) -> AppResult<()> {
        let journal = self.my_journal(claims).await?;
        let editor = self.find_editor(editor_username).await?;

        let assignment = self
            .repository
            .editors
            .get_by_editor(editor.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Editor '{}' has no assignment", editor.username)))?;

        if assignment.journal_id != journal.id {
            return Err(AppError::Authorization(format!(
                "Editor '{}' is not assigned to your journal",
                editor.username
            )));
        }

        self.repository.editors.delete(assignment.id).await?;
        tracing::info!("Editor '{}' removed from journal {}", editor.username, journal.id);

        self.analytics
            .track(claims.user_id, EVENT_EDITOR_REMOVED, editor_properties(&editor.username));
        Ok(())
    }

    /// Journal the acting user works for: the publisher's own, or the one an
    /// editor is assigned to
    pub async fn journal_of_member(&self, claims: &UserClaims) -> AppResult<Journal> {
        match claims.user_type {
            UserType::Publisher => self.my_journal(claims).await,
            UserType::Editor => {
                let assignment = self
                    .repository
                    .editors
                    .get_by_editor(claims.user_id)
                    .await?
                    .ok_or_else(|| AppError::Authorization("Editor is not assigned to a journal".to_string()))?;
                self.repository.journals.get_by_id(assignment.journal_id).await
            }
            UserType::Researcher => Err(AppError::Authorization(
                "Publisher or editor account required".to_string(),
            )),
        }
    }

    /// Publisher account of the journal, or one of its assigned editors
    pub async fn is_member(&self, claims: &UserClaims, journal: &Journal) -> AppResult<bool> {
        match claims.user_type {
            UserType::Publisher => Ok(journal.user_id == claims.user_id),
            UserType::Editor => Ok(self
                .repository
                .editors
                .get_by_editor(claims.user_id)
                .await?
                .map(|a| a.journal_id == journal.id)
                .unwrap_or(false)),
            UserType::Researcher => Ok(false),
        }
    }

    /// Fail with Authorization unless the acting user is a member
    pub async fn require_member(&self, claims: &UserClaims, journal_id: i32) -> AppResult<Journal> {
        let journal = self.repository.journals.get_by_id(journal_id).await?;
        if !self.is_member(claims, &journal).await? {
            return Err(AppError::Authorization(format!(
                "Not a member of journal {}",
                journal_id
            )));
        }
        Ok(journal)
    }
}

fn editor_properties(username: &str) -> Map<String, serde_json::Value> {
    let mut props = Map::new();
    props.insert("Editor Name".to_string(), json!(username));
    props
}
