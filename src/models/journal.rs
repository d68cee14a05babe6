//! Journal, journal profile and editor roster models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::JournalStatus;

/// Journal owned by a publisher account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Journal {
    pub id: i32,
    /// Publisher account owning the journal
    pub user_id: i32,
    pub name: String,
    pub ranking: Option<i32>,
}

/// Submission settings and public description of a journal
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct JournalProfile {
    pub user_id: i32,
    pub status: JournalStatus,
    pub email: Option<String>,
    pub description: Option<String>,
    pub submission_criteria: Option<String>,
    /// Only visible to the journal's publisher and editors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rubric: Option<String>,
}

impl JournalProfile {
    pub fn is_open(&self) -> bool {
        self.status == JournalStatus::Open
    }
}

/// Journal with its profile
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JournalDetails {
    #[serde(flatten)]
    pub journal: Journal,
    pub profile: Option<JournalProfile>,
}

impl JournalDetails {
    /// A journal without a profile never accepts submissions
    pub fn is_open(&self) -> bool {
        self.profile.as_ref().map(JournalProfile::is_open).unwrap_or(false)
    }

    /// Drop fields reserved to journal staff
    pub fn public(mut self) -> Self {
        if let Some(profile) = self.profile.as_mut() {
            profile.rubric = None;
        }
        self
    }
}

/// Editor assigned to a journal
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EditorAssignment {
    pub id: i32,
    pub journal_id: i32,
    pub editor_id: i32,
    pub editor_username: String,
    pub assigned_at: DateTime<Utc>,
}

/// Update own journal (publisher)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateJournal {
    #[validate(length(min = 1, max = 200, message = "Journal name must be 1 to 200 characters"))]
    pub name: Option<String>,
    pub status: Option<JournalStatus>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub description: Option<String>,
    pub submission_criteria: Option<String>,
    pub rubric: Option<String>,
}

/// Assign an editor by username
#[derive(Debug, Deserialize, ToSchema)]
pub struct EditorRequest {
    pub editor: String,
}

/// Journal list filters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct JournalQuery {
    /// Only journals currently accepting submissions
    pub open: Option<bool>,
}
