//! Paper submission models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::enums::{FieldOfLaw, PaperType, RankingTier};
use super::journal::Journal;

/// Paper submitted by a researcher
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Paper {
    pub id: i32,
    /// Public identifier, also used to namespace uploaded documents
    pub uuid: Uuid,
    pub researcher_id: i32,
    pub title: String,
    pub field_of_law: FieldOfLaw,
    pub authors: String,
    /// What is the significance of this article/essay?
    pub significance: String,
    pub abstract_key: Option<String>,
    pub manuscript_key: Option<String>,
    pub supplement_key: Option<String>,
    /// Set on insert, never updated
    pub submission_date: DateTime<Utc>,
    pub best_offer: Option<RankingTier>,
    pub paper_type: PaperType,
    pub submission_criteria_satisfied: bool,
}

/// Paper with the journals it was submitted to
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaperDetails {
    #[serde(flatten)]
    pub paper: Paper,
    pub journals: Vec<Journal>,
}

/// Short paper representation for evaluation queues
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaperSummary {
    pub uuid: Uuid,
    pub title: String,
    pub authors: String,
    pub field_of_law: FieldOfLaw,
    pub paper_type: PaperType,
    pub best_offer: Option<RankingTier>,
    pub submission_date: DateTime<Utc>,
}

/// Uploaded document slots of a paper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentSlot {
    Abstract,
    Manuscript,
    Supplement,
}

impl DocumentSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentSlot::Abstract => "abstract",
            DocumentSlot::Manuscript => "manuscript",
            DocumentSlot::Supplement => "supplement",
        }
    }

    /// Column holding the storage key of this slot
    pub fn key_column(&self) -> &'static str {
        match self {
            DocumentSlot::Abstract => "abstract_key",
            DocumentSlot::Manuscript => "manuscript_key",
            DocumentSlot::Supplement => "supplement_key",
        }
    }
}

/// Submit a paper
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePaper {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    pub field_of_law: FieldOfLaw,
    #[validate(length(min = 1, max = 200, message = "Authors must be 1 to 200 characters"))]
    pub authors: String,
    #[validate(length(min = 1, message = "Significance is required"))]
    pub significance: String,
    pub best_offer: Option<RankingTier>,
    /// Defaults to article
    pub paper_type: Option<PaperType>,
    pub submission_criteria_satisfied: bool,
    #[validate(length(min = 1, message = "At least one journal is required"))]
    pub journal_ids: Vec<i32>,
}

/// Update a submitted paper
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePaper {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: Option<String>,
    pub field_of_law: Option<FieldOfLaw>,
    #[validate(length(min = 1, max = 200, message = "Authors must be 1 to 200 characters"))]
    pub authors: Option<String>,
    #[validate(length(min = 1, message = "Significance cannot be empty"))]
    pub significance: Option<String>,
    pub best_offer: Option<RankingTier>,
    pub paper_type: Option<PaperType>,
}

/// Submit an existing paper to more journals
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddJournals {
    #[validate(length(min = 1, message = "At least one journal is required"))]
    pub journal_ids: Vec<i32>,
}
