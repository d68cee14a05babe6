//! Evaluation of a paper by a journal, and its lifecycle
//!
//! ```text
//! NotStarted ──accept for review──▶ UnderReview ──escalate──▶ UnderFullBoardReview
//!     │                                  │                           │
//!     └─decline (terminal)               └────────decision───────────┴──▶ Complete
//! ```
//!
//! `offered` and `rating` are only ever set together with the move to
//! `Complete`. The researcher's answer to an accepted offer does not change the
//! status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::enums::{EvaluationStatus, Offer, OfferAccepted, StartDecision};
use super::paper::PaperSummary;
use crate::error::{AppError, AppResult};

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 10;

/// One evaluation per (paper, journal) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Evaluation {
    pub id: i32,
    pub paper_id: i32,
    pub journal_id: i32,
    pub comments: String,
    /// Quality of submission, 1 (extremely weak) to 10 (outstanding)
    pub rating: Option<i16>,
    pub offered: Option<Offer>,
    pub decision_date: DateTime<Utc>,
    pub offer_accepted: Option<OfferAccepted>,
    pub status: EvaluationStatus,
    pub start_decision: Option<StartDecision>,
    pub review_start_time: Option<DateTime<Utc>>,
    pub rubric: Option<String>,
}

impl Evaluation {
    /// Record whether the journal takes the paper up for review.
    ///
    /// Accepting moves the evaluation under review (by the full board when
    /// `full_board` is set) and stamps the review start. Declining is final.
    pub fn record_start_decision(
        &mut self,
        decision: StartDecision,
        full_board: bool,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if self.status != EvaluationStatus::NotStarted || self.start_decision.is_some() {
            return Err(AppError::BusinessRule(
                "A start decision was already recorded for this evaluation".to_string(),
            ));
        }

        self.start_decision = Some(decision);
        if decision == StartDecision::AcceptForReview {
            self.status = if full_board {
                EvaluationStatus::UnderFullBoardReview
            } else {
                EvaluationStatus::UnderReview
            };
            self.review_start_time = Some(now);
        }
        Ok(())
    }

    /// Hand a paper under review over to the full board
    pub fn escalate_to_full_board(&mut self) -> AppResult<()> {
        if self.status != EvaluationStatus::UnderReview {
            return Err(AppError::BusinessRule(format!(
                "Cannot escalate an evaluation in status {:?}",
                self.status
            )));
        }
        self.status = EvaluationStatus::UnderFullBoardReview;
        Ok(())
    }

    /// Attach reviewer comments and rubric notes before the decision
    pub fn annotate(&mut self, comments: Option<String>, rubric: Option<String>) -> AppResult<()> {
        if self.status == EvaluationStatus::Complete {
            return Err(AppError::BusinessRule(
                "Evaluation is already complete".to_string(),
            ));
        }
        if self.start_decision == Some(StartDecision::DeclineToReview) {
            return Err(AppError::BusinessRule(
                "The journal declined to review this paper".to_string(),
            ));
        }
        if let Some(comments) = comments {
            self.comments = comments;
        }
        if let Some(rubric) = rubric {
            self.rubric = Some(rubric);
        }
        Ok(())
    }

    /// Record the journal's decision and close the evaluation
    pub fn record_decision(
        &mut self,
        offered: Offer,
        rating: i16,
        comments: Option<String>,
        rubric: Option<String>,
    ) -> AppResult<()> {
        if !self.status.is_under_review() {
            return Err(AppError::BusinessRule(format!(
                "Cannot record a decision for an evaluation in status {:?}",
                self.status
            )));
        }
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(AppError::Validation(format!(
                "Rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }

        self.annotate(comments, rubric)?;
        self.offered = Some(offered);
        self.rating = Some(rating);
        self.status = EvaluationStatus::Complete;
        Ok(())
    }

    /// Drop the rubric, which only the journal's members may read
    pub fn for_researcher(mut self) -> Self {
        self.rubric = None;
        self
    }

    /// Researcher's answer to an accepted offer
    pub fn respond_to_offer(&mut self, answer: OfferAccepted) -> AppResult<()> {
        if self.status != EvaluationStatus::Complete || self.offered != Some(Offer::Accept) {
            return Err(AppError::BusinessRule(
                "Only accepted offers can be answered".to_string(),
            ));
        }
        if self.offer_accepted.is_some() {
            return Err(AppError::BusinessRule(
                "This offer was already answered".to_string(),
            ));
        }
        self.offer_accepted = Some(answer);
        Ok(())
    }
}

/// Evaluation with the evaluated paper, as shown to journal staff
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JournalSubmission {
    pub evaluation: Evaluation,
    pub paper: PaperSummary,
}

/// Record a start decision
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartDecisionRequest {
    pub decision: StartDecision,
    /// Send straight to full board review
    #[serde(default)]
    pub full_board: bool,
}

/// Attach comments and rubric notes
#[derive(Debug, Deserialize, ToSchema)]
pub struct AnnotateRequest {
    pub comments: Option<String>,
    pub rubric: Option<String>,
}

/// Record the final decision
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DecisionRequest {
    pub offered: Offer,
    #[validate(range(min = 1, max = 10, message = "Rating must be between 1 and 10"))]
    pub rating: i16,
    pub comments: Option<String>,
    pub rubric: Option<String>,
}

/// Researcher's answer to an offer
#[derive(Debug, Deserialize, ToSchema)]
pub struct OfferResponseRequest {
    pub offer_accepted: OfferAccepted,
}

/// Evaluation queue filters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EvaluationQuery {
    pub status: Option<EvaluationStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Evaluation {
        Evaluation {
            id: 1,
            paper_id: 10,
            journal_id: 20,
            comments: String::new(),
            rating: None,
            offered: None,
            decision_date: Utc::now(),
            offer_accepted: None,
            status: EvaluationStatus::NotStarted,
            start_decision: None,
            review_start_time: None,
            rubric: Some("Journal rubric".to_string()),
        }
    }

    #[test]
    fn test_full_lifecycle() {
        let mut eval = fresh();
        let now = Utc::now();

        eval.record_start_decision(StartDecision::AcceptForReview, false, now).unwrap();
        assert_eq!(eval.status, EvaluationStatus::UnderReview);
        assert_eq!(eval.review_start_time, Some(now));
        assert!(eval.rating.is_none() && eval.offered.is_none());

        eval.record_decision(Offer::Accept, 8, Some("Strong piece".to_string()), None).unwrap();
        assert_eq!(eval.status, EvaluationStatus::Complete);
        assert_eq!(eval.rating, Some(8));
        assert_eq!(eval.comments, "Strong piece");
        assert_eq!(eval.rubric.as_deref(), Some("Journal rubric"));

        eval.respond_to_offer(OfferAccepted::Yes).unwrap();
        assert_eq!(eval.status, EvaluationStatus::Complete);
        assert_eq!(eval.offer_accepted, Some(OfferAccepted::Yes));
    }

    #[test]
    fn test_full_board_start() {
        let mut eval = fresh();
        eval.record_start_decision(StartDecision::AcceptForReview, true, Utc::now()).unwrap();
        assert_eq!(eval.status, EvaluationStatus::UnderFullBoardReview);
        eval.record_decision(Offer::Reject, 3, None, None).unwrap();
        assert_eq!(eval.status, EvaluationStatus::Complete);
    }

    #[test]
    fn test_decline_is_terminal() {
        let mut eval = fresh();
        eval.record_start_decision(StartDecision::DeclineToReview, true, Utc::now()).unwrap();
        assert_eq!(eval.status, EvaluationStatus::NotStarted);
        assert_eq!(eval.start_decision, Some(StartDecision::DeclineToReview));
        assert!(eval.review_start_time.is_none());

        assert!(eval
            .record_start_decision(StartDecision::AcceptForReview, false, Utc::now())
            .is_err());
        assert!(eval.record_decision(Offer::Accept, 5, None, None).is_err());
        assert!(eval.rating.is_none() && eval.offered.is_none());

        let err = eval.annotate(Some("too late".into()), Some("new rubric".into())).unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
        assert!(eval.comments.is_empty());
        assert_eq!(eval.rubric.as_deref(), Some("Journal rubric"));
    }

    #[test]
    fn test_researcher_view_hides_rubric() {
        let eval = fresh();
        let view = eval.clone().for_researcher();
        assert!(view.rubric.is_none());
        assert_eq!(view.status, eval.status);

        let json = serde_json::to_value(&view).unwrap();
        assert!(json["rubric"].is_null());
    }

    #[test]
    fn test_decision_requires_review() {
        let mut eval = fresh();
        let err = eval.record_decision(Offer::Accept, 8, None, None).unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
        assert_eq!(eval.status, EvaluationStatus::NotStarted);
        assert!(eval.offered.is_none());
    }

    #[test]
    fn test_rating_out_of_range_leaves_state_untouched() {
        let mut eval = fresh();
        eval.record_start_decision(StartDecision::AcceptForReview, false, Utc::now()).unwrap();
        let before = eval.clone();

        for rating in [0, 11, -3] {
            let err = eval.record_decision(Offer::Accept, rating, Some("x".into()), None).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert_eq!(eval, before);
    }

    #[test]
    fn test_escalation() {
        let mut eval = fresh();
        assert!(eval.escalate_to_full_board().is_err());
        eval.record_start_decision(StartDecision::AcceptForReview, false, Utc::now()).unwrap();
        eval.escalate_to_full_board().unwrap();
        assert_eq!(eval.status, EvaluationStatus::UnderFullBoardReview);
        assert!(eval.escalate_to_full_board().is_err());
    }

    #[test]
    fn test_annotate_before_completion_only() {
        let mut eval = fresh();
        eval.annotate(Some("first read".into()), Some("custom rubric".into())).unwrap();
        assert_eq!(eval.comments, "first read");
        assert_eq!(eval.rubric.as_deref(), Some("custom rubric"));

        eval.record_start_decision(StartDecision::AcceptForReview, false, Utc::now()).unwrap();
        eval.record_decision(Offer::Reject, 2, None, None).unwrap();
        assert!(eval.annotate(Some("late".into()), None).is_err());
        assert_eq!(eval.comments, "first read");
    }

    #[test]
    fn test_offer_response_rules() {
        let mut rejected = fresh();
        rejected.record_start_decision(StartDecision::AcceptForReview, false, Utc::now()).unwrap();
        rejected.record_decision(Offer::Reject, 4, None, None).unwrap();
        assert!(rejected.respond_to_offer(OfferAccepted::Yes).is_err());

        let mut pending = fresh();
        assert!(pending.respond_to_offer(OfferAccepted::No).is_err());

        let mut accepted = fresh();
        accepted.record_start_decision(StartDecision::AcceptForReview, false, Utc::now()).unwrap();
        accepted.record_decision(Offer::Accept, 9, None, None).unwrap();
        accepted.respond_to_offer(OfferAccepted::No).unwrap();
        assert!(accepted.respond_to_offer(OfferAccepted::Yes).is_err());
        assert_eq!(accepted.offer_accepted, Some(OfferAccepted::No));
    }
}
