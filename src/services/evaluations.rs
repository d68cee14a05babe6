//! Evaluation workflow service
//!
//! Every transition loads the evaluation, applies the state change on a copy
//! and persists it with a guard on the previous state. A concurrent transition
//! on the same evaluation makes the loser fail with Conflict.

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        evaluation::{AnnotateRequest, DecisionRequest, Evaluation, JournalSubmission, StartDecisionRequest},
        user::UserClaims,
        EvaluationStatus, OfferAccepted,
    },
    repository::Repository,
    services::{journals::JournalsService, papers::PapersService},
};

#[derive(Clone)]
pub struct EvaluationsService {
    repository: Repository,
    journals: JournalsService,
    papers: PapersService,
}

impl EvaluationsService {
    pub fn new(repository: Repository, journals: JournalsService, papers: PapersService) -> Self {
        Self {
            repository,
            journals,
            papers,
        }
    }

    /// Evaluation queue of the acting member's journal
    pub async fn list_journal_submissions(
        &self,
        claims: &UserClaims,
        status: Option<EvaluationStatus>,
    ) -> AppResult<Vec<JournalSubmission>> {
        let journal = self.journals.journal_of_member(claims).await?;
        self.repository.evaluations.list_for_journal(journal.id, status).await
    }

    /// Evaluations of one of the acting researcher's papers
    pub async fn list_paper_evaluations(&self, claims: &UserClaims, uuid: Uuid) -> AppResult<Vec<Evaluation>> {
        let paper = self.papers.get_owned(claims, uuid).await?;
        let evaluations = self.repository.evaluations.list_for_paper(paper.id).await?;
        Ok(evaluations.into_iter().map(Evaluation::for_researcher).collect())
    }

    /// Evaluation visible to a member of its journal or to the paper's researcher.
    /// The researcher gets it without the journal's rubric.
    pub async fn get(&self, claims: &UserClaims, id: i32) -> AppResult<Evaluation> {
        let evaluation = self.repository.evaluations.get_by_id(id).await?;
        let paper = self.repository.papers.get_by_id(evaluation.paper_id).await?;
        if paper.researcher_id == claims.user_id {
            return Ok(evaluation.for_researcher());
        }
        self.journals.require_member(claims, evaluation.journal_id).await?;
        Ok(evaluation)
    }

    async fn load_for_member(&self, claims: &UserClaims, id: i32) -> AppResult<Evaluation> {
        claims.require_journal_staff()?;
        let evaluation = self.repository.evaluations.get_by_id(id).await?;
        self.journals.require_member(claims, evaluation.journal_id).await?;
        Ok(evaluation)
    }

    async fn transition<F>(&self, before: Evaluation, apply: F) -> AppResult<Evaluation>
    where
        F: FnOnce(&mut Evaluation) -> AppResult<()>,
    {
        let mut after = before.clone();
        apply(&mut after)?;
        let saved = self.repository.evaluations.save_transition(&before, &after).await?;
        if saved.status != before.status {
            tracing::info!(
                "Evaluation {} moved from {:?} to {:?}",
                saved.id,
                before.status,
                saved.status
            );
        }
        Ok(saved)
    }

    pub async fn start_decision(
        &self,
        claims: &UserClaims,
        id: i32,
        data: &StartDecisionRequest,
    ) -> AppResult<Evaluation> {
        let before = self.load_for_member(claims, id).await?;
        let now = Utc::now();
        self.transition(before, |e| e.record_start_decision(data.decision, data.full_board, now))
            .await
    }

    pub async fn escalate(&self, claims: &UserClaims, id: i32) -> AppResult<Evaluation> {
        let before = self.load_for_member(claims, id).await?;
        self.transition(before, Evaluation::escalate_to_full_board).await
    }

    pub async fn annotate(&self, claims: &UserClaims, id: i32, data: &AnnotateRequest) -> AppResult<Evaluation> {
        let before = self.load_for_member(claims, id).await?;
        let (comments, rubric) = (data.comments.clone(), data.rubric.clone());
        self.transition(before, |e| e.annotate(comments, rubric)).await
    }

    pub async fn record_decision(
        &self,
        claims: &UserClaims,
        id: i32,
        data: &DecisionRequest,
    ) -> AppResult<Evaluation> {
        let before = self.load_for_member(claims, id).await?;
        let (comments, rubric) = (data.comments.clone(), data.rubric.clone());
        self.transition(before, |e| e.record_decision(data.offered, data.rating, comments, rubric))
            .await
    }

    /// The paper's researcher accepts or declines an offer
    pub async fn respond_to_offer(
        &self,
        claims: &UserClaims,
        id: i32,
        answer: OfferAccepted,
    ) -> AppResult<Evaluation> {
        claims.require_researcher()?;
        let before = self.repository.evaluations.get_by_id(id).await?;
        let paper = self.repository.papers.get_by_id(before.paper_id).await?;
        if paper.researcher_id != claims.user_id {
            return Err(AppError::Authorization(
                "Only the paper's researcher can answer an offer".to_string(),
            ));
        }
        let saved = self.transition(before, |e| e.respond_to_offer(answer)).await?;
        Ok(saved.for_researcher())
    }
}
