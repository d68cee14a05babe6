//! Paper submission service

use std::{collections::BTreeSet, sync::Arc};

use uuid::Uuid;

use crate::{
    config::StorageConfig,
    error::{AppError, AppResult},
    models::{
        journal::JournalDetails,
        paper::{AddJournals, CreatePaper, DocumentSlot, Paper, PaperDetails, UpdatePaper},
        user::UserClaims,
    },
    repository::Repository,
    services::{
        journals::JournalsService,
        storage::{self, ObjectStore},
    },
};

/// Check that every requested journal exists and accepts submissions
fn check_open(requested: &BTreeSet<i32>, found: &[JournalDetails]) -> AppResult<()> {
    for id in requested {
        let journal = found
            .iter()
            .find(|j| j.journal.id == *id)
            .ok_or_else(|| AppError::NotFound(format!("Journal {} not found", id)))?;
        if !journal.is_open() {
            return Err(AppError::BusinessRule(format!(
                "Journal '{}' is not accepting submissions",
                journal.journal.name
            )));
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct PapersService {
    repository: Repository,
    journals: JournalsService,
    storage_prefix: String,
    store: Arc<dyn ObjectStore>,
}

impl PapersService {
    pub fn new(
        repository: Repository,
        journals: JournalsService,
        storage: &StorageConfig,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            repository,
            journals,
            storage_prefix: storage.prefix.clone(),
            store,
        }
    }

    /// Submit a new paper to one or more open journals.
    ///
    /// The paper, its journal links and one evaluation per journal are
    /// written in a single transaction.
    pub async fn submit(&self, claims: &UserClaims, data: &CreatePaper) -> AppResult<PaperDetails> {
        claims.require_researcher()?;
        if !data.submission_criteria_satisfied {
            return Err(AppError::Validation(
                "The journals' submission criteria must be satisfied".to_string(),
            ));
        }

        let journal_ids: BTreeSet<i32> = data.journal_ids.iter().copied().collect();
        let ids: Vec<i32> = journal_ids.iter().copied().collect();
        let journals = self.repository.journals.get_many_details(&ids).await?;
        check_open(&journal_ids, &journals)?;

        let mut tx = self.repository.pool.begin().await?;
        let paper = self
            .repository
            .papers
            .create(&mut tx, claims.user_id, Uuid::new_v4(), data)
            .await?;
        for journal_id in &journal_ids {
            self.repository.papers.associate_journal(&mut tx, paper.id, *journal_id).await?;
            self.repository
                .evaluations
                .create_for_association(&mut tx, paper.id, *journal_id)
                .await?;
        }
        tx.commit().await?;

        tracing::info!(
            "Paper {} submitted by user {} to {} journal(s)",
            paper.uuid,
            claims.user_id,
            journal_ids.len()
        );
        self.details(paper).await
    }

    /// Submit an existing paper to more journals; already linked ones are skipped
    pub async fn add_journals(&self, claims: &UserClaims, uuid: Uuid, data: &AddJournals) -> AppResult<PaperDetails> {
        let paper = self.get_owned(claims, uuid).await?;

        let journal_ids: BTreeSet<i32> = data.journal_ids.iter().copied().collect();
        let ids: Vec<i32> = journal_ids.iter().copied().collect();
        let journals = self.repository.journals.get_many_details(&ids).await?;
        check_open(&journal_ids, &journals)?;

        let mut tx = self.repository.pool.begin().await?;
        let mut added = 0;
        for journal_id in &journal_ids {
            if self.repository.papers.associate_journal(&mut tx, paper.id, *journal_id).await? {
                added += 1;
            }
            self.repository
                .evaluations
                .create_for_association(&mut tx, paper.id, *journal_id)
                .await?;
        }
        tx.commit().await?;

        tracing::info!("Paper {} submitted to {} more journal(s)", paper.uuid, added);
        self.details(paper).await
    }

    /// Store an uploaded document and record its key in the matching slot
    pub async fn upload_document(
        &self,
        claims: &UserClaims,
        uuid: Uuid,
        slot: DocumentSlot,
        filename: &str,
        bytes: &[u8],
    ) -> AppResult<Paper> {
        let paper = self.get_owned(claims, uuid).await?;
        if bytes.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }

        let key = storage::paper_document_key(
            &self.storage_prefix,
            claims.user_id,
            &claims.sub,
            paper.uuid,
            slot,
            filename,
        )?;
        let key = self.store.put(&key, bytes).await?;

        // The blob is already written; leave a trail if the row update fails
        self.repository
            .papers
            .set_document_key(paper.id, slot, &key)
            .await
            .map_err(|e| {
                tracing::error!("Stored {} but could not record it on paper {}: {}", key, paper.uuid, e);
                e
            })
    }

    pub async fn list_mine(&self, claims: &UserClaims) -> AppResult<Vec<Paper>> {
        claims.require_researcher()?;
        self.repository.papers.list_for_researcher(claims.user_id).await
    }

    /// Paper visible to its researcher and to members of the journals it was
    /// submitted to
    pub async fn get(&self, claims: &UserClaims, uuid: Uuid) -> AppResult<PaperDetails> {
        let paper = self.repository.papers.get_by_uuid(uuid).await?;
        if paper.researcher_id == claims.user_id {
            return self.details(paper).await;
        }

        let journals = self.repository.journals.list_for_paper(paper.id).await?;
        for journal in &journals {
            if self.journals.is_member(claims, journal).await? {
                return Ok(PaperDetails { paper, journals });
            }
        }
        Err(AppError::Authorization(format!("Not allowed to view paper {}", uuid)))
    }

    pub async fn update(&self, claims: &UserClaims, uuid: Uuid, data: &UpdatePaper) -> AppResult<PaperDetails> {
        let paper = self.get_owned(claims, uuid).await?;
        let paper = self.repository.papers.update(paper.id, data).await?;
        self.details(paper).await
    }

    /// Delete a paper together with its evaluations
    pub async fn delete(&self, claims: &UserClaims, uuid: Uuid) -> AppResult<()> {
        let paper = self.get_owned(claims, uuid).await?;
        self.repository.papers.delete(paper.id).await?;
        tracing::info!("Paper {} deleted by user {}", uuid, claims.user_id);
        Ok(())
    }

    /// Load a paper the acting researcher submitted
    pub async fn get_owned(&self, claims: &UserClaims, uuid: Uuid) -> AppResult<Paper> {
        claims.require_researcher()?;
        let paper = self.repository.papers.get_by_uuid(uuid).await?;
        if paper.researcher_id != claims.user_id {
            return Err(AppError::Authorization(format!("Paper {} belongs to another researcher", uuid)));
        }
        Ok(paper)
    }

    async fn details(&self, paper: Paper) -> AppResult<PaperDetails> {
        let journals = self.repository.journals.list_for_paper(paper.id).await?;
        Ok(PaperDetails { paper, journals })
    }
}
