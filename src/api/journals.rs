//! Journal endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        evaluation::{EvaluationQuery, JournalSubmission},
        journal::{JournalDetails, JournalQuery, UpdateJournal},
    },
    AppState,
};

use super::AuthenticatedUser;

/// List journals
#[utoipa::path(
    get,
    path = "/journals",
    tag = "journals",
    security(("bearer_auth" = [])),
    params(JournalQuery),
    responses(
        (status = 200, description = "Journals", body = Vec<JournalDetails>)
    )
)]
pub async fn list_journals(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<JournalQuery>,
) -> AppResult<Json<Vec<JournalDetails>>> {
    let journals = state.services.journals.list(query.open.unwrap_or(false)).await?;
    Ok(Json(journals))
}

/// Get a journal with its profile
#[utoipa::path(
    get,
    path = "/journals/{id}",
    tag = "journals",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Journal ID")
    ),
    responses(
        (status = 200, description = "Journal", body = JournalDetails),
        (status = 404, description = "Journal not found")
    )
)]
pub async fn get_journal(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<JournalDetails>> {
    let journal = state.services.journals.get(id, &claims).await?;
    Ok(Json(journal))
}

/// Update the publisher's own journal
#[utoipa::path(
    put,
    path = "/journals/mine",
    tag = "journals",
    security(("bearer_auth" = [])),
    request_body = UpdateJournal,
    responses(
        (status = 200, description = "Journal updated", body = JournalDetails),
        (status = 403, description = "Publisher account required")
    )
)]
pub async fn update_my_journal(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<UpdateJournal>,
) -> AppResult<Json<JournalDetails>> {
    request.validate()?;
    let journal = state.services.journals.update_my_journal(&claims, &request).await?;
    Ok(Json(journal))
}

/// Evaluation queue of the member's journal
#[utoipa::path(
    get,
    path = "/journals/mine/submissions",
    tag = "evaluations",
    security(("bearer_auth" = [])),
    params(EvaluationQuery),
    responses(
        (status = 200, description = "Submissions with their evaluation", body = Vec<JournalSubmission>),
        (status = 403, description = "Not a member of a journal")
    )
)]
pub async fn list_submissions(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<EvaluationQuery>,
) -> AppResult<Json<Vec<JournalSubmission>>> {
    let submissions = state
        .services
        .evaluations
        .list_journal_submissions(&claims, query.status)
        .await?;
    Ok(Json(submissions))
}
