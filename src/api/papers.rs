//! Paper submission endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Multipart;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        evaluation::Evaluation,
        paper::{AddJournals, CreatePaper, DocumentSlot, Paper, PaperDetails, UpdatePaper},
    },
    AppState,
};

use super::AuthenticatedUser;

/// First file field of a multipart body: (file name, bytes)
pub(crate) async fn read_upload(mut multipart: Multipart) -> AppResult<(String, Vec<u8>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
        return Ok((filename, bytes.to_vec()));
    }
    Err(AppError::BadRequest("No file in upload".to_string()))
}

/// Papers of the current researcher
#[utoipa::path(
    get,
    path = "/papers",
    tag = "papers",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Submitted papers", body = Vec<Paper>),
        (status = 403, description = "Researcher account required")
    )
)]
pub async fn list_my_papers(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Paper>>> {
    let papers = state.services.papers.list_mine(&claims).await?;
    Ok(Json(papers))
}

/// Submit a paper to one or more open journals
#[utoipa::path(
    post,
    path = "/papers",
    tag = "papers",
    security(("bearer_auth" = [])),
    request_body = CreatePaper,
    responses(
        (status = 201, description = "Paper submitted", body = PaperDetails),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Journal not found"),
        (status = 422, description = "Journal closed to submissions")
    )
)]
pub async fn submit_paper(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreatePaper>,
) -> AppResult<(StatusCode, Json<PaperDetails>)> {
    request.validate()?;
    let paper = state.services.papers.submit(&claims, &request).await?;
    Ok((StatusCode::CREATED, Json(paper)))
}

/// Get a paper
#[utoipa::path(
    get,
    path = "/papers/{uuid}",
    tag = "papers",
    security(("bearer_auth" = [])),
    params(
        ("uuid" = Uuid, Path, description = "Paper UUID")
    ),
    responses(
        (status = 200, description = "Paper", body = PaperDetails),
        (status = 403, description = "Not allowed to view this paper"),
        (status = 404, description = "Paper not found")
    )
)]
pub async fn get_paper(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(uuid): Path<Uuid>,
) -> AppResult<Json<PaperDetails>> {
    let paper = state.services.papers.get(&claims, uuid).await?;
    Ok(Json(paper))
}

/// Update a paper's descriptive fields
#[utoipa::path(
    put,
    path = "/papers/{uuid}",
    tag = "papers",
    security(("bearer_auth" = [])),
    params(
        ("uuid" = Uuid, Path, description = "Paper UUID")
    ),
    request_body = UpdatePaper,
    responses(
        (status = 200, description = "Paper updated", body = PaperDetails),
        (status = 404, description = "Paper not found")
    )
)]
pub async fn update_paper(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(uuid): Path<Uuid>,
    Json(request): Json<UpdatePaper>,
) -> AppResult<Json<PaperDetails>> {
    request.validate()?;
    let paper = state.services.papers.update(&claims, uuid, &request).await?;
    Ok(Json(paper))
}

/// Delete a paper and its evaluations
#[utoipa::path(
    delete,
    path = "/papers/{uuid}",
    tag = "papers",
    security(("bearer_auth" = [])),
    params(
        ("uuid" = Uuid, Path, description = "Paper UUID")
    ),
    responses(
        (status = 204, description = "Paper deleted"),
        (status = 404, description = "Paper not found")
    )
)]
pub async fn delete_paper(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(uuid): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.papers.delete(&claims, uuid).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Submit a paper to more journals
#[utoipa::path(
    post,
    path = "/papers/{uuid}/journals",
    tag = "papers",
    security(("bearer_auth" = [])),
    params(
        ("uuid" = Uuid, Path, description = "Paper UUID")
    ),
    request_body = AddJournals,
    responses(
        (status = 200, description = "Paper with its journals", body = PaperDetails),
        (status = 422, description = "Journal closed to submissions")
    )
)]
pub async fn add_journals(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(uuid): Path<Uuid>,
    Json(request): Json<AddJournals>,
) -> AppResult<Json<PaperDetails>> {
    request.validate()?;
    let paper = state.services.papers.add_journals(&claims, uuid, &request).await?;
    Ok(Json(paper))
}

/// Upload the abstract, manuscript or supplement of a paper
#[utoipa::path(
    post,
    path = "/papers/{uuid}/documents/{slot}",
    tag = "papers",
    security(("bearer_auth" = [])),
    params(
        ("uuid" = Uuid, Path, description = "Paper UUID"),
        ("slot" = DocumentSlot, Path, description = "abstract, manuscript or supplement")
    ),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Document stored", body = Paper),
        (status = 400, description = "No file in upload")
    )
)]
pub async fn upload_document(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((uuid, slot)): Path<(Uuid, DocumentSlot)>,
    multipart: Multipart,
) -> AppResult<Json<Paper>> {
    let (filename, bytes) = read_upload(multipart).await?;
    let paper = state
        .services
        .papers
        .upload_document(&claims, uuid, slot, &filename, &bytes)
        .await?;
    Ok(Json(paper))
}

/// Evaluations of one of the researcher's papers
#[utoipa::path(
    get,
    path = "/papers/{uuid}/evaluations",
    tag = "evaluations",
    security(("bearer_auth" = [])),
    params(
        ("uuid" = Uuid, Path, description = "Paper UUID")
    ),
    responses(
        (status = 200, description = "Evaluations", body = Vec<Evaluation>)
    )
)]
pub async fn list_evaluations(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(uuid): Path<Uuid>,
) -> AppResult<Json<Vec<Evaluation>>> {
    let evaluations = state
        .services
        .evaluations
        .list_paper_evaluations(&claims, uuid)
        .await?;
    Ok(Json(evaluations))
}
