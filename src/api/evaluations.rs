//! Evaluation workflow endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::evaluation::{
        AnnotateRequest, DecisionRequest, Evaluation, OfferResponseRequest, StartDecisionRequest,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Get an evaluation
#[utoipa::path(
    get,
    path = "/evaluations/{id}",
    tag = "evaluations",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Evaluation ID")
    ),
    responses(
        (status = 200, description = "Evaluation", body = Evaluation),
        (status = 403, description = "Not allowed to view this evaluation"),
        (status = 404, description = "Evaluation not found")
    )
)]
pub async fn get_evaluation(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Evaluation>> {
    let evaluation = state.services.evaluations.get(&claims, id).await?;
    Ok(Json(evaluation))
}

/// Accept the paper for review, or decline to review it
#[utoipa::path(
    post,
    path = "/evaluations/{id}/start",
    tag = "evaluations",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Evaluation ID")
    ),
    request_body = StartDecisionRequest,
    responses(
        (status = 200, description = "Start decision recorded", body = Evaluation),
        (status = 409, description = "Evaluation changed concurrently"),
        (status = 422, description = "A start decision was already recorded")
    )
)]
pub async fn start_decision(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<StartDecisionRequest>,
) -> AppResult<Json<Evaluation>> {
    let evaluation = state.services.evaluations.start_decision(&claims, id, &request).await?;
    Ok(Json(evaluation))
}

/// Hand the paper over to the full board
#[utoipa::path(
    post,
    path = "/evaluations/{id}/escalate",
    tag = "evaluations",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Evaluation ID")
    ),
    responses(
        (status = 200, description = "Evaluation under full board review", body = Evaluation),
        (status = 422, description = "Evaluation is not under review")
    )
)]
pub async fn escalate(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Evaluation>> {
    let evaluation = state.services.evaluations.escalate(&claims, id).await?;
    Ok(Json(evaluation))
}

/// Attach comments and rubric notes
#[utoipa::path(
    put,
    path = "/evaluations/{id}/annotate",
    tag = "evaluations",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Evaluation ID")
    ),
    request_body = AnnotateRequest,
    responses(
        (status = 200, description = "Evaluation updated", body = Evaluation),
        (status = 422, description = "Evaluation is complete")
    )
)]
pub async fn annotate(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<AnnotateRequest>,
) -> AppResult<Json<Evaluation>> {
    let evaluation = state.services.evaluations.annotate(&claims, id, &request).await?;
    Ok(Json(evaluation))
}

/// Record the offer and rating, completing the evaluation
#[utoipa::path(
    post,
    path = "/evaluations/{id}/decision",
    tag = "evaluations",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Evaluation ID")
    ),
    request_body = DecisionRequest,
    responses(
        (status = 200, description = "Evaluation complete", body = Evaluation),
        (status = 400, description = "Rating out of range"),
        (status = 422, description = "Evaluation is not under review")
    )
)]
pub async fn record_decision(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<DecisionRequest>,
) -> AppResult<Json<Evaluation>> {
    request.validate()?;
    let evaluation = state.services.evaluations.record_decision(&claims, id, &request).await?;
    Ok(Json(evaluation))
}

/// The researcher accepts or declines an offer
#[utoipa::path(
    post,
    path = "/evaluations/{id}/offer-response",
    tag = "evaluations",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Evaluation ID")
    ),
    request_body = OfferResponseRequest,
    responses(
        (status = 200, description = "Answer recorded", body = Evaluation),
        (status = 403, description = "Not the paper's researcher"),
        (status = 422, description = "No accepted offer to answer")
    )
)]
pub async fn respond_to_offer(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<OfferResponseRequest>,
) -> AppResult<Json<Evaluation>> {
    let evaluation = state
        .services
        .evaluations
        .respond_to_offer(&claims, id, request.offer_accepted)
        .await?;
    Ok(Json(evaluation))
}
