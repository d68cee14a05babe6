//! Personal profile endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::Multipart;
use validator::Validate;

use crate::{
    error::AppResult,
    models::user::{PersonalProfile, ProfileDocument, UpdatePersonalProfile},
    AppState,
};

use super::{papers::read_upload, AuthenticatedUser};

/// Personal profile of the current user
#[utoipa::path(
    get,
    path = "/profile",
    tag = "profile",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Personal profile", body = PersonalProfile),
        (status = 404, description = "No personal profile yet")
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<PersonalProfile>> {
    let profile = state.services.users.get_personal_profile(claims.user_id).await?;
    Ok(Json(profile))
}

/// Create or update the personal profile
#[utoipa::path(
    put,
    path = "/profile",
    tag = "profile",
    security(("bearer_auth" = [])),
    request_body = UpdatePersonalProfile,
    responses(
        (status = 200, description = "Personal profile", body = PersonalProfile),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<UpdatePersonalProfile>,
) -> AppResult<Json<PersonalProfile>> {
    request.validate()?;
    let profile = state
        .services
        .users
        .update_personal_profile(claims.user_id, &request)
        .await?;
    Ok(Json(profile))
}

/// Upload a CV or bio
#[utoipa::path(
    post,
    path = "/profile/documents/{document}",
    tag = "profile",
    security(("bearer_auth" = [])),
    params(
        ("document" = ProfileDocument, Path, description = "cv or bio")
    ),
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Document stored", body = PersonalProfile),
        (status = 400, description = "No file in upload")
    )
)]
pub async fn upload_document(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(document): Path<ProfileDocument>,
    multipart: Multipart,
) -> AppResult<Json<PersonalProfile>> {
    let (filename, bytes) = read_upload(multipart).await?;
    let profile = state
        .services
        .users
        .upload_profile_document(&claims, document, &filename, &bytes)
        .await?;
    Ok(Json(profile))
}
