//! Account settings: editor roster and billing

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        journal::{EditorAssignment, EditorRequest},
        user::UserProfile,
    },
    services::{billing::SetupIntent, users::AccountSettings},
    AppState,
};

use super::AuthenticatedUser;

#[derive(Serialize, ToSchema)]
pub struct CustomerResponse {
    pub billing_id: String,
}

#[derive(Serialize, ToSchema)]
pub struct SetupIntentResponse {
    pub client_secret: String,
}

impl From<SetupIntent> for SetupIntentResponse {
    fn from(intent: SetupIntent) -> Self {
        Self {
            client_secret: intent.client_secret,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct ConfirmSetupRequest {
    /// Setup intent id returned by the payment form
    pub setup_intent: String,
}

#[derive(Serialize, ToSchema)]
pub struct BillingStatus {
    pub billing_id: Option<String>,
    pub billing_confirmed: bool,
}

impl From<UserProfile> for BillingStatus {
    fn from(profile: UserProfile) -> Self {
        Self {
            billing_id: profile.billing_id,
            billing_confirmed: profile.billing_confirmed,
        }
    }
}

/// Account settings of the current user
#[utoipa::path(
    get,
    path = "/account/settings",
    tag = "account",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Account settings", body = AccountSettings),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_settings(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<AccountSettings>> {
    let settings = state.services.users.account_settings(claims.user_id).await?;
    Ok(Json(settings))
}

/// Editors of the publisher's journal
#[utoipa::path(
    get,
    path = "/account/editors",
    tag = "account",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Editor roster", body = Vec<EditorAssignment>),
        (status = 403, description = "Publisher account required")
    )
)]
pub async fn list_editors(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<EditorAssignment>>> {
    let editors = state.services.journals.list_editors(&claims).await?;
    Ok(Json(editors))
}

/// Assign an editor to the publisher's journal
#[utoipa::path(
    post,
    path = "/account/editors",
    tag = "account",
    security(("bearer_auth" = [])),
    request_body = EditorRequest,
    responses(
        (status = 201, description = "Editor assigned", body = EditorAssignment),
        (status = 403, description = "Publisher account required"),
        (status = 404, description = "No such user"),
        (status = 409, description = "Editor already assigned to a journal"),
        (status = 422, description = "User is not an editor")
    )
)]
pub async fn add_editor(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<EditorRequest>,
) -> AppResult<(StatusCode, Json<EditorAssignment>)> {
    let assignment = state
        .services
        .journals
        .assign_editor(&claims, request.editor.trim())
        .await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

/// Remove an editor from the publisher's journal
#[utoipa::path(
    delete,
    path = "/account/editors/{username}",
    tag = "account",
    security(("bearer_auth" = [])),
    params(
        ("username" = String, Path, description = "Editor username")
    ),
    responses(
        (status = 204, description = "Editor removed"),
        (status = 404, description = "No such user or no assignment"),
        (status = 422, description = "User is not an editor")
    )
)]
pub async fn remove_editor(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(username): Path<String>,
) -> AppResult<StatusCode> {
    state.services.journals.remove_editor(&claims, &username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Billing state of the current user
#[utoipa::path(
    get,
    path = "/account/billing",
    tag = "billing",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Billing state", body = BillingStatus)
    )
)]
pub async fn billing_status(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<BillingStatus>> {
    let profile = state.services.billing.status(claims.user_id).await?;
    Ok(Json(profile.into()))
}

/// Create the payment-provider customer; replays return the same id
#[utoipa::path(
    post,
    path = "/account/billing/customer",
    tag = "billing",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Customer on record", body = CustomerResponse),
        (status = 502, description = "Payment provider failure")
    )
)]
pub async fn create_customer(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<CustomerResponse>> {
    let billing_id = state.services.billing.ensure_customer(claims.user_id).await?;
    Ok(Json(CustomerResponse { billing_id }))
}

/// Start saving a payment method
#[utoipa::path(
    post,
    path = "/account/billing/setup-intent",
    tag = "billing",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Client secret for the payment form", body = SetupIntentResponse),
        (status = 502, description = "Payment provider failure")
    )
)]
pub async fn create_setup_intent(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<SetupIntentResponse>> {
    let intent = state.services.billing.create_setup_intent(claims.user_id).await?;
    Ok(Json(intent.into()))
}

/// Record the outcome of a setup intent
#[utoipa::path(
    post,
    path = "/account/billing/confirm",
    tag = "billing",
    security(("bearer_auth" = [])),
    request_body = ConfirmSetupRequest,
    responses(
        (status = 200, description = "Billing state after the check", body = BillingStatus),
        (status = 400, description = "Malformed setup intent id"),
        (status = 403, description = "Setup intent belongs to another customer"),
        (status = 422, description = "No billing customer on record"),
        (status = 502, description = "Payment provider failure")
    )
)]
pub async fn confirm_setup(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ConfirmSetupRequest>,
) -> AppResult<Json<BillingStatus>> {
    state
        .services
        .billing
        .confirm_setup(claims.user_id, &request.setup_intent)
        .await?;
    let profile = state.services.billing.status(claims.user_id).await?;
    Ok(Json(profile.into()))
}
