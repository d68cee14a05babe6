//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{account, auth, evaluations, health, journals, messages, papers, profile};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lexreview API",
        version = "1.0.0",
        description = "Law review submission and evaluation REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    modifiers(&SecurityAddon),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        auth::change_password,
        // Account
        account::get_settings,
        account::list_editors,
        account::add_editor,
        account::remove_editor,
        account::billing_status,
        account::create_customer,
        account::create_setup_intent,
        account::confirm_setup,
        // Profile
        profile::get_profile,
        profile::update_profile,
        profile::upload_document,
        // Journals
        journals::list_journals,
        journals::get_journal,
        journals::update_my_journal,
        journals::list_submissions,
        // Papers
        papers::list_my_papers,
        papers::submit_paper,
        papers::get_paper,
        papers::update_paper,
        papers::delete_paper,
        papers::add_journals,
        papers::upload_document,
        papers::list_evaluations,
        // Evaluations
        evaluations::get_evaluation,
        evaluations::start_decision,
        evaluations::escalate,
        evaluations::annotate,
        evaluations::record_decision,
        evaluations::respond_to_offer,
        // Messages
        messages::list_messages,
        messages::post_message,
        messages::last_message,
        messages::submit_contact,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::MeResponse,
            crate::services::users::Registration,
            crate::models::user::User,
            crate::models::user::UserProfile,
            crate::models::user::CreateUser,
            crate::models::user::ChangePassword,
            // Account
            account::CustomerResponse,
            account::SetupIntentResponse,
            account::ConfirmSetupRequest,
            account::BillingStatus,
            crate::services::users::AccountSettings,
            // Profile
            crate::models::user::PersonalProfile,
            crate::models::user::UpdatePersonalProfile,
            crate::models::user::ProfileDocument,
            // Journals
            crate::models::journal::Journal,
            crate::models::journal::JournalProfile,
            crate::models::journal::JournalDetails,
            crate::models::journal::UpdateJournal,
            crate::models::journal::EditorAssignment,
            crate::models::journal::EditorRequest,
            // Papers
            crate::models::paper::Paper,
            crate::models::paper::PaperDetails,
            crate::models::paper::PaperSummary,
            crate::models::paper::CreatePaper,
            crate::models::paper::UpdatePaper,
            crate::models::paper::AddJournals,
            crate::models::paper::DocumentSlot,
            // Evaluations
            crate::models::evaluation::Evaluation,
            crate::models::evaluation::JournalSubmission,
            crate::models::evaluation::StartDecisionRequest,
            crate::models::evaluation::AnnotateRequest,
            crate::models::evaluation::DecisionRequest,
            crate::models::evaluation::OfferResponseRequest,
            // Messages
            crate::models::message::Message,
            crate::models::message::CreateMessage,
            crate::models::contact::Contact,
            crate::models::contact::CreateContact,
            // Enums
            crate::models::UserType,
            crate::models::JournalStatus,
            crate::models::FieldOfLaw,
            crate::models::RankingTier,
            crate::models::PaperType,
            crate::models::Offer,
            crate::models::StartDecision,
            crate::models::OfferAccepted,
            crate::models::EvaluationStatus,
            crate::models::Position,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and authentication"),
        (name = "account", description = "Account settings and editor roster"),
        (name = "billing", description = "Payment method setup"),
        (name = "profile", description = "Personal profile"),
        (name = "journals", description = "Journal registry"),
        (name = "papers", description = "Paper submissions"),
        (name = "evaluations", description = "Evaluation workflow"),
        (name = "messages", description = "Room messages and contact form")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
