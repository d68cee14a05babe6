//! API handlers for Lexreview REST endpoints

pub mod account;
pub mod auth;
pub mod evaluations;
pub mod health;
pub mod journals;
pub mod messages;
pub mod openapi;
pub mod papers;
pub mod profile;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Largest accepted upload (manuscripts, CVs)
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/password", put(auth::change_password))
        // Account settings
        .route("/account/settings", get(account::get_settings))
        .route("/account/editors", get(account::list_editors))
        .route("/account/editors", post(account::add_editor))
        .route("/account/editors/:username", delete(account::remove_editor))
        .route("/account/billing", get(account::billing_status))
        .route("/account/billing/customer", post(account::create_customer))
        .route("/account/billing/setup-intent", post(account::create_setup_intent))
        .route("/account/billing/confirm", post(account::confirm_setup))
        // Personal profile
        .route("/profile", get(profile::get_profile))
        .route("/profile", put(profile::update_profile))
        .route("/profile/documents/:document", post(profile::upload_document))
        // Journals
        .route("/journals", get(journals::list_journals))
        .route("/journals/mine", put(journals::update_my_journal))
        .route("/journals/mine/submissions", get(journals::list_submissions))
        .route("/journals/:id", get(journals::get_journal))
        // Papers
        .route("/papers", get(papers::list_my_papers))
        .route("/papers", post(papers::submit_paper))
        .route("/papers/:uuid", get(papers::get_paper))
        .route("/papers/:uuid", put(papers::update_paper))
        .route("/papers/:uuid", delete(papers::delete_paper))
        .route("/papers/:uuid/journals", post(papers::add_journals))
        .route("/papers/:uuid/documents/:slot", post(papers::upload_document))
        .route("/papers/:uuid/evaluations", get(papers::list_evaluations))
        // Evaluations
        .route("/evaluations/:id", get(evaluations::get_evaluation))
        .route("/evaluations/:id/start", post(evaluations::start_decision))
        .route("/evaluations/:id/escalate", post(evaluations::escalate))
        .route("/evaluations/:id/annotate", put(evaluations::annotate))
        .route("/evaluations/:id/decision", post(evaluations::record_decision))
        .route("/evaluations/:id/offer-response", post(evaluations::respond_to_offer))
        // Messaging
        .route("/rooms/:room/messages", get(messages::list_messages))
        .route("/rooms/:room/messages", post(messages::post_message))
        .route("/rooms/:room/messages/last", get(messages::last_message))
        .route("/contact", post(messages::submit_contact))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, repository::Repository, services::Services};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use std::{sync::Arc, time::Duration};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let config = AppConfig::default();
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(100))
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .unwrap();
        let services = Services::new(Repository::new(pool.clone()), &config).unwrap();
        AppState {
            config: Arc::new(config),
            services: Arc::new(services),
            pool,
        }
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = create_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_is_rejected() {
        let app = create_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/api/v1/papers").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_journal_detail_requires_token() {
        let app = create_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/api/v1/journals/1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bad_token_is_rejected() {
        let app = create_router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/account/settings")
                    .header(AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_researcher_cannot_manage_editors() {
        let state = test_state();
        let now = chrono::Utc::now().timestamp();
        let token = UserClaims {
            sub: "rhoda".to_string(),
            user_id: 1,
            user_type: crate::models::UserType::Researcher,
            exp: now + 3600,
            iat: now,
        }
        .create_token(&state.config.auth.jwt_secret)
        .unwrap();

        let app = create_router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/account/editors")
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"editor":"erin"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let app = create_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/api-docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
