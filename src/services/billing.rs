//! Payment-method setup with a Stripe-compatible provider

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    config::BillingConfig,
    error::{AppError, AppResult},
    models::user::UserProfile,
    repository::{users::UsersRepository, Repository},
};

/// Status reported by the provider once the customer completed the setup
pub const SETUP_SUCCEEDED: &str = "succeeded";

/// Setup intent as returned by the provider
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetupIntent {
    pub id: String,
    pub client_secret: String,
    pub status: String,
    /// Customer the intent was created for
    #[serde(default)]
    pub customer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Customer {
    id: String,
}

/// Remote payment provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_customer(&self, email: &str) -> AppResult<String>;
    async fn create_setup_intent(&self, customer_id: &str) -> AppResult<SetupIntent>;
    async fn get_setup_intent(&self, intent_id: &str) -> AppResult<SetupIntent>;
}

/// HTTP client for the Stripe REST API (form-encoded requests, bearer key)
pub struct StripeClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripeClient {
    pub fn new(config: &BillingConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build payment client: {}", e)))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn read<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> AppResult<T> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!("Payment provider returned {}: {}", status, body);
            return Err(AppError::Upstream(format!("Payment provider returned {}", status)));
        }
        resp.json::<T>()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid payment provider response: {}", e)))
    }
}

/// Provider ids are opaque tokens such as `seti_1Nv0...`; anything else would
/// change the request path
pub fn check_intent_id(intent_id: &str) -> AppResult<()> {
    let valid = !intent_id.is_empty()
        && intent_id.len() <= 255
        && intent_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(AppError::Validation(format!("Invalid setup intent id '{}'", intent_id)));
    }
    Ok(())
}

fn transport_error(e: reqwest::Error) -> AppError {
    AppError::Upstream(format!("Payment provider unreachable: {}", e))
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_customer(&self, email: &str) -> AppResult<String> {
        let resp = self
            .http
            .post(self.url("/customers"))
            .bearer_auth(&self.secret_key)
            .form(&[("email", email)])
            .send()
            .await
            .map_err(transport_error)?;
        let customer: Customer = Self::read(resp).await?;
        Ok(customer.id)
    }

    async fn create_setup_intent(&self, customer_id: &str) -> AppResult<SetupIntent> {
        let resp = self
            .http
            .post(self.url("/setup_intents"))
            .bearer_auth(&self.secret_key)
            .form(&[("customer", customer_id), ("payment_method_types[]", "card")])
            .send()
            .await
            .map_err(transport_error)?;
        Self::read(resp).await
    }

    async fn get_setup_intent(&self, intent_id: &str) -> AppResult<SetupIntent> {
        check_intent_id(intent_id)?;
        let resp = self
            .http
            .get(self.url(&format!("/setup_intents/{}", intent_id)))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(transport_error)?;
        Self::read(resp).await
    }
}

/// Billing fields of the account profile
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BillingAccounts: Send + Sync {
    async fn profile(&self, user_id: i32) -> AppResult<UserProfile>;
    async fn email(&self, user_id: i32) -> AppResult<Option<String>>;
    /// Store the customer id unless one is on record; returns the id on record
    async fn store_billing_id(&self, user_id: i32, billing_id: &str) -> AppResult<String>;
    async fn mark_confirmed(&self, user_id: i32) -> AppResult<UserProfile>;
}

#[async_trait]
impl BillingAccounts for UsersRepository {
    async fn profile(&self, user_id: i32) -> AppResult<UserProfile> {
        self.get_profile(user_id).await
    }

    async fn email(&self, user_id: i32) -> AppResult<Option<String>> {
        Ok(self.get_by_id(user_id).await?.email)
    }

    async fn store_billing_id(&self, user_id: i32, billing_id: &str) -> AppResult<String> {
        self.set_billing_id_if_absent(user_id, billing_id).await
    }

    async fn mark_confirmed(&self, user_id: i32) -> AppResult<UserProfile> {
        self.set_billing_confirmed(user_id).await
    }
}

#[derive(Clone)]
pub struct BillingService {
    accounts: Arc<dyn BillingAccounts>,
    provider: Arc<dyn PaymentProvider>,
}

impl BillingService {
    pub fn new(repository: Repository, provider: Arc<dyn PaymentProvider>) -> Self {
        Self::with_accounts(Arc::new(repository.users), provider)
    }

    pub fn with_accounts(accounts: Arc<dyn BillingAccounts>, provider: Arc<dyn PaymentProvider>) -> Self {
        Self { accounts, provider }
    }

    /// Return the user's customer id, creating the customer on first call.
    ///
    /// Safe to replay: the id is only stored if none is on record, and the
    /// stored id wins over a concurrently created one.
    pub async fn ensure_customer(&self, user_id: i32) -> AppResult<String> {
        let profile = self.accounts.profile(user_id).await?;
        if let Some(billing_id) = profile.billing_id {
            return Ok(billing_id);
        }

        let email = self
            .accounts
            .email(user_id)
            .await?
            .ok_or_else(|| AppError::BusinessRule("An email address is required for billing".to_string()))?;

        let customer_id = self.provider.create_customer(&email).await?;
        let stored = self.accounts.store_billing_id(user_id, &customer_id).await?;

        if stored != customer_id {
            tracing::warn!(
                "Customer {} created for user {} but {} was already on record",
                customer_id,
                user_id,
                stored
            );
        } else {
            tracing::info!("Created billing customer for user {}", user_id);
        }
        Ok(stored)
    }

    /// Start saving a payment method; returns the client secret
    pub async fn create_setup_intent(&self, user_id: i32) -> AppResult<SetupIntent> {
        let customer_id = self.ensure_customer(user_id).await?;
        self.provider.create_setup_intent(&customer_id).await
    }

    /// Check a setup intent with the provider and record success.
    ///
    /// Returns whether billing is now confirmed. Nothing is written unless the
    /// intent belongs to the user's own customer and the provider reports it
    /// as succeeded.
    pub async fn confirm_setup(&self, user_id: i32, intent_id: &str) -> AppResult<bool> {
        check_intent_id(intent_id)?;
        let billing_id = self
            .accounts
            .profile(user_id)
            .await?
            .billing_id
            .ok_or_else(|| AppError::BusinessRule("No billing customer on record".to_string()))?;

        let intent = self.provider.get_setup_intent(intent_id).await?;
        if intent.customer.as_deref() != Some(billing_id.as_str()) {
            tracing::warn!(
                "User {} tried to confirm setup intent {} of another customer",
                user_id,
                intent.id
            );
            return Err(AppError::Authorization(
                "Setup intent does not belong to this account".to_string(),
            ));
        }

        if intent.status != SETUP_SUCCEEDED {
            tracing::info!(
                "Setup intent {} for user {} is {}, billing not confirmed",
                intent.id,
                user_id,
                intent.status
            );
            return Ok(false);
        }

        self.accounts.mark_confirmed(user_id).await?;
        Ok(true)
    }

    /// Current billing state of the user
    pub async fn status(&self, user_id: i32) -> AppResult<UserProfile> {
        self.accounts.profile(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserType;

    fn profile(billing_id: Option<&str>) -> UserProfile {
        UserProfile {
            user_id: 1,
            user_type: UserType::Researcher,
            billing_id: billing_id.map(str::to_string),
            billing_confirmed: false,
            is_email_verified: true,
        }
    }

    fn intent(customer: &str, status: &str) -> SetupIntent {
        SetupIntent {
            id: "seti_123".to_string(),
            client_secret: "seti_123_secret".to_string(),
            status: status.to_string(),
            customer: Some(customer.to_string()),
        }
    }

    fn service(accounts: MockBillingAccounts, provider: MockPaymentProvider) -> BillingService {
        BillingService::with_accounts(Arc::new(accounts), Arc::new(provider))
    }

    #[tokio::test]
    async fn test_ensure_customer_reuses_recorded_id() {
        let mut accounts = MockBillingAccounts::new();
        accounts
            .expect_profile()
            .returning(|_| Ok(profile(Some("cus_existing"))));
        accounts.expect_store_billing_id().times(0);
        let mut provider = MockPaymentProvider::new();
        provider.expect_create_customer().times(0);

        let service = service(accounts, provider);
        assert_eq!(service.ensure_customer(1).await.unwrap(), "cus_existing");
        assert_eq!(service.ensure_customer(1).await.unwrap(), "cus_existing");
    }

    #[tokio::test]
    async fn test_ensure_customer_creates_once() {
        let mut accounts = MockBillingAccounts::new();
        accounts.expect_profile().times(1).returning(|_| Ok(profile(None)));
        accounts
            .expect_email()
            .returning(|_| Ok(Some("rhoda@example.org".to_string())));
        accounts
            .expect_store_billing_id()
            .withf(|id, billing_id| *id == 1 && billing_id == "cus_new")
            .times(1)
            .returning(|_, billing_id| Ok(billing_id.to_string()));
        let mut provider = MockPaymentProvider::new();
        provider
            .expect_create_customer()
            .withf(|email| email == "rhoda@example.org")
            .times(1)
            .returning(|_| Ok("cus_new".to_string()));

        assert_eq!(service(accounts, provider).ensure_customer(1).await.unwrap(), "cus_new");
    }

    #[tokio::test]
    async fn test_ensure_customer_keeps_id_stored_concurrently() {
        let mut accounts = MockBillingAccounts::new();
        accounts.expect_profile().returning(|_| Ok(profile(None)));
        accounts
            .expect_email()
            .returning(|_| Ok(Some("rhoda@example.org".to_string())));
        accounts
            .expect_store_billing_id()
            .returning(|_, _| Ok("cus_first".to_string()));
        let mut provider = MockPaymentProvider::new();
        provider
            .expect_create_customer()
            .times(1)
            .returning(|_| Ok("cus_second".to_string()));

        assert_eq!(service(accounts, provider).ensure_customer(1).await.unwrap(), "cus_first");
    }

    #[tokio::test]
    async fn test_ensure_customer_requires_email() {
        let mut accounts = MockBillingAccounts::new();
        accounts.expect_profile().returning(|_| Ok(profile(None)));
        accounts.expect_email().returning(|_| Ok(None));
        let mut provider = MockPaymentProvider::new();
        provider.expect_create_customer().times(0);

        let err = service(accounts, provider).ensure_customer(1).await.unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
    }

    #[tokio::test]
    async fn test_confirm_setup_not_succeeded_writes_nothing() {
        let mut accounts = MockBillingAccounts::new();
        accounts.expect_profile().returning(|_| Ok(profile(Some("cus_1"))));
        accounts.expect_mark_confirmed().times(0);
        let mut provider = MockPaymentProvider::new();
        provider
            .expect_get_setup_intent()
            .withf(|id| id == "seti_123")
            .times(1)
            .returning(|_| Ok(intent("cus_1", "requires_payment_method")));

        assert!(!service(accounts, provider).confirm_setup(1, "seti_123").await.unwrap());
    }

    #[tokio::test]
    async fn test_confirm_setup_succeeded_records_confirmation() {
        let mut accounts = MockBillingAccounts::new();
        accounts.expect_profile().returning(|_| Ok(profile(Some("cus_1"))));
        accounts.expect_mark_confirmed().times(1).returning(|_| {
            let mut confirmed = profile(Some("cus_1"));
            confirmed.billing_confirmed = true;
            Ok(confirmed)
        });
        let mut provider = MockPaymentProvider::new();
        provider
            .expect_get_setup_intent()
            .returning(|_| Ok(intent("cus_1", SETUP_SUCCEEDED)));

        assert!(service(accounts, provider).confirm_setup(1, "seti_123").await.unwrap());
    }

    #[tokio::test]
    async fn test_confirm_setup_rejects_intent_of_other_customer() {
        let mut accounts = MockBillingAccounts::new();
        accounts.expect_profile().returning(|_| Ok(profile(Some("cus_1"))));
        accounts.expect_mark_confirmed().times(0);
        let mut provider = MockPaymentProvider::new();
        provider
            .expect_get_setup_intent()
            .returning(|_| Ok(intent("cus_other", SETUP_SUCCEEDED)));

        let err = service(accounts, provider).confirm_setup(1, "seti_123").await.unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_confirm_setup_rejects_path_like_ids() {
        let mut accounts = MockBillingAccounts::new();
        accounts.expect_profile().times(0);
        accounts.expect_mark_confirmed().times(0);
        let mut provider = MockPaymentProvider::new();
        provider.expect_get_setup_intent().times(0);

        let service = service(accounts, provider);
        for id in ["../customers/cus_victim", "seti_1/../../x", "seti 1", "seti_1?expand=x", ""] {
            let err = service.confirm_setup(1, id).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{} was accepted", id);
        }
    }

    #[tokio::test]
    async fn test_confirm_setup_without_customer() {
        let mut accounts = MockBillingAccounts::new();
        accounts.expect_profile().returning(|_| Ok(profile(None)));
        let mut provider = MockPaymentProvider::new();
        provider.expect_get_setup_intent().times(0);

        let err = service(accounts, provider).confirm_setup(1, "seti_123").await.unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
    }

    #[tokio::test]
    async fn test_confirm_setup_provider_failure_is_upstream() {
        let mut accounts = MockBillingAccounts::new();
        accounts.expect_profile().returning(|_| Ok(profile(Some("cus_1"))));
        let mut provider = MockPaymentProvider::new();
        provider
            .expect_get_setup_intent()
            .returning(|_| Err(AppError::Upstream("Payment provider returned 500".to_string())));

        let err = service(accounts, provider).confirm_setup(1, "seti_123").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[test]
    fn test_setup_intent_customer_is_optional() {
        let parsed: SetupIntent = serde_json::from_str(
            r#"{"id":"seti_1","client_secret":"s","status":"succeeded","customer":"cus_9"}"#,
        )
        .unwrap();
        assert_eq!(parsed.customer.as_deref(), Some("cus_9"));

        let parsed: SetupIntent =
            serde_json::from_str(r#"{"id":"seti_1","client_secret":"s","status":"canceled"}"#).unwrap();
        assert!(parsed.customer.is_none());
    }

    fn stripe() -> StripeClient {
        StripeClient::new(&BillingConfig {
            api_base: "https://api.stripe.com/v1/".to_string(),
            secret_key: "sk_test".to_string(),
            timeout_seconds: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_stripe_client_trims_base_url() {
        assert_eq!(stripe().url("/customers"), "https://api.stripe.com/v1/customers");
    }

    #[tokio::test]
    async fn test_stripe_client_refuses_path_like_ids() {
        let err = stripe()
            .get_setup_intent("../customers/cus_victim")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
