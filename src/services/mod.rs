//! Business logic services

pub mod analytics;
pub mod billing;
pub mod evaluations;
pub mod journals;
pub mod messages;
pub mod papers;
pub mod storage;
pub mod users;

use std::sync::Arc;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub journals: journals::JournalsService,
    pub papers: papers::PapersService,
    pub evaluations: evaluations::EvaluationsService,
    pub billing: billing::BillingService,
    pub messages: messages::MessagesService,
}

impl Services {
    /// Create all services with the given repository, building the remote
    /// clients from configuration
    pub fn new(repository: Repository, config: &AppConfig) -> AppResult<Self> {
        let provider = Arc::new(billing::StripeClient::new(&config.billing)?);
        let store = Arc::new(storage::LocalObjectStore::new(&config.storage));
        let analytics = analytics::AnalyticsService::from_config(&config.analytics)?;
        Ok(Self::with_adapters(repository, config, provider, store, analytics))
    }

    /// Same as [`Services::new`] with explicit adapters
    pub fn with_adapters(
        repository: Repository,
        config: &AppConfig,
        provider: Arc<dyn billing::PaymentProvider>,
        store: Arc<dyn storage::ObjectStore>,
        analytics: analytics::AnalyticsService,
    ) -> Self {
        let journals = journals::JournalsService::new(repository.clone(), analytics);
        let papers = papers::PapersService::new(
            repository.clone(),
            journals.clone(),
            &config.storage,
            store.clone(),
        );

        Self {
            users: users::UsersService::new(repository.clone(), config.auth.clone(), &config.storage, store),
            evaluations: evaluations::EvaluationsService::new(repository.clone(), journals.clone(), papers.clone()),
            billing: billing::BillingService::new(repository.clone(), provider),
            messages: messages::MessagesService::new(repository),
            journals,
            papers,
        }
    }
}
