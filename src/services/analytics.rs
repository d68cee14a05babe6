//! Fire-and-forget product analytics

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::{
    config::AnalyticsConfig,
    error::{AppError, AppResult},
};

/// Destination of analytics events
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn track(&self, distinct_id: i32, event: &str, properties: Map<String, Value>) -> AppResult<()>;
}

/// Mixpanel-compatible `/track` endpoint
pub struct MixpanelSink {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl MixpanelSink {
    pub fn new(config: &AnalyticsConfig, token: String) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build analytics client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            token,
        })
    }
}

#[async_trait]
impl AnalyticsSink for MixpanelSink {
    async fn track(&self, distinct_id: i32, event: &str, properties: Map<String, Value>) -> AppResult<()> {
        let mut props = properties;
        props.insert("token".to_string(), json!(self.token));
        props.insert("distinct_id".to_string(), json!(distinct_id.to_string()));
        let body = json!([{ "event": event, "properties": props }]);

        let resp = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Analytics request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Analytics endpoint returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

/// Drops every event
pub struct NoopSink;

#[async_trait]
impl AnalyticsSink for NoopSink {
    async fn track(&self, _distinct_id: i32, _event: &str, _properties: Map<String, Value>) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Clone)]
pub struct AnalyticsService {
    sink: Arc<dyn AnalyticsSink>,
}

impl AnalyticsService {
    pub fn new(sink: Arc<dyn AnalyticsSink>) -> Self {
        Self { sink }
    }

    /// Mixpanel sink when a token is configured, no-op otherwise
    pub fn from_config(config: &AnalyticsConfig) -> AppResult<Self> {
        let sink: Arc<dyn AnalyticsSink> = match config.token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => Arc::new(MixpanelSink::new(config, token.to_string())?),
            None => {
                tracing::info!("No analytics token configured, events will be dropped");
                Arc::new(NoopSink)
            }
        };
        Ok(Self::new(sink))
    }

    /// Send an event in the background. Failures are logged, never returned.
    pub fn track(&self, user_id: i32, event: &str, properties: Map<String, Value>) -> tokio::task::JoinHandle<()> {
        let sink = self.sink.clone();
        let event = event.to_string();
        tokio::spawn(async move {
            if let Err(e) = sink.track(user_id, &event, properties).await {
                tracing::warn!("Analytics event '{}' for user {} failed: {}", event, user_id, e);
            }
        })
    }
}
