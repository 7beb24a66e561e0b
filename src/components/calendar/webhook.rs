use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

use super::models::CalendarPayload;
use crate::config::WebhookConfig;
use crate::error::{upstream_error, AppResult};

/// Something that can apply a calendar operation and report the result
#[async_trait]
pub trait CalendarWebhook: Send + Sync + 'static {
    /// Apply one operation; errors on network failure or a non-2xx status
    async fn execute(&self, payload: &CalendarPayload) -> AppResult<Value>;
}

/// Calendar webhook backed by a Google Apps Script deployment
#[derive(Debug, Clone)]
pub struct HttpCalendarWebhook {
    client: Client,
    url: Url,
}

impl HttpCalendarWebhook {
    /// Create a client for the configured webhook URL
    pub fn new(config: &WebhookConfig) -> Self {
        Self {
            client: Client::new(),
            url: config.url.clone(),
        }
    }
}

#[async_trait]
impl CalendarWebhook for HttpCalendarWebhook {
    async fn execute(&self, payload: &CalendarPayload) -> AppResult<Value> {
        debug!(
            "Posting {:?} operation to calendar webhook (event: {:?})",
            payload.action, payload.event_id
        );

        let res = self
            .client
            .post(self.url.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                error!("Calendar webhook request failed: {}", e);
                upstream_error(&format!("Google App Script Error: {}", e))
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let error_body = res.text().await.unwrap_or_default();
            error!("Calendar webhook returned {}", status);
            return Err(upstream_error(&format!(
                "Google App Script Error: Status {status}, Body: {error_body}"
            )));
        }

        res.json::<Value>().await.map_err(|e| {
            upstream_error(&format!("Google App Script Error: invalid JSON response: {e}"))
        })
    }
}
