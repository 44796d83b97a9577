//! Publishing events straight to a topic endpoint.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::events::storage_event::StorageEvent;

/// Header carrying the topic access key.
pub const ACCESS_KEY_HEADER: &str = "aeg-sas-key";

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("event endpoint request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("event endpoint rejected batch with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Event channel the producer can publish into.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a batch; succeeds once the channel has accepted it.
    async fn publish(&self, events: &[StorageEvent]) -> Result<(), PublishError>;
}

/// Publishes event-grid schema batches over HTTP.
pub struct HttpEventPublisher {
    client: reqwest::Client,
    endpoint: Url,
    access_key: String,
}

impl HttpEventPublisher {
    pub fn new(endpoint: Url, access_key: impl Into<String>, timeout: Duration) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            access_key: access_key.into(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl EventPublisher for HttpEventPublisher {
    async fn publish(&self, events: &[StorageEvent]) -> Result<(), PublishError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(ACCESS_KEY_HEADER, &self.access_key)
            .json(events)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(
            endpoint = %self.endpoint,
            count = events.len(),
            "Event batch published"
        );
        Ok(())
    }
}
