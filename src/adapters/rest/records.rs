use crate::config::DatabaseConfig;
use crate::domain::jobs::ProcessedRecord;
use crate::ports::records::RecordStore;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use std::error::Error;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("database rejected record with {status}: {body}")]
pub struct RecordRejected {
    pub status: StatusCode,
    pub body: String,
}

/// Inserts records through a PostgREST-style `/rest/v1/<table>` endpoint.
#[derive(Clone)]
pub struct RestRecordStore {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl RestRecordStore {
    pub fn new(client: reqwest::Client, config: &DatabaseConfig) -> Self {
        Self {
            client,
            endpoint: format!("{}/rest/v1/{}", config.url.trim_end_matches('/'), config.table),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl RecordStore for RestRecordStore {
    async fn insert(&self, record: &ProcessedRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RecordRejected { status, body }.into());
        }
        Ok(())
    }
}
