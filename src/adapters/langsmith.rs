//! LangSmith dataset uploader.
//!
//! Creates (or reuses) a dataset by name and adds one example per accepted
//! review item through the LangSmith REST API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use super::{DatasetUploader, UploadReceipt};
use crate::config::LangSmithSettings;
use crate::domain::ReviewItem;

/// Web UI used when the API endpoint does not point at a smith.langchain.com host
const DEFAULT_WEB_URL: &str = "https://smith.langchain.com";

/// Dataset record returned by the API
#[derive(Debug, Deserialize)]
struct Dataset {
    id: Uuid,
}

/// LangSmith REST client
pub struct LangSmithClient {
    /// API base, e.g. https://api.smith.langchain.com
    endpoint: String,
    /// API key sent as `x-api-key`
    api_key: String,
    /// HTTP client
    client: reqwest::Client,
}

impl LangSmithClient {
    /// Create a new LangSmith client
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create from resolved settings; fails when no API key is configured
    pub fn from_settings(settings: &LangSmithSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .context("LANGSMITH_API_KEY is not set")?;
        Ok(Self::new(settings.endpoint.clone(), api_key))
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    /// Create a dataset, or fetch the existing one with the same name
    async fn ensure_dataset(&self, name: &str) -> Result<Dataset> {
        let description = format!(
            "Reviewed Q&A dataset uploaded on {}",
            Utc::now().to_rfc3339()
        );

        let response = self
            .client
            .post(self.api_url("datasets"))
            .header("x-api-key", &self.api_key)
            .json(&json!({
                "name": name,
                "description": description,
                "data_type": "kv",
            }))
            .send()
            .await
            .context("Failed to create LangSmith dataset")?;

        if response.status() == StatusCode::CONFLICT {
            info!(dataset = name, "Using existing dataset");
            return self.find_dataset(name).await;
        }

        let response = response
            .error_for_status()
            .context("LangSmith rejected dataset creation")?;
        let dataset: Dataset = response
            .json()
            .await
            .context("Failed to parse LangSmith dataset response")?;

        info!(dataset = name, id = %dataset.id, "Created new dataset");
        Ok(dataset)
    }

    async fn find_dataset(&self, name: &str) -> Result<Dataset> {
        let datasets: Vec<Dataset> = self
            .client
            .get(self.api_url("datasets"))
            .header("x-api-key", &self.api_key)
            .query(&[("name", name)])
            .send()
            .await
            .context("Failed to list LangSmith datasets")?
            .error_for_status()
            .context("LangSmith rejected dataset lookup")?
            .json()
            .await
            .context("Failed to parse LangSmith dataset list")?;

        datasets
            .into_iter()
            .next()
            .with_context(|| format!("Dataset '{}' reported as existing but not found", name))
    }

    async fn create_example(&self, dataset_id: Uuid, item: &ReviewItem) -> Result<()> {
        self.client
            .post(self.api_url("examples"))
            .header("x-api-key", &self.api_key)
            .json(&example_payload(dataset_id, item))
            .send()
            .await
            .context("Failed to send example")?
            .error_for_status()
            .context("LangSmith rejected example")?;
        Ok(())
    }
}

#[async_trait]
impl DatasetUploader for LangSmithClient {
    fn name(&self) -> &str {
        "langsmith"
    }

    async fn upload(&self, items: &[ReviewItem], dataset_name: &str) -> Result<UploadReceipt> {
        if items.is_empty() {
            anyhow::bail!("No accepted items to upload");
        }

        let dataset = self.ensure_dataset(dataset_name).await?;

        let mut count = 0;
        for (index, item) in items.iter().enumerate() {
            match self.create_example(dataset.id, item).await {
                Ok(()) => count += 1,
                Err(e) => warn!(index, error = %e, "Failed to create example"),
            }
        }

        info!(count, dataset = dataset_name, "Upload finished");

        Ok(UploadReceipt {
            dataset_url: dataset_web_url(&self.endpoint, dataset.id),
            count,
        })
    }
}

/// Example body for one review item
fn example_payload(dataset_id: Uuid, item: &ReviewItem) -> Value {
    json!({
        "dataset_id": dataset_id,
        "inputs": {
            "question": item.query,
        },
        "outputs": {
            "answer": item.citation,
            "chunks": item.chunks,
            "source": item.source,
        },
        "metadata": {
            "category": item.category,
            "subcategory": item.subcategory,
            "doc_id": item.doc_id,
            "start_index": item.start_index,
            "end_index": item.end_index,
        },
    })
}

/// Browser URL for a dataset, derived from the API endpoint
fn dataset_web_url(endpoint: &str, dataset_id: Uuid) -> String {
    let base = endpoint.trim_end_matches('/').trim_end_matches("/api");
    let base = base.replacen("://api.", "://", 1).replace(".api.", ".");
    let base = if base.contains("smith.langchain.com") {
        base
    } else {
        DEFAULT_WEB_URL.to_string()
    };
    format!("{}/datasets/{}", base, dataset_id)
}
