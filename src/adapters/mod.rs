//! Adapter interfaces for external systems.
//!
//! Adapters publish reviewed data to third-party services. They sit outside
//! the validation core and are only reached from the CLI.

pub mod langsmith;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::ReviewItem;

// Re-export the LangSmith client
pub use langsmith::LangSmithClient;

/// Result of publishing a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Browser URL of the dataset
    pub dataset_url: String,

    /// Number of examples created
    pub count: usize,
}

/// Trait for dataset upload targets
#[async_trait]
pub trait DatasetUploader: Send + Sync {
    /// Human-readable uploader name
    fn name(&self) -> &str;

    /// Publish accepted review items as a named dataset
    async fn upload(&self, items: &[ReviewItem], dataset_name: &str) -> Result<UploadReceipt>;
}
