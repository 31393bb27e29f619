//! Prompt repository trait
//!
//! Defines the interface for prompt document storage operations.

use async_trait::async_trait;

use super::model::PromptDocument;
use crate::Result;

/// Repository interface for versioned prompt documents
#[async_trait]
pub trait PromptRepository: Send + Sync {
    /// All documents, stored ones first, then any seed whose version is free
    async fn list(&self) -> Result<Vec<PromptDocument>>;

    /// Resolve a version against stored documents, falling back to the seeds
    async fn get(&self, version: &str) -> Result<Option<PromptDocument>>;

    /// Create a document, deriving the next version when none is given
    async fn create(
        &self,
        name: &str,
        prompt: &str,
        version: Option<&str>,
    ) -> Result<PromptDocument>;

    /// Replace name and prompt of a stored document
    async fn update(&self, version: &str, name: &str, prompt: &str) -> Result<PromptDocument>;
}
