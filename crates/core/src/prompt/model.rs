//! Prompt model definitions

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::Result;

/// A named, versioned system prompt.
///
/// The version is the identity of a document; updates replace name and
/// prompt text but never the version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptDocument {
    /// Human-readable name (e.g., "Code Reviewer")
    pub name: String,

    /// Version identifier, conventionally `v<N>`
    pub version: String,

    /// The instruction text pushed to the agent
    pub prompt: String,
}

impl PromptDocument {
    /// Create a new document
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            prompt: prompt.into(),
        }
    }

    /// Numeric part of a `v<N>` version, if it has one
    pub fn version_number(&self) -> Option<u64> {
        parse_version_number(&self.version)
    }
}

/// Starter prompt offered to clients before any versioning takes place
#[derive(Debug, Clone, Copy, Serialize)]
pub struct InitialPrompt {
    pub name: &'static str,
    pub prompt: &'static str,
}

/// Validated name and prompt text for a create or update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptDraft {
    pub name: String,
    pub prompt: String,
}

impl PromptDraft {
    /// Trim both fields and reject empty values
    pub fn new(name: &str, prompt: &str) -> Result<Self> {
        let name = name.trim();
        let prompt = prompt.trim();

        if name.is_empty() || prompt.is_empty() {
            return Err(Error::Validation(
                "Name and prompt content are required".to_string(),
            ));
        }

        Ok(Self {
            name: name.to_string(),
            prompt: prompt.to_string(),
        })
    }
}

/// Parse `v12` into `12`
pub fn parse_version_number(version: &str) -> Option<u64> {
    version.strip_prefix('v')?.parse().ok()
}

/// Reject versions that cannot safely name a file
pub fn validate_version(version: &str) -> Result<()> {
    if version.is_empty()
        || version.contains(['/', '\\'])
        || version.contains("..")
        || version.chars().any(char::is_whitespace)
    {
        return Err(Error::Validation(format!("Invalid version: {:?}", version)));
    }
    Ok(())
}
