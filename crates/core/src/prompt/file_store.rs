//! File-based prompt storage implementation
//!
//! Stores one pretty-printed JSON document per version under a directory,
//! named `assistant_<N>.json` after the version's numeric suffix.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::model::{validate_version, PromptDocument, PromptDraft};
use super::repository::PromptRepository;
use super::seed::{seed_document, seed_documents, SEED_MAX_VERSION};
use crate::{Error, Result};

const FILE_PREFIX: &str = "assistant_";
const FILE_SUFFIX: &str = ".json";

/// Directory-backed prompt store
pub struct FilePromptStore {
    /// Directory holding one file per document
    dir: PathBuf,
    /// Serializes writes so derived versions are never handed out twice
    write_lock: Mutex<()>,
}

impl FilePromptStore {
    /// Create a new FilePromptStore
    ///
    /// The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Directory the documents live in
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `version`
    fn document_path(&self, version: &str) -> Result<PathBuf> {
        validate_version(version)?;
        let suffix = version.replace('v', "");
        if suffix.is_empty() {
            return Err(Error::Validation(format!("Invalid version: {:?}", version)));
        }
        Ok(self.dir.join(format!("{FILE_PREFIX}{suffix}{FILE_SUFFIX}")))
    }

    /// Names of all `.json` files in the directory, sorted
    async fn file_names(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if name.ends_with(FILE_SUFFIX) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Load every stored document, skipping files that fail to load
    async fn stored_documents(&self) -> Result<Vec<PromptDocument>> {
        let mut documents = Vec::new();
        let mut seen = HashSet::new();

        for name in self.file_names().await? {
            let path = self.dir.join(&name);
            match read_document(&path).await {
                Ok(doc) => {
                    if seen.insert(doc.version.clone()) {
                        documents.push(doc);
                    } else {
                        debug!("Skipping duplicate version {} in {}", doc.version, name);
                    }
                }
                Err(e) => warn!("Error loading prompt {}: {}", name, e),
            }
        }

        Ok(documents)
    }

    /// Next `v<N>` above every stored file number and the seed table
    async fn next_version(&self) -> Result<String> {
        let highest = self
            .file_names()
            .await?
            .iter()
            .filter_map(|name| file_version_number(name))
            .fold(SEED_MAX_VERSION, u64::max);
        let next = highest.checked_add(1).ok_or_else(|| {
            Error::Validation(format!("No version number left after v{}", highest))
        })?;
        Ok(format!("v{}", next))
    }

    async fn write_document(&self, path: &Path, doc: &PromptDocument) -> Result<()> {
        let content = serde_json::to_string_pretty(doc)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::Storage(format!("Failed to save prompt: {}", e)))?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| Error::Storage(format!("Failed to save prompt: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl PromptRepository for FilePromptStore {
    async fn list(&self) -> Result<Vec<PromptDocument>> {
        let mut documents = self.stored_documents().await?;
        let taken: HashSet<String> = documents.iter().map(|d| d.version.clone()).collect();

        documents.extend(
            seed_documents()
                .into_iter()
                .filter(|seed| !taken.contains(&seed.version)),
        );
        Ok(documents)
    }

    async fn get(&self, version: &str) -> Result<Option<PromptDocument>> {
        let stored = self
            .stored_documents()
            .await?
            .into_iter()
            .find(|d| d.version == version);
        Ok(stored.or_else(|| seed_document(version)))
    }

    async fn create(
        &self,
        name: &str,
        prompt: &str,
        version: Option<&str>,
    ) -> Result<PromptDocument> {
        let draft = PromptDraft::new(name, prompt)?;
        let _guard = self.write_lock.lock().await;

        let version = match version.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => v.to_string(),
            None => self.next_version().await?,
        };
        let path = self.document_path(&version)?;

        let doc = PromptDocument::new(draft.name, version, draft.prompt);
        self.write_document(&path, &doc).await?;
        info!("Created prompt {} ({})", doc.version, doc.name);
        Ok(doc)
    }

    async fn update(&self, version: &str, name: &str, prompt: &str) -> Result<PromptDocument> {
        let draft = PromptDraft::new(name, prompt)?;
        let path = self.document_path(version)?;
        let _guard = self.write_lock.lock().await;

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(Error::NotFound(format!("Prompt {} not found", version)));
        }

        let doc = PromptDocument::new(draft.name, version, draft.prompt);
        self.write_document(&path, &doc).await?;
        info!("Updated prompt {} ({})", doc.version, doc.name);
        Ok(doc)
    }
}

async fn read_document(path: &Path) -> Result<PromptDocument> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

/// `assistant_12.json` -> `12`
fn file_version_number(name: &str) -> Option<u64> {
    name.strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_SUFFIX)?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (FilePromptStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FilePromptStore::new(temp_dir.path().join("prompts"));
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_fresh_store_lists_seeds() {
        let (store, _temp) = create_test_store();

        let prompts = store.list().await.unwrap();
        let versions: Vec<&str> = prompts.iter().map(|p| p.version.as_str()).collect();
        assert_eq!(versions, ["v1", "v2", "v3", "v4", "v5", "v6", "v7", "v8"]);
    }

    #[tokio::test]
    async fn test_create_assigns_version_after_seeds() {
        let (store, _temp) = create_test_store();

        let created = store.create("Pirate", "Talk like a pirate.", None).await.unwrap();
        assert_eq!(created.version, "v9");
        assert!(store.dir().join("assistant_9.json").exists());

        let next = store.create("Poet", "Answer in verse.", None).await.unwrap();
        assert_eq!(next.version, "v10");
    }

    #[tokio::test]
    async fn test_create_assigns_version_above_stored_files() {
        let (store, _temp) = create_test_store();

        store.create("Custom", "Text", Some("v41")).await.unwrap();
        let created = store.create("Next", "Text", None).await.unwrap();
        assert_eq!(created.version, "v42");
    }

    #[tokio::test]
    async fn test_create_after_largest_version_is_rejected() {
        let (store, _temp) = create_test_store();
        let last = format!("v{}", u64::MAX);

        store.create("Last", "Text", Some(&last)).await.unwrap();
        let result = store.create("Overflow", "Text", None).await;

        assert!(matches!(result, Err(Error::Validation(_))));
        let stored = store.file_names().await.unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn test_create_blank_version_is_derived() {
        let (store, _temp) = create_test_store();

        let created = store.create("Name", "Text", Some("   ")).await.unwrap();
        assert_eq!(created.version, "v9");
    }

    #[tokio::test]
    async fn test_create_rejects_blank_fields() {
        let (store, _temp) = create_test_store();

        let result = store.create("   ", "Text", None).await;
        assert!(matches!(result, Err(Error::Validation(_))));

        let result = store.create("Name", "\n\t", None).await;
        assert!(matches!(result, Err(Error::Validation(_))));

        assert!(!store.dir().exists());
    }

    #[tokio::test]
    async fn test_create_rejects_path_like_version() {
        let (store, _temp) = create_test_store();

        let result = store.create("Name", "Text", Some("../escape")).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_stored_version_shadows_seed() {
        let (store, _temp) = create_test_store();

        store.create("My Assistant", "Custom v1", Some("v1")).await.unwrap();

        let prompts = store.list().await.unwrap();
        let v1: Vec<_> = prompts.iter().filter(|p| p.version == "v1").collect();
        assert_eq!(v1.len(), 1);
        assert_eq!(v1[0].prompt, "Custom v1");
        assert_eq!(prompts.len(), 8);

        let resolved = store.get("v1").await.unwrap().unwrap();
        assert_eq!(resolved.name, "My Assistant");
    }

    #[tokio::test]
    async fn test_get_falls_back_to_seed() {
        let (store, _temp) = create_test_store();

        let doc = store.get("v2").await.unwrap().unwrap();
        assert_eq!(doc.name, "Technical Expert");
        assert!(store.get("v99").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_replaces_document() {
        let (store, _temp) = create_test_store();

        let created = store.create("Draft", "First text", None).await.unwrap();
        let updated = store
            .update(&created.version, " Final ", " Second text ")
            .await
            .unwrap();

        assert_eq!(updated.version, created.version);
        assert_eq!(updated.name, "Final");
        assert_eq!(updated.prompt, "Second text");

        let reloaded = store.get(&created.version).await.unwrap().unwrap();
        assert_eq!(reloaded, updated);
    }

    #[tokio::test]
    async fn test_update_missing_version() {
        let (store, _temp) = create_test_store();

        let result = store.update("v77", "Name", "Text").await;
        assert!(matches!(result, Err(Error::NotFound(_))));

        // Seeds are defaults, not stored documents
        let result = store.update("v3", "Name", "Text").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_rejects_blank_fields() {
        let (store, _temp) = create_test_store();

        let created = store.create("Draft", "Text", None).await.unwrap();
        let result = store.update(&created.version, "Name", "  ").await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_unreadable_document_is_skipped() {
        let (store, _temp) = create_test_store();

        store.create("Good", "Text", None).await.unwrap();
        tokio::fs::write(store.dir().join("assistant_50.json"), "{ not json")
            .await
            .unwrap();

        let prompts = store.list().await.unwrap();
        assert_eq!(prompts.len(), 9);
        assert_eq!(prompts[0].name, "Good");

        // The broken file still reserves its number
        let created = store.create("After", "Text", None).await.unwrap();
        assert_eq!(created.version, "v51");
    }

    #[tokio::test]
    async fn test_persistence_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("prompts");

        {
            let store = FilePromptStore::new(&dir);
            store.create("Persistent", "Survives reload", None).await.unwrap();
        }

        {
            let store = FilePromptStore::new(&dir);
            let doc = store.get("v9").await.unwrap().unwrap();
            assert_eq!(doc.name, "Persistent");
            assert_eq!(doc.prompt, "Survives reload");
        }
    }

    #[test]
    fn test_file_version_number() {
        assert_eq!(file_version_number("assistant_12.json"), Some(12));
        assert_eq!(file_version_number("assistant_beta.json"), None);
        assert_eq!(file_version_number("other_3.json"), None);
    }
}
