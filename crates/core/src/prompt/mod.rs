//! Prompt module
//!
//! Versioned prompt documents, their file-backed store and the built-in seeds.

mod file_store;
mod model;
mod repository;
mod seed;

pub use file_store::FilePromptStore;
pub use model::*;
pub use repository::PromptRepository;
pub use seed::{seed_document, seed_documents, DEFAULT_INSTRUCTION, INITIAL_PROMPTS, SEED_MAX_VERSION};
