//! Core library for Promptline
//!
//! This crate contains the prompt lifecycle logic:
//! - Versioned prompt documents persisted one file per version
//! - The built-in seed prompts
//! - Active version per environment and the score-gated promotion

pub mod error;
pub mod prompt;
pub mod registry;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
