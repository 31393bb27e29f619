//! Registry module
//!
//! Active prompt versions per environment, evaluation scores and promotion.

mod evaluator;
mod model;
mod versions;

pub use evaluator::{DigestEvaluator, Evaluator, BASE_SCORE, TOTAL_FIXTURES};
pub use model::*;
pub use versions::{InstructionSink, VersionRegistry, SYSTEM_ROLE};
