//! Prompt evaluation
//!
//! Scoring is opaque to the registry. The shipped evaluator derives a stable
//! score from the version string.

use sha2::{Digest, Sha256};

/// Lowest score the digest evaluator hands out
pub const BASE_SCORE: f64 = 75.0;
const SCORE_SPREAD: u64 = 25;

/// Number of fixtures reported per evaluation
pub const TOTAL_FIXTURES: u32 = 10;

/// Scores a prompt version
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, version: &str) -> f64;
}

/// Deterministic evaluator: a pure function of the version string
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestEvaluator;

impl Evaluator for DigestEvaluator {
    fn evaluate(&self, version: &str) -> f64 {
        let digest = Sha256::digest(version.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        BASE_SCORE + (u64::from_be_bytes(head) % SCORE_SPREAD) as f64
    }
}
