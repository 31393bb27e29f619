//! Registry model definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Deployment environment with its own active prompt pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Staging,
    #[serde(alias = "prod")]
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            other => Err(Error::InvalidEnvironment(other.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Active version per environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveVersions {
    pub staging: Option<String>,
    pub production: Option<String>,
}

impl ActiveVersions {
    pub fn get(&self, environment: Environment) -> Option<&str> {
        match environment {
            Environment::Staging => self.staging.as_deref(),
            Environment::Production => self.production.as_deref(),
        }
    }

    pub fn set(&mut self, environment: Environment, version: Option<String>) {
        match environment {
            Environment::Staging => self.staging = version,
            Environment::Production => self.production = version,
        }
    }
}

/// Summary of one evaluation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalSummary {
    pub prompt_name: String,
    pub prompt_version: String,
    pub average_score: f64,
    pub total_fixtures: u32,
    pub results: Vec<serde_json::Value>,
}

/// Outcome of recording an evaluation score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalReport {
    pub version: String,
    pub score: f64,
    pub summary: EvalSummary,
}
