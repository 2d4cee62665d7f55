//! Match configuration
//!
//! Loaded from JSON by whatever drives the engine. Everything that affects
//! the outcome of a match lives here or in the map, so the pair is hashed
//! into the replay header.

use crate::ledger::LedgerConfig;
use crate::models::map::MapError;
use crate::models::robot::RobotKind;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid map: {0}")]
    Map(#[from] MapError),
}

fn default_starting_resources() -> u64 {
    200
}

/// Match settings
///
/// # Example
/// ```
/// use arena_simulator_core_rs::scheduler::MatchConfig;
/// use arena_simulator_core_rs::RobotKind;
///
/// let config = MatchConfig::from_json(r#"{
///     "max_rounds": 50,
///     "ledger": { "capacity": 30 },
///     "compute_budgets": { "Miner": 500 }
/// }"#).unwrap();
///
/// assert_eq!(config.compute_budget(RobotKind::Miner), 500);
/// assert_eq!(config.compute_budget(RobotKind::Hq), RobotKind::Hq.default_compute_budget());
/// assert_eq!(config.config_hash().unwrap().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Number of playable rounds (must be positive)
    pub max_rounds: u32,

    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Per-kind compute budget overrides
    #[serde(default)]
    pub compute_budgets: BTreeMap<RobotKind, u64>,

    /// Resources each competing team starts with
    #[serde(default = "default_starting_resources")]
    pub starting_resources: u64,

    /// Resources granted to each competing team at the end of every round
    #[serde(default)]
    pub resource_income: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_rounds: 100,
            ledger: LedgerConfig::default(),
            compute_budgets: BTreeMap::new(),
            starting_resources: default_starting_resources(),
            resource_income: 0,
        }
    }
}

impl MatchConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: MatchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rounds == 0 {
            return Err(ConfigError::Invalid("max_rounds must be positive".into()));
        }
        if self.ledger.capacity == 0 {
            return Err(ConfigError::Invalid("ledger capacity must be positive".into()));
        }
        if let Some((kind, _)) = self.compute_budgets.iter().find(|(_, budget)| **budget == 0) {
            return Err(ConfigError::Invalid(format!(
                "compute budget for {kind} must be positive"
            )));
        }
        Ok(())
    }

    /// Compute allowed per turn for robots of `kind`
    pub fn compute_budget(&self, kind: RobotKind) -> u64 {
        self.compute_budgets
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.default_compute_budget())
    }

    /// SHA-256 of the canonical JSON form of this configuration
    pub fn config_hash(&self) -> Result<String, ConfigError> {
        canonical_hash(self)
    }
}

/// SHA-256 over JSON with every object's keys sorted
///
/// Equal values hash equally regardless of field or map ordering.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<String, ConfigError> {
    use serde_json::Value;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(serde_json::to_value(value)?))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
