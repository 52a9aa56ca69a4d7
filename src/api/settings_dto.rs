use serde::Deserialize;

use crate::domain::canal::codec::WireFormat;
use crate::domain::config::{FatalPolicy, PassageRule};

/// Raw form of the optional `--config` JSON file. Every field may be left
/// out; missing fields take the defaults below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationSettingsDto {
    pub min_sleep_ms: u64,
    pub max_sleep_ms: u64,
    pub min_cargo_weight: u32,
    pub max_cargo_weight: u32,
    pub seed: Option<u64>,
    pub crane_count: Option<usize>,
    pub passage_rule: PassageRule,
    pub wire_format: WireFormat,
    pub statistics_file: Option<String>,
    pub fatal_policy: FatalPolicy,
}

impl Default for SimulationSettingsDto {
    fn default() -> Self {
        Self {
            min_sleep_ms: 5,
            max_sleep_ms: 3000,
            min_cargo_weight: 5,
            max_cargo_weight: 50,
            seed: None,
            crane_count: None,
            passage_rule: PassageRule::default(),
            wire_format: WireFormat::default(),
            statistics_file: None,
            fatal_policy: FatalPolicy::default(),
        }
    }
}
