use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::api::settings_dto::SimulationSettingsDto;
use crate::domain::canal::codec::WireFormat;
use crate::domain::canal::protocol::PortSide;
use crate::error::{Error, Result};

pub const MIN_NUMBER_OF_VESSELS: usize = 2;
pub const MAX_NUMBER_OF_VESSELS: usize = 50;

/// Rule the Destination Port applies to a passage request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassageRule {
    /// Passage is denied unless the vessel count is prime.
    #[default]
    Prime,
    /// Every request is approved.
    Unrestricted,
}

/// What a worker does when it hits a fatal protocol violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatalPolicy {
    /// Log and terminate the process immediately.
    #[default]
    Abort,
    /// Log and record the failure in the port report.
    Report,
}

/// Validated simulation settings shared by both ports.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
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

impl Default for SimulationSettings {
    fn default() -> Self {
        let dto = SimulationSettingsDto::default();
        SimulationSettings {
            min_sleep_ms: dto.min_sleep_ms,
            max_sleep_ms: dto.max_sleep_ms,
            min_cargo_weight: dto.min_cargo_weight,
            max_cargo_weight: dto.max_cargo_weight,
            seed: dto.seed,
            crane_count: dto.crane_count,
            passage_rule: dto.passage_rule,
            wire_format: dto.wire_format,
            statistics_file: dto.statistics_file,
            fatal_policy: dto.fatal_policy,
        }
    }
}

impl TryFrom<SimulationSettingsDto> for SimulationSettings {
    type Error = Error;

    fn try_from(dto: SimulationSettingsDto) -> Result<Self> {
        if dto.min_sleep_ms > dto.max_sleep_ms {
            return Err(Error::InvalidConfiguration(format!(
                "minSleepMs ({}) is larger than maxSleepMs ({})",
                dto.min_sleep_ms, dto.max_sleep_ms
            )));
        }

        if dto.min_cargo_weight > dto.max_cargo_weight {
            return Err(Error::InvalidConfiguration(format!(
                "minCargoWeight ({}) is larger than maxCargoWeight ({})",
                dto.min_cargo_weight, dto.max_cargo_weight
            )));
        }

        if dto.crane_count == Some(0) {
            return Err(Error::InvalidConfiguration("craneCount must be positive".to_string()));
        }

        Ok(SimulationSettings {
            min_sleep_ms: dto.min_sleep_ms,
            max_sleep_ms: dto.max_sleep_ms,
            min_cargo_weight: dto.min_cargo_weight,
            max_cargo_weight: dto.max_cargo_weight,
            seed: dto.seed,
            crane_count: dto.crane_count,
            passage_rule: dto.passage_rule,
            wire_format: dto.wire_format,
            statistics_file: dto.statistics_file,
            fatal_policy: dto.fatal_policy,
        })
    }
}

impl SimulationSettings {
    /// Each port writes its own statistics file: `stats.csv` becomes `stats_origin.csv` and `stats_destination.csv`.
    pub fn statistics_file_for(&self, port: PortSide) -> Option<String> {
        let path = Path::new(self.statistics_file.as_deref()?);
        let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let suffix = match port {
            PortSide::Origin => "origin",
            PortSide::Destination => "destination",
        };

        let file_name = match path.extension() {
            Some(ext) => format!("{}_{}.{}", stem, suffix, ext.to_string_lossy()),
            None => format!("{}_{}", stem, suffix),
        };
        Some(path.with_file_name(file_name).to_string_lossy().into_owned())
    }
}

pub fn validate_vessel_count(vessel_count: usize) -> Result<usize> {
    if !(MIN_NUMBER_OF_VESSELS..=MAX_NUMBER_OF_VESSELS).contains(&vessel_count) {
        return Err(Error::InvalidConfiguration(format!(
            "number of vessels must be between {}-{}, got {}",
            MIN_NUMBER_OF_VESSELS, MAX_NUMBER_OF_VESSELS, vessel_count
        )));
    }
    Ok(vessel_count)
}

/// Vessel and crane counts of one run. Fixed once the handshake is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    vessel_count: usize,
    crane_count: usize,
}

impl RunConfig {
    pub fn new(vessel_count: usize, crane_count: usize) -> Result<Self> {
        if vessel_count == 0 || crane_count == 0 {
            return Err(Error::InvalidConfiguration(format!(
                "vessel count ({}) and crane count ({}) must be positive",
                vessel_count, crane_count
            )));
        }

        if vessel_count % crane_count != 0 {
            return Err(Error::InvalidConfiguration(format!(
                "crane count {} does not divide vessel count {}",
                crane_count, vessel_count
            )));
        }

        Ok(RunConfig { vessel_count, crane_count })
    }

    pub fn vessel_count(&self) -> usize {
        self.vessel_count
    }

    pub fn crane_count(&self) -> usize {
        self.crane_count
    }

    /// Number of stations in the quay, which is also the size of every batch.
    pub fn quay_size(&self) -> usize {
        self.crane_count
    }

    pub fn batch_count(&self) -> usize {
        self.vessel_count / self.crane_count
    }
}
