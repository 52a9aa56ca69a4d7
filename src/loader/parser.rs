use serde::de::DeserializeOwned;
use std::fs;

use crate::api::settings_dto::SimulationSettingsDto;
use crate::domain::config::SimulationSettings;
use crate::error::Result;

/// Parses a JSON file into a given type `T`.
///
/// Errors are converted into `crate::error::Error` variants:
/// - `Error::IoError` if the file cannot be read.
/// - `Error::DeserializationError` if the JSON is malformed.
pub fn parse_json_file<T: DeserializeOwned>(file_path: &str) -> Result<T> {
    let data = fs::read_to_string(file_path)?;
    let parsed_data: T = serde_json::from_str(&data)?;
    Ok(parsed_data)
}

/// Loads and validates the simulation settings. Without a file every setting keeps its default.
pub fn load_settings(file_path: Option<&str>) -> Result<SimulationSettings> {
    let dto = match file_path {
        Some(path) => {
            log::info!("Loading simulation settings from '{}'", path);
            parse_json_file::<SimulationSettingsDto>(path)?
        }
        None => SimulationSettingsDto::default(),
    };

    SimulationSettings::try_from(dto)
}
