//! Common routines for handling input data.
use crate::config::ModelConfig;
use crate::cost::{TechnologyCostMap, normalise};
use crate::time_series::TimeSeriesSet;
use anyhow::{Context, Result, ensure};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub mod cost;
pub use cost::read_cost_table;
pub mod time_series;
pub use time_series::read_time_series;

/// Read a series of type `T`s from a CSV file.
///
/// Will raise an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec = read_csv_internal(file_path)?;
    ensure!(!vec.is_empty(), "CSV file {} cannot be empty", file_path.display());

    Ok(vec)
}

fn read_csv_internal<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?;

    reader
        .into_deserialize()
        .map(|record| record.with_context(|| input_err_msg(file_path)))
        .collect()
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Format an error message to include the file path
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// All the inputs needed to assemble a model
pub struct ModelInputs {
    /// The model configuration from `model.toml`
    pub config: ModelConfig,
    /// Normalised costs for every technology in the cost table
    pub costs: TechnologyCostMap,
    /// Demand and capacity-factor profiles
    pub time_series: TimeSeriesSet,
}

/// Read and normalise all input files for the model in the specified directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn load_model_inputs<P: AsRef<Path>>(model_dir: P) -> Result<ModelInputs> {
    let model_dir = model_dir.as_ref();
    let config = ModelConfig::from_path(model_dir)?;

    let cost_path = model_dir.join(&config.cost_file);
    let table = read_cost_table(&cost_path)?;
    let costs = normalise(&table, &config.cost_options())
        .with_context(|| format!("Could not normalise costs from {}", cost_path.display()))?;

    let mut time_series = match &config.time_series_file {
        Some(file_name) => read_time_series(&model_dir.join(file_name), &config.profile_kinds())?,
        None => TimeSeriesSet::default(),
    };
    if let Some(n) = config.resample {
        time_series = time_series.resample(n)?;
    }

    Ok(ModelInputs {
        config,
        costs,
        time_series,
    })
}
