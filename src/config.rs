//! Defines the `ModelConfig` struct, which represents the contents of `model.toml`.
use crate::cost::{CostOptions, CurrencyConversion, FuelLink};
use crate::input::time_series::parse_timestamp;
use crate::input::{input_err_msg, read_toml};
use crate::network::{
    AssemblyConfig, BusConfig, EmissionsCapConfig, LineConfig, TechnologyConfig, TechnologyKind,
};
use crate::time_series::{ProfileKind, Snapshots};
use crate::units::Hours;
use anyhow::{Context, Result, bail, ensure};
use chrono::TimeDelta;
use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::Deserialize;
use std::path::Path;

const MODEL_CONFIG_FILE_NAME: &str = "model.toml";

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_param_default!(default_cost_file, String, "costs.csv".into());
define_param_default!(default_resolution_minutes, u32, 60);

/// The model's time index, as written in `model.toml`
#[derive(Debug, Deserialize, PartialEq)]
pub struct SnapshotConfig {
    /// Time stamp of the first snapshot
    pub start: String,
    /// Spacing between snapshots in minutes
    #[serde(default = "default_resolution_minutes")]
    pub resolution_minutes: u32,
    /// Number of snapshots
    pub count: usize,
    /// Hours represented by each snapshot. Defaults to the resolution.
    pub weight: Option<f64>,
}

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq)]
pub struct ModelConfig {
    /// Path to the raw cost table, relative to the model directory
    #[serde(default = "default_cost_file")]
    pub cost_file: String,
    /// Path to the time series file, relative to the model directory
    pub time_series_file: Option<String>,
    /// Discount rate for technologies which don't specify one
    pub default_discount_rate: Option<f64>,
    /// Keep only every `n`th snapshot and time series point
    pub resample: Option<usize>,
    /// The model's time index
    pub snapshots: SnapshotConfig,
    /// Currency conversions applied to the cost table
    #[serde(default)]
    pub currency_conversions: Vec<CurrencyConversion>,
    /// Fuel data to copy between technologies
    #[serde(default)]
    pub fuel_links: Vec<FuelLink>,
    /// Buses
    #[serde(default)]
    pub buses: Vec<BusConfig>,
    /// Generators and storage units
    #[serde(default)]
    pub technologies: Vec<TechnologyConfig>,
    /// Transmission lines
    #[serde(default)]
    pub lines: Vec<LineConfig>,
    /// Emissions caps
    #[serde(default)]
    pub emissions_caps: Vec<EmissionsCapConfig>,
}

/// Check that the `default_discount_rate` parameter is valid
fn check_default_discount_rate(value: Option<f64>) -> Result<()> {
    if let Some(value) = value {
        ensure!(
            (0.0..1.0).contains(&value),
            "default_discount_rate must be at least zero and less than one"
        );
    }

    Ok(())
}

/// Check that the `resample` parameter is valid
fn check_resample(value: Option<usize>) -> Result<()> {
    ensure!(value != Some(0), "resample cannot be zero");

    Ok(())
}

/// Check that the `snapshots` section is valid
fn check_snapshots(snapshots: &SnapshotConfig) -> Result<()> {
    parse_timestamp(&snapshots.start).context("Invalid value for snapshots.start")?;
    ensure!(snapshots.count > 0, "snapshots.count cannot be zero");
    ensure!(
        snapshots.resolution_minutes > 0,
        "snapshots.resolution_minutes cannot be zero"
    );
    if let Some(weight) = snapshots.weight {
        ensure!(
            weight.is_finite() && weight > 0.0,
            "snapshots.weight must be a finite number greater than zero"
        );
    }

    Ok(())
}

impl ModelConfig {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelConfig`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelConfig> {
        let file_path = model_dir.as_ref().join(MODEL_CONFIG_FILE_NAME);
        let config: ModelConfig = read_toml(&file_path)?;

        config
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(config)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        ensure!(!self.cost_file.is_empty(), "cost_file cannot be empty");
        check_default_discount_rate(self.default_discount_rate)?;
        check_resample(self.resample)?;
        check_snapshots(&self.snapshots)?;
        ensure!(!self.buses.is_empty(), "At least one bus must be defined");

        // Also checks that no profile is used as two different kinds
        let profile_kinds = self.try_profile_kinds()?;
        ensure!(
            profile_kinds.is_empty() || self.time_series_file.is_some(),
            "time_series_file must be given when demand or capacity-factor profiles are used"
        );

        Ok(())
    }

    /// Options for normalising the cost table
    pub fn cost_options(&self) -> CostOptions {
        CostOptions {
            currency_conversions: self.currency_conversions.clone(),
            fuel_links: self.fuel_links.clone(),
            default_discount_rate: self.default_discount_rate,
        }
    }

    /// The time series columns used by the model and the kind of profile each holds
    pub fn profile_kinds(&self) -> IndexMap<String, ProfileKind> {
        // Conflicts are rejected when the file is read
        self.try_profile_kinds().unwrap_or_default()
    }

    fn try_profile_kinds(&self) -> Result<IndexMap<String, ProfileKind>> {
        let demand = self
            .buses
            .iter()
            .filter_map(|bus| bus.demand.as_ref())
            .map(|name| (name, ProfileKind::Demand));
        let capacity_factor = self
            .technologies
            .iter()
            .filter(|tech| tech.kind == TechnologyKind::Variable)
            .filter_map(|tech| tech.profile.as_ref())
            .map(|name| (name, ProfileKind::CapacityFactor));

        let mut kinds = IndexMap::new();
        for (name, kind) in demand.chain(capacity_factor) {
            match kinds.entry(name.clone()) {
                Entry::Vacant(entry) => {
                    entry.insert(kind);
                }
                Entry::Occupied(entry) => {
                    if *entry.get() != kind {
                        bail!("Time series {name} is used as both {:?} and {kind:?}", entry.get());
                    }
                }
            }
        }

        Ok(kinds)
    }

    /// The model's snapshots, after any resampling
    pub fn snapshots(&self) -> Result<Snapshots> {
        let config = &self.snapshots;
        let start = parse_timestamp(&config.start)?;
        let resolution = TimeDelta::minutes(config.resolution_minutes.into());
        let weight = config
            .weight
            .unwrap_or(f64::from(config.resolution_minutes) / 60.0);
        let snapshots = Snapshots::new(start, resolution, config.count, Hours(weight))?;

        Ok(match self.resample {
            Some(n) => snapshots.resample(n)?,
            None => snapshots,
        })
    }

    /// The user choices needed to assemble the model
    pub fn assembly_config(&self) -> Result<AssemblyConfig> {
        Ok(AssemblyConfig {
            snapshots: self.snapshots()?,
            buses: self.buses.clone(),
            technologies: self.technologies.clone(),
            lines: self.lines.clone(),
            emissions_caps: self.emissions_caps.clone(),
        })
    }
}
