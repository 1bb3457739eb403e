//! Technology cost data.
//!
//! Raw costs arrive as a long table of `(technology, parameter, value, unit)` rows, in the layout
//! used by public technology-cost databases. The [`normalise`] submodule turns this table into one
//! [`TechnologyCost`] record per technology.
use crate::error::PipelineError;
use crate::id::define_id_type;
use crate::units::{Dimensionless, EmissionsPerEnergy, MoneyPerCapacity, MoneyPerEnergy, Year};
use anyhow::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io::Write;
use strum::{AsRefStr, Display, EnumIter, EnumString};

pub mod normalise;
pub use normalise::{
    CostOptions, CurrencyConversion, FuelLink, check_unit_consistency, fill_defaults, normalise,
    normalise_units, propagate_fuel, validate_costs,
};

define_id_type! {TechnologyID}

/// A map of technology costs, keyed by technology ID
pub type TechnologyCostMap = IndexMap<TechnologyID, TechnologyCost>;

/// A single row of a raw cost table
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CostRow {
    /// The technology this row refers to (e.g. "onwind")
    pub technology: TechnologyID,
    /// The parameter name (e.g. "investment")
    pub parameter: String,
    /// The numeric value, expressed in `unit`
    pub value: f64,
    /// The unit string (e.g. "EUR/kW")
    pub unit: String,
    /// Where the value came from
    #[serde(default)]
    pub source: Option<String>,
    /// Free-text notes
    #[serde(default, rename = "further description")]
    pub description: Option<String>,
}

impl CostRow {
    /// Create a new row with no source or description
    pub fn new(technology: &str, parameter: &str, value: f64, unit: &str) -> Self {
        Self {
            technology: technology.into(),
            parameter: parameter.into(),
            value,
            unit: unit.into(),
            source: None,
            description: None,
        }
    }

    /// The recognised parameter for this row, if any
    pub fn cost_parameter(&self) -> Option<CostParameter> {
        self.parameter.parse().ok()
    }
}

/// A raw cost table, with rows kept in input order
#[derive(PartialEq, Debug, Clone, Default)]
pub struct CostTable(Vec<CostRow>);

impl CostTable {
    /// Create a new table from rows
    pub fn new(rows: Vec<CostRow>) -> Self {
        Self(rows)
    }

    /// Iterate over the rows
    pub fn iter(&self) -> std::slice::Iter<'_, CostRow> {
        self.0.iter()
    }

    /// The number of rows
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Write the table in CSV format
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        for row in &self.0 {
            writer.serialize(row)?;
        }
        writer.flush()?;

        Ok(())
    }
}

impl FromIterator<CostRow> for CostTable {
    fn from_iter<I: IntoIterator<Item = CostRow>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a CostTable {
    type Item = &'a CostRow;
    type IntoIter = std::slice::Iter<'a, CostRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The cost parameters understood by the model.
///
/// The string forms match the parameter names used in the input cost table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, AsRefStr, Display)]
pub enum CostParameter {
    /// Overnight investment cost per unit capacity
    #[strum(serialize = "investment")]
    Investment,
    /// Fixed operation and maintenance cost, in percent of investment per year
    #[strum(serialize = "FOM")]
    FixedOperatingCost,
    /// Variable operation and maintenance cost per unit output
    #[strum(serialize = "VOM")]
    VariableOperatingCost,
    /// Fuel cost per unit of fuel energy
    #[strum(serialize = "fuel")]
    FuelCost,
    /// Output energy per unit input energy
    #[strum(serialize = "efficiency")]
    Efficiency,
    /// Technical lifetime in years
    #[strum(serialize = "lifetime")]
    Lifetime,
    /// Discount rate as a fraction
    #[strum(serialize = "discount rate")]
    DiscountRate,
    /// Emissions per unit of fuel energy
    #[strum(serialize = "CO2 intensity")]
    CO2Intensity,
}

/// The discount rate assumed when neither the cost table nor the model provides one
pub const DEFAULT_DISCOUNT_RATE: f64 = 0.07;

/// The lifetime in years assumed when the cost table doesn't provide one
pub const DEFAULT_LIFETIME: f64 = 25.0;

impl CostParameter {
    /// The value substituted when a technology has no entry for this parameter
    pub fn default_value(self) -> f64 {
        match self {
            Self::Investment
            | Self::FixedOperatingCost
            | Self::VariableOperatingCost
            | Self::FuelCost
            | Self::CO2Intensity => 0.0,
            Self::Efficiency => 1.0,
            Self::Lifetime => DEFAULT_LIFETIME,
            Self::DiscountRate => DEFAULT_DISCOUNT_RATE,
        }
    }
}

/// Complete, normalised cost data for a single technology
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct TechnologyCost {
    /// Investment cost per MW
    pub investment: MoneyPerCapacity,
    /// Fixed operating cost in percent of investment per year
    pub fixed_operating_cost: Dimensionless,
    /// Variable operating cost per MWh of output
    pub variable_operating_cost: MoneyPerEnergy,
    /// Fuel cost per MWh of fuel
    pub fuel_cost: MoneyPerEnergy,
    /// Ratio of output to input energy. Always greater than zero.
    pub efficiency: Dimensionless,
    /// Lifetime in years. Always greater than zero.
    pub lifetime: Year,
    /// Discount rate, in the range `[0, 1)`
    pub discount_rate: Dimensionless,
    /// Emissions per MWh of fuel
    pub co2_intensity: EmissionsPerEnergy,
}

impl Default for TechnologyCost {
    fn default() -> Self {
        Self::from_fn(CostParameter::default_value)
    }
}

impl TechnologyCost {
    /// Build a record by looking up the value of every parameter with `value_of`
    pub fn from_fn<F: FnMut(CostParameter) -> f64>(mut value_of: F) -> Self {
        Self {
            investment: MoneyPerCapacity(value_of(CostParameter::Investment)),
            fixed_operating_cost: Dimensionless(value_of(CostParameter::FixedOperatingCost)),
            variable_operating_cost: MoneyPerEnergy(value_of(
                CostParameter::VariableOperatingCost,
            )),
            fuel_cost: MoneyPerEnergy(value_of(CostParameter::FuelCost)),
            efficiency: Dimensionless(value_of(CostParameter::Efficiency)),
            lifetime: Year(value_of(CostParameter::Lifetime)),
            discount_rate: Dimensionless(value_of(CostParameter::DiscountRate)),
            co2_intensity: EmissionsPerEnergy(value_of(CostParameter::CO2Intensity)),
        }
    }

    /// The value stored for the given parameter
    pub fn get(&self, parameter: CostParameter) -> f64 {
        match parameter {
            CostParameter::Investment => self.investment.value(),
            CostParameter::FixedOperatingCost => self.fixed_operating_cost.value(),
            CostParameter::VariableOperatingCost => self.variable_operating_cost.value(),
            CostParameter::FuelCost => self.fuel_cost.value(),
            CostParameter::Efficiency => self.efficiency.value(),
            CostParameter::Lifetime => self.lifetime.value(),
            CostParameter::DiscountRate => self.discount_rate.value(),
            CostParameter::CO2Intensity => self.co2_intensity.value(),
        }
    }

    /// Fixed operating cost as a fraction of investment per year
    pub fn fixed_cost_fraction(&self) -> Dimensionless {
        self.fixed_operating_cost / Dimensionless(100.0)
    }

    /// Check that every value lies within its domain.
    ///
    /// # Arguments
    ///
    /// * `id` - The technology's ID, used in error messages
    pub fn validate(&self, id: &TechnologyID) -> Result<(), PipelineError> {
        use strum::IntoEnumIterator;

        let invalid = |msg: &str| PipelineError::InvalidParameter(format!("{id}: {msg}"));

        for parameter in CostParameter::iter() {
            if !self.get(parameter).is_finite() {
                return Err(invalid(&format!("{parameter} must be a finite number")));
            }
        }
        if self.efficiency <= Dimensionless(0.0) {
            return Err(invalid("efficiency must be greater than zero"));
        }
        if self.lifetime <= Year(0.0) {
            return Err(invalid("lifetime must be greater than zero"));
        }
        if !(0.0..1.0).contains(&self.discount_rate.value()) {
            return Err(invalid("discount rate must be at least 0 and less than 1"));
        }

        Ok(())
    }
}
