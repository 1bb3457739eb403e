//! Turns a raw cost table into complete, validated [`TechnologyCost`] records.
//!
//! The steps are applied in this order by [`normalise`]:
//!
//! 1. Unit normalisation ([`normalise_units`]): per-kW values become per-MW and optional currency
//!    conversions are applied.
//! 2. A consistency check on the units of each technology ([`check_unit_consistency`]).
//! 3. Default filling ([`fill_defaults`]).
//! 4. Copying fuel costs and emissions from fuel technologies ([`propagate_fuel`]).
//! 5. Validation of parameter domains ([`validate_costs`]).
use super::{CostParameter, CostRow, CostTable, TechnologyCost, TechnologyCostMap, TechnologyID};
use crate::error::PipelineError;
use crate::units::Dimensionless;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// The unit fragment denoting a cost per kilowatt (or kilowatt-hour)
const SMALL_CAPACITY_UNIT: &str = "/kW";

/// The unit fragment which [`SMALL_CAPACITY_UNIT`] is rewritten to
const CANONICAL_CAPACITY_UNIT: &str = "/MW";

/// The capacity basis all values must share after normalisation
const CANONICAL_CAPACITY_BASIS: char = 'M';

/// The ratio between a per-kW and a per-MW value
const KW_PER_MW: f64 = 1e3;

/// A conversion between two currencies, applied to units starting with `from`
#[derive(PartialEq, Debug, Clone, Deserialize)]
pub struct CurrencyConversion {
    /// The currency to convert from (e.g. "USD")
    pub from: String,
    /// The currency to convert to (e.g. "EUR")
    pub to: String,
    /// Units of `to` per unit of `from`
    pub rate: f64,
}

/// Instruction to copy fuel data from one technology to another
#[derive(PartialEq, Debug, Clone, Deserialize)]
pub struct FuelLink {
    /// The technology receiving the fuel data (e.g. "OCGT")
    pub technology: TechnologyID,
    /// The fuel technology supplying it (e.g. "gas")
    pub fuel: TechnologyID,
}

/// Options controlling cost normalisation
#[derive(PartialEq, Debug, Clone, Default)]
pub struct CostOptions {
    /// Currency conversions to apply
    pub currency_conversions: Vec<CurrencyConversion>,
    /// Fuel data to copy between technologies
    pub fuel_links: Vec<FuelLink>,
    /// Overrides the built-in default discount rate
    pub default_discount_rate: Option<f64>,
}

/// Run every normalisation step on a raw cost table.
///
/// # Returns
///
/// Validated costs for every technology in `table`, in order of first appearance.
pub fn normalise(
    table: &CostTable,
    options: &CostOptions,
) -> Result<TechnologyCostMap, PipelineError> {
    let table = normalise_units(table, &options.currency_conversions)?;
    check_unit_consistency(&table)?;
    let costs = fill_defaults(&table, options.default_discount_rate);
    let costs = propagate_fuel(&costs, &options.fuel_links)?;
    validate_costs(&costs)?;

    debug!("Normalised costs for {} technologies", costs.len());

    Ok(costs)
}

/// Rescale per-kW values to per-MW and apply currency conversions.
///
/// Detection is based purely on the unit string, so running this on already normalised data
/// leaves it unchanged. At most one conversion is applied to each row, and a conversion may not
/// produce a currency which another conversion converts from.
pub fn normalise_units(
    table: &CostTable,
    conversions: &[CurrencyConversion],
) -> Result<CostTable, PipelineError> {
    for conversion in conversions {
        check_conversion(conversion)?;
        if let Some(next) = conversions
            .iter()
            .find(|other| conversion.to.starts_with(&other.from))
        {
            return Err(PipelineError::InvalidParameter(format!(
                "Currency conversions cannot be chained: {} to {} is followed by {} to {}",
                conversion.from, conversion.to, next.from, next.to
            )));
        }
    }

    Ok(table
        .iter()
        .map(|row| normalise_row(row, conversions))
        .collect())
}

fn check_conversion(conversion: &CurrencyConversion) -> Result<(), PipelineError> {
    if conversion.from.is_empty() || conversion.to.starts_with(&conversion.from) {
        return Err(PipelineError::InvalidParameter(format!(
            "Cannot convert currency {} to {}",
            conversion.from, conversion.to
        )));
    }
    if !(conversion.rate.is_finite() && conversion.rate > 0.0) {
        return Err(PipelineError::InvalidParameter(format!(
            "Exchange rate for {} must be a positive number",
            conversion.from
        )));
    }

    Ok(())
}

fn normalise_row(row: &CostRow, conversions: &[CurrencyConversion]) -> CostRow {
    let mut row = row.clone();

    if row.unit.contains(SMALL_CAPACITY_UNIT) {
        row.value *= KW_PER_MW;
        row.unit = row
            .unit
            .replace(SMALL_CAPACITY_UNIT, CANONICAL_CAPACITY_UNIT);
    }

    for conversion in conversions {
        if let Some(rest) = row.unit.strip_prefix(&conversion.from) {
            row.value *= conversion.rate;
            row.unit = format!("{}{rest}", conversion.to);
            break;
        }
    }

    row
}

/// Get the prefix letter of the capacity unit a unit string is expressed per, if any.
///
/// For example, "EUR/MWh" gives `Some('M')` and "%/year" gives `None`.
fn capacity_basis(unit: &str) -> Option<char> {
    unit.split('/').skip(1).find_map(|denominator| {
        let mut chars = denominator.chars();
        match (chars.next(), chars.next()) {
            (Some('W'), _) => Some(' '),
            (Some(prefix @ ('k' | 'M' | 'G' | 'T')), Some('W')) => Some(prefix),
            _ => None,
        }
    })
}

fn describe_basis(basis: char) -> String {
    format!("/{}W", basis.to_string().trim())
}

/// Check that units are consistent within each technology.
///
/// Every capacity-based unit must be per MW, and no (technology, parameter) pair may appear more
/// than once. Duplicates with differing units raise [`PipelineError::InconsistentUnit`] as it is
/// impossible to know which is intended; duplicates with identical units are rejected as
/// [`PipelineError::InvalidParameter`].
pub fn check_unit_consistency(table: &CostTable) -> Result<(), PipelineError> {
    let mut bases: IndexMap<&TechnologyID, char> = IndexMap::new();
    let mut seen: HashMap<(&TechnologyID, &str), &str> = HashMap::new();

    for row in table {
        if let Some(basis) = capacity_basis(&row.unit) {
            let first = *bases.entry(&row.technology).or_insert(basis);
            if first != basis {
                return Err(PipelineError::InconsistentUnit {
                    technology: row.technology.to_string(),
                    message: format!(
                        "mixes capacity bases {} and {}",
                        describe_basis(first),
                        describe_basis(basis)
                    ),
                });
            }
        }

        match seen.entry((&row.technology, row.parameter.as_str())) {
            Entry::Vacant(entry) => {
                entry.insert(row.unit.as_str());
            }
            Entry::Occupied(entry) if *entry.get() != row.unit => {
                return Err(PipelineError::InconsistentUnit {
                    technology: row.technology.to_string(),
                    message: format!(
                        "{} given in both {} and {}",
                        row.parameter,
                        entry.get(),
                        row.unit
                    ),
                });
            }
            Entry::Occupied(_) => {
                return Err(PipelineError::InvalidParameter(format!(
                    "{}: more than one value given for {}",
                    row.technology, row.parameter
                )));
            }
        }
    }

    for (technology, basis) in bases {
        if basis != CANONICAL_CAPACITY_BASIS {
            return Err(PipelineError::InconsistentUnit {
                technology: technology.to_string(),
                message: format!(
                    "capacity basis {} is not supported; expected {}",
                    describe_basis(basis),
                    describe_basis(CANONICAL_CAPACITY_BASIS)
                ),
            });
        }
    }

    Ok(())
}

/// Build a [`TechnologyCost`] for every technology in the table, substituting defaults for
/// missing parameters.
///
/// Values present in the table are never replaced. Rows with unrecognised parameter names are
/// ignored. If a parameter appears more than once, the first value is used.
///
/// # Arguments
///
/// * `table` - A unit-normalised cost table
/// * `default_discount_rate` - Overrides the built-in default discount rate, if provided
pub fn fill_defaults(table: &CostTable, default_discount_rate: Option<f64>) -> TechnologyCostMap {
    let mut values: IndexMap<&TechnologyID, HashMap<CostParameter, f64>> = IndexMap::new();
    for row in table {
        let params = values.entry(&row.technology).or_default();
        match row.cost_parameter() {
            Some(parameter) => {
                params.entry(parameter).or_insert(row.value);
            }
            None => debug!(
                "Ignoring unused parameter {} for technology {}",
                row.parameter, row.technology
            ),
        }
    }

    values
        .into_iter()
        .map(|(id, params)| {
            let cost = TechnologyCost::from_fn(|parameter| {
                params.get(&parameter).copied().unwrap_or_else(|| {
                    match (parameter, default_discount_rate) {
                        (CostParameter::DiscountRate, Some(rate)) => rate,
                        _ => parameter.default_value(),
                    }
                })
            });
            (id.clone(), cost)
        })
        .collect()
}

/// Copy fuel cost and CO2 intensity from fuel technologies into the technologies consuming them.
///
/// Values are always read from `costs` as supplied, so the result does not depend on the order
/// of `links`. Each receiving technology gets its own copy of the values.
pub fn propagate_fuel(
    costs: &TechnologyCostMap,
    links: &[FuelLink],
) -> Result<TechnologyCostMap, PipelineError> {
    let mut out = costs.clone();
    for link in links {
        let fuel = costs
            .get(&link.fuel)
            .ok_or_else(|| PipelineError::missing("fuel technology", link.fuel.to_string()))?;
        let technology = out
            .get_mut(&link.technology)
            .ok_or_else(|| PipelineError::missing("technology", link.technology.to_string()))?;

        technology.fuel_cost = fuel.fuel_cost;
        technology.co2_intensity = fuel.co2_intensity;
        debug!(
            "Copied fuel data from {} to {} (fuel cost: {}, CO2 intensity: {})",
            link.fuel, link.technology, fuel.fuel_cost, fuel.co2_intensity
        );
    }

    Ok(out)
}

/// Check that every technology's parameters lie within their domains
pub fn validate_costs(costs: &TechnologyCostMap) -> Result<(), PipelineError> {
    for (id, cost) in costs {
        cost.validate(id)?;
        if cost.fixed_operating_cost < Dimensionless(0.0) {
            warn!("Technology {id} has a negative fixed operating cost");
        }
    }

    Ok(())
}
