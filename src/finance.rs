//! General functions related to finance.
//!
//! Everything here is a pure function of a single technology's costs, so derived values for
//! different technologies can be calculated independently.
use crate::cost::{TechnologyCost, TechnologyCostMap, TechnologyID};
use crate::units::{Dimensionless, EmissionsPerEnergy, MoneyPerCapacity, MoneyPerEnergy, Year};
use indexmap::IndexMap;
use serde::Serialize;

/// Calculates the annuity factor (capital recovery factor) for a discount rate and lifetime.
///
/// This is the fraction of an upfront investment which must be charged each year so that the
/// investment is recovered over `lifetime` years. For a zero discount rate, this is simply
/// `1 / lifetime`.
pub fn annuity_factor(discount_rate: Dimensionless, lifetime: Year) -> Dimensionless {
    if discount_rate == Dimensionless(0.0) {
        return Dimensionless(1.0) / lifetime;
    }

    // 1 - (1 + r)^-n, written so that it stays accurate for tiny rates
    let (rate, years) = (discount_rate.value(), lifetime.value());
    let denominator = -(-years * rate.ln_1p()).exp_m1();
    Dimensionless(rate / denominator)
}

/// Calculates the short-run marginal cost of producing one unit of output
pub fn marginal_cost(
    variable_operating_cost: MoneyPerEnergy,
    fuel_cost: MoneyPerEnergy,
    efficiency: Dimensionless,
) -> MoneyPerEnergy {
    variable_operating_cost + fuel_cost / efficiency
}

/// Calculates the annualised capital cost per unit capacity, including fixed operating costs
pub fn annualised_capital_cost(
    annuity: Dimensionless,
    fixed_cost_fraction: Dimensionless,
    investment: MoneyPerCapacity,
) -> MoneyPerCapacity {
    (annuity + fixed_cost_fraction) * investment
}

/// Economic parameters derived from a technology's costs
#[derive(PartialEq, Debug, Clone, Copy, Serialize)]
pub struct DerivedEconomics {
    /// Annuity factor
    pub annuity: Dimensionless,
    /// Cost per MWh of output
    pub marginal_cost: MoneyPerEnergy,
    /// Cost per MW of capacity per year
    pub capital_cost: MoneyPerCapacity,
    /// Emissions per MWh of output
    pub emission_factor: EmissionsPerEnergy,
}

impl DerivedEconomics {
    /// Derive economic parameters from a technology's costs
    pub fn from_cost(cost: &TechnologyCost) -> Self {
        let annuity = annuity_factor(cost.discount_rate, cost.lifetime);
        Self {
            annuity,
            marginal_cost: marginal_cost(
                cost.variable_operating_cost,
                cost.fuel_cost,
                cost.efficiency,
            ),
            capital_cost: annualised_capital_cost(
                annuity,
                cost.fixed_cost_fraction(),
                cost.investment,
            ),
            emission_factor: cost.co2_intensity / cost.efficiency,
        }
    }
}

/// Derive economic parameters for every technology
pub fn derive_economics(costs: &TechnologyCostMap) -> IndexMap<TechnologyID, DerivedEconomics> {
    costs
        .iter()
        .map(|(id, cost)| (id.clone(), DerivedEconomics::from_cost(cost)))
        .collect()
}
