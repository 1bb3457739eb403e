//! Fixtures for tests

use crate::cost::{TechnologyCost, TechnologyCostMap};
use crate::network::{
    AssemblyConfig, BusConfig, CapacityBound, EmissionsCapConfig, GeneratorParams,
    TechnologyConfig, TechnologyKind,
};
use crate::time_series::{ProfileKind, Snapshots, TimeSeriesProfile, TimeSeriesSet};
use crate::units::{
    Capacity, Dimensionless, EmissionsPerEnergy, MoneyPerCapacity, MoneyPerEnergy, Year,
};
use chrono::{NaiveDate, NaiveDateTime};
use indexmap::indexmap;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Assert that a [`crate::error::PipelineError`] matching the given pattern occurs
macro_rules! assert_pipeline_error {
    ($result:expr, $pattern:pat) => {{
        let result = $result;
        assert!(
            matches!(result, Err($pattern)),
            "Unexpected result: {:?}",
            result.map(|_| ())
        );
    }};
}
pub(crate) use assert_pipeline_error;

/// Hourly wind capacity factors for a single day
const WIND_CAPACITY_FACTORS: [f64; 24] = [
    0.62, 0.65, 0.66, 0.64, 0.6, 0.55, 0.48, 0.4, 0.33, 0.28, 0.25, 0.22, 0.2, 0.21, 0.24, 0.3,
    0.36, 0.42, 0.47, 0.5, 0.54, 0.57, 0.59, 0.61,
];

#[fixture]
pub fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2015, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

#[fixture]
pub fn generator() -> GeneratorParams {
    GeneratorParams {
        technology: "OCGT".into(),
        bus: "bus".into(),
        kind: TechnologyKind::Dispatchable,
        capacity: CapacityBound::Fixed(Capacity(100.0)),
        availability: None,
        marginal_cost: MoneyPerEnergy(0.0),
        capital_cost: MoneyPerCapacity(0.0),
        emission_factor: EmissionsPerEnergy(0.0),
    }
}

#[fixture]
pub fn technology_costs() -> TechnologyCostMap {
    indexmap! {
        "OCGT".into() => TechnologyCost {
            investment: MoneyPerCapacity(400_000.0),
            fixed_operating_cost: Dimensionless(1.8),
            variable_operating_cost: MoneyPerEnergy(4.5),
            fuel_cost: MoneyPerEnergy(20.0),
            efficiency: Dimensionless(0.4),
            co2_intensity: EmissionsPerEnergy(0.2),
            ..Default::default()
        },
        "onwind".into() => TechnologyCost {
            investment: MoneyPerCapacity(1_100_000.0),
            fixed_operating_cost: Dimensionless(1.2),
            variable_operating_cost: MoneyPerEnergy(1.5),
            lifetime: Year(30.0),
            ..Default::default()
        },
        "battery inverter".into() => TechnologyCost {
            investment: MoneyPerCapacity(160_000.0),
            fixed_operating_cost: Dimensionless(0.3),
            efficiency: Dimensionless(0.9),
            lifetime: Year(10.0),
            ..Default::default()
        },
        "battery storage".into() => TechnologyCost {
            investment: MoneyPerCapacity(140_000.0),
            lifetime: Year(15.0),
            ..Default::default()
        },
    }
}

#[fixture]
pub fn time_series(start_time: NaiveDateTime) -> TimeSeriesSet {
    let snapshots = Snapshots::hourly(start_time, 24).unwrap();
    let load = (0..24)
        .map(|hour| if (7..22).contains(&hour) { 500.0 } else { 350.0 })
        .collect();
    let load =
        TimeSeriesProfile::over_snapshots("load", ProfileKind::Demand, &snapshots, load).unwrap();
    let onwind = TimeSeriesProfile::over_snapshots(
        "onwind",
        ProfileKind::CapacityFactor,
        &snapshots,
        WIND_CAPACITY_FACTORS.to_vec(),
    )
    .unwrap();

    TimeSeriesSet::from_profiles([load, onwind]).unwrap()
}

fn technology(technology: &str, kind: TechnologyKind) -> TechnologyConfig {
    TechnologyConfig {
        name: None,
        technology: technology.into(),
        kind,
        bus: "electricity".into(),
        capacity: None,
        extendable: true,
        min_capacity: None,
        max_capacity: None,
        profile: None,
        max_hours: None,
        efficiency_store: None,
        efficiency_dispatch: None,
        cyclic_state_of_charge: true,
        energy_technology: None,
    }
}

#[fixture]
pub fn assembly_config(start_time: NaiveDateTime) -> AssemblyConfig {
    AssemblyConfig {
        snapshots: Snapshots::hourly(start_time, 24).unwrap(),
        buses: vec![BusConfig {
            id: "electricity".into(),
            demand: Some("load".into()),
            constant_demand: None,
        }],
        technologies: vec![
            technology("OCGT", TechnologyKind::Dispatchable),
            TechnologyConfig {
                profile: Some("onwind".into()),
                ..technology("onwind", TechnologyKind::Variable)
            },
            TechnologyConfig {
                name: Some("battery".into()),
                max_hours: Some(6.0),
                energy_technology: Some("battery storage".into()),
                ..technology("battery inverter", TechnologyKind::Storage)
            },
        ],
        lines: Vec::new(),
        emissions_caps: vec![EmissionsCapConfig {
            name: "co2_limit".into(),
            limit: 1000.0,
        }],
    }
}
