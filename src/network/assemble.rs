//! Code for assembling a [`ModelParameterSet`] from normalised costs and time series.
use super::{
    BusID, BusParams, CapacityBound, ComponentID, GeneratorParams, GlobalConstraint,
    GlobalConstraintKind, LineParams, ModelParameterSet, StorageParams, TechnologyKind,
};
use crate::cost::{TechnologyCost, TechnologyCostMap, TechnologyID};
use crate::error::PipelineError;
use crate::finance::DerivedEconomics;
use crate::id::IDCollection;
use crate::time_series::{ProfileKind, Snapshots, TimeSeriesSet};
use crate::units::{Capacity, Dimensionless, Emissions, Hours, MoneyPerCapacity};
use indexmap::IndexMap;
use log::{debug, info};
use serde::Deserialize;

const fn default_cyclic_state_of_charge() -> bool {
    true
}

/// A bus and the demand attached to it
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BusConfig {
    /// The bus's ID
    pub id: BusID,
    /// The name of a demand profile
    pub demand: Option<String>,
    /// A constant demand in MW, used in place of a profile
    pub constant_demand: Option<f64>,
}

/// A generator or storage unit to build from a technology
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TechnologyConfig {
    /// The component's name, if different from the technology
    pub name: Option<String>,
    /// The technology in the cost table
    pub technology: TechnologyID,
    /// How the technology is modelled
    pub kind: TechnologyKind,
    /// The bus the component is connected to
    pub bus: BusID,
    /// Fixed nominal capacity in MW
    pub capacity: Option<f64>,
    /// Whether the capacity is chosen by the optimisation
    #[serde(default)]
    pub extendable: bool,
    /// Minimum capacity in MW (extendable only)
    pub min_capacity: Option<f64>,
    /// Maximum capacity in MW (extendable only)
    pub max_capacity: Option<f64>,
    /// The name of a capacity-factor profile (variable only)
    pub profile: Option<String>,
    /// Hours of storage at full power (storage only)
    pub max_hours: Option<f64>,
    /// Charging efficiency (storage only)
    pub efficiency_store: Option<f64>,
    /// Discharging efficiency (storage only)
    pub efficiency_dispatch: Option<f64>,
    /// Whether the state of charge is cyclic (storage only)
    #[serde(default = "default_cyclic_state_of_charge")]
    pub cyclic_state_of_charge: bool,
    /// Technology providing the energy capacity (storage only)
    pub energy_technology: Option<TechnologyID>,
}

impl TechnologyConfig {
    /// The ID of the assembled component
    pub fn component_id(&self) -> ComponentID {
        match &self.name {
            Some(name) => name.as_str().into(),
            None => ComponentID(self.technology.0.clone()),
        }
    }
}

/// A transmission line between two buses
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LineConfig {
    /// The line's ID
    pub id: ComponentID,
    /// One end of the line
    pub bus0: BusID,
    /// The other end of the line
    pub bus1: BusID,
    /// Fixed rating in MW
    pub capacity: Option<f64>,
    /// Whether the rating is chosen by the optimisation
    #[serde(default)]
    pub extendable: bool,
    /// Minimum rating in MW (extendable only)
    pub min_capacity: Option<f64>,
    /// Maximum rating in MW (extendable only)
    pub max_capacity: Option<f64>,
    /// Annualised cost per MW of rating
    #[serde(default)]
    pub capital_cost: f64,
}

/// An upper limit on total emissions
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmissionsCapConfig {
    /// The constraint's name
    pub name: String,
    /// Maximum emissions in tonnes of CO2 over the horizon
    pub limit: f64,
}

/// The user choices which, together with costs and time series, define a model
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyConfig {
    /// The model's time index
    pub snapshots: Snapshots,
    /// Buses
    pub buses: Vec<BusConfig>,
    /// Generators and storage units
    pub technologies: Vec<TechnologyConfig>,
    /// Transmission lines
    pub lines: Vec<LineConfig>,
    /// Emissions caps
    pub emissions_caps: Vec<EmissionsCapConfig>,
}

/// Build a [`ModelParameterSet`] from normalised costs, profiles and user choices.
///
/// Every technology, bus and profile referenced by `config` must exist, and every profile used
/// must be aligned with the snapshots.
///
/// # Arguments
///
/// * `costs` - Normalised costs for each technology
/// * `time_series` - Demand and capacity-factor profiles
/// * `config` - Which components to build and how
pub fn assemble(
    costs: &TechnologyCostMap,
    time_series: &TimeSeriesSet,
    config: &AssemblyConfig,
) -> Result<ModelParameterSet, PipelineError> {
    let snapshots = &config.snapshots;
    let buses = assemble_buses(&config.buses, time_series, snapshots)?;

    let mut generators: IndexMap<ComponentID, GeneratorParams> = IndexMap::new();
    let mut storage_units: IndexMap<ComponentID, StorageParams> = IndexMap::new();
    for tech in &config.technologies {
        let id = tech.component_id();
        if generators.contains_key(&id) || storage_units.contains_key(&id) {
            return Err(PipelineError::InvalidParameter(format!(
                "Duplicate component name: {id}"
            )));
        }

        let bus = buses.get_id("bus", &tech.bus.0)?;
        let technology = costs.get_id("technology", &tech.technology.0)?;
        let cost = &costs[&technology];
        match tech.kind {
            TechnologyKind::Storage => {
                let storage =
                    assemble_storage_unit(tech, technology, bus, cost, costs).map_err(|err| {
                        prefix_error(err, &id)
                    })?;
                storage_units.insert(id, storage);
            }
            _ => {
                let generator =
                    assemble_generator(tech, technology, bus, cost, time_series, snapshots)?;
                generators.insert(id, generator);
            }
        }
    }

    let mut lines: IndexMap<ComponentID, LineParams> = IndexMap::new();
    for line in &config.lines {
        if lines.contains_key(&line.id) {
            return Err(PipelineError::InvalidParameter(format!(
                "Duplicate line: {}",
                line.id
            )));
        }
        let params = assemble_line(line, &buses)?;
        lines.insert(line.id.clone(), params);
    }

    let global_constraints = config
        .emissions_caps
        .iter()
        .map(assemble_emissions_cap)
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        "Assembled model with {} snapshots, {} buses, {} generators, {} storage units, {} lines \
         and {} global constraints",
        snapshots.len(),
        buses.len(),
        generators.len(),
        storage_units.len(),
        lines.len(),
        global_constraints.len()
    );

    Ok(ModelParameterSet {
        snapshots: snapshots.clone(),
        buses,
        generators,
        storage_units,
        lines,
        global_constraints,
    })
}

fn prefix_error(err: PipelineError, id: &ComponentID) -> PipelineError {
    match err {
        PipelineError::InvalidParameter(msg) => {
            PipelineError::InvalidParameter(format!("{id}: {msg}"))
        }
        err => err,
    }
}

fn assemble_buses(
    configs: &[BusConfig],
    time_series: &TimeSeriesSet,
    snapshots: &Snapshots,
) -> Result<IndexMap<BusID, BusParams>, PipelineError> {
    if configs.is_empty() {
        return Err(PipelineError::InvalidParameter(
            "At least one bus must be defined".into(),
        ));
    }

    let mut buses: IndexMap<BusID, BusParams> = IndexMap::new();
    for bus in configs {
        let demand = match (&bus.demand, bus.constant_demand) {
            (Some(_), Some(_)) => {
                return Err(PipelineError::InvalidParameter(format!(
                    "Bus {}: cannot have both a demand profile and a constant demand",
                    bus.id
                )));
            }
            (Some(name), None) => {
                let profile = time_series.get(name, ProfileKind::Demand)?;
                profile.check_aligned(snapshots)?;
                profile.values().iter().copied().map(Capacity).collect()
            }
            (None, Some(value)) => {
                check_non_negative(value, &format!("Bus {}: constant demand", bus.id))?;
                vec![Capacity(value); snapshots.len()]
            }
            (None, None) => {
                debug!("Bus {} has no demand", bus.id);
                vec![Capacity(0.0); snapshots.len()]
            }
        };

        if buses
            .insert(bus.id.clone(), BusParams { demand })
            .is_some()
        {
            return Err(PipelineError::InvalidParameter(format!(
                "Duplicate bus: {}",
                bus.id
            )));
        }
    }

    Ok(buses)
}

fn check_non_negative(value: f64, what: &str) -> Result<(), PipelineError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(PipelineError::InvalidParameter(format!(
            "{what} must be a non-negative number (got {value})"
        )))
    }
}

/// Work out the capacity bounds for a component
fn capacity_bound(
    capacity: Option<f64>,
    extendable: bool,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<CapacityBound, PipelineError> {
    if !extendable {
        if min.is_some() || max.is_some() {
            return Err(PipelineError::InvalidParameter(
                "Capacity limits can only be given for extendable components".into(),
            ));
        }
        let capacity = capacity.ok_or_else(|| {
            PipelineError::InvalidParameter(
                "Capacity must be given for non-extendable components".into(),
            )
        })?;
        check_non_negative(capacity, "Capacity")?;
        return Ok(CapacityBound::Fixed(Capacity(capacity)));
    }

    if capacity.is_some() {
        return Err(PipelineError::InvalidParameter(
            "A fixed capacity cannot be given for extendable components".into(),
        ));
    }
    let min = min.unwrap_or(0.0);
    check_non_negative(min, "Minimum capacity")?;
    if let Some(max) = max {
        check_non_negative(max, "Maximum capacity")?;
        if max < min {
            return Err(PipelineError::InvalidParameter(format!(
                "Maximum capacity ({max}) is less than minimum capacity ({min})"
            )));
        }
    }

    Ok(CapacityBound::Extendable {
        min: Capacity(min),
        max: max.map(Capacity),
    })
}

fn assemble_generator(
    tech: &TechnologyConfig,
    technology: TechnologyID,
    bus: BusID,
    cost: &TechnologyCost,
    time_series: &TimeSeriesSet,
    snapshots: &Snapshots,
) -> Result<GeneratorParams, PipelineError> {
    let id = tech.component_id();
    let capacity = capacity_bound(
        tech.capacity,
        tech.extendable,
        tech.min_capacity,
        tech.max_capacity,
    )
    .map_err(|err| prefix_error(err, &id))?;

    let availability = match (tech.kind, &tech.profile) {
        (TechnologyKind::Variable, Some(name)) => {
            let profile = time_series.get(name, ProfileKind::CapacityFactor)?;
            profile.check_aligned(snapshots)?;
            Some(profile.values().iter().copied().map(Dimensionless).collect())
        }
        (TechnologyKind::Variable, None) => {
            return Err(PipelineError::InvalidParameter(format!(
                "{id}: variable generators need a capacity-factor profile"
            )));
        }
        (_, Some(_)) => {
            return Err(PipelineError::InvalidParameter(format!(
                "{id}: only variable generators can have a profile"
            )));
        }
        (_, None) => None,
    };

    let economics = DerivedEconomics::from_cost(cost);
    Ok(GeneratorParams {
        technology,
        bus,
        kind: tech.kind,
        capacity,
        availability,
        marginal_cost: economics.marginal_cost,
        capital_cost: economics.capital_cost,
        emission_factor: economics.emission_factor,
    })
}

fn assemble_storage_unit(
    tech: &TechnologyConfig,
    technology: TechnologyID,
    bus: BusID,
    cost: &TechnologyCost,
    costs: &TechnologyCostMap,
) -> Result<StorageParams, PipelineError> {
    if tech.profile.is_some() {
        return Err(PipelineError::InvalidParameter(
            "Storage units cannot have a profile".into(),
        ));
    }
    let capacity = capacity_bound(
        tech.capacity,
        tech.extendable,
        tech.min_capacity,
        tech.max_capacity,
    )?;

    let max_hours = tech.max_hours.ok_or_else(|| {
        PipelineError::InvalidParameter("max_hours must be given for storage units".into())
    })?;
    if !(max_hours.is_finite() && max_hours > 0.0) {
        return Err(PipelineError::InvalidParameter(format!(
            "max_hours must be positive (got {max_hours})"
        )));
    }

    // The technology's efficiency is a round trip, split evenly between charging and discharging
    let one_way = cost.efficiency.sqrt();
    let efficiency_store = check_efficiency(tech.efficiency_store, one_way)?;
    let efficiency_dispatch = check_efficiency(tech.efficiency_dispatch, one_way)?;

    let economics = DerivedEconomics::from_cost(cost);
    let mut capital_cost = economics.capital_cost;
    if let Some(energy_technology) = &tech.energy_technology {
        let energy_technology = costs.get_id("energy technology", &energy_technology.0)?;
        let energy = DerivedEconomics::from_cost(&costs[&energy_technology]);
        capital_cost += Dimensionless(max_hours) * energy.capital_cost;
    }

    Ok(StorageParams {
        technology,
        bus,
        capacity,
        max_hours: Hours(max_hours),
        efficiency_store,
        efficiency_dispatch,
        cyclic_state_of_charge: tech.cyclic_state_of_charge,
        marginal_cost: economics.marginal_cost,
        capital_cost,
    })
}

fn check_efficiency(
    value: Option<f64>,
    default: Dimensionless,
) -> Result<Dimensionless, PipelineError> {
    let value = value.unwrap_or(default.value());
    if value > 0.0 && value <= 1.0 {
        Ok(Dimensionless(value))
    } else {
        Err(PipelineError::InvalidParameter(format!(
            "Storage efficiency must be in (0, 1] (got {value})"
        )))
    }
}

fn assemble_line(
    line: &LineConfig,
    buses: &IndexMap<BusID, BusParams>,
) -> Result<LineParams, PipelineError> {
    let bus0 = buses.get_id("bus", &line.bus0.0)?;
    let bus1 = buses.get_id("bus", &line.bus1.0)?;
    let invalid = |msg: String| PipelineError::InvalidParameter(format!("Line {}: {msg}", line.id));

    if bus0 == bus1 {
        return Err(invalid("cannot connect a bus to itself".into()));
    }
    let capacity = capacity_bound(
        line.capacity,
        line.extendable,
        line.min_capacity,
        line.max_capacity,
    )
    .map_err(|err| match err {
        PipelineError::InvalidParameter(msg) => invalid(msg),
        err => err,
    })?;
    check_non_negative(line.capital_cost, "Line capital cost")?;

    Ok(LineParams {
        bus0,
        bus1,
        capacity,
        capital_cost: MoneyPerCapacity(line.capital_cost),
    })
}

fn assemble_emissions_cap(cap: &EmissionsCapConfig) -> Result<GlobalConstraint, PipelineError> {
    check_non_negative(cap.limit, &format!("Emissions cap {}", cap.name))?;

    Ok(GlobalConstraint {
        name: cap.name.clone(),
        kind: GlobalConstraintKind::Emissions,
        limit: Emissions(cap.limit),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{
        assembly_config, assert_pipeline_error, start_time, technology_costs, time_series,
    };
    use crate::time_series::TimeSeriesProfile;
    use crate::units::{EmissionsPerEnergy, MoneyPerEnergy};
    use chrono::NaiveDateTime;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_assemble(
        technology_costs: TechnologyCostMap,
        time_series: TimeSeriesSet,
        assembly_config: AssemblyConfig,
    ) {
        let model = assemble(&technology_costs, &time_series, &assembly_config).unwrap();
        assert_eq!(model.buses.len(), 1);
        assert_eq!(model.buses["electricity"].demand.len(), 24);
        assert_eq!(
            model.generators.keys().map(|id| id.0.as_ref()).collect::<Vec<_>>(),
            ["OCGT", "onwind"]
        );
        assert_eq!(model.storage_units.len(), 1);
        assert_eq!(model.global_constraints.len(), 1);

        let ocgt = &model.generators["OCGT"];
        assert!(ocgt.availability.is_none());
        let economics = DerivedEconomics::from_cost(&technology_costs["OCGT"]);
        assert_eq!(ocgt.marginal_cost, economics.marginal_cost);
        assert_eq!(ocgt.capital_cost, economics.capital_cost);
        assert_eq!(ocgt.emission_factor, economics.emission_factor);

        let onwind = &model.generators["onwind"];
        assert_eq!(onwind.availability.as_ref().unwrap().len(), 24);
        assert_eq!(onwind.emission_factor, EmissionsPerEnergy(0.0));
    }

    #[rstest]
    fn test_assemble_storage(
        technology_costs: TechnologyCostMap,
        time_series: TimeSeriesSet,
        assembly_config: AssemblyConfig,
    ) {
        let model = assemble(&technology_costs, &time_series, &assembly_config).unwrap();
        let battery = &model.storage_units["battery"];
        assert!(battery.cyclic_state_of_charge);
        assert_eq!(battery.max_hours, Hours(6.0));
        assert_approx_eq!(
            Dimensionless,
            battery.round_trip_efficiency(),
            technology_costs["battery inverter"].efficiency,
            epsilon = 1e-12
        );
        assert_eq!(battery.marginal_cost, MoneyPerEnergy(0.0));

        let inverter = DerivedEconomics::from_cost(&technology_costs["battery inverter"]);
        let store = DerivedEconomics::from_cost(&technology_costs["battery storage"]);
        assert_approx_eq!(
            MoneyPerCapacity,
            battery.capital_cost,
            inverter.capital_cost + Dimensionless(6.0) * store.capital_cost,
            epsilon = 1e-8
        );
    }

    #[rstest]
    fn test_assemble_profile_length_mismatch(
        start_time: NaiveDateTime,
        technology_costs: TechnologyCostMap,
        time_series: TimeSeriesSet,
        assembly_config: AssemblyConfig,
    ) {
        // 24 hourly points but only 8 snapshots
        let config = AssemblyConfig {
            snapshots: Snapshots::hourly(start_time, 8).unwrap(),
            ..assembly_config
        };
        assert_pipeline_error!(
            assemble(&technology_costs, &time_series, &config),
            PipelineError::ProfileLengthMismatch { .. }
        );
    }

    #[rstest]
    fn test_assemble_unknown_technology(
        technology_costs: TechnologyCostMap,
        time_series: TimeSeriesSet,
        mut assembly_config: AssemblyConfig,
    ) {
        assembly_config.technologies[0].technology = "CCGT".into();
        assert_eq!(
            assemble(&technology_costs, &time_series, &assembly_config).unwrap_err(),
            PipelineError::missing("technology", "CCGT")
        );
    }

    #[rstest]
    fn test_assemble_unknown_bus(
        technology_costs: TechnologyCostMap,
        time_series: TimeSeriesSet,
        mut assembly_config: AssemblyConfig,
    ) {
        assembly_config.technologies[1].bus = "heat".into();
        assert_eq!(
            assemble(&technology_costs, &time_series, &assembly_config).unwrap_err(),
            PipelineError::missing("bus", "heat")
        );
    }

    #[rstest]
    fn test_assemble_unknown_profile(
        technology_costs: TechnologyCostMap,
        time_series: TimeSeriesSet,
        mut assembly_config: AssemblyConfig,
    ) {
        assembly_config.technologies[1].profile = Some("solar".into());
        assert_eq!(
            assemble(&technology_costs, &time_series, &assembly_config).unwrap_err(),
            PipelineError::missing("time series", "solar")
        );
    }

    #[rstest]
    fn test_assemble_duplicate_component(
        technology_costs: TechnologyCostMap,
        time_series: TimeSeriesSet,
        mut assembly_config: AssemblyConfig,
    ) {
        let duplicate = assembly_config.technologies[0].clone();
        assembly_config.technologies.push(duplicate);
        assert_pipeline_error!(
            assemble(&technology_costs, &time_series, &assembly_config),
            PipelineError::InvalidParameter(_)
        );
    }

    #[rstest]
    fn test_assemble_constant_demand(
        technology_costs: TechnologyCostMap,
        time_series: TimeSeriesSet,
        mut assembly_config: AssemblyConfig,
    ) {
        assembly_config.buses[0].demand = None;
        assembly_config.buses[0].constant_demand = Some(50.0);
        let model = assemble(&technology_costs, &time_series, &assembly_config).unwrap();
        assert!(
            model.buses["electricity"]
                .demand
                .iter()
                .all(|&demand| demand == Capacity(50.0))
        );

        assembly_config.buses[0].demand = Some("load".into());
        assert_pipeline_error!(
            assemble(&technology_costs, &time_series, &assembly_config),
            PipelineError::InvalidParameter(_)
        );
    }

    #[rstest]
    fn test_assemble_line(
        technology_costs: TechnologyCostMap,
        time_series: TimeSeriesSet,
        mut assembly_config: AssemblyConfig,
    ) {
        assembly_config.buses.push(BusConfig {
            id: "north".into(),
            demand: None,
            constant_demand: Some(10.0),
        });
        let line = LineConfig {
            id: "link".into(),
            bus0: "electricity".into(),
            bus1: "north".into(),
            capacity: None,
            extendable: true,
            min_capacity: None,
            max_capacity: Some(100.0),
            capital_cost: 5000.0,
        };
        assembly_config.lines.push(line.clone());
        let model = assemble(&technology_costs, &time_series, &assembly_config).unwrap();
        assert_eq!(
            model.lines["link"].capacity,
            CapacityBound::Extendable {
                min: Capacity(0.0),
                max: Some(Capacity(100.0))
            }
        );

        assembly_config.lines[0] = LineConfig {
            bus1: "electricity".into(),
            ..line
        };
        assert_pipeline_error!(
            assemble(&technology_costs, &time_series, &assembly_config),
            PipelineError::InvalidParameter(_)
        );
    }

    #[rstest]
    fn test_assemble_misaligned_capacity_factor(
        start_time: NaiveDateTime,
        technology_costs: TechnologyCostMap,
        assembly_config: AssemblyConfig,
    ) {
        let snapshots = Snapshots::hourly(start_time, 24).unwrap();
        let load = TimeSeriesProfile::over_snapshots(
            "load",
            ProfileKind::Demand,
            &snapshots,
            vec![100.0; 24],
        )
        .unwrap();
        let wind = TimeSeriesProfile::over_snapshots(
            "onwind",
            ProfileKind::CapacityFactor,
            &Snapshots::hourly(start_time, 12).unwrap(),
            vec![0.5; 12],
        )
        .unwrap();
        let time_series = TimeSeriesSet::from_profiles([load, wind]).unwrap();
        assert_pipeline_error!(
            assemble(&technology_costs, &time_series, &assembly_config),
            PipelineError::ProfileLengthMismatch { .. }
        );
    }

    #[rstest]
    #[case(Some(10.0), false, None, None, Ok(CapacityBound::Fixed(Capacity(10.0))))]
    #[case(None, true, None, None, Ok(CapacityBound::Extendable { min: Capacity(0.0), max: None }))]
    #[case(None, true, Some(5.0), Some(10.0), Ok(CapacityBound::Extendable {
        min: Capacity(5.0),
        max: Some(Capacity(10.0))
    }))]
    #[case(None, false, None, None, Err(()))] // No capacity
    #[case(Some(10.0), true, None, None, Err(()))] // Fixed and extendable
    #[case(Some(10.0), false, Some(1.0), None, Err(()))] // Limits on fixed capacity
    #[case(None, true, Some(10.0), Some(5.0), Err(()))] // max < min
    #[case(Some(-1.0), false, None, None, Err(()))]
    fn test_capacity_bound(
        #[case] capacity: Option<f64>,
        #[case] extendable: bool,
        #[case] min: Option<f64>,
        #[case] max: Option<f64>,
        #[case] expected: Result<CapacityBound, ()>,
    ) {
        assert_eq!(
            capacity_bound(capacity, extendable, min, max).map_err(|_| ()),
            expected
        );
    }

    #[rstest]
    #[case(None, 0.9, Ok(Dimensionless(0.9)))]
    #[case(Some(0.8), 0.9, Ok(Dimensionless(0.8)))]
    #[case(Some(0.0), 0.9, Err(()))]
    #[case(Some(1.2), 0.9, Err(()))]
    #[case(None, 1.2, Err(()))] // Default is checked too
    #[case(Some(0.8), 1.2, Ok(Dimensionless(0.8)))]
    fn test_check_efficiency(
        #[case] value: Option<f64>,
        #[case] default: f64,
        #[case] expected: Result<Dimensionless, ()>,
    ) {
        assert_eq!(
            check_efficiency(value, Dimensionless(default)).map_err(|_| ()),
            expected
        );
    }

    #[rstest]
    fn test_assemble_storage_efficiency_above_one(
        mut technology_costs: TechnologyCostMap,
        time_series: TimeSeriesSet,
        mut assembly_config: AssemblyConfig,
    ) {
        technology_costs["battery inverter"].efficiency = Dimensionless(1.44);
        assert_pipeline_error!(
            assemble(&technology_costs, &time_series, &assembly_config),
            PipelineError::InvalidParameter(_)
        );

        // Explicit values in range are still accepted
        assembly_config.technologies[2].efficiency_store = Some(0.95);
        assembly_config.technologies[2].efficiency_dispatch = Some(0.95);
        let model = assemble(&technology_costs, &time_series, &assembly_config).unwrap();
        assert_eq!(
            model.storage_units["battery"].efficiency_store,
            Dimensionless(0.95)
        );
    }
}
