//! The module responsible for writing output data to disk.
use crate::cost::TechnologyID;
use crate::finance::DerivedEconomics;
use crate::network::{ComponentID, ModelParameterSet, TechnologyKind};
use crate::optimisation::Solution;
use crate::units::{
    Capacity, Dimensionless, EmissionsPerEnergy, Hours, MoneyPerCapacity, MoneyPerEnergy,
};
use anyhow::{Context, Result, ensure};
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::Serialize;
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;
pub use metadata::write_metadata;

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "powerplan_results";

/// The output file name for derived economic parameters
const DERIVED_ECONOMICS_FILE_NAME: &str = "derived_economics.csv";

/// The output file name for assembled generator parameters
const GENERATORS_FILE_NAME: &str = "generators.csv";

/// The output file name for assembled storage unit parameters
const STORAGE_UNITS_FILE_NAME: &str = "storage_units.csv";

/// The output file name for optimal capacities
const CAPACITIES_FILE_NAME: &str = "capacities.csv";

/// The output file name for per-snapshot operation
const DISPATCH_FILE_NAME: &str = "dispatch.csv";

/// The default output folder for a model: `powerplan_results/<model folder name>`.
///
/// Relative paths such as "." are resolved first so that the folder name is meaningful.
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    let resolved = model_dir
        .canonicalize()
        .with_context(|| format!("Model folder not found: {}", model_dir.display()))?;
    let name = resolved
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("Cannot name output folder after {}", resolved.display()))?;

    Ok(Path::new(OUTPUT_DIRECTORY_ROOT).join(name))
}

/// Create a new output directory for the model specified at `model_dir`.
///
/// An existing, non-empty directory is only replaced if `allow_overwrite` is set.
///
/// # Returns
///
/// Whether an existing directory was overwritten
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    if output_dir.is_dir() {
        if output_dir.read_dir()?.next().is_none() {
            // already exists, but empty
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Use --overwrite to replace it."
        );
        fs::remove_dir_all(output_dir)?;
        fs::create_dir_all(output_dir)?;
        return Ok(true);
    }

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(false)
}

/// Represents a row in the derived economics CSV file
#[derive(Serialize, Debug, PartialEq)]
struct DerivedEconomicsRow<'a> {
    technology: &'a TechnologyID,
    annuity: Dimensionless,
    marginal_cost: MoneyPerEnergy,
    capital_cost: MoneyPerCapacity,
    emission_factor: EmissionsPerEnergy,
}

/// Represents a row in the generators CSV file
#[derive(Serialize, Debug, PartialEq)]
struct GeneratorRow<'a> {
    id: &'a ComponentID,
    technology: &'a TechnologyID,
    bus: &'a str,
    kind: &'static str,
    extendable: bool,
    min_capacity: Capacity,
    max_capacity: Option<Capacity>,
    marginal_cost: MoneyPerEnergy,
    capital_cost: MoneyPerCapacity,
    emission_factor: EmissionsPerEnergy,
}

/// Represents a row in the storage units CSV file
#[derive(Serialize, Debug, PartialEq)]
struct StorageUnitRow<'a> {
    id: &'a ComponentID,
    technology: &'a TechnologyID,
    bus: &'a str,
    extendable: bool,
    min_capacity: Capacity,
    max_capacity: Option<Capacity>,
    max_hours: Hours,
    efficiency_store: Dimensionless,
    efficiency_dispatch: Dimensionless,
    cyclic_state_of_charge: bool,
    marginal_cost: MoneyPerEnergy,
    capital_cost: MoneyPerCapacity,
}

/// Represents a row in the capacities CSV file
#[derive(Serialize, Debug, PartialEq)]
struct CapacityRow<'a> {
    component: &'static str,
    id: &'a ComponentID,
    capacity: Capacity,
}

/// Represents a row in the dispatch CSV file
#[derive(Serialize, Debug, PartialEq)]
struct DispatchRow<'a> {
    snapshot: NaiveDateTime,
    component: &'static str,
    id: &'a ComponentID,
    variable: &'static str,
    value: f64,
}

fn kind_name(kind: TechnologyKind) -> &'static str {
    match kind {
        TechnologyKind::Dispatchable => "dispatchable",
        TechnologyKind::Variable => "variable",
        TechnologyKind::Storage => "storage",
    }
}

fn new_writer(output_path: &Path, file_name: &str) -> Result<csv::Writer<File>> {
    let file_path = output_path.join(file_name);
    csv::Writer::from_path(&file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))
}

/// Write derived economic parameters for every technology to a CSV file
pub fn write_derived_economics(
    output_path: &Path,
    economics: &IndexMap<TechnologyID, DerivedEconomics>,
) -> Result<()> {
    let mut writer = new_writer(output_path, DERIVED_ECONOMICS_FILE_NAME)?;
    for (technology, derived) in economics {
        writer.serialize(DerivedEconomicsRow {
            technology,
            annuity: derived.annuity,
            marginal_cost: derived.marginal_cost,
            capital_cost: derived.capital_cost,
            emission_factor: derived.emission_factor,
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// Write the assembled generator and storage unit parameters to CSV files
pub fn write_parameters(output_path: &Path, parameters: &ModelParameterSet) -> Result<()> {
    let mut writer = new_writer(output_path, GENERATORS_FILE_NAME)?;
    for (id, generator) in &parameters.generators {
        writer.serialize(GeneratorRow {
            id,
            technology: &generator.technology,
            bus: &generator.bus.0,
            kind: kind_name(generator.kind),
            extendable: generator.capacity.is_extendable(),
            min_capacity: generator.capacity.min(),
            max_capacity: generator.capacity.max(),
            marginal_cost: generator.marginal_cost,
            capital_cost: generator.capital_cost,
            emission_factor: generator.emission_factor,
        })?;
    }
    writer.flush()?;

    let mut writer = new_writer(output_path, STORAGE_UNITS_FILE_NAME)?;
    for (id, storage) in &parameters.storage_units {
        writer.serialize(StorageUnitRow {
            id,
            technology: &storage.technology,
            bus: &storage.bus.0,
            extendable: storage.capacity.is_extendable(),
            min_capacity: storage.capacity.min(),
            max_capacity: storage.capacity.max(),
            max_hours: storage.max_hours,
            efficiency_store: storage.efficiency_store,
            efficiency_dispatch: storage.efficiency_dispatch,
            cyclic_state_of_charge: storage.cyclic_state_of_charge,
            marginal_cost: storage.marginal_cost,
            capital_cost: storage.capital_cost,
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// Write optimal capacities and per-snapshot operation to CSV files
pub fn write_solution(
    output_path: &Path,
    parameters: &ModelParameterSet,
    solution: &Solution,
) -> Result<()> {
    let mut writer = new_writer(output_path, CAPACITIES_FILE_NAME)?;
    let capacities = [
        ("generator", &solution.generator_capacities),
        ("storage_unit", &solution.storage_capacities),
        ("line", &solution.line_capacities),
    ];
    for (component, map) in capacities {
        for (id, &capacity) in map {
            writer.serialize(CapacityRow {
                component,
                id,
                capacity,
            })?;
        }
    }
    writer.flush()?;

    let mut writer = new_writer(output_path, DISPATCH_FILE_NAME)?;
    let snapshots: Vec<_> = parameters.snapshots.iter().collect();
    let series = solution
        .dispatch
        .iter()
        .map(|(id, values)| ("generator", id, "power", as_f64(values)))
        .chain(
            solution
                .storage_dispatch
                .iter()
                .map(|(id, values)| ("storage_unit", id, "power", as_f64(values))),
        )
        .chain(solution.state_of_charge.iter().map(|(id, values)| {
            let values = values.iter().map(|value| value.value()).collect();
            ("storage_unit", id, "state_of_charge", values)
        }))
        .chain(
            solution
                .line_flows
                .iter()
                .map(|(id, values)| ("line", id, "flow", as_f64(values))),
        );
    for (component, id, variable, values) in series {
        for (&snapshot, value) in snapshots.iter().zip(values) {
            writer.serialize(DispatchRow {
                snapshot,
                component,
                id,
                variable,
                value,
            })?;
        }
    }
    writer.flush()?;

    Ok(())
}

fn as_f64(values: &[Capacity]) -> Vec<f64> {
    values.iter().map(|value| value.value()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::derive_economics;
    use crate::fixture::{generator, start_time};
    use crate::network::{BusParams, GeneratorParams};
    use crate::time_series::Snapshots;
    use crate::units::{Emissions, Money};
    use indexmap::indexmap;
    use rstest::rstest;
    use tempfile::tempdir;

    fn parameters(start_time: NaiveDateTime, generator: GeneratorParams) -> ModelParameterSet {
        ModelParameterSet {
            snapshots: Snapshots::hourly(start_time, 2).unwrap(),
            buses: indexmap! {"bus".into() => BusParams { demand: vec![Capacity(1.0); 2] }},
            generators: indexmap! {"gas".into() => generator},
            storage_units: IndexMap::new(),
            lines: IndexMap::new(),
            global_constraints: Vec::new(),
        }
    }

    #[test]
    fn test_create_output_directory() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("results").join("model");
        assert!(!create_output_directory(&output_dir, false).unwrap());
        assert!(output_dir.is_dir());

        // Already exists, but empty
        assert!(!create_output_directory(&output_dir, false).unwrap());

        // Not empty
        fs::write(output_dir.join("dispatch.csv"), "").unwrap();
        assert!(create_output_directory(&output_dir, false).is_err());
        assert!(create_output_directory(&output_dir, true).unwrap());
        assert!(output_dir.read_dir().unwrap().next().is_none());
    }

    #[test]
    fn test_get_output_dir() {
        let dir = tempdir().unwrap();
        let model_dir = dir.path().join("simple");
        fs::create_dir(&model_dir).unwrap();
        assert_eq!(
            get_output_dir(&model_dir).unwrap(),
            PathBuf::from(OUTPUT_DIRECTORY_ROOT).join("simple")
        );
        assert!(get_output_dir(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_write_derived_economics() {
        let dir = tempdir().unwrap();
        let costs = indexmap! {"gas".into() => Default::default()};
        write_derived_economics(dir.path(), &derive_economics(&costs)).unwrap();

        let contents = fs::read_to_string(dir.path().join(DERIVED_ECONOMICS_FILE_NAME)).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "technology,annuity,marginal_cost,capital_cost,emission_factor"
        );
        assert!(lines.next().unwrap().starts_with("gas,"));
        assert!(lines.next().is_none());
    }

    #[rstest]
    fn test_write_parameters(start_time: NaiveDateTime, generator: GeneratorParams) {
        let dir = tempdir().unwrap();
        write_parameters(dir.path(), &parameters(start_time, generator)).unwrap();

        let contents = fs::read_to_string(dir.path().join(GENERATORS_FILE_NAME)).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,technology,bus,kind,extendable,min_capacity,max_capacity,marginal_cost,\
             capital_cost,emission_factor"
        );
        assert!(lines.next().unwrap().starts_with("gas,OCGT,bus,dispatchable,false,"));

        // Header only, as there are no storage units
        let contents = fs::read_to_string(dir.path().join(STORAGE_UNITS_FILE_NAME)).unwrap();
        assert!(contents.lines().count() <= 1);
    }

    #[rstest]
    fn test_write_solution(start_time: NaiveDateTime, generator: GeneratorParams) {
        let dir = tempdir().unwrap();
        let parameters = parameters(start_time, generator);
        let solution = Solution {
            objective: Money(10.0),
            generator_capacities: indexmap! {"gas".into() => Capacity(5.0)},
            storage_capacities: IndexMap::new(),
            line_capacities: IndexMap::new(),
            dispatch: indexmap! {"gas".into() => vec![Capacity(1.0), Capacity(2.0)]},
            storage_dispatch: IndexMap::new(),
            state_of_charge: IndexMap::new(),
            line_flows: IndexMap::new(),
            emissions: Emissions(0.0),
        };
        write_solution(dir.path(), &parameters, &solution).unwrap();

        let contents = fs::read_to_string(dir.path().join(CAPACITIES_FILE_NAME)).unwrap();
        assert_eq!(contents, "component,id,capacity\ngenerator,gas,5.0\n");

        let contents = fs::read_to_string(dir.path().join(DISPATCH_FILE_NAME)).unwrap();
        assert_eq!(
            contents,
            "snapshot,component,id,variable,value\n\
             2015-01-01T00:00:00,generator,gas,power,1.0\n\
             2015-01-01T01:00:00,generator,gas,power,2.0\n"
        );
    }
}
