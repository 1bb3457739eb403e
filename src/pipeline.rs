//! Runs the full pipeline: derive economics, assemble the model, solve and write results.
use crate::cost::TechnologyID;
use crate::finance::{DerivedEconomics, derive_economics};
use crate::input::ModelInputs;
use crate::network::{ModelParameterSet, assemble};
use crate::optimisation::{Solution, capacity_factors, solve};
use crate::output::{write_derived_economics, write_metadata, write_parameters, write_solution};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::info;
use std::path::Path;

/// A model which is ready to be solved
pub struct PreparedModel {
    /// Economic parameters derived for every technology in the cost table
    pub economics: IndexMap<TechnologyID, DerivedEconomics>,
    /// The assembled model parameters
    pub parameters: ModelParameterSet,
}

/// Derive economic parameters and assemble the model
pub fn prepare_model(inputs: &ModelInputs) -> Result<PreparedModel> {
    let economics = derive_economics(&inputs.costs);
    let assembly_config = inputs.config.assembly_config()?;
    let parameters = assemble(&inputs.costs, &inputs.time_series, &assembly_config)
        .context("Failed to assemble model")?;

    Ok(PreparedModel {
        economics,
        parameters,
    })
}

/// Prepare the model, optionally solve it and write results to `output_path`.
///
/// # Arguments
///
/// * `model_path` - Folder the inputs were read from
/// * `inputs` - The model inputs
/// * `output_path` - Folder where output files will be saved
/// * `solve_model` - Whether to run the optimisation
///
/// # Returns
///
/// The solution, if the model was solved
pub fn run(
    model_path: &Path,
    inputs: &ModelInputs,
    output_path: &Path,
    solve_model: bool,
) -> Result<Option<Solution>> {
    let model = prepare_model(inputs)?;
    write_derived_economics(output_path, &model.economics)?;
    write_parameters(output_path, &model.parameters)?;

    let solution = if solve_model {
        let solution = solve(&model.parameters).context("Failed to solve model")?;
        for (id, factor) in capacity_factors(&model.parameters, &solution)? {
            info!(
                "{id}: capacity {} MW, capacity factor {:.3}",
                solution.generator_capacities[&id],
                factor.value()
            );
        }
        write_solution(output_path, &model.parameters, &solution)?;
        Some(solution)
    } else {
        info!("Skipping optimisation");
        None
    };

    write_metadata(output_path, model_path, solution.as_ref())?;

    Ok(solution)
}
