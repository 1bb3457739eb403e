//! Code for solving the capacity-expansion problem as a linear program.
//!
//! The problem minimises annualised capital costs plus weighted operating costs, subject to:
//!
//! * demand being met at every bus in every snapshot
//! * generator output being within its (possibly time-varying) availability
//! * storage charge, discharge and state of charge being within the unit's power and energy limits
//! * line flows being within the line rating
//! * total emissions being within each emissions cap
use crate::error::PipelineError;
use crate::network::{
    CapacityBound, ComponentID, Dispatch, GlobalConstraintKind, ModelParameterSet,
};
use crate::units::{Capacity, Dimensionless, Emissions, Energy, Money};
use highs::{HighsModelStatus, RowProblem as Problem, Sense};
use indexmap::IndexMap;
use log::{debug, info};

/// A decision variable in the optimisation, along with its position in the solution
#[derive(Clone, Copy)]
struct Variable {
    col: highs::Col,
    index: usize,
}

/// The nominal capacity of a component, either fixed or a decision variable
#[derive(Clone, Copy)]
enum CapacityTerm {
    Fixed(f64),
    Variable(Variable),
}

/// A [`Problem`] which also keeps track of objective coefficients
#[derive(Default)]
struct LinearProgram {
    problem: Problem,
    costs: Vec<f64>,
}

impl LinearProgram {
    fn add_variable(&mut self, cost: f64, min: f64, max: f64) -> Variable {
        let col = self.problem.add_column(cost, min..=max);
        self.costs.push(cost);
        Variable {
            col,
            index: self.costs.len() - 1,
        }
    }

    /// Add a variable for a component's capacity, if it is extendable
    fn add_capacity(&mut self, bound: &CapacityBound, capital_cost: f64) -> CapacityTerm {
        match *bound {
            CapacityBound::Fixed(capacity) => CapacityTerm::Fixed(capacity.value()),
            CapacityBound::Extendable { min, max } => {
                let max = max.map_or(f64::INFINITY, |max| max.value());
                CapacityTerm::Variable(self.add_variable(capital_cost, min.value(), max))
            }
        }
    }

    /// Add a variable bounded by `factor` times a capacity.
    ///
    /// If the capacity is fixed, the bound is applied directly to the variable; otherwise a
    /// constraint is added.
    fn add_bounded_by_capacity(
        &mut self,
        cost: f64,
        capacity: CapacityTerm,
        factor: f64,
    ) -> Variable {
        match capacity {
            CapacityTerm::Fixed(capacity) => self.add_variable(cost, 0.0, factor * capacity),
            CapacityTerm::Variable(capacity) => {
                let var = self.add_variable(cost, 0.0, f64::INFINITY);
                self.problem
                    .add_row(..=0.0, [(var.col, 1.0), (capacity.col, -factor)]);
                var
            }
        }
    }
}

/// Values of the decision variables
struct Values(Vec<f64>);

impl Values {
    fn get(&self, var: Variable) -> f64 {
        self.0[var.index]
    }

    fn capacity(&self, term: CapacityTerm) -> Capacity {
        match term {
            CapacityTerm::Fixed(value) => Capacity(value),
            CapacityTerm::Variable(var) => Capacity(self.get(var)),
        }
    }

    fn series(&self, vars: &[Variable]) -> Vec<f64> {
        vars.iter().map(|&var| self.get(var)).collect()
    }
}

struct GeneratorVariables {
    capacity: CapacityTerm,
    output: Vec<Variable>,
}

struct StorageVariables {
    capacity: CapacityTerm,
    dispatch: Vec<Variable>,
    store: Vec<Variable>,
    state_of_charge: Vec<Variable>,
}

struct LineVariables {
    capacity: CapacityTerm,
    flow: Vec<Variable>,
}

/// The optimal capacities and operation of every component
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Total annualised system cost
    pub objective: Money,
    /// Optimal nominal capacity of each generator
    pub generator_capacities: IndexMap<ComponentID, Capacity>,
    /// Optimal power capacity of each storage unit
    pub storage_capacities: IndexMap<ComponentID, Capacity>,
    /// Optimal rating of each line
    pub line_capacities: IndexMap<ComponentID, Capacity>,
    /// Output of each generator in each snapshot
    pub dispatch: Dispatch,
    /// Net output (discharge minus charge) of each storage unit in each snapshot
    pub storage_dispatch: IndexMap<ComponentID, Vec<Capacity>>,
    /// State of charge of each storage unit at the end of each snapshot
    pub state_of_charge: IndexMap<ComponentID, Vec<Energy>>,
    /// Flow from `bus0` to `bus1` on each line in each snapshot
    pub line_flows: IndexMap<ComponentID, Vec<Capacity>>,
    /// Total emissions over the horizon
    pub emissions: Emissions,
}

/// Build and solve the capacity-expansion problem.
///
/// # Arguments
///
/// * `parameters` - The assembled model parameters
///
/// # Returns
///
/// The optimal solution or [`PipelineError::SolveFailed`] if the solver did not find one.
/// [`PipelineError::ProfileLengthMismatch`] is returned if any per-snapshot series does not
/// match the snapshots.
pub fn solve(parameters: &ModelParameterSet) -> Result<Solution, PipelineError> {
    parameters.check_consistent()?;
    let snapshots = &parameters.snapshots;
    let weight = snapshots.weight().value();
    let mut lp = LinearProgram::default();

    // Fixed capacities still incur capital costs, but they do not affect the optimum
    let mut objective_constant = 0.0;

    let mut generators = IndexMap::new();
    for (id, generator) in &parameters.generators {
        let capacity = lp.add_capacity(&generator.capacity, generator.capital_cost.value());
        if let CapacityTerm::Fixed(capacity) = capacity {
            objective_constant += generator.capital_cost.value() * capacity;
        }
        let output = (0..snapshots.len())
            .map(|t| {
                lp.add_bounded_by_capacity(
                    weight * generator.marginal_cost.value(),
                    capacity,
                    generator.max_per_unit(t).value(),
                )
            })
            .collect();
        generators.insert(id.clone(), GeneratorVariables { capacity, output });
    }

    let mut storage_units = IndexMap::new();
    for (id, storage) in &parameters.storage_units {
        let capacity = lp.add_capacity(&storage.capacity, storage.capital_cost.value());
        if let CapacityTerm::Fixed(capacity) = capacity {
            objective_constant += storage.capital_cost.value() * capacity;
        }
        let mut add_series = |cost: f64, factor: f64| -> Vec<Variable> {
            (0..snapshots.len())
                .map(|_| lp.add_bounded_by_capacity(cost, capacity, factor))
                .collect()
        };
        let dispatch = add_series(weight * storage.marginal_cost.value(), 1.0);
        let store = add_series(0.0, 1.0);
        let state_of_charge = add_series(0.0, storage.max_hours.value());
        storage_units.insert(
            id.clone(),
            StorageVariables {
                capacity,
                dispatch,
                store,
                state_of_charge,
            },
        );
    }

    let mut lines = IndexMap::new();
    for (id, line) in &parameters.lines {
        let capacity = lp.add_capacity(&line.capacity, line.capital_cost.value());
        let flow = match capacity {
            CapacityTerm::Fixed(rating) => {
                objective_constant += line.capital_cost.value() * rating;
                (0..snapshots.len())
                    .map(|_| lp.add_variable(0.0, -rating, rating))
                    .collect()
            }
            CapacityTerm::Variable(rating) => (0..snapshots.len())
                .map(|_| {
                    let flow = lp.add_variable(0.0, f64::NEG_INFINITY, f64::INFINITY);
                    lp.problem
                        .add_row(..=0.0, [(flow.col, 1.0), (rating.col, -1.0)]);
                    lp.problem
                        .add_row(0.0.., [(flow.col, 1.0), (rating.col, 1.0)]);
                    flow
                })
                .collect(),
        };
        lines.insert(id.clone(), LineVariables { capacity, flow });
    }

    add_state_of_charge_constraints(
        &mut lp,
        parameters,
        &storage_units,
        snapshots.resolution_hours().value(),
    );
    add_bus_balance_constraints(&mut lp, parameters, &generators, &storage_units, &lines);
    add_global_constraints(&mut lp, parameters, &generators, weight);

    debug!(
        "Solving linear program with {} variables",
        lp.costs.len()
    );
    let values = solve_lp(lp.problem)?;
    let objective = lp
        .costs
        .iter()
        .zip(values.0.iter())
        .map(|(cost, value)| cost * value)
        .sum::<f64>()
        + objective_constant;

    let dispatch: Dispatch = generators
        .iter()
        .map(|(id, vars)| {
            let output = values.series(&vars.output).into_iter().map(Capacity).collect();
            (id.clone(), output)
        })
        .collect();
    let emissions = parameters.total_emissions(&dispatch);
    info!("Optimal objective: {objective:.2}; total emissions: {emissions}");

    Ok(Solution {
        objective: Money(objective),
        generator_capacities: generators
            .iter()
            .map(|(id, vars)| (id.clone(), values.capacity(vars.capacity)))
            .collect(),
        storage_capacities: storage_units
            .iter()
            .map(|(id, vars)| (id.clone(), values.capacity(vars.capacity)))
            .collect(),
        line_capacities: lines
            .iter()
            .map(|(id, vars)| (id.clone(), values.capacity(vars.capacity)))
            .collect(),
        dispatch,
        storage_dispatch: storage_units
            .iter()
            .map(|(id, vars)| {
                let net = vars
                    .dispatch
                    .iter()
                    .zip(&vars.store)
                    .map(|(&d, &c)| Capacity(values.get(d) - values.get(c)))
                    .collect();
                (id.clone(), net)
            })
            .collect(),
        state_of_charge: storage_units
            .iter()
            .map(|(id, vars)| {
                let soc = values.series(&vars.state_of_charge).into_iter().map(Energy).collect();
                (id.clone(), soc)
            })
            .collect(),
        line_flows: lines
            .iter()
            .map(|(id, vars)| {
                let flow = values.series(&vars.flow).into_iter().map(Capacity).collect();
                (id.clone(), flow)
            })
            .collect(),
        emissions,
    })
}

/// Add constraints linking each storage unit's state of charge to its charge and discharge.
///
/// The state of charge changes over the snapshot resolution (`duration`, in hours) rather than
/// the snapshot weight. Without a cyclic state of charge, units start empty.
fn add_state_of_charge_constraints(
    lp: &mut LinearProgram,
    parameters: &ModelParameterSet,
    storage_units: &IndexMap<ComponentID, StorageVariables>,
    duration: f64,
) {
    for (id, vars) in storage_units {
        let storage = &parameters.storage_units[id];
        let efficiency_store = storage.efficiency_store.value();
        let efficiency_dispatch = storage.efficiency_dispatch.value();
        let count = vars.state_of_charge.len();

        for t in 0..count {
            let mut terms = vec![
                (vars.store[t].col, -duration * efficiency_store),
                (vars.dispatch[t].col, duration / efficiency_dispatch),
            ];
            let previous = match t {
                0 if storage.cyclic_state_of_charge => Some(count - 1),
                0 => None,
                t => Some(t - 1),
            };

            // With a single cyclic snapshot the state of charge cancels out
            if previous != Some(t) {
                terms.push((vars.state_of_charge[t].col, 1.0));
                if let Some(previous) = previous {
                    terms.push((vars.state_of_charge[previous].col, -1.0));
                }
            }
            lp.problem.add_row(0.0..=0.0, terms);
        }
    }
}

/// Add constraints requiring supply to equal demand at every bus in every snapshot
fn add_bus_balance_constraints(
    lp: &mut LinearProgram,
    parameters: &ModelParameterSet,
    generators: &IndexMap<ComponentID, GeneratorVariables>,
    storage_units: &IndexMap<ComponentID, StorageVariables>,
    lines: &IndexMap<ComponentID, LineVariables>,
) {
    for (bus_id, bus) in &parameters.buses {
        for (t, demand) in bus.demand.iter().enumerate() {
            let mut terms = Vec::new();
            for (id, vars) in generators {
                if parameters.generators[id].bus == *bus_id {
                    terms.push((vars.output[t].col, 1.0));
                }
            }
            for (id, vars) in storage_units {
                if parameters.storage_units[id].bus == *bus_id {
                    terms.push((vars.dispatch[t].col, 1.0));
                    terms.push((vars.store[t].col, -1.0));
                }
            }
            for (id, vars) in lines {
                let line = &parameters.lines[id];
                if line.bus0 == *bus_id {
                    terms.push((vars.flow[t].col, -1.0));
                } else if line.bus1 == *bus_id {
                    terms.push((vars.flow[t].col, 1.0));
                }
            }

            let demand = demand.value();
            lp.problem.add_row(demand..=demand, terms);
        }
    }
}

/// Add global constraints, such as emissions caps
fn add_global_constraints(
    lp: &mut LinearProgram,
    parameters: &ModelParameterSet,
    generators: &IndexMap<ComponentID, GeneratorVariables>,
    weight: f64,
) {
    for constraint in &parameters.global_constraints {
        match constraint.kind {
            GlobalConstraintKind::Emissions => {
                let terms: Vec<_> = generators
                    .iter()
                    .filter_map(|(id, vars)| {
                        let factor = parameters.generators[id].emission_factor.value();
                        (factor != 0.0).then_some((factor, vars))
                    })
                    .flat_map(|(factor, vars)| {
                        vars.output
                            .iter()
                            .map(move |var| (var.col, weight * factor))
                    })
                    .collect();
                debug!(
                    "Adding emissions cap {} of {}",
                    constraint.name, constraint.limit
                );
                lp.problem.add_row(..=constraint.limit.value(), terms);
            }
        }
    }
}

/// Solve the problem, returning the values of the variables
fn solve_lp(problem: Problem) -> Result<Values, PipelineError> {
    let mut model = problem.optimise(Sense::Minimise);
    model.set_option("output_flag", log::log_enabled!(log::Level::Debug));

    let solved = model
        .try_solve()
        .map_err(|status| PipelineError::SolveFailed(format!("{status:?}")))?;
    match solved.status() {
        HighsModelStatus::Optimal => Ok(Values(solved.get_solution().columns().to_vec())),
        status => Err(PipelineError::SolveFailed(format!("{status:?}"))),
    }
}

/// The share of each generator's potential output which was used.
///
/// Every generator in `parameters` must appear in `solution`, otherwise
/// [`PipelineError::MissingReference`] is returned.
pub fn capacity_factors(
    parameters: &ModelParameterSet,
    solution: &Solution,
) -> Result<IndexMap<ComponentID, Dimensionless>, PipelineError> {
    parameters.check_consistent()?;
    parameters
        .generators
        .iter()
        .map(|(id, generator)| {
            let missing = || PipelineError::missing("generator in solution", id.to_string());
            let capacity = *solution.generator_capacities.get(id).ok_or_else(missing)?;
            let output = solution.dispatch.get(id).ok_or_else(missing)?;
            let potential: Capacity = generator
                .upper_bound_series(capacity, &parameters.snapshots)
                .into_iter()
                .sum();
            let used: Capacity = output.iter().copied().sum();
            let factor = if potential > Capacity(0.0) {
                used / potential
            } else {
                Dimensionless(0.0)
            };
            Ok((id.clone(), factor))
        })
        .collect()
}
